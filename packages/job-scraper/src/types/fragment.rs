//! Raw listing fragments and the fields a source extracts from them.

use serde::{Deserialize, Serialize};
use url::Url;

/// An unparsed, source-specific representation of a single listing.
///
/// For HTML boards `body` is the outer HTML of one listing card; `base_url`
/// is the page it was found on, used to resolve relative links.
#[derive(Debug, Clone)]
pub struct RawFragment {
    /// Name of the source that produced this fragment
    pub source: String,

    /// Fragment content
    pub body: String,

    /// URL of the page the fragment came from
    pub base_url: Url,
}

impl RawFragment {
    pub fn new(source: impl Into<String>, body: impl Into<String>, base_url: Url) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
            base_url,
        }
    }
}

/// Raw field strings extracted from one fragment. Any of them may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardFields {
    pub title: String,
    pub company: String,
    pub location: String,
    /// Absolute, canonical link (or empty if none was found)
    pub link: String,
    /// Raw date-posted text, e.g. "3 days ago" or "2024-06-10"
    pub date_posted: String,
}

impl CardFields {
    pub fn new(
        title: impl Into<String>,
        company: impl Into<String>,
        location: impl Into<String>,
        link: impl Into<String>,
        date_posted: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            company: company.into(),
            location: location.into(),
            link: link.into(),
            date_posted: date_posted.into(),
        }
    }
}
