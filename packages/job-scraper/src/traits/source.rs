//! Source adapter trait.

use futures::stream::BoxStream;

use crate::error::FetchResult;
use crate::types::{
    fragment::{CardFields, RawFragment},
    posting::IdentityRule,
    search::SearchPhrase,
};

/// Lazy, finite sequence of listing fragments for one search.
pub type FragmentStream<'a> = BoxStream<'a, FetchResult<RawFragment>>;

static CONTENT_HASH: IdentityRule = IdentityRule::ContentHash;

/// A job-listing site.
///
/// An adapter owns its query construction and fragment extraction. Each
/// call to [`search`](SourceAdapter::search) performs at most one fetch; a
/// failed fetch yields a single `Err` and ends the stream, and a page with
/// no listings yields an empty stream.
pub trait SourceAdapter: Send + Sync {
    /// Source name as stored on postings, e.g. "LinkedIn".
    fn name(&self) -> &str;

    /// Register search phrases. Additive; phrases already registered are
    /// skipped.
    fn set_search_terms(&mut self, terms: &[SearchPhrase]);

    /// Phrases registered so far, in registration order.
    fn search_terms(&self) -> &[SearchPhrase];

    /// Search for one phrase.
    ///
    /// Searches on the same adapter are serialized: a second stream does not
    /// start fetching until the first has been dropped.
    fn search<'a>(&'a self, term: &'a SearchPhrase) -> FragmentStream<'a>;

    /// Extract the raw fields of one fragment.
    fn parse_card(&self, fragment: &RawFragment) -> CardFields;

    /// How postings from this source derive their id.
    fn identity_rule(&self) -> &IdentityRule {
        &CONTENT_HASH
    }
}
