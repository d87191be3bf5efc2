use serde::{Deserialize, Serialize};
use std::fmt;

/// A concrete search phrase: one job title combined with one job level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchPhrase(String);

impl SearchPhrase {
    /// Combine a title and a level as `"{title} {level}"`.
    pub fn new(title: &str, level: &str) -> Self {
        Self(format!("{} {}", title, level))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SearchPhrase {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SearchPhrase {
    fn from(phrase: &str) -> Self {
        Self(phrase.to_string())
    }
}

impl From<String> for SearchPhrase {
    fn from(phrase: String) -> Self {
        Self(phrase)
    }
}
