//! Search term expansion.

use crate::error::ConfigError;
use crate::types::search::SearchPhrase;

/// Expands job titles and levels into search phrases.
pub struct SearchTermBuilder;

impl SearchTermBuilder {
    /// One phrase per (level, title) pair, levels in the outer loop.
    ///
    /// Entries are trimmed. Duplicates are kept: the output always has
    /// `titles.len() * levels.len()` phrases.
    pub fn build<T, L>(titles: &[T], levels: &[L]) -> Result<Vec<SearchPhrase>, ConfigError>
    where
        T: AsRef<str>,
        L: AsRef<str>,
    {
        if titles.is_empty() {
            return Err(ConfigError::NoTitles);
        }
        if levels.is_empty() {
            return Err(ConfigError::NoLevels);
        }

        let titles = trimmed(titles, "job_title")?;
        let levels = trimmed(levels, "job_level")?;

        let mut phrases = Vec::with_capacity(titles.len() * levels.len());
        for level in &levels {
            for title in &titles {
                phrases.push(SearchPhrase::new(title, level));
            }
        }
        Ok(phrases)
    }
}

fn trimmed<'a, S: AsRef<str>>(
    entries: &'a [S],
    field: &'static str,
) -> Result<Vec<&'a str>, ConfigError> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                Err(ConfigError::BlankEntry { field, index })
            } else {
                Ok(entry)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_levels_outer_titles_inner() {
        let phrases = SearchTermBuilder::build(
            &["Software Engineer", "Data Analyst"],
            &["Intern", "Entry Level"],
        )
        .unwrap();

        let phrases: Vec<_> = phrases.iter().map(SearchPhrase::as_str).collect();
        assert_eq!(
            phrases,
            vec![
                "Software Engineer Intern",
                "Data Analyst Intern",
                "Software Engineer Entry Level",
                "Data Analyst Entry Level",
            ]
        );
    }

    #[test]
    fn test_duplicates_are_kept() {
        let phrases = SearchTermBuilder::build(&["Engineer", "Engineer"], &["Intern"]).unwrap();
        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0], phrases[1]);
    }

    #[test]
    fn test_entries_are_trimmed() {
        let phrases = SearchTermBuilder::build(&["  Engineer "], &["Intern\n"]).unwrap();
        assert_eq!(phrases[0].as_str(), "Engineer Intern");
    }

    #[test]
    fn test_empty_inputs_are_config_errors() {
        let none: [&str; 0] = [];
        assert!(matches!(
            SearchTermBuilder::build(&none, &["Intern"]),
            Err(ConfigError::NoTitles)
        ));
        assert!(matches!(
            SearchTermBuilder::build(&["Engineer"], &none),
            Err(ConfigError::NoLevels)
        ));
    }

    #[test]
    fn test_blank_entry_is_config_error() {
        let result = SearchTermBuilder::build(&["Engineer", "  "], &["Intern"]);
        assert!(matches!(
            result,
            Err(ConfigError::BlankEntry {
                field: "job_title",
                index: 1
            })
        ));
    }

    proptest! {
        #[test]
        fn prop_phrase_count_is_product(
            titles in proptest::collection::vec("[A-Za-z]{1,12}", 1..6),
            levels in proptest::collection::vec("[A-Za-z]{1,12}", 1..6),
        ) {
            let phrases = SearchTermBuilder::build(&titles, &levels).unwrap();
            prop_assert_eq!(phrases.len(), titles.len() * levels.len());

            for (i, phrase) in phrases.iter().enumerate() {
                let expected = format!("{} {}", titles[i % titles.len()], levels[i / titles.len()]);
                prop_assert_eq!(phrase.as_str(), expected.as_str());
            }
        }
    }
}
