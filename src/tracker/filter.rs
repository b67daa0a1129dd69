//! Admission rules deciding which new lobbies get announced

use crate::error::{HeraldError, Result};
use crate::types::Lobby;
use regex::Regex;

/// Outcome of evaluating a newly seen lobby
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// Up for at least the freshness threshold
    Stale,
    /// Name does not contain the keyword as a whole word
    KeywordMismatch,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }

    /// Label used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Admission::Admitted => "admitted",
            Admission::Stale => "stale",
            Admission::KeywordMismatch => "keyword_mismatch",
        }
    }
}

/// Case-insensitive whole-word matcher for a single keyword
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    keyword: String,
    pattern: Regex,
}

impl KeywordMatcher {
    pub fn new(keyword: &str) -> Result<Self> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Err(HeraldError::ConfigurationError {
                message: "Keyword filter cannot be empty".to_string(),
            }
            .into());
        }

        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&keyword))).map_err(|e| {
            HeraldError::ConfigurationError {
                message: format!("Invalid keyword filter '{}': {}", keyword, e),
            }
        })?;

        Ok(Self { keyword, pattern })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// True when the keyword appears as an isolated word in `name`
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.is_match(&name.to_lowercase())
    }
}

/// Freshness and keyword gate applied to every lobby seen for the first time
#[derive(Debug, Clone)]
pub struct AdmissionFilter {
    freshness_threshold_seconds: i64,
    keyword: KeywordMatcher,
}

impl AdmissionFilter {
    pub fn new(freshness_threshold_seconds: i64, keyword: &str) -> Result<Self> {
        Ok(Self {
            freshness_threshold_seconds,
            keyword: KeywordMatcher::new(keyword)?,
        })
    }

    pub fn freshness_threshold_seconds(&self) -> i64 {
        self.freshness_threshold_seconds
    }

    pub fn keyword(&self) -> &str {
        self.keyword.keyword()
    }

    /// Freshness is checked before the keyword
    pub fn evaluate(&self, lobby: &Lobby) -> Admission {
        if lobby.uptime_seconds >= self.freshness_threshold_seconds {
            Admission::Stale
        } else if !self.keyword.matches(&lobby.name) {
            Admission::KeywordMismatch
        } else {
            Admission::Admitted
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lobby(name: &str, uptime_seconds: i64) -> Lobby {
        Lobby {
            id: "1".to_string(),
            name: name.to_string(),
            map: String::new(),
            uptime_seconds,
            server: "eu".to_string(),
            host: "host".to_string(),
            slots_taken: 1,
            slots_total: 2,
            is_official: false,
        }
    }

    #[test]
    fn test_keyword_must_be_whole_word() {
        let matcher = KeywordMatcher::new("obs").unwrap();
        assert!(matcher.matches("OBS game 1v1"));
        assert!(matcher.matches("1v1 obs"));
        assert!(matcher.matches("[obs] ffa"));
        assert!(matcher.matches("obs-only"));
        assert!(!matcher.matches("noobs only"));
        assert!(!matcher.matches("obsession"));
        assert!(!matcher.matches("obs_game"));
        assert!(!matcher.matches(""));
    }

    #[test]
    fn test_keyword_special_characters_are_literal() {
        let matcher = KeywordMatcher::new("1.v.1").unwrap();
        assert!(matcher.matches("ranked 1.v.1 now"));
        assert!(!matcher.matches("ranked 1xvx1 now"));
    }

    #[test]
    fn test_empty_keyword_is_rejected() {
        assert!(KeywordMatcher::new("   ").is_err());
    }

    #[test]
    fn test_freshness_boundary() {
        let filter = AdmissionFilter::new(300, "obs").unwrap();
        assert_eq!(filter.evaluate(&lobby("obs", 299)), Admission::Admitted);
        assert_eq!(filter.evaluate(&lobby("obs", 300)), Admission::Stale);
        assert_eq!(filter.evaluate(&lobby("noobs", 10)), Admission::KeywordMismatch);
        assert_eq!(filter.evaluate(&lobby("noobs", 400)), Admission::Stale);
    }

    proptest! {
        #[test]
        fn prop_stale_lobbies_never_admitted(name in ".*", uptime in 300i64..100_000) {
            let filter = AdmissionFilter::new(300, "obs").unwrap();
            prop_assert_eq!(filter.evaluate(&lobby(&name, uptime)), Admission::Stale);
        }

        #[test]
        fn prop_keyword_inside_word_never_matches(
            prefix in "[a-z0-9]{1,8}",
            suffix in "[a-z0-9]{0,8}",
        ) {
            let matcher = KeywordMatcher::new("obs").unwrap();
            let name = format!("{}obs{}", prefix, suffix);
            prop_assert!(!matcher.matches(&name));
        }

        #[test]
        fn prop_isolated_keyword_matches_any_case(
            before in "[a-z ]{0,10}",
            after in "[a-z ]{0,10}",
            upper in any::<bool>(),
        ) {
            let matcher = KeywordMatcher::new("obs").unwrap();
            let keyword = if upper { "OBS" } else { "obs" };
            let name = format!("{} {} {}", before, keyword, after);
            prop_assert!(matcher.matches(&name));
        }
    }
}
