// ai
//! 🔎 Key filters — the bouncer at the download door.

use regex::Regex;

use crate::error::ConfigError;

/// 🔎 Decides whether a listed key is worth downloading.
pub trait KeyFilter: Send + Sync + std::fmt::Debug {
    fn matches(&self, key: &str) -> bool;
}

/// 🔎 Regex-backed filter. Unanchored, like `Regex::is_match`: anchor it yourself if you care.
#[derive(Debug, Clone)]
pub struct RegexKeyFilter {
    pattern: Regex,
}

impl RegexKeyFilter {
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = Regex::new(pattern).map_err(|e| ConfigError::InvalidFilter {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl KeyFilter for RegexKeyFilter {
    fn matches(&self, key: &str) -> bool {
        self.pattern.is_match(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_only_jsonl_gets_past_the_rope() {
        let the_bouncer = RegexKeyFilter::new(r"\.jsonl$").expect("💀 valid regex");
        assert_eq!(the_bouncer.as_str(), r"\.jsonl$");
        assert!(the_bouncer.matches("files/a.jsonl"));
        assert!(!the_bouncer.matches("files/a.jsonl.bak"));
        assert!(!the_bouncer.matches("files/README.md"));
    }

    #[test]
    fn the_one_where_a_broken_pattern_is_a_config_error() {
        match RegexKeyFilter::new("files/[") {
            Err(ConfigError::InvalidFilter { pattern, .. }) => assert_eq!(pattern, "files/["),
            other => panic!("💀 expected InvalidFilter, got {:?}", other),
        }
    }
}
