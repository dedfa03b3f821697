//! # Environment File
//!
//! `KEY=value` lines, `#`-prefixed comments and blank lines ignored. The
//! key `ENVIRONMENT` names the deployment stage and is kept out of the
//! variable set available for Lambda wiring.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

pub const RESERVED_STAGE_KEY: &str = "ENVIRONMENT";

static ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9_]*)=(.*)$").unwrap());

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvFile {
    /// Wireable variables, in file order. `ENVIRONMENT` is never included.
    pub entries: Vec<(String, String)>,
    /// The value of the reserved `ENVIRONMENT` key, when present.
    pub stage: Option<String>,
}

impl EnvFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read env file '{}'", path.display()))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut env = Self::default();
        for line in content.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some(caps) = ENTRY.captures(trimmed) else {
                continue;
            };
            let key = caps[1].to_string();
            let value = caps[2].trim().to_string();
            if key == RESERVED_STAGE_KEY {
                env.stage = Some(value);
            } else {
                env.entries.push((key, value));
            }
        }
        env
    }

    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_entries_in_order() {
        let env = EnvFile::parse("A2=first\nB=second\n");
        assert_eq!(
            env.entries,
            vec![
                ("A2".to_string(), "first".to_string()),
                ("B".to_string(), "second".to_string())
            ]
        );
    }

    #[test]
    fn test_skips_comments_and_blanks() {
        let env = EnvFile::parse("# comment\n\nA=1\n   \n# another\nB=2\n");
        assert_eq!(env.entries.len(), 2);
    }

    #[test]
    fn test_environment_key_is_reserved() {
        let env = EnvFile::parse("ENVIRONMENT=staging\nA=1\n");
        assert_eq!(env.stage.as_deref(), Some("staging"));
        assert_eq!(env.value_of("ENVIRONMENT"), None);
        assert_eq!(env.value_of("A"), Some("1"));
    }

    #[test]
    fn test_value_keeps_everything_after_first_equals() {
        let env = EnvFile::parse("URL=https://example.com?a=b\n");
        assert_eq!(env.value_of("URL"), Some("https://example.com?a=b"));
    }
}
