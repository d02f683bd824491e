use crate::error::{ConfigErrorKind, InfraError};
use std::path::Path;

/// Terms that are always blocked, on top of anything loaded from config.
const DEFAULT_BLOCKED_TERMS: &[&str] = &[
    "fuck", "shit", "cunt", "bitch", "whore", "slut", "porn", "nazi", "hitler", "pussy",
];

pub trait ModerationChecker: Send + Sync {
    /// True when the username contains disallowed content.
    fn check_hardcore(&self, username: &str) -> bool;
}

/// Substring matcher over a normalized username.
pub struct WordlistModerator {
    terms: Vec<String>,
}

impl Default for WordlistModerator {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCKED_TERMS.iter().map(|t| t.to_string()))
    }
}

impl WordlistModerator {
    pub fn new<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut terms: Vec<String> = terms
            .into_iter()
            .map(|t| normalize(t.trim()))
            .filter(|t| !t.is_empty())
            .collect();
        terms.sort();
        terms.dedup();

        Self { terms }
    }

    /// Default terms plus the ones listed in `path` (one per line, `#` comments).
    pub fn with_terms_file(path: &Path) -> Result<Self, InfraError> {
        let data = std::fs::read_to_string(path).map_err(|e| InfraError::Config {
            path: path.to_path_buf(),
            source: ConfigErrorKind::Read(e),
        })?;

        let extra = parse_terms(&data);
        tracing::info!(path = %path.display(), count = extra.len(), "loaded blocked terms");

        Ok(Self::new(
            DEFAULT_BLOCKED_TERMS.iter().map(|t| t.to_string()).chain(extra),
        ))
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.terms.len()
    }
}

impl ModerationChecker for WordlistModerator {
    fn check_hardcore(&self, username: &str) -> bool {
        let normalized = normalize(username);
        self.terms.iter().any(|t| normalized.contains(t.as_str()))
    }
}

fn parse_terms(data: &str) -> Vec<String> {
    data.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Folds leetspeak back to letters and drops separators, so "sh1t_lord" reads as "shitlord".
fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '_' | '-' | '.' | ' '))
        .map(|c| match c {
            '0' => 'o',
            '1' => 'i',
            '3' => 'e',
            '4' | '@' => 'a',
            '5' | '$' => 's',
            '7' => 't',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}
