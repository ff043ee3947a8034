//! Profile URL grammar.
//!
//! A profile URL has the shape `<base>/<username>/<identifier>`, where `<base>`
//! is `scheme://host/segment` and the identifier is a run of hex digits and
//! hyphens that fills the whole path segment.

use regex::Regex;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("Profile base '{base}' is not an absolute URL: {reason}")]
    InvalidBase { base: String, reason: String },
    #[error("Failed to compile profile pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone)]
pub struct ProfileUrlGrammar {
    base: String,
    pattern: Regex,
}

impl ProfileUrlGrammar {
    pub fn new(profile_base: &str) -> Result<Self, GrammarError> {
        let parsed = Url::parse(profile_base).map_err(|e| GrammarError::InvalidBase {
            base: profile_base.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
            return Err(GrammarError::InvalidBase {
                base: profile_base.to_string(),
                reason: "missing host".into(),
            });
        }

        let base = profile_base.trim_end_matches('/').to_string();
        let pattern = Regex::new(&format!(
            r"(?i)^{}/[^/?#]+/([a-f0-9-]+)(?:[/?#]|$)",
            regex::escape(&base)
        ))?;

        Ok(Self { base, pattern })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether `href` is a profile URL.
    pub fn matches(&self, href: &str) -> bool {
        self.pattern.is_match(href.trim())
    }

    /// Pull the identifier out of a profile URL, lower-cased.
    pub fn extract(&self, url: &str) -> Option<String> {
        self.pattern
            .captures(url.trim())
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
    }
}

/// Whether `value` has the shape of an account identifier.
pub fn is_identifier(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_hexdigit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: &str = "934e0849-2c26-4067-a66a-7636c152d0e5";

    fn grammar() -> ProfileUrlGrammar {
        ProfileUrlGrammar::new("https://stats.cc/siege").unwrap()
    }

    #[test]
    fn extracts_identifier_from_profile_url() {
        let url = format!("https://stats.cc/siege/alice/{}", ID);
        assert!(grammar().matches(&url));
        assert_eq!(grammar().extract(&url).as_deref(), Some(ID));
    }

    #[test]
    fn accepts_trailing_path_query_and_fragment() {
        let g = grammar();
        for suffix in ["/overview", "?tab=ranked", "#top", "/"] {
            let url = format!("https://stats.cc/siege/alice/{}{}", ID, suffix);
            assert_eq!(g.extract(&url).as_deref(), Some(ID), "suffix {}", suffix);
        }
    }

    #[test]
    fn identifier_is_lower_cased() {
        let url = "https://stats.cc/siege/Alice/934E0849-2C26-4067-A66A-7636C152D0E5";
        assert_eq!(grammar().extract(url).as_deref(), Some(ID));
    }

    #[test]
    fn rejects_non_profile_urls() {
        let g = grammar();
        assert!(!g.matches("https://stats.cc/siege"));
        assert!(!g.matches("https://stats.cc/siege/alice"));
        assert!(!g.matches("https://stats.cc/siege/alice/overview"));
        assert!(!g.matches("https://stats.cc/siege/alice/deadbeefzz"));
        assert!(!g.matches(&format!("https://evil.example/siege/alice/{}", ID)));
        assert!(!g.matches(&format!("https://stats.cc/valorant/alice/{}", ID)));
        assert_eq!(g.extract("about:blank"), None);
    }

    #[test]
    fn base_must_be_absolute() {
        assert!(ProfileUrlGrammar::new("stats.cc/siege").is_err());
        assert!(ProfileUrlGrammar::new("mailto:someone@example.com").is_err());
        assert_eq!(
            ProfileUrlGrammar::new("https://stats.cc/siege/").unwrap().base(),
            "https://stats.cc/siege"
        );
    }

    #[test]
    fn identifier_shape() {
        assert!(is_identifier(ID));
        assert!(!is_identifier(""));
        assert!(!is_identifier("../etc"));
        assert!(!is_identifier("abc/def"));
    }
}
