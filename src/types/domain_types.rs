// src/types/domain_types.rs
//! Validated newtypes for the Notion token and the URLs the service talks to.

use super::ValidationError;
use std::fmt;
use url::Url;

const API_KEY_PREFIXES: [&str; 2] = ["secret_", "ntn_"];
const API_KEY_MIN_LENGTH: usize = 20;
const API_KEY_VISIBLE_CHARS: usize = 10;

/// Notion integration token. Only its first characters are ever printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into().trim().to_string();
        let invalid = |reason: &str| ValidationError::InvalidApiKey {
            reason: reason.to_string(),
        };

        if key.is_empty() {
            return Err(invalid("API key cannot be empty"));
        }
        if !API_KEY_PREFIXES.iter().any(|p| key.starts_with(p)) {
            return Err(invalid("API key must start with 'secret_' or 'ntn_'"));
        }
        if key.len() < API_KEY_MIN_LENGTH {
            return Err(invalid("API key is too short"));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(API_KEY_VISIBLE_CHARS).collect();
        write!(f, "{}...", visible)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", self)
    }
}

/// An absolute `http` or `https` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

impl ValidatedUrl {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidUrl {
            url: input.to_string(),
            reason,
        };
        let url = Url::parse(input.trim()).map_err(|e| invalid(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(invalid(format!("unsupported scheme '{}'", other))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// The URL without a trailing slash, ready for `format!("{}/path", ..)`.
    pub fn trimmed(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
