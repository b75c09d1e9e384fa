use super::ValidationError;
use crate::constants::MAX_RECORD_ID_LENGTH;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

static RECORD_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_-]+$").expect("record ID pattern is a valid regex")
});

/// Opaque identifier of a record (obra, empleado, parte, ...).
///
/// Notion page IDs and mock fixture IDs share this type. The only
/// structure assumed is the character set, so IDs coming from URLs can
/// never smuggle path separators or query strings into Notion calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Validates and wraps a raw ID. Surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(ValidationError::EmptyField("id"));
        }

        if trimmed.len() > MAX_RECORD_ID_LENGTH {
            return Err(ValidationError::InvalidId(format!(
                "ID longer than {} characters",
                MAX_RECORD_ID_LENGTH
            )));
        }

        if !RECORD_ID_PATTERN.is_match(trimmed) {
            return Err(ValidationError::InvalidId(format!(
                "ID may only contain letters, digits, '-' and '_': {}",
                trimmed
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Creates a fresh random ID in hyphenated UUID form.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the ID in the dashed form the Notion API expects.
    ///
    /// 32-hex IDs, dashed or not, are normalized to 8-4-4-4-12 lowercase.
    /// Anything else is returned unchanged.
    pub fn to_notion_dashed(&self) -> String {
        let compact: String = self.0.chars().filter(|c| *c != '-').collect();
        if compact.len() == 32 && compact.chars().all(|c| c.is_ascii_hexdigit()) {
            let compact = compact.to_lowercase();
            format!(
                "{}-{}-{}-{}-{}",
                &compact[0..8],
                &compact[8..12],
                &compact[12..16],
                &compact[16..20],
                &compact[20..32]
            )
        } else {
            self.0.clone()
        }
    }

    /// Whether two IDs name the same Notion object, ignoring dash layout.
    pub fn same_object(&self, other: &RecordId) -> bool {
        self.to_notion_dashed()
            .eq_ignore_ascii_case(&other.to_notion_dashed())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl std::str::FromStr for RecordId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
