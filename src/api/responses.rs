// src/api/responses.rs
//! Notion API response shapes this service reads.

use super::properties::{OptionKind, PropertyReader, PropertyValue, SelectOption};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A database row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotionPage {
    pub id: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub properties: IndexMap<String, PropertyValue>,
}

impl NotionPage {
    pub fn reader(&self) -> PropertyReader<'_> {
        PropertyReader::new(&self.properties)
    }
}

/// Generic paginated response wrapper
#[derive(Debug, Clone, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    #[serde(default)]
    pub has_more: bool,
}

/// Items gathered across every page of a query.
#[derive(Debug, Clone)]
pub struct PaginationResult<T> {
    pub items: Vec<T>,
    pub pages_fetched: u32,
}

/// Notion's error body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionError {
    #[serde(default)]
    pub status: u16,
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptionsConfig {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// A column of a database schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DatabaseProperty {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub status: Option<OptionsConfig>,
    #[serde(default)]
    pub select: Option<OptionsConfig>,
}

impl DatabaseProperty {
    /// The options of a status or select column.
    pub fn options(&self) -> Option<(OptionKind, &[SelectOption])> {
        match self.kind.as_str() {
            "status" => self
                .status
                .as_ref()
                .map(|c| (OptionKind::Status, c.options.as_slice())),
            "select" => self
                .select
                .as_ref()
                .map(|c| (OptionKind::Select, c.options.as_slice())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NotionDatabase {
    pub id: String,
    #[serde(default)]
    pub properties: IndexMap<String, DatabaseProperty>,
}
