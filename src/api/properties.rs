// src/api/properties.rs
//! Notion page properties: typed reading and flattening.
//!
//! Notion wraps every cell in a `{ "type": ..., "<type>": ... }` object.
//! [`PropertyValue`] deserializes the known shapes and keeps the type name
//! of anything else; [`FlatValue`] is the plain value the REST API serves.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DateValue {
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RelationRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniqueIdValue {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileRef {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FormulaValue {
    String { string: Option<String> },
    Number { number: Option<f64> },
    Boolean { boolean: Option<bool> },
    Date { date: Option<DateValue> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RollupValue {
    Number { number: Option<f64> },
    Date { date: Option<DateValue> },
    Array { array: Vec<PropertyValue> },
    #[serde(other)]
    Unsupported,
}

/// The property types this service reads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TypedProperty {
    Title { title: Vec<RichText> },
    RichText { rich_text: Vec<RichText> },
    Number { number: Option<f64> },
    Select { select: Option<SelectOption> },
    Status { status: Option<SelectOption> },
    MultiSelect { multi_select: Vec<SelectOption> },
    Date { date: Option<DateValue> },
    Checkbox { checkbox: bool },
    Url { url: Option<String> },
    Email { email: Option<String> },
    PhoneNumber { phone_number: Option<String> },
    Relation { relation: Vec<RelationRef> },
    Formula { formula: FormulaValue },
    Rollup { rollup: RollupValue },
    UniqueId { unique_id: UniqueIdValue },
    Files { files: Vec<FileRef> },
    CreatedTime { created_time: String },
    LastEditedTime { last_edited_time: String },
}

/// A page property: a known typed value, or the name of a type we don't read.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Known(TypedProperty),
    Unsupported {
        #[serde(default)]
        id: Option<String>,
        #[serde(rename = "type")]
        kind: String,
    },
}

/// A property reduced to a plain value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Text(String),
    Number(f64),
    Bool(bool),
    List(Vec<String>),
    Empty,
}

impl FlatValue {
    /// Text rendering used for string fields.
    pub fn into_text(self) -> String {
        match self {
            FlatValue::Text(s) => s,
            FlatValue::Number(n) => format_number(n),
            FlatValue::Bool(b) => b.to_string(),
            FlatValue::List(items) => items.join(", "),
            FlatValue::Empty => String::new(),
        }
    }

    pub fn as_number(&self) -> f64 {
        match self {
            FlatValue::Number(n) => *n,
            FlatValue::Text(s) => s.trim().replace(',', ".").parse().unwrap_or(0.0),
            FlatValue::Bool(_) | FlatValue::List(_) | FlatValue::Empty => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match self {
            FlatValue::Bool(b) => *b,
            FlatValue::Text(s) => s.eq_ignore_ascii_case("true"),
            FlatValue::Number(n) => *n != 0.0,
            FlatValue::List(items) => !items.is_empty(),
            FlatValue::Empty => false,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn join_text(fragments: &[RichText]) -> FlatValue {
    FlatValue::Text(fragments.iter().map(|t| t.plain_text.as_str()).collect())
}

fn optional_text(value: &Option<String>) -> FlatValue {
    FlatValue::Text(value.clone().unwrap_or_default())
}

impl PropertyValue {
    pub fn flatten(&self) -> FlatValue {
        let typed = match self {
            PropertyValue::Known(typed) => typed,
            PropertyValue::Unsupported { kind, .. } => return FlatValue::Text(format!("[{}]", kind)),
        };

        match typed {
            TypedProperty::Title { title } => join_text(title),
            TypedProperty::RichText { rich_text } => join_text(rich_text),
            TypedProperty::Number { number } => FlatValue::Number(number.unwrap_or(0.0)),
            TypedProperty::Select { select: option } | TypedProperty::Status { status: option } => {
                FlatValue::Text(option.as_ref().map(|o| o.name.clone()).unwrap_or_default())
            }
            TypedProperty::MultiSelect { multi_select } => FlatValue::Text(
                multi_select
                    .iter()
                    .map(|o| o.name.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            TypedProperty::Date { date } => {
                FlatValue::Text(date.as_ref().map(|d| d.start.clone()).unwrap_or_default())
            }
            TypedProperty::Checkbox { checkbox } => FlatValue::Bool(*checkbox),
            TypedProperty::Url { url } => optional_text(url),
            TypedProperty::Email { email } => optional_text(email),
            TypedProperty::PhoneNumber { phone_number } => optional_text(phone_number),
            TypedProperty::Relation { relation } => {
                FlatValue::List(relation.iter().map(|r| r.id.clone()).collect())
            }
            TypedProperty::Formula { formula } => match formula {
                FormulaValue::String { string } => optional_text(string),
                FormulaValue::Number { number } => FlatValue::Number(number.unwrap_or(0.0)),
                FormulaValue::Boolean { boolean } => FlatValue::Bool(boolean.unwrap_or(false)),
                FormulaValue::Date { date } => {
                    FlatValue::Text(date.as_ref().map(|d| d.start.clone()).unwrap_or_default())
                }
            },
            TypedProperty::Rollup { rollup } => match rollup {
                RollupValue::Number { number } => FlatValue::Number(number.unwrap_or(0.0)),
                RollupValue::Date { date } => {
                    FlatValue::Text(date.as_ref().map(|d| d.start.clone()).unwrap_or_default())
                }
                RollupValue::Array { array } => FlatValue::List(
                    array
                        .iter()
                        .map(|item| item.flatten().into_text())
                        .filter(|s| !s.is_empty())
                        .collect(),
                ),
                RollupValue::Unsupported => FlatValue::Empty,
            },
            TypedProperty::UniqueId { unique_id } => {
                let number = unique_id.number.map(|n| n.to_string()).unwrap_or_default();
                match unique_id.prefix.as_deref() {
                    Some(prefix) if !prefix.is_empty() => {
                        FlatValue::Text(format!("{}-{}", prefix, number))
                    }
                    _ => FlatValue::Text(number),
                }
            }
            TypedProperty::Files { files } => {
                FlatValue::List(files.iter().map(|f| f.name.clone()).collect())
            }
            TypedProperty::CreatedTime { created_time } => FlatValue::Text(created_time.clone()),
            TypedProperty::LastEditedTime { last_edited_time } => {
                FlatValue::Text(last_edited_time.clone())
            }
        }
    }
}

/// Named access to a page's properties. Missing properties read as empty.
#[derive(Debug, Clone, Copy)]
pub struct PropertyReader<'a> {
    properties: &'a IndexMap<String, PropertyValue>,
}

impl<'a> PropertyReader<'a> {
    pub fn new(properties: &'a IndexMap<String, PropertyValue>) -> Self {
        Self { properties }
    }

    pub fn flat(&self, name: &str) -> FlatValue {
        self.properties
            .get(name)
            .map(PropertyValue::flatten)
            .unwrap_or(FlatValue::Empty)
    }

    pub fn text(&self, name: &str) -> String {
        self.flat(name).into_text()
    }

    pub fn number(&self, name: &str) -> f64 {
        self.flat(name).as_number()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.flat(name).as_bool()
    }

    pub fn relation_ids(&self, name: &str) -> Vec<String> {
        match self.properties.get(name) {
            Some(PropertyValue::Known(TypedProperty::Relation { relation })) => {
                relation.iter().map(|r| r.id.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    pub fn first_relation(&self, name: &str) -> Option<String> {
        self.relation_ids(name).into_iter().next()
    }

    /// Property ID of a column this service doesn't read, such as a button.
    pub fn unsupported_id(&self, name: &str) -> Option<String> {
        match self.properties.get(name) {
            Some(PropertyValue::Unsupported { id, .. }) => id.clone(),
            _ => None,
        }
    }
}

/// Builders for property values in page create/update bodies.
pub mod write {
    use super::*;

    pub fn title(content: &str) -> Value {
        json!({ "title": [{ "text": { "content": content } }] })
    }

    pub fn rich_text(content: &str) -> Value {
        json!({ "rich_text": [{ "text": { "content": content } }] })
    }

    pub fn number(value: f64) -> Value {
        json!({ "number": value })
    }

    pub fn date(start: &str) -> Value {
        json!({ "date": { "start": start } })
    }

    pub fn relation<'a>(ids: impl IntoIterator<Item = &'a str>) -> Value {
        let refs: Vec<Value> = ids.into_iter().map(|id| json!({ "id": id })).collect();
        json!({ "relation": refs })
    }

    /// An option value for a `status` or `select` property.
    pub fn option(kind: OptionKind, name: &str) -> Value {
        match kind {
            OptionKind::Status => json!({ "status": { "name": name } }),
            OptionKind::Select => json!({ "select": { "name": name } }),
        }
    }
}

/// Which of Notion's two single-choice property types a column uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptionKind {
    #[default]
    Status,
    Select,
}

impl OptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKind::Status => "status",
            OptionKind::Select => "select",
        }
    }
}
