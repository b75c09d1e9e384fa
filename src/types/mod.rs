use thiserror::Error;

mod domain_types;
mod ids;

pub use domain_types::*;
pub use ids::*;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid record ID: {0}")]
    InvalidId(String),

    #[error("Invalid API key format: {reason}")]
    InvalidApiKey { reason: String },

    #[error("Invalid date '{value}': expected YYYY-MM-DD or RFC 3339")]
    InvalidDate { value: String },

    #[error("Invalid hours for employee {employee}: {value} (expected 0..=24)")]
    InvalidHours { employee: String, value: f64 },

    #[error("Empty required field: {0}")]
    EmptyField(&'static str),

    #[error("Field {field} exceeds {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Invalid URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unknown estado '{value}'. Valid options: {}", options.join(", "))]
    UnknownStatus { value: String, options: Vec<String> },

    #[error("Too many employees in one parte: {actual} (max {max})")]
    TooManyEmployees { actual: usize, max: usize },

    #[error("Invalid request body: {0}")]
    InvalidBody(String),
}
