// src/error.rs
//! Application error types with structured error handling.
//!
//! Each variant names what went wrong and carries what a caller needs to
//! react: the HTTP layer maps variants to status codes and JSON bodies,
//! the Notion client decides from the code whether to retry.

use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded; back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Classify from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::ValidationFailed,
            401 => Self::Unauthorized,
            403 => Self::RestrictedResource,
            404 => Self::ObjectNotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500 => Self::InternalError,
            502..=504 => Self::ServiceUnavailable,
            other => Self::HttpStatus(other),
        }
    }

    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::ServiceUnavailable | Self::InternalError
        )
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound)
    }

    /// Operator-facing explanation of the failure.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Unauthorized => "Notion token is invalid or expired",
            Self::RestrictedResource => "Integration has no access to the database",
            Self::ObjectNotFound => "Database or page not found",
            Self::RateLimited => "Notion rate limit exceeded",
            Self::ServiceUnavailable | Self::InternalError => "Notion is temporarily unavailable",
            Self::ValidationFailed | Self::InvalidJson => "Notion rejected the request",
            Self::Conflict => "Conflicting update on Notion",
            Self::HttpStatus(_) | Self::Unknown(_) => "Connectivity error with Notion",
        }
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error(transparent)]
    Validation(#[from] crate::types::ValidationError),

    #[error("Missing required fields: {}", required.join(", "))]
    MissingFields { required: Vec<&'static str> },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Parte is not editable in its current estado ({estado})")]
    NotEditable { estado: String },

    #[error("Only partes in estado Borrador can be sent (current: {estado})")]
    InvalidState { estado: String },

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API returned an error ({code}): {message}")]
    NotionService {
        code: NotionErrorCode,
        message: String,
        status: reqwest::StatusCode,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Server responded {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("Too many requests, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl AppError {
    pub fn not_found(entity: &'static str, id: impl fmt::Display) -> Self {
        AppError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        AppError::InternalError {
            message: message.into(),
            source: None,
        }
    }

    /// HTTP status the REST layer answers with.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::MissingFields { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::NotEditable { .. } | AppError::InvalidState { .. } => 409,
            AppError::RateLimited { .. } => 429,
            AppError::NotionService { code, .. } if code.is_not_found() => 404,
            AppError::NotionService { .. }
            | AppError::NetworkFailure(_)
            | AppError::MalformedResponse(_) => 502,
            AppError::Remote { status, .. } => *status,
            AppError::MissingConfiguration(_)
            | AppError::Io(_)
            | AppError::InternalError { .. } => 500,
        }
    }

    /// Stable machine-readable code for the JSON error body.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::MissingFields { .. } => "MISSING_FIELDS",
            AppError::NotFound { .. } => "NOT_FOUND",
            AppError::NotEditable { .. } => "NOT_EDITABLE",
            AppError::InvalidState { .. } => "INVALID_STATE",
            AppError::RateLimited { .. } => "RATE_LIMITED",
            AppError::NotionService { code, .. } if code.is_not_found() => "NOT_FOUND",
            AppError::NotionService { .. } => "NOTION_ERROR",
            AppError::NetworkFailure(_) => "NETWORK_ERROR",
            AppError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            AppError::Remote { .. } => "REMOTE_ERROR",
            AppError::MissingConfiguration(_) | AppError::Io(_) | AppError::InternalError { .. } => {
                "INTERNAL_ERROR"
            }
        }
    }

    /// Whether the error means the requested record does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::NotFound { .. } => true,
            AppError::NotionService { code, .. } => code.is_not_found(),
            AppError::Remote { status, .. } => *status == 404,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}
