// src/api/parser.rs
//! Turns Notion response bodies into typed values or classified errors.

use super::responses::NotionError;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

/// Parses a successful response body.
pub fn parse_success<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", url, e);
        AppError::MalformedResponse(format!("{} (body: {})", e, preview(body)))
    })
}

/// Builds the error for a non-success response.
///
/// Notion's `{status, code, message}` body is preferred; otherwise the
/// HTTP status decides the code.
pub fn parse_error(body: &str, status: StatusCode, url: &str) -> AppError {
    match serde_json::from_str::<NotionError>(body) {
        Ok(error) => AppError::NotionService {
            code: NotionErrorCode::from_api_response(&error.code),
            message: error.message,
            status,
        },
        Err(_) => AppError::NotionService {
            code: NotionErrorCode::from_http_status(status.as_u16()),
            message: format!("HTTP {} from {}: {}", status, url, preview(body)),
            status,
        },
    }
}

fn preview(body: &str) -> String {
    if body.chars().count() > ERROR_BODY_PREVIEW_LENGTH {
        let cut: String = body.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect();
        format!("{}...", cut)
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notion_error_bodies_are_classified() {
        let body = r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find page"}"#;
        match parse_error(body, StatusCode::NOT_FOUND, "https://api.notion.com/v1/pages/x") {
            AppError::NotionService { code, message, .. } => {
                assert_eq!(code, NotionErrorCode::ObjectNotFound);
                assert_eq!(message, "Could not find page");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn opaque_bodies_fall_back_to_status() {
        let err = parse_error("<html>bad gateway</html>", StatusCode::BAD_GATEWAY, "u");
        assert!(matches!(
            err,
            AppError::NotionService {
                code: NotionErrorCode::ServiceUnavailable,
                ..
            }
        ));
    }

    #[test]
    fn malformed_success_bodies_are_reported() {
        let long = "x".repeat(500);
        let err = parse_success::<serde_json::Value>(&long, "u").unwrap_err();
        match err {
            AppError::MalformedResponse(msg) => assert!(msg.ends_with("...)")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
