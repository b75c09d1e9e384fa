// src/server/response.rs
//! JSON error bodies for the REST API.

use crate::error::AppError;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// `{ error, details, code, required?, estado? }`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<&'static str>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
}

/// Short Spanish summary shown by the web client.
fn summary(err: &AppError) -> &'static str {
    match err {
        AppError::MissingFields { .. } => "Faltan campos requeridos",
        AppError::Validation(_) => "Datos de entrada no válidos",
        AppError::NotFound { .. } => "Recurso no encontrado",
        AppError::NotEditable { .. } => "El parte no es editable por su estado actual",
        AppError::InvalidState { .. } => "Solo se pueden enviar partes en estado Borrador",
        AppError::RateLimited { .. } => "Demasiadas solicitudes",
        AppError::NotionService { code, .. } if code.is_not_found() => "Recurso no encontrado",
        AppError::NotionService { code, .. } => code.describe(),
        AppError::NetworkFailure(_) | AppError::MalformedResponse(_) => {
            "Error de conectividad con Notion"
        }
        AppError::Remote { .. } => "Error del servidor remoto",
        AppError::MissingConfiguration(_) | AppError::Io(_) | AppError::InternalError { .. } => {
            "Error interno del servidor"
        }
    }
}

impl ErrorBody {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            error: summary(err).to_string(),
            details: err.to_string(),
            code: err.error_code(),
            required: match err {
                AppError::MissingFields { required } => Some(required.clone()),
                _ => None,
            },
            estado: match err {
                AppError::NotEditable { estado } | AppError::InvalidState { estado } => {
                    Some(estado.clone())
                }
                _ => None,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        } else {
            log::debug!("Request rejected: {}", self);
        }

        let mut response = (status, Json(ErrorBody::from_error(&self))).into_response();
        if let AppError::RateLimited { retry_after_secs } = self {
            if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}
