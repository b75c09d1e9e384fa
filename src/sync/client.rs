// src/sync/client.rs
//! HTTP client for the work-order REST API.

use crate::constants::{CLIENT_REQUEST_TIMEOUT_SECS, ERROR_BODY_PREVIEW_LENGTH};
use crate::error::AppError;
use crate::model::{
    CompleteData, CreateWorkOrderRequest, HealthStatus, SendDataOutcome, UpdateWorkOrderRequest,
    WorkOrder, WorkOrderDetail, WorkOrderFilter, WorkOrderMutation, WorkOrderStatus,
};
use crate::types::{RecordId, ValidatedUrl};
use reqwest::{header, Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Error body returned by the server, as far as the client cares.
#[derive(Debug, Default, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Clone)]
pub struct WorkOrderClient {
    client: Client,
    base_url: Url,
}

impl WorkOrderClient {
    pub fn new(base_url: &ValidatedUrl) -> Result<Self, AppError> {
        Self::with_timeout(base_url, Duration::from_secs(CLIENT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: &ValidatedUrl, timeout: Duration) -> Result<Self, AppError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.as_url().clone(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, AppError> {
        self.base_url.join(path).map_err(|e| {
            AppError::internal(format!("Invalid API path {}: {}", path, e))
        })
    }

    pub async fn health(&self) -> Result<HealthStatus, AppError> {
        self.send(Method::GET, self.url("/api/health")?, None::<&()>)
            .await
    }

    pub async fn complete_data(&self) -> Result<CompleteData, AppError> {
        self.send(Method::GET, self.url("/api/datos-completos")?, None::<&()>)
            .await
    }

    pub async fn work_orders(&self, filter: &WorkOrderFilter) -> Result<Vec<WorkOrder>, AppError> {
        let mut url = self.url("/api/partes-trabajo")?;
        if !filter.is_empty() {
            let mut query = url.query_pairs_mut();
            if let Some(site) = &filter.site {
                query.append_pair("obra", site);
            }
            if let Some(date) = filter.date {
                query.append_pair("fecha", &date.to_string());
            }
        }
        self.send(Method::GET, url, None::<&()>).await
    }

    pub async fn work_order_detail(&self, id: &RecordId) -> Result<WorkOrderDetail, AppError> {
        let url = self.url(&format!("/api/partes-trabajo/{}/detalles", id))?;
        self.send(Method::GET, url, None::<&()>).await
    }

    pub async fn work_order_status(&self, id: &RecordId) -> Result<WorkOrderStatus, AppError> {
        let url = self.url(&format!("/api/partes-trabajo/{}/estado", id))?;
        self.send(Method::GET, url, None::<&()>).await
    }

    pub async fn create_work_order(
        &self,
        request: &CreateWorkOrderRequest,
    ) -> Result<WorkOrderMutation, AppError> {
        self.send(Method::POST, self.url("/api/partes-trabajo")?, Some(request))
            .await
    }

    pub async fn update_work_order(
        &self,
        id: &RecordId,
        request: &UpdateWorkOrderRequest,
    ) -> Result<WorkOrderMutation, AppError> {
        let url = self.url(&format!("/api/partes-trabajo/{}", id))?;
        self.send(Method::PUT, url, Some(request)).await
    }

    pub async fn send_work_order_data(&self, id: &RecordId) -> Result<SendDataOutcome, AppError> {
        let url = self.url(&format!("/api/partes-trabajo/{}/enviar-datos", id))?;
        self.send(Method::POST, url, None::<&()>).await
    }

    async fn send<T, B>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        log::debug!("{} {}", method, url);
        let mut request = self.client.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;

        if !status.is_success() {
            let body: RemoteErrorBody = serde_json::from_str(&text).unwrap_or_default();
            let message = match (body.error, body.details) {
                (Some(error), Some(details)) => format!("{}: {}", error, details),
                (Some(error), None) => error,
                (None, Some(details)) => details,
                (None, None) => preview(&text),
            };
            log::error!("{} responded {}: {}", url, status.as_u16(), message);
            return Err(AppError::Remote {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            AppError::MalformedResponse(format!(
                "{} from {} (body: {})",
                e,
                url,
                preview(&text)
            ))
        })
    }
}

fn preview(text: &str) -> String {
    text.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect()
}
