// src/api/client.rs
//! HTTP client for the Notion API.
//!
//! Handles authentication headers, retries of transient failures and
//! cursor pagination. Knows nothing about partes or obras.

use super::parser::{parse_error, parse_success};
use super::responses::{NotionPage, PaginatedResponse};
use super::simple_pagination::fetch_all_pages;
use crate::constants::{
    NOTION_MAX_ATTEMPTS, NOTION_MAX_QUERY_PAGES, NOTION_MAX_RETRY_AFTER_SECS,
    NOTION_RETRY_BASE_DELAY_MS, NOTION_VERSION,
};
use crate::error::AppError;
use crate::types::{ApiKey, ValidatedUrl};
use reqwest::{header, Client, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
    max_attempts: u32,
    retry_base_delay: Duration,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(
        api_key: &ApiKey,
        base_url: &ValidatedUrl,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(api_key)?)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trimmed().to_string(),
            max_attempts: NOTION_MAX_ATTEMPTS,
            retry_base_delay: Duration::from_millis(NOTION_RETRY_BASE_DELAY_MS),
        })
    }

    /// Overrides the retry policy.
    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.retry_base_delay = base_delay;
        self
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_static(NOTION_VERSION),
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, AppError> {
        self.execute(Method::GET, endpoint, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.execute(Method::POST, endpoint, Some(&body)).await
    }

    pub async fn patch<T, B>(&self, endpoint: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = serde_json::to_value(body)?;
        self.execute(Method::PATCH, endpoint, Some(&body)).await
    }

    /// Sends one request, retrying rate limits and transient failures.
    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> Result<T, AppError> {
        let url = self.url(endpoint);
        let mut attempt = 1;

        loop {
            log::debug!("{} {} (attempt {})", method, url, attempt);
            let mut request = self.client.request(method.clone(), &url);
            if let Some(body) = body {
                request = request.json(body);
            }

            let backoff = self.retry_base_delay * 2u32.saturating_pow(attempt - 1);
            let retries_left = attempt < self.max_attempts;

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) if retries_left && (e.is_timeout() || e.is_connect()) => {
                    log::warn!("{} {} failed ({}), retrying in {:?}", method, url, e, backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                    continue;
                }
                Err(e) => {
                    log::error!("{} {} failed: {}", method, url, e);
                    return Err(e.into());
                }
            };

            let status = response.status();
            let retry_after = retry_after(response.headers());
            let text = response.text().await?;

            if status.is_success() {
                return parse_success(&text, &url);
            }

            let error = parse_error(&text, status, &url);
            if let AppError::NotionService { code, message, .. } = &error {
                if retries_left && code.is_retryable() {
                    let delay = retry_after.unwrap_or(backoff);
                    log::warn!(
                        "Notion answered {} ({}) for {} {}, retrying in {:?}",
                        status,
                        code,
                        method,
                        url,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                log::error!(
                    "Notion request {} {} failed: status={} code={} message={}",
                    method,
                    url,
                    status,
                    code,
                    message
                );
            }
            return Err(error);
        }
    }

    /// Queries a database and follows `next_cursor` until every row is loaded.
    ///
    /// `body` carries the filter and sorts; pagination fields are added here.
    pub async fn query_all(&self, database: &str, body: Value) -> Result<Vec<NotionPage>, AppError> {
        let endpoint = format!("databases/{}/query", database);
        let endpoint = endpoint.as_str();
        let body = &body;

        let result = fetch_all_pages(
            |page_size, cursor| {
                let mut query = body.clone();
                if !query.is_object() {
                    query = json!({});
                }
                query["page_size"] = json!(page_size);
                if let Some(cursor) = cursor {
                    query["start_cursor"] = json!(cursor);
                }
                async move {
                    self.post::<PaginatedResponse<NotionPage>, _>(endpoint, &query)
                        .await
                }
            },
            Some(NOTION_MAX_QUERY_PAGES),
        )
        .await?;

        log::debug!(
            "Query {} returned {} rows in {} pages",
            database,
            result.items.len(),
            result.pages_fetched
        );
        Ok(result.items)
    }
}

/// Seconds from a `Retry-After` header, if present and numeric, capped at
/// [`NOTION_MAX_RETRY_AFTER_SECS`].
fn retry_after(headers: &header::HeaderMap) -> Option<Duration> {
    headers
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(|secs| Duration::from_secs(secs.min(NOTION_MAX_RETRY_AFTER_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_reads_seconds() {
        let mut headers = header::HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(header::RETRY_AFTER, header::HeaderValue::from_static("3"));
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(3)));
        headers.insert(
            header::RETRY_AFTER,
            header::HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"),
        );
        assert_eq!(retry_after(&headers), None);
    }

    #[test]
    fn retry_after_is_capped() {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::RETRY_AFTER, header::HeaderValue::from_static("86400"));
        assert_eq!(
            retry_after(&headers),
            Some(Duration::from_secs(NOTION_MAX_RETRY_AFTER_SECS))
        );
    }

    #[test]
    fn urls_join_without_double_slashes() {
        let key = ApiKey::new("secret_abcdefghijklmnopqrstuvwxyz").unwrap();
        let base = ValidatedUrl::parse("http://127.0.0.1:9999/v1/").unwrap();
        let client = NotionHttpClient::new(&key, &base, Duration::from_secs(1)).unwrap();
        assert_eq!(client.url("/pages/abc"), "http://127.0.0.1:9999/v1/pages/abc");
        assert_eq!(client.url("databases/x/query"), "http://127.0.0.1:9999/v1/databases/x/query");
    }
}
