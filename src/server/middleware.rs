// src/server/middleware.rs
//! Request logging, CORS and per-client rate limiting.

use super::AppState;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::net::SocketAddr;
use std::time::Instant;

const ALLOWED_METHODS: &str = "GET,POST,PUT,PATCH,OPTIONS";
const ALLOWED_HEADERS: &str = "content-type,authorization,x-requested-with";

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    Any,
    AllowList(Vec<String>),
}

impl CorsPolicy {
    /// An empty list, or one containing `*`, allows any origin.
    pub fn from_origins(origins: Vec<String>) -> Self {
        let origins: Vec<String> = origins
            .into_iter()
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsPolicy::Any
        } else {
            CorsPolicy::AllowList(origins)
        }
    }

    /// Value for `access-control-allow-origin`, if `origin` is allowed.
    fn allow_origin(&self, origin: Option<&str>) -> Option<HeaderValue> {
        match self {
            CorsPolicy::Any => Some(HeaderValue::from_static("*")),
            CorsPolicy::AllowList(list) => {
                let origin = origin?;
                list.iter()
                    .any(|allowed| allowed == origin)
                    .then(|| HeaderValue::from_str(origin).ok())
                    .flatten()
            }
        }
    }
}

fn normalized_header_value(headers: &HeaderMap, key: &str, max_len: usize) -> Option<String> {
    let raw = headers.get(key)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > max_len {
        return None;
    }
    Some(raw.to_string())
}

fn normalized_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
    {
        Some(first.to_string())
    } else {
        None
    }
}

/// The key a request is rate limited under.
pub fn client_key(req: &Request<Body>) -> String {
    if let Some(forwarded) = normalized_forwarded_for(req.headers()) {
        return forwarded;
    }
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "anonymous".to_string())
}

pub async fn logging_middleware(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let resp = next.run(req).await;

    let elapsed_ms = started.elapsed().as_millis();
    let status = resp.status();
    if status.is_server_error() {
        log::warn!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    } else {
        log::info!("{} {} -> {} ({} ms)", method, path, status.as_u16(), elapsed_ms);
    }
    resp
}

pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = normalized_header_value(req.headers(), "origin", 256);
    let allow = state.cors.allow_origin(origin.as_deref());

    if req.method() == Method::OPTIONS {
        let mut resp = StatusCode::NO_CONTENT.into_response();
        if let Some(value) = allow {
            let headers = resp.headers_mut();
            headers.insert("access-control-allow-origin", value);
            headers.insert(
                "access-control-allow-methods",
                HeaderValue::from_static(ALLOWED_METHODS),
            );
            headers.insert(
                "access-control-allow-headers",
                HeaderValue::from_static(ALLOWED_HEADERS),
            );
            headers.insert("access-control-max-age", HeaderValue::from_static("600"));
            headers.insert("vary", HeaderValue::from_static("Origin"));
        }
        return resp;
    }

    let mut resp = next.run(req).await;
    if let Some(value) = allow {
        resp.headers_mut()
            .insert("access-control-allow-origin", value);
        resp.headers_mut()
            .insert("vary", HeaderValue::from_static("Origin"));
    }
    resp
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);
    if let Err(err) = state.limiter.check(&key) {
        log::warn!("Rate limit exceeded for {}", key);
        return err.into_response();
    }
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_policy_from_origins() {
        assert_eq!(CorsPolicy::from_origins(vec![]), CorsPolicy::Any);
        assert_eq!(
            CorsPolicy::from_origins(vec!["http://a.test".into(), "*".into()]),
            CorsPolicy::Any
        );
        assert_eq!(
            CorsPolicy::from_origins(vec![" http://a.test/ ".into()]),
            CorsPolicy::AllowList(vec!["http://a.test".into()])
        );
    }

    #[test]
    fn allow_list_only_echoes_known_origins() {
        let policy = CorsPolicy::AllowList(vec!["http://a.test".into()]);
        assert_eq!(
            policy.allow_origin(Some("http://a.test")),
            Some(HeaderValue::from_static("http://a.test"))
        );
        assert_eq!(policy.allow_origin(Some("http://b.test")), None);
        assert_eq!(policy.allow_origin(None), None);
        assert_eq!(
            CorsPolicy::Any.allow_origin(None),
            Some(HeaderValue::from_static("*"))
        );
    }

    #[test]
    fn client_key_prefers_forwarded_for() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.7, 172.16.0.1")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "10.0.0.7");

        let mut req = Request::builder().body(Body::empty()).unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 168, 1, 20], 5000))));
        assert_eq!(client_key(&req), "192.168.1.20");

        let req = Request::builder()
            .header("x-forwarded-for", "<script>")
            .body(Body::empty())
            .unwrap();
        assert_eq!(client_key(&req), "anonymous");
    }
}
