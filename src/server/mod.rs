// src/server/mod.rs
//! The REST API in front of the work-order store.

pub mod events;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod response;

use crate::constants::{DEFAULT_EVENTS_INTERVAL_SECS, MAX_REQUEST_BODY_BYTES};
use crate::repository::WorkOrderRepository;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post, put};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub use middleware::CorsPolicy;
pub use rate_limit::RateLimiter;

/// Shared by every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn WorkOrderRepository>,
    pub limiter: Arc<RateLimiter>,
    pub cors: Arc<CorsPolicy>,
    /// How often the SSE stream re-reads estado.
    pub events_interval: Duration,
}

impl AppState {
    /// State with default limits: 120 requests/minute, any origin, 5 s SSE polling.
    pub fn new(repo: Arc<dyn WorkOrderRepository>) -> Self {
        Self {
            repo,
            limiter: Arc::new(RateLimiter::per_minute(
                crate::constants::DEFAULT_RATE_LIMIT_PER_MINUTE,
            )),
            cors: Arc::new(CorsPolicy::Any),
            events_interval: Duration::from_secs(DEFAULT_EVENTS_INTERVAL_SECS),
        }
    }

    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.limiter = Arc::new(RateLimiter::per_minute(per_minute));
        self
    }

    pub fn with_cors(mut self, cors: CorsPolicy) -> Self {
        self.cors = Arc::new(cors);
        self
    }

    pub fn with_events_interval(mut self, interval: Duration) -> Self {
        self.events_interval = interval;
        self
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/obras", get(handlers::sites))
        .route("/api/obras/:id/empleados", get(handlers::site_employees))
        .route("/api/jefes-obra", get(handlers::supervisors))
        .route("/api/empleados", get(handlers::employees))
        .route(
            "/api/empleados/estado-opciones",
            get(handlers::employee_status_options),
        )
        .route(
            "/api/empleados/:id/estado",
            patch(handlers::update_employee_status),
        )
        .route(
            "/api/partes-trabajo",
            get(handlers::work_orders).post(handlers::create_work_order),
        )
        .route("/api/partes-trabajo/:id", put(handlers::update_work_order))
        .route(
            "/api/partes-trabajo/:id/empleados",
            get(handlers::work_order_employees),
        )
        .route(
            "/api/partes-trabajo/:id/detalles",
            get(handlers::work_order_detail),
        )
        .route(
            "/api/partes-trabajo/:id/estado",
            get(handlers::work_order_status),
        )
        .route(
            "/api/partes-trabajo/:id/eventos",
            get(handlers::work_order_events),
        )
        .route(
            "/api/partes-trabajo/:id/enviar-datos",
            post(handlers::send_work_order_data),
        )
        .route("/api/datos-completos", get(handlers::complete_data))
        .fallback(handlers::fallback)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), middleware::cors_middleware))
        .layer(from_fn(middleware::logging_middleware))
        .with_state(state)
}

/// Serves the API on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let mode = state.repo.mode();
    if let Ok(addr) = listener.local_addr() {
        log::info!("Listening on http://{} ({} mode)", addr, mode);
    }
    let app = build_router(state);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}
