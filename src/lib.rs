// src/lib.rs
//! obra-partes library: a REST service for construction-site work orders
//! (partes de trabajo) stored in Notion, and a client that keeps up with
//! their estado.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `ValidationError`, `NotionErrorCode`
//! - **Configuration**: `CommandLineInput`, `ServerConfig`, `WatchConfig`
//! - **Domain model**: `WorkOrder`, `HoursEntry`, `Site`, `Employee`, request types
//! - **Stores**: `WorkOrderRepository`, `NotionWorkOrders`, `MockWorkOrders`, `CachedRepository`
//! - **Server**: `build_router`, `serve`, `AppState`
//! - **Sync**: `WorkOrderClient`, `StatusWatcher`, `PollSchedule`, `retry_operation`

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
pub mod mock;
pub mod model;
pub mod repository;
pub mod sanitize;
pub mod server;
pub mod sync;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, NotionErrorCode};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{Backend, CommandLineInput, ServerConfig, WatchConfig};

// --- Domain Model ---
pub use crate::model::{
    CompleteData, CreateWorkOrderRequest, Employee, HealthStatus, HoursEntry, SendDataOutcome,
    Site, StatusOptions, Supervisor, UpdateEmployeeStatusRequest, UpdateWorkOrderRequest,
    WorkOrder, WorkOrderDetail, WorkOrderFilter, WorkOrderMutation, WorkOrderState,
    WorkOrderStatus,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, RecordId, ValidatedUrl};

// --- Stores ---
pub use crate::api::{DatabaseIds, NotionHttpClient, NotionSchema, NotionWorkOrders};
pub use crate::mock::MockWorkOrders;
pub use crate::repository::{CachedRepository, WorkOrderRepository};

// --- Server ---
pub use crate::server::{build_router, serve, AppState, CorsPolicy};

// --- Sync ---
pub use crate::sync::{
    retry_operation, PollSchedule, StatusChange, StatusSource, StatusWatcher, WorkOrderClient,
};
