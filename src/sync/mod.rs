// src/sync/mod.rs
//! Client-side synchronization: a typed client for the REST API, retries,
//! and a watcher that follows a parte's estado with adaptive polling.

pub mod client;
pub mod polling;
pub mod retry;
pub mod watcher;

pub use client::WorkOrderClient;
pub use polling::PollSchedule;
pub use retry::{retry_default, retry_operation};
pub use watcher::{StatusChange, StatusSource, StatusWatcher};
