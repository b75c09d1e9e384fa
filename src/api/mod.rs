// src/api/mod.rs
//! Notion API interaction: the HTTP client, the wire format of pages and
//! properties, and the adapter that maps the five work-order databases
//! onto the [`WorkOrderRepository`](crate::repository::WorkOrderRepository)
//! seam.
//!
//! Parsing stays separate from I/O so property decoding can be tested
//! without a network.

pub mod client;
mod parser;
pub mod properties;
pub mod responses;
pub mod schema;
mod simple_pagination;
pub mod store;

pub use client::NotionHttpClient;
pub use schema::{DatabaseIds, NotionSchema};
pub use store::NotionWorkOrders;
