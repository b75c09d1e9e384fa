// src/constants.rs
//! Domain constants that define the operational boundaries of the service.
//!
//! Each constant is named for the domain concept it constrains. Reading
//! them should tell you how the service talks to Notion, how long it
//! waits, and how much input it accepts.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// Notion API version pinned in every request.
pub const NOTION_VERSION: &str = "2022-06-28";

/// Default Notion API base URL. Overridable for tests and proxies.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100.
pub const NOTION_API_PAGE_SIZE: u32 = 100;

/// Upper bound on pages followed for one database query.
pub const NOTION_MAX_QUERY_PAGES: u32 = 50;

/// Timeout for a single Notion request.
pub const NOTION_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Attempts made for a Notion call that fails with a retryable code.
pub const NOTION_MAX_ATTEMPTS: u32 = 3;

/// First backoff delay between retryable Notion failures.
pub const NOTION_RETRY_BASE_DELAY_MS: u64 = 500;

/// Longest `Retry-After` wait honored before retrying a Notion request.
pub const NOTION_MAX_RETRY_AFTER_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Work-order rules
// ---------------------------------------------------------------------------

/// Hours assigned to an employee when the request does not specify any.
pub const DEFAULT_EMPLOYEE_HOURS: f64 = 8.0;

/// Hours recorded for one employee on one parte can't exceed a day.
pub const MAX_EMPLOYEE_HOURS: f64 = 24.0;

/// Estado assigned to every new parte.
pub const DRAFT_STATE: &str = "Borrador";

/// Estado a parte moves to once its data has been sent for signing.
pub const DATA_SENT_STATE: &str = "Datos Enviados";

/// Name of the button property that triggers the send-data flow.
pub const SEND_DATA_PROPERTY: &str = "Enviar Datos";

// ---------------------------------------------------------------------------
// Request sanitizing
// ---------------------------------------------------------------------------

/// Maximum characters kept from names and short text fields.
pub const MAX_NAME_LENGTH: usize = 200;

/// Maximum characters kept from free-text notes.
pub const MAX_NOTES_LENGTH: usize = 2000;

/// Maximum length of a record ID accepted in paths and bodies.
pub const MAX_RECORD_ID_LENGTH: usize = 64;

/// Maximum employees assigned in a single create/update request.
pub const MAX_EMPLOYEES_PER_PARTE: usize = 100;

/// Request bodies above this size are rejected before parsing.
pub const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Server defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PORT: u16 = 3001;

/// Seconds a cached read stays valid.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Distinct cached reads kept at once.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Requests per minute granted to each client.
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 120;

/// Rate limit checks between sweeps of idle client buckets.
pub const RATE_LIMIT_SWEEP_EVERY: u64 = 1024;

/// How often the SSE stream re-reads a parte's estado.
pub const DEFAULT_EVENTS_INTERVAL_SECS: u64 = 5;

/// Interval between SSE keep-alive comments.
pub const EVENTS_KEEP_ALIVE_SECS: u64 = 15;

// ---------------------------------------------------------------------------
// Client-side synchronization
// ---------------------------------------------------------------------------

/// Timeout for requests made by the sync client.
pub const CLIENT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Poll interval used while nothing is happening.
pub const POLL_BASE_INTERVAL_MS: u64 = 5_000;

/// Poll interval used right after a change was observed.
pub const POLL_FAST_INTERVAL_MS: u64 = 2_000;

/// Polls kept at the fast interval after a change.
pub const POLL_FAST_CYCLES: u32 = 3;

/// Ceiling for the adaptive poll interval.
pub const POLL_MAX_INTERVAL_MS: u64 = 60_000;

/// Growth factor applied after each unchanged poll.
pub const POLL_IDLE_GROWTH: f64 = 1.5;

/// Attempts made by `retry_operation` before giving up.
pub const RETRY_MAX_ATTEMPTS: u32 = 3;

/// First delay used by `retry_operation`; doubled after each failure.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1_000;

// ---------------------------------------------------------------------------
// Error display
// ---------------------------------------------------------------------------

/// Maximum characters shown when previewing error response bodies.
pub const ERROR_BODY_PREVIEW_LENGTH: usize = 200;
