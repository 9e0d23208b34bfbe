//! Application layer containing business logic and shared state.

pub mod report_service;
pub mod state;

pub use report_service::{DEFAULT_CACHE_TTL_SECS, DEFAULT_FETCH_LIMIT, ReportService};
pub use state::AppState;
