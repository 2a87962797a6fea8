//! HTTP adapter (axum). Drives the inbound ScheduleApi port.

pub mod error;
pub mod router;

pub use error::ApiError;
pub use router::{AppState, bearer_token, router};
