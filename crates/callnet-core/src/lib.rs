#![forbid(unsafe_code)]
//! callnet-core library.
//!
//! Call-detail-record model, CSV ingestion and time bucketing shared by the
//! analytics engine and the CLI.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums with a stable [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod error;
pub mod ingest;
pub mod record;
pub mod time;

pub use error::ErrorCode;
pub use ingest::{LoadError, load_calls, parse_calls};
pub use record::{CallRecord, CallTable, CallType};
pub use time::TimeSlot;
