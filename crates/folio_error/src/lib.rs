//! Error types for the Folio pipeline.
//!
//! This crate provides the foundation error types used throughout the Folio
//! workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern for clean error
//! handling:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use folio_error::{FolioResult, JsonError};
//!
//! fn decode() -> FolioResult<String> {
//!     Err(JsonError::new("Unexpected end of input"))?
//! }
//!
//! match decode() {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
#[cfg(feature = "database")]
mod database;
mod error;
mod json;
mod model;
mod pipeline;
mod storage;

pub use config::ConfigError;
#[cfg(feature = "database")]
pub use database::{DatabaseError, DatabaseErrorKind};
pub use error::{FolioError, FolioErrorKind, FolioResult};
pub use json::JsonError;
pub use model::{ModelError, ModelErrorKind};
pub use pipeline::{PipelineError, PipelineErrorKind};
pub use storage::{StorageError, StorageErrorKind};
