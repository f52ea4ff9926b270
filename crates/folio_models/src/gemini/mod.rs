//! Google Gemini API implementation.

mod client;
mod wire;

pub use client::GeminiClient;

use folio_error::ModelError;

/// Result type for Gemini-specific operations.
pub(crate) type GeminiResult<T> = Result<T, ModelError>;
