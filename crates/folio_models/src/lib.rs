//! Generative-model provider clients for Folio.
//!
//! Currently one provider: Google Gemini over its REST API, implementing
//! both the text-completion and image-generation gateways.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod gemini;

pub use gemini::GeminiClient;
