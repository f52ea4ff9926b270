//! Request types for the generative-model gateway.

use serde::{Deserialize, Serialize};

/// A text-completion request.
///
/// The schema of the expected output is communicated informally through an
/// inline JSON example in `user`; an optional assistant-turn `prefill`
/// biases the model toward a valid continuation (e.g. `{"spreads": [`).
///
/// # Examples
///
/// ```
/// use folio_core::CompletionRequest;
///
/// let request = CompletionRequest::builder()
///     .system("You are a picture-book layout planner.".to_string())
///     .user("Group these pages into spreads...".to_string())
///     .prefill(Some("{\"spreads\": [".to_string()))
///     .build()
///     .unwrap();
///
/// assert!(request.prefill.is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder)]
#[builder(default)]
pub struct CompletionRequest {
    /// System instructions
    pub system: String,
    /// User prompt, including the inline schema example
    pub user: String,
    /// Optional assistant-turn prefill the model continues from
    pub prefill: Option<String>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Model identifier override
    pub model: Option<String>,
}

impl CompletionRequest {
    /// Create a builder for a completion request.
    pub fn builder() -> CompletionRequestBuilder {
        CompletionRequestBuilder::default()
    }
}

/// One part of an image-generation request: instruction text or an inline
/// reference image for visual-consistency conditioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ImagePart {
    /// Instruction text
    Text(String),
    /// Inline reference image
    Image {
        /// MIME type, e.g. "image/png"
        mime: String,
        /// Raw image bytes
        bytes: Vec<u8>,
    },
}

/// A generated image returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    /// Raw image bytes
    pub bytes: Vec<u8>,
    /// MIME type of the bytes
    pub mime: String,
}
