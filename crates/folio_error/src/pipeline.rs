//! Pipeline error types.
//!
//! These variants map the failure taxonomy of the story pipeline: missing
//! inputs are fatal, unparseable model output fails the run, schema-invalid
//! output retries the owning step, and invalid lifecycle transitions signal
//! a stale or concurrent run.

/// Specific error conditions for pipeline stages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum PipelineErrorKind {
    /// Required input rows were absent (no pages, no spreads). Fatal, no retry.
    #[display("Missing pipeline input: {}", _0)]
    InputMissing(String),
    /// All JSON recovery tiers were exhausted on model output. Fatal for the run.
    #[display("Model output unparseable in stage '{}': {}", stage, detail)]
    ModelOutputUnparseable {
        /// Pipeline stage that issued the model call
        stage: String,
        /// Description of the recovery failure
        detail: String,
    },
    /// Model output parsed but failed schema validation. The owning step retries.
    #[display("Model output failed schema validation in step '{}': {}", step, detail)]
    ModelOutputSchemaInvalid {
        /// Step whose output failed validation
        step: String,
        /// Description of the validation failure
        detail: String,
    },
    /// A status transition was rejected by the allowed-predecessor table.
    #[display("Invalid status transition for story {}: {}", story_id, detail)]
    InvalidTransition {
        /// Story whose status was being updated
        story_id: i64,
        /// Description of the rejected transition
        detail: String,
    },
    /// A retried step ran out of attempts.
    #[display("Step '{}' exhausted {} attempts: {}", step, attempts, detail)]
    StepExhausted {
        /// Step name
        step: String,
        /// Attempts made
        attempts: usize,
        /// Last error
        detail: String,
    },
    /// Outbound event dispatch failed.
    #[display("Event dispatch failed: {}", _0)]
    EventDispatch(String),
}

/// Error type for pipeline operations.
///
/// # Examples
///
/// ```
/// use folio_error::{PipelineError, PipelineErrorKind};
///
/// let err = PipelineError::new(PipelineErrorKind::InputMissing("no pages".to_string()));
/// assert!(format!("{}", err).contains("no pages"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Pipeline Error: {} at line {} in {}", kind, line, file)]
pub struct PipelineError {
    /// The specific error condition
    pub kind: PipelineErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl PipelineError {
    /// Create a new PipelineError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PipelineErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
