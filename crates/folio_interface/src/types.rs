//! Shared record types for the gateway traits.

use serde::{Deserialize, Serialize};

/// A logged model call, recorded for post-hoc debugging of pipeline runs.
///
/// One row per completion call: which story and stage issued it, what was
/// sent, what came back (or what failed), and how long it took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCallRecord {
    /// Story the call was made for
    pub story_id: i64,
    /// Pipeline stage that issued the call (e.g. "spread_planner")
    pub stage: String,
    /// Provider name (e.g. "gemini")
    pub provider: String,
    /// Model identifier used
    pub model: String,
    /// The user prompt sent
    pub request_prompt: String,
    /// Raw response text, empty on failure
    pub response_text: String,
    /// Wall-clock duration of the call
    pub duration_ms: i32,
    /// Error message if the call failed
    pub error_message: Option<String>,
}
