//! Story, page, and catalog entity types.

use crate::StoryStatus;
use serde::{Deserialize, Serialize};

/// Root of the story lifecycle.
///
/// # Examples
///
/// ```
/// use folio_core::{Story, StoryStatus};
///
/// let story = Story {
///     id: 1,
///     status: StoryStatus::Planning,
///     title: "The Lighthouse Fox".to_string(),
///     author: "M. Ashby".to_string(),
///     page_count: 24,
/// };
/// assert_eq!(story.status, StoryStatus::Planning);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    /// Database identifier
    pub id: i64,
    /// Lifecycle status (the pipeline's coarse mutex)
    pub status: StoryStatus,
    /// Book title
    pub title: String,
    /// Author credit printed on the cover
    pub author: String,
    /// Number of pages in the manuscript
    pub page_count: i32,
}

/// A single manuscript page. Immutable input to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Database identifier
    pub id: i64,
    /// Owning story
    pub story_id: i64,
    /// 1-based position in the manuscript
    pub page_number: i32,
    /// Narrative text of the page
    pub text: String,
}

/// A character known to a story.
///
/// Characters are scoped to a story through a join table; the planner and
/// scene stages may only reference characters drawn from this catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Database identifier
    pub id: i64,
    /// Canonical name as it appears in the catalog
    pub name: String,
    /// Visual/narrative description used in prompts
    pub description: String,
}

/// A location known to a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Database identifier
    pub id: i64,
    /// Canonical name as it appears in the catalog
    pub name: String,
    /// Visual/narrative description used in prompts
    pub description: String,
}
