//! Freshly computed rows handed to the store for full-replace persistence.
//!
//! The pipeline never mutates derived rows in place. Each stage computes a
//! complete set of seed values and hands them to the store, which deletes the
//! prior rows for the story and inserts the seeds in one transaction.

use crate::{ExclusionAssignment, PresenceAssignment, PresenceRole};
use serde::{Deserialize, Serialize};

/// A character placed on a single page by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageCharacterSeed {
    /// Character drawn from the story's catalog
    pub character_id: i64,
    /// Prominence on this page
    pub prominence: PresenceRole,
    /// Model justification for the placement
    pub justification: String,
}

/// Planner output for one page of a spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagePlacementSeed {
    /// The page this placement describes
    pub page_id: i64,
    /// Location assigned to the page, if recognized
    pub location_id: Option<i64>,
    /// Characters present on the page
    pub characters: Vec<PageCharacterSeed>,
}

/// A freshly planned spread with its page-level links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadSeed {
    /// 0-based position in the book
    pub index: i32,
    /// Left page of the spread
    pub left_page_id: i64,
    /// Right page; `None` for the trailing spread of an odd page count
    pub right_page_id: Option<i64>,
    /// One-line scene summary from the planner
    pub scene_summary: String,
    /// Page-level location/character links
    pub pages: Vec<PagePlacementSeed>,
}

/// Presence portion of a scene decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceSeed {
    /// Canonical location of the scene, if any
    pub primary_location_id: Option<i64>,
    /// Characters present with role, confidence, and rationale
    pub characters: Vec<PresenceAssignment>,
    /// Characters that must not appear
    pub excluded_characters: Vec<ExclusionAssignment>,
}

/// Scene portion of a scene decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSeed {
    /// Summary of the scene
    pub scene_summary: String,
    /// Prompt for the image provider
    pub illustration_prompt: String,
    /// Framing and layout guidance
    pub composition_notes: String,
    /// Emotional register
    pub mood: String,
    /// Elements to omit (prose)
    pub do_not_include: String,
    /// Negative prompt for the image provider
    pub negative_prompt: String,
}

/// The complete decision for one spread: presence plus scene directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneDecisionSeed {
    /// The spread this decision applies to
    pub spread_id: i64,
    /// Presence rows to insert
    pub presence: PresenceSeed,
    /// Scene rows to insert
    pub scene: SceneSeed,
}
