//! Spread, presence, and scene entity types.

use serde::{Deserialize, Serialize};

/// A two-page layout unit sharing one illustrated scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spread {
    /// Database identifier
    pub id: i64,
    /// Owning story
    pub story_id: i64,
    /// 0-based position, unique and monotonic per story
    pub index: i32,
    /// Left page of the spread
    pub left_page_id: i64,
    /// Right page; `None` for the trailing spread of an odd page count
    pub right_page_id: Option<i64>,
    /// One-line summary of the scene shared by both pages
    pub scene_summary: String,
}

/// Visual emphasis of a character within a scene.
///
/// # Examples
///
/// ```
/// use folio_core::PresenceRole;
///
/// let role: PresenceRole = "secondary".parse().unwrap();
/// assert_eq!(role, PresenceRole::Secondary);
/// assert!("protagonist".parse::<PresenceRole>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
pub enum PresenceRole {
    /// Focal character of the scene
    #[display("primary")]
    Primary,
    /// Present and visible, not focal
    #[display("secondary")]
    Secondary,
    /// Incidental, may be small or partially occluded
    #[display("background")]
    Background,
}

impl PresenceRole {
    /// Database column representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceRole::Primary => "primary",
            PresenceRole::Secondary => "secondary",
            PresenceRole::Background => "background",
        }
    }

    /// Lenient parse for planner output: unrecognized prominence values
    /// coerce to [`PresenceRole::Background`] rather than erroring.
    pub fn from_loose(s: &str) -> Self {
        s.parse().unwrap_or(PresenceRole::Background)
    }
}

impl std::str::FromStr for PresenceRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(PresenceRole::Primary),
            "secondary" => Ok(PresenceRole::Secondary),
            "background" => Ok(PresenceRole::Background),
            other => Err(format!("Unknown presence role: {}", other)),
        }
    }
}

/// A character assigned to a spread with its role and rationale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresenceAssignment {
    /// Character drawn from the story's catalog
    pub character_id: i64,
    /// Visual emphasis in the scene
    pub role: PresenceRole,
    /// Model confidence in the assignment, 0.0 to 1.0
    pub confidence: f32,
    /// Model rationale for the assignment
    pub reason: String,
}

/// A character deliberately excluded from a spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionAssignment {
    /// Character drawn from the story's catalog
    pub character_id: i64,
    /// Why the character must not appear in the illustration
    pub reason: String,
}

/// Characters and location assigned to a spread. Exactly one row per spread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadPresence {
    /// Owning spread (1:1)
    pub spread_id: i64,
    /// Canonical location of the scene, if any
    pub primary_location_id: Option<i64>,
    /// Characters present in the scene
    pub characters: Vec<PresenceAssignment>,
    /// Characters that must not appear
    pub excluded_characters: Vec<ExclusionAssignment>,
}

/// Illustration directives for a spread. Exactly one row per spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadScene {
    /// Owning spread (1:1)
    pub spread_id: i64,
    /// Summary of the scene as decided by the model
    pub scene_summary: String,
    /// Prompt handed to the image-generation provider
    pub illustration_prompt: String,
    /// Framing and layout guidance
    pub composition_notes: String,
    /// Emotional register of the scene
    pub mood: String,
    /// Elements the illustration must omit (prose)
    pub do_not_include: String,
    /// Negative prompt for the image provider
    pub negative_prompt: String,
}
