//! Pipeline trigger events.
//!
//! Stages communicate through coarse events rather than direct calls: a
//! successful planner run emits the scene-decision trigger, and the cover
//! dispatch fans out into exactly two single-cover events.

use crate::CoverKind;
use serde::{Deserialize, Serialize};

/// Payload of a single-cover generation job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverJobSpec {
    /// Front or back
    pub kind: CoverKind,
    /// Target illustration prompt
    pub prompt: String,
    /// Title text to render on the cover
    pub title: String,
    /// Author credit to render on the cover
    pub author: String,
    /// URL of the style reference image
    pub style_image_url: String,
    /// URLs of interior illustrated pages used for visual consistency
    pub interior_page_urls: Vec<String>,
}

/// A trigger event in the story pipeline.
///
/// # Examples
///
/// ```
/// use folio_core::StoryEvent;
///
/// let event = StoryEvent::BuildSpreads { story_id: 7 };
/// assert_eq!(event.name(), "story.build-spreads");
/// assert_eq!(event.story_id(), 7);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")]
pub enum StoryEvent {
    /// Run the SpreadPlanner for a story.
    #[serde(rename = "story.build-spreads")]
    BuildSpreads {
        /// Target story
        story_id: i64,
    },
    /// Run the SceneDecisionEngine for a story.
    #[serde(rename = "story.decide-spread-scenes")]
    DecideSpreadScenes {
        /// Target story
        story_id: i64,
    },
    /// Fan out the two cover jobs for a story.
    #[serde(rename = "story.generate.covers")]
    GenerateCovers {
        /// Target story
        story_id: i64,
    },
    /// Generate one cover asset.
    #[serde(rename = "story.generate.single-cover")]
    GenerateSingleCover {
        /// Target story
        story_id: i64,
        /// Job payload
        job: CoverJobSpec,
    },
}

impl StoryEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            StoryEvent::BuildSpreads { .. } => "story.build-spreads",
            StoryEvent::DecideSpreadScenes { .. } => "story.decide-spread-scenes",
            StoryEvent::GenerateCovers { .. } => "story.generate.covers",
            StoryEvent::GenerateSingleCover { .. } => "story.generate.single-cover",
        }
    }

    /// Story the event targets.
    pub fn story_id(&self) -> i64 {
        match self {
            StoryEvent::BuildSpreads { story_id }
            | StoryEvent::DecideSpreadScenes { story_id }
            | StoryEvent::GenerateCovers { story_id }
            | StoryEvent::GenerateSingleCover { story_id, .. } => *story_id,
        }
    }
}
