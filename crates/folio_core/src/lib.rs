//! Core data types for the Folio illustrated-book pipeline.
//!
//! This crate provides the foundation data types shared across the Folio
//! workspace: the story data model, the lifecycle status table, the
//! generative-model gateway request types, and the pipeline event types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cover;
mod event;
mod request;
mod seed;
mod spread;
mod status;
mod story;

pub use cover::{CoverAsset, CoverKind, StyleReference};
pub use event::{CoverJobSpec, StoryEvent};
pub use request::{
    CompletionRequest, CompletionRequestBuilder, GeneratedImage, ImagePart,
};
pub use seed::{
    PageCharacterSeed, PagePlacementSeed, PresenceSeed, SceneDecisionSeed, SceneSeed, SpreadSeed,
};
pub use spread::{
    ExclusionAssignment, PresenceAssignment, PresenceRole, Spread, SpreadPresence, SpreadScene,
};
pub use status::StoryStatus;
pub use story::{Character, Location, Page, Story};
