//! Asynchronous story pipeline.
//!
//! Turns a story's linear manuscript into an illustrated book dossier
//! through three staged model-backed transformations:
//!
//! 1. [`SpreadPlanner`] pairs pages into spreads and places catalog names.
//! 2. [`SceneDecisionEngine`] decides canonical presence and illustration
//!    directives per spread.
//! 3. [`AssetGenerationOrchestrator`] fans out the two cover jobs and fans
//!    them in to `covers_ready`.
//!
//! The stages communicate through [`folio_core::StoryEvent`] triggers and
//! share one coarse status field, written only through the
//! [`LifecycleController`]'s compare-and-set. Model output is untrusted;
//! see [`recovery`] for the tiered best-effort decoder.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod covers;
mod lifecycle;
mod planner;
pub mod prompts;
pub mod recovery;
mod runner;
mod scenes;

pub use covers::{AssetGenerationOrchestrator, MAX_INTERIOR_REFERENCES};
pub use lifecycle::LifecycleController;
pub use planner::{pair_pages, PagePair, SpreadPlanner};
pub use recovery::recover_array;
pub use runner::StepRunner;
pub use scenes::{
    SceneDecisionEngine, SpreadBrief, DEFAULT_EXCLUSION_REASON, SCENE_BATCH_SIZE,
};
