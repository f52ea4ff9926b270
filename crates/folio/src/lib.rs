//! Folio turns linear narrative text into an illustrated, print-ready book
//! dossier by orchestrating staged calls to a generative model and
//! persisting the derived structure.
//!
//! # Pipeline
//!
//! A story moves through a fixed graph of stages, reported through one
//! coarse status field:
//!
//! ```text
//! planning -> building_spreads -> spreads_ready -> scenes_ready
//!   -> needs_style -> generating_covers -> covers_ready -> done
//! ```
//!
//! - **SpreadPlanner** pairs pages into two-page spreads and asks the model
//!   which catalog characters and locations appear on each page.
//! - **SceneDecisionEngine** batches spreads and asks the model for canonical
//!   presence and an illustration prompt per spread.
//! - **AssetGenerationOrchestrator** fans out the front/back cover jobs and
//!   fans them in once both URLs are persisted.
//!
//! Model output is treated as untrusted text and decoded through a tiered
//! best-effort recovery; derived rows are only written through full-replace
//! transactions, making every stage safe to re-run.
//!
//! # Architecture
//!
//! Folio is organized as a workspace with focused crates:
//!
//! - `folio_core` - entities, lifecycle status, events, seed rows
//! - `folio_error` - error types
//! - `folio_interface` - gateway traits for the external collaborators
//! - `folio_storage` - filesystem blob store for generated assets
//! - `folio_models` - Gemini text and image clients
//! - `folio_database` - PostgreSQL persistence
//! - `folio_pipeline` - the three pipeline stages and their plumbing
//!
//! This crate (`folio`) re-exports everything and ships the CLI binary.

pub use folio_core::*;
pub use folio_database::*;
pub use folio_error::*;
pub use folio_interface::*;
pub use folio_models::*;
pub use folio_pipeline::*;
pub use folio_storage::*;

mod app;
mod config;

pub use app::PipelineApp;
pub use config::FolioConfig;
