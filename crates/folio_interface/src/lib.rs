//! Gateway traits for the Folio pipeline.
//!
//! The pipeline composes long-running external collaborators behind
//! async-trait seams: the generative model, the blob store, the relational
//! store, and the event bus. Implementations live in sibling crates
//! (`folio_models`, `folio_storage`, `folio_database`) or in test fakes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{BlobStore, EventSink, ImageModel, StoryStore, TextModel};
pub use types::ModelCallRecord;
