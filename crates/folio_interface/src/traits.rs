//! Trait definitions for the pipeline's external collaborators.

use crate::ModelCallRecord;
use async_trait::async_trait;
use folio_core::{
    Character, CompletionRequest, CoverAsset, CoverKind, GeneratedImage, ImagePart, Location, Page,
    SceneDecisionSeed, Spread, SpreadSeed, Story, StoryEvent, StoryStatus, StyleReference,
};
use folio_error::FolioResult;

/// Opaque text-completion gateway.
///
/// The model is treated as an unreliable collaborator: callers communicate
/// the expected schema informally inside the prompt and defend against
/// malformed output on the way back.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Generate a text completion for the request.
    async fn complete(&self, req: &CompletionRequest) -> FolioResult<String>;

    /// Provider name (e.g. "gemini").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier.
    fn model_name(&self) -> &str;
}

/// Image-generation gateway.
#[async_trait]
pub trait ImageModel: Send + Sync {
    /// Generate one image from interleaved text and reference-image parts.
    async fn generate_image(&self, parts: &[ImagePart]) -> FolioResult<GeneratedImage>;
}

/// Durable blob storage for generated assets.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store the bytes under `path` and return a durable public URL.
    async fn upload(&self, bytes: &[u8], mime: &str, path: &str) -> FolioResult<String>;

    /// Fetch previously uploaded bytes by their URL.
    ///
    /// Used to rehydrate reference images (style sample, interior pages)
    /// for visual-consistency conditioning.
    async fn fetch(&self, url: &str) -> FolioResult<Vec<u8>>;
}

/// Relational persistence gateway: the single source of truth.
///
/// Derived rows are only ever written through coarse full-replace
/// transactions scoped by story, and the status column is only ever written
/// through [`StoryStore::transition_status`].
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Load a story row.
    async fn load_story(&self, story_id: i64) -> FolioResult<Story>;

    /// Load a story's pages ordered by page number.
    async fn load_pages(&self, story_id: i64) -> FolioResult<Vec<Page>>;

    /// Load the story's character catalog.
    async fn load_characters(&self, story_id: i64) -> FolioResult<Vec<Character>>;

    /// Load the story's location catalog.
    async fn load_locations(&self, story_id: i64) -> FolioResult<Vec<Location>>;

    /// Load the story's persisted spreads ordered by index.
    async fn load_spreads(&self, story_id: i64) -> FolioResult<Vec<Spread>>;

    /// Replace all derived planner rows for the story in one transaction.
    ///
    /// Deletes existing spread, presence, scene, and page-link rows, then
    /// inserts the seeds. Returns the number of spreads inserted.
    async fn replace_spreads(&self, story_id: i64, seeds: &[SpreadSeed]) -> FolioResult<usize>;

    /// Replace all presence/scene rows for the story's spreads in one
    /// transaction. All-or-nothing across the whole decision set.
    async fn replace_scene_decisions(
        &self,
        story_id: i64,
        decisions: &[SceneDecisionSeed],
    ) -> FolioResult<()>;

    /// Atomically transition the story's status to `target`.
    ///
    /// Implemented as a single compare-and-set guarded by the
    /// allowed-predecessor table; fails with an `InvalidTransition` pipeline
    /// error when the current status is not a permitted predecessor.
    async fn transition_status(&self, story_id: i64, target: StoryStatus) -> FolioResult<()>;

    /// Record the style reference the external style step selected.
    ///
    /// Written before the cover trigger fires, so a bare trigger event is
    /// enough to start cover generation.
    async fn set_style_reference(
        &self,
        story_id: i64,
        reference: &StyleReference,
    ) -> FolioResult<()>;

    /// Load the story's recorded style reference, if one has been set.
    async fn load_style_reference(&self, story_id: i64) -> FolioResult<Option<StyleReference>>;

    /// Persist the generated URL (and prompt) for one cover.
    async fn set_cover_url(
        &self,
        story_id: i64,
        kind: CoverKind,
        prompt: &str,
        url: &str,
    ) -> FolioResult<()>;

    /// Load both cover assets for the story, absent entries omitted.
    async fn load_covers(&self, story_id: i64) -> FolioResult<Vec<CoverAsset>>;

    /// Append a model-call log record.
    async fn record_model_call(&self, record: &ModelCallRecord) -> FolioResult<()>;
}

/// Outbound trigger-event sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emit an event for asynchronous handling.
    async fn emit(&self, event: StoryEvent) -> FolioResult<()>;
}
