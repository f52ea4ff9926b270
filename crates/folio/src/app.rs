//! Pipeline wiring and the event dispatch loop.

use crate::FolioConfig;
use async_trait::async_trait;
use folio_core::{StoryEvent, StoryStatus, StyleReference};
use folio_database::{establish_connection, PgStoryStore};
use folio_error::{FolioResult, PipelineError, PipelineErrorKind};
use folio_interface::{BlobStore, EventSink, ImageModel, StoryStore, TextModel};
use folio_models::GeminiClient;
use folio_pipeline::{
    AssetGenerationOrchestrator, LifecycleController, SceneDecisionEngine, SpreadPlanner,
};
use folio_storage::FileSystemBlobStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Event sink backed by the app's own inbox channel.
struct ChannelEventSink {
    tx: mpsc::UnboundedSender<StoryEvent>,
}

#[async_trait]
impl EventSink for ChannelEventSink {
    async fn emit(&self, event: StoryEvent) -> FolioResult<()> {
        self.tx.send(event).map_err(|e| {
            PipelineError::new(PipelineErrorKind::EventDispatch(e.to_string())).into()
        })
    }
}

/// The assembled pipeline: stages wired to shared collaborators plus an
/// in-process event loop.
///
/// Stage-emitted events (the scene-decision trigger, the two single-cover
/// jobs) land in the app's inbox and are processed by [`PipelineApp::drain`].
/// A failing event handler is logged and isolated so one cover job cannot
/// take down its sibling.
pub struct PipelineApp {
    store: Arc<dyn StoryStore>,
    planner: SpreadPlanner,
    scenes: SceneDecisionEngine,
    covers: AssetGenerationOrchestrator,
    inbox: Mutex<mpsc::UnboundedReceiver<StoryEvent>>,
    outbox: mpsc::UnboundedSender<StoryEvent>,
}

impl PipelineApp {
    /// Wire the pipeline from configuration.
    ///
    /// Connects to PostgreSQL, builds the Gemini client from the
    /// environment, and roots the blob store on the local filesystem.
    pub fn new(config: &FolioConfig) -> FolioResult<Self> {
        let conn = establish_connection(&config.database_url()?)?;
        let store: Arc<dyn StoryStore> = Arc::new(PgStoryStore::new(conn));

        let mut gemini = GeminiClient::new()?;
        if let Some(model) = &config.text_model {
            gemini = gemini.with_text_model(model);
        }
        if let Some(model) = &config.image_model {
            gemini = gemini.with_image_model(model);
        }
        gemini = gemini.with_retry(config.no_retry, config.max_retries, config.retry_backoff_ms);
        let text: Arc<dyn TextModel> = Arc::new(gemini.clone());
        let images: Arc<dyn ImageModel> = Arc::new(gemini);

        let blobs: Arc<dyn BlobStore> = Arc::new(FileSystemBlobStore::new(
            &config.storage_root,
            &config.storage_base_url,
        )?);

        let lifecycle = Arc::new(LifecycleController::new(Arc::clone(&store)));
        let (tx, rx) = mpsc::unbounded_channel();
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink { tx: tx.clone() });

        let planner = SpreadPlanner::new(
            Arc::clone(&store),
            Arc::clone(&text),
            Arc::clone(&lifecycle),
            Arc::clone(&sink),
            config.max_step_attempts,
        );
        let scenes = SceneDecisionEngine::new(
            Arc::clone(&store),
            text,
            Arc::clone(&lifecycle),
            config.max_step_attempts,
        )
        .with_batch_size(config.scene_batch_size);
        let covers =
            AssetGenerationOrchestrator::new(Arc::clone(&store), images, blobs, lifecycle, sink);

        info!("Pipeline assembled");
        Ok(Self {
            store,
            planner,
            scenes,
            covers,
            inbox: Mutex::new(rx),
            outbox: tx,
        })
    }

    /// Queue an event for [`PipelineApp::drain`] to process.
    pub fn submit(&self, event: StoryEvent) -> FolioResult<()> {
        self.outbox.send(event).map_err(|e| {
            PipelineError::new(PipelineErrorKind::EventDispatch(e.to_string())).into()
        })
    }

    /// Handle one event synchronously.
    pub async fn handle(&self, event: StoryEvent) -> FolioResult<()> {
        match event {
            StoryEvent::BuildSpreads { story_id } => self.planner.run(story_id).await,
            StoryEvent::DecideSpreadScenes { story_id } => self.scenes.run(story_id).await,
            StoryEvent::GenerateCovers { story_id } => self.covers.run(story_id).await,
            StoryEvent::GenerateSingleCover { story_id, job } => {
                self.covers.run_single(story_id, &job).await
            }
        }
    }

    /// Record the style reference and fire the cover trigger.
    ///
    /// Stands in for the external style step: the reference is persisted on
    /// the story first, so the trigger itself carries only the story id.
    pub async fn dispatch_covers(
        &self,
        story_id: i64,
        style_image_url: &str,
        interior_page_urls: &[String],
    ) -> FolioResult<()> {
        self.store
            .set_style_reference(
                story_id,
                &StyleReference {
                    image_url: style_image_url.to_string(),
                    interior_page_urls: interior_page_urls.to_vec(),
                },
            )
            .await?;
        self.handle(StoryEvent::GenerateCovers { story_id }).await
    }

    /// Process queued events until the inbox is empty.
    ///
    /// Handler failures are logged and swallowed: the coarse status field is
    /// the externally observable failure signal, and a failed job must not
    /// prevent its siblings from running.
    pub async fn drain(&self) {
        loop {
            let next = { self.inbox.lock().await.try_recv() };
            match next {
                Ok(event) => {
                    let name = event.name();
                    let story_id = event.story_id();
                    if let Err(e) = self.handle(event).await {
                        error!(event = name, story_id, error = %e, "Pipeline stage failed");
                    }
                }
                Err(_) => break,
            }
        }
    }

    /// Current lifecycle status of a story.
    pub async fn story_status(&self, story_id: i64) -> FolioResult<StoryStatus> {
        Ok(self.store.load_story(story_id).await?.status)
    }
}
