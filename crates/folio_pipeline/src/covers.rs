//! Cover generation: fan out two jobs, fan in to `covers_ready`.

use crate::lifecycle::LifecycleController;
use crate::prompts;
use folio_core::{CoverJobSpec, CoverKind, ImagePart, StoryEvent, StoryStatus};
use folio_error::{FolioResult, PipelineError, PipelineErrorKind};
use folio_interface::{BlobStore, EventSink, ImageModel, StoryStore};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Reference images attached to one generation request: the style sample
/// plus up to this many interior pages.
pub const MAX_INTERIOR_REFERENCES: usize = 3;

/// Fans out the two cover jobs and fans them in to a completion state.
///
/// The two jobs are the one genuinely concurrent pair in the pipeline. They
/// share no mutable state except the monotonic completion check: after
/// persisting its URL, each job re-reads both cover rows and performs the
/// `covers_ready` transition when both URLs are present. The check is
/// idempotent and order-independent, so either job may be the one to
/// complete the story.
pub struct AssetGenerationOrchestrator {
    store: Arc<dyn StoryStore>,
    images: Arc<dyn ImageModel>,
    blobs: Arc<dyn BlobStore>,
    lifecycle: Arc<LifecycleController>,
    events: Arc<dyn EventSink>,
}

impl AssetGenerationOrchestrator {
    /// Assemble the orchestrator from its collaborators.
    pub fn new(
        store: Arc<dyn StoryStore>,
        images: Arc<dyn ImageModel>,
        blobs: Arc<dyn BlobStore>,
        lifecycle: Arc<LifecycleController>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            images,
            blobs,
            lifecycle,
            events,
        }
    }

    /// Handle the bare cover trigger for a story.
    ///
    /// The external style step records its selection on the story before
    /// firing the trigger, so the event carries only the story id. A
    /// trigger for a story with no recorded reference is a fatal input
    /// error; the status is untouched so the trigger can be re-fired once
    /// the reference lands.
    #[instrument(skip(self))]
    pub async fn run(&self, story_id: i64) -> FolioResult<()> {
        let reference = self
            .store
            .load_style_reference(story_id)
            .await?
            .ok_or_else(|| {
                PipelineError::new(PipelineErrorKind::InputMissing(format!(
                    "story {} has no recorded style reference",
                    story_id
                )))
            })?;
        self.dispatch(
            story_id,
            &reference.image_url,
            &reference.interior_page_urls,
        )
        .await
    }

    /// Fan out: advance to `generating_covers` and emit exactly two
    /// single-cover events.
    #[instrument(skip(self, style_image_url, interior_page_urls))]
    pub async fn dispatch(
        &self,
        story_id: i64,
        style_image_url: &str,
        interior_page_urls: &[String],
    ) -> FolioResult<()> {
        let story = self.store.load_story(story_id).await?;
        self.lifecycle
            .advance(story_id, StoryStatus::GeneratingCovers)
            .await?;

        let interior: Vec<String> = interior_page_urls
            .iter()
            .take(MAX_INTERIOR_REFERENCES)
            .cloned()
            .collect();

        for kind in [CoverKind::Front, CoverKind::Back] {
            let prompt = match kind {
                CoverKind::Front => format!(
                    "The defining scene of \"{}\", composed as a cover illustration",
                    story.title
                ),
                CoverKind::Back => format!(
                    "A quiet corner of the world of \"{}\"",
                    story.title
                ),
            };
            self.events
                .emit(StoryEvent::GenerateSingleCover {
                    story_id,
                    job: CoverJobSpec {
                        kind,
                        prompt,
                        title: story.title.clone(),
                        author: story.author.clone(),
                        style_image_url: style_image_url.to_string(),
                        interior_page_urls: interior.clone(),
                    },
                })
                .await?;
        }
        info!(story_id, "Dispatched front and back cover jobs");
        Ok(())
    }

    /// Run one cover job end to end.
    ///
    /// Failure here is isolated: the sibling job is unaffected and the
    /// story simply stays at `generating_covers` until this job is retried
    /// successfully.
    #[instrument(skip(self, job), fields(kind = %job.kind))]
    pub async fn run_single(&self, story_id: i64, job: &CoverJobSpec) -> FolioResult<()> {
        let parts = self.assemble_parts(job).await?;
        let image = self.images.generate_image(&parts).await?;

        let path = format!(
            "stories/{}/covers/{}.{}",
            story_id,
            job.kind,
            extension_for(&image.mime)
        );
        let url = self.blobs.upload(&image.bytes, &image.mime, &path).await?;
        self.store
            .set_cover_url(story_id, job.kind, &job.prompt, &url)
            .await?;
        info!(story_id, kind = %job.kind, url, "Cover asset persisted");

        self.try_finish(story_id).await
    }

    /// Build the generation request: instructions first, then the style
    /// sample, then interior pages.
    async fn assemble_parts(&self, job: &CoverJobSpec) -> FolioResult<Vec<ImagePart>> {
        let instructions = match job.kind {
            CoverKind::Front => {
                prompts::front_cover_instructions(&job.prompt, &job.title, &job.author)
            }
            CoverKind::Back => prompts::back_cover_instructions(&job.prompt, &job.title),
        };

        let mut parts = vec![ImagePart::Text(instructions)];
        let style_bytes = self.blobs.fetch(&job.style_image_url).await?;
        parts.push(ImagePart::Image {
            mime: "image/png".to_string(),
            bytes: style_bytes,
        });

        for url in job.interior_page_urls.iter().take(MAX_INTERIOR_REFERENCES) {
            match self.blobs.fetch(url).await {
                Ok(bytes) => parts.push(ImagePart::Image {
                    mime: "image/png".to_string(),
                    bytes,
                }),
                // A missing interior reference degrades conditioning but
                // does not fail the job.
                Err(e) => warn!(url, error = %e, "Skipping unavailable interior reference"),
            }
        }
        Ok(parts)
    }

    /// Fan-in: transition to `covers_ready` once both URLs are present.
    ///
    /// Safe to call from either job in any order; the lifecycle treats a
    /// transition that a sibling already performed as success.
    async fn try_finish(&self, story_id: i64) -> FolioResult<()> {
        let covers = self.store.load_covers(story_id).await?;
        let has = |kind: CoverKind| {
            covers
                .iter()
                .any(|c| c.kind == kind && c.url.as_deref().is_some_and(|u| !u.is_empty()))
        };

        if has(CoverKind::Front) && has(CoverKind::Back) {
            self.lifecycle
                .advance(story_id, StoryStatus::CoversReady)
                .await?;
            info!(story_id, "Both covers present, story is covers_ready");
        }
        Ok(())
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}
