//! Story lifecycle control: single-flight runs and status transitions.

use folio_core::StoryStatus;
use folio_error::{FolioErrorKind, FolioResult, PipelineErrorKind};
use folio_interface::StoryStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, instrument, warn};

/// Owns status writes and per-story run serialization.
///
/// Status is only ever written through the store's compare-and-set; this
/// controller adds the single-flight guard (two triggers for the same story
/// serialize rather than race) and idempotent handling of transitions that
/// already happened.
pub struct LifecycleController {
    store: Arc<dyn StoryStore>,
    flights: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl LifecycleController {
    /// Create a controller over the given store.
    pub fn new(store: Arc<dyn StoryStore>) -> Self {
        Self {
            store,
            flights: Mutex::new(HashMap::new()),
        }
    }

    /// Acquire the single-flight lock for a story.
    ///
    /// Held for the duration of a pipeline run; a second trigger for the
    /// same story waits here instead of racing.
    pub async fn acquire(&self, story_id: i64) -> OwnedMutexGuard<()> {
        let flight = {
            let mut flights = self.flights.lock().await;
            // An entry only the map still references belongs to a finished
            // run; drop it so the map stays bounded by in-flight stories.
            flights.retain(|_, flight| Arc::strong_count(flight) > 1);
            Arc::clone(flights.entry(story_id).or_default())
        };
        flight.lock_owned().await
    }

    /// Number of stories currently tracked by the single-flight map.
    pub async fn tracked_stories(&self) -> usize {
        self.flights.lock().await.len()
    }

    /// Advance the story to `target`.
    ///
    /// Idempotent: a rejected transition where the story already sits at
    /// `target` (a concurrent sibling got there first) is treated as
    /// success.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn advance(&self, story_id: i64, target: StoryStatus) -> FolioResult<()> {
        match self.store.transition_status(story_id, target).await {
            Ok(()) => Ok(()),
            Err(e) if is_invalid_transition(&e) => {
                let story = self.store.load_story(story_id).await?;
                if story.status == target {
                    debug!(story_id, status = %target, "Already at target status");
                    Ok(())
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Revert the story to its pre-stage status after a failed run.
    ///
    /// Best-effort: a revert that fails (story deleted, concurrent change)
    /// is logged and swallowed so the original stage error propagates.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn revert(&self, story_id: i64, target: StoryStatus) {
        if let Err(e) = self.advance(story_id, target).await {
            warn!(story_id, target = %target, error = %e, "Status revert failed");
        }
    }
}

fn is_invalid_transition(err: &folio_error::FolioError) -> bool {
    matches!(
        err.kind(),
        FolioErrorKind::Pipeline(p) if matches!(p.kind, PipelineErrorKind::InvalidTransition { .. })
    )
}
