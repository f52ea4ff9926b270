//! Spread planning: pair pages into spreads and place catalog names on them.

use crate::lifecycle::LifecycleController;
use crate::prompts;
use crate::recovery::recover_array;
use crate::runner::StepRunner;
use folio_core::{
    Character, CompletionRequest, Location, Page, PageCharacterSeed, PagePlacementSeed,
    PresenceRole, SpreadSeed, StoryEvent, StoryStatus,
};
use folio_error::{FolioResult, PipelineError, PipelineErrorKind};
use folio_interface::{EventSink, ModelCallRecord, StoryStore, TextModel};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const STAGE: &str = "spread_planner";

/// A left/right page pairing, before the model has seen it.
#[derive(Debug, Clone, PartialEq)]
pub struct PagePair {
    /// 0-based spread position
    pub index: i32,
    /// Left page (even pair slot)
    pub left: Page,
    /// Right page; `None` when the page count is odd
    pub right: Option<Page>,
}

/// Pair pages into spreads: left = even-indexed, right = odd-indexed.
///
/// Produces ⌈N/2⌉ pairs with indices 0..n-1.
pub fn pair_pages(pages: &[Page]) -> Vec<PagePair> {
    pages
        .chunks(2)
        .enumerate()
        .map(|(i, chunk)| PagePair {
            index: i as i32,
            left: chunk[0].clone(),
            right: chunk.get(1).cloned(),
        })
        .collect()
}

/// Planner output for one spread, as loosely as the model may shape it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlannedSpread {
    spread_index: Option<i64>,
    #[serde(default)]
    scene_summary: Option<String>,
    #[serde(default)]
    pages: Vec<RawPagePlacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPagePlacement {
    page: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    characters: Vec<RawCharacterPlacement>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCharacterPlacement {
    name: Option<String>,
    #[serde(default)]
    prominence: Option<String>,
    #[serde(default)]
    justification: Option<String>,
}

/// Groups a story's pages into spreads and asks the model to assign
/// per-page location and character presence.
///
/// Runs under the story's single-flight lock. Persistence is a full
/// replace, so a re-run on an unchanged story yields the same rows.
pub struct SpreadPlanner {
    store: Arc<dyn StoryStore>,
    model: Arc<dyn TextModel>,
    lifecycle: Arc<LifecycleController>,
    events: Arc<dyn EventSink>,
    max_step_attempts: usize,
}

impl SpreadPlanner {
    /// Assemble the planner from its collaborators.
    pub fn new(
        store: Arc<dyn StoryStore>,
        model: Arc<dyn TextModel>,
        lifecycle: Arc<LifecycleController>,
        events: Arc<dyn EventSink>,
        max_step_attempts: usize,
    ) -> Self {
        Self {
            store,
            model,
            lifecycle,
            events,
            max_step_attempts,
        }
    }

    /// Run the planning stage for one story.
    ///
    /// Advances to `building_spreads` for the duration of the run, then to
    /// `spreads_ready` on success. Any failure before the finalize
    /// checkpoint reverts to `planning`.
    #[instrument(skip(self))]
    pub async fn run(&self, story_id: i64) -> FolioResult<()> {
        let _flight = self.lifecycle.acquire(story_id).await;

        self.lifecycle
            .advance(story_id, StoryStatus::BuildingSpreads)
            .await?;

        match self.plan(story_id).await {
            Ok(count) if count > 0 => {
                self.lifecycle
                    .advance(story_id, StoryStatus::SpreadsReady)
                    .await?;
                self.events
                    .emit(StoryEvent::DecideSpreadScenes { story_id })
                    .await?;
                info!(story_id, spreads = count, "Spread planning complete");
                Ok(())
            }
            Ok(_) => {
                warn!(story_id, "Planner produced no spreads, reverting");
                self.lifecycle.revert(story_id, StoryStatus::Planning).await;
                Ok(())
            }
            Err(e) => {
                self.lifecycle.revert(story_id, StoryStatus::Planning).await;
                Err(e)
            }
        }
    }

    async fn plan(&self, story_id: i64) -> FolioResult<usize> {
        let runner = StepRunner::new(self.max_step_attempts);

        let pages = self.store.load_pages(story_id).await?;
        if pages.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::InputMissing(format!(
                "story {} has no pages",
                story_id
            )))
            .into());
        }
        let characters = self.store.load_characters(story_id).await?;
        let locations = self.store.load_locations(story_id).await?;
        let pairs = pair_pages(&pages);

        let raw = runner
            .run("plan_spreads", || {
                self.call_model(story_id, &pairs, &characters, &locations)
            })
            .await?;

        let seeds = merge_plan(&pairs, &raw, &characters, &locations);

        let inserted = runner
            .run("persist_spreads", || async {
                self.store.replace_spreads(story_id, &seeds).await
            })
            .await?;

        Ok(inserted)
    }

    /// One model call covering every spread, recovered leniently.
    async fn call_model(
        &self,
        story_id: i64,
        pairs: &[PagePair],
        characters: &[Character],
        locations: &[Location],
    ) -> FolioResult<Vec<RawPlannedSpread>> {
        let user = prompts::spread_planning_prompt(pairs, characters, locations);
        let request = CompletionRequest {
            system: prompts::PLANNER_SYSTEM.to_string(),
            user: user.clone(),
            prefill: Some(prompts::PLANNER_PREFILL.to_string()),
            temperature: Some(0.4),
            max_tokens: None,
            model: None,
        };

        let started = Instant::now();
        let outcome = self.model.complete(&request).await;
        let record = ModelCallRecord {
            story_id,
            stage: STAGE.to_string(),
            provider: self.model.provider_name().to_string(),
            model: self.model.model_name().to_string(),
            request_prompt: user,
            response_text: outcome.as_deref().unwrap_or_default().to_string(),
            duration_ms: started.elapsed().as_millis() as i32,
            error_message: outcome.as_ref().err().map(|e| e.to_string()),
        };
        if let Err(e) = self.store.record_model_call(&record).await {
            warn!(story_id, error = %e, "Failed to log model call");
        }
        let text = outcome?;

        let raw: Vec<RawPlannedSpread> = recover_array(&text, "spreads")
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        if raw.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::ModelOutputUnparseable {
                stage: STAGE.to_string(),
                detail: format!(
                    "no spreads recovered from {} bytes of model output",
                    text.len()
                ),
            })
            .into());
        }
        Ok(raw)
    }
}

/// Merge the model's placements onto the deterministic page pairing.
///
/// The pairing alone determines the spread set; the model contributes scene
/// summaries and page-level links. Normalization is lenient: unknown
/// prominence coerces to background, an unknown page side drops the entry,
/// and names outside the catalogs are silently skipped.
fn merge_plan(
    pairs: &[PagePair],
    raw: &[RawPlannedSpread],
    characters: &[Character],
    locations: &[Location],
) -> Vec<SpreadSeed> {
    let character_ids: HashMap<String, i64> = characters
        .iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();
    let location_ids: HashMap<String, i64> = locations
        .iter()
        .map(|l| (l.name.to_lowercase(), l.id))
        .collect();

    let mut planned: HashMap<i32, &RawPlannedSpread> = HashMap::new();
    for spread in raw {
        if let Some(index) = spread.spread_index {
            if let Ok(index) = i32::try_from(index) {
                planned.insert(index, spread);
            }
        }
    }

    pairs
        .iter()
        .map(|pair| {
            let spread = planned.get(&pair.index);
            let scene_summary = spread
                .and_then(|s| s.scene_summary.clone())
                .unwrap_or_default();

            let mut placements = Vec::new();
            if let Some(spread) = spread {
                for placement in &spread.pages {
                    let page_id = match placement.page.as_deref() {
                        Some("left") => pair.left.id,
                        Some("right") => match &pair.right {
                            Some(right) => right.id,
                            None => continue,
                        },
                        // Unknown page side drops the entry.
                        _ => continue,
                    };

                    let location_id = placement
                        .location
                        .as_ref()
                        .and_then(|name| location_ids.get(&name.to_lowercase()).copied());

                    let placed_characters = placement
                        .characters
                        .iter()
                        .filter_map(|c| {
                            let name = c.name.as_ref()?;
                            let character_id = character_ids.get(&name.to_lowercase()).copied()?;
                            Some(PageCharacterSeed {
                                character_id,
                                prominence: c
                                    .prominence
                                    .as_deref()
                                    .map(PresenceRole::from_loose)
                                    .unwrap_or(PresenceRole::Background),
                                justification: c.justification.clone().unwrap_or_default(),
                            })
                        })
                        .collect();

                    placements.push(PagePlacementSeed {
                        page_id,
                        location_id,
                        characters: placed_characters,
                    });
                }
            }

            SpreadSeed {
                index: pair.index,
                left_page_id: pair.left.id,
                right_page_id: pair.right.as_ref().map(|p| p.id),
                scene_summary,
                pages: placements,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(id: i64, number: i32) -> Page {
        Page {
            id,
            story_id: 1,
            page_number: number,
            text: format!("Page {} text", number),
        }
    }

    #[test]
    fn test_even_page_count_pairs_fully() {
        let pages: Vec<Page> = (1..=24).map(|n| page(100 + n as i64, n)).collect();
        let pairs = pair_pages(&pages);
        assert_eq!(pairs.len(), 12);
        assert_eq!(pairs[0].left.id, 101);
        assert_eq!(pairs[0].right.as_ref().unwrap().id, 102);
        assert_eq!(pairs[11].index, 11);
    }

    #[test]
    fn test_odd_page_count_leaves_trailing_single() {
        let pages: Vec<Page> = (1..=5).map(|n| page(n as i64, n)).collect();
        let pairs = pair_pages(&pages);
        assert_eq!(pairs.len(), 3);
        assert!(pairs[2].right.is_none());
    }

    #[test]
    fn test_merge_skips_unknown_names_and_coerces_prominence() {
        let pairs = pair_pages(&[page(1, 1), page(2, 2)]);
        let characters = vec![Character {
            id: 10,
            name: "Fox".to_string(),
            description: String::new(),
        }];
        let raw = vec![RawPlannedSpread {
            spread_index: Some(0),
            scene_summary: Some("dawn".to_string()),
            pages: vec![RawPagePlacement {
                page: Some("left".to_string()),
                location: Some("Nowhere Keep".to_string()),
                characters: vec![
                    RawCharacterPlacement {
                        name: Some("Fox".to_string()),
                        prominence: Some("protagonist".to_string()),
                        justification: None,
                    },
                    RawCharacterPlacement {
                        name: Some("Ghost".to_string()),
                        prominence: Some("primary".to_string()),
                        justification: None,
                    },
                ],
            }],
        }];

        let seeds = merge_plan(&pairs, &raw, &characters, &[]);
        assert_eq!(seeds.len(), 1);
        let placement = &seeds[0].pages[0];
        assert_eq!(placement.location_id, None);
        assert_eq!(placement.characters.len(), 1);
        assert_eq!(placement.characters[0].character_id, 10);
        assert_eq!(placement.characters[0].prominence, PresenceRole::Background);
    }

    #[test]
    fn test_merge_drops_unknown_page_side() {
        let pairs = pair_pages(&[page(1, 1)]);
        let raw = vec![RawPlannedSpread {
            spread_index: Some(0),
            scene_summary: None,
            pages: vec![
                RawPagePlacement {
                    page: Some("middle".to_string()),
                    location: None,
                    characters: vec![],
                },
                // Right side of a single-page spread also drops.
                RawPagePlacement {
                    page: Some("right".to_string()),
                    location: None,
                    characters: vec![],
                },
            ],
        }];

        let seeds = merge_plan(&pairs, &raw, &[], &[]);
        assert!(seeds[0].pages.is_empty());
    }

    #[test]
    fn test_merge_covers_every_pair_even_when_model_omits_one() {
        let pairs = pair_pages(&[page(1, 1), page(2, 2), page(3, 3), page(4, 4)]);
        let raw = vec![RawPlannedSpread {
            spread_index: Some(1),
            scene_summary: Some("only the second".to_string()),
            pages: vec![],
        }];

        let seeds = merge_plan(&pairs, &raw, &[], &[]);
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].scene_summary, "");
        assert_eq!(seeds[1].scene_summary, "only the second");
    }
}
