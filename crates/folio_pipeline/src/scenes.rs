//! Scene decisions: canonical presence and illustration directives per spread.

use crate::lifecycle::LifecycleController;
use crate::prompts;
use crate::recovery::recover_array;
use crate::runner::StepRunner;
use folio_core::{
    Character, CompletionRequest, ExclusionAssignment, Location, PresenceAssignment, PresenceRole,
    SceneDecisionSeed, SceneSeed, PresenceSeed, Spread, StoryStatus,
};
use folio_error::{FolioResult, PipelineError, PipelineErrorKind};
use folio_interface::{ModelCallRecord, StoryStore, TextModel};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, instrument, warn};

const STAGE: &str = "scene_decision";

/// Spreads per model call, bounding prompt and response size.
pub const SCENE_BATCH_SIZE: usize = 5;

/// Reason recorded for an exclusion the model sent as a bare name.
pub const DEFAULT_EXCLUSION_REASON: &str = "excluded without a stated reason";

/// What the scene prompt needs to know about one spread.
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadBrief {
    /// Persisted spread id
    pub spread_id: i64,
    /// 0-based spread position
    pub index: i32,
    /// Left page text
    pub left_text: String,
    /// Right page text, absent for a trailing single page
    pub right_text: Option<String>,
    /// Scene summary from the planner
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSceneDecision {
    spread_index: Option<i64>,
    #[serde(default)]
    primary_location: Option<String>,
    #[serde(default)]
    characters: Vec<RawPresence>,
    #[serde(default)]
    excluded_characters: Vec<Value>,
    #[serde(default)]
    scene_summary: Option<String>,
    #[serde(default)]
    illustration_prompt: Option<String>,
    #[serde(default)]
    composition_notes: Option<String>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    do_not_include: Option<String>,
    #[serde(default)]
    negative_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPresence {
    name: Option<String>,
    role: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
    #[serde(default)]
    reason: Option<String>,
}

/// Decides presence and illustration directives for every spread of a story.
///
/// Spreads are processed in fixed-size sequential batches; each batch is an
/// independently retried step validated against a strict schema. Decisions
/// accumulate in memory and persist in one all-or-nothing transaction after
/// every batch has succeeded.
pub struct SceneDecisionEngine {
    store: Arc<dyn StoryStore>,
    model: Arc<dyn TextModel>,
    lifecycle: Arc<LifecycleController>,
    max_step_attempts: usize,
    batch_size: usize,
}

impl SceneDecisionEngine {
    /// Assemble the engine from its collaborators.
    pub fn new(
        store: Arc<dyn StoryStore>,
        model: Arc<dyn TextModel>,
        lifecycle: Arc<LifecycleController>,
        max_step_attempts: usize,
    ) -> Self {
        Self {
            store,
            model,
            lifecycle,
            max_step_attempts,
            batch_size: SCENE_BATCH_SIZE,
        }
    }

    /// Override the batch size (tests and small deployments).
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Run the scene-decision stage for one story.
    ///
    /// No in-flight status exists for this stage: the story stays at
    /// `spreads_ready` until the single final persist, then moves to
    /// `scenes_ready`. A failed run therefore leaves status untouched.
    #[instrument(skip(self))]
    pub async fn run(&self, story_id: i64) -> FolioResult<()> {
        let _flight = self.lifecycle.acquire(story_id).await;
        let runner = StepRunner::new(self.max_step_attempts);

        let spreads = self.store.load_spreads(story_id).await?;
        if spreads.is_empty() {
            return Err(PipelineError::new(PipelineErrorKind::InputMissing(format!(
                "story {} has no spreads",
                story_id
            )))
            .into());
        }
        let characters = self.store.load_characters(story_id).await?;
        let locations = self.store.load_locations(story_id).await?;
        let briefs = self.load_briefs(story_id, &spreads).await?;

        let mut decisions: Vec<SceneDecisionSeed> = Vec::with_capacity(briefs.len());
        for (batch_number, batch) in briefs.chunks(self.batch_size).enumerate() {
            let step = format!("decide_scenes_batch_{:02}", batch_number);
            let batch_decisions = runner
                .run(&step, || {
                    self.decide_batch(story_id, &step, batch, &characters, &locations)
                })
                .await?;
            decisions.extend(batch_decisions);
        }

        self.store
            .replace_scene_decisions(story_id, &decisions)
            .await?;
        self.lifecycle
            .advance(story_id, StoryStatus::ScenesReady)
            .await?;
        info!(story_id, decisions = decisions.len(), "Scene decisions complete");
        Ok(())
    }

    async fn load_briefs(&self, story_id: i64, spreads: &[Spread]) -> FolioResult<Vec<SpreadBrief>> {
        let pages = self.store.load_pages(story_id).await?;
        let texts: HashMap<i64, &str> = pages.iter().map(|p| (p.id, p.text.as_str())).collect();

        Ok(spreads
            .iter()
            .map(|spread| SpreadBrief {
                spread_id: spread.id,
                index: spread.index,
                left_text: texts
                    .get(&spread.left_page_id)
                    .copied()
                    .unwrap_or_default()
                    .to_string(),
                right_text: spread
                    .right_page_id
                    .and_then(|id| texts.get(&id).copied())
                    .map(str::to_string),
                summary: spread.scene_summary.clone(),
            })
            .collect())
    }

    /// One batch: model call, recovery, strict validation.
    async fn decide_batch(
        &self,
        story_id: i64,
        step: &str,
        batch: &[SpreadBrief],
        characters: &[Character],
        locations: &[Location],
    ) -> FolioResult<Vec<SceneDecisionSeed>> {
        let user = prompts::scene_decision_prompt(batch, characters, locations);
        let request = CompletionRequest {
            system: prompts::SCENES_SYSTEM.to_string(),
            user: user.clone(),
            prefill: Some(prompts::SCENES_PREFILL.to_string()),
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

        let raw: Vec<RawSceneDecision> = recover_array(&text, "decisions")
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect();

        validate_batch(step, batch, &raw, characters, locations)
    }
}

fn schema_invalid(step: &str, detail: String) -> folio_error::FolioError {
    PipelineError::new(PipelineErrorKind::ModelOutputSchemaInvalid {
        step: step.to_string(),
        detail,
    })
    .into()
}

/// Validate one batch response against the strict schema.
///
/// Every spread in the batch must receive exactly one decision with a legal
/// role set and the required text fields. Any violation rejects the whole
/// batch, which the step runner then retries.
fn validate_batch(
    step: &str,
    batch: &[SpreadBrief],
    raw: &[RawSceneDecision],
    characters: &[Character],
    locations: &[Location],
) -> FolioResult<Vec<SceneDecisionSeed>> {
    let character_ids: HashMap<String, i64> = characters
        .iter()
        .map(|c| (c.name.to_lowercase(), c.id))
        .collect();
    let location_ids: HashMap<String, i64> = locations
        .iter()
        .map(|l| (l.name.to_lowercase(), l.id))
        .collect();
    let spread_ids: HashMap<i32, i64> = batch.iter().map(|b| (b.index, b.spread_id)).collect();

    let mut by_index: HashMap<i32, &RawSceneDecision> = HashMap::new();
    for decision in raw {
        let index = decision
            .spread_index
            .and_then(|i| i32::try_from(i).ok())
            .ok_or_else(|| schema_invalid(step, "decision missing spreadIndex".to_string()))?;
        if !spread_ids.contains_key(&index) {
            return Err(schema_invalid(
                step,
                format!("decision references spread {} outside the batch", index),
            ));
        }
        if by_index.insert(index, decision).is_some() {
            return Err(schema_invalid(
                step,
                format!("duplicate decision for spread {}", index),
            ));
        }
    }

    let mut seeds = Vec::with_capacity(batch.len());
    for brief in batch {
        let decision = by_index.get(&brief.index).ok_or_else(|| {
            schema_invalid(step, format!("no decision for spread {}", brief.index))
        })?;

        let scene_summary = require_text(step, "sceneSummary", &decision.scene_summary)?;
        let illustration_prompt =
            require_text(step, "illustrationPrompt", &decision.illustration_prompt)?;

        let mut assignments = Vec::new();
        for presence in &decision.characters {
            let role_text = presence
                .role
                .as_deref()
                .ok_or_else(|| schema_invalid(step, "presence entry missing role".to_string()))?;
            let role: PresenceRole = role_text
                .parse()
                .map_err(|e: String| schema_invalid(step, e))?;

            // Names outside the catalog are dropped, never invented.
            let Some(name) = presence.name.as_ref() else {
                continue;
            };
            let Some(character_id) = character_ids.get(&name.to_lowercase()).copied() else {
                continue;
            };

            assignments.push(PresenceAssignment {
                character_id,
                role,
                confidence: presence.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
                reason: presence.reason.clone().unwrap_or_default(),
            });
        }

        let excluded = normalize_exclusions(&decision.excluded_characters, &character_ids);

        let primary_location_id = decision
            .primary_location
            .as_ref()
            .and_then(|name| location_ids.get(&name.to_lowercase()).copied());

        seeds.push(SceneDecisionSeed {
            spread_id: brief.spread_id,
            presence: PresenceSeed {
                primary_location_id,
                characters: assignments,
                excluded_characters: excluded,
            },
            scene: SceneSeed {
                scene_summary,
                illustration_prompt,
                composition_notes: decision.composition_notes.clone().unwrap_or_default(),
                mood: decision.mood.clone().unwrap_or_default(),
                do_not_include: decision.do_not_include.clone().unwrap_or_default(),
                negative_prompt: decision.negative_prompt.clone().unwrap_or_default(),
            },
        });
    }
    Ok(seeds)
}

fn require_text(step: &str, field: &str, value: &Option<String>) -> FolioResult<String> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.clone()),
        _ => Err(schema_invalid(step, format!("missing required field {}", field))),
    }
}

/// Normalize `excludedCharacters` entries to the richer form.
///
/// Entries arrive either as a bare name or as `{name, reason}`; a missing
/// reason defaults to [`DEFAULT_EXCLUSION_REASON`]. Names outside the
/// catalog are skipped.
fn normalize_exclusions(
    entries: &[Value],
    character_ids: &HashMap<String, i64>,
) -> Vec<ExclusionAssignment> {
    entries
        .iter()
        .filter_map(|entry| {
            let (name, reason) = match entry {
                Value::String(name) => (name.clone(), None),
                Value::Object(map) => {
                    let name = map
                        .get("name")
                        .or_else(|| map.get("characterId"))
                        .or_else(|| map.get("character"))
                        .and_then(Value::as_str)?
                        .to_string();
                    let reason = map
                        .get("reason")
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    (name, reason)
                }
                _ => return None,
            };
            let character_id = character_ids.get(&name.to_lowercase()).copied()?;
            Some(ExclusionAssignment {
                character_id,
                reason: reason.unwrap_or_else(|| DEFAULT_EXCLUSION_REASON.to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brief(spread_id: i64, index: i32) -> SpreadBrief {
        SpreadBrief {
            spread_id,
            index,
            left_text: "left".to_string(),
            right_text: Some("right".to_string()),
            summary: "summary".to_string(),
        }
    }

    fn catalog() -> Vec<Character> {
        vec![
            Character {
                id: 10,
                name: "Fox".to_string(),
                description: String::new(),
            },
            Character {
                id: 11,
                name: "char-1".to_string(),
                description: String::new(),
            },
        ]
    }

    fn decision(index: i64) -> RawSceneDecision {
        RawSceneDecision {
            spread_index: Some(index),
            primary_location: None,
            characters: vec![RawPresence {
                name: Some("Fox".to_string()),
                role: Some("primary".to_string()),
                confidence: Some(0.9),
                reason: None,
            }],
            excluded_characters: vec![],
            scene_summary: Some("a scene".to_string()),
            illustration_prompt: Some("a prompt".to_string()),
            composition_notes: None,
            mood: None,
            do_not_include: None,
            negative_prompt: None,
        }
    }

    #[test]
    fn test_valid_batch_maps_to_seeds() {
        let batch = vec![brief(100, 0), brief(101, 1)];
        let raw = vec![decision(0), decision(1)];
        let seeds = validate_batch("b0", &batch, &raw, &catalog(), &[]).unwrap();
        assert_eq!(seeds.len(), 2);
        assert_eq!(seeds[0].spread_id, 100);
        assert_eq!(seeds[0].presence.characters[0].role, PresenceRole::Primary);
    }

    #[test]
    fn test_illegal_role_rejects_whole_batch() {
        let batch = vec![brief(100, 0)];
        let mut bad = decision(0);
        bad.characters[0].role = Some("narrator".to_string());
        let err = validate_batch("b0", &batch, &[bad], &catalog(), &[]).unwrap_err();
        assert!(format!("{}", err).contains("narrator"));
    }

    #[test]
    fn test_missing_decision_rejects_batch() {
        let batch = vec![brief(100, 0), brief(101, 1)];
        let raw = vec![decision(0)];
        assert!(validate_batch("b0", &batch, &raw, &catalog(), &[]).is_err());
    }

    #[test]
    fn test_missing_required_text_rejects_batch() {
        let batch = vec![brief(100, 0)];
        let mut bad = decision(0);
        bad.illustration_prompt = Some("   ".to_string());
        assert!(validate_batch("b0", &batch, &[bad], &catalog(), &[]).is_err());
    }

    #[test]
    fn test_bare_exclusion_normalizes_with_default_reason() {
        let character_ids: HashMap<String, i64> =
            catalog().iter().map(|c| (c.name.to_lowercase(), c.id)).collect();
        let entries = vec![Value::String("char-1".to_string())];
        let normalized = normalize_exclusions(&entries, &character_ids);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].character_id, 11);
        assert_eq!(normalized[0].reason, DEFAULT_EXCLUSION_REASON);
    }

    #[test]
    fn test_object_exclusion_keeps_reason() {
        let character_ids: HashMap<String, i64> =
            catalog().iter().map(|c| (c.name.to_lowercase(), c.id)).collect();
        let entries = vec![serde_json::json!({"name": "Fox", "reason": "offstage"})];
        let normalized = normalize_exclusions(&entries, &character_ids);
        assert_eq!(normalized[0].reason, "offstage");
    }

    #[test]
    fn test_unknown_presence_name_skipped_but_role_still_checked() {
        let batch = vec![brief(100, 0)];
        let mut raw = decision(0);
        raw.characters.push(RawPresence {
            name: Some("Stranger".to_string()),
            role: Some("secondary".to_string()),
            confidence: None,
            reason: None,
        });
        let seeds = validate_batch("b0", &batch, &[raw], &catalog(), &[]).unwrap();
        assert_eq!(seeds[0].presence.characters.len(), 1);
    }
}
