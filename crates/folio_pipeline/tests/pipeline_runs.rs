//! End-to-end pipeline runs against in-memory collaborators.

use async_trait::async_trait;
use folio_core::{
    Character, CompletionRequest, CoverAsset, CoverKind, GeneratedImage, ImagePart, Location, Page,
    SceneDecisionSeed, Spread, SpreadSeed, Story, StoryEvent, StoryStatus, StyleReference,
};
use folio_error::{
    FolioResult, ModelError, ModelErrorKind, PipelineError, PipelineErrorKind, StorageError,
    StorageErrorKind,
};
use folio_interface::{
    BlobStore, EventSink, ImageModel, ModelCallRecord, StoryStore, TextModel,
};
use folio_pipeline::{
    AssetGenerationOrchestrator, LifecycleController, SceneDecisionEngine, SpreadPlanner,
    DEFAULT_EXCLUSION_REASON,
};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct StoreState {
    story: Option<Story>,
    pages: Vec<Page>,
    characters: Vec<Character>,
    locations: Vec<Location>,
    spreads: Vec<Spread>,
    decisions: Vec<SceneDecisionSeed>,
    covers: HashMap<CoverKind, CoverAsset>,
    style_reference: Option<StyleReference>,
    calls: Vec<ModelCallRecord>,
    next_spread_id: i64,
}

/// In-memory `StoryStore` with the same CAS and full-replace semantics as
/// the real one.
#[derive(Debug)]
struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    fn with_story(status: StoryStatus, page_count: i32) -> Arc<Self> {
        let pages = (1..=page_count)
            .map(|n| Page {
                id: 100 + n as i64,
                story_id: 1,
                page_number: n,
                text: format!("Page {} of the fox's journey.", n),
            })
            .collect();
        let state = StoreState {
            story: Some(Story {
                id: 1,
                status,
                title: "The Lighthouse Fox".to_string(),
                author: "M. Ashby".to_string(),
                page_count,
            }),
            pages,
            characters: vec![
                Character {
                    id: 10,
                    name: "Fox".to_string(),
                    description: "A small red fox".to_string(),
                },
                Character {
                    id: 11,
                    name: "char-1".to_string(),
                    description: "A visiting heron".to_string(),
                },
            ],
            locations: vec![Location {
                id: 20,
                name: "The Lighthouse".to_string(),
                description: "A white lighthouse on a cliff".to_string(),
            }],
            next_spread_id: 1000,
            ..Default::default()
        };
        Arc::new(Self {
            state: Mutex::new(state),
        })
    }

    fn status(&self) -> StoryStatus {
        self.state.lock().unwrap().story.as_ref().unwrap().status
    }

    fn spreads(&self) -> Vec<Spread> {
        self.state.lock().unwrap().spreads.clone()
    }

    fn decisions(&self) -> Vec<SceneDecisionSeed> {
        self.state.lock().unwrap().decisions.clone()
    }

    fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

#[async_trait]
impl StoryStore for MemoryStore {
    async fn load_story(&self, _story_id: i64) -> FolioResult<Story> {
        Ok(self.state.lock().unwrap().story.clone().unwrap())
    }

    async fn load_pages(&self, _story_id: i64) -> FolioResult<Vec<Page>> {
        Ok(self.state.lock().unwrap().pages.clone())
    }

    async fn load_characters(&self, _story_id: i64) -> FolioResult<Vec<Character>> {
        Ok(self.state.lock().unwrap().characters.clone())
    }

    async fn load_locations(&self, _story_id: i64) -> FolioResult<Vec<Location>> {
        Ok(self.state.lock().unwrap().locations.clone())
    }

    async fn load_spreads(&self, _story_id: i64) -> FolioResult<Vec<Spread>> {
        Ok(self.state.lock().unwrap().spreads.clone())
    }

    async fn replace_spreads(&self, story_id: i64, seeds: &[SpreadSeed]) -> FolioResult<usize> {
        let mut state = self.state.lock().unwrap();
        state.spreads.clear();
        state.decisions.clear();
        for seed in seeds {
            let id = state.next_spread_id;
            state.next_spread_id += 1;
            state.spreads.push(Spread {
                id,
                story_id,
                index: seed.index,
                left_page_id: seed.left_page_id,
                right_page_id: seed.right_page_id,
                scene_summary: seed.scene_summary.clone(),
            });
        }
        Ok(seeds.len())
    }

    async fn replace_scene_decisions(
        &self,
        _story_id: i64,
        decisions: &[SceneDecisionSeed],
    ) -> FolioResult<()> {
        self.state.lock().unwrap().decisions = decisions.to_vec();
        Ok(())
    }

    async fn transition_status(&self, story_id: i64, target: StoryStatus) -> FolioResult<()> {
        let mut state = self.state.lock().unwrap();
        let story = state.story.as_mut().unwrap();
        if target.is_allowed_from(story.status) {
            story.status = target;
            Ok(())
        } else {
            Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                story_id,
                detail: format!("cannot enter {} from {}", target, story.status),
            })
            .into())
        }
    }

    async fn set_style_reference(
        &self,
        _story_id: i64,
        reference: &StyleReference,
    ) -> FolioResult<()> {
        self.state.lock().unwrap().style_reference = Some(reference.clone());
        Ok(())
    }

    async fn load_style_reference(&self, _story_id: i64) -> FolioResult<Option<StyleReference>> {
        Ok(self.state.lock().unwrap().style_reference.clone())
    }

    async fn set_cover_url(
        &self,
        story_id: i64,
        kind: CoverKind,
        prompt: &str,
        url: &str,
    ) -> FolioResult<()> {
        self.state.lock().unwrap().covers.insert(
            kind,
            CoverAsset {
                story_id,
                kind,
                prompt: prompt.to_string(),
                url: Some(url.to_string()),
            },
        );
        Ok(())
    }

    async fn load_covers(&self, _story_id: i64) -> FolioResult<Vec<CoverAsset>> {
        let mut covers: Vec<CoverAsset> =
            self.state.lock().unwrap().covers.values().cloned().collect();
        covers.sort_by_key(|c| c.kind);
        Ok(covers)
    }

    async fn record_model_call(&self, record: &ModelCallRecord) -> FolioResult<()> {
        self.state.lock().unwrap().calls.push(record.clone());
        Ok(())
    }
}

/// Text model that replays a scripted queue of outcomes.
struct ScriptedModel {
    responses: Mutex<VecDeque<FolioResult<String>>>,
}

impl ScriptedModel {
    fn new(responses: Vec<FolioResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
        })
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    async fn complete(&self, _req: &CompletionRequest) -> FolioResult<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::new(ModelErrorKind::EmptyResponse).into()))
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-test-model"
    }
}

struct ScriptedImages {
    results: Mutex<VecDeque<FolioResult<GeneratedImage>>>,
}

impl ScriptedImages {
    fn new(results: Vec<FolioResult<GeneratedImage>>) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.into()),
        })
    }

    fn ok() -> FolioResult<GeneratedImage> {
        Ok(GeneratedImage {
            bytes: b"image bytes".to_vec(),
            mime: "image/png".to_string(),
        })
    }

    fn failure() -> FolioResult<GeneratedImage> {
        Err(ModelError::new(ModelErrorKind::HttpStatus {
            status_code: 504,
            message: "upstream timeout".to_string(),
        })
        .into())
    }
}

#[async_trait]
impl ImageModel for ScriptedImages {
    async fn generate_image(&self, _parts: &[ImagePart]) -> FolioResult<GeneratedImage> {
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ModelError::new(ModelErrorKind::EmptyResponse).into()))
    }
}

#[derive(Default)]
struct MemoryBlobs {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobs {
    fn with_style_sample() -> (Arc<Self>, String) {
        let blobs = Arc::new(Self::default());
        let url = "mem://style/sample.png".to_string();
        blobs
            .files
            .lock()
            .unwrap()
            .insert(url.clone(), b"style sample".to_vec());
        (blobs, url)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobs {
    async fn upload(&self, bytes: &[u8], _mime: &str, path: &str) -> FolioResult<String> {
        let url = format!("mem://{}", path);
        self.files
            .lock()
            .unwrap()
            .insert(url.clone(), bytes.to_vec());
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> FolioResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| StorageError::new(StorageErrorKind::Read(url.to_string())).into())
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<StoryEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<StoryEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event: StoryEvent) -> FolioResult<()> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

fn planner_response(spread_count: usize) -> String {
    let spreads: Vec<Value> = (0..spread_count)
        .map(|i| {
            json!({
                "spreadIndex": i,
                "sceneSummary": format!("Scene {}", i),
                "pages": [{
                    "page": "left",
                    "location": "The Lighthouse",
                    "characters": [
                        {"name": "Fox", "prominence": "primary", "justification": "named in the text"}
                    ]
                }]
            })
        })
        .collect();
    json!({ "spreads": spreads }).to_string()
}

fn scene_response(indices: &[i32]) -> String {
    let decisions: Vec<Value> = indices
        .iter()
        .map(|i| {
            json!({
                "spreadIndex": i,
                "primaryLocation": "The Lighthouse",
                "characters": [
                    {"name": "Fox", "role": "primary", "confidence": 0.9, "reason": "focal"}
                ],
                "excludedCharacters": ["char-1"],
                "sceneSummary": format!("Scene {}", i),
                "illustrationPrompt": format!("Illustration for spread {}", i),
                "compositionNotes": "low angle",
                "mood": "calm",
                "doNotInclude": "no humans",
                "negativePrompt": "text, watermark"
            })
        })
        .collect();
    json!({ "decisions": decisions }).to_string()
}

fn planner(
    store: Arc<MemoryStore>,
    model: Arc<ScriptedModel>,
    sink: Arc<RecordingSink>,
) -> SpreadPlanner {
    let lifecycle = Arc::new(LifecycleController::new(store.clone()));
    SpreadPlanner::new(store, model, lifecycle, sink, 3)
}

#[tokio::test]
async fn test_planner_builds_half_as_many_spreads() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 24);
    let model = ScriptedModel::new(vec![Ok(planner_response(12))]);
    let sink = Arc::new(RecordingSink::default());

    planner(store.clone(), model, sink.clone())
        .run(1)
        .await
        .unwrap();

    let spreads = store.spreads();
    assert_eq!(spreads.len(), 12);
    for (i, spread) in spreads.iter().enumerate() {
        assert_eq!(spread.index, i as i32);
    }
    assert_eq!(spreads[0].left_page_id, 101);
    assert_eq!(spreads[0].right_page_id, Some(102));
    assert_eq!(store.status(), StoryStatus::SpreadsReady);
    assert_eq!(sink.events(), vec![StoryEvent::DecideSpreadScenes { story_id: 1 }]);
    assert_eq!(store.call_count(), 1);
}

#[tokio::test]
async fn test_planner_rerun_is_idempotent() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 10);
    let model = ScriptedModel::new(vec![Ok(planner_response(5)), Ok(planner_response(5))]);
    let sink = Arc::new(RecordingSink::default());
    let planner = planner(store.clone(), model, sink);

    planner.run(1).await.unwrap();
    let first = store.spreads();
    planner.run(1).await.unwrap();
    let second = store.spreads();

    assert_eq!(first.len(), 5);
    assert_eq!(second.len(), 5);
    assert_eq!(store.status(), StoryStatus::SpreadsReady);
}

#[tokio::test]
async fn test_planner_odd_page_count_has_trailing_single() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 7);
    let model = ScriptedModel::new(vec![Ok(planner_response(4))]);
    let sink = Arc::new(RecordingSink::default());

    planner(store.clone(), model, sink).run(1).await.unwrap();

    let spreads = store.spreads();
    assert_eq!(spreads.len(), 4);
    assert_eq!(spreads[3].right_page_id, None);
}

#[tokio::test]
async fn test_planner_accepts_fenced_output() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 4);
    let fenced = format!("```json\n{}\n```", planner_response(2));
    let model = ScriptedModel::new(vec![Ok(fenced)]);
    let sink = Arc::new(RecordingSink::default());

    planner(store.clone(), model, sink).run(1).await.unwrap();

    assert_eq!(store.spreads().len(), 2);
    assert_eq!(store.status(), StoryStatus::SpreadsReady);
}

#[tokio::test]
async fn test_planner_unparseable_output_reverts_to_planning() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 4);
    let model = ScriptedModel::new(vec![Ok("I am unable to plan this book.".to_string())]);
    let sink = Arc::new(RecordingSink::default());

    let result = planner(store.clone(), model, sink.clone()).run(1).await;

    assert!(result.is_err());
    assert_eq!(store.status(), StoryStatus::Planning);
    assert!(store.spreads().is_empty());
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_planner_missing_pages_is_fatal() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 0);
    let model = ScriptedModel::new(vec![]);
    let sink = Arc::new(RecordingSink::default());

    let result = planner(store.clone(), model, sink).run(1).await;

    assert!(result.is_err());
    assert_eq!(store.status(), StoryStatus::Planning);
    assert_eq!(store.call_count(), 0);
}

async fn seed_spreads(store: &Arc<MemoryStore>, count: usize) {
    let pages = store.load_pages(1).await.unwrap();
    let seeds: Vec<SpreadSeed> = pages
        .chunks(2)
        .take(count)
        .enumerate()
        .map(|(i, chunk)| SpreadSeed {
            index: i as i32,
            left_page_id: chunk[0].id,
            right_page_id: chunk.get(1).map(|p| p.id),
            scene_summary: format!("Scene {}", i),
            pages: vec![],
        })
        .collect();
    store.replace_spreads(1, &seeds).await.unwrap();
}

fn engine(
    store: Arc<MemoryStore>,
    model: Arc<ScriptedModel>,
    batch_size: usize,
) -> SceneDecisionEngine {
    let lifecycle = Arc::new(LifecycleController::new(store.clone()));
    SceneDecisionEngine::new(store, model, lifecycle, 2).with_batch_size(batch_size)
}

#[tokio::test]
async fn test_scene_engine_batches_sequentially_and_persists_once() {
    let store = MemoryStore::with_story(StoryStatus::SpreadsReady, 12);
    seed_spreads(&store, 6).await;
    let model = ScriptedModel::new(vec![
        Ok(scene_response(&[0, 1, 2])),
        Ok(scene_response(&[3, 4, 5])),
    ]);

    engine(store.clone(), model, 3).run(1).await.unwrap();

    let decisions = store.decisions();
    assert_eq!(decisions.len(), 6);
    assert_eq!(store.status(), StoryStatus::ScenesReady);
    // Exclusion arrived as a bare name and was normalized.
    assert_eq!(decisions[0].presence.excluded_characters.len(), 1);
    assert_eq!(
        decisions[0].presence.excluded_characters[0].reason,
        DEFAULT_EXCLUSION_REASON
    );
}

#[tokio::test]
async fn test_scene_engine_retries_invalid_role_batch() {
    let store = MemoryStore::with_story(StoryStatus::SpreadsReady, 4);
    seed_spreads(&store, 2).await;

    let invalid = scene_response(&[0, 1]).replace("\"primary\"", "\"narrator\"");
    let model = ScriptedModel::new(vec![Ok(invalid), Ok(scene_response(&[0, 1]))]);

    engine(store.clone(), model, 10).run(1).await.unwrap();

    assert_eq!(store.decisions().len(), 2);
    assert_eq!(store.status(), StoryStatus::ScenesReady);
    assert_eq!(store.call_count(), 2);
}

#[tokio::test]
async fn test_scene_engine_exhausted_batch_leaves_status_untouched() {
    let store = MemoryStore::with_story(StoryStatus::SpreadsReady, 4);
    seed_spreads(&store, 2).await;

    let invalid = scene_response(&[0, 1]).replace("\"primary\"", "\"narrator\"");
    let model = ScriptedModel::new(vec![Ok(invalid.clone()), Ok(invalid)]);

    let result = engine(store.clone(), model, 10).run(1).await;

    assert!(result.is_err());
    assert_eq!(store.status(), StoryStatus::SpreadsReady);
    assert!(store.decisions().is_empty());
}

#[tokio::test]
async fn test_scene_engine_without_spreads_is_fatal() {
    let store = MemoryStore::with_story(StoryStatus::SpreadsReady, 4);
    let model = ScriptedModel::new(vec![]);

    let result = engine(store.clone(), model, 10).run(1).await;

    assert!(result.is_err());
    assert_eq!(store.call_count(), 0);
}

fn orchestrator(
    store: Arc<MemoryStore>,
    images: Arc<ScriptedImages>,
    blobs: Arc<MemoryBlobs>,
    sink: Arc<RecordingSink>,
) -> AssetGenerationOrchestrator {
    let lifecycle = Arc::new(LifecycleController::new(store.clone()));
    AssetGenerationOrchestrator::new(store, images, blobs, lifecycle, sink)
}

fn single_cover_jobs(sink: &RecordingSink) -> Vec<(i64, folio_core::CoverJobSpec)> {
    sink.events()
        .into_iter()
        .filter_map(|event| match event {
            StoryEvent::GenerateSingleCover { story_id, job } => Some((story_id, job)),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_cover_dispatch_emits_exactly_two_jobs() {
    let store = MemoryStore::with_story(StoryStatus::NeedsStyle, 4);
    let (blobs, style_url) = MemoryBlobs::with_style_sample();
    let sink = Arc::new(RecordingSink::default());
    let images = ScriptedImages::new(vec![]);
    let orchestrator = orchestrator(store.clone(), images, blobs, sink.clone());

    orchestrator.dispatch(1, &style_url, &[]).await.unwrap();

    let jobs = single_cover_jobs(&sink);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].1.kind, CoverKind::Front);
    assert_eq!(jobs[1].1.kind, CoverKind::Back);
    assert_eq!(jobs[0].1.title, "The Lighthouse Fox");
    assert_eq!(store.status(), StoryStatus::GeneratingCovers);
}

#[tokio::test]
async fn test_bare_cover_trigger_uses_recorded_style_reference() {
    let store = MemoryStore::with_story(StoryStatus::NeedsStyle, 4);
    let (blobs, style_url) = MemoryBlobs::with_style_sample();
    let sink = Arc::new(RecordingSink::default());
    let images = ScriptedImages::new(vec![]);
    let orchestrator = orchestrator(store.clone(), images, blobs, sink.clone());

    store
        .set_style_reference(
            1,
            &StyleReference {
                image_url: style_url.clone(),
                interior_page_urls: vec!["mem://interior/p1.png".to_string()],
            },
        )
        .await
        .unwrap();

    // Only the story id arrives with the trigger.
    orchestrator.run(1).await.unwrap();

    let jobs = single_cover_jobs(&sink);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].1.style_image_url, style_url);
    assert_eq!(
        jobs[0].1.interior_page_urls,
        vec!["mem://interior/p1.png".to_string()]
    );
    assert_eq!(store.status(), StoryStatus::GeneratingCovers);
}

#[tokio::test]
async fn test_cover_trigger_without_style_reference_is_fatal() {
    let store = MemoryStore::with_story(StoryStatus::NeedsStyle, 4);
    let (blobs, _) = MemoryBlobs::with_style_sample();
    let sink = Arc::new(RecordingSink::default());
    let images = ScriptedImages::new(vec![]);
    let orchestrator = orchestrator(store.clone(), images, blobs, sink.clone());

    let result = orchestrator.run(1).await;

    assert!(result.is_err());
    assert_eq!(store.status(), StoryStatus::NeedsStyle);
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn test_covers_complete_in_either_order() {
    for back_first in [false, true] {
        let store = MemoryStore::with_story(StoryStatus::NeedsStyle, 4);
        let (blobs, style_url) = MemoryBlobs::with_style_sample();
        let sink = Arc::new(RecordingSink::default());
        let images = ScriptedImages::new(vec![ScriptedImages::ok(), ScriptedImages::ok()]);
        let orchestrator = orchestrator(store.clone(), images, blobs, sink.clone());

        orchestrator.dispatch(1, &style_url, &[]).await.unwrap();
        let mut jobs = single_cover_jobs(&sink);
        if back_first {
            jobs.reverse();
        }

        orchestrator.run_single(1, &jobs[0].1).await.unwrap();
        assert_eq!(store.status(), StoryStatus::GeneratingCovers);

        orchestrator.run_single(1, &jobs[1].1).await.unwrap();
        assert_eq!(store.status(), StoryStatus::CoversReady);
    }
}

#[tokio::test]
async fn test_failed_front_job_is_isolated_and_retryable() {
    let store = MemoryStore::with_story(StoryStatus::NeedsStyle, 4);
    let (blobs, style_url) = MemoryBlobs::with_style_sample();
    let sink = Arc::new(RecordingSink::default());
    let images = ScriptedImages::new(vec![
        ScriptedImages::failure(),
        ScriptedImages::ok(),
        ScriptedImages::ok(),
    ]);
    let orchestrator = orchestrator(store.clone(), images, blobs, sink.clone());

    orchestrator.dispatch(1, &style_url, &[]).await.unwrap();
    let jobs = single_cover_jobs(&sink);
    let front = &jobs[0].1;
    let back = &jobs[1].1;

    assert!(orchestrator.run_single(1, front).await.is_err());
    orchestrator.run_single(1, back).await.unwrap();
    assert_eq!(store.status(), StoryStatus::GeneratingCovers);

    // Retrying only the failed job completes the story.
    orchestrator.run_single(1, front).await.unwrap();
    assert_eq!(store.status(), StoryStatus::CoversReady);
}

#[tokio::test]
async fn test_single_flight_map_drops_released_stories() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 4);
    let lifecycle = LifecycleController::new(store);

    let guard = lifecycle.acquire(1).await;
    assert_eq!(lifecycle.tracked_stories().await, 1);
    drop(guard);

    // Acquiring a different story sheds the released entry.
    let _guard = lifecycle.acquire(2).await;
    assert_eq!(lifecycle.tracked_stories().await, 1);
}

#[tokio::test]
async fn test_full_pipeline_chain() {
    let store = MemoryStore::with_story(StoryStatus::Planning, 6);
    let sink = Arc::new(RecordingSink::default());
    let lifecycle = Arc::new(LifecycleController::new(store.clone()));

    let planner_model = ScriptedModel::new(vec![Ok(planner_response(3))]);
    SpreadPlanner::new(
        store.clone(),
        planner_model,
        lifecycle.clone(),
        sink.clone(),
        3,
    )
    .run(1)
    .await
    .unwrap();
    assert_eq!(store.status(), StoryStatus::SpreadsReady);

    let scene_model = ScriptedModel::new(vec![Ok(scene_response(&[0, 1, 2]))]);
    SceneDecisionEngine::new(store.clone(), scene_model, lifecycle.clone(), 2)
        .with_batch_size(10)
        .run(1)
        .await
        .unwrap();
    assert_eq!(store.status(), StoryStatus::ScenesReady);

    // Style reference arrives externally.
    store
        .transition_status(1, StoryStatus::NeedsStyle)
        .await
        .unwrap();

    let (blobs, style_url) = MemoryBlobs::with_style_sample();
    let images = ScriptedImages::new(vec![ScriptedImages::ok(), ScriptedImages::ok()]);
    let orchestrator =
        AssetGenerationOrchestrator::new(store.clone(), images, blobs, lifecycle, sink.clone());

    orchestrator.dispatch(1, &style_url, &[]).await.unwrap();
    for (_, job) in single_cover_jobs(&sink) {
        orchestrator.run_single(1, &job).await.unwrap();
    }
    assert_eq!(store.status(), StoryStatus::CoversReady);

    store.transition_status(1, StoryStatus::Done).await.unwrap();
    assert_eq!(store.status(), StoryStatus::Done);
}
