//! `StoryStore` backed by PostgreSQL.

use crate::models::{
    CharacterRow, CoverAssetRow, LocationRow, NewExcludedCharacterRow, NewModelCallRow,
    NewPageCharacterRow, NewPageLocationRow, NewPresenceCharacterRow, NewSpreadPresenceRow,
    NewSpreadRow, NewSpreadSceneRow, PageRow, SpreadRow, StoryRow,
};
use crate::schema::{
    characters, cover_assets, locations, model_calls, page_characters, page_locations, pages,
    spread_excluded_characters, spread_presence_characters, spread_presences, spread_scenes,
    spreads, stories, story_characters, story_locations,
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use folio_core::{
    Character, CoverAsset, CoverKind, Location, Page, SceneDecisionSeed, SpreadSeed, Story,
    StoryStatus, StyleReference,
};
use folio_core::Spread;
use folio_error::{DatabaseError, DatabaseErrorKind, FolioResult, PipelineError, PipelineErrorKind};
use folio_interface::{ModelCallRecord, StoryStore};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// PostgreSQL-backed story store.
///
/// Holds the connection behind an async mutex so the store can be shared
/// across pipeline stages. Derived rows are replaced wholesale inside a
/// transaction; status changes go through a compare-and-set update guarded
/// by the allowed-predecessor table.
#[derive(Clone)]
pub struct PgStoryStore {
    conn: Arc<Mutex<PgConnection>>,
}

impl std::fmt::Debug for PgStoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgStoryStore").finish_non_exhaustive()
    }
}

impl PgStoryStore {
    /// Wrap an established connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Share an existing connection handle.
    pub fn from_shared(conn: Arc<Mutex<PgConnection>>) -> Self {
        Self { conn }
    }

    fn delete_derived_spread_rows(
        conn: &mut PgConnection,
        spread_ids: &[i64],
    ) -> Result<(), diesel::result::Error> {
        diesel::delete(
            spread_presence_characters::table
                .filter(spread_presence_characters::spread_id.eq_any(spread_ids)),
        )
        .execute(conn)?;
        diesel::delete(
            spread_excluded_characters::table
                .filter(spread_excluded_characters::spread_id.eq_any(spread_ids)),
        )
        .execute(conn)?;
        diesel::delete(
            spread_presences::table.filter(spread_presences::spread_id.eq_any(spread_ids)),
        )
        .execute(conn)?;
        diesel::delete(spread_scenes::table.filter(spread_scenes::spread_id.eq_any(spread_ids)))
            .execute(conn)?;
        Ok(())
    }

    fn story_spread_ids(
        conn: &mut PgConnection,
        story_id: i64,
    ) -> Result<Vec<i64>, diesel::result::Error> {
        spreads::table
            .filter(spreads::story_id.eq(story_id))
            .select(spreads::id)
            .load(conn)
    }
}

#[async_trait]
impl StoryStore for PgStoryStore {
    #[instrument(skip(self))]
    async fn load_story(&self, story_id: i64) -> FolioResult<Story> {
        let mut conn = self.conn.lock().await;
        let row: Option<StoryRow> = stories::table
            .find(story_id)
            .select(StoryRow::as_select())
            .first(&mut *conn)
            .optional()
            .map_err(DatabaseError::from)?;
        let row = row.ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::NotFound(format!("story {}", story_id)))
        })?;
        Ok(row.into_story()?)
    }

    #[instrument(skip(self))]
    async fn load_pages(&self, story_id: i64) -> FolioResult<Vec<Page>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<PageRow> = pages::table
            .filter(pages::story_id.eq(story_id))
            .order(pages::page_number.asc())
            .select(PageRow::as_select())
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Page::from).collect())
    }

    #[instrument(skip(self))]
    async fn load_characters(&self, story_id: i64) -> FolioResult<Vec<Character>> {
        let mut conn = self.conn.lock().await;
        let ids: Vec<i64> = story_characters::table
            .filter(story_characters::story_id.eq(story_id))
            .select(story_characters::character_id)
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        let rows: Vec<CharacterRow> = characters::table
            .filter(characters::id.eq_any(&ids))
            .order(characters::name.asc())
            .select(CharacterRow::as_select())
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Character::from).collect())
    }

    #[instrument(skip(self))]
    async fn load_locations(&self, story_id: i64) -> FolioResult<Vec<Location>> {
        let mut conn = self.conn.lock().await;
        let ids: Vec<i64> = story_locations::table
            .filter(story_locations::story_id.eq(story_id))
            .select(story_locations::location_id)
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        let rows: Vec<LocationRow> = locations::table
            .filter(locations::id.eq_any(&ids))
            .order(locations::name.asc())
            .select(LocationRow::as_select())
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Location::from).collect())
    }

    #[instrument(skip(self))]
    async fn load_spreads(&self, story_id: i64) -> FolioResult<Vec<Spread>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<SpreadRow> = spreads::table
            .filter(spreads::story_id.eq(story_id))
            .order(spreads::spread_index.asc())
            .select(SpreadRow::as_select())
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(rows.into_iter().map(Spread::from).collect())
    }

    /// Replace the story's spreads and page-level links in one transaction.
    ///
    /// Prior spreads, their presence/scene rows, and the page links for all
    /// of the story's pages are deleted before the seeds are inserted, so a
    /// re-run leaves no orphans.
    #[instrument(skip(self, seeds), fields(seed_count = seeds.len()))]
    async fn replace_spreads(&self, story_id: i64, seeds: &[SpreadSeed]) -> FolioResult<usize> {
        let mut conn = self.conn.lock().await;
        let inserted = conn
            .transaction::<usize, diesel::result::Error, _>(|conn| {
                let page_ids: Vec<i64> = pages::table
                    .filter(pages::story_id.eq(story_id))
                    .select(pages::id)
                    .load(conn)?;
                diesel::delete(
                    page_characters::table.filter(page_characters::page_id.eq_any(&page_ids)),
                )
                .execute(conn)?;
                diesel::delete(
                    page_locations::table.filter(page_locations::page_id.eq_any(&page_ids)),
                )
                .execute(conn)?;

                let spread_ids = Self::story_spread_ids(conn, story_id)?;
                Self::delete_derived_spread_rows(conn, &spread_ids)?;
                diesel::delete(spreads::table.filter(spreads::story_id.eq(story_id)))
                    .execute(conn)?;

                for seed in seeds {
                    diesel::insert_into(spreads::table)
                        .values(NewSpreadRow {
                            story_id,
                            spread_index: seed.index,
                            left_page_id: seed.left_page_id,
                            right_page_id: seed.right_page_id,
                            scene_summary: seed.scene_summary.clone(),
                        })
                        .execute(conn)?;

                    for placement in &seed.pages {
                        if let Some(location_id) = placement.location_id {
                            diesel::insert_into(page_locations::table)
                                .values(NewPageLocationRow {
                                    page_id: placement.page_id,
                                    location_id,
                                })
                                .execute(conn)?;
                        }
                        let character_rows: Vec<NewPageCharacterRow> = placement
                            .characters
                            .iter()
                            .map(|c| NewPageCharacterRow {
                                page_id: placement.page_id,
                                character_id: c.character_id,
                                prominence: c.prominence.as_str().to_string(),
                                justification: c.justification.clone(),
                            })
                            .collect();
                        diesel::insert_into(page_characters::table)
                            .values(&character_rows)
                            .execute(conn)?;
                    }
                }
                Ok(seeds.len())
            })
            .map_err(DatabaseError::from)?;

        info!(story_id, inserted, "Replaced spreads");
        Ok(inserted)
    }

    /// Replace presence and scene rows for all spreads of the story.
    ///
    /// All-or-nothing: either every decision lands or the prior rows remain
    /// untouched.
    #[instrument(skip(self, decisions), fields(decision_count = decisions.len()))]
    async fn replace_scene_decisions(
        &self,
        story_id: i64,
        decisions: &[SceneDecisionSeed],
    ) -> FolioResult<()> {
        let mut conn = self.conn.lock().await;
        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            let spread_ids = Self::story_spread_ids(conn, story_id)?;
            Self::delete_derived_spread_rows(conn, &spread_ids)?;

            for decision in decisions {
                diesel::insert_into(spread_presences::table)
                    .values(NewSpreadPresenceRow {
                        spread_id: decision.spread_id,
                        primary_location_id: decision.presence.primary_location_id,
                    })
                    .execute(conn)?;

                let present: Vec<NewPresenceCharacterRow> = decision
                    .presence
                    .characters
                    .iter()
                    .map(|c| NewPresenceCharacterRow {
                        spread_id: decision.spread_id,
                        character_id: c.character_id,
                        role: c.role.as_str().to_string(),
                        confidence: c.confidence,
                        reason: c.reason.clone(),
                    })
                    .collect();
                diesel::insert_into(spread_presence_characters::table)
                    .values(&present)
                    .execute(conn)?;

                let excluded: Vec<NewExcludedCharacterRow> = decision
                    .presence
                    .excluded_characters
                    .iter()
                    .map(|c| NewExcludedCharacterRow {
                        spread_id: decision.spread_id,
                        character_id: c.character_id,
                        reason: c.reason.clone(),
                    })
                    .collect();
                diesel::insert_into(spread_excluded_characters::table)
                    .values(&excluded)
                    .execute(conn)?;

                diesel::insert_into(spread_scenes::table)
                    .values(NewSpreadSceneRow {
                        spread_id: decision.spread_id,
                        scene_summary: decision.scene.scene_summary.clone(),
                        illustration_prompt: decision.scene.illustration_prompt.clone(),
                        composition_notes: decision.scene.composition_notes.clone(),
                        mood: decision.scene.mood.clone(),
                        do_not_include: decision.scene.do_not_include.clone(),
                        negative_prompt: decision.scene.negative_prompt.clone(),
                    })
                    .execute(conn)?;
            }
            Ok(())
        })
        .map_err(DatabaseError::from)?;

        info!(story_id, count = decisions.len(), "Replaced scene decisions");
        Ok(())
    }

    /// Compare-and-set status update.
    ///
    /// Succeeds only when the stored status is an allowed predecessor of the
    /// target. A zero-row update means a concurrent run or stale caller and
    /// surfaces as an invalid-transition error with the actual status.
    #[instrument(skip(self), fields(target = %target))]
    async fn transition_status(&self, story_id: i64, target: StoryStatus) -> FolioResult<()> {
        let mut conn = self.conn.lock().await;
        let predecessors: Vec<&str> = target
            .allowed_predecessors()
            .iter()
            .map(StoryStatus::as_str)
            .collect();

        let affected = diesel::update(
            stories::table
                .filter(stories::id.eq(story_id))
                .filter(stories::status.eq_any(&predecessors)),
        )
        .set((
            stories::status.eq(target.as_str()),
            stories::updated_at.eq(diesel::dsl::now),
        ))
        .execute(&mut *conn)
        .map_err(DatabaseError::from)?;

        if affected == 0 {
            let current: Option<String> = stories::table
                .find(story_id)
                .select(stories::status)
                .first(&mut *conn)
                .optional()
                .map_err(DatabaseError::from)?;
            let detail = match current {
                Some(status) => format!("cannot enter {} from {}", target, status),
                None => format!("story not found while entering {}", target),
            };
            return Err(PipelineError::new(PipelineErrorKind::InvalidTransition {
                story_id,
                detail,
            })
            .into());
        }

        debug!(story_id, status = %target, "Status transition applied");
        Ok(())
    }

    #[instrument(skip(self, reference))]
    async fn set_style_reference(
        &self,
        story_id: i64,
        reference: &StyleReference,
    ) -> FolioResult<()> {
        let mut conn = self.conn.lock().await;
        let affected = diesel::update(stories::table.find(story_id))
            .set((
                stories::style_reference_url.eq(Some(reference.image_url.clone())),
                stories::interior_reference_urls.eq(&reference.interior_page_urls),
                stories::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        if affected == 0 {
            return Err(DatabaseError::new(DatabaseErrorKind::NotFound(format!(
                "story {}",
                story_id
            )))
            .into());
        }
        info!(story_id, url = %reference.image_url, "Style reference recorded");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_style_reference(&self, story_id: i64) -> FolioResult<Option<StyleReference>> {
        let mut conn = self.conn.lock().await;
        let row: Option<(Option<String>, Vec<String>)> = stories::table
            .find(story_id)
            .select((
                stories::style_reference_url,
                stories::interior_reference_urls,
            ))
            .first(&mut *conn)
            .optional()
            .map_err(DatabaseError::from)?;
        let (url, interiors) = row.ok_or_else(|| {
            DatabaseError::new(DatabaseErrorKind::NotFound(format!("story {}", story_id)))
        })?;
        Ok(url.map(|image_url| StyleReference {
            image_url,
            interior_page_urls: interiors,
        }))
    }

    #[instrument(skip(self, prompt, url), fields(kind = %kind))]
    async fn set_cover_url(
        &self,
        story_id: i64,
        kind: CoverKind,
        prompt: &str,
        url: &str,
    ) -> FolioResult<()> {
        let mut conn = self.conn.lock().await;
        let row = CoverAssetRow {
            story_id,
            kind: kind.as_str().to_string(),
            prompt: prompt.to_string(),
            url: Some(url.to_string()),
        };
        diesel::insert_into(cover_assets::table)
            .values(&row)
            .on_conflict((cover_assets::story_id, cover_assets::kind))
            .do_update()
            .set((
                cover_assets::prompt.eq(&row.prompt),
                cover_assets::url.eq(&row.url),
            ))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn load_covers(&self, story_id: i64) -> FolioResult<Vec<CoverAsset>> {
        let mut conn = self.conn.lock().await;
        let rows: Vec<CoverAssetRow> = cover_assets::table
            .filter(cover_assets::story_id.eq(story_id))
            .order(cover_assets::kind.asc())
            .select(CoverAssetRow::as_select())
            .load(&mut *conn)
            .map_err(DatabaseError::from)?;
        rows.into_iter()
            .map(|row| Ok(row.into_cover()?))
            .collect()
    }

    #[instrument(skip(self, record), fields(stage = %record.stage))]
    async fn record_model_call(&self, record: &ModelCallRecord) -> FolioResult<()> {
        let mut conn = self.conn.lock().await;
        diesel::insert_into(model_calls::table)
            .values(NewModelCallRow::from(record))
            .execute(&mut *conn)
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use folio_core::StoryStatus;

    #[test]
    fn test_predecessor_columns_match_status_strings() {
        for target in [
            StoryStatus::SpreadsReady,
            StoryStatus::ScenesReady,
            StoryStatus::CoversReady,
        ] {
            for pred in target.allowed_predecessors() {
                assert_eq!(pred.as_str().parse::<StoryStatus>().unwrap(), *pred);
            }
        }
    }
}
