//! Row models bridging the Diesel schema and the core entity types.

use crate::schema::{
    cover_assets, model_calls, page_characters, page_locations, spread_excluded_characters,
    spread_presence_characters, spread_presences, spread_scenes, spreads,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use folio_core::{
    Character, CoverAsset, CoverKind, Location, Page, Spread, Story, StoryStatus,
};
use folio_error::{DatabaseError, DatabaseErrorKind};
use folio_interface::ModelCallRecord;

/// A story row as stored.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::stories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct StoryRow {
    pub id: i64,
    pub status: String,
    pub title: String,
    pub author: String,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoryRow {
    /// Convert to the core entity, failing on a status string the
    /// lifecycle does not recognize.
    pub fn into_story(self) -> Result<Story, DatabaseError> {
        let status: StoryStatus = self.status.parse().map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Query(format!(
                "Story {} has unknown status '{}'",
                self.id, self.status
            )))
        })?;
        Ok(Story {
            id: self.id,
            status,
            title: self.title,
            author: self.author,
            page_count: self.page_count,
        })
    }
}

/// A manuscript page row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::pages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PageRow {
    pub id: i64,
    pub story_id: i64,
    pub page_number: i32,
    pub body: String,
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Page {
            id: row.id,
            story_id: row.story_id,
            page_number: row.page_number,
            text: row.body,
        }
    }
}

/// A catalog character row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::characters)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CharacterRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<CharacterRow> for Character {
    fn from(row: CharacterRow) -> Self {
        Character {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

/// A catalog location row.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::locations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LocationRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl From<LocationRow> for Location {
    fn from(row: LocationRow) -> Self {
        Location {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

/// A spread row as stored.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::spreads)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SpreadRow {
    pub id: i64,
    pub story_id: i64,
    pub spread_index: i32,
    pub left_page_id: i64,
    pub right_page_id: Option<i64>,
    pub scene_summary: String,
}

impl From<SpreadRow> for Spread {
    fn from(row: SpreadRow) -> Self {
        Spread {
            id: row.id,
            story_id: row.story_id,
            index: row.spread_index,
            left_page_id: row.left_page_id,
            right_page_id: row.right_page_id,
            scene_summary: row.scene_summary,
        }
    }
}

/// Insertable spread row; the id comes back from the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spreads)]
pub struct NewSpreadRow {
    pub story_id: i64,
    pub spread_index: i32,
    pub left_page_id: i64,
    pub right_page_id: Option<i64>,
    pub scene_summary: String,
}

/// Insertable page/character link.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = page_characters)]
pub struct NewPageCharacterRow {
    pub page_id: i64,
    pub character_id: i64,
    pub prominence: String,
    pub justification: String,
}

/// Insertable page/location link.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = page_locations)]
pub struct NewPageLocationRow {
    pub page_id: i64,
    pub location_id: i64,
}

/// Insertable presence header row (1:1 with spread).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spread_presences)]
pub struct NewSpreadPresenceRow {
    pub spread_id: i64,
    pub primary_location_id: Option<i64>,
}

/// Insertable presence character row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spread_presence_characters)]
pub struct NewPresenceCharacterRow {
    pub spread_id: i64,
    pub character_id: i64,
    pub role: String,
    pub confidence: f32,
    pub reason: String,
}

/// Insertable exclusion row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spread_excluded_characters)]
pub struct NewExcludedCharacterRow {
    pub spread_id: i64,
    pub character_id: i64,
    pub reason: String,
}

/// Insertable scene directive row (1:1 with spread).
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = spread_scenes)]
pub struct NewSpreadSceneRow {
    pub spread_id: i64,
    pub scene_summary: String,
    pub illustration_prompt: String,
    pub composition_notes: String,
    pub mood: String,
    pub do_not_include: String,
    pub negative_prompt: String,
}

/// A cover asset row as stored.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = cover_assets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CoverAssetRow {
    pub story_id: i64,
    pub kind: String,
    pub prompt: String,
    pub url: Option<String>,
}

impl CoverAssetRow {
    /// Convert to the core entity, failing on an unknown kind string.
    pub fn into_cover(self) -> Result<CoverAsset, DatabaseError> {
        let kind: CoverKind = self.kind.parse().map_err(|_| {
            DatabaseError::new(DatabaseErrorKind::Query(format!(
                "Cover for story {} has unknown kind '{}'",
                self.story_id, self.kind
            )))
        })?;
        Ok(CoverAsset {
            story_id: self.story_id,
            kind,
            prompt: self.prompt,
            url: self.url,
        })
    }
}

/// Insertable model-call audit row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = model_calls)]
pub struct NewModelCallRow {
    pub story_id: i64,
    pub stage: String,
    pub provider: String,
    pub model: String,
    pub request_prompt: String,
    pub response_text: Option<String>,
    pub duration_ms: i32,
    pub error_message: Option<String>,
}

impl From<&ModelCallRecord> for NewModelCallRow {
    fn from(record: &ModelCallRecord) -> Self {
        NewModelCallRow {
            story_id: record.story_id,
            stage: record.stage.clone(),
            provider: record.provider.clone(),
            model: record.model.clone(),
            request_prompt: record.request_prompt.clone(),
            response_text: (!record.response_text.is_empty())
                .then(|| record.response_text.clone()),
            duration_ms: record.duration_ms,
            error_message: record.error_message.clone(),
        }
    }
}
