//! PostgreSQL persistence for the Folio pipeline.
//!
//! This crate provides the Diesel schema, row models, and the
//! [`PgStoryStore`] implementation of the `StoryStore` gateway. All derived
//! rows (spreads, page links, presence, scenes) are written through coarse
//! full-replace transactions scoped by story; the status column is written
//! through a single compare-and-set statement.

#![forbid(unsafe_code)]

mod connection;
mod models;
pub mod schema;
mod store;

pub use connection::establish_connection;
pub use models::{
    CoverAssetRow, NewModelCallRow, NewSpreadRow, PageRow, SpreadRow, StoryRow,
};
pub use store::PgStoryStore;

use folio_error::DatabaseError;

/// Result type for database operations.
pub type DatabaseResult<T> = Result<T, DatabaseError>;
