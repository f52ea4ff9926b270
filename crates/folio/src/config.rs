//! Runtime configuration.
//!
//! Settings come from the environment with a `FOLIO_` prefix (a local
//! `.env` file is honored), e.g. `FOLIO_STORAGE_ROOT`. The database URL
//! additionally falls back to the conventional `DATABASE_URL`.

use folio_error::{ConfigError, FolioResult};
use serde::Deserialize;

/// Configuration for the pipeline binary.
#[derive(Debug, Clone, Deserialize)]
pub struct FolioConfig {
    /// PostgreSQL connection URL; falls back to `DATABASE_URL`.
    #[serde(default)]
    pub database_url: Option<String>,
    /// Root directory of the filesystem blob store.
    pub storage_root: String,
    /// Public base URL the blob store's files are served from.
    pub storage_base_url: String,
    /// Text model override for the provider default.
    #[serde(default)]
    pub text_model: Option<String>,
    /// Image model override for the provider default.
    #[serde(default)]
    pub image_model: Option<String>,
    /// Executions allowed per pipeline step.
    pub max_step_attempts: usize,
    /// Spreads per scene-decision model call.
    pub scene_batch_size: usize,
    /// Disable provider-level retry entirely.
    pub no_retry: bool,
    /// Override the provider retry attempt cap.
    #[serde(default)]
    pub max_retries: Option<usize>,
    /// Override the provider initial backoff delay.
    #[serde(default)]
    pub retry_backoff_ms: Option<u64>,
}

impl FolioConfig {
    /// Load configuration from the environment.
    pub fn load() -> FolioResult<Self> {
        // A missing .env file is fine; real environments set variables
        // directly.
        dotenvy::dotenv().ok();

        let source = config::Config::builder()
            .set_default("storage_root", "./assets")
            .and_then(|b| b.set_default("storage_base_url", "http://localhost:8080/assets"))
            .and_then(|b| b.set_default("max_step_attempts", 3))
            .and_then(|b| b.set_default("scene_batch_size", 5))
            .and_then(|b| b.set_default("no_retry", false))
            .map_err(|e| ConfigError::new(e.to_string()))?
            .add_source(config::Environment::with_prefix("FOLIO").try_parsing(true))
            .build()
            .map_err(|e| ConfigError::new(e.to_string()))?;

        source
            .try_deserialize()
            .map_err(|e| ConfigError::new(e.to_string()).into())
    }

    /// Resolve the database URL, falling back to `DATABASE_URL`.
    pub fn database_url(&self) -> FolioResult<String> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }
        std::env::var("DATABASE_URL").map_err(|_| {
            ConfigError::new("Set FOLIO_DATABASE_URL or DATABASE_URL").into()
        })
    }
}
