//! Top-level error wrapper types.

use crate::{ConfigError, JsonError, ModelError, PipelineError, StorageError};
#[cfg(feature = "database")]
use crate::DatabaseError;

/// This is the foundation error enum for the Folio workspace.
///
/// # Examples
///
/// ```
/// use folio_error::{FolioError, JsonError};
///
/// let json_err = JsonError::new("truncated payload");
/// let err: FolioError = json_err.into();
/// assert!(format!("{}", err).contains("JSON Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum FolioErrorKind {
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Generative-model provider error
    #[from(ModelError)]
    Model(ModelError),
    /// Blob storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Database error
    #[cfg(feature = "database")]
    #[from(DatabaseError)]
    Database(DatabaseError),
    /// Pipeline stage error
    #[from(PipelineError)]
    Pipeline(PipelineError),
}

/// Folio error with kind discrimination.
///
/// # Examples
///
/// ```
/// use folio_error::{FolioResult, ConfigError};
///
/// fn might_fail() -> FolioResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// match might_fail() {
///     Ok(_) => println!("Success"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Folio Error: {}", _0)]
pub struct FolioError(Box<FolioErrorKind>);

impl FolioError {
    /// Create a new error from a kind.
    pub fn new(kind: FolioErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &FolioErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to FolioErrorKind
impl<T> From<T> for FolioError
where
    T: Into<FolioErrorKind>,
{
    fn from(value: T) -> Self {
        Self::new(value.into())
    }
}

/// Result type alias using [`FolioError`].
pub type FolioResult<T> = Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PipelineErrorKind;

    #[test]
    fn test_kind_discrimination() {
        let err: FolioError = PipelineError::new(PipelineErrorKind::InputMissing(
            "story has no pages".to_string(),
        ))
        .into();

        assert!(matches!(err.kind(), FolioErrorKind::Pipeline(_)));
        assert!(format!("{}", err).contains("story has no pages"));
    }
}
