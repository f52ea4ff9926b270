//! Database error types.

/// Specific error conditions for database operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum DatabaseErrorKind {
    /// Failed to connect to the database
    #[display("Database connection failed: {}", _0)]
    Connection(String),
    /// A query failed
    #[display("Query failed: {}", _0)]
    Query(String),
    /// A transaction was rolled back
    #[display("Transaction failed: {}", _0)]
    Transaction(String),
    /// A row that was expected to exist was not found
    #[display("Not found: {}", _0)]
    NotFound(String),
}

/// Error type for database operations.
///
/// # Examples
///
/// ```
/// use folio_error::{DatabaseError, DatabaseErrorKind};
///
/// let err = DatabaseError::new(DatabaseErrorKind::NotFound("story 42".to_string()));
/// assert!(format!("{}", err).contains("story 42"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Database Error: {} at line {} in {}", kind, line, file)]
pub struct DatabaseError {
    /// The specific error condition
    pub kind: DatabaseErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl DatabaseError {
    /// Create a new DatabaseError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: DatabaseErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}

impl From<diesel::result::Error> for DatabaseError {
    #[track_caller]
    fn from(e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => {
                DatabaseError::new(DatabaseErrorKind::NotFound(e.to_string()))
            }
            diesel::result::Error::RollbackTransaction => {
                DatabaseError::new(DatabaseErrorKind::Transaction(e.to_string()))
            }
            other => DatabaseError::new(DatabaseErrorKind::Query(other.to_string())),
        }
    }
}
