//! Connection establishment.

use diesel::pg::PgConnection;
use diesel::Connection;
use folio_error::{DatabaseError, DatabaseErrorKind};
use tracing::{info, instrument};

/// Establish a PostgreSQL connection from a database URL.
///
/// # Examples
///
/// ```no_run
/// use folio_database::establish_connection;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let url = std::env::var("DATABASE_URL")?;
/// let conn = establish_connection(&url)?;
/// # Ok(())
/// # }
/// ```
#[instrument(skip(database_url))]
pub fn establish_connection(database_url: &str) -> Result<PgConnection, DatabaseError> {
    let conn = PgConnection::establish(database_url)
        .map_err(|e| DatabaseError::new(DatabaseErrorKind::Connection(e.to_string())))?;
    info!("Database connection established");
    Ok(conn)
}
