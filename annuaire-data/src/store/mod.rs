//! SQLite-backed directory store.
//!
//! The store owns a single connection; callers construct it explicitly and
//! pass the handle down (no global client). `serve` opens it at startup and
//! drops it on shutdown, the one-shot commands open and close it per run.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, Error as SqliteError};
use thiserror::Error;

use annuaire_core::{UnknownSourceKind, UnknownSyncStatus};

mod businesses;
mod categories;
mod schema;
mod sync_log;

pub use businesses::{
    BusinessFilter, BusinessPage, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, UpsertOutcome,
};
pub use categories::CategoryWithCount;
pub use schema::{SCHEMA_VERSION, SchemaError};

/// Errors raised by the directory store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path:?}")]
    Open {
        /// Location of the database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: SqliteError,
    },
    /// Closing the SQLite database failed.
    #[error("failed to close SQLite database")]
    Close {
        #[source]
        source: SqliteError,
    },
    /// Initialising or validating the schema failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A statement failed.
    #[error("failed to {operation}")]
    Sqlite {
        /// Short description of the failed operation.
        operation: &'static str,
        #[source]
        source: SqliteError,
    },
    /// Serialising a JSON column value failed.
    #[error("failed to serialise {what} to JSON")]
    SerializeJson {
        /// Which payload failed.
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
    /// A stored JSON column did not parse back.
    #[error("stored {column} for row {id} is not valid JSON")]
    InvalidStoredJson {
        /// Column carrying the payload.
        column: &'static str,
        /// Row id the payload belongs to.
        id: i64,
        #[source]
        source: serde_json::Error,
    },
    /// A stored timestamp did not parse back as RFC 3339.
    #[error("stored {column} for row {id} is not a valid RFC 3339 timestamp")]
    InvalidTimestamp {
        /// Column carrying the timestamp.
        column: &'static str,
        /// Row id the timestamp belongs to.
        id: i64,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored source-kind discriminator was unrecognised.
    #[error(transparent)]
    UnknownSourceKind(#[from] UnknownSourceKind),
    /// A stored sync status was unrecognised.
    #[error(transparent)]
    UnknownSyncStatus(#[from] UnknownSyncStatus),
    /// A counter exceeded the SQLite integer range.
    #[error("{what} count {value} exceeds SQLite i64 range")]
    CountOutOfRange {
        /// Which counter overflowed.
        what: &'static str,
        /// The offending value.
        value: u64,
    },
    /// A sync log row was already in a terminal state.
    #[error("sync log {id} is not running; refusing a second completion")]
    SyncAlreadyCompleted {
        /// Audit row id.
        id: i64,
    },
}

/// Handle over the directory's SQLite database.
///
/// # Examples
/// ```
/// use annuaire_data::DirectoryStore;
///
/// let store = DirectoryStore::open_in_memory().expect("open store");
/// drop(store);
/// ```
#[derive(Debug)]
pub struct DirectoryStore {
    connection: Connection,
}

impl DirectoryStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let connection = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(connection)
    }

    /// Open an in-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(mut connection: Connection) -> Result<Self, StoreError> {
        schema::initialise_schema(&mut connection)?;
        Ok(Self { connection })
    }

    /// Close the underlying connection.
    pub fn close(self) -> Result<(), StoreError> {
        self.connection
            .close()
            .map_err(|(_, source)| StoreError::Close { source })
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.connection
    }

    pub(crate) fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}
