//! Schema initialisation for the directory database.

use rusqlite::{Connection, Error as SqliteError, OptionalExtension};
use thiserror::Error;

/// Current schema version recorded in `annuaire_schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

/// Initialise the directory schema inside an SQLite database.
///
/// Enables foreign keys, creates the tables and indexes, and records the
/// schema version. Existing installations must already match the expected
/// version; mismatches are rejected so migrations can be applied explicitly.
pub fn initialise_schema(connection: &mut Connection) -> Result<(), SchemaError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| SchemaError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| SchemaError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    create_tables(&transaction)?;
    create_indexes(&transaction)?;
    ensure_schema_version(&transaction)?;

    transaction
        .commit()
        .map_err(|source| SchemaError::Migration {
            step: "commit schema transaction",
            source,
        })
}

fn create_tables(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create categories",
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            slug TEXT NOT NULL UNIQUE CHECK (length(trim(slug)) > 0),
            name_fr TEXT NOT NULL,
            name_en TEXT NOT NULL,
            name_de TEXT NOT NULL,
            icon TEXT NOT NULL,
            color TEXT NOT NULL,
            osm_tags TEXT NOT NULL,
            display_order INTEGER NOT NULL,
            active INTEGER NOT NULL DEFAULT 1
        )",
    )?;
    run_migration_step(
        transaction,
        "create businesses",
        "CREATE TABLE IF NOT EXISTS businesses (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            osm_id INTEGER NOT NULL,
            osm_kind TEXT NOT NULL,
            name TEXT NOT NULL,
            name_fr TEXT,
            name_en TEXT,
            name_de TEXT,
            category_id INTEGER REFERENCES categories(id),
            subcategory TEXT,
            lat REAL NOT NULL,
            lng REAL NOT NULL,
            address TEXT,
            postal_code TEXT,
            city TEXT,
            phone TEXT,
            email TEXT,
            website TEXT,
            opening_hours TEXT,
            description TEXT,
            tags TEXT NOT NULL,
            photos TEXT NOT NULL DEFAULT '[]',
            active INTEGER NOT NULL DEFAULT 1,
            rating REAL,
            review_count INTEGER,
            last_verified_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (osm_id, osm_kind)
        )",
    )?;
    run_migration_step(
        transaction,
        "create sync_logs",
        "CREATE TABLE IF NOT EXISTS sync_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            sync_kind TEXT NOT NULL,
            status TEXT NOT NULL,
            started_at TEXT NOT NULL,
            completed_at TEXT,
            businesses_added INTEGER NOT NULL DEFAULT 0,
            businesses_updated INTEGER NOT NULL DEFAULT 0,
            businesses_removed INTEGER NOT NULL DEFAULT 0,
            error_message TEXT
        )",
    )
}

fn create_indexes(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "index businesses by category",
        "CREATE INDEX IF NOT EXISTS idx_businesses_category
            ON businesses(category_id, active)",
    )?;
    run_migration_step(
        transaction,
        "index businesses by activity",
        "CREATE INDEX IF NOT EXISTS idx_businesses_active
            ON businesses(active)",
    )?;
    run_migration_step(
        transaction,
        "index sync logs by status",
        "CREATE INDEX IF NOT EXISTS idx_sync_logs_status
            ON sync_logs(status, completed_at)",
    )
}

fn ensure_schema_version(transaction: &rusqlite::Transaction<'_>) -> Result<(), SchemaError> {
    run_migration_step(
        transaction,
        "create schema version table",
        "CREATE TABLE IF NOT EXISTS annuaire_schema_version (
            version INTEGER PRIMARY KEY CHECK (version > 0),
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
        ) WITHOUT ROWID",
    )?;

    let existing_version: Option<i64> = transaction
        .query_row(
            "SELECT version FROM annuaire_schema_version LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| SchemaError::Migration {
            step: "read schema version",
            source,
        })?;

    match existing_version {
        Some(version) if version == SCHEMA_VERSION => {}
        Some(found) => {
            return Err(SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found,
            });
        }
        None => {
            transaction
                .execute(
                    "INSERT INTO annuaire_schema_version (version) VALUES (?1)",
                    [SCHEMA_VERSION],
                )
                .map_err(|source| SchemaError::Migration {
                    step: "record schema version",
                    source,
                })?;
        }
    }

    Ok(())
}

fn run_migration_step(
    transaction: &rusqlite::Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), SchemaError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| SchemaError::Migration { step, source })
}

/// Errors raised when initialising the directory schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to enable SQLite foreign keys")]
    ForeignKeys {
        #[source]
        source: SqliteError,
    },
    #[error("failed to execute migration step '{step}'")]
    Migration {
        step: &'static str,
        #[source]
        source: SqliteError,
    },
    #[error(
        "expected directory schema version {expected} but found {found}; apply migrations before retrying"
    )]
    VersionMismatch { expected: i64, found: i64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialises_twice_without_error() {
        let mut conn = Connection::open_in_memory().expect("open in-memory database");
        initialise_schema(&mut conn).expect("first initialisation");
        initialise_schema(&mut conn).expect("second initialisation");

        let version: i64 = conn
            .query_row(
                "SELECT version FROM annuaire_schema_version LIMIT 1",
                [],
                |row| row.get(0),
            )
            .expect("read schema version");
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn rejects_unknown_schema_version() {
        let mut conn = Connection::open_in_memory().expect("open in-memory database");
        initialise_schema(&mut conn).expect("initialise schema");
        conn.execute("UPDATE annuaire_schema_version SET version = 99", [])
            .expect("bump version");

        let err = initialise_schema(&mut conn).expect_err("mismatch should fail");
        assert!(matches!(
            err,
            SchemaError::VersionMismatch {
                expected: SCHEMA_VERSION,
                found: 99
            }
        ));
    }
}
