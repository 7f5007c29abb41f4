//! Audit-log persistence for sync runs.
//!
//! A row is created in `running` state when a run starts and completed
//! exactly once; a second completion attempt is rejected rather than
//! silently overwriting the terminal state.

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, named_params};

use annuaire_core::{SyncRecord, SyncStatus};

use super::{DirectoryStore, StoreError};

const SYNC_LOG_COLUMNS: &str = "id, sync_kind, status, started_at, completed_at, \
     businesses_added, businesses_updated, businesses_removed, error_message";

impl DirectoryStore {
    /// Open a new audit row in `running` state and return its id.
    pub fn create_sync_log(&mut self, kind: &str) -> Result<i64, StoreError> {
        self.connection()
            .execute(
                "INSERT INTO sync_logs (sync_kind, status, started_at)
                 VALUES (?1, ?2, ?3)",
                (
                    kind,
                    SyncStatus::Running.as_str(),
                    Utc::now().to_rfc3339(),
                ),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "insert sync log row",
                source,
            })?;
        Ok(self.connection().last_insert_rowid())
    }

    /// Mark a running sync as succeeded, recording its final counts.
    pub fn finish_sync_success(
        &mut self,
        id: i64,
        added: u64,
        updated: u64,
    ) -> Result<(), StoreError> {
        let added = into_count(added, "added")?;
        let updated = into_count(updated, "updated")?;
        self.complete_sync_log(
            id,
            named_params! {
                ":id": id,
                ":status": SyncStatus::Success.as_str(),
                ":completed_at": Utc::now().to_rfc3339(),
                ":added": added,
                ":updated": updated,
            },
            "UPDATE sync_logs SET
                status = :status, completed_at = :completed_at,
                businesses_added = :added, businesses_updated = :updated
             WHERE id = :id AND status = 'running'",
        )
    }

    /// Mark a running sync as failed, recording the error message.
    pub fn finish_sync_failure(&mut self, id: i64, message: &str) -> Result<(), StoreError> {
        self.complete_sync_log(
            id,
            named_params! {
                ":id": id,
                ":status": SyncStatus::Failed.as_str(),
                ":completed_at": Utc::now().to_rfc3339(),
                ":message": message,
            },
            "UPDATE sync_logs SET
                status = :status, completed_at = :completed_at,
                error_message = :message
             WHERE id = :id AND status = 'running'",
        )
    }

    fn complete_sync_log(
        &mut self,
        id: i64,
        params: &[(&str, &dyn rusqlite::ToSql)],
        sql: &str,
    ) -> Result<(), StoreError> {
        let changed = self
            .connection()
            .execute(sql, params)
            .map_err(|source| StoreError::Sqlite {
                operation: "complete sync log row",
                source,
            })?;
        if changed == 0 {
            return Err(StoreError::SyncAlreadyCompleted { id });
        }
        Ok(())
    }

    /// Load one audit row by id.
    pub fn find_sync_log(&self, id: i64) -> Result<Option<SyncRecord>, StoreError> {
        let query = format!("SELECT {SYNC_LOG_COLUMNS} FROM sync_logs WHERE id = ?1");
        let raw = self
            .connection()
            .query_row(&query, [id], read_sync_log_row)
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "load sync log row",
                source,
            })?;
        raw.map(SyncLogRow::decode).transpose()
    }

    /// The most recently completed successful sync, if any.
    pub fn last_successful_sync(&self) -> Result<Option<SyncRecord>, StoreError> {
        let query = format!(
            "SELECT {SYNC_LOG_COLUMNS} FROM sync_logs
             WHERE status = 'success'
             ORDER BY completed_at DESC
             LIMIT 1"
        );
        let raw = self
            .connection()
            .query_row(&query, [], read_sync_log_row)
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "load last successful sync",
                source,
            })?;
        raw.map(SyncLogRow::decode).transpose()
    }
}

fn into_count(value: u64, what: &'static str) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::CountOutOfRange { what, value })
}

struct SyncLogRow {
    id: i64,
    sync_kind: String,
    status: String,
    started_at: String,
    completed_at: Option<String>,
    businesses_added: i64,
    businesses_updated: i64,
    businesses_removed: i64,
    error_message: Option<String>,
}

fn read_sync_log_row(row: &Row<'_>) -> rusqlite::Result<SyncLogRow> {
    Ok(SyncLogRow {
        id: row.get(0)?,
        sync_kind: row.get(1)?,
        status: row.get(2)?,
        started_at: row.get(3)?,
        completed_at: row.get(4)?,
        businesses_added: row.get(5)?,
        businesses_updated: row.get(6)?,
        businesses_removed: row.get(7)?,
        error_message: row.get(8)?,
    })
}

impl SyncLogRow {
    fn decode(self) -> Result<SyncRecord, StoreError> {
        let status: SyncStatus = self.status.parse()?;
        Ok(SyncRecord {
            id: self.id,
            kind: self.sync_kind,
            status,
            started_at: parse_timestamp(&self.started_at, "started_at", self.id)?,
            completed_at: self
                .completed_at
                .map(|text| parse_timestamp(&text, "completed_at", self.id))
                .transpose()?,
            businesses_added: self.businesses_added,
            businesses_updated: self.businesses_updated,
            businesses_removed: self.businesses_removed,
            error_message: self.error_message,
        })
    }
}

fn parse_timestamp(
    value: &str,
    column: &'static str,
    id: i64,
) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| StoreError::InvalidTimestamp { column, id, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> DirectoryStore {
        DirectoryStore::open_in_memory().expect("open store")
    }

    #[rstest]
    fn new_log_starts_running_without_completion(mut store: DirectoryStore) {
        let id = store.create_sync_log("full").expect("create log");
        let record = store
            .find_sync_log(id)
            .expect("load log")
            .expect("row exists");
        assert_eq!(record.status, SyncStatus::Running);
        assert_eq!(record.kind, "full");
        assert!(record.completed_at.is_none());
        assert_eq!(record.businesses_added, 0);
        assert_eq!(record.businesses_removed, 0);
    }

    #[rstest]
    fn success_records_counts_and_completion(mut store: DirectoryStore) {
        let id = store.create_sync_log("full").expect("create log");
        store
            .finish_sync_success(id, 12, 3)
            .expect("complete log");

        let record = store
            .find_sync_log(id)
            .expect("load log")
            .expect("row exists");
        assert_eq!(record.status, SyncStatus::Success);
        assert!(record.completed_at.is_some());
        assert_eq!(record.businesses_added, 12);
        assert_eq!(record.businesses_updated, 3);
        assert!(record.error_message.is_none());
    }

    #[rstest]
    fn failure_records_message_and_completion(mut store: DirectoryStore) {
        let id = store.create_sync_log("full").expect("create log");
        store
            .finish_sync_failure(id, "upstream unreachable")
            .expect("complete log");

        let record = store
            .find_sync_log(id)
            .expect("load log")
            .expect("row exists");
        assert_eq!(record.status, SyncStatus::Failed);
        assert!(record.completed_at.is_some());
        assert_eq!(
            record.error_message.as_deref(),
            Some("upstream unreachable")
        );
    }

    #[rstest]
    fn second_completion_is_rejected(mut store: DirectoryStore) {
        let id = store.create_sync_log("full").expect("create log");
        store.finish_sync_success(id, 1, 0).expect("first completion");

        let err = store
            .finish_sync_failure(id, "late failure")
            .expect_err("second completion must fail");
        assert!(matches!(err, StoreError::SyncAlreadyCompleted { id: found } if found == id));
    }

    #[rstest]
    fn last_successful_sync_skips_failures(mut store: DirectoryStore) {
        let first = store.create_sync_log("full").expect("create log");
        store.finish_sync_success(first, 5, 0).expect("complete");
        let second = store.create_sync_log("full").expect("create log");
        store
            .finish_sync_failure(second, "broken")
            .expect("complete");

        let last = store
            .last_successful_sync()
            .expect("load last")
            .expect("one success exists");
        assert_eq!(last.id, first);
    }
}
