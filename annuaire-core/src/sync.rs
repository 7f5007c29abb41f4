//! Audit records for ingestion runs.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Lifecycle state of one sync run.
///
/// A record starts `Running` and moves to exactly one of `Success` or
/// `Failed`; the completion timestamp is set together with the terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Running,
    Success,
    Failed,
}

impl SyncStatus {
    /// Stable lowercase name used in storage and on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognised [`SyncStatus`] name.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown sync status {found:?}")]
pub struct UnknownSyncStatus {
    /// The value that failed to parse.
    pub found: String,
}

impl FromStr for SyncStatus {
    type Err = UnknownSyncStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(Self::Running),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownSyncStatus {
                found: other.to_owned(),
            }),
        }
    }
}

/// One ingestion run's audit row.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncRecord {
    /// Local row id, also the public sync id.
    pub id: i64,
    /// Free-text run kind, `"full"` by default.
    pub kind: String,
    pub status: SyncStatus,
    pub started_at: DateTime<Utc>,
    /// Set exactly when the status is terminal.
    pub completed_at: Option<DateTime<Utc>>,
    pub businesses_added: i64,
    pub businesses_updated: i64,
    /// Defined in the data model but never computed by any sync path.
    pub businesses_removed: i64,
    pub error_message: Option<String>,
}
