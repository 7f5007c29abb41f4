//! Persistence and integration for the annuaire directory.
//!
//! Responsibilities:
//! - SQLite-backed directory store: schema, category seeding, business
//!   upserts and queries, and the sync audit log.
//! - HTTP adapter for the external Overpass-style geographic database.
//! - The sync orchestrator reconciling the store with the external source.
//!
//! Boundaries:
//! - Domain rules (classification, normalisation) live in `annuaire-core`.
//! - No global mutable state; callers construct and own the store handle.

#![forbid(unsafe_code)]

pub mod overpass;
pub mod store;
pub mod sync;

pub use overpass::{
    ClientBuildError, DEFAULT_CENTER, DEFAULT_OVERPASS_URL, DEFAULT_RADIUS_METERS, OverpassClient,
    OverpassConfig,
};
pub use store::{
    BusinessFilter, BusinessPage, CategoryWithCount, DEFAULT_PAGE_SIZE, DirectoryStore,
    MAX_PAGE_SIZE, StoreError, UpsertOutcome,
};
pub use sync::{DEFAULT_SYNC_KIND, SyncError, SyncReport, run_sync};
