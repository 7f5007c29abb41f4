//! The sync orchestrator: one batch reconciliation of the directory store
//! against the external source.
//!
//! A run is a single sequential pass. Per-element failures are not caught
//! individually; the first store error aborts the run, the audit row records
//! the failure, and the error propagates to the caller.

use log::{info, warn};
use thiserror::Error;

use annuaire_core::{
    BusinessSource, FetchError, NewBusiness, SourceElement, classify, extract_address,
    extract_contact,
};

use crate::store::{DirectoryStore, StoreError, UpsertOutcome};

/// Run kind recorded when the caller does not name one.
pub const DEFAULT_SYNC_KIND: &str = "full";

/// Final counts of one successful sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncReport {
    /// Audit row id for this run.
    pub sync_id: i64,
    /// Businesses inserted for the first time.
    pub added: u64,
    /// Businesses refreshed in place.
    pub updated: u64,
}

/// Errors raised by a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Fetching from the external source failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reconcile the store with the external source in one batch run.
///
/// Creates the audit row in `running` state, ingests every fetched element
/// that carries a name and resolvable coordinates, and completes the audit
/// row with the final state. On failure the audit row is marked `failed`
/// with the error message before the error is returned; entities absent
/// from the feed are never deactivated.
///
/// Two concurrent runs race on upserts of the same source identity with no
/// locking; the last writer wins.
pub fn run_sync<S: BusinessSource + ?Sized>(
    store: &mut DirectoryStore,
    source: &S,
    kind: &str,
) -> Result<SyncReport, SyncError> {
    let sync_id = store.create_sync_log(kind)?;
    info!("sync {sync_id} ({kind}) started");

    match ingest_all(store, source) {
        Ok((added, updated)) => {
            store.finish_sync_success(sync_id, added, updated)?;
            info!("sync {sync_id} completed: {added} added, {updated} updated");
            Ok(SyncReport {
                sync_id,
                added,
                updated,
            })
        }
        Err(err) => {
            // Best effort: the original failure wins over audit bookkeeping.
            if let Err(log_err) = store.finish_sync_failure(sync_id, &err.to_string()) {
                warn!("sync {sync_id} failed and the audit row could not be updated: {log_err}");
            }
            Err(err)
        }
    }
}

fn ingest_all<S: BusinessSource + ?Sized>(
    store: &mut DirectoryStore,
    source: &S,
) -> Result<(u64, u64), SyncError> {
    let elements = source.fetch_businesses()?;
    info!("fetched {} named elements from source", elements.len());

    let mut added = 0u64;
    let mut updated = 0u64;

    for element in elements {
        let Some(record) = prepare_record(store, &element)? else {
            continue;
        };
        match store.upsert_business(&record)? {
            UpsertOutcome::Created => added += 1,
            UpsertOutcome::Updated => updated += 1,
        }
    }

    Ok((added, updated))
}

/// Derive the upsert payload for one element, or `None` when the element
/// lacks a name or resolvable coordinates.
fn prepare_record(
    store: &DirectoryStore,
    element: &SourceElement,
) -> Result<Option<NewBusiness>, SyncError> {
    let Some(name) = element.name() else {
        return Ok(None);
    };
    let Some(location) = element.location else {
        return Ok(None);
    };

    let classification = classify(&element.tags);
    let address = extract_address(&element.tags);
    let contact = extract_contact(&element.tags);

    // A classification slug missing from the taxonomy is not an error; the
    // business is stored without a category link.
    let category_id = store
        .find_category_by_slug(classification.main.slug())?
        .map(|category| category.id);

    Ok(Some(NewBusiness {
        source: element.source,
        name: name.to_owned(),
        name_fr: element.tags.get("name:fr").cloned(),
        name_en: element.tags.get("name:en").cloned(),
        name_de: element.tags.get("name:de").cloned(),
        category_id,
        subcategory: classification.subcategory,
        location,
        address: address.address,
        postal_code: address.postal_code,
        city: address.city,
        phone: contact.phone,
        email: contact.email,
        website: contact.website,
        opening_hours: element.tags.get("opening_hours").cloned(),
        description: element.tags.get("description").cloned(),
        tags: element.tags.clone(),
    }))
}
