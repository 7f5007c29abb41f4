//! HTTP/JSON surface of the annuaire directory.
//!
//! The router exposes the read paths (businesses, categories, stats) and the
//! administrative sync endpoints over a shared [`AppState`]. The store
//! handle is constructed by the process entry point and passed in; nothing
//! here owns global state.

#![forbid(unsafe_code)]

use std::fmt;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::sync::{Mutex, MutexGuard};

use annuaire_core::BusinessSource;
use annuaire_data::DirectoryStore;

mod api;
mod error;

pub use error::ApiError;

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<DirectoryStore>>,
    source: Arc<dyn BusinessSource + Send + Sync>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    /// Bundle the store handle and element source for the router.
    #[must_use]
    pub fn new(store: DirectoryStore, source: Arc<dyn BusinessSource + Send + Sync>) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            source,
        }
    }

    pub(crate) async fn store(&self) -> MutexGuard<'_, DirectoryStore> {
        self.store.lock().await
    }

    pub(crate) fn source(&self) -> &(dyn BusinessSource + Send + Sync) {
        self.source.as_ref()
    }
}

/// Build the API router over the given state.
///
/// # Examples
/// ```
/// use std::sync::Arc;
/// use annuaire_core::{BusinessSource, FetchError, SourceElement};
/// use annuaire_data::DirectoryStore;
/// use annuaire_server::{AppState, build_router};
///
/// struct EmptySource;
/// impl BusinessSource for EmptySource {
///     fn fetch_businesses(&self) -> Result<Vec<SourceElement>, FetchError> {
///         Ok(Vec::new())
///     }
/// }
///
/// let store = DirectoryStore::open_in_memory().expect("open store");
/// let router = build_router(AppState::new(store, Arc::new(EmptySource)));
/// # let _ = router;
/// ```
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/businesses", get(api::businesses::list))
        .route("/api/businesses/{id}", get(api::businesses::detail))
        .route("/api/categories", get(api::categories::list))
        .route("/api/stats", get(api::stats::overview))
        .route("/api/admin/sync", post(api::sync::trigger))
        .route("/api/admin/sync/{id}", get(api::sync::status))
        .with_state(state)
}
