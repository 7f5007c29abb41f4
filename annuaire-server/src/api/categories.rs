//! Category listing endpoint.

use axum::Json;
use axum::extract::State;
use log::error;
use serde::Serialize;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct CategoryEntry {
    pub id: i64,
    pub slug: String,
    /// French display name, the directory's default locale.
    pub name: String,
    pub icon: String,
    pub color: String,
    /// Active businesses referencing the category.
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CategoriesResponse {
    pub data: Vec<CategoryEntry>,
}

/// `GET /api/categories` — active taxonomy rows in display order.
pub async fn list(State(state): State<AppState>) -> Result<Json<CategoriesResponse>, ApiError> {
    let categories = {
        let store = state.store().await;
        store.list_categories_with_counts().map_err(|err| {
            error!("failed to list categories: {err}");
            ApiError::internal("Failed to fetch categories")
        })?
    };

    let data = categories
        .into_iter()
        .map(|entry| CategoryEntry {
            id: entry.category.id,
            slug: entry.category.slug,
            name: entry.category.name_fr,
            icon: entry.category.icon,
            color: entry.category.color,
            count: entry.business_count,
        })
        .collect();

    Ok(Json(CategoriesResponse { data }))
}
