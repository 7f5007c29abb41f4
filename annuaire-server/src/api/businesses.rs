//! Business listing and detail endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use geo::Coord;
use log::error;
use serde::{Deserialize, Serialize};

use annuaire_core::{Business, OpeningHours, Tags, haversine_distance, parse_opening_hours};
use annuaire_data::{BusinessFilter, DEFAULT_PAGE_SIZE};

use crate::{ApiError, AppState};

/// Default reference point for distance annotation (Haguenau).
const DEFAULT_LAT: f64 = 48.82;
const DEFAULT_LNG: f64 = 7.79;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    lat: Option<f64>,
    lng: Option<f64>,
    /// Reserved: accepted but not applied to filtering.
    radius: Option<u32>,
    category: Option<String>,
    search: Option<String>,
    page: Option<u32>,
    limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSummary {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub location: Location,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    /// Great-circle distance from the reference point, rounded to metres.
    pub distance: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<BusinessSummary>,
    pub pagination: Pagination,
}

/// `GET /api/businesses` — filtered, paginated, distance-annotated listing.
///
/// The page is sorted by ascending distance after pagination, so ordering
/// holds within a page but not across page boundaries.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError> {
    let reference = Coord {
        x: params.lng.unwrap_or(DEFAULT_LNG),
        y: params.lat.unwrap_or(DEFAULT_LAT),
    };
    // Radius is accepted for forward compatibility but not applied yet.
    let _ = params.radius;
    let filter = BusinessFilter {
        category_slug: params.category,
        search: params.search,
        page: params.page.unwrap_or(1),
        limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
    };

    let page = {
        let store = state.store().await;
        store.list_businesses(&filter).map_err(|err| {
            error!("failed to list businesses: {err}");
            ApiError::internal("Failed to fetch businesses")
        })?
    };

    let mut data: Vec<BusinessSummary> = page
        .items
        .iter()
        .map(|business| summarize(business, reference))
        .collect();
    data.sort_by_key(|summary| summary.distance);

    Ok(Json(ListResponse {
        data,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        },
    }))
}

fn summarize(business: &Business, reference: Coord<f64>) -> BusinessSummary {
    let metres = haversine_distance(reference, business.location);
    BusinessSummary {
        id: business.id,
        name: business.name.clone(),
        category: business.category_slug.clone(),
        location: Location {
            lat: business.location.y,
            lng: business.location.x,
        },
        address: business.address.clone(),
        city: business.city.clone(),
        phone: business.phone.clone(),
        website: business.website.clone(),
        rating: business.rating,
        distance: metres.round() as i64,
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessDetail {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub location: Location,
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub opening_hours: Option<OpeningHours>,
    pub description: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
    pub photos: Vec<String>,
    pub tags: Tags,
}

/// `GET /api/businesses/{id}` — one business with normalised opening hours.
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BusinessDetail>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid business ID"))?;

    let business = {
        let store = state.store().await;
        store.find_business(id).map_err(|err| {
            error!("failed to load business {id}: {err}");
            ApiError::internal("Failed to fetch business")
        })?
    };

    let Some(business) = business.filter(|b| b.active) else {
        return Err(ApiError::not_found("Business not found"));
    };

    let opening_hours = business
        .opening_hours
        .as_deref()
        .map(parse_opening_hours);

    Ok(Json(BusinessDetail {
        id: business.id,
        name: business.name,
        category: business.category_slug,
        location: Location {
            lat: business.location.y,
            lng: business.location.x,
        },
        address: business.address,
        postal_code: business.postal_code,
        city: business.city,
        phone: business.phone,
        email: business.email,
        website: business.website,
        opening_hours,
        description: business.description,
        rating: business.rating,
        review_count: business.review_count,
        photos: business.photos,
        tags: business.tags,
    }))
}
