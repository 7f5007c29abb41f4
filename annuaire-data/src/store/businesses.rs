//! Business persistence: upserts keyed by source identity plus the filtered,
//! paginated read queries behind the listing API.

use chrono::{DateTime, Utc};
use geo::Coord;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, Row, named_params, params_from_iter};

use annuaire_core::{Business, NewBusiness, SourceKind, SourceRef, Tags};

use super::{DirectoryStore, StoreError};

/// Default page size for business listings.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Hard ceiling on the page size; larger requests are clamped.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Result of an upsert, reported explicitly by the write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for the source identity; one was inserted.
    Created,
    /// An existing row was refreshed in place.
    Updated,
}

/// Filter and pagination parameters for business listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessFilter {
    /// Restrict to one category by slug. Unknown slugs apply no restriction.
    pub category_slug: Option<String>,
    /// Case-insensitive substring match over name, address, and city.
    pub search: Option<String>,
    /// 1-based page number; values below 1 are treated as 1.
    pub page: u32,
    /// Requested page size; clamped to [1, `MAX_PAGE_SIZE`].
    pub limit: u32,
}

impl Default for BusinessFilter {
    fn default() -> Self {
        Self {
            category_slug: None,
            search: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl BusinessFilter {
    /// The page size after clamping.
    #[must_use]
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// The page number after flooring at 1.
    #[must_use]
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    fn offset(&self) -> i64 {
        i64::from(self.effective_page() - 1) * i64::from(self.effective_limit())
    }
}

/// One page of filtered businesses together with the full filtered count.
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessPage {
    /// Rows on this page, in name order.
    pub items: Vec<Business>,
    /// Count of all rows matching the filter.
    pub total: i64,
    /// Effective 1-based page number.
    pub page: u32,
    /// Effective page size.
    pub limit: u32,
}

impl BusinessPage {
    /// Number of pages the filtered set spans.
    #[must_use]
    pub fn total_pages(&self) -> i64 {
        let limit = i64::from(self.limit);
        (self.total + limit - 1) / limit
    }
}

const BUSINESS_COLUMNS: &str = "b.id, b.osm_id, b.osm_kind, b.name, b.name_fr, b.name_en, \
     b.name_de, b.category_id, c.slug, b.subcategory, b.lat, b.lng, b.address, \
     b.postal_code, b.city, b.phone, b.email, b.website, b.opening_hours, \
     b.description, b.tags, b.photos, b.active, b.rating, b.review_count, \
     b.last_verified_at, b.created_at, b.updated_at";

impl DirectoryStore {
    /// Create or refresh the business identified by the record's source ref.
    ///
    /// The branch between insert and update is explicit, so the outcome
    /// reports reliably whether a new row appeared. Updates always re-mark
    /// the row active and stamp `last_verified_at`; creation and update
    /// timestamps are managed here, not by the caller.
    pub fn upsert_business(&mut self, record: &NewBusiness) -> Result<UpsertOutcome, StoreError> {
        let now = Utc::now().to_rfc3339();
        let tags_json =
            serde_json::to_string(&record.tags).map_err(|source| StoreError::SerializeJson {
                what: "business tags",
                source,
            })?;

        let transaction =
            self.connection_mut()
                .transaction()
                .map_err(|source| StoreError::Sqlite {
                    operation: "begin upsert transaction",
                    source,
                })?;

        let existing: Option<i64> = transaction
            .query_row(
                "SELECT id FROM businesses WHERE osm_id = ?1 AND osm_kind = ?2",
                (record.source.id, record.source.kind.as_str()),
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "look up business by source identity",
                source,
            })?;

        let outcome = match existing {
            Some(id) => {
                transaction
                    .execute(
                        "UPDATE businesses SET
                            name = :name, name_fr = :name_fr, name_en = :name_en,
                            name_de = :name_de, category_id = :category_id,
                            subcategory = :subcategory, lat = :lat, lng = :lng,
                            address = :address, postal_code = :postal_code,
                            city = :city, phone = :phone, email = :email,
                            website = :website, opening_hours = :opening_hours,
                            description = :description, tags = :tags, active = 1,
                            last_verified_at = :now, updated_at = :now
                        WHERE id = :id",
                        named_params! {
                            ":id": id,
                            ":name": record.name,
                            ":name_fr": record.name_fr,
                            ":name_en": record.name_en,
                            ":name_de": record.name_de,
                            ":category_id": record.category_id,
                            ":subcategory": record.subcategory,
                            ":lat": record.location.y,
                            ":lng": record.location.x,
                            ":address": record.address,
                            ":postal_code": record.postal_code,
                            ":city": record.city,
                            ":phone": record.phone,
                            ":email": record.email,
                            ":website": record.website,
                            ":opening_hours": record.opening_hours,
                            ":description": record.description,
                            ":tags": tags_json,
                            ":now": now,
                        },
                    )
                    .map_err(|source| StoreError::Sqlite {
                        operation: "update business row",
                        source,
                    })?;
                UpsertOutcome::Updated
            }
            None => {
                transaction
                    .execute(
                        "INSERT INTO businesses (
                            osm_id, osm_kind, name, name_fr, name_en, name_de,
                            category_id, subcategory, lat, lng, address,
                            postal_code, city, phone, email, website,
                            opening_hours, description, tags, active,
                            last_verified_at, created_at, updated_at
                        ) VALUES (
                            :osm_id, :osm_kind, :name, :name_fr, :name_en,
                            :name_de, :category_id, :subcategory, :lat, :lng,
                            :address, :postal_code, :city, :phone, :email,
                            :website, :opening_hours, :description, :tags, 1,
                            :now, :now, :now
                        )",
                        named_params! {
                            ":osm_id": record.source.id,
                            ":osm_kind": record.source.kind.as_str(),
                            ":name": record.name,
                            ":name_fr": record.name_fr,
                            ":name_en": record.name_en,
                            ":name_de": record.name_de,
                            ":category_id": record.category_id,
                            ":subcategory": record.subcategory,
                            ":lat": record.location.y,
                            ":lng": record.location.x,
                            ":address": record.address,
                            ":postal_code": record.postal_code,
                            ":city": record.city,
                            ":phone": record.phone,
                            ":email": record.email,
                            ":website": record.website,
                            ":opening_hours": record.opening_hours,
                            ":description": record.description,
                            ":tags": tags_json,
                            ":now": now,
                        },
                    )
                    .map_err(|source| StoreError::Sqlite {
                        operation: "insert business row",
                        source,
                    })?;
                UpsertOutcome::Created
            }
        };

        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit upsert transaction",
            source,
        })?;

        Ok(outcome)
    }

    /// Load one business by row id, with its category slug joined in.
    pub fn find_business(&self, id: i64) -> Result<Option<Business>, StoreError> {
        let query = format!(
            "SELECT {BUSINESS_COLUMNS}
             FROM businesses b
             LEFT JOIN categories c ON c.id = b.category_id
             WHERE b.id = ?1"
        );
        let raw = self
            .connection()
            .query_row(&query, [id], read_business_row)
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "load business row",
                source,
            })?;
        raw.map(BusinessRow::decode).transpose()
    }

    /// List active businesses matching the filter, name-ordered and paged.
    ///
    /// The returned total counts every matching row, not just this page. An
    /// unknown category slug matches the original behaviour and applies no
    /// category restriction.
    pub fn list_businesses(&self, filter: &BusinessFilter) -> Result<BusinessPage, StoreError> {
        let category_id = match filter.category_slug.as_deref() {
            Some(slug) => self.find_category_by_slug(slug)?.map(|category| category.id),
            None => None,
        };

        let (where_clause, params) = build_where(category_id, filter.search.as_deref());

        let count_query = format!("SELECT COUNT(*) FROM businesses b WHERE {where_clause}");
        let total: i64 = self
            .connection()
            .query_row(
                &count_query,
                params_from_iter(params.iter().cloned()),
                |row| row.get(0),
            )
            .map_err(|source| StoreError::Sqlite {
                operation: "count filtered businesses",
                source,
            })?;

        let limit = filter.effective_limit();
        let page = filter.effective_page();
        let mut page_params = params;
        page_params.push(Value::Integer(i64::from(limit)));
        let limit_index = page_params.len();
        page_params.push(Value::Integer(filter.offset()));
        let offset_index = page_params.len();

        let list_query = format!(
            "SELECT {BUSINESS_COLUMNS}
             FROM businesses b
             LEFT JOIN categories c ON c.id = b.category_id
             WHERE {where_clause}
             ORDER BY b.name ASC
             LIMIT ?{limit_index} OFFSET ?{offset_index}"
        );

        let mut statement =
            self.connection()
                .prepare(&list_query)
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare business listing",
                    source,
                })?;
        let rows = statement
            .query_map(params_from_iter(page_params), read_business_row)
            .map_err(|source| StoreError::Sqlite {
                operation: "run business listing",
                source,
            })?;

        let mut items = Vec::new();
        for raw in rows {
            let raw = raw.map_err(|source| StoreError::Sqlite {
                operation: "read business listing row",
                source,
            })?;
            items.push(raw.decode()?);
        }

        Ok(BusinessPage {
            items,
            total,
            page,
            limit,
        })
    }

    /// Count all active businesses.
    pub fn count_active_businesses(&self) -> Result<i64, StoreError> {
        self.connection()
            .query_row("SELECT COUNT(*) FROM businesses WHERE active = 1", [], |row| {
                row.get(0)
            })
            .map_err(|source| StoreError::Sqlite {
                operation: "count active businesses",
                source,
            })
    }
}

fn build_where(category_id: Option<i64>, search: Option<&str>) -> (String, Vec<Value>) {
    let mut clauses = vec!["b.active = 1".to_owned()];
    let mut params: Vec<Value> = Vec::new();

    if let Some(id) = category_id {
        params.push(Value::Integer(id));
        clauses.push(format!("b.category_id = ?{}", params.len()));
    }

    if let Some(term) = search {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        params.push(Value::Text(pattern));
        let index = params.len();
        clauses.push(format!(
            "(LOWER(b.name) LIKE ?{index} ESCAPE '\\'
              OR LOWER(IFNULL(b.address, '')) LIKE ?{index} ESCAPE '\\'
              OR LOWER(IFNULL(b.city, '')) LIKE ?{index} ESCAPE '\\')"
        ));
    }

    (clauses.join(" AND "), params)
}

/// Escape LIKE wildcards so search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Raw column values of one joined business row, decoded in a second step so
/// JSON and timestamp failures map to typed store errors.
struct BusinessRow {
    id: i64,
    osm_id: i64,
    osm_kind: String,
    name: String,
    name_fr: Option<String>,
    name_en: Option<String>,
    name_de: Option<String>,
    category_id: Option<i64>,
    category_slug: Option<String>,
    subcategory: Option<String>,
    lat: f64,
    lng: f64,
    address: Option<String>,
    postal_code: Option<String>,
    city: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    website: Option<String>,
    opening_hours: Option<String>,
    description: Option<String>,
    tags: String,
    photos: String,
    active: bool,
    rating: Option<f64>,
    review_count: Option<i64>,
    last_verified_at: Option<String>,
    created_at: String,
    updated_at: String,
}

fn read_business_row(row: &Row<'_>) -> rusqlite::Result<BusinessRow> {
    Ok(BusinessRow {
        id: row.get(0)?,
        osm_id: row.get(1)?,
        osm_kind: row.get(2)?,
        name: row.get(3)?,
        name_fr: row.get(4)?,
        name_en: row.get(5)?,
        name_de: row.get(6)?,
        category_id: row.get(7)?,
        category_slug: row.get(8)?,
        subcategory: row.get(9)?,
        lat: row.get(10)?,
        lng: row.get(11)?,
        address: row.get(12)?,
        postal_code: row.get(13)?,
        city: row.get(14)?,
        phone: row.get(15)?,
        email: row.get(16)?,
        website: row.get(17)?,
        opening_hours: row.get(18)?,
        description: row.get(19)?,
        tags: row.get(20)?,
        photos: row.get(21)?,
        active: row.get(22)?,
        rating: row.get(23)?,
        review_count: row.get(24)?,
        last_verified_at: row.get(25)?,
        created_at: row.get(26)?,
        updated_at: row.get(27)?,
    })
}

impl BusinessRow {
    fn decode(self) -> Result<Business, StoreError> {
        let kind: SourceKind = self.osm_kind.parse()?;
        let tags: Tags =
            serde_json::from_str(&self.tags).map_err(|source| StoreError::InvalidStoredJson {
                column: "tags",
                id: self.id,
                source,
            })?;
        let photos: Vec<String> =
            serde_json::from_str(&self.photos).map_err(|source| StoreError::InvalidStoredJson {
                column: "photos",
                id: self.id,
                source,
            })?;

        Ok(Business {
            id: self.id,
            source: SourceRef::new(kind, self.osm_id),
            name: self.name,
            name_fr: self.name_fr,
            name_en: self.name_en,
            name_de: self.name_de,
            category_id: self.category_id,
            category_slug: self.category_slug,
            subcategory: self.subcategory,
            location: Coord {
                x: self.lng,
                y: self.lat,
            },
            address: self.address,
            postal_code: self.postal_code,
            city: self.city,
            phone: self.phone,
            email: self.email,
            website: self.website,
            opening_hours: self.opening_hours,
            description: self.description,
            tags,
            photos,
            active: self.active,
            rating: self.rating,
            review_count: self.review_count,
            last_verified_at: parse_optional_timestamp(
                self.last_verified_at,
                "last_verified_at",
                self.id,
            )?,
            created_at: parse_timestamp(&self.created_at, "created_at", self.id)?,
            updated_at: parse_timestamp(&self.updated_at, "updated_at", self.id)?,
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

fn parse_optional_timestamp(
    value: Option<String>,
    column: &'static str,
    id: i64,
) -> Result<Option<DateTime<Utc>>, StoreError> {
    value
        .map(|text| parse_timestamp(&text, column, id))
        .transpose()
}
