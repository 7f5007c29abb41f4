//! Taxonomy persistence: one-off seeding plus the read queries behind the
//! category listing and stats endpoints.

use rusqlite::{OptionalExtension, Row, named_params};
use serde_json::{Map, Value};

use annuaire_core::{Category, SEED_CATEGORIES};

use super::{DirectoryStore, StoreError};

/// A taxonomy row together with its active-business count.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryWithCount {
    pub category: Category,
    pub business_count: i64,
}

const CATEGORY_COLUMNS: &str =
    "id, slug, name_fr, name_en, name_de, icon, color, osm_tags, display_order, active";

impl DirectoryStore {
    /// Write the built-in taxonomy into the store, updating rows in place
    /// when their slug already exists. Returns the number of rows written.
    pub fn seed_categories(&mut self) -> Result<usize, StoreError> {
        let transaction =
            self.connection_mut()
                .transaction()
                .map_err(|source| StoreError::Sqlite {
                    operation: "begin seed transaction",
                    source,
                })?;

        for seed in SEED_CATEGORIES {
            let osm_tags = seed_tags_json(seed.osm_tags)?;
            let existing: Option<i64> = transaction
                .query_row(
                    "SELECT id FROM categories WHERE slug = ?1",
                    [seed.main.slug()],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|source| StoreError::Sqlite {
                    operation: "look up category by slug",
                    source,
                })?;

            match existing {
                Some(id) => {
                    transaction
                        .execute(
                            "UPDATE categories SET
                                name_fr = :name_fr, name_en = :name_en,
                                name_de = :name_de, icon = :icon, color = :color,
                                osm_tags = :osm_tags,
                                display_order = :display_order, active = 1
                            WHERE id = :id",
                            named_params! {
                                ":id": id,
                                ":name_fr": seed.name_fr,
                                ":name_en": seed.name_en,
                                ":name_de": seed.name_de,
                                ":icon": seed.icon,
                                ":color": seed.color,
                                ":osm_tags": osm_tags,
                                ":display_order": seed.display_order,
                            },
                        )
                        .map_err(|source| StoreError::Sqlite {
                            operation: "update seeded category",
                            source,
                        })?;
                }
                None => {
                    transaction
                        .execute(
                            "INSERT INTO categories (
                                slug, name_fr, name_en, name_de, icon, color,
                                osm_tags, display_order, active
                            ) VALUES (
                                :slug, :name_fr, :name_en, :name_de, :icon,
                                :color, :osm_tags, :display_order, 1
                            )",
                            named_params! {
                                ":slug": seed.main.slug(),
                                ":name_fr": seed.name_fr,
                                ":name_en": seed.name_en,
                                ":name_de": seed.name_de,
                                ":icon": seed.icon,
                                ":color": seed.color,
                                ":osm_tags": osm_tags,
                                ":display_order": seed.display_order,
                            },
                        )
                        .map_err(|source| StoreError::Sqlite {
                            operation: "insert seeded category",
                            source,
                        })?;
                }
            }
        }

        transaction.commit().map_err(|source| StoreError::Sqlite {
            operation: "commit seed transaction",
            source,
        })?;

        Ok(SEED_CATEGORIES.len())
    }

    /// Look up one taxonomy row by slug.
    pub fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, StoreError> {
        let query =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = ?1");
        let raw = self
            .connection()
            .query_row(&query, [slug], read_category_row)
            .optional()
            .map_err(|source| StoreError::Sqlite {
                operation: "load category row",
                source,
            })?;
        raw.map(CategoryRow::decode).transpose()
    }

    /// List active taxonomy rows in display order, each with the number of
    /// active businesses referencing it.
    pub fn list_categories_with_counts(&self) -> Result<Vec<CategoryWithCount>, StoreError> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS},
                    (SELECT COUNT(*) FROM businesses b
                     WHERE b.category_id = categories.id AND b.active = 1)
             FROM categories
             WHERE active = 1
             ORDER BY display_order ASC"
        );
        let mut statement =
            self.connection()
                .prepare(&query)
                .map_err(|source| StoreError::Sqlite {
                    operation: "prepare category listing",
                    source,
                })?;
        let rows = statement
            .query_map([], |row| {
                let raw = read_category_row(row)?;
                let count: i64 = row.get(10)?;
                Ok((raw, count))
            })
            .map_err(|source| StoreError::Sqlite {
                operation: "run category listing",
                source,
            })?;

        let mut categories = Vec::new();
        for row in rows {
            let (raw, business_count) = row.map_err(|source| StoreError::Sqlite {
                operation: "read category listing row",
                source,
            })?;
            categories.push(CategoryWithCount {
                category: raw.decode()?,
                business_count,
            });
        }
        Ok(categories)
    }
}

/// Serialise a seed's tag families as a JSON object of string arrays.
fn seed_tags_json(
    families: &[(&'static str, &'static [&'static str])],
) -> Result<String, StoreError> {
    let mut object = Map::new();
    for (key, values) in families {
        let array = values
            .iter()
            .map(|value| Value::String((*value).to_owned()))
            .collect();
        object.insert((*key).to_owned(), Value::Array(array));
    }
    serde_json::to_string(&Value::Object(object)).map_err(|source| StoreError::SerializeJson {
        what: "category tag families",
        source,
    })
}

struct CategoryRow {
    id: i64,
    slug: String,
    name_fr: String,
    name_en: String,
    name_de: String,
    icon: String,
    color: String,
    osm_tags: String,
    display_order: i64,
    active: bool,
}

fn read_category_row(row: &Row<'_>) -> rusqlite::Result<CategoryRow> {
    Ok(CategoryRow {
        id: row.get(0)?,
        slug: row.get(1)?,
        name_fr: row.get(2)?,
        name_en: row.get(3)?,
        name_de: row.get(4)?,
        icon: row.get(5)?,
        color: row.get(6)?,
        osm_tags: row.get(7)?,
        display_order: row.get(8)?,
        active: row.get(9)?,
    })
}

impl CategoryRow {
    fn decode(self) -> Result<Category, StoreError> {
        let parsed: Value =
            serde_json::from_str(&self.osm_tags).map_err(|source| StoreError::InvalidStoredJson {
                column: "osm_tags",
                id: self.id,
                source,
            })?;
        let osm_tags = match parsed {
            Value::Object(object) => object
                .into_iter()
                .map(|(key, values)| {
                    let values = match values {
                        Value::Array(entries) => entries
                            .into_iter()
                            .filter_map(|entry| entry.as_str().map(str::to_owned))
                            .collect(),
                        _ => Vec::new(),
                    };
                    (key, values)
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(Category {
            id: self.id,
            slug: self.slug,
            name_fr: self.name_fr,
            name_en: self.name_en,
            name_de: self.name_de,
            icon: self.icon,
            color: self.color,
            osm_tags,
            display_order: self.display_order,
            active: self.active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annuaire_core::{MainCategory, NewBusiness, SourceKind, SourceRef, Tags};
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> DirectoryStore {
        let mut store = DirectoryStore::open_in_memory().expect("open store");
        store.seed_categories().expect("seed categories");
        store
    }

    #[rstest]
    fn seeding_is_idempotent(mut store: DirectoryStore) {
        let written = store.seed_categories().expect("reseed");
        assert_eq!(written, SEED_CATEGORIES.len());

        let count: i64 = store
            .connection()
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))
            .expect("count categories");
        assert_eq!(count, SEED_CATEGORIES.len() as i64);
    }

    #[rstest]
    fn slug_lookup_round_trips_tag_families(store: DirectoryStore) {
        let shops = store
            .find_category_by_slug("shops")
            .expect("look up")
            .expect("seeded");
        assert_eq!(shops.name_fr, "Magasins");
        assert_eq!(
            shops.osm_tags,
            vec![("shop".to_owned(), vec!["*".to_owned()])]
        );
    }

    #[rstest]
    fn unknown_slug_returns_none(store: DirectoryStore) {
        assert!(
            store
                .find_category_by_slug("does-not-exist")
                .expect("look up")
                .is_none()
        );
    }

    #[rstest]
    fn listing_orders_by_display_order_and_counts_active_rows(mut store: DirectoryStore) {
        let shops = store
            .find_category_by_slug("shops")
            .expect("look up")
            .expect("seeded");
        let record = NewBusiness {
            source: SourceRef::new(SourceKind::Node, 1),
            name: "Librairie".to_owned(),
            name_fr: None,
            name_en: None,
            name_de: None,
            category_id: Some(shops.id),
            subcategory: Some("books".to_owned()),
            location: Coord { x: 7.79, y: 48.82 },
            address: None,
            postal_code: None,
            city: None,
            phone: None,
            email: None,
            website: None,
            opening_hours: None,
            description: None,
            tags: Tags::new(),
        };
        store.upsert_business(&record).expect("upsert");

        let listed = store.list_categories_with_counts().expect("list");
        assert_eq!(listed.len(), SEED_CATEGORIES.len());
        assert_eq!(listed[0].category.slug, MainCategory::Restaurants.slug());

        let shops_row = listed
            .iter()
            .find(|entry| entry.category.slug == "shops")
            .expect("shops listed");
        assert_eq!(shops_row.business_count, 1);

        let orders: Vec<_> = listed
            .iter()
            .map(|entry| entry.category.display_order)
            .collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }
}
