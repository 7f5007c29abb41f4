//! Behavioural tests for the on-disk store lifecycle.

use geo::Coord;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use annuaire_core::{NewBusiness, SourceKind, SourceRef, Tags};
use annuaire_data::{BusinessFilter, DirectoryStore};

fn record(osm_id: i64, name: &str) -> NewBusiness {
    NewBusiness {
        source: SourceRef::new(SourceKind::Node, osm_id),
        name: name.to_owned(),
        name_fr: None,
        name_en: None,
        name_de: None,
        category_id: None,
        subcategory: None,
        location: Coord { x: 7.79, y: 48.82 },
        address: None,
        postal_code: None,
        city: Some("Haguenau".to_owned()),
        phone: None,
        email: None,
        website: None,
        opening_hours: None,
        description: None,
        tags: Tags::from([("name".to_owned(), name.to_owned())]),
    }
}

#[fixture]
fn scratch_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

#[rstest]
fn data_survives_a_close_and_reopen(scratch_dir: TempDir) {
    let database = scratch_dir.path().join("annuaire.db");

    let mut store = DirectoryStore::open(&database).expect("open store");
    store.seed_categories().expect("seed categories");
    store
        .upsert_business(&record(1, "Boulangerie Muller"))
        .expect("upsert");
    store.close().expect("close store");

    let store = DirectoryStore::open(&database).expect("reopen store");
    let page = store
        .list_businesses(&BusinessFilter::default())
        .expect("list businesses");
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Boulangerie Muller");
    assert_eq!(page.items[0].city.as_deref(), Some("Haguenau"));

    let categories = store
        .list_categories_with_counts()
        .expect("list categories");
    assert_eq!(categories.len(), 9);
}

#[rstest]
fn timestamps_distinguish_creation_from_updates(scratch_dir: TempDir) {
    let database = scratch_dir.path().join("annuaire.db");
    let mut store = DirectoryStore::open(&database).expect("open store");

    store
        .upsert_business(&record(1, "Fleuriste Rose"))
        .expect("first upsert");
    let first = store
        .list_businesses(&BusinessFilter::default())
        .expect("list")
        .items
        .remove(0);
    assert_eq!(first.created_at, first.updated_at);
    let verified_first = first.last_verified_at.expect("stamped on write");

    store
        .upsert_business(&record(1, "Fleuriste Rose et Lys"))
        .expect("second upsert");
    let second = store
        .list_businesses(&BusinessFilter::default())
        .expect("list")
        .items
        .remove(0);
    assert_eq!(second.name, "Fleuriste Rose et Lys");
    assert_eq!(second.created_at, first.created_at);
    assert!(second.updated_at >= first.updated_at);
    assert!(second.last_verified_at.expect("restamped") >= verified_first);
}
