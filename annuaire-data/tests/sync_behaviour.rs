//! Behavioural tests for the sync orchestrator.

use geo::Coord;
use rstest::{fixture, rstest};

use annuaire_core::{
    BusinessSource, FetchError, SourceElement, SourceKind, SourceRef, SyncStatus, Tags,
};
use annuaire_data::{BusinessFilter, DirectoryStore, SyncError, run_sync};

/// Source stub replaying a fixed element list, or failing outright.
struct StubSource {
    outcome: Result<Vec<SourceElement>, FetchError>,
}

impl StubSource {
    fn with_elements(elements: Vec<SourceElement>) -> Self {
        Self {
            outcome: Ok(elements),
        }
    }

    fn failing() -> Self {
        Self {
            outcome: Err(FetchError::Status {
                url: "http://overpass.local".to_owned(),
                status: 504,
            }),
        }
    }
}

impl BusinessSource for StubSource {
    fn fetch_businesses(&self) -> Result<Vec<SourceElement>, FetchError> {
        self.outcome.clone()
    }
}

fn element(id: i64, name: &str, extra: &[(&str, &str)]) -> SourceElement {
    let mut tags = Tags::from([("name".to_owned(), name.to_owned())]);
    for (key, value) in extra {
        tags.insert((*key).to_owned(), (*value).to_owned());
    }
    SourceElement {
        source: SourceRef::new(SourceKind::Node, id),
        location: Some(Coord { x: 7.79, y: 48.82 }),
        tags,
    }
}

#[fixture]
fn store() -> DirectoryStore {
    let mut store = DirectoryStore::open_in_memory().expect("open store");
    store.seed_categories().expect("seed categories");
    store
}

#[rstest]
fn successful_run_upserts_and_records_counts(mut store: DirectoryStore) {
    let source = StubSource::with_elements(vec![
        element(1, "Boulangerie Muller", &[("shop", "bakery")]),
        element(2, "Café de la Gare", &[("amenity", "cafe")]),
    ]);

    let report = run_sync(&mut store, &source, "full").expect("sync succeeds");
    assert_eq!(report.added, 2);
    assert_eq!(report.updated, 0);

    let record = store
        .find_sync_log(report.sync_id)
        .expect("load audit row")
        .expect("audit row exists");
    assert_eq!(record.status, SyncStatus::Success);
    assert_eq!(record.businesses_added, 2);
    assert_eq!(record.businesses_updated, 0);
    assert!(record.completed_at.is_some());

    let page = store
        .list_businesses(&BusinessFilter::default())
        .expect("list businesses");
    assert_eq!(page.total, 2);
    let bakery = page
        .items
        .iter()
        .find(|b| b.name == "Boulangerie Muller")
        .expect("bakery stored");
    assert_eq!(bakery.category_slug.as_deref(), Some("shops"));
    assert_eq!(bakery.subcategory.as_deref(), Some("bakery"));
    assert!(bakery.last_verified_at.is_some());
}

#[rstest]
fn rerunning_an_unchanged_feed_does_not_grow_the_store(mut store: DirectoryStore) {
    let elements = vec![
        element(1, "Boulangerie Muller", &[("shop", "bakery")]),
        element(2, "Café de la Gare", &[("amenity", "cafe")]),
    ];
    let source = StubSource::with_elements(elements);

    let first = run_sync(&mut store, &source, "full").expect("first run");
    let second = run_sync(&mut store, &source, "full").expect("second run");

    assert_eq!(first.added, 2);
    assert_eq!(second.added, 0);
    assert_eq!(second.updated, 2);
    assert_eq!(store.count_active_businesses().expect("count"), 2);
}

#[rstest]
fn elements_without_name_or_coordinates_are_skipped(mut store: DirectoryStore) {
    let mut unnamed = element(1, "placeholder", &[("shop", "bakery")]);
    unnamed.tags.remove("name");
    let mut floating = element(2, "Sans Position", &[("shop", "florist")]);
    floating.location = None;
    let source = StubSource::with_elements(vec![
        unnamed,
        floating,
        element(3, "Fleuriste Rose", &[("shop", "florist")]),
    ]);

    let report = run_sync(&mut store, &source, "full").expect("sync succeeds");
    assert_eq!(report.added, 1);
    assert_eq!(store.count_active_businesses().expect("count"), 1);
}

#[rstest]
fn missing_taxonomy_row_stores_business_without_category() {
    // Deliberately unseeded: every slug lookup misses.
    let mut store = DirectoryStore::open_in_memory().expect("open store");
    let source = StubSource::with_elements(vec![element(
        1,
        "Boulangerie Muller",
        &[("shop", "bakery")],
    )]);

    let report = run_sync(&mut store, &source, "full").expect("sync succeeds");
    assert_eq!(report.added, 1);

    let page = store
        .list_businesses(&BusinessFilter::default())
        .expect("list businesses");
    assert_eq!(page.items[0].category_id, None);
    assert_eq!(page.items[0].category_slug, None);
}

#[rstest]
fn fetch_failure_marks_the_audit_row_failed(mut store: DirectoryStore) {
    let source = StubSource::failing();

    let err = run_sync(&mut store, &source, "full").expect_err("sync fails");
    assert!(matches!(err, SyncError::Fetch(FetchError::Status { status: 504, .. })));

    let record = store
        .find_sync_log(1)
        .expect("load audit row")
        .expect("audit row exists");
    assert_eq!(record.status, SyncStatus::Failed);
    assert!(record.completed_at.is_some());
    let message = record.error_message.expect("failure message recorded");
    assert!(message.contains("504"), "unexpected message: {message}");
    assert_eq!(record.businesses_added, 0);
}

#[rstest]
fn localized_names_and_contact_fields_flow_through(mut store: DirectoryStore) {
    let source = StubSource::with_elements(vec![element(
        1,
        "Musée Alsacien",
        &[
            ("tourism", "museum"),
            ("name:fr", "Musée Alsacien"),
            ("name:de", "Elsässisches Museum"),
            ("addr:housenumber", "1"),
            ("addr:street", "Place Joseph Thierry"),
            ("addr:postcode", "67500"),
            ("addr:city", "Haguenau"),
            ("contact:phone", "+33 3 88 90 29 39"),
            ("website", "https://musees.haguenau.fr"),
            ("opening_hours", "Mo-Fr 09:00-17:00"),
        ],
    )]);

    run_sync(&mut store, &source, "full").expect("sync succeeds");

    let page = store
        .list_businesses(&BusinessFilter::default())
        .expect("list businesses");
    let museum = &page.items[0];
    assert_eq!(museum.name_de.as_deref(), Some("Elsässisches Museum"));
    assert_eq!(museum.category_slug.as_deref(), Some("tourism"));
    assert_eq!(museum.address.as_deref(), Some("1 Place Joseph Thierry"));
    assert_eq!(museum.postal_code.as_deref(), Some("67500"));
    assert_eq!(museum.phone.as_deref(), Some("+33 3 88 90 29 39"));
    assert_eq!(museum.website.as_deref(), Some("https://musees.haguenau.fr"));
    assert_eq!(museum.opening_hours.as_deref(), Some("Mo-Fr 09:00-17:00"));
}
