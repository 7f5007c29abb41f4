//! Facade crate for the annuaire local business directory.
//!
//! Re-exports the core domain types: business and category models, the tag
//! classifier, the opening-hours normalizer, and the distance utility. The
//! persistence layer, the Overpass adapter, and the HTTP surface live in the
//! `annuaire-data` and `annuaire-server` workspace crates.

#![forbid(unsafe_code)]

pub use annuaire_core::{
    Business, BusinessSource, Category, CategorySeed, Classification, EARTH_RADIUS_METERS,
    FetchError, MainCategory, NewBusiness, OpeningHours, SEED_CATEGORIES, SourceElement,
    SourceKind, SourceRef, SyncRecord, SyncStatus, Tags, WeekSchedule, classify, extract_address,
    extract_contact, haversine_distance, parse_opening_hours,
};
