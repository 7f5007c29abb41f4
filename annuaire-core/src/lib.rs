//! Core domain types for the annuaire business directory.
//!
//! The crate holds everything that can be expressed without I/O: the
//! business and category models, the ordered tag-classification rules, the
//! opening-hours normalizer, the great-circle distance helper, and the
//! [`BusinessSource`] trait implemented by the Overpass adapter in
//! `annuaire-data`.
//!
//! Coordinates are WGS84 throughout, carried as [`geo::Coord`] with
//! `x = longitude` and `y = latitude`.

#![forbid(unsafe_code)]

pub mod business;
pub mod category;
pub mod classify;
pub mod distance;
pub mod extract;
pub mod hours;
pub mod source;
pub mod sync;

pub use business::{Business, NewBusiness, SourceKind, SourceRef, Tags, UnknownSourceKind};
pub use category::{Category, CategorySeed, MainCategory, SEED_CATEGORIES};
pub use classify::{Classification, classify};
pub use distance::{EARTH_RADIUS_METERS, haversine_distance};
pub use extract::{Address, Contact, extract_address, extract_contact};
pub use hours::{OpeningHours, WeekSchedule, parse_opening_hours};
pub use source::{BusinessSource, FetchError, SourceElement};
pub use sync::{SyncRecord, SyncStatus, UnknownSyncStatus};
