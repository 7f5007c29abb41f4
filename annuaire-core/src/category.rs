//! The fixed category taxonomy shown in directory filters.
//!
//! [`MainCategory`] is the closed set of top-level buckets the classifier can
//! produce. [`SEED_CATEGORIES`] carries the presentational metadata for each
//! bucket; the `seed` command writes it into the store once and the taxonomy
//! is read-only afterwards.

use std::fmt;

/// Closed set of top-level classification buckets.
///
/// Slugs are stable identifiers shared between the classifier and the seeded
/// taxonomy rows; renaming one without the other breaks category resolution
/// during sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainCategory {
    Restaurants,
    Cafes,
    Shops,
    Services,
    Health,
    Education,
    Tourism,
    Sports,
    Other,
}

impl MainCategory {
    /// Stable slug used in storage, URLs, and the seeded taxonomy.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Restaurants => "restaurants",
            Self::Cafes => "cafes",
            Self::Shops => "shops",
            Self::Services => "services",
            Self::Health => "health",
            Self::Education => "education",
            Self::Tourism => "tourism",
            Self::Sports => "sports",
            Self::Other => "other",
        }
    }

    /// All buckets in taxonomy order.
    pub const ALL: [Self; 9] = [
        Self::Restaurants,
        Self::Cafes,
        Self::Shops,
        Self::Services,
        Self::Health,
        Self::Education,
        Self::Tourism,
        Self::Sports,
        Self::Other,
    ];
}

impl fmt::Display for MainCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A taxonomy row as read back from the persistence layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// Local row id.
    pub id: i64,
    /// Unique stable identifier.
    pub slug: String,
    /// French display name (the directory's default locale).
    pub name_fr: String,
    pub name_en: String,
    pub name_de: String,
    /// Icon hint for the presentation layer.
    pub icon: String,
    /// Colour hint for the presentation layer.
    pub color: String,
    /// Source tag families that roll into this bucket, as seeded.
    pub osm_tags: Vec<(String, Vec<String>)>,
    pub display_order: i64,
    pub active: bool,
}

/// Seed data for one taxonomy row.
#[derive(Debug, Clone, Copy)]
pub struct CategorySeed {
    pub main: MainCategory,
    pub name_fr: &'static str,
    pub name_en: &'static str,
    pub name_de: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    /// Source tag families that roll into this bucket; `*` means any value.
    pub osm_tags: &'static [(&'static str, &'static [&'static str])],
    pub display_order: i64,
}

/// The seeded taxonomy, in display order.
pub const SEED_CATEGORIES: &[CategorySeed] = &[
    CategorySeed {
        main: MainCategory::Restaurants,
        name_fr: "Restaurants",
        name_en: "Restaurants",
        name_de: "Restaurants",
        icon: "utensils",
        color: "#FF6B6B",
        osm_tags: &[("amenity", &["restaurant", "fast_food", "food_court"])],
        display_order: 1,
    },
    CategorySeed {
        main: MainCategory::Cafes,
        name_fr: "Cafés & Bars",
        name_en: "Cafes & Bars",
        name_de: "Cafés & Bars",
        icon: "coffee",
        color: "#8B4513",
        osm_tags: &[("amenity", &["cafe", "bar", "pub", "biergarten"])],
        display_order: 2,
    },
    CategorySeed {
        main: MainCategory::Shops,
        name_fr: "Magasins",
        name_en: "Shops",
        name_de: "Geschäfte",
        icon: "shopping-bag",
        color: "#4ECDC4",
        osm_tags: &[("shop", &["*"])],
        display_order: 3,
    },
    CategorySeed {
        main: MainCategory::Services,
        name_fr: "Services",
        name_en: "Services",
        name_de: "Dienstleistungen",
        icon: "briefcase",
        color: "#95E1D3",
        osm_tags: &[("office", &["*"]), ("craft", &["*"])],
        display_order: 4,
    },
    CategorySeed {
        main: MainCategory::Health,
        name_fr: "Santé",
        name_en: "Health",
        name_de: "Gesundheit",
        icon: "heart-pulse",
        color: "#FF6B9D",
        osm_tags: &[(
            "amenity",
            &["pharmacy", "doctors", "dentist", "hospital", "clinic"],
        )],
        display_order: 5,
    },
    CategorySeed {
        main: MainCategory::Education,
        name_fr: "Éducation",
        name_en: "Education",
        name_de: "Bildung",
        icon: "graduation-cap",
        color: "#6C5CE7",
        osm_tags: &[(
            "amenity",
            &["school", "kindergarten", "college", "university", "library"],
        )],
        display_order: 6,
    },
    CategorySeed {
        main: MainCategory::Tourism,
        name_fr: "Tourisme",
        name_en: "Tourism",
        name_de: "Tourismus",
        icon: "map-pin",
        color: "#FD79A8",
        osm_tags: &[("tourism", &["*"])],
        display_order: 7,
    },
    CategorySeed {
        main: MainCategory::Sports,
        name_fr: "Sports & Loisirs",
        name_en: "Sports & Leisure",
        name_de: "Sport & Freizeit",
        icon: "dumbbell",
        color: "#00B894",
        osm_tags: &[("leisure", &["*"]), ("sport", &["*"])],
        display_order: 8,
    },
    CategorySeed {
        main: MainCategory::Other,
        name_fr: "Autres",
        name_en: "Other",
        name_de: "Andere",
        icon: "more-horizontal",
        color: "#95A5A6",
        osm_tags: &[],
        display_order: 99,
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seed_covers_every_main_category_exactly_once() {
        let seeded: HashSet<_> = SEED_CATEGORIES.iter().map(|seed| seed.main).collect();
        assert_eq!(seeded.len(), SEED_CATEGORIES.len(), "duplicate seed slug");
        for main in MainCategory::ALL {
            assert!(seeded.contains(&main), "missing seed for {main}");
        }
    }

    #[test]
    fn seed_display_order_is_ascending() {
        let orders: Vec<_> = SEED_CATEGORIES
            .iter()
            .map(|seed| seed.display_order)
            .collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        assert_eq!(orders, sorted);
    }
}
