//! Ordered tag-classification rules.
//!
//! Classification walks [`RULES`] in order and stops at the first rule that
//! matches, so an element tagged both `shop` and `amenity` is always a shop.
//! The ordering mirrors the seeded taxonomy and must not be rearranged
//! without re-seeding; downstream category resolution keys on the resulting
//! slugs.

use crate::Tags;
use crate::category::MainCategory;

/// Result of classifying one element's tag map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Top-level taxonomy bucket.
    pub main: MainCategory,
    /// Free-text refinement, usually the matched tag's value.
    pub subcategory: Option<String>,
}

impl Classification {
    fn new(main: MainCategory, subcategory: Option<&str>) -> Self {
        Self {
            main,
            subcategory: subcategory.map(str::to_owned),
        }
    }
}

/// One entry in the precedence-ordered rule table.
pub struct Rule {
    /// Short name for diagnostics and tests.
    pub name: &'static str,
    /// Returns a classification when the rule applies to the tag map.
    pub apply: fn(&Tags) -> Option<Classification>,
}

/// The classification rules, highest precedence first.
pub const RULES: &[Rule] = &[
    Rule {
        name: "shop",
        apply: shop_rule,
    },
    Rule {
        name: "amenity",
        apply: amenity_rule,
    },
    Rule {
        name: "tourism",
        apply: tourism_rule,
    },
    Rule {
        name: "office",
        apply: office_rule,
    },
    Rule {
        name: "craft",
        apply: craft_rule,
    },
    Rule {
        name: "leisure-or-sport",
        apply: leisure_sport_rule,
    },
];

/// Classify a tag map into a taxonomy bucket.
///
/// Walks [`RULES`] in order; the first matching rule wins. Tag maps matching
/// no rule fall back to [`MainCategory::Other`] with no subcategory.
///
/// # Examples
/// ```
/// use annuaire_core::category::MainCategory;
/// use annuaire_core::{Tags, classify};
///
/// let tags = Tags::from([
///     ("shop".into(), "bakery".into()),
///     ("amenity".into(), "cafe".into()),
/// ]);
/// let class = classify(&tags);
/// assert_eq!(class.main, MainCategory::Shops);
/// assert_eq!(class.subcategory.as_deref(), Some("bakery"));
/// ```
#[must_use]
pub fn classify(tags: &Tags) -> Classification {
    RULES
        .iter()
        .find_map(|rule| (rule.apply)(tags))
        .unwrap_or_else(|| Classification::new(MainCategory::Other, None))
}

const FOOD_SERVICE: &[&str] = &["restaurant", "fast_food", "food_court"];
const DRINK_SOCIAL: &[&str] = &["cafe", "bar", "pub", "biergarten"];
const MEDICAL: &[&str] = &["pharmacy", "doctors", "dentist", "hospital", "clinic"];
const EDUCATIONAL: &[&str] = &["school", "kindergarten", "college", "university", "library"];

/// Amenity value groups checked in order before the `services` fallback.
const AMENITY_GROUPS: &[(&[&str], MainCategory)] = &[
    (FOOD_SERVICE, MainCategory::Restaurants),
    (DRINK_SOCIAL, MainCategory::Cafes),
    (MEDICAL, MainCategory::Health),
    (EDUCATIONAL, MainCategory::Education),
];

fn shop_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("shop")?;
    Some(Classification::new(MainCategory::Shops, Some(value.as_str())))
}

fn amenity_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("amenity")?;
    let main = AMENITY_GROUPS
        .iter()
        .find(|(group, _)| group.contains(&value.as_str()))
        .map_or(MainCategory::Services, |(_, main)| *main);
    Some(Classification::new(main, Some(value.as_str())))
}

fn tourism_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("tourism")?;
    Some(Classification::new(
        MainCategory::Tourism,
        Some(value.as_str()),
    ))
}

fn office_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("office")?;
    Some(Classification {
        main: MainCategory::Services,
        subcategory: Some(format!("office_{value}")),
    })
}

fn craft_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("craft")?;
    Some(Classification {
        main: MainCategory::Services,
        subcategory: Some(format!("craft_{value}")),
    })
}

fn leisure_sport_rule(tags: &Tags) -> Option<Classification> {
    let value = tags.get("leisure").or_else(|| tags.get("sport"))?;
    Some(Classification::new(
        MainCategory::Sports,
        Some(value.as_str()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn tags(pairs: &[(&str, &str)]) -> Tags {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[rstest]
    fn shop_beats_amenity() {
        let class = classify(&tags(&[("shop", "bakery"), ("amenity", "cafe")]));
        assert_eq!(class.main, MainCategory::Shops);
        assert_eq!(class.subcategory.as_deref(), Some("bakery"));
    }

    #[rstest]
    #[case("restaurant", MainCategory::Restaurants)]
    #[case("fast_food", MainCategory::Restaurants)]
    #[case("food_court", MainCategory::Restaurants)]
    #[case("cafe", MainCategory::Cafes)]
    #[case("bar", MainCategory::Cafes)]
    #[case("pub", MainCategory::Cafes)]
    #[case("biergarten", MainCategory::Cafes)]
    #[case("pharmacy", MainCategory::Health)]
    #[case("hospital", MainCategory::Health)]
    #[case("school", MainCategory::Education)]
    #[case("library", MainCategory::Education)]
    #[case("bank", MainCategory::Services)]
    #[case("townhall", MainCategory::Services)]
    fn amenity_sub_dispatch(#[case] value: &str, #[case] expected: MainCategory) {
        let class = classify(&tags(&[("amenity", value)]));
        assert_eq!(class.main, expected);
        assert_eq!(class.subcategory.as_deref(), Some(value));
    }

    #[rstest]
    fn tourism_matches_before_office() {
        let class = classify(&tags(&[("tourism", "museum"), ("office", "ngo")]));
        assert_eq!(class.main, MainCategory::Tourism);
        assert_eq!(class.subcategory.as_deref(), Some("museum"));
    }

    #[rstest]
    fn office_value_is_prefixed() {
        let class = classify(&tags(&[("office", "lawyer")]));
        assert_eq!(class.main, MainCategory::Services);
        assert_eq!(class.subcategory.as_deref(), Some("office_lawyer"));
    }

    #[rstest]
    fn craft_value_is_prefixed() {
        let class = classify(&tags(&[("craft", "carpenter")]));
        assert_eq!(class.main, MainCategory::Services);
        assert_eq!(class.subcategory.as_deref(), Some("craft_carpenter"));
    }

    #[rstest]
    fn leisure_wins_over_sport_value() {
        let class = classify(&tags(&[("leisure", "fitness_centre"), ("sport", "climbing")]));
        assert_eq!(class.main, MainCategory::Sports);
        assert_eq!(class.subcategory.as_deref(), Some("fitness_centre"));
    }

    #[rstest]
    fn sport_alone_classifies_as_sports() {
        let class = classify(&tags(&[("sport", "tennis")]));
        assert_eq!(class.main, MainCategory::Sports);
        assert_eq!(class.subcategory.as_deref(), Some("tennis"));
    }

    #[rstest]
    fn unmatched_tags_default_to_other() {
        let class = classify(&tags(&[("name", "Mairie"), ("building", "yes")]));
        assert_eq!(class.main, MainCategory::Other);
        assert_eq!(class.subcategory, None);
    }

    #[rstest]
    fn rule_table_order_matches_documented_precedence() {
        let names: Vec<_> = RULES.iter().map(|rule| rule.name).collect();
        assert_eq!(
            names,
            [
                "shop",
                "amenity",
                "tourism",
                "office",
                "craft",
                "leisure-or-sport"
            ]
        );
    }
}
