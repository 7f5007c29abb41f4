//! Address and contact extraction from source tag maps.
//!
//! The external database spreads postal and contact details across several
//! tag spellings (`phone` vs `contact:phone`); these helpers collapse them
//! into the fields the directory stores.

use crate::Tags;

/// Postal address fields extracted from a tag map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Address {
    /// House number and street, when a street is tagged.
    pub address: Option<String>,
    pub postal_code: Option<String>,
    pub city: Option<String>,
}

/// Contact fields extracted from a tag map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Contact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

/// Extract postal address fields.
///
/// The street line combines `addr:housenumber` and `addr:street`; a house
/// number without a street is dropped.
///
/// # Examples
/// ```
/// use annuaire_core::{Tags, extract_address};
///
/// let tags = Tags::from([
///     ("addr:housenumber".into(), "12".into()),
///     ("addr:street".into(), "Grand Rue".into()),
///     ("addr:city".into(), "Haguenau".into()),
/// ]);
/// let address = extract_address(&tags);
/// assert_eq!(address.address.as_deref(), Some("12 Grand Rue"));
/// assert_eq!(address.city.as_deref(), Some("Haguenau"));
/// ```
#[must_use]
pub fn extract_address(tags: &Tags) -> Address {
    let address = tags.get("addr:street").map(|street| {
        match tags.get("addr:housenumber") {
            Some(number) => format!("{number} {street}"),
            None => street.clone(),
        }
    });

    Address {
        address,
        postal_code: tags.get("addr:postcode").cloned(),
        city: tags.get("addr:city").cloned(),
    }
}

/// Extract contact fields, preferring the bare tag over its `contact:`
/// namespaced variant.
#[must_use]
pub fn extract_contact(tags: &Tags) -> Contact {
    let pick = |plain: &str, namespaced: &str| {
        tags.get(plain).or_else(|| tags.get(namespaced)).cloned()
    };

    Contact {
        phone: pick("phone", "contact:phone"),
        email: pick("email", "contact:email"),
        website: pick("website", "contact:website"),
    }
}
