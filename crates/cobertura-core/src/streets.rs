//! House-number ranges on named streets.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Comparison key for a street name: diacritics stripped, lower-cased,
/// inner whitespace collapsed to single spaces.
///
/// `"  San   Martín "` and `"SAN MARTIN"` both become `"san martin"`.
#[must_use]
pub fn normalize_street_name(name: &str) -> String {
    let folded: String = name
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreetRangeError {
    #[error("street name must be non-empty")]
    EmptyStreetName,
    #[error("height_from must be >= 0, got {0}")]
    NegativeHeight(i64),
    #[error("height_to ({to}) must be >= height_from ({from})")]
    Inverted { from: i64, to: i64 },
    #[error("house number {0} is too large")]
    HeightTooLarge(i64),
}

/// A street range as submitted, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreetRangeDraft {
    pub street_name: String,
    pub height_from: i64,
    pub height_to: i64,
}

/// Addresses on `street_name` numbered `height_from..=height_to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StreetRangeDraft", into = "StreetRangeDraft")]
pub struct StreetRange {
    street_name: String,
    street_key: String,
    height_from: u32,
    height_to: u32,
}

impl StreetRange {
    /// # Errors
    ///
    /// Returns [`StreetRangeError`] for a blank name or an inverted range.
    pub fn new(
        street_name: &str,
        height_from: u32,
        height_to: u32,
    ) -> Result<Self, StreetRangeError> {
        let street_key = normalize_street_name(street_name);
        if street_key.is_empty() {
            return Err(StreetRangeError::EmptyStreetName);
        }
        if height_to < height_from {
            return Err(StreetRangeError::Inverted {
                from: i64::from(height_from),
                to: i64::from(height_to),
            });
        }
        Ok(Self {
            street_name: street_name.trim().to_owned(),
            street_key,
            height_from,
            height_to,
        })
    }

    #[must_use]
    pub fn street_name(&self) -> &str {
        &self.street_name
    }

    #[must_use]
    pub fn street_key(&self) -> &str {
        &self.street_key
    }

    #[must_use]
    pub const fn height_from(&self) -> u32 {
        self.height_from
    }

    #[must_use]
    pub const fn height_to(&self) -> u32 {
        self.height_to
    }

    #[must_use]
    pub const fn contains(&self, house_number: u32) -> bool {
        house_number >= self.height_from && house_number <= self.height_to
    }
}

impl TryFrom<StreetRangeDraft> for StreetRange {
    type Error = StreetRangeError;

    fn try_from(draft: StreetRangeDraft) -> Result<Self, Self::Error> {
        if draft.height_from < 0 {
            return Err(StreetRangeError::NegativeHeight(draft.height_from));
        }
        if draft.height_to < draft.height_from {
            return Err(StreetRangeError::Inverted {
                from: draft.height_from,
                to: draft.height_to,
            });
        }
        let height_from = u32::try_from(draft.height_from)
            .map_err(|_| StreetRangeError::HeightTooLarge(draft.height_from))?;
        let height_to = u32::try_from(draft.height_to)
            .map_err(|_| StreetRangeError::HeightTooLarge(draft.height_to))?;
        Self::new(&draft.street_name, height_from, height_to)
    }
}

impl From<StreetRange> for StreetRangeDraft {
    fn from(range: StreetRange) -> Self {
        Self {
            street_name: range.street_name,
            height_from: i64::from(range.height_from),
            height_to: i64::from(range.height_to),
        }
    }
}

/// Whether an address falls inside any of `ranges`.
///
/// An empty range list means the zone has no street refinement, so every
/// address matches. Several ranges for the same street act as a union.
#[must_use]
pub fn matches(ranges: &[StreetRange], street_name: &str, house_number: u32) -> bool {
    if ranges.is_empty() {
        return true;
    }
    let key = normalize_street_name(street_name);
    ranges
        .iter()
        .any(|range| range.street_key == key && range.contains(house_number))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(name: &str, from: u32, to: u32) -> StreetRange {
        StreetRange::new(name, from, to).unwrap()
    }

    #[test]
    fn normalize_strips_accents_case_and_spacing() {
        assert_eq!(normalize_street_name("  San   Martín "), "san martin");
        assert_eq!(normalize_street_name("AV. CÓRDOBA"), "av. cordoba");
        assert_eq!(normalize_street_name("Güemes"), "guemes");
    }

    #[test]
    fn normalize_handles_precomposed_and_decomposed_forms() {
        let precomposed = "Mart\u{ed}n";
        let decomposed = "Marti\u{301}n";
        assert_eq!(
            normalize_street_name(precomposed),
            normalize_street_name(decomposed)
        );
    }

    #[test]
    fn empty_ranges_match_everything() {
        assert!(matches(&[], "Anything", 99_999));
    }

    #[test]
    fn matches_inclusive_bounds() {
        let ranges = vec![range("SAN MARTIN", 200, 800)];
        assert!(matches(&ranges, "San Martín", 200));
        assert!(matches(&ranges, "san martin", 800));
        assert!(matches(&ranges, "SAN MARTIN", 500));
        assert!(!matches(&ranges, "SAN MARTIN", 900));
        assert!(!matches(&ranges, "SAN MARTIN", 199));
    }

    #[test]
    fn other_street_does_not_match() {
        let ranges = vec![range("SAN MARTIN", 200, 800)];
        assert!(!matches(&ranges, "Belgrano", 500));
    }

    #[test]
    fn disjoint_ranges_on_same_street_are_a_union() {
        let ranges = vec![range("Alsina", 0, 100), range("Alsina", 500, 600)];
        assert!(matches(&ranges, "alsina", 50));
        assert!(matches(&ranges, "alsina", 550));
        assert!(!matches(&ranges, "alsina", 300));
    }

    #[test]
    fn draft_rejects_negative_height() {
        let draft = StreetRangeDraft {
            street_name: "Mitre".to_string(),
            height_from: -1,
            height_to: 10,
        };
        assert_eq!(
            StreetRange::try_from(draft),
            Err(StreetRangeError::NegativeHeight(-1))
        );
    }

    #[test]
    fn draft_rejects_inverted_range() {
        let draft = StreetRangeDraft {
            street_name: "Mitre".to_string(),
            height_from: 900,
            height_to: 100,
        };
        assert_eq!(
            StreetRange::try_from(draft),
            Err(StreetRangeError::Inverted { from: 900, to: 100 })
        );
    }

    #[test]
    fn draft_rejects_blank_street_name() {
        let draft = StreetRangeDraft {
            street_name: "  ".to_string(),
            height_from: 0,
            height_to: 100,
        };
        assert_eq!(
            StreetRange::try_from(draft),
            Err(StreetRangeError::EmptyStreetName)
        );
    }

    #[test]
    fn single_house_range_is_valid() {
        let r = range("Zelarrayán", 42, 42);
        assert!(r.contains(42));
        assert_eq!(r.street_key(), "zelarrayan");
    }

    #[test]
    fn serializes_without_internal_key() {
        let json = serde_json::to_value(range("Av. Alem", 1, 99)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"street_name": "Av. Alem", "height_from": 1, "height_to": 99})
        );
    }
}
