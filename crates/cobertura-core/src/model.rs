//! Value types shared by the coverage engine.
//!
//! Coordinates are compared at micro-degree precision (6 decimal places,
//! roughly 0.11 m) so jitter from map-drawing tools does not produce
//! "different" points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Polygon;
use crate::streets::{StreetRange, StreetRangeDraft};

/// Number of decimal places kept when a coordinate is stored.
pub const COORDINATE_DECIMALS: i32 = 6;

const COORDINATE_SCALE: f64 = 1_000_000.0;

/// Round a degree value to the canonical storage precision.
#[must_use]
pub fn round_degrees(value: f64) -> f64 {
    (value * COORDINATE_SCALE).round() / COORDINATE_SCALE
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("coordinate ({latitude}, {longitude}) is outside [-90, 90] x [-180, 180]")]
pub struct CoordinateOutOfRange {
    pub latitude: f64,
    pub longitude: f64,
}

/// A WGS84 point. `latitude` is the y axis, `longitude` the x axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinateOutOfRange`] when either axis is outside its range.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordinateOutOfRange> {
        let point = Self::new(latitude, longitude);
        if point.is_in_range() {
            Ok(point)
        } else {
            Err(CoordinateOutOfRange {
                latitude,
                longitude,
            })
        }
    }

    #[must_use]
    pub fn is_in_range(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// This coordinate rounded to [`COORDINATE_DECIMALS`] places.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self::new(round_degrees(self.latitude), round_degrees(self.longitude))
    }

    /// Position equality at micro-degree precision.
    #[must_use]
    pub fn same_position(&self, other: &Self) -> bool {
        self.micro_degrees() == other.micro_degrees()
    }

    // Both axes are range-checked before this is used for dedup, so the
    // scaled values sit far inside i64.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn micro_degrees(&self) -> (i64, i64) {
        (
            (self.latitude * COORDINATE_SCALE).round() as i64,
            (self.longitude * COORDINATE_SCALE).round() as i64,
        )
    }
}

/// A store branch as published by the branch directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub location: Coordinate,
}

/// Case-insensitive comparison key for zone names.
#[must_use]
pub fn zone_name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A named delivery area of one branch, already validated and normalized.
///
/// Values of this type only come out of
/// [`ZoneMutationGuard::validate`](crate::guard::ZoneMutationGuard::validate)
/// or out of a repository that stores such values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageZone {
    /// Unset until the zone store persists the zone.
    pub id: Option<i64>,
    pub branch_id: i64,
    pub name: String,
    pub polygon: Polygon,
    pub active: bool,
    #[serde(default)]
    pub street_ranges: Vec<StreetRange>,
    pub created_at: DateTime<Utc>,
}

impl CoverageZone {
    #[must_use]
    pub fn zone_ref(&self) -> ZoneRef {
        ZoneRef {
            id: self.id,
            name: self.name.clone(),
            branch_id: self.branch_id,
        }
    }

    #[must_use]
    pub fn name_key(&self) -> String {
        zone_name_key(&self.name)
    }
}

fn default_active() -> bool {
    true
}

/// An unvalidated zone definition as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDraft {
    /// Set when the draft replaces an existing zone.
    #[serde(default)]
    pub id: Option<i64>,
    pub branch_id: Option<i64>,
    pub name: String,
    pub polygon: Vec<Coordinate>,
    #[serde(default)]
    pub street_ranges: Vec<StreetRangeDraft>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Identity of a matched zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneRef {
    pub id: Option<i64>,
    pub name: String,
    pub branch_id: i64,
}

/// A coverage lookup for one geocoded address.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageQuery {
    pub point: Coordinate,
    pub street_name: Option<String>,
    pub house_number: Option<u32>,
    /// `None` searches every branch.
    pub branch_scope: Option<i64>,
}

impl CoverageQuery {
    #[must_use]
    pub const fn at(point: Coordinate) -> Self {
        Self {
            point,
            street_name: None,
            house_number: None,
            branch_scope: None,
        }
    }

    #[must_use]
    pub fn on_street(mut self, street_name: impl Into<String>, house_number: u32) -> Self {
        self.street_name = Some(street_name.into());
        self.house_number = Some(house_number);
        self
    }

    #[must_use]
    pub const fn in_branch(mut self, branch_id: i64) -> Self {
        self.branch_scope = Some(branch_id);
        self
    }

    /// Street name and house number, when both were supplied and the name is
    /// not blank.
    #[must_use]
    pub fn street_address(&self) -> Option<(&str, u32)> {
        let name = self.street_name.as_deref().map(str::trim)?;
        if name.is_empty() {
            return None;
        }
        self.house_number.map(|number| (name, number))
    }
}

/// One zone confirmed to cover a queried point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageMatch {
    pub zone: ZoneRef,
    /// `true` only when the zone's street ranges were evaluated and passed.
    pub matched_by_street_range: bool,
}
