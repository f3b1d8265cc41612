//! Validation and normalization of zone definitions before they are stored.

use chrono::Utc;
use thiserror::Error;

use crate::error::RepositoryUnavailable;
use crate::geometry::{self, InvalidPolygon};
use crate::model::{zone_name_key, CoverageZone, ZoneDraft};
use crate::repository::ZoneRepository;
use crate::streets::{StreetRange, StreetRangeError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardLimits {
    /// Most vertices a submitted polygon may carry, before normalization.
    pub max_polygon_points: usize,
    /// Most active zones a branch may own.
    pub max_zones_per_branch: usize,
}

impl Default for GuardLimits {
    fn default() -> Self {
        Self {
            max_polygon_points: 100,
            max_zones_per_branch: 10,
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("branch id is required")]
    MissingBranchId,

    #[error("zone name must be non-empty")]
    EmptyName,

    #[error("branch {branch_id} has no zone with id {id}")]
    UnknownZone { branch_id: i64, id: i64 },

    #[error("branch {branch_id} already has an active zone named '{name}'")]
    DuplicateZoneName { branch_id: i64, name: String },

    #[error(transparent)]
    InvalidPolygon(#[from] InvalidPolygon),

    #[error("polygon has {count} points; at most {max} are allowed")]
    TooManyPoints { count: usize, max: usize },

    #[error("street range {index} ('{street_name}') is invalid: {source}")]
    InvalidStreetRange {
        index: usize,
        street_name: String,
        #[source]
        source: StreetRangeError,
    },

    #[error("branch {branch_id} already has the maximum of {max} active zones")]
    ZoneLimitReached { branch_id: i64, max: usize },

    #[error(transparent)]
    Repository(#[from] RepositoryUnavailable),
}

/// Turns a [`ZoneDraft`] into a [`CoverageZone`] ready for persistence.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneMutationGuard {
    limits: GuardLimits,
}

impl ZoneMutationGuard {
    #[must_use]
    pub const fn new(limits: GuardLimits) -> Self {
        Self { limits }
    }

    #[must_use]
    pub const fn limits(&self) -> GuardLimits {
        self.limits
    }

    /// Validate `draft` against the zones already stored for its branch.
    ///
    /// Rules run in order and the first failure aborts: branch present,
    /// name present, a draft id names a stored zone of the same branch, name
    /// unique among the branch's other active zones, polygon well formed,
    /// street ranges well formed, branch zone limit.
    ///
    /// `existing` should hold every stored zone of the draft's branch,
    /// inactive ones included. Zones of other branches are ignored.
    ///
    /// An update keeps the stored zone's `created_at`. Activating a zone,
    /// whether new or previously inactive, counts against the branch limit.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] of the first rule that fails.
    pub fn validate(
        &self,
        draft: &ZoneDraft,
        existing: &[CoverageZone],
    ) -> Result<CoverageZone, ValidationError> {
        let branch_id = draft.branch_id.ok_or(ValidationError::MissingBranchId)?;

        let name = draft.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        let stored = match draft.id {
            Some(id) => Some(
                existing
                    .iter()
                    .find(|z| z.id == Some(id) && z.branch_id == branch_id)
                    .ok_or(ValidationError::UnknownZone { branch_id, id })?,
            ),
            None => None,
        };

        let key = zone_name_key(name);
        let siblings: Vec<&CoverageZone> = existing
            .iter()
            .filter(|z| z.branch_id == branch_id && z.active)
            .filter(|z| draft.id.is_none() || z.id != draft.id)
            .collect();
        if siblings.iter().any(|z| z.name_key() == key) {
            return Err(ValidationError::DuplicateZoneName {
                branch_id,
                name: name.to_owned(),
            });
        }

        if draft.polygon.len() > self.limits.max_polygon_points {
            return Err(ValidationError::TooManyPoints {
                count: draft.polygon.len(),
                max: self.limits.max_polygon_points,
            });
        }
        let polygon = geometry::normalize(&draft.polygon)?;
        if !geometry::is_simple(&polygon) {
            return Err(InvalidPolygon::new("polygon edges cross each other").into());
        }

        let street_ranges = draft
            .street_ranges
            .iter()
            .enumerate()
            .map(|(index, range)| {
                StreetRange::try_from(range.clone()).map_err(|source| {
                    ValidationError::InvalidStreetRange {
                        index,
                        street_name: range.street_name.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if draft.active
            && stored.is_none_or(|z| !z.active)
            && siblings.len() >= self.limits.max_zones_per_branch
        {
            return Err(ValidationError::ZoneLimitReached {
                branch_id,
                max: self.limits.max_zones_per_branch,
            });
        }

        let created_at = stored
            .map(|z| z.created_at)
            .or(draft.created_at)
            .unwrap_or_else(Utc::now);

        tracing::debug!(
            branch_id,
            zone = name,
            points = polygon.len(),
            street_ranges = street_ranges.len(),
            "zone draft validated"
        );

        Ok(CoverageZone {
            id: draft.id,
            branch_id,
            name: name.to_owned(),
            polygon,
            active: draft.active,
            street_ranges,
            created_at,
        })
    }

    /// Fetch the draft's branch from `repository`, inactive zones included,
    /// then [`validate`](Self::validate).
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Repository`] when the branch's zones cannot be
    /// read, otherwise whatever [`validate`](Self::validate) returns.
    pub async fn validate_against<R: ZoneRepository>(
        &self,
        draft: &ZoneDraft,
        repository: &R,
    ) -> Result<CoverageZone, ValidationError> {
        let branch_id = draft.branch_id.ok_or(ValidationError::MissingBranchId)?;
        let existing = repository.branch_zones(branch_id).await?;
        self.validate(draft, &existing)
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
