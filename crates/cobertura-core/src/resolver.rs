//! Coverage resolution: which zones cover a geocoded address.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::RepositoryUnavailable;
use crate::geometry::contains_point;
use crate::model::{CoverageMatch, CoverageQuery, CoverageZone};
use crate::repository::ZoneRepository;
use crate::streets;

/// What to do with a zone that declares street ranges when the query has no
/// street name or house number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreetRangePolicy {
    /// Keep the zone on its polygon match alone.
    #[default]
    Permissive,
    /// Drop the zone.
    Strict,
}

impl std::fmt::Display for StreetRangePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreetRangePolicy::Permissive => write!(f, "permissive"),
            StreetRangePolicy::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for StreetRangePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown street range policy '{other}'; expected permissive or strict"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoverageResolver<R> {
    repository: R,
    policy: StreetRangePolicy,
}

impl<R: ZoneRepository> CoverageResolver<R> {
    #[must_use]
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            policy: StreetRangePolicy::default(),
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: StreetRangePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> StreetRangePolicy {
        self.policy
    }

    #[must_use]
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Every active zone covering `query`, in repository order.
    ///
    /// An empty result means the address is outside coverage.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryUnavailable`] when candidate zones cannot be
    /// fetched. No partial result is produced in that case.
    pub async fn resolve(
        &self,
        query: &CoverageQuery,
    ) -> Result<Vec<CoverageMatch>, RepositoryUnavailable> {
        let candidates = self
            .repository
            .list_zones(query.branch_scope)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    branch_scope = ?query.branch_scope,
                    error = %e,
                    "coverage lookup failed: zone repository unavailable"
                );
            })?;

        let matches = resolve_against(&candidates, query, self.policy);
        tracing::debug!(
            latitude = query.point.latitude,
            longitude = query.point.longitude,
            branch_scope = ?query.branch_scope,
            candidates = candidates.len(),
            matches = matches.len(),
            "coverage resolved"
        );
        Ok(matches)
    }
}

/// Resolve `query` against an already fetched list of candidate zones.
///
/// Inactive zones and zones outside the branch scope are skipped. A zone
/// appearing more than once (same branch and id, or same branch and name when
/// unsaved) is reported only at its first position.
#[must_use]
pub fn resolve_against(
    candidates: &[CoverageZone],
    query: &CoverageQuery,
    policy: StreetRangePolicy,
) -> Vec<CoverageMatch> {
    let address = query.street_address();
    let mut seen = HashSet::new();
    let mut matches = Vec::new();

    for zone in candidates {
        if !zone.active || query.branch_scope.is_some_and(|id| id != zone.branch_id) {
            continue;
        }
        if !contains_point(&zone.polygon, query.point) {
            continue;
        }

        let matched_by_street_range = if zone.street_ranges.is_empty() {
            false
        } else if let Some((street_name, house_number)) = address {
            if !streets::matches(&zone.street_ranges, street_name, house_number) {
                continue;
            }
            true
        } else if policy == StreetRangePolicy::Strict {
            continue;
        } else {
            false
        };

        if !seen.insert(identity(zone)) {
            continue;
        }
        matches.push(CoverageMatch {
            zone: zone.zone_ref(),
            matched_by_street_range,
        });
    }

    matches
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum ZoneIdentity {
    Stored(i64, i64),
    Unsaved(i64, String),
}

fn identity(zone: &CoverageZone) -> ZoneIdentity {
    match zone.id {
        Some(id) => ZoneIdentity::Stored(zone.branch_id, id),
        None => ZoneIdentity::Unsaved(zone.branch_id, zone.name_key()),
    }
}

#[cfg(test)]
#[path = "resolver_test.rs"]
mod tests;
