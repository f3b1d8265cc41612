//! Read and write seams to wherever zones and branches live.
//!
//! The resolver and guard only need [`ZoneRepository`]. Write paths use
//! [`ZoneStore`], and the branch listing comes from [`BranchDirectory`].
//! [`InMemoryZoneRepository`] implements all three and backs the YAML catalog
//! and the test suites.

use std::future::{ready, Future};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::RepositoryUnavailable;
use crate::model::{zone_name_key, Branch, CoverageZone};

pub trait ZoneRepository: Send + Sync {
    /// Zones of one branch, or of every branch when `branch_id` is `None`.
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send;

    /// Every zone of one branch, inactive ones included.
    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send;
}

pub trait ZoneStore: Send + Sync {
    /// Insert a zone, or replace the stored one with the same id.
    ///
    /// Returns the zone as stored, with its id assigned.
    fn save_zone(
        &self,
        zone: CoverageZone,
    ) -> impl Future<Output = Result<CoverageZone, RepositoryUnavailable>> + Send;

    /// Remove one zone by branch and case-insensitive name. An active zone is
    /// removed before an inactive namesake. `Ok(false)` means nothing matched.
    fn delete_zone(
        &self,
        branch_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<bool, RepositoryUnavailable>> + Send;
}

pub trait BranchDirectory: Send + Sync {
    fn list_branches(
        &self,
    ) -> impl Future<Output = Result<Vec<Branch>, RepositoryUnavailable>> + Send;
}

impl<T: ZoneRepository> ZoneRepository for &T {
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        (**self).list_zones(branch_id)
    }

    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        (**self).branch_zones(branch_id)
    }
}

impl<T: ZoneRepository> ZoneRepository for Arc<T> {
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        (**self).list_zones(branch_id)
    }

    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        (**self).branch_zones(branch_id)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    branches: Vec<Branch>,
    zones: Vec<CoverageZone>,
    next_id: i64,
}

/// Process-local zone catalog.
#[derive(Debug, Default)]
pub struct InMemoryZoneRepository {
    state: RwLock<CatalogState>,
}

impl InMemoryZoneRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_branches(branches: Vec<Branch>) -> Self {
        Self {
            state: RwLock::new(CatalogState {
                branches,
                zones: Vec::new(),
                next_id: 0,
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, CatalogState>, RepositoryUnavailable> {
        self.state
            .read()
            .map_err(|_| RepositoryUnavailable::new("zone catalog lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, CatalogState>, RepositoryUnavailable> {
        self.state
            .write()
            .map_err(|_| RepositoryUnavailable::new("zone catalog lock poisoned"))
    }

    /// Store `zone`, assigning the next free id when it has none.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryUnavailable`] if the catalog lock is poisoned.
    pub fn insert(&self, mut zone: CoverageZone) -> Result<CoverageZone, RepositoryUnavailable> {
        let mut state = self.write()?;
        match zone.id {
            Some(id) => {
                state.next_id = state.next_id.max(id);
                if let Some(slot) = state.zones.iter_mut().find(|z| z.id == Some(id)) {
                    *slot = zone.clone();
                    return Ok(zone);
                }
            }
            None => {
                state.next_id += 1;
                zone.id = Some(state.next_id);
            }
        }
        state.zones.push(zone.clone());
        Ok(zone)
    }

    /// Remove a single zone named `name`, preferring the active one.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryUnavailable`] if the catalog lock is poisoned.
    pub fn remove(&self, branch_id: i64, name: &str) -> Result<bool, RepositoryUnavailable> {
        let key = zone_name_key(name);
        let mut state = self.write()?;
        let named = |z: &CoverageZone| z.branch_id == branch_id && z.name_key() == key;
        let position = state
            .zones
            .iter()
            .position(|z| named(z) && z.active)
            .or_else(|| state.zones.iter().position(named));
        match position {
            Some(index) => {
                state.zones.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Every stored zone in insertion order, inactive ones included.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryUnavailable`] if the catalog lock is poisoned.
    pub fn snapshot(
        &self,
        branch_id: Option<i64>,
    ) -> Result<Vec<CoverageZone>, RepositoryUnavailable> {
        let state = self.read()?;
        Ok(state
            .zones
            .iter()
            .filter(|z| branch_id.is_none_or(|id| z.branch_id == id))
            .cloned()
            .collect())
    }

    /// # Errors
    ///
    /// Returns [`RepositoryUnavailable`] if the catalog lock is poisoned.
    pub fn branches(&self) -> Result<Vec<Branch>, RepositoryUnavailable> {
        Ok(self.read()?.branches.clone())
    }
}

impl ZoneRepository for InMemoryZoneRepository {
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        ready(
            self.snapshot(branch_id)
                .map(|zones| zones.into_iter().filter(|z| z.active).collect()),
        )
    }

    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        ready(self.snapshot(Some(branch_id)))
    }
}

impl ZoneStore for InMemoryZoneRepository {
    fn save_zone(
        &self,
        zone: CoverageZone,
    ) -> impl Future<Output = Result<CoverageZone, RepositoryUnavailable>> + Send {
        ready(self.insert(zone))
    }

    fn delete_zone(
        &self,
        branch_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<bool, RepositoryUnavailable>> + Send {
        ready(self.remove(branch_id, name))
    }
}

impl BranchDirectory for InMemoryZoneRepository {
    fn list_branches(
        &self,
    ) -> impl Future<Output = Result<Vec<Branch>, RepositoryUnavailable>> + Send {
        ready(self.branches())
    }
}
