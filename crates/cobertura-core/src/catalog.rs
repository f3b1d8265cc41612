//! YAML zones catalog: branches with their zones, loaded into memory.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::guard::ZoneMutationGuard;
use crate::model::{Branch, Coordinate, ZoneDraft};
use crate::repository::InMemoryZoneRepository;
use crate::streets::StreetRangeDraft;
use crate::ConfigError;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneEntry {
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Vertices as `[latitude, longitude]` pairs.
    pub polygon: Vec<[f64; 2]>,
    #[serde(default)]
    pub streets: Vec<StreetRangeDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchEntry {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub zones: Vec<ZoneEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ZonesFile {
    pub branches: Vec<BranchEntry>,
}

/// Load a zones catalog file and validate every zone through `guard`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or a branch or
/// zone fails validation.
pub fn load_zones_catalog(
    path: &Path,
    guard: &ZoneMutationGuard,
) -> Result<InMemoryZoneRepository, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ZonesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    let repository = parse_zones_catalog(&content, guard)?;
    tracing::info!(path = %path.display(), "zones catalog loaded");
    Ok(repository)
}

/// Parse catalog YAML already in memory. See [`load_zones_catalog`].
///
/// # Errors
///
/// Returns `ConfigError` on malformed YAML or any validation failure.
pub fn parse_zones_catalog(
    content: &str,
    guard: &ZoneMutationGuard,
) -> Result<InMemoryZoneRepository, ConfigError> {
    let file: ZonesFile = serde_yaml::from_str(content)?;
    let branches = validate_branches(&file)?;
    let repository = InMemoryZoneRepository::with_branches(branches);

    for branch in &file.branches {
        for entry in &branch.zones {
            let draft = ZoneDraft {
                id: None,
                branch_id: Some(branch.id),
                name: entry.name.clone(),
                polygon: entry
                    .polygon
                    .iter()
                    .map(|[lat, lon]| Coordinate::new(*lat, *lon))
                    .collect(),
                street_ranges: entry.streets.clone(),
                active: entry.active,
                created_at: None,
            };
            let existing = repository
                .snapshot(Some(branch.id))
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
            let zone = guard.validate(&draft, &existing).map_err(|e| {
                ConfigError::Validation(format!(
                    "branch {} zone '{}': {e}",
                    branch.id, entry.name
                ))
            })?;
            repository
                .insert(zone)
                .map_err(|e| ConfigError::Validation(e.to_string()))?;
        }
    }

    Ok(repository)
}

fn validate_branches(file: &ZonesFile) -> Result<Vec<Branch>, ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut branches = Vec::with_capacity(file.branches.len());

    for entry in &file.branches {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "branch {} name must be non-empty",
                entry.id
            )));
        }

        if !seen_ids.insert(entry.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate branch id: {}",
                entry.id
            )));
        }

        let location = Coordinate::try_new(entry.latitude, entry.longitude).map_err(|e| {
            ConfigError::Validation(format!("branch '{}' location: {e}", entry.name))
        })?;

        branches.push(Branch {
            id: entry.id,
            name: entry.name.trim().to_owned(),
            address: entry.address.clone(),
            location,
        });
    }

    Ok(branches)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
