use std::future::Future;

use cobertura_core::{
    load_zones_catalog, AppConfig, Branch, BranchDirectory, CoverageZone, InMemoryZoneRepository,
    RepositoryUnavailable, ZoneMutationGuard, ZoneRepository, ZoneStore,
};

use crate::client::StoreClient;
use crate::error::StoreError;

/// Where zones and branches come from at runtime.
pub enum ZoneBackend {
    /// The zones catalog file, held in memory. Writes do not reach the file.
    Catalog(InMemoryZoneRepository),
    Remote(StoreClient),
}

impl ZoneBackend {
    /// Remote store when one is configured, otherwise the zones catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Catalog`] when the catalog cannot be loaded, or a
    /// client construction error for the remote store.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        if let Some(store) = &config.store {
            let client = StoreClient::new(&store.base_url, &store.token, store.timeout_secs)?;
            tracing::info!(base_url = %store.base_url, "using remote zone store");
            return Ok(Self::Remote(client));
        }

        let guard = ZoneMutationGuard::new(config.guard_limits());
        let repository = load_zones_catalog(&config.zones_path, &guard)?;
        tracing::info!(
            path = %config.zones_path.display(),
            "using zones catalog file"
        );
        Ok(Self::Catalog(repository))
    }

    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Remote(_) => "remote",
        }
    }
}

impl From<InMemoryZoneRepository> for ZoneBackend {
    fn from(repository: InMemoryZoneRepository) -> Self {
        Self::Catalog(repository)
    }
}

impl ZoneRepository for ZoneBackend {
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        async move {
            match self {
                Self::Catalog(repository) => repository.list_zones(branch_id).await,
                Self::Remote(client) => client.list_zones(branch_id).await,
            }
        }
    }

    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        async move {
            match self {
                Self::Catalog(repository) => repository.branch_zones(branch_id).await,
                Self::Remote(client) => client.branch_zones(branch_id).await,
            }
        }
    }
}

impl ZoneStore for ZoneBackend {
    fn save_zone(
        &self,
        zone: CoverageZone,
    ) -> impl Future<Output = Result<CoverageZone, RepositoryUnavailable>> + Send {
        async move {
            match self {
                Self::Catalog(repository) => repository.save_zone(zone).await,
                Self::Remote(client) => client.save_zone(zone).await,
            }
        }
    }

    fn delete_zone(
        &self,
        branch_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<bool, RepositoryUnavailable>> + Send {
        async move {
            match self {
                Self::Catalog(repository) => repository.delete_zone(branch_id, name).await,
                Self::Remote(client) => client.delete_zone(branch_id, name).await,
            }
        }
    }
}

impl BranchDirectory for ZoneBackend {
    fn list_branches(
        &self,
    ) -> impl Future<Output = Result<Vec<Branch>, RepositoryUnavailable>> + Send {
        async move {
            match self {
                Self::Catalog(repository) => repository.list_branches().await,
                Self::Remote(client) => client.list_branches().await,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use cobertura_core::{Environment, StoreConfig, StreetRangePolicy};

    use super::*;

    fn config(store: Option<StoreConfig>, zones_path: PathBuf) -> AppConfig {
        AppConfig {
            env: Environment::Test,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "info".to_string(),
            zones_path,
            store,
            max_polygon_points: 100,
            max_zones_per_branch: 10,
            street_range_policy: StreetRangePolicy::Permissive,
        }
    }

    fn shipped_catalog_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("zones.yaml")
    }

    #[test]
    fn uses_catalog_without_store() {
        let backend = ZoneBackend::from_config(&config(None, shipped_catalog_path())).unwrap();
        assert_eq!(backend.kind(), "catalog");
    }

    #[test]
    fn uses_remote_store_when_configured() {
        let store = StoreConfig {
            base_url: "https://zonas.example.com".to_string(),
            token: "t".to_string(),
            timeout_secs: 5,
        };
        let backend =
            ZoneBackend::from_config(&config(Some(store), PathBuf::from("/nonexistent"))).unwrap();
        assert_eq!(backend.kind(), "remote");
    }

    #[test]
    fn missing_catalog_is_an_error() {
        let result = ZoneBackend::from_config(&config(None, PathBuf::from("/nonexistent.yaml")));
        assert!(matches!(result, Err(StoreError::Catalog(_))));
    }

    #[tokio::test]
    async fn catalog_backend_lists_branches() {
        let backend = ZoneBackend::from_config(&config(None, shipped_catalog_path())).unwrap();
        let branches = backend.list_branches().await.unwrap();
        assert!(branches.iter().any(|b| b.name == "Sucursal Bahía Blanca"));
    }
}
