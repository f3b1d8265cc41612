//! HTTP client for the external branch directory and zone store.
//!
//! Every call carries the bearer token and is bounded by the configured
//! timeout. Failures are returned to the caller as-is; there is no retry and
//! no caching.

use std::future::Future;
use std::time::Duration;

use cobertura_core::{
    Branch, BranchDirectory, CoverageZone, RepositoryUnavailable, ZoneRepository, ZoneStore,
};
use futures::stream::{self, StreamExt, TryStreamExt};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::error::StoreError;
use crate::normalize::{branch_from_wire, zone_from_wire, zone_to_wire};
use crate::types::{SaveZoneResponse, WireBranch, ZonesResponse};

const BRANCHES_PATH: &str = "internalapi/SubsidiaryList/1";
const ZONES_PATH: &str = "internalapi/GetZonasCobertura";
const SAVE_ZONE_PATH: &str = "internalapi/GuardarZonaCobertura";
const DELETE_ZONE_PATH: &str = "internalapi/EliminarZonaCobertura";

/// Branches whose zones are fetched at the same time during a full scan.
const MAX_CONCURRENT_BRANCH_FETCHES: usize = 4;

pub struct StoreClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl StoreClient {
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] if the underlying `reqwest::Client` cannot
    /// be constructed, or [`StoreError::InvalidBaseUrl`] if `base_url` does not
    /// parse.
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("cobertura/0.1 (coverage-resolution)")
            .build()?;

        // Exactly one trailing slash, so joined paths append to the base path
        // instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| StoreError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            token: token.to_owned(),
            base_url,
        })
    }

    /// Lists every branch in the directory, in directory order.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure or non-2xx HTTP status.
    /// - [`StoreError::Deserialize`] if the body is not the expected shape.
    /// - [`StoreError::InvalidBranch`] if a branch has an unusable location.
    pub async fn get_branches(&self) -> Result<Vec<Branch>, StoreError> {
        let url = self.endpoint(BRANCHES_PATH)?;
        let wire: Vec<WireBranch> = self.get_json(&url).await?;
        let branches = wire
            .into_iter()
            .map(branch_from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(count = branches.len(), "branches fetched from store");
        Ok(branches)
    }

    /// Lists one branch's zones, inactive ones included.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure or non-2xx HTTP status.
    /// - [`StoreError::Deserialize`] if the body is not the expected shape.
    /// - [`StoreError::InvalidZone`] if any zone cannot be normalized.
    pub async fn get_coverage_zones(
        &self,
        branch_id: i64,
    ) -> Result<Vec<CoverageZone>, StoreError> {
        let url = self.endpoint(&format!("{ZONES_PATH}/{branch_id}"))?;
        let response: ZonesResponse = self.get_json(&url).await?;
        let zones = response
            .zonas_cobertura
            .into_iter()
            .map(|wire| zone_from_wire(branch_id, wire))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(branch_id, count = zones.len(), "zones fetched from store");
        Ok(zones)
    }

    /// Active zones of one branch, or of every branch in directory order.
    ///
    /// # Errors
    ///
    /// Propagates the first failure of [`get_branches`](Self::get_branches) or
    /// [`get_coverage_zones`](Self::get_coverage_zones).
    pub async fn active_zones(
        &self,
        branch_id: Option<i64>,
    ) -> Result<Vec<CoverageZone>, StoreError> {
        let zones = match branch_id {
            Some(id) => self.get_coverage_zones(id).await?,
            None => {
                let branches = self.get_branches().await?;
                let per_branch: Vec<Vec<CoverageZone>> = stream::iter(branches)
                    .map(|branch| self.get_coverage_zones(branch.id))
                    .buffered(MAX_CONCURRENT_BRANCH_FETCHES)
                    .try_collect()
                    .await?;
                per_branch.into_iter().flatten().collect()
            }
        };
        Ok(zones.into_iter().filter(|z| z.active).collect())
    }

    /// Inserts or replaces a zone. The returned zone carries the id the store
    /// assigned, or its original id when the store did not send one back.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Http`] on network failure or non-2xx HTTP status.
    /// - [`StoreError::Deserialize`] if a non-empty body is not valid JSON.
    pub async fn save_coverage_zone(
        &self,
        zone: CoverageZone,
    ) -> Result<CoverageZone, StoreError> {
        let url = self.endpoint(SAVE_ZONE_PATH)?;
        let request = zone_to_wire(&zone);
        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        let saved: SaveZoneResponse = if body.trim().is_empty() {
            SaveZoneResponse::default()
        } else {
            serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
                context: url.to_string(),
                source: e,
            })?
        };

        let id = saved.zona_id.or(zone.id);
        tracing::info!(
            branch_id = zone.branch_id,
            zone = %zone.name,
            zone_id = ?id,
            "zone saved to store"
        );
        Ok(CoverageZone { id, ..zone })
    }

    /// Deletes a zone by branch and name. `Ok(false)` when the store answers
    /// 404.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Http`] on network failure or any other non-2xx
    /// status.
    pub async fn delete_coverage_zone(
        &self,
        branch_id: i64,
        name: &str,
    ) -> Result<bool, StoreError> {
        let encoded = utf8_percent_encode(name.trim(), NON_ALPHANUMERIC);
        let url = self.endpoint(&format!("{DELETE_ZONE_PATH}/{branch_id}/{encoded}"))?;
        let response = self
            .client
            .delete(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        response.error_for_status()?;
        tracing::info!(branch_id, zone = name, "zone deleted from store");
        Ok(true)
    }

    /// Resolves `path` (already percent-encoded) against the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Sends an authenticated GET, asserts a 2xx status, and decodes the body.
    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, StoreError> {
        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await?
            .error_for_status()?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| StoreError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

impl ZoneRepository for StoreClient {
    fn list_zones(
        &self,
        branch_id: Option<i64>,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        async move {
            self.active_zones(branch_id)
                .await
                .map_err(RepositoryUnavailable::from)
        }
    }

    fn branch_zones(
        &self,
        branch_id: i64,
    ) -> impl Future<Output = Result<Vec<CoverageZone>, RepositoryUnavailable>> + Send {
        async move {
            self.get_coverage_zones(branch_id)
                .await
                .map_err(RepositoryUnavailable::from)
        }
    }
}

impl ZoneStore for StoreClient {
    fn save_zone(
        &self,
        zone: CoverageZone,
    ) -> impl Future<Output = Result<CoverageZone, RepositoryUnavailable>> + Send {
        async move {
            self.save_coverage_zone(zone)
                .await
                .map_err(RepositoryUnavailable::from)
        }
    }

    fn delete_zone(
        &self,
        branch_id: i64,
        name: &str,
    ) -> impl Future<Output = Result<bool, RepositoryUnavailable>> + Send {
        async move {
            self.delete_coverage_zone(branch_id, name)
                .await
                .map_err(RepositoryUnavailable::from)
        }
    }
}

impl BranchDirectory for StoreClient {
    fn list_branches(
        &self,
    ) -> impl Future<Output = Result<Vec<Branch>, RepositoryUnavailable>> + Send {
        async move { self.get_branches().await.map_err(RepositoryUnavailable::from) }
    }
}
