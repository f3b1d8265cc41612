//! `resolve` and `zones` command handlers.
//!
//! Both read from whichever backend the configuration selects: the zones
//! catalog file, or the remote zone store when `COBERTURA_STORE_BASE_URL` is set.

use anyhow::Context;
use cobertura_core::{AppConfig, Coordinate, CoverageQuery, CoverageResolver, ZoneRepository};
use cobertura_store::ZoneBackend;

#[derive(Debug, Clone)]
pub(crate) struct ResolveArgs {
    pub latitude: f64,
    pub longitude: f64,
    pub street: Option<String>,
    pub number: Option<u32>,
    pub branch: Option<i64>,
}

impl ResolveArgs {
    /// # Errors
    ///
    /// Returns an error when the coordinate is out of range.
    pub(crate) fn to_query(&self) -> anyhow::Result<CoverageQuery> {
        let point = Coordinate::try_new(self.latitude, self.longitude)?;
        Ok(CoverageQuery {
            point,
            street_name: self.street.clone(),
            house_number: self.number,
            branch_scope: self.branch,
        })
    }
}

/// Resolve one address and print the matching zones as a JSON array.
///
/// # Errors
///
/// Returns an error if the coordinate is invalid, the backend cannot be
/// opened, or the zone repository is unavailable.
pub(crate) async fn run_resolve(config: &AppConfig, args: ResolveArgs) -> anyhow::Result<()> {
    let query = args.to_query()?;
    let backend = ZoneBackend::from_config(config).context("opening zone backend")?;
    let resolver = CoverageResolver::new(&backend).with_policy(config.street_range_policy);

    let matches = resolver.resolve(&query).await?;
    if matches.is_empty() {
        tracing::info!(
            latitude = query.point.latitude,
            longitude = query.point.longitude,
            "address not covered"
        );
    }
    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

/// Print active zones, optionally of one branch, as a JSON array.
///
/// # Errors
///
/// Returns an error if the backend cannot be opened or listed.
pub(crate) async fn run_zones(config: &AppConfig, branch: Option<i64>) -> anyhow::Result<()> {
    let backend = ZoneBackend::from_config(config).context("opening zone backend")?;
    let zones = backend.list_zones(branch).await?;
    println!("{}", serde_json::to_string_pretty(&zones)?);
    Ok(())
}
