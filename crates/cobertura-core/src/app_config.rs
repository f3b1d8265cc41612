use std::net::SocketAddr;
use std::path::PathBuf;

use crate::guard::GuardLimits;
use crate::resolver::StreetRangePolicy;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Connection settings for the external zone store.
#[derive(Clone)]
pub struct StoreConfig {
    pub base_url: String,
    pub token: String,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("base_url", &self.base_url)
            .field("token", &"[redacted]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub zones_path: PathBuf,
    /// When set, zones and branches come from the remote store instead of
    /// `zones_path`.
    pub store: Option<StoreConfig>,
    pub max_polygon_points: usize,
    pub max_zones_per_branch: usize,
    pub street_range_policy: StreetRangePolicy,
}

impl AppConfig {
    #[must_use]
    pub const fn guard_limits(&self) -> GuardLimits {
        GuardLimits {
            max_polygon_points: self.max_polygon_points,
            max_zones_per_branch: self.max_zones_per_branch,
        }
    }
}
