//! Delivery coverage resolution.
//!
//! Given a geocoded point and optionally a street address, find every branch
//! zone that covers it. Zones are polygons, optionally narrowed to house-number
//! ranges on named streets.

pub mod app_config;
pub mod catalog;
pub mod config;
pub mod error;
pub mod geometry;
pub mod guard;
pub mod model;
pub mod repository;
pub mod resolver;
pub mod streets;

pub use app_config::{AppConfig, Environment, StoreConfig};
pub use catalog::{load_zones_catalog, parse_zones_catalog, BranchEntry, ZoneEntry, ZonesFile};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, RepositoryUnavailable};
pub use geometry::{contains_point, is_simple, normalize, BoundingBox, InvalidPolygon, Polygon};
pub use guard::{GuardLimits, ValidationError, ZoneMutationGuard};
pub use model::{
    round_degrees, zone_name_key, Branch, Coordinate, CoordinateOutOfRange, CoverageMatch,
    CoverageQuery, CoverageZone, ZoneDraft, ZoneRef, COORDINATE_DECIMALS,
};
pub use repository::{BranchDirectory, InMemoryZoneRepository, ZoneRepository, ZoneStore};
pub use resolver::{resolve_against, CoverageResolver, StreetRangePolicy};
pub use streets::{normalize_street_name, StreetRange, StreetRangeDraft, StreetRangeError};
