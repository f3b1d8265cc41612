//! Client for the external branch directory and zone store, plus the runtime
//! choice between that store and the local zones catalog.

pub mod backend;
pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use backend::ZoneBackend;
pub use client::StoreClient;
pub use error::StoreError;
