//! Persistence of the barrel registry.
//!
//! The registry is written and read as a whole; there is no incremental
//! persistence. [`BarrelPersistence`] is the seam the runtime depends on,
//! [`json_barrel_store::JsonBarrelStore`] the file-backed implementation.

use async_trait::async_trait;

use crate::errors::ServiceError;
use crate::registry::BarrelRegistry;

pub mod json_barrel_store;

pub use json_barrel_store::JsonBarrelStore;

/// Bulk load/save of every barrel in a registry.
#[async_trait]
pub trait BarrelPersistence: Send + Sync {
    /// Replace the registry content with the persisted barrels.
    ///
    /// All-or-nothing: on error the registry is left exactly as it was.
    /// Returns the number of barrels loaded.
    async fn load_into(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError>;

    /// Persist every barrel currently registered, overwriting prior data.
    /// Returns the number of barrels written.
    async fn save_from(&self, registry: &BarrelRegistry) -> Result<usize, ServiceError>;
}
