//! Lifecycle of the barrel service.
//!
//! [`BarrelRuntime`] owns the registry and its collaborators and is handed
//! explicitly to whatever drives it (HTTP server, engine bridge, tests).

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};

use configs::AppConfig;

use crate::admin::BarrelAdmin;
use crate::errors::ServiceError;
use crate::interaction::BarrelInteractions;
use crate::placement::PendingPlacements;
use crate::registry::BarrelRegistry;
use crate::storage::{BarrelPersistence, JsonBarrelStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryInfo {
    pub version: &'static str,
    pub total_barrels: usize,
    pub default_max_capacity: u32,
}

pub struct BarrelRuntime {
    registry: Arc<BarrelRegistry>,
    persistence: Arc<dyn BarrelPersistence>,
    interactions: Arc<BarrelInteractions>,
    admin: BarrelAdmin,
    // false after a failed load, so shutdown does not overwrite the data we could not read
    save_on_shutdown: AtomicBool,
}

impl BarrelRuntime {
    pub fn new(
        registry: Arc<BarrelRegistry>,
        persistence: Arc<dyn BarrelPersistence>,
        placements: PendingPlacements,
    ) -> Self {
        let interactions = Arc::new(BarrelInteractions::new(Arc::clone(&registry), placements));
        let admin = BarrelAdmin::new(Arc::clone(&registry));
        Self {
            registry,
            persistence,
            interactions,
            admin,
            save_on_shutdown: AtomicBool::new(true),
        }
    }

    /// Wire a runtime backed by the JSON file named in `cfg`.
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::with_data_file(
            cfg.data_file(),
            cfg.barrels.default_max_capacity,
            Duration::from_millis(cfg.barrels.placement_window_ms),
        )
    }

    pub fn with_data_file(
        path: impl AsRef<Path>,
        default_capacity: u32,
        placement_window: Duration,
    ) -> Self {
        Self::new(
            Arc::new(BarrelRegistry::with_default_capacity(default_capacity)),
            Arc::new(JsonBarrelStore::new(path.as_ref())),
            PendingPlacements::new(placement_window),
        )
    }

    pub fn registry(&self) -> &Arc<BarrelRegistry> {
        &self.registry
    }

    pub fn interactions(&self) -> &Arc<BarrelInteractions> {
        &self.interactions
    }

    pub fn admin(&self) -> &BarrelAdmin {
        &self.admin
    }

    /// Populate the registry from persistence.
    ///
    /// On failure the registry keeps its previous content and the automatic
    /// save at shutdown is disabled; an explicit [`BarrelRuntime::save`]
    /// re-enables it.
    pub async fn start(&self) -> Result<usize, ServiceError> {
        info!("barrel runtime starting");
        match self.persistence.load_into(&self.registry).await {
            Ok(count) => {
                self.save_on_shutdown.store(true, Ordering::SeqCst);
                Ok(count)
            }
            Err(e) => {
                self.save_on_shutdown.store(false, Ordering::SeqCst);
                warn!("barrel data not loaded; shutdown will not overwrite it");
                Err(e)
            }
        }
    }

    pub async fn save(&self) -> Result<usize, ServiceError> {
        let count = self.persistence.save_from(&self.registry).await?;
        self.save_on_shutdown.store(true, Ordering::SeqCst);
        Ok(count)
    }

    /// Persist the registry unless the startup load failed.
    /// Returns `Ok(None)` when the save was skipped.
    pub async fn shutdown(&self) -> Result<Option<usize>, ServiceError> {
        info!(total = self.registry.count(), "barrel runtime shutting down");
        if !self.save_on_shutdown.load(Ordering::SeqCst) {
            warn!("skipping shutdown save because the startup load failed");
            return Ok(None);
        }
        self.persistence.save_from(&self.registry).await.map(Some)
    }

    pub fn info(&self) -> RegistryInfo {
        RegistryInfo {
            version: env!("CARGO_PKG_VERSION"),
            total_barrels: self.registry.count(),
            default_max_capacity: self.registry.default_capacity(),
        }
    }
}
