//! Administrative operations on individual barrels.
//!
//! These bypass the lock/owner policy; authorizing the caller is up to the
//! surface exposing them.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use models::{BarrelRecord, BlockPos};

use crate::errors::ServiceError;
use crate::registry::{BarrelHandle, BarrelRegistry};

#[derive(Clone)]
pub struct BarrelAdmin {
    registry: Arc<BarrelRegistry>,
}

impl BarrelAdmin {
    pub fn new(registry: Arc<BarrelRegistry>) -> Self {
        Self { registry }
    }

    fn handle(&self, id: &Uuid) -> Result<BarrelHandle, ServiceError> {
        self.registry.find_by_id(id).ok_or_else(|| ServiceError::not_found("barrel"))
    }

    pub fn list(&self) -> Vec<BarrelRecord> {
        let mut records = self.registry.records();
        records.sort_by(|a, b| {
            (&a.world_id, a.pos_x, a.pos_y, a.pos_z).cmp(&(&b.world_id, b.pos_x, b.pos_y, b.pos_z))
        });
        records
    }

    pub fn get(&self, id: &Uuid) -> Result<BarrelRecord, ServiceError> {
        Ok(self.handle(id)?.lock().snapshot())
    }

    pub fn get_at(&self, world_id: &str, pos: BlockPos) -> Result<BarrelRecord, ServiceError> {
        self.registry
            .find_by_location(world_id, pos)
            .map(|h| h.lock().snapshot())
            .ok_or_else(|| ServiceError::not_found("barrel"))
    }

    pub fn set_locked(&self, id: &Uuid, locked: bool) -> Result<BarrelRecord, ServiceError> {
        let handle = self.handle(id)?;
        let mut barrel = handle.lock();
        barrel.set_locked(locked);
        info!(%id, locked, "barrel lock changed");
        Ok(barrel.snapshot())
    }

    pub fn set_owner(&self, id: &Uuid, owner: Option<Uuid>) -> Result<BarrelRecord, ServiceError> {
        let handle = self.handle(id)?;
        let mut barrel = handle.lock();
        barrel.set_owner(owner);
        info!(%id, owner = ?owner, "barrel owner changed");
        Ok(barrel.snapshot())
    }

    pub fn set_max_capacity(&self, id: &Uuid, max_capacity: u32) -> Result<BarrelRecord, ServiceError> {
        if max_capacity == 0 {
            return Err(ServiceError::Validation("maxCapacity must be >= 1".into()));
        }
        let handle = self.handle(id)?;
        let mut barrel = handle.lock();
        barrel.set_max_capacity(max_capacity);
        info!(%id, max_capacity, stored = barrel.stored_amount(), "barrel capacity changed");
        Ok(barrel.snapshot())
    }

    pub fn clear(&self, id: &Uuid) -> Result<BarrelRecord, ServiceError> {
        let handle = self.handle(id)?;
        let mut barrel = handle.lock();
        barrel.clear();
        info!(%id, "barrel cleared");
        Ok(barrel.snapshot())
    }

    /// Unregister a barrel; returns whether it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        let existed = self.registry.unregister_id(id).is_some();
        if existed {
            info!(%id, "barrel removed by admin");
        }
        existed
    }
}
