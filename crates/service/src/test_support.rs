use std::path::PathBuf;

use models::BlockPos;
use uuid::Uuid;

use crate::registry::BarrelRegistry;

/// Data file path inside a fresh, not yet created temp directory.
pub fn temp_data_file(label: &str) -> PathBuf {
    std::env::temp_dir()
        .join(format!("barrels_{}_{}", label, Uuid::new_v4()))
        .join("barrels.json")
}

/// Registry with one filled, locked, owned barrel and one empty barrel.
pub fn two_barrel_registry() -> BarrelRegistry {
    let registry = BarrelRegistry::new();

    let filled = registry.create_and_register("w1", BlockPos::new(1, 2, 3));
    {
        let mut barrel = filled.lock();
        barrel.deposit("wood", 100);
        barrel.set_locked(true);
        barrel.set_owner(Some(Uuid::new_v4()));
        barrel.set_max_capacity(512);
    }
    registry.create_and_register("nether", BlockPos::new(-10, 40, 7));
    registry
}
