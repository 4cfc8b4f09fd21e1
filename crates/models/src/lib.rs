//! Domain types for barrel storage: the barrel entity with its
//! deposit/withdraw rules, block positions and the persisted record shape.

pub mod errors;
pub mod position;
pub mod barrel;

pub use barrel::{Barrel, BarrelRecord};
pub use configs::DEFAULT_MAX_CAPACITY;
pub use position::{BlockPos, LocationKey};
