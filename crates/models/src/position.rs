use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer block coordinate inside a world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self { x, y, z }
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Spatial index key: world id plus block position.
///
/// Compared field by field, so `(1, 23, 4)` and `(12, 3, 4)` stay distinct
/// and world ids are never concatenated with coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationKey {
    pub world_id: String,
    pub pos: BlockPos,
}

impl LocationKey {
    pub fn new(world_id: impl Into<String>, pos: BlockPos) -> Self {
        Self { world_id: world_id.into(), pos }
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.world_id, self.pos)
    }
}
