use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ModelError;
use crate::position::{BlockPos, LocationKey};
use configs::DEFAULT_MAX_CAPACITY;

/// A single-item storage barrel placed in a world.
///
/// A barrel holds at most one item kind. `stored_item` is `None` exactly when
/// `stored_amount` is zero. Deposits are clamped to the remaining space and
/// never fail; callers keep whatever was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barrel {
    id: Uuid,
    position: BlockPos,
    world_id: String,
    stored_item: Option<String>,
    stored_amount: u32,
    max_capacity: u32,
    locked: bool,
    owner: Option<Uuid>,
}

impl Barrel {
    /// New empty, unlocked, unowned barrel with the default capacity.
    pub fn new(world_id: impl Into<String>, position: BlockPos) -> Self {
        Self::with_capacity(world_id, position, DEFAULT_MAX_CAPACITY)
    }

    pub fn with_capacity(world_id: impl Into<String>, position: BlockPos, max_capacity: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            world_id: world_id.into(),
            stored_item: None,
            stored_amount: 0,
            max_capacity,
            locked: false,
            owner: None,
        }
    }

    /// Restore a barrel from its persisted record.
    pub fn from_record(record: BarrelRecord) -> Result<Self, ModelError> {
        if record.max_capacity == 0 {
            return Err(ModelError::Validation(format!(
                "barrel {} has zero maxCapacity",
                record.id
            )));
        }
        if record.world_id.trim().is_empty() {
            return Err(ModelError::Validation(format!("barrel {} has empty worldId", record.id)));
        }

        let (stored_item, stored_amount) = match record.stored_item_id {
            Some(item) if record.stored_amount > 0 && !item.is_empty() => {
                (Some(item), record.stored_amount)
            }
            _ => (None, 0),
        };

        Ok(Self {
            id: record.id,
            position: BlockPos::new(record.pos_x, record.pos_y, record.pos_z),
            world_id: record.world_id,
            stored_item,
            stored_amount,
            max_capacity: record.max_capacity,
            locked: record.locked,
            owner: record.owner_uuid,
        })
    }

    /// Plain copy of every field, in persisted form.
    pub fn snapshot(&self) -> BarrelRecord {
        BarrelRecord {
            id: self.id,
            pos_x: self.position.x,
            pos_y: self.position.y,
            pos_z: self.position.z,
            world_id: self.world_id.clone(),
            stored_item_id: self.stored_item.clone(),
            stored_amount: self.stored_amount,
            max_capacity: self.max_capacity,
            locked: self.locked,
            owner_uuid: self.owner,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn position(&self) -> BlockPos {
        self.position
    }

    pub fn world_id(&self) -> &str {
        &self.world_id
    }

    pub fn location_key(&self) -> LocationKey {
        LocationKey::new(self.world_id.clone(), self.position)
    }

    pub fn stored_item(&self) -> Option<&str> {
        self.stored_item.as_deref()
    }

    pub fn stored_amount(&self) -> u32 {
        self.stored_amount
    }

    pub fn max_capacity(&self) -> u32 {
        self.max_capacity
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn owner(&self) -> Option<Uuid> {
        self.owner
    }

    pub fn is_empty(&self) -> bool {
        self.stored_item.is_none() || self.stored_amount == 0
    }

    pub fn is_full(&self) -> bool {
        self.stored_amount >= self.max_capacity
    }

    /// Remaining room; zero when capacity was shrunk below the contents.
    pub fn available_space(&self) -> u32 {
        self.max_capacity.saturating_sub(self.stored_amount)
    }

    pub fn can_accept(&self, item: &str) -> bool {
        self.is_empty() || self.stored_item.as_deref() == Some(item)
    }

    /// Whether `actor` may deposit into or withdraw from this barrel.
    pub fn permits(&self, actor: Option<Uuid>) -> bool {
        !self.locked || (actor.is_some() && actor == self.owner)
    }

    /// Store up to `amount` of `item`; returns how many were taken.
    pub fn deposit(&mut self, item: &str, amount: u32) -> u32 {
        if amount == 0 || !self.can_accept(item) {
            return 0;
        }

        let accepted = amount.min(self.available_space());
        if accepted == 0 {
            return 0;
        }
        if self.is_empty() {
            self.stored_item = Some(item.to_owned());
        }
        self.stored_amount += accepted;
        accepted
    }

    /// Take up to `requested` units out; returns how many were removed.
    pub fn withdraw(&mut self, requested: u32) -> u32 {
        if self.is_empty() || requested == 0 {
            return 0;
        }

        let taken = requested.min(self.stored_amount);
        self.stored_amount -= taken;
        if self.stored_amount == 0 {
            self.clear();
        }
        taken
    }

    /// Drop the contents unconditionally. Authorization is the caller's job.
    pub fn clear(&mut self) {
        self.stored_item = None;
        self.stored_amount = 0;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn set_owner(&mut self, owner: Option<Uuid>) {
        self.owner = owner;
    }

    /// Contents above a shrunk capacity are kept; deposits are refused until
    /// withdrawals bring the amount back under the limit.
    pub fn set_max_capacity(&mut self, max_capacity: u32) {
        self.max_capacity = max_capacity;
    }
}

/// Persisted form of a barrel, one element of the `barrels.json` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarrelRecord {
    pub id: Uuid,
    pub pos_x: i32,
    pub pos_y: i32,
    pub pos_z: i32,
    pub world_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_item_id: Option<String>,
    #[serde(default)]
    pub stored_amount: u32,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_uuid: Option<Uuid>,
}

fn default_max_capacity() -> u32 {
    DEFAULT_MAX_CAPACITY
}
