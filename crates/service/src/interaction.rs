//! Operations the host engine calls when players place, break or use barrels.
//!
//! Policy rejections (locked barrel, wrong item kind, full barrel) are normal
//! outcomes and are reported through [`InteractionOutcome`], never as errors.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use models::{BarrelRecord, BlockPos};

use crate::placement::PendingPlacements;
use crate::registry::BarrelRegistry;

/// Units moved out of a barrel per secondary interaction.
pub const WITHDRAW_PER_INTERACTION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InteractionOutcome {
    NoBarrel,
    Locked,
    /// Nothing to move; carries the barrel's current state for display.
    Inspected(BarrelRecord),
    Deposited { item: String, amount: u32, total: u32, capacity: u32 },
    Withdrawn { item: String, amount: u32, remaining: u32 },
    Mismatch { accepts: String },
    Full { capacity: u32 },
}

/// Event-facing contract; any dispatch mechanism can drive these.
pub trait BarrelEvents: Send + Sync {
    /// A barrel block was placed. Without an actor, a pending placement
    /// announcement decides the owner.
    fn on_place(&self, world_id: &str, pos: BlockPos, actor: Option<Uuid>) -> BarrelRecord;

    /// A block was broken; returns the barrel that was removed with it.
    fn on_break(&self, world_id: &str, pos: BlockPos) -> Option<BarrelRecord>;

    /// Primary use: deposit what the actor is holding.
    fn on_interact_primary(
        &self,
        world_id: &str,
        pos: BlockPos,
        actor: Uuid,
        offered_item: Option<&str>,
        offered_quantity: u32,
    ) -> InteractionOutcome;

    /// Secondary use: take a single unit out.
    fn on_interact_secondary(&self, world_id: &str, pos: BlockPos, actor: Uuid) -> InteractionOutcome;

    /// The actor is about to place a barrel.
    fn note_pending_placement(&self, actor: Uuid);
}

pub struct BarrelInteractions {
    registry: Arc<BarrelRegistry>,
    placements: PendingPlacements,
}

impl BarrelInteractions {
    pub fn new(registry: Arc<BarrelRegistry>, placements: PendingPlacements) -> Self {
        Self { registry, placements }
    }

    pub fn registry(&self) -> &Arc<BarrelRegistry> {
        &self.registry
    }

    pub fn placements(&self) -> &PendingPlacements {
        &self.placements
    }
}

impl BarrelEvents for BarrelInteractions {
    fn on_place(&self, world_id: &str, pos: BlockPos, actor: Option<Uuid>) -> BarrelRecord {
        let owner = actor.or_else(|| self.placements.claim());
        let handle = self.registry.create_and_register(world_id, pos);
        let mut barrel = handle.lock();
        if owner.is_some() {
            barrel.set_owner(owner);
        }
        info!(id = %barrel.id(), world_id, %pos, owner = ?owner, "barrel placed");
        barrel.snapshot()
    }

    fn on_break(&self, world_id: &str, pos: BlockPos) -> Option<BarrelRecord> {
        let handle = self.registry.find_by_location(world_id, pos)?;
        self.registry.unregister(&handle)?;

        let record = handle.lock().snapshot();
        if let Some(item) = &record.stored_item_id {
            info!(id = %record.id, item, amount = record.stored_amount, "barrel broken with items");
        }
        info!(id = %record.id, world_id, %pos, "barrel removed");
        Some(record)
    }

    fn on_interact_primary(
        &self,
        world_id: &str,
        pos: BlockPos,
        actor: Uuid,
        offered_item: Option<&str>,
        offered_quantity: u32,
    ) -> InteractionOutcome {
        let Some(handle) = self.registry.find_by_location(world_id, pos) else {
            return InteractionOutcome::NoBarrel;
        };
        let mut barrel = handle.lock();
        if !barrel.permits(Some(actor)) {
            return InteractionOutcome::Locked;
        }

        let item = match offered_item {
            Some(item) if offered_quantity > 0 => item,
            _ => return InteractionOutcome::Inspected(barrel.snapshot()),
        };
        if !barrel.can_accept(item) {
            return InteractionOutcome::Mismatch {
                accepts: barrel.stored_item().unwrap_or_default().to_owned(),
            };
        }

        let amount = barrel.deposit(item, offered_quantity);
        if amount == 0 {
            return InteractionOutcome::Full { capacity: barrel.max_capacity() };
        }
        info!(%actor, id = %barrel.id(), item, amount, "deposited into barrel");
        InteractionOutcome::Deposited {
            item: item.to_owned(),
            amount,
            total: barrel.stored_amount(),
            capacity: barrel.max_capacity(),
        }
    }

    fn on_interact_secondary(&self, world_id: &str, pos: BlockPos, actor: Uuid) -> InteractionOutcome {
        let Some(handle) = self.registry.find_by_location(world_id, pos) else {
            return InteractionOutcome::NoBarrel;
        };
        let mut barrel = handle.lock();
        if !barrel.permits(Some(actor)) {
            return InteractionOutcome::Locked;
        }

        let Some(item) = barrel.stored_item().map(str::to_owned) else {
            return InteractionOutcome::Inspected(barrel.snapshot());
        };
        let amount = barrel.withdraw(WITHDRAW_PER_INTERACTION);
        info!(%actor, id = %barrel.id(), item, amount, "withdrew from barrel");
        InteractionOutcome::Withdrawn { item, amount, remaining: barrel.stored_amount() }
    }

    fn note_pending_placement(&self, actor: Uuid) {
        self.placements.note(actor);
    }
}
