//! Owner attribution for barrel placements.
//!
//! The host engine reports "actor is about to place a barrel" through an
//! interaction event and the block placement itself through a separate event
//! that may not name the actor. Announcements are kept for a short window and
//! the oldest live one is claimed by the next placement.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_PLACEMENT_WINDOW: Duration = Duration::from_millis(5000);

pub struct PendingPlacements {
    window: Duration,
    pending: DashMap<Uuid, Instant>,
}

impl Default for PendingPlacements {
    fn default() -> Self {
        Self::new(DEFAULT_PLACEMENT_WINDOW)
    }
}

impl PendingPlacements {
    pub fn new(window: Duration) -> Self {
        Self { window, pending: DashMap::new() }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn note(&self, actor: Uuid) {
        self.note_at(actor, Instant::now());
    }

    /// Record an announcement at `at`; a newer one from the same actor wins.
    pub fn note_at(&self, actor: Uuid, at: Instant) {
        self.pending.insert(actor, at);
        debug!(%actor, "pending barrel placement noted");
    }

    pub fn claim(&self) -> Option<Uuid> {
        self.claim_at(Instant::now())
    }

    /// Drop announcements older than the window, then take the oldest one left.
    pub fn claim_at(&self, now: Instant) -> Option<Uuid> {
        self.pending
            .retain(|_, at| now.saturating_duration_since(*at) <= self.window);

        loop {
            let candidate = self
                .pending
                .iter()
                .min_by_key(|entry| *entry.value())
                .map(|entry| *entry.key())?;
            // another placement may have claimed it in between
            if self.pending.remove(&candidate).is_some() {
                debug!(actor = %candidate, "pending barrel placement claimed");
                return Some(candidate);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
