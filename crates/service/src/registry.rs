//! In-memory registry of live barrels, indexed by id and by location.
//!
//! Both indices live in one immutable `Indices` value published through an
//! [`ArcSwap`]. Readers load the current snapshot without taking a lock, so a
//! lookup never waits on a writer and always sees both indices at the same
//! version. Writers build the next version with [`ArcSwap::rcu`], which
//! retries on contention and therefore never loses a concurrent update.
//!
//! The maps are persistent (`im::HashMap`): cloning a version is O(1) and the
//! next version shares every untouched node with it, so one write costs
//! O(log n) regardless of how many barrels are registered.
//!
//! Barrel contents are guarded per entity by the handle's mutex.

use std::sync::Arc;

use arc_swap::ArcSwap;
use im::HashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use configs::DEFAULT_MAX_CAPACITY;
use models::{Barrel, BarrelRecord, BlockPos, LocationKey};

/// Shared, individually locked barrel.
pub type BarrelHandle = Arc<Mutex<Barrel>>;

#[derive(Clone)]
struct Entry {
    key: LocationKey,
    handle: BarrelHandle,
}

#[derive(Clone, Default)]
struct Indices {
    by_id: HashMap<Uuid, Entry>,
    by_location: HashMap<LocationKey, Uuid>,
}

impl Indices {
    /// Insert keeping both maps in agreement; returns the barrel pushed out
    /// of the location, if any.
    fn insert(
        &mut self,
        id: Uuid,
        key: LocationKey,
        handle: BarrelHandle,
    ) -> Option<(Uuid, BarrelHandle)> {
        let mut evicted = None;

        if let Some(prev_id) = self.by_location.get(&key).copied() {
            if prev_id != id {
                evicted = self.by_id.remove(&prev_id).map(|prev| (prev_id, prev.handle));
            }
        }
        if let Some(prev) = self.by_id.remove(&id) {
            if prev.key != key && self.by_location.get(&prev.key) == Some(&id) {
                self.by_location.remove(&prev.key);
            }
        }

        self.by_location.insert(key.clone(), id);
        self.by_id.insert(id, Entry { key, handle });
        evicted
    }

    fn remove(&mut self, id: &Uuid) -> Option<BarrelHandle> {
        let entry = self.by_id.remove(id)?;
        if self.by_location.get(&entry.key) == Some(id) {
            self.by_location.remove(&entry.key);
        }
        Some(entry.handle)
    }
}

pub struct BarrelRegistry {
    indices: ArcSwap<Indices>,
    default_capacity: u32,
}

impl Default for BarrelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BarrelRegistry {
    pub fn new() -> Self {
        Self::with_default_capacity(DEFAULT_MAX_CAPACITY)
    }

    /// Registry whose freshly created barrels get `default_capacity`.
    pub fn with_default_capacity(default_capacity: u32) -> Self {
        Self { indices: ArcSwap::from_pointee(Indices::default()), default_capacity }
    }

    pub fn default_capacity(&self) -> u32 {
        self.default_capacity
    }

    /// Create an empty barrel at `pos` and register it.
    ///
    /// A barrel already registered at the same location is removed from both
    /// indices in the same step.
    pub fn create_and_register(&self, world_id: &str, pos: BlockPos) -> BarrelHandle {
        let barrel = Barrel::with_capacity(world_id, pos, self.default_capacity);
        let handle = Arc::new(Mutex::new(barrel));
        self.register(Arc::clone(&handle));
        handle
    }

    /// Insert or overwrite the entries for the barrel's own id and location.
    /// Returns any other barrel that held the location before.
    ///
    /// Takes the barrel's lock briefly to read its id and location, so the
    /// caller must not be holding it.
    pub fn register(&self, handle: BarrelHandle) -> Option<BarrelHandle> {
        let (id, key) = {
            let barrel = handle.lock();
            (barrel.id(), barrel.location_key())
        };

        let mut evicted = None;
        self.indices.rcu(|current| {
            let mut next = Indices::clone(current);
            evicted = next.insert(id, key.clone(), Arc::clone(&handle));
            next
        });

        debug!(%id, location = %key, "barrel registered");
        evicted.map(|(prev_id, prev)| {
            warn!(%prev_id, %id, location = %key, "location already held a barrel; previous barrel evicted");
            prev
        })
    }

    /// Remove the barrel from both indices. No-op if it is not registered.
    pub fn unregister(&self, handle: &BarrelHandle) -> Option<BarrelHandle> {
        let id = handle.lock().id();
        self.unregister_id(&id)
    }

    pub fn unregister_id(&self, id: &Uuid) -> Option<BarrelHandle> {
        if !self.indices.load().by_id.contains_key(id) {
            return None;
        }

        let mut removed = None;
        self.indices.rcu(|current| {
            let mut next = Indices::clone(current);
            removed = next.remove(id);
            next
        });
        if removed.is_some() {
            debug!(%id, "barrel unregistered");
        }
        removed
    }

    pub fn find_by_id(&self, id: &Uuid) -> Option<BarrelHandle> {
        self.indices.load().by_id.get(id).map(|e| Arc::clone(&e.handle))
    }

    pub fn find_by_location(&self, world_id: &str, pos: BlockPos) -> Option<BarrelHandle> {
        let key = LocationKey::new(world_id, pos);
        let indices = self.indices.load();
        indices
            .by_location
            .get(&key)
            .and_then(|id| indices.by_id.get(id))
            .map(|e| Arc::clone(&e.handle))
    }

    pub fn exists_at(&self, world_id: &str, pos: BlockPos) -> bool {
        self.indices.load().by_location.contains_key(&LocationKey::new(world_id, pos))
    }

    /// Snapshot of every registered barrel, in no particular order.
    pub fn all_containers(&self) -> Vec<BarrelHandle> {
        self.indices.load().by_id.values().map(|e| Arc::clone(&e.handle)).collect()
    }

    /// Field copies of every registered barrel, taken one lock at a time.
    pub fn records(&self) -> Vec<BarrelRecord> {
        self.all_containers().iter().map(|h| h.lock().snapshot()).collect()
    }

    pub fn count(&self) -> usize {
        self.indices.load().by_id.len()
    }

    pub fn clear_all(&self) {
        let previous = self.indices.swap(Arc::new(Indices::default()));
        debug!(removed = previous.by_id.len(), "registry cleared");
    }

    /// Swap the whole content for `barrels` in one step.
    ///
    /// Later barrels win over earlier ones sharing an id or a location.
    pub fn replace_all<I>(&self, barrels: I) -> usize
    where
        I: IntoIterator<Item = Barrel>,
    {
        let mut next = Indices::default();
        for barrel in barrels {
            let (id, key) = (barrel.id(), barrel.location_key());
            if let Some((prev_id, _)) = next.insert(id, key.clone(), Arc::new(Mutex::new(barrel))) {
                warn!(%prev_id, %id, location = %key, "duplicate location while loading; earlier barrel dropped");
            }
        }
        let count = next.by_id.len();
        self.indices.store(Arc::new(next));
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn pos(x: i32, y: i32, z: i32) -> BlockPos {
        BlockPos::new(x, y, z)
    }

    #[test]
    fn create_is_visible_through_both_indices() {
        let reg = BarrelRegistry::new();
        let handle = reg.create_and_register("w1", pos(1, 2, 3));
        let id = handle.lock().id();

        let by_id = reg.find_by_id(&id).unwrap();
        let by_loc = reg.find_by_location("w1", pos(1, 2, 3)).unwrap();
        assert!(Arc::ptr_eq(&by_id, &handle));
        assert!(Arc::ptr_eq(&by_loc, &handle));
        assert!(reg.exists_at("w1", pos(1, 2, 3)));
        assert!(!reg.exists_at("w2", pos(1, 2, 3)));
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn unregister_removes_from_both_indices() {
        let reg = BarrelRegistry::new();
        let handle = reg.create_and_register("w1", pos(1, 2, 3));
        let id = handle.lock().id();

        assert!(reg.unregister(&handle).is_some());
        assert!(reg.find_by_id(&id).is_none());
        assert!(reg.find_by_location("w1", pos(1, 2, 3)).is_none());
        assert_eq!(reg.count(), 0);

        // second removal is a no-op
        assert!(reg.unregister(&handle).is_none());
    }

    #[test]
    fn duplicate_create_evicts_previous_barrel() {
        let reg = BarrelRegistry::new();
        let first = reg.create_and_register("w1", pos(0, 64, 0));
        let first_id = first.lock().id();
        let second = reg.create_and_register("w1", pos(0, 64, 0));

        assert_eq!(reg.count(), 1);
        assert!(reg.find_by_id(&first_id).is_none());
        let found = reg.find_by_location("w1", pos(0, 64, 0)).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
    }

    #[test]
    fn register_returns_replaced_barrel() {
        let reg = BarrelRegistry::new();
        let first = reg.create_and_register("w1", pos(5, 5, 5));
        let other = Arc::new(Mutex::new(Barrel::new("w1", pos(5, 5, 5))));
        let replaced = reg.register(other).unwrap();
        assert!(Arc::ptr_eq(&replaced, &first));

        // re-registering the same barrel replaces nothing
        let again = reg.find_by_location("w1", pos(5, 5, 5)).unwrap();
        assert!(reg.register(again).is_none());
        assert_eq!(reg.count(), 1);
    }

    #[test]
    fn distinct_coordinates_do_not_collide() {
        let reg = BarrelRegistry::new();
        reg.create_and_register("w", pos(1, 23, 4));
        reg.create_and_register("w", pos(12, 3, 4));
        assert_eq!(reg.count(), 2);
    }

    #[test]
    fn count_tracks_registrations() {
        let reg = BarrelRegistry::new();
        let handles: Vec<_> = (0..10).map(|i| reg.create_and_register("w", pos(i, 0, 0))).collect();
        assert_eq!(reg.count(), 10);
        for h in handles.iter().take(4) {
            reg.unregister(h);
        }
        assert_eq!(reg.count(), 6);
        assert_eq!(reg.all_containers().len(), 6);
        reg.clear_all();
        assert_eq!(reg.count(), 0);
        assert!(!reg.exists_at("w", pos(9, 0, 0)));
    }

    #[test]
    fn configured_default_capacity_applies_to_new_barrels() {
        let reg = BarrelRegistry::with_default_capacity(64);
        let handle = reg.create_and_register("w", pos(0, 0, 0));
        assert_eq!(handle.lock().max_capacity(), 64);
    }

    #[test]
    fn replace_all_swaps_content() {
        let reg = BarrelRegistry::new();
        reg.create_and_register("old", pos(0, 0, 0));

        let a = Barrel::new("w", pos(1, 1, 1));
        let b = Barrel::new("w", pos(2, 2, 2));
        let ids: HashSet<_> = [a.id(), b.id()].into_iter().collect();
        assert_eq!(reg.replace_all(vec![a, b]), 2);

        assert!(!reg.exists_at("old", pos(0, 0, 0)));
        let found: HashSet<_> = reg.records().into_iter().map(|r| r.id).collect();
        assert_eq!(found, ids);
    }

    #[test]
    fn concurrent_creates_at_distinct_locations_are_all_kept() {
        let reg = BarrelRegistry::new();
        std::thread::scope(|s| {
            for t in 0..8 {
                let reg = &reg;
                s.spawn(move || {
                    for i in 0..100 {
                        reg.create_and_register("w", pos(t, i, 0));
                    }
                });
            }
        });
        assert_eq!(reg.count(), 800);
        for t in 0..8 {
            for i in 0..100 {
                assert!(reg.exists_at("w", pos(t, i, 0)));
            }
        }
    }

    #[test]
    fn concurrent_creates_at_one_location_leave_one_barrel() {
        let reg = BarrelRegistry::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                let reg = &reg;
                s.spawn(move || {
                    for _ in 0..50 {
                        reg.create_and_register("w", pos(7, 7, 7));
                    }
                });
            }
        });
        assert_eq!(reg.count(), 1);
        let handle = reg.find_by_location("w", pos(7, 7, 7)).unwrap();
        let id = handle.lock().id();
        assert!(reg.find_by_id(&id).is_some());
    }

    #[test]
    fn concurrent_deposits_through_handles_are_serialized() {
        let reg = BarrelRegistry::new();
        reg.create_and_register("w", pos(0, 0, 0));
        std::thread::scope(|s| {
            for _ in 0..4 {
                let reg = &reg;
                s.spawn(move || {
                    for _ in 0..250 {
                        let handle = reg.find_by_location("w", pos(0, 0, 0)).unwrap();
                        handle.lock().deposit("cobble", 1);
                    }
                });
            }
        });
        let handle = reg.find_by_location("w", pos(0, 0, 0)).unwrap();
        assert_eq!(handle.lock().stored_amount(), 1000);
    }

    #[test]
    fn indices_agree_while_writers_run() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let reg = BarrelRegistry::new();
        let done = AtomicBool::new(false);
        let spots: Vec<BlockPos> = (0..4).map(|i| pos(i, 0, 0)).collect();

        std::thread::scope(|s| {
            let mut writers = Vec::new();
            for t in 0..4 {
                let (reg, spots) = (&reg, &spots);
                writers.push(s.spawn(move || {
                    for i in 0..500 {
                        let spot = spots[(t + i) % spots.len()];
                        // creating at an occupied spot evicts the barrel there
                        let handle = reg.create_and_register("w", spot);
                        if i % 3 == 0 {
                            reg.unregister(&handle);
                        }
                    }
                }));
            }

            for _ in 0..3 {
                let (reg, spots, done) = (&reg, &spots, &done);
                s.spawn(move || {
                    while !done.load(Ordering::Acquire) {
                        for spot in spots {
                            if let Some(handle) = reg.find_by_location("w", *spot) {
                                let id = handle.lock().id();
                                // the handle may be gone by now, but never half registered
                                if let Some(by_id) = reg.find_by_id(&id) {
                                    assert!(Arc::ptr_eq(&by_id, &handle));
                                }
                            }
                        }
                        let snapshot = reg.indices.load();
                        for (id, entry) in snapshot.by_id.iter() {
                            assert_eq!(snapshot.by_location.get(&entry.key), Some(id));
                        }
                        for (key, id) in snapshot.by_location.iter() {
                            assert_eq!(snapshot.by_id.get(id).map(|e| &e.key), Some(key));
                        }
                        for handle in reg.all_containers() {
                            let (id, key) = {
                                let barrel = handle.lock();
                                (barrel.id(), barrel.location_key())
                            };
                            let current = reg.indices.load();
                            if current.by_id.contains_key(&id) {
                                assert_eq!(current.by_location.get(&key), Some(&id));
                            }
                        }
                    }
                });
            }

            for w in writers {
                w.join().unwrap();
            }
            done.store(true, Ordering::Release);
        });

        let snapshot = reg.indices.load();
        assert_eq!(snapshot.by_id.len(), snapshot.by_location.len());
        assert!(reg.count() <= spots.len());
    }

    #[test]
    fn large_registry_keeps_writes_cheap() {
        let reg = BarrelRegistry::new();
        for x in 0..50_000 {
            reg.create_and_register("w", pos(x % 500, 64, x / 500));
        }
        assert_eq!(reg.count(), 50_000);

        // an older version stays intact after further writes
        let before = reg.indices.load_full();
        let handle = reg.create_and_register("w", pos(-1, 0, 0));
        reg.unregister(&handle);
        reg.create_and_register("w", pos(-2, 0, 0));
        assert_eq!(before.by_id.len(), 50_000);
        assert_eq!(reg.count(), 50_001);
    }
}
