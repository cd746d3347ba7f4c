//! Windowed cache of rooms around the traveller, bounded by a memory budget.
//!
//! The pool keeps a config-only entry for every index within `radius` of the
//! current room and lets the rendering collaborator attach realized rooms to
//! them. Whenever realized memory exceeds the budget the least recently
//! accessed realized entry is demoted back to config-only, except for the
//! current room which is never demoted.

use std::{
    collections::{BTreeMap, VecDeque},
    ops::RangeInclusive,
    sync::Arc,
};

use liminal_core::{Doorway, RoomConfig, RoomIndex};
use liminal_system_generation::RoomRequest;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::{
    catalog::RoomCatalog,
    registry::{BufferRegistry, RealizedRoom},
};

const MEBIBYTE: u64 = 1024 * 1024;

/// Configuration of the room pool.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of rooms kept on each side of the current room.
    pub radius: u32,
    /// Upper bound on realized memory in bytes.
    pub memory_budget_bytes: u64,
}

impl PoolConfig {
    /// Creates a configuration with the provided radius and budget.
    #[must_use]
    pub const fn new(radius: u32, memory_budget_bytes: u64) -> Self {
        Self {
            radius,
            memory_budget_bytes,
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new(2, 256 * MEBIBYTE)
    }
}

/// Cache entry for one room inside the window.
#[derive(Debug)]
pub struct PooledEntry<H> {
    index: RoomIndex,
    config: Arc<RoomConfig>,
    realized: Option<H>,
    buffers: BufferRegistry,
    last_accessed: u64,
    memory_estimate_bytes: u64,
}

impl<H: RealizedRoom> PooledEntry<H> {
    fn config_only(index: RoomIndex, config: Arc<RoomConfig>, stamp: u64) -> Self {
        Self {
            index,
            config,
            realized: None,
            buffers: BufferRegistry::new(),
            last_accessed: stamp,
            memory_estimate_bytes: 0,
        }
    }

    /// Index of the pooled room.
    #[must_use]
    pub const fn index(&self) -> RoomIndex {
        self.index
    }

    /// Descriptor of the pooled room.
    #[must_use]
    pub fn config(&self) -> &Arc<RoomConfig> {
        &self.config
    }

    /// Realized room attached to the entry, if any.
    #[must_use]
    pub fn realized(&self) -> Option<&H> {
        self.realized.as_ref()
    }

    /// Reports whether a realized room is attached.
    #[must_use]
    pub fn is_realized(&self) -> bool {
        self.realized.is_some()
    }

    /// Access stamp used for least-recently-used ordering.
    #[must_use]
    pub const fn last_accessed(&self) -> u64 {
        self.last_accessed
    }

    /// Bytes attributed to the realized room, zero when config-only.
    #[must_use]
    pub const fn memory_estimate_bytes(&self) -> u64 {
        self.memory_estimate_bytes
    }

    /// Buffers registered by the realized room.
    #[must_use]
    pub fn buffers(&self) -> &BufferRegistry {
        &self.buffers
    }

    fn install(&mut self, handle: H, stamp: u64) -> bool {
        let replaced = self.demote();
        let mut registry = BufferRegistry::new();
        handle.register_buffers(&mut registry);
        self.memory_estimate_bytes = registry.total_bytes();
        self.buffers = registry;
        self.realized = Some(handle);
        self.last_accessed = stamp;
        replaced
    }

    /// Disposes the realized room, keeping the config. Returns whether one existed.
    fn demote(&mut self) -> bool {
        let Some(mut handle) = self.realized.take() else {
            return false;
        };
        for buffer in self.buffers.ids() {
            handle.release_buffer(buffer);
        }
        handle.dispose();
        self.buffers.clear();
        self.memory_estimate_bytes = 0;
        true
    }
}

/// Work item asking the rendering collaborator to realize a pooled room.
#[derive(Clone, Debug, PartialEq)]
pub struct RealizationRequest {
    /// Room to realize.
    pub index: RoomIndex,
    /// Descriptor the realized room must be built from.
    pub config: Arc<RoomConfig>,
}

/// Result of handing a realized room to the pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The room was installed into its entry.
    Installed {
        /// Whether a previously attached room was disposed to make space.
        replaced: bool,
    },
    /// The index is outside the window; the room was disposed immediately.
    OutsideWindow,
}

/// Counters describing the pool at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of entries in the window.
    pub entries: usize,
    /// Number of entries holding a realized room.
    pub realized: usize,
    /// Bytes attributed to realized rooms.
    pub realized_bytes: u64,
    /// Configured budget in bytes.
    pub budget_bytes: u64,
    /// Realized rooms demoted to stay within budget or by emergency flushes.
    pub demotions: u64,
    /// Entries dropped because the window moved away from them.
    pub window_evictions: u64,
}

/// Windowed, budgeted cache of rooms around the current index.
///
/// Dropping the pool disposes every realized room it still holds.
#[derive(Debug)]
pub struct RoomPool<H: RealizedRoom> {
    config: PoolConfig,
    entries: BTreeMap<RoomIndex, PooledEntry<H>>,
    current: Option<RoomIndex>,
    access_clock: u64,
    pending: VecDeque<RoomIndex>,
    demotions: u64,
    window_evictions: u64,
}

impl<H: RealizedRoom> RoomPool<H> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            current: None,
            access_clock: 0,
            pending: VecDeque::new(),
            demotions: 0,
            window_evictions: 0,
        }
    }

    /// Configuration the pool enforces.
    #[must_use]
    pub fn settings(&self) -> &PoolConfig {
        &self.config
    }

    /// Current room, once `set_current` has been called.
    #[must_use]
    pub const fn current(&self) -> Option<RoomIndex> {
        self.current
    }

    /// Indices covered by the window centred on `index`.
    #[must_use]
    pub fn window(&self, index: RoomIndex) -> RangeInclusive<u32> {
        let centre = index.get();
        centre.saturating_sub(self.config.radius)..=centre.saturating_add(self.config.radius)
    }

    /// Moves the window to `index`.
    ///
    /// Entries outside the new window are demoted and dropped; missing
    /// entries are filled with config-only entries through `catalog`. The
    /// previous current room loses its protection, so the eviction pass runs
    /// again before returning. Realization of the new entries is left to
    /// [`Self::drain_realization_requests`].
    pub fn set_current(&mut self, index: RoomIndex, catalog: &mut RoomCatalog) {
        let window = self.window(index);

        let stale: Vec<RoomIndex> = self
            .entries
            .keys()
            .copied()
            .filter(|candidate| !window.contains(&candidate.get()))
            .collect();
        for stale_index in stale {
            if let Some(mut entry) = self.entries.remove(&stale_index) {
                let _ = entry.demote();
                self.window_evictions = self.window_evictions.saturating_add(1);
                trace!(room = stale_index.get(), "dropped room outside window");
            }
        }

        for raw in window {
            let room = RoomIndex::new(raw);
            if self.entries.contains_key(&room) {
                continue;
            }
            let request = self.prefetch_request(room);
            let config = Arc::clone(catalog.resolve(&request).config());
            let stamp = self.tick();
            let _ = self
                .entries
                .insert(room, PooledEntry::config_only(room, config, stamp));
        }

        self.current = Some(index);
        let _ = self.touch(index);
        self.enforce_budget();
        self.rebuild_pending(index);
        debug!(
            current = index.get(),
            entries = self.entries.len(),
            realized_bytes = self.realized_bytes(),
            "pool window moved"
        );
    }

    /// Returns the descriptor for `index`, reading through `catalog` on a miss.
    ///
    /// A miss does not insert an entry; membership is owned by the window.
    pub fn config(&mut self, index: RoomIndex, catalog: &mut RoomCatalog) -> Arc<RoomConfig> {
        let stamp = self.tick();
        match self.entries.get_mut(&index) {
            Some(entry) => {
                entry.last_accessed = stamp;
                Arc::clone(&entry.config)
            }
            None => catalog.config(index),
        }
    }

    /// Installs a realized room, disposing any previous one for the index first.
    ///
    /// Runs the eviction pass afterwards, so realized memory may exceed the
    /// budget only between the insertion and the end of this call.
    pub fn attach_realized(&mut self, index: RoomIndex, mut handle: H) -> AttachOutcome {
        let stamp = self.tick();
        let Some(entry) = self.entries.get_mut(&index) else {
            handle.dispose();
            debug!(room = index.get(), "discarded realized room outside window");
            return AttachOutcome::OutsideWindow;
        };

        let replaced = entry.install(handle, stamp);
        trace!(
            room = index.get(),
            bytes = entry.memory_estimate_bytes,
            replaced,
            "attached realized room"
        );
        self.pending.retain(|pending| *pending != index);
        self.enforce_budget();
        AttachOutcome::Installed { replaced }
    }

    /// Marks the room as used by the renderer. Returns `false` if it is not pooled.
    pub fn touch(&mut self, index: RoomIndex) -> bool {
        let stamp = self.tick();
        match self.entries.get_mut(&index) {
            Some(entry) => {
                entry.last_accessed = stamp;
                true
            }
            None => false,
        }
    }

    /// Demotes every realized room except the current one. Returns the count.
    pub fn emergency_flush(&mut self) -> usize {
        let current = self.current;
        let mut flushed = 0;
        for entry in self.entries.values_mut() {
            if Some(entry.index) == current {
                continue;
            }
            if entry.demote() {
                flushed += 1;
            }
        }
        self.demotions = self.demotions.saturating_add(flushed as u64);
        debug!(flushed, "emergency flush demoted realized rooms");
        flushed
    }

    /// Demotes and drops every entry, including the current room.
    pub fn dispose(&mut self) {
        for entry in self.entries.values_mut() {
            let _ = entry.demote();
        }
        self.entries.clear();
        self.pending.clear();
        self.current = None;
        debug!("pool disposed");
    }

    /// Hands out up to `limit` pending realization requests, nearest rooms first.
    ///
    /// Window refills are cheap and happen synchronously; realization is the
    /// expensive part and is paginated through this queue across frames.
    pub fn drain_realization_requests(&mut self, limit: usize) -> Vec<RealizationRequest> {
        let mut requests = Vec::with_capacity(limit.min(self.pending.len()));
        while requests.len() < limit {
            let Some(index) = self.pending.pop_front() else {
                break;
            };
            match self.entries.get(&index) {
                Some(entry) if !entry.is_realized() => requests.push(RealizationRequest {
                    index,
                    config: Arc::clone(&entry.config),
                }),
                _ => {}
            }
        }
        requests
    }

    /// Number of realization requests still queued.
    #[must_use]
    pub fn pending_realizations(&self) -> usize {
        self.pending.len()
    }

    /// Entry for `index`, if pooled.
    #[must_use]
    pub fn entry(&self, index: RoomIndex) -> Option<&PooledEntry<H>> {
        self.entries.get(&index)
    }

    /// Reports whether `index` is pooled.
    #[must_use]
    pub fn contains(&self, index: RoomIndex) -> bool {
        self.entries.contains_key(&index)
    }

    /// Reports whether `index` holds a realized room.
    #[must_use]
    pub fn is_realized(&self, index: RoomIndex) -> bool {
        self.entries
            .get(&index)
            .map_or(false, PooledEntry::is_realized)
    }

    /// Pooled indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> Vec<RoomIndex> {
        self.entries.keys().copied().collect()
    }

    /// Pooled indices holding realized rooms in ascending order.
    #[must_use]
    pub fn realized_indices(&self) -> Vec<RoomIndex> {
        self.entries
            .values()
            .filter(|entry| entry.is_realized())
            .map(|entry| entry.index)
            .collect()
    }

    /// Bytes attributed to every realized room.
    #[must_use]
    pub fn realized_bytes(&self) -> u64 {
        self.entries
            .values()
            .fold(0_u64, |total, entry| {
                total.saturating_add(entry.memory_estimate_bytes)
            })
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            entries: self.entries.len(),
            realized: self.entries.values().filter(|entry| entry.is_realized()).count(),
            realized_bytes: self.realized_bytes(),
            budget_bytes: self.config.memory_budget_bytes,
            demotions: self.demotions,
            window_evictions: self.window_evictions,
        }
    }

    /// Approaches `room` from the pooled room before it, through its first doorway.
    fn prefetch_request(&self, room: RoomIndex) -> RoomRequest {
        let origin = room.previous();
        let entry = origin
            .and_then(|origin| self.entries.get(&origin))
            .and_then(|entry| entry.config.doorways_to(room).next())
            .map(Doorway::wall);
        RoomRequest::new(room).with_origin(origin).with_entry(entry)
    }

    fn enforce_budget(&mut self) {
        let budget = self.config.memory_budget_bytes;
        while self.realized_bytes() > budget {
            let current = self.current;
            let victim = self
                .entries
                .values()
                .filter(|entry| entry.is_realized() && Some(entry.index) != current)
                .min_by_key(|entry| (entry.last_accessed, entry.index))
                .map(|entry| entry.index);

            let Some(victim) = victim else {
                trace!(
                    realized_bytes = self.realized_bytes(),
                    budget,
                    "only the current room remains realized over budget"
                );
                break;
            };

            if let Some(entry) = self.entries.get_mut(&victim) {
                let freed = entry.memory_estimate_bytes;
                let _ = entry.demote();
                self.demotions = self.demotions.saturating_add(1);
                debug!(room = victim.get(), freed, "demoted room to stay within budget");
            }
        }
    }

    fn rebuild_pending(&mut self, centre: RoomIndex) {
        let mut unrealized: Vec<RoomIndex> = self
            .entries
            .values()
            .filter(|entry| !entry.is_realized())
            .map(|entry| entry.index)
            .collect();
        unrealized.sort_by_key(|index| (index.distance(centre), *index));
        self.pending = unrealized.into();
    }

    fn tick(&mut self) -> u64 {
        self.access_clock = self.access_clock.saturating_add(1);
        self.access_clock
    }
}

impl<H: RealizedRoom> Drop for RoomPool<H> {
    fn drop(&mut self) {
        for entry in self.entries.values_mut() {
            let _ = entry.demote();
        }
    }
}
