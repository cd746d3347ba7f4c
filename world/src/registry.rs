//! Per-room accounting of GPU buffers owned by realized rooms.

use std::collections::BTreeMap;

/// Integer handle naming a GPU buffer owned by a realized room.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    /// Creates a new buffer identifier.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Authoritative table of the buffers reachable from one realized room.
///
/// Scene graphs reach shared geometry and textures through several paths;
/// each buffer is counted once no matter how often it is reported.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BufferRegistry {
    buffers: BTreeMap<BufferId, u64>,
}

impl BufferRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a buffer and its byte length. Returns `false` for a repeat report.
    pub fn record(&mut self, buffer: BufferId, byte_len: u64) -> bool {
        if self.buffers.contains_key(&buffer) {
            return false;
        }
        let _ = self.buffers.insert(buffer, byte_len);
        true
    }

    /// Sum of every distinct buffer's byte length.
    #[must_use]
    pub fn total_bytes(&self) -> u64 {
        self.buffers
            .values()
            .fold(0_u64, |total, bytes| total.saturating_add(*bytes))
    }

    /// Identifiers of every recorded buffer in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.buffers.keys().copied()
    }

    /// Number of distinct buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Reports whether no buffer has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Forgets every recorded buffer.
    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

/// Resource-bearing room built by the rendering collaborator.
///
/// The pool never inspects a realized room beyond this contract. `dispose`
/// must tolerate repeated calls.
pub trait RealizedRoom {
    /// Reports every GPU buffer reachable from the room.
    fn register_buffers(&self, registry: &mut BufferRegistry);

    /// Releases one buffer previously reported through `register_buffers`.
    fn release_buffer(&mut self, _buffer: BufferId) {}

    /// Frees the room's remaining resources.
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_buffers_count_once() {
        let mut registry = BufferRegistry::new();
        assert!(registry.record(BufferId::new(1), 1_024));
        assert!(registry.record(BufferId::new(2), 2_048));
        assert!(!registry.record(BufferId::new(1), 1_024));
        assert_eq!(registry.total_bytes(), 3_072);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn first_reported_length_wins() {
        let mut registry = BufferRegistry::new();
        let _ = registry.record(BufferId::new(4), 100);
        let _ = registry.record(BufferId::new(4), 900);
        assert_eq!(registry.total_bytes(), 100);
    }

    #[test]
    fn ids_are_sorted() {
        let mut registry = BufferRegistry::new();
        for id in [9, 3, 6] {
            let _ = registry.record(BufferId::new(id), 1);
        }
        let ids: Vec<u64> = registry.ids().map(|id| id.get()).collect();
        assert_eq!(ids, vec![3, 6, 9]);
        registry.clear();
        assert!(registry.is_empty());
    }
}
