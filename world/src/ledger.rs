//! Write-once record of every room generated during a session.

use std::{collections::BTreeMap, sync::Arc};

use liminal_core::{Direction, RoomConfig, RoomIndex, VariationState};

/// Monotonic stamp assigned when a room is first recorded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisitStamp(u64);

impl VisitStamp {
    /// Retrieves the numeric representation of the stamp.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// Frozen description of a room as it was first generated.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitedRecord {
    index: RoomIndex,
    config: Arc<RoomConfig>,
    variation: VariationState,
    entry_doorway: Option<Direction>,
    visited_at: VisitStamp,
}

impl VisitedRecord {
    /// Index of the recorded room.
    #[must_use]
    pub const fn index(&self) -> RoomIndex {
        self.index
    }

    /// Descriptor with the variation already applied.
    #[must_use]
    pub fn config(&self) -> &Arc<RoomConfig> {
        &self.config
    }

    /// Variation resolved when the room was first generated.
    #[must_use]
    pub fn variation(&self) -> &VariationState {
        &self.variation
    }

    /// Direction of travel that first reached the room, if any.
    #[must_use]
    pub const fn entry_doorway(&self) -> Option<Direction> {
        self.entry_doorway
    }

    /// Stamp assigned when the room was recorded.
    #[must_use]
    pub const fn visited_at(&self) -> VisitStamp {
        self.visited_at
    }
}

/// Unbounded idempotent map from room index to its first generated record.
///
/// Generation itself is stateless; this ledger is what makes backtracking
/// reproduce identical rooms even after escalation has drifted.
#[derive(Debug, Default)]
pub struct VisitedLedger {
    records: BTreeMap<RoomIndex, Arc<VisitedRecord>>,
    next_stamp: u64,
}

impl VisitedLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a room unless the index is already present.
    ///
    /// Returns `true` when the record was inserted. Later calls for the same
    /// index are no-ops: the first write wins.
    pub fn mark_visited(
        &mut self,
        index: RoomIndex,
        entry_doorway: Option<Direction>,
        config: Arc<RoomConfig>,
        variation: VariationState,
    ) -> bool {
        self.record(index, entry_doorway, config, variation).1
    }

    /// Records a room unless present and returns whichever record now owns the index.
    pub(crate) fn record(
        &mut self,
        index: RoomIndex,
        entry_doorway: Option<Direction>,
        config: Arc<RoomConfig>,
        variation: VariationState,
    ) -> (&Arc<VisitedRecord>, bool) {
        debug_assert_eq!(
            config.index(),
            index,
            "room descriptor recorded under a foreign index"
        );
        let visited_at = VisitStamp(self.next_stamp);
        let mut inserted = false;
        let record = self.records.entry(index).or_insert_with(|| {
            inserted = true;
            Arc::new(VisitedRecord {
                index,
                config,
                variation,
                entry_doorway,
                visited_at,
            })
        });
        if inserted {
            self.next_stamp = self.next_stamp.saturating_add(1);
        }
        (&*record, inserted)
    }

    /// Retrieves the record for a room, if it was ever generated.
    #[must_use]
    pub fn get_visited(&self, index: RoomIndex) -> Option<&Arc<VisitedRecord>> {
        self.records.get(&index)
    }

    /// Reports whether the room has been recorded.
    #[must_use]
    pub fn contains(&self, index: RoomIndex) -> bool {
        self.records.contains_key(&index)
    }

    /// Number of recorded rooms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reports whether no room has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterates records in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<VisitedRecord>> {
        self.records.values()
    }

    /// Forgets every record. Only used for a session-wide reset.
    pub fn reset(&mut self) {
        self.records.clear();
        self.next_stamp = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liminal_core::{Doorway, RoomDimensions};

    fn room(index: u32, pattern_seed: u64) -> Arc<RoomConfig> {
        Arc::new(RoomConfig::new(
            RoomIndex::new(index),
            RoomDimensions::new(5.0, 5.0, 3.0),
            vec![Doorway::new(
                Direction::North,
                0.5,
                1.0,
                2.0,
                RoomIndex::new(index + 1),
            )],
            pattern_seed,
            0,
            None,
            None,
        ))
    }

    #[test]
    fn first_write_wins() {
        let mut ledger = VisitedLedger::new();
        let index = RoomIndex::new(4);
        let first = room(4, 1);

        assert!(ledger.mark_visited(
            index,
            Some(Direction::North),
            Arc::clone(&first),
            VariationState::none()
        ));
        assert!(!ledger.mark_visited(
            index,
            Some(Direction::East),
            room(4, 2),
            VariationState::new(2, Vec::new())
        ));

        let record = ledger.get_visited(index).expect("record");
        assert_eq!(record.entry_doorway(), Some(Direction::North));
        assert_eq!(record.config(), &first);
        assert!(record.variation().is_unaltered());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn stamps_follow_insertion_order() {
        let mut ledger = VisitedLedger::new();
        for index in [7_u32, 2, 5] {
            let _ = ledger.mark_visited(
                RoomIndex::new(index),
                None,
                room(index, 0),
                VariationState::none(),
            );
        }
        let stamp = |index| {
            ledger
                .get_visited(RoomIndex::new(index))
                .map(|record| record.visited_at().get())
        };
        assert_eq!(stamp(7), Some(0));
        assert_eq!(stamp(2), Some(1));
        assert_eq!(stamp(5), Some(2));
        let order: Vec<u32> = ledger.iter().map(|record| record.index().get()).collect();
        assert_eq!(order, vec![2, 5, 7]);
    }

    #[test]
    fn reset_clears_everything() {
        let mut ledger = VisitedLedger::new();
        let _ = ledger.mark_visited(RoomIndex::new(1), None, room(1, 0), VariationState::none());
        ledger.reset();
        assert!(ledger.is_empty());
        assert!(ledger.get_visited(RoomIndex::new(1)).is_none());
    }
}
