//! Read-through seam joining generation, variation and the visited ledger.

use std::sync::Arc;

use liminal_core::{Escalation, RoomConfig, RoomIndex};
use liminal_system_generation::{
    GenerationTuning, Generator, RoomRequest, VariationResolver, VariationTuning,
};

use crate::ledger::{VisitedLedger, VisitedRecord};

/// Single source of rooms for a session.
///
/// Every room the pool or the transition orchestrator sees is produced here:
/// a ledger hit returns the frozen record, a miss generates the base room,
/// resolves its variation against the current escalation, applies it, and
/// records the result before handing it out.
#[derive(Debug)]
pub struct RoomCatalog {
    generator: Generator,
    resolver: VariationResolver,
    ledger: VisitedLedger,
    escalation: Escalation,
}

impl RoomCatalog {
    /// Creates a catalog keyed by the session seed.
    #[must_use]
    pub fn new(seed: u64, generation: GenerationTuning, variation: VariationTuning) -> Self {
        Self {
            generator: Generator::new(seed, generation),
            resolver: VariationResolver::new(seed, variation),
            ledger: VisitedLedger::new(),
            escalation: Escalation::CALM,
        }
    }

    /// Creates a catalog with default tuning.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::new(seed, GenerationTuning::default(), VariationTuning::default())
    }

    /// Session seed the catalog generates from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.generator.seed()
    }

    /// Updates the escalation used for rooms that have not been generated yet.
    pub fn set_escalation(&mut self, escalation: Escalation) {
        self.escalation = escalation;
    }

    /// Escalation applied to the next newly generated room.
    #[must_use]
    pub const fn escalation(&self) -> Escalation {
        self.escalation
    }

    /// Returns the frozen record for the requested room, generating it on a miss.
    pub fn resolve(&mut self, request: &RoomRequest) -> Arc<VisitedRecord> {
        let index = request.index();
        if let Some(record) = self.ledger.get_visited(index) {
            return Arc::clone(record);
        }

        let base = self.generator.generate(request);
        let variation = self.resolver.resolve(&base, self.escalation);
        let config = Arc::new(variation.apply(&base));
        let (record, inserted) = self
            .ledger
            .record(index, request.entry(), config, variation);
        debug_assert!(inserted, "ledger miss must record the new room");
        Arc::clone(record)
    }

    /// Returns the descriptor for a room approached from nowhere in particular.
    pub fn config(&mut self, index: RoomIndex) -> Arc<RoomConfig> {
        Arc::clone(self.resolve(&RoomRequest::new(index)).config())
    }

    /// Read-only access to the visited ledger.
    #[must_use]
    pub fn ledger(&self) -> &VisitedLedger {
        &self.ledger
    }

    /// Forgets every generated room. The seed and escalation are kept.
    pub fn reset(&mut self) {
        self.ledger.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liminal_core::Direction;

    #[test]
    fn repeated_resolution_returns_the_same_record() {
        let mut catalog = RoomCatalog::with_seed(42);
        let request = RoomRequest::new(RoomIndex::new(3)).with_entry(Some(Direction::North));
        let first = catalog.resolve(&request);
        let second = catalog.resolve(&request);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(catalog.ledger().len(), 1);
    }

    #[test]
    fn escalation_changes_do_not_reroll_cached_rooms() {
        let mut catalog = RoomCatalog::with_seed(5);
        let index = RoomIndex::new(30);
        let before = catalog.resolve(&RoomRequest::new(index));

        catalog.set_escalation(Escalation::new(1.0));
        let after = catalog.resolve(&RoomRequest::new(index));

        assert_eq!(before.variation(), after.variation());
        assert_eq!(before.config(), after.config());
    }

    #[test]
    fn later_entries_do_not_replace_the_first() {
        let mut catalog = RoomCatalog::with_seed(5);
        let index = RoomIndex::new(8);
        let prefetched = catalog.config(index);
        let entered = catalog.resolve(
            &RoomRequest::new(index)
                .with_entry(Some(Direction::West))
                .with_origin(Some(RoomIndex::new(7))),
        );
        assert_eq!(entered.config(), &prefetched);
        assert_eq!(entered.entry_doorway(), None);
    }

    #[test]
    fn stamped_config_carries_variation_tier() {
        let mut catalog = RoomCatalog::with_seed(11);
        catalog.set_escalation(Escalation::new(1.0));
        for index in 0..40 {
            let record = catalog.resolve(&RoomRequest::new(RoomIndex::new(index)));
            assert_eq!(record.config().wrongness(), record.variation().tier());
        }
    }

    #[test]
    fn reset_regenerates_identically_under_same_escalation() {
        let mut catalog = RoomCatalog::with_seed(11);
        let index = RoomIndex::new(12);
        let before = catalog.config(index);
        catalog.reset();
        assert!(catalog.ledger().is_empty());
        assert_eq!(catalog.config(index), before);
    }
}
