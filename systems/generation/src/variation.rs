//! One-shot alternate-version resolution.
//!
//! The resolver draws a tier from a weight table that grows with room depth
//! and the escalation intensity supplied by the dread collaborator, then
//! draws exactly `tier` structural diffs from an index-keyed stream. Calling
//! it twice with the same inputs yields the same state, but callers must still
//! cache the first result: escalation drifts over a session and a cached room
//! must never be re-rolled.

use liminal_core::{
    choose_weighted, Axis, Direction, Doorway, Escalation, RoomConfig, VariationChange,
    VariationState, MAX_VARIATION_TIER,
};
use rand::Rng;
use serde::Deserialize;
use tracing::debug;

use crate::{seed::index_stream, seed::STREAM_VARIATION, SampleRange};

const TIER_COUNT: usize = MAX_VARIATION_TIER as usize + 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ChangeKind {
    Stretch,
    LowerCeiling,
    ShiftDoorway,
    ExtraDoorway,
    ReseedPattern,
}

/// Tuning knobs controlling how often and how strongly rooms vary.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VariationTuning {
    /// Weight of the unaltered tier; raising it makes variations rarer everywhere.
    pub calm_weight: f32,
    /// Base weights for tiers 1 through 5 at full pressure.
    pub tier_weights: [f32; 5],
    /// Depth at which depth alone contributes full pressure.
    pub depth_scale: u32,
    /// Multiplier range applied by stretch diffs.
    pub stretch: SampleRange,
    /// Multiplier range applied by ceiling diffs.
    pub ceiling: SampleRange,
    /// Relative weights of stretch, ceiling, shift, extra doorway and reseed diffs.
    pub change_weights: [f32; 5],
}

impl Default for VariationTuning {
    fn default() -> Self {
        Self {
            calm_weight: 1.0,
            tier_weights: [0.6, 0.35, 0.2, 0.1, 0.05],
            depth_scale: 40,
            stretch: SampleRange::new(0.6, 1.6),
            ceiling: SampleRange::new(0.55, 0.9),
            change_weights: [1.0, 0.6, 1.0, 0.5, 0.8],
        }
    }
}

/// Draws the frozen alternate-version state for rooms.
#[derive(Clone, Debug)]
pub struct VariationResolver {
    seed: u64,
    tuning: VariationTuning,
}

impl VariationResolver {
    /// Creates a resolver bound to the session seed.
    #[must_use]
    pub fn new(seed: u64, tuning: VariationTuning) -> Self {
        Self { seed, tuning }
    }

    /// Tuning the resolver samples from.
    #[must_use]
    pub fn tuning(&self) -> &VariationTuning {
        &self.tuning
    }

    /// Weight table for every tier at the provided depth and escalation.
    ///
    /// Tier zero keeps its calm weight; every higher tier is scaled by the
    /// combined pressure raised to the tier, so each weight is non-decreasing
    /// in both depth and escalation.
    #[must_use]
    pub fn tier_weights(&self, depth: u32, escalation: Escalation) -> [(u8, f32); TIER_COUNT] {
        let pressure = self.pressure(depth, escalation);
        let mut table = [(0_u8, self.tuning.calm_weight); TIER_COUNT];
        for (tier, base) in (1_u8..).zip(self.tuning.tier_weights) {
            table[usize::from(tier)] = (tier, base * pressure.powi(i32::from(tier)));
        }
        table
    }

    /// Resolves the variation for `base`, the unaltered room at its index.
    #[must_use]
    pub fn resolve(&self, base: &RoomConfig, escalation: Escalation) -> VariationState {
        let index = base.index();
        let mut rng = index_stream(self.seed, index, STREAM_VARIATION);
        let table = self.tier_weights(index.depth(), escalation);
        let tier = choose_weighted(&table, &mut rng).unwrap_or(0);
        if tier == 0 {
            return VariationState::none();
        }

        let kinds = [
            (ChangeKind::Stretch, self.tuning.change_weights[0]),
            (ChangeKind::LowerCeiling, self.tuning.change_weights[1]),
            (ChangeKind::ShiftDoorway, self.tuning.change_weights[2]),
            (ChangeKind::ExtraDoorway, self.tuning.change_weights[3]),
            (ChangeKind::ReseedPattern, self.tuning.change_weights[4]),
        ];
        let changes: Vec<VariationChange> = (0..tier)
            .map(|_| {
                let kind = choose_weighted(&kinds, &mut rng).unwrap_or(ChangeKind::ReseedPattern);
                self.draw_change(kind, base, &mut rng)
            })
            .collect();

        debug!(
            room = index.get(),
            tier,
            escalation = escalation.get(),
            "resolved room variation"
        );
        VariationState::new(tier, changes)
    }

    fn pressure(&self, depth: u32, escalation: Escalation) -> f32 {
        let scale = self.tuning.depth_scale.max(1);
        let depth_share = (depth.min(scale) as f32) / (scale as f32);
        1.0 - (1.0 - depth_share) * (1.0 - escalation.get())
    }

    fn draw_change<R: Rng + ?Sized>(
        &self,
        kind: ChangeKind,
        base: &RoomConfig,
        rng: &mut R,
    ) -> VariationChange {
        match kind {
            ChangeKind::Stretch => VariationChange::Stretch {
                axis: if rng.gen_bool(0.5) {
                    Axis::Width
                } else {
                    Axis::Depth
                },
                factor: self.tuning.stretch.sample(rng),
            },
            ChangeKind::LowerCeiling => VariationChange::LowerCeiling {
                factor: self.tuning.ceiling.sample(rng),
            },
            ChangeKind::ShiftDoorway if !base.doorways().is_empty() => {
                let count = base.doorways().len().min(usize::from(u8::MAX));
                VariationChange::ShiftDoorway {
                    slot: rng.gen_range(0..count) as u8,
                    position: rng.gen_range(0.05..=0.95),
                }
            }
            ChangeKind::ExtraDoorway => VariationChange::ExtraDoorway {
                doorway: extra_doorway(base, rng),
            },
            ChangeKind::ShiftDoorway | ChangeKind::ReseedPattern => {
                VariationChange::ReseedPattern {
                    pattern_seed: rng.gen(),
                }
            }
        }
    }
}

fn extra_doorway<R: Rng + ?Sized>(base: &RoomConfig, rng: &mut R) -> Doorway {
    let index = base.index();
    let leads_to = match index.previous() {
        Some(previous) if rng.gen_bool(0.5) => previous,
        _ => index.next(),
    };
    let wall = Direction::ALL[rng.gen_range(0..Direction::ALL.len())];
    let height = (base.dimensions().height() * 0.75).max(0.0);
    Doorway::new(wall, rng.gen_range(0.1..=0.9), 1.0, height, leads_to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GenerationTuning, Generator, RoomRequest};
    use liminal_core::RoomIndex;

    fn base_room(index: u32) -> RoomConfig {
        Generator::new(42, GenerationTuning::default())
            .generate(&RoomRequest::new(RoomIndex::new(index)))
    }

    #[test]
    fn origin_without_escalation_never_varies() {
        let resolver = VariationResolver::new(42, VariationTuning::default());
        let state = resolver.resolve(&base_room(0), Escalation::CALM);
        assert!(state.is_unaltered());
    }

    #[test]
    fn weights_grow_with_depth_and_escalation() {
        let resolver = VariationResolver::new(1, VariationTuning::default());
        let samples = [0_u32, 5, 20, 40, 80];
        let levels = [0.0_f32, 0.25, 0.5, 1.0];
        for pair in samples.windows(2) {
            for level in levels {
                let shallow = resolver.tier_weights(pair[0], Escalation::new(level));
                let deep = resolver.tier_weights(pair[1], Escalation::new(level));
                for tier in 1..TIER_COUNT {
                    assert!(deep[tier].1 >= shallow[tier].1);
                }
            }
        }
        for pair in levels.windows(2) {
            let calm = resolver.tier_weights(10, Escalation::new(pair[0]));
            let tense = resolver.tier_weights(10, Escalation::new(pair[1]));
            for tier in 1..TIER_COUNT {
                assert!(tense[tier].1 >= calm[tier].1);
            }
        }
    }

    #[test]
    fn tier_matches_change_count() {
        let resolver = VariationResolver::new(7, VariationTuning::default());
        for index in 0..128 {
            let state = resolver.resolve(&base_room(index), Escalation::new(1.0));
            assert_eq!(usize::from(state.tier()), state.changes().len());
            assert!(state.tier() <= MAX_VARIATION_TIER);
        }
    }

    #[test]
    fn full_escalation_produces_variations() {
        let resolver = VariationResolver::new(7, VariationTuning::default());
        let states: Vec<_> = (0..128)
            .map(|index| resolver.resolve(&base_room(index), Escalation::new(1.0)))
            .collect();
        let altered = states.iter().filter(|state| !state.is_unaltered()).count();
        assert!(altered * 10 > states.len() * 3, "only {altered} rooms varied");
    }

    #[test]
    fn resolution_replays() {
        let resolver = VariationResolver::new(3, VariationTuning::default());
        let room = base_room(17);
        let level = Escalation::new(0.6);
        assert_eq!(resolver.resolve(&room, level), resolver.resolve(&room, level));
    }
}
