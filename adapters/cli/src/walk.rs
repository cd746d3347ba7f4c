use std::{collections::BTreeMap, fmt, time::Duration};

use liminal_core::{AudioSample, Escalation, RoomConfig, RoomIndex, TransitionTrigger};
use liminal_system_transition::{StartOutcome, TransitionInputs};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::{LiminalConfig, WalkConfig},
    session::Session,
};

const WALK_STREAM_SALT: u64 = 0x3a1c_e0f5_77a1_d00d;
const TRANSIENT_CHANCE: f64 = 0.25;

/// Pool counters captured at the end of a walk.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct PoolSnapshot {
    pub(crate) entries: usize,
    pub(crate) realized: usize,
    pub(crate) realized_bytes: u64,
    pub(crate) budget_bytes: u64,
    pub(crate) peak_realized_bytes: u64,
    pub(crate) demotions: u64,
    pub(crate) window_evictions: u64,
    pub(crate) emergency_flushed: u64,
    pub(crate) disposed_rooms: u64,
}

/// Outcome of a simulated walk.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub(crate) struct WalkSummary {
    pub(crate) seed: u64,
    pub(crate) steps: u32,
    pub(crate) final_room: u32,
    pub(crate) deepest_room: u32,
    pub(crate) backtracks: u32,
    pub(crate) frames: u64,
    pub(crate) midpoint_swaps: u32,
    pub(crate) rooms_generated: usize,
    pub(crate) varied_rooms: usize,
    pub(crate) effects: BTreeMap<String, u32>,
    pub(crate) pool: PoolSnapshot,
}

impl fmt::Display for WalkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "seed {:#x}: {} steps in {} frames", self.seed, self.steps, self.frames)?;
        writeln!(
            f,
            "ended in room {} (deepest {}), {} backtracks, {} midpoint swaps",
            self.final_room, self.deepest_room, self.backtracks, self.midpoint_swaps
        )?;
        writeln!(
            f,
            "ledger: {} rooms generated, {} altered",
            self.rooms_generated, self.varied_rooms
        )?;
        let effects: Vec<String> = self
            .effects
            .iter()
            .map(|(effect, count)| format!("{effect}={count}"))
            .collect();
        writeln!(f, "effects: {}", effects.join(" "))?;
        let pool = &self.pool;
        write!(
            f,
            "pool: {} entries, {} realized, {} / {} bytes (peak {}), {} demotions, {} window evictions, {} flushed, {} disposed",
            pool.entries,
            pool.realized,
            pool.realized_bytes,
            pool.budget_bytes,
            pool.peak_realized_bytes,
            pool.demotions,
            pool.window_evictions,
            pool.emergency_flushed,
            pool.disposed_rooms
        )
    }
}

/// Walks through rooms for the configured number of steps.
pub(crate) fn run(config: &LiminalConfig) -> WalkSummary {
    let walk = &config.walk;
    let frame = Duration::from_millis(walk.frame_ms.max(1));
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed ^ WALK_STREAM_SALT);
    let mut session = Session::new(config);
    let mut summary = WalkSummary {
        seed: config.seed,
        ..WalkSummary::default()
    };
    let mut flushed = 0_u64;

    for step in 0..walk.steps {
        let from = session.current().index();
        let (trigger, to) = choose_move(session.current(), walk, &mut rng);
        let inputs = TransitionInputs {
            escalation: Escalation::new(walk.escalation_per_room * to.depth() as f32),
            audio: sample_audio(&mut rng),
        };

        match session.begin(trigger, to, inputs) {
            StartOutcome::Started { effect, .. } => {
                *summary.effects.entry(format!("{effect:?}")).or_insert(0) += 1;
            }
            StartOutcome::Busy { active_to } => {
                warn!(requested = to.get(), active = active_to.get(), "walk stalled");
                continue;
            }
        }
        if to < from {
            summary.backtracks += 1;
        }

        loop {
            summary.frames += 1;
            if session.frame(frame) {
                break;
            }
        }

        let here = session.current().index();
        summary.deepest_room = summary.deepest_room.max(here.get());
        if walk.flush_every > 0 && (step + 1) % walk.flush_every == 0 {
            flushed += session.emergency_flush() as u64;
        }
    }

    summary.steps = walk.steps;
    summary.final_room = session.current().index().get();
    summary.midpoint_swaps = session.midpoint_hooks();
    let ledger = session.catalog().ledger();
    summary.rooms_generated = ledger.len();
    summary.varied_rooms = ledger
        .iter()
        .filter(|record| !record.variation().is_unaltered())
        .count();

    let stats = session.pool().stats();
    session.shutdown();
    summary.pool = PoolSnapshot {
        entries: stats.entries,
        realized: stats.realized,
        realized_bytes: stats.realized_bytes,
        budget_bytes: stats.budget_bytes,
        peak_realized_bytes: session.peak_realized_bytes(),
        demotions: stats.demotions,
        window_evictions: stats.window_evictions,
        emergency_flushed: flushed,
        disposed_rooms: session.disposed_rooms(),
    };
    info!(
        final_room = summary.final_room,
        rooms = summary.rooms_generated,
        "walk finished"
    );
    summary
}

fn choose_move<R: Rng>(
    room: &RoomConfig,
    walk: &WalkConfig,
    rng: &mut R,
) -> (TransitionTrigger, RoomIndex) {
    let index = room.index();
    let backtrack = walk.backtrack_probability;
    let backtrack = if backtrack.is_finite() { backtrack.clamp(0.0, 1.0) } else { 0.0 };
    if let Some(previous) = index.previous() {
        if rng.gen_bool(backtrack) {
            let trigger = room
                .doorways_to(previous)
                .next()
                .map_or(TransitionTrigger::Backtrack, |doorway| {
                    TransitionTrigger::Doorway {
                        wall: doorway.wall(),
                    }
                });
            return (trigger, previous);
        }
    }

    let onward: Vec<_> = room.doorways_to(index.next()).collect();
    let trigger = onward
        .choose(rng)
        .map_or(TransitionTrigger::Forced, |doorway| TransitionTrigger::Doorway {
            wall: doorway.wall(),
        });
    (trigger, index.next())
}

fn sample_audio<R: Rng>(rng: &mut R) -> AudioSample {
    let bands = [rng.gen(), rng.gen(), rng.gen(), rng.gen()];
    let transient = if rng.gen_bool(TRANSIENT_CHANCE) {
        rng.gen_range(0.5..=1.0)
    } else {
        0.0
    };
    AudioSample::new(bands, transient)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liminal_world::PoolConfig;

    fn short_walk() -> LiminalConfig {
        LiminalConfig {
            seed: 99,
            walk: WalkConfig {
                steps: 24,
                flush_every: 7,
                ..WalkConfig::default()
            },
            ..LiminalConfig::default()
        }
    }

    #[test]
    fn walk_replays_for_a_seed() {
        let first = run(&short_walk());
        let second = run(&short_walk());
        assert_eq!(first, second, "walk diverged between runs");
        assert_eq!(first.midpoint_swaps, first.steps);
        assert_eq!(first.effects.values().sum::<u32>(), first.steps);
    }

    #[test]
    fn budget_holds_whenever_more_than_current_is_realized() {
        let mut config = short_walk();
        config.pool = PoolConfig::new(2, 24 * 1024 * 1024);
        let summary = run(&config);
        assert!(summary.pool.peak_realized_bytes <= 24 * 1024 * 1024);
        assert!(summary.pool.demotions > 0);
        assert!(summary.pool.realized_bytes <= 24 * 1024 * 1024);
        assert!(summary.pool.disposed_rooms > 0);
    }

    #[test]
    fn never_backtracks_from_origin() {
        let config = LiminalConfig {
            walk: WalkConfig {
                backtrack_probability: 1.0,
                steps: 6,
                ..WalkConfig::default()
            },
            ..LiminalConfig::default()
        };
        let summary = run(&config);
        assert_eq!(summary.backtracks, 3);
        assert_eq!(summary.final_room, 0);
        assert_eq!(summary.deepest_room, 1);
    }
}
