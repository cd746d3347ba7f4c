#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Timed state machine that masks the handoff between two rooms.
//!
//! A transition is started by a navigation event, advanced by the host's
//! per-frame `update` call and fires the logical room swap exactly once when
//! its progress crosses the midpoint, while the visual effect still hides the
//! discontinuity. Only one transition may be active at a time.

mod params;

pub use params::{ease_in_out_cubic, transition_params};

use std::{fmt, sync::Arc, time::Duration};

use liminal_core::{
    choose_weighted, AudioSample, Escalation, RoomConfig, RoomIndex, TransitionEffect,
    TransitionParams, TransitionPhase, TransitionTrigger, VariationState,
};
use liminal_system_generation::RoomRequest;
use liminal_world::RoomCatalog;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::{debug, info, trace, warn};

const EFFECT_STREAM_SALT: u64 = 0x7a1e_55d0_0c0f_fee5;
const MIN_DURATION: Duration = Duration::from_millis(1);

/// Base weights of each effect before escalation is applied.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EffectWeights {
    /// Weight of [`TransitionEffect::Fade`].
    pub fade: f32,
    /// Weight of [`TransitionEffect::Warp`].
    pub warp: f32,
    /// Weight of [`TransitionEffect::Zoom`].
    pub zoom: f32,
    /// Weight of [`TransitionEffect::Dissolve`].
    pub dissolve: f32,
    /// Weight of [`TransitionEffect::Impossible`] once its gate has opened.
    pub impossible: f32,
}

impl Default for EffectWeights {
    fn default() -> Self {
        Self {
            fade: 1.0,
            warp: 1.0,
            zoom: 1.0,
            dissolve: 1.0,
            impossible: 400.0,
        }
    }
}

/// Tuning knobs controlling transition timing and effect selection.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TransitionTuning {
    /// Shortest drawn duration in milliseconds.
    pub duration_min_ms: u64,
    /// Longest drawn duration in milliseconds.
    pub duration_max_ms: u64,
    /// Fraction of the duration removed by a full-strength audio transient.
    pub transient_speedup: f32,
    /// Progress below which the transition is starting.
    pub starting_threshold: f32,
    /// Progress at which the transition starts ending.
    pub ending_threshold: f32,
    /// Progress at which the logical room swap fires.
    pub midpoint: f32,
    /// Shallowest destination that may draw the impossible effect.
    pub impossible_min_depth: u32,
    /// Chance that the impossible effect joins the table for one start.
    pub impossible_gate_probability: f64,
    /// Base effect weights.
    pub effect_weights: EffectWeights,
    /// Extra weight given to warp and dissolve at full escalation.
    pub escalation_bias: f32,
}

impl Default for TransitionTuning {
    fn default() -> Self {
        Self {
            duration_min_ms: 1_200,
            duration_max_ms: 2_000,
            transient_speedup: 0.3,
            starting_threshold: 0.1,
            ending_threshold: 0.9,
            midpoint: 0.5,
            impossible_min_depth: 8,
            impossible_gate_probability: 0.15,
            effect_weights: EffectWeights::default(),
            escalation_bias: 1.5,
        }
    }
}

impl TransitionTuning {
    fn phase_for(&self, progress: f32) -> TransitionPhase {
        if progress < self.starting_threshold {
            TransitionPhase::Starting
        } else if progress < self.ending_threshold {
            TransitionPhase::InProgress
        } else {
            TransitionPhase::Ending
        }
    }

    fn effect_table(
        &self,
        admit_impossible: bool,
        escalation: Escalation,
    ) -> Vec<(TransitionEffect, f32)> {
        let weights = &self.effect_weights;
        let boost = 1.0 + self.escalation_bias.max(0.0) * escalation.get();
        let mut table = vec![
            (TransitionEffect::Fade, weights.fade),
            (TransitionEffect::Warp, weights.warp * boost),
            (TransitionEffect::Zoom, weights.zoom),
            (TransitionEffect::Dissolve, weights.dissolve * boost),
        ];
        if admit_impossible {
            table.push((TransitionEffect::Impossible, weights.impossible));
        }
        table
    }

    fn draw_duration<R: Rng + ?Sized>(&self, rng: &mut R, audio: AudioSample) -> Duration {
        let low = self.duration_min_ms.min(self.duration_max_ms);
        let high = self.duration_min_ms.max(self.duration_max_ms);
        let base_ms = rng.gen_range(low..=high);
        let speedup = self.transient_speedup.clamp(0.0, 1.0) * audio.transient();
        let scaled = base_ms as f64 * f64::from(1.0 - speedup);
        Duration::from_secs_f64(scaled / 1_000.0).max(MIN_DURATION)
    }
}

/// Read-only inputs sampled from the escalation and audio collaborators.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TransitionInputs {
    /// Current escalation intensity.
    pub escalation: Escalation,
    /// Latest audio sample; silent when audio is unavailable.
    pub audio: AudioSample,
}

/// One-shot callback run when the logical swap fires.
pub type MidpointHook = Box<dyn FnOnce(RoomIndex, &Arc<RoomConfig>)>;

/// Notifications emitted while a transition advances.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionEvent {
    /// The state machine moved between phases.
    PhaseChanged {
        /// Phase before the change.
        from: TransitionPhase,
        /// Phase after the change.
        to: TransitionPhase,
    },
    /// The destination became the logical current room.
    MidpointSwap {
        /// Destination index.
        to_index: RoomIndex,
        /// Destination descriptor with its variation applied.
        config: Arc<RoomConfig>,
    },
    /// The transition finished and was cleared.
    Completed {
        /// Destination index.
        to_index: RoomIndex,
        /// Effect that was played.
        effect: TransitionEffect,
    },
}

/// Result of asking the orchestrator to start a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum StartOutcome {
    /// A new transition is running.
    Started {
        /// Effect chosen for the transition.
        effect: TransitionEffect,
        /// Time the transition will take.
        duration: Duration,
        /// Destination descriptor resolved through the catalog.
        to_config: Arc<RoomConfig>,
    },
    /// Another transition is active; the request was rejected.
    Busy {
        /// Destination of the transition that is already running.
        active_to: RoomIndex,
    },
}

/// Summary of a transition discarded by [`TransitionOrchestrator::cancel`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CancelledTransition {
    /// Destination the transition was heading to.
    pub to_index: RoomIndex,
    /// Effect that was playing.
    pub effect: TransitionEffect,
    /// Progress reached before the cancel.
    pub progress: f32,
    /// Whether the logical swap had already fired and therefore still stands.
    pub midpoint_fired: bool,
}

/// State of the transition currently in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionRecord {
    trigger: TransitionTrigger,
    from_config: Arc<RoomConfig>,
    to_index: RoomIndex,
    to_config: Arc<RoomConfig>,
    variation: VariationState,
    effect: TransitionEffect,
    duration: Duration,
    started_at: Duration,
    elapsed: Duration,
    progress: f32,
    phase: TransitionPhase,
    midpoint_fired: bool,
}

impl TransitionRecord {
    /// What caused the transition.
    #[must_use]
    pub const fn trigger(&self) -> TransitionTrigger {
        self.trigger
    }

    /// Room being left.
    #[must_use]
    pub fn from_config(&self) -> &Arc<RoomConfig> {
        &self.from_config
    }

    /// Destination index.
    #[must_use]
    pub const fn to_index(&self) -> RoomIndex {
        self.to_index
    }

    /// Destination descriptor.
    #[must_use]
    pub fn to_config(&self) -> &Arc<RoomConfig> {
        &self.to_config
    }

    /// Variation frozen for the destination.
    #[must_use]
    pub fn variation(&self) -> &VariationState {
        &self.variation
    }

    /// Effect being played.
    #[must_use]
    pub const fn effect(&self) -> TransitionEffect {
        self.effect
    }

    /// Total duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Orchestrator clock reading when the transition started.
    #[must_use]
    pub const fn started_at(&self) -> Duration {
        self.started_at
    }

    /// Time advanced so far, never beyond the duration.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Completion fraction in `[0, 1]`.
    #[must_use]
    pub const fn progress(&self) -> f32 {
        self.progress
    }

    /// Phase derived from the progress.
    #[must_use]
    pub const fn phase(&self) -> TransitionPhase {
        self.phase
    }

    /// Whether the logical swap has fired.
    #[must_use]
    pub const fn midpoint_fired(&self) -> bool {
        self.midpoint_fired
    }
}

struct ActiveTransition {
    record: TransitionRecord,
    on_midpoint: Option<MidpointHook>,
}

impl fmt::Debug for ActiveTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveTransition")
            .field("record", &self.record)
            .field("on_midpoint", &self.on_midpoint.is_some())
            .finish()
    }
}

/// Drives at most one transition at a time.
#[derive(Debug)]
pub struct TransitionOrchestrator<R = ChaCha8Rng> {
    tuning: TransitionTuning,
    rng: R,
    clock: Duration,
    active: Option<ActiveTransition>,
    resting_phase: TransitionPhase,
}

impl TransitionOrchestrator<ChaCha8Rng> {
    /// Creates an orchestrator whose effect and duration draws replay for `seed`.
    #[must_use]
    pub fn new(seed: u64, tuning: TransitionTuning) -> Self {
        Self::with_rng(tuning, ChaCha8Rng::seed_from_u64(seed ^ EFFECT_STREAM_SALT))
    }
}

impl<R: Rng> TransitionOrchestrator<R> {
    /// Creates an orchestrator drawing from the provided random source.
    #[must_use]
    pub fn with_rng(tuning: TransitionTuning, rng: R) -> Self {
        Self {
            tuning,
            rng,
            clock: Duration::ZERO,
            active: None,
            resting_phase: TransitionPhase::Idle,
        }
    }

    /// Tuning the orchestrator runs with.
    #[must_use]
    pub fn tuning(&self) -> &TransitionTuning {
        &self.tuning
    }

    /// Begins a transition from `from_config` to `to_index`.
    ///
    /// The destination is resolved through `catalog`, which freezes its
    /// variation in the ledger on first visit. Rejected with
    /// [`StartOutcome::Busy`] while another transition is active.
    pub fn start(
        &mut self,
        trigger: TransitionTrigger,
        from_config: Arc<RoomConfig>,
        to_index: RoomIndex,
        catalog: &mut RoomCatalog,
        inputs: TransitionInputs,
        on_midpoint: Option<MidpointHook>,
    ) -> StartOutcome {
        if let Some(active) = &self.active {
            debug!(
                requested = to_index.get(),
                active = active.record.to_index.get(),
                "rejected transition while another is active"
            );
            return StartOutcome::Busy {
                active_to: active.record.to_index,
            };
        }

        catalog.set_escalation(inputs.escalation);
        let request = RoomRequest::new(to_index)
            .with_entry(trigger.travel_direction())
            .with_origin(Some(from_config.index()));
        let destination = catalog.resolve(&request);

        let effect = self.choose_effect(to_index, inputs.escalation);
        let duration = self.tuning.draw_duration(&mut self.rng, inputs.audio);
        let to_config = Arc::clone(destination.config());

        info!(
            from = from_config.index().get(),
            to = to_index.get(),
            ?effect,
            duration_ms = duration.as_millis() as u64,
            tier = destination.variation().tier(),
            "transition started"
        );

        self.active = Some(ActiveTransition {
            record: TransitionRecord {
                trigger,
                from_config,
                to_index,
                to_config: Arc::clone(&to_config),
                variation: destination.variation().clone(),
                effect,
                duration,
                started_at: self.clock,
                elapsed: Duration::ZERO,
                progress: 0.0,
                phase: self.tuning.phase_for(0.0),
                midpoint_fired: false,
            },
            on_midpoint,
        });

        StartOutcome::Started {
            effect,
            duration,
            to_config,
        }
    }

    /// Advances the active transition by `delta`.
    ///
    /// Returns `true` exactly once, on the call that brings progress to one
    /// and clears the transition. The midpoint swap is always emitted before
    /// completion, even when a single delta jumps over both.
    pub fn update(&mut self, delta: Duration, out: &mut Vec<TransitionEvent>) -> bool {
        self.clock = self.clock.saturating_add(delta);
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        let tuning = &self.tuning;
        let record = &mut active.record;

        record.elapsed = record.elapsed.saturating_add(delta).min(record.duration);
        let progress = (record.elapsed.as_secs_f64() / record.duration.as_secs_f64()) as f32;
        record.progress = progress.clamp(record.progress, 1.0);

        let phase = tuning.phase_for(record.progress);
        if phase != record.phase {
            out.push(TransitionEvent::PhaseChanged {
                from: record.phase,
                to: phase,
            });
            record.phase = phase;
        }

        if !record.midpoint_fired && record.progress >= tuning.midpoint {
            record.midpoint_fired = true;
            if let Some(hook) = active.on_midpoint.take() {
                hook(record.to_index, &record.to_config);
            }
            out.push(TransitionEvent::MidpointSwap {
                to_index: record.to_index,
                config: Arc::clone(&record.to_config),
            });
            debug!(to = record.to_index.get(), "midpoint swap fired");
        }

        if record.progress < 1.0 {
            trace!(progress = record.progress, phase = ?record.phase, "transition advanced");
            return false;
        }

        let to_index = record.to_index;
        let effect = record.effect;
        let last_phase = record.phase;
        self.active = None;
        self.resting_phase = TransitionPhase::Idle;
        out.push(TransitionEvent::PhaseChanged {
            from: last_phase,
            to: TransitionPhase::Idle,
        });
        out.push(TransitionEvent::Completed { to_index, effect });
        info!(to = to_index.get(), ?effect, "transition completed");
        true
    }

    /// Discards the active transition without undoing a swap that already fired.
    pub fn cancel(&mut self) -> Option<CancelledTransition> {
        let active = self.active.take()?;
        self.resting_phase = TransitionPhase::Cancelled;
        let record = active.record;
        if record.midpoint_fired {
            warn!(
                to = record.to_index.get(),
                progress = record.progress,
                "transition cancelled after the midpoint swap; destination stays current"
            );
        } else {
            debug!(to = record.to_index.get(), "transition cancelled");
        }
        Some(CancelledTransition {
            to_index: record.to_index,
            effect: record.effect,
            progress: record.progress,
            midpoint_fired: record.midpoint_fired,
        })
    }

    /// Transition in flight, if any.
    #[must_use]
    pub fn active(&self) -> Option<&TransitionRecord> {
        self.active.as_ref().map(|active| &active.record)
    }

    /// Reports whether a transition is in flight.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Current phase; `Idle` or `Cancelled` when nothing is in flight.
    #[must_use]
    pub fn phase(&self) -> TransitionPhase {
        self.active
            .as_ref()
            .map_or(self.resting_phase, |active| active.record.phase)
    }

    /// Camera parameters for the current frame.
    #[must_use]
    pub fn current_params(&self) -> TransitionParams {
        self.active
            .as_ref()
            .map_or(TransitionParams::NEUTRAL, |active| {
                transition_params(active.record.progress, active.record.effect)
            })
    }

    fn choose_effect(&mut self, to_index: RoomIndex, escalation: Escalation) -> TransitionEffect {
        let deep_enough = to_index.depth() >= self.tuning.impossible_min_depth;
        let gate = self.tuning.impossible_gate_probability;
        let gate = if gate.is_finite() { gate.clamp(0.0, 1.0) } else { 0.0 };
        let admit_impossible = deep_enough && self.rng.gen_bool(gate);
        let table = self.tuning.effect_table(admit_impossible, escalation);
        choose_weighted(&table, &mut self.rng).unwrap_or(TransitionEffect::Fade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_follow_thresholds() {
        let tuning = TransitionTuning::default();
        assert_eq!(tuning.phase_for(0.0), TransitionPhase::Starting);
        assert_eq!(tuning.phase_for(0.09), TransitionPhase::Starting);
        assert_eq!(tuning.phase_for(0.1), TransitionPhase::InProgress);
        assert_eq!(tuning.phase_for(0.89), TransitionPhase::InProgress);
        assert_eq!(tuning.phase_for(0.9), TransitionPhase::Ending);
        assert_eq!(tuning.phase_for(1.0), TransitionPhase::Ending);
    }

    #[test]
    fn impossible_is_absent_unless_admitted() {
        let tuning = TransitionTuning::default();
        let closed = tuning.effect_table(false, Escalation::new(1.0));
        assert!(closed
            .iter()
            .all(|(effect, _)| *effect != TransitionEffect::Impossible));
        let open = tuning.effect_table(true, Escalation::CALM);
        assert_eq!(open.last().map(|(effect, _)| *effect), Some(TransitionEffect::Impossible));
    }

    #[test]
    fn escalation_boosts_warp_and_dissolve() {
        let tuning = TransitionTuning::default();
        let weight = |table: &[(TransitionEffect, f32)], wanted| {
            table
                .iter()
                .find(|(effect, _)| *effect == wanted)
                .map_or(0.0, |(_, weight)| *weight)
        };
        let calm = tuning.effect_table(false, Escalation::CALM);
        let tense = tuning.effect_table(false, Escalation::new(1.0));
        assert!(weight(&tense, TransitionEffect::Warp) > weight(&calm, TransitionEffect::Warp));
        assert!(
            weight(&tense, TransitionEffect::Dissolve) > weight(&calm, TransitionEffect::Dissolve)
        );
        assert_eq!(
            weight(&tense, TransitionEffect::Fade),
            weight(&calm, TransitionEffect::Fade)
        );
    }

    #[test]
    fn transients_shorten_durations() {
        let tuning = TransitionTuning {
            duration_min_ms: 1_000,
            duration_max_ms: 1_000,
            ..TransitionTuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let silent = tuning.draw_duration(&mut rng, AudioSample::silent());
        let sharp = tuning.draw_duration(&mut rng, AudioSample::new([0.0; 4], 1.0));
        assert_eq!(silent, Duration::from_millis(1_000));
        assert!((sharp.as_secs_f64() - 0.7).abs() < 1e-3, "{sharp:?}");
    }
}
