use std::{fs, path::Path};

use anyhow::{Context, Result};
use liminal_system_generation::{GenerationTuning, VariationTuning};
use liminal_system_transition::TransitionTuning;
use liminal_world::PoolConfig;
use serde::Deserialize;

const DEFAULT_SEED: u64 = 0x5eed_1a11_0f0f_0042;

/// Parameters of the simulated walk.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct WalkConfig {
    /// Number of transitions to play.
    pub(crate) steps: u32,
    /// Simulated frame length in milliseconds.
    pub(crate) frame_ms: u64,
    /// Chance of stepping back towards the origin instead of deeper.
    pub(crate) backtrack_probability: f64,
    /// Realization requests served per frame.
    pub(crate) realizations_per_frame: usize,
    /// Escalation added per room of depth, saturating at one.
    pub(crate) escalation_per_room: f32,
    /// Flush the pool after this many steps; zero disables it.
    pub(crate) flush_every: u32,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            steps: 64,
            frame_ms: 16,
            backtrack_probability: 0.2,
            realizations_per_frame: 2,
            escalation_per_room: 0.02,
            flush_every: 0,
        }
    }
}

/// Complete configuration of a headless session.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct LiminalConfig {
    pub(crate) seed: u64,
    pub(crate) generation: GenerationTuning,
    pub(crate) variation: VariationTuning,
    pub(crate) pool: PoolConfig,
    pub(crate) transition: TransitionTuning,
    pub(crate) walk: WalkConfig,
}

impl Default for LiminalConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            generation: GenerationTuning::default(),
            variation: VariationTuning::default(),
            pool: PoolConfig::default(),
            transition: TransitionTuning::default(),
            walk: WalkConfig::default(),
        }
    }
}

impl LiminalConfig {
    /// Reads a TOML configuration file; missing keys keep their defaults.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(LiminalConfig::parse("").expect("parse"), LiminalConfig::default());
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = LiminalConfig::parse(
            r#"
            seed = 7

            [pool]
            memory_budget_bytes = 1048576

            [transition]
            impossible_gate_probability = 0.5

            [transition.effect_weights]
            fade = 3.0

            [generation.room_height]
            min = 3.0
            max = 3.5

            [walk]
            steps = 5
            "#,
        )
        .expect("parse");

        assert_eq!(config.seed, 7);
        assert_eq!(config.pool.memory_budget_bytes, 1_048_576);
        assert_eq!(config.pool.radius, PoolConfig::default().radius);
        assert_eq!(config.transition.impossible_gate_probability, 0.5);
        assert_eq!(config.transition.effect_weights.fade, 3.0);
        assert_eq!(config.transition.effect_weights.warp, 1.0);
        assert_eq!(config.generation.room_height.max, 3.5);
        assert_eq!(config.generation.room_width, GenerationTuning::default().room_width);
        assert_eq!(config.walk.steps, 5);
        assert_eq!(config.walk.frame_ms, WalkConfig::default().frame_ms);
    }

    #[test]
    fn unknown_walk_keys_are_rejected() {
        let error = LiminalConfig::parse("[walk]\nstride = 3\n").expect_err("unknown key");
        assert!(format!("{error:#}").contains("stride"));
    }
}
