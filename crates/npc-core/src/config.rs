//! Engine configuration.
//!
//! # Design
//!
//! A single flat struct the host fills in (by hand or from a JSON file with
//! the `serde` feature) and hands to the zone driver.  Nothing in the engine
//! reads environment variables or files on its own.

use crate::{CoreError, CoreResult, Millis};

// ── AggroDecay ────────────────────────────────────────────────────────────────

/// How aggro scores shrink over elapsed time.
///
/// Both modes are uniform across all entries of a table, so decay never
/// changes the relative order of targets.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "snake_case"))]
pub enum AggroDecay {
    /// Scores never decay.
    #[default]
    None,
    /// Subtract `per_second * elapsed_secs` from every score.
    ByValue { per_second: f64 },
    /// Multiply every score by `(1 - per_second)^elapsed_secs`; entries
    /// below `min_aggro` are dropped.
    ByRatio { per_second: f64, min_aggro: f64 },
}

impl AggroDecay {
    /// Check the rate parameters are usable.
    pub fn validate(&self) -> CoreResult<()> {
        match *self {
            AggroDecay::None => Ok(()),
            AggroDecay::ByValue { per_second } => {
                if per_second.is_finite() && per_second >= 0.0 {
                    Ok(())
                } else {
                    Err(CoreError::Config(format!(
                        "aggro decay per_second must be finite and >= 0, got {per_second}"
                    )))
                }
            }
            AggroDecay::ByRatio { per_second, min_aggro } => {
                if !(0.0..1.0).contains(&per_second) {
                    return Err(CoreError::Config(format!(
                        "aggro decay ratio must be in [0, 1), got {per_second}"
                    )));
                }
                if !min_aggro.is_finite() || min_aggro < 0.0 {
                    return Err(CoreError::Config(format!(
                        "aggro min_aggro must be finite and >= 0, got {min_aggro}"
                    )));
                }
                Ok(())
            }
        }
    }
}

// ── EngineConfig ──────────────────────────────────────────────────────────────

/// Top-level engine configuration.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Milliseconds per tick handed to every `Agent::update`.  Default: 100.
    pub tick_millis: i64,

    /// Total ticks the host driver runs.  `0` means "until stopped".
    pub total_ticks: u64,

    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Worker thread count for the parallel zone tick.  `None` uses rayon's
    /// global pool (all logical cores).
    pub num_threads: Option<usize>,

    /// Record per-node status and timing for every agent.
    pub debug: bool,

    /// Decay applied to every new agent's aggro table.
    pub aggro_decay: AggroDecay,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_millis: 100,
            total_ticks: 0,
            seed:        0,
            num_threads: None,
            debug:       false,
            aggro_decay: AggroDecay::None,
        }
    }
}

impl EngineConfig {
    /// The per-tick delta.
    #[inline]
    pub fn tick(&self) -> Millis {
        Millis(self.tick_millis)
    }

    /// Reject configurations the driver cannot run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_millis <= 0 {
            return Err(CoreError::Config(format!(
                "tick_millis must be positive, got {}",
                self.tick_millis
            )));
        }
        if self.num_threads == Some(0) {
            return Err(CoreError::Config("num_threads must be at least 1".to_string()));
        }
        self.aggro_decay.validate()
    }
}
