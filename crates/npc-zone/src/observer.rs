//! Zone observer trait for progress reporting and data collection.

use npc_core::CharacterId;

use crate::{AgentOutcome, ZoneTickReport};

/// Callbacks invoked by [`Zone::update_with`][crate::Zone::update_with].
///
/// All methods have default no-op implementations.  Per-agent callbacks run
/// after every agent has ticked, in ascending id order, even when the tick
/// itself ran in parallel.
///
/// # Example: fault logger
///
/// ```rust,ignore
/// struct Faults(Vec<CharacterId>);
///
/// impl ZoneObserver for Faults {
///     fn on_agent_status(&mut self, _tick: u64, id: CharacterId, outcome: AgentOutcome) {
///         if outcome == AgentOutcome::Faulted {
///             self.0.push(id);
///         }
///     }
/// }
/// ```
pub trait ZoneObserver {
    /// Called before any agent of the zone ticks.
    fn on_tick_start(&mut self, _tick: u64) {}

    /// Called once per agent with the outcome of its tick.
    fn on_agent_status(&mut self, _tick: u64, _id: CharacterId, _outcome: AgentOutcome) {}

    /// Called after every agent has ticked.
    fn on_tick_end(&mut self, _tick: u64, _report: &ZoneTickReport) {}
}

/// A [`ZoneObserver`] that does nothing.
pub struct NoopObserver;

impl ZoneObserver for NoopObserver {}
