//! Per-tick outcome of a zone update.

use std::collections::HashMap;

use npc_core::TreeNodeStatus;

/// What happened to one agent during a zone tick.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AgentOutcome {
    /// The root node ran and returned this status.
    Executed(TreeNodeStatus),
    /// The agent is paused; its tree did not run.
    Paused,
    /// The tick panicked outside node evaluation and was contained.
    Faulted,
}

/// Counts gathered over one [`Zone::update`][crate::Zone::update], or
/// summed over several with [`ZoneTickReport::merge`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneTickReport {
    pub executed: usize,
    pub paused:   usize,
    pub faulted:  usize,
    /// Root status → number of agents that returned it.
    pub statuses: HashMap<TreeNodeStatus, usize>,
}

impl ZoneTickReport {
    pub fn record(&mut self, outcome: AgentOutcome) {
        match outcome {
            AgentOutcome::Executed(status) => {
                self.executed += 1;
                *self.statuses.entry(status).or_insert(0) += 1;
            }
            AgentOutcome::Paused => self.paused += 1,
            AgentOutcome::Faulted => self.faulted += 1,
        }
    }

    /// Agents whose root returned `status`.
    pub fn count(&self, status: TreeNodeStatus) -> usize {
        self.statuses.get(&status).copied().unwrap_or(0)
    }

    /// Agents visited, whatever the outcome.
    pub fn total(&self) -> usize {
        self.executed + self.paused + self.faulted
    }

    pub fn merge(&mut self, other: &ZoneTickReport) {
        self.executed += other.executed;
        self.paused += other.paused;
        self.faulted += other.faulted;
        for (&status, &n) in &other.statuses {
            *self.statuses.entry(status).or_insert(0) += n;
        }
    }
}
