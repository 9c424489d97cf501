//! Table entries and the ordering key behind them.

use std::cmp::Ordering;

use npc_core::CharacterId;

/// A snapshot of one aggro record.
///
/// Entries are plain values: holding one never borrows the table, so a query
/// made earlier in a tick stays valid after later decay or removal.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AggroEntry {
    pub target: CharacterId,
    /// Current (decayed-to-now) score.  Always strictly positive.
    pub aggro:  f64,
}

/// A stored score with a total order, so it can key a `BTreeSet`.
#[derive(Copy, Clone, Debug)]
pub(crate) struct Score(pub f64);

impl PartialEq for Score {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for Score {}

impl PartialOrd for Score {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Score {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
