//! `AggroMgr`: ordered, decaying threat table.
//!
//! # Representation
//!
//! Every entry stores a score against a table-wide affine basis:
//!
//! ```text
//! effective = stored * scale - offset
//! ```
//!
//! Linear decay grows `offset`, exponential decay shrinks `scale` (and
//! `offset` with it).  Because the mapping is strictly increasing, ordering
//! entries by `stored` is the same as ordering them by their effective score,
//! so the `BTreeSet` never needs re-sorting after a decay pass.  Only the
//! lowest entries are inspected for removal.
//!
//! Ties on score are broken by insertion sequence: the earliest-inserted
//! target wins, which keeps target selection deterministic.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};

use npc_core::{AggroDecay, CharacterId, Millis};

use crate::entry::{AggroEntry, Score};

/// Rebase the stored values once the basis drifts this far from identity.
const MIN_SCALE:  f64 = 1e-6;
const MAX_OFFSET: f64 = 1e9;

type OrderKey = (Reverse<Score>, u64, CharacterId);

#[derive(Copy, Clone, Debug)]
struct Slot {
    stored: Score,
    seq:    u64,
}

impl Slot {
    #[inline]
    fn key(self, target: CharacterId) -> OrderKey {
        (Reverse(self.stored), self.seq, target)
    }
}

/// Per-agent mapping from target to a decaying, strictly positive score.
#[derive(Debug, Clone)]
pub struct AggroMgr {
    order:    BTreeSet<OrderKey>,
    slots:    HashMap<CharacterId, Slot>,
    scale:    f64,
    offset:   f64,
    next_seq: u64,
    decay:    AggroDecay,
}

impl Default for AggroMgr {
    fn default() -> Self {
        Self::new(AggroDecay::None)
    }
}

impl AggroMgr {
    pub fn new(decay: AggroDecay) -> Self {
        Self {
            order:    BTreeSet::new(),
            slots:    HashMap::new(),
            scale:    1.0,
            offset:   0.0,
            next_seq: 0,
            decay,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────

    #[inline]
    pub fn decay(&self) -> AggroDecay {
        self.decay
    }

    /// Change the decay mode.  Existing scores are kept as they are now.
    pub fn set_decay(&mut self, decay: AggroDecay) {
        self.decay = decay;
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Add `amount` to the score of `target`, inserting it if absent.
    ///
    /// Returns the resulting entry.  A negative `amount` lowers the score; if
    /// the result is not strictly positive the entry is removed and `None` is
    /// returned.  Inserting a new target with a non-positive or non-finite
    /// amount does nothing.
    pub fn add_aggro(&mut self, target: CharacterId, amount: f64) -> Option<AggroEntry> {
        if !amount.is_finite() {
            return self.entry(target);
        }

        let (aggro, seq) = match self.slots.get(&target).copied() {
            Some(slot) => {
                self.order.remove(&slot.key(target));
                (self.effective(slot.stored) + amount, slot.seq)
            }
            None => {
                if amount <= 0.0 {
                    return None;
                }
                let seq = self.next_seq;
                self.next_seq += 1;
                (amount, seq)
            }
        };

        if aggro <= 0.0 {
            self.slots.remove(&target);
            return None;
        }

        let slot = Slot { stored: self.to_stored(aggro), seq };
        self.order.insert(slot.key(target));
        self.slots.insert(target, slot);
        Some(AggroEntry { target, aggro })
    }

    /// Remove `target` from the table, returning its last entry.
    pub fn remove(&mut self, target: CharacterId) -> Option<AggroEntry> {
        let slot = self.slots.remove(&target)?;
        self.order.remove(&slot.key(target));
        Some(AggroEntry { target, aggro: self.effective(slot.stored) })
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.slots.clear();
        self.scale = 1.0;
        self.offset = 0.0;
    }

    /// Decay every entry by `delta` of elapsed time and drop the ones that
    /// reached the removal threshold.
    pub fn update(&mut self, delta: Millis) {
        if !delta.is_positive() || self.slots.is_empty() {
            return;
        }
        let secs = delta.as_secs_f64();
        let floor = match self.decay {
            AggroDecay::None => return,
            AggroDecay::ByValue { per_second } => {
                self.offset += per_second * secs;
                0.0
            }
            AggroDecay::ByRatio { per_second, min_aggro } => {
                let factor = (1.0 - per_second).max(0.0).powf(secs);
                self.scale *= factor;
                self.offset *= factor;
                min_aggro
            }
        };

        self.prune(floor);

        if self.slots.is_empty() {
            self.scale = 1.0;
            self.offset = 0.0;
        } else if self.scale < MIN_SCALE || self.offset.abs() > MAX_OFFSET {
            self.rebase();
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// The target with the maximum score; earliest-inserted wins ties.
    pub fn highest_entry(&self) -> Option<AggroEntry> {
        self.order.first().map(|&key| self.entry_for(key))
    }

    /// All entries, highest score first.
    pub fn entries(&self) -> impl Iterator<Item = AggroEntry> + '_ {
        self.order.iter().map(|&key| self.entry_for(key))
    }

    /// Entries whose score is strictly above `threshold`, highest first.
    pub fn entries_above(&self, threshold: f64) -> impl Iterator<Item = AggroEntry> + '_ {
        self.entries().take_while(move |e| e.aggro > threshold)
    }

    /// The current score of `target`.
    pub fn aggro_of(&self, target: CharacterId) -> Option<f64> {
        self.slots.get(&target).map(|slot| self.effective(slot.stored))
    }

    pub fn entry(&self, target: CharacterId) -> Option<AggroEntry> {
        self.aggro_of(target).map(|aggro| AggroEntry { target, aggro })
    }

    #[inline]
    pub fn contains(&self, target: CharacterId) -> bool {
        self.slots.contains_key(&target)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ── Internals ─────────────────────────────────────────────────────────

    #[inline]
    fn effective(&self, stored: Score) -> f64 {
        stored.0 * self.scale - self.offset
    }

    #[inline]
    fn to_stored(&self, aggro: f64) -> Score {
        Score((aggro + self.offset) / self.scale)
    }

    #[inline]
    fn entry_for(&self, (Reverse(stored), _, target): OrderKey) -> AggroEntry {
        AggroEntry { target, aggro: self.effective(stored) }
    }

    /// Remove entries from the low end while they sit at or below `floor`
    /// (or at or below zero).
    fn prune(&mut self, floor: f64) {
        while let Some(&key) = self.order.last() {
            let aggro = self.effective(key.0.0);
            if aggro > 0.0 && aggro >= floor {
                break;
            }
            self.order.pop_last();
            self.slots.remove(&key.2);
        }
    }

    /// Fold the basis back into the stored values.  Order and sequence
    /// numbers are unchanged.
    fn rebase(&mut self) {
        let entries: Vec<(CharacterId, Slot)> = self.slots.drain().collect();
        self.order.clear();
        for (target, slot) in entries {
            let aggro = self.effective(slot.stored);
            let rebased = Slot { stored: Score(aggro), seq: slot.seq };
            self.order.insert(rebased.key(target));
            self.slots.insert(target, rebased);
        }
        self.scale = 1.0;
        self.offset = 0.0;
    }
}
