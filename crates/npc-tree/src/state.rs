//! `NodeStates`: everything a tree needs to remember about one agent.
//!
//! Trees are shared between agents and never mutated, so every piece of
//! resumable execution state lives here, keyed by [`NodeId`].
//!
//! | Map           | Written by                         | Debug only |
//! |---------------|------------------------------------|------------|
//! | `last_status` | every node, on return              | yes        |
//! | `last_exec`   | every node, on return              | yes        |
//! | `selector`    | composites with a RUNNING child    | no         |
//! | `timers`      | timed leaves                       | no         |
//! | `limits`      | `Limit` decorators                 | no         |
//!
//! All maps are cleared together when the agent's behaviour is replaced.

use npc_core::{Millis, NodeId, TreeNodeStatus};

#[cfg(feature = "fx-hash")]
type StateMap<V> = rustc_hash::FxHashMap<NodeId, V>;
#[cfg(not(feature = "fx-hash"))]
type StateMap<V> = std::collections::HashMap<NodeId, V>;

#[derive(Debug, Default, Clone)]
pub struct NodeStates {
    last_status: StateMap<TreeNodeStatus>,
    last_exec:   StateMap<Millis>,
    selector:    StateMap<usize>,
    timers:      StateMap<Millis>,
    limits:      StateMap<u32>,
}

impl NodeStates {
    // ── Debug records ─────────────────────────────────────────────────────

    /// Status `node` returned the last time it ran with debugging active.
    pub fn last_status(&self, node: NodeId) -> Option<TreeNodeStatus> {
        self.last_status.get(&node).copied()
    }

    /// Agent time at which `node` last returned with debugging active.
    pub fn last_exec_millis(&self, node: NodeId) -> Option<Millis> {
        self.last_exec.get(&node).copied()
    }

    /// `true` if no debug record exists.
    pub fn debug_is_empty(&self) -> bool {
        self.last_status.is_empty() && self.last_exec.is_empty()
    }

    pub fn recorded_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.last_status.keys().copied()
    }

    /// Drop every debug record, leaving resumption state untouched.
    pub fn clear_debug(&mut self) {
        self.last_status.clear();
        self.last_exec.clear();
    }

    pub(crate) fn record(&mut self, node: NodeId, status: TreeNodeStatus, now: Millis) {
        self.last_status.insert(node, status);
        self.last_exec.insert(node, now);
    }

    // ── Resumption ────────────────────────────────────────────────────────

    /// Index of the child a composite resumes at, if one is RUNNING.
    pub fn selector_index(&self, node: NodeId) -> Option<usize> {
        self.selector.get(&node).copied()
    }

    pub fn set_selector_index(&mut self, node: NodeId, index: usize) {
        self.selector.insert(node, index);
    }

    pub fn clear_selector_index(&mut self, node: NodeId) {
        self.selector.remove(&node);
    }

    /// Remaining time of a started timed node.
    pub fn timer(&self, node: NodeId) -> Option<Millis> {
        self.timers.get(&node).copied()
    }

    pub fn set_timer(&mut self, node: NodeId, remaining: Millis) {
        self.timers.insert(node, remaining);
    }

    pub fn clear_timer(&mut self, node: NodeId) {
        self.timers.remove(&node);
    }

    /// How often a `Limit` node has let its child complete.
    pub fn limit_count(&self, node: NodeId) -> u32 {
        self.limits.get(&node).copied().unwrap_or(0)
    }

    pub fn increment_limit(&mut self, node: NodeId) -> u32 {
        let count = self.limits.entry(node).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }

    // ── Whole-table operations ────────────────────────────────────────────

    /// `true` if no state of any kind is held.
    pub fn is_empty(&self) -> bool {
        self.debug_is_empty()
            && self.selector.is_empty()
            && self.timers.is_empty()
            && self.limits.is_empty()
    }

    /// Whether any map holds an entry for `node`.
    pub fn references(&self, node: NodeId) -> bool {
        self.last_status.contains_key(&node)
            || self.last_exec.contains_key(&node)
            || self.selector.contains_key(&node)
            || self.timers.contains_key(&node)
            || self.limits.contains_key(&node)
    }

    pub fn clear(&mut self) {
        self.last_status.clear();
        self.last_exec.clear();
        self.selector.clear();
        self.timers.clear();
        self.limits.clear();
    }
}
