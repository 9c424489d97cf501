//! Composite nodes: selection policies over one or more children.
//!
//! A composite whose child returns RUNNING stores that child's index in the
//! agent's selector map and resumes there on the next tick.  Any other
//! outcome clears the index.

use npc_core::{Millis, TreeNodeStatus};

use crate::agent::Agent;
use crate::node::{NodeBase, Tree, TreeNode};

fn resume_index(agent: &Agent, base: &NodeBase) -> usize {
    agent
        .node_states()
        .selector_index(base.id())
        .filter(|&index| index < base.children().len())
        .unwrap_or(0)
}

fn remember(agent: &mut Agent, base: &NodeBase, index: usize, status: TreeNodeStatus) {
    let states = agent.node_states_mut();
    if status.is_running() {
        states.set_selector_index(base.id(), index);
    } else {
        states.clear_selector_index(base.id());
    }
}

// ── PrioritySelector ──────────────────────────────────────────────────────────

/// Tries children in order and returns the first status that is neither
/// FAILED nor CANNOT_EXECUTE.
///
/// A RUNNING child is resumed directly on the next tick; the children before
/// it are not re-evaluated.  If the resumed child is rejected, the scan goes
/// on with the children after it.  FAILED when every child is rejected.
pub struct PrioritySelector {
    base: NodeBase,
}

impl PrioritySelector {
    pub const KIND: &'static str = "PrioritySelector";

    pub fn new(base: NodeBase) -> Self {
        Self { base }
    }
}

impl TreeNode for PrioritySelector {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let children = self.base.children();
        if children.is_empty() {
            return self.base.misconfigured(agent, "at least one child");
        }

        let start = resume_index(agent, &self.base);
        for (index, child) in children.iter().enumerate().skip(start) {
            let status = child.execute(agent, delta);
            if status.is_rejected() {
                continue;
            }
            remember(agent, &self.base, index, status);
            return self.base.record(agent, status);
        }
        agent.node_states_mut().clear_selector_index(self.base.id());
        self.base.record(agent, TreeNodeStatus::Failed)
    }
}

// ── Sequence ──────────────────────────────────────────────────────────────────

/// Runs children in order while they FINISH.  The first child that does not
/// FINISH decides the result; a RUNNING child is resumed next tick.
pub struct Sequence {
    base: NodeBase,
}

impl Sequence {
    pub const KIND: &'static str = "Sequence";

    pub fn new(base: NodeBase) -> Self {
        Self { base }
    }
}

impl TreeNode for Sequence {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let children = self.base.children();
        if children.is_empty() {
            return self.base.misconfigured(agent, "at least one child");
        }

        let start = resume_index(agent, &self.base);
        for (index, child) in children.iter().enumerate().skip(start) {
            let status = child.execute(agent, delta);
            if status == TreeNodeStatus::Finished {
                continue;
            }
            remember(agent, &self.base, index, status);
            return self.base.record(agent, status);
        }
        agent.node_states_mut().clear_selector_index(self.base.id());
        self.base.record(agent, TreeNodeStatus::Finished)
    }
}

// ── Parallel ──────────────────────────────────────────────────────────────────

/// Executes every child each tick.  RUNNING while any child is RUNNING,
/// FINISHED otherwise.
pub struct Parallel {
    base: NodeBase,
}

impl Parallel {
    pub const KIND: &'static str = "Parallel";

    pub fn new(base: NodeBase) -> Self {
        Self { base }
    }
}

impl TreeNode for Parallel {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let children = self.base.children();
        if children.is_empty() {
            return self.base.misconfigured(agent, "at least one child");
        }

        let mut running = false;
        for child in children {
            running |= child.execute(agent, delta).is_running();
        }
        let status = if running { TreeNodeStatus::Running } else { TreeNodeStatus::Finished };
        self.base.record(agent, status)
    }
}

// ── Random selectors ──────────────────────────────────────────────────────────

fn run_picked(
    base:   &NodeBase,
    agent:  &mut Agent,
    delta:  Millis,
    pick:   impl FnOnce(&mut Agent) -> Option<usize>,
) -> TreeNodeStatus {
    let children: &[Tree] = base.children();
    let index = match agent.node_states().selector_index(base.id()) {
        Some(index) if index < children.len() => Some(index),
        _ => pick(agent),
    };
    let Some(index) = index else {
        agent.node_states_mut().clear_selector_index(base.id());
        return base.record(agent, TreeNodeStatus::Failed);
    };
    let status = children[index].execute(agent, delta);
    remember(agent, base, index, status);
    base.record(agent, status)
}

/// Picks one child uniformly at random and returns its status.  A RUNNING
/// child stays picked until it stops running.
pub struct RandomSelector {
    base: NodeBase,
}

impl RandomSelector {
    pub const KIND: &'static str = "RandomSelector";

    pub fn new(base: NodeBase) -> Self {
        Self { base }
    }
}

impl TreeNode for RandomSelector {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let len = self.base.children().len();
        if len == 0 {
            return self.base.misconfigured(agent, "at least one child");
        }
        run_picked(&self.base, agent, delta, |agent| agent.rng().index(len))
    }
}

/// Like [`RandomSelector`], with one weight per child.
pub struct ProbabilitySelector {
    base:    NodeBase,
    weights: Vec<f32>,
}

impl ProbabilitySelector {
    pub const KIND: &'static str = "ProbabilitySelector";

    /// `weights[i]` belongs to child `i`.  An empty list weighs every child
    /// equally.
    pub fn new(base: NodeBase, weights: Vec<f32>) -> Self {
        let weights = if weights.is_empty() { vec![1.0; base.children().len()] } else { weights };
        Self { base, weights }
    }

    pub fn weights(&self) -> &[f32] {
        &self.weights
    }
}

impl TreeNode for ProbabilitySelector {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let len = self.base.children().len();
        if len == 0 || self.weights.len() != len {
            return self.base.misconfigured(agent, "one weight per child");
        }
        run_picked(&self.base, agent, delta, |agent| agent.rng().weighted_index(&self.weights))
    }
}
