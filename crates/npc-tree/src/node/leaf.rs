//! Leaf actions.

use std::panic::{AssertUnwindSafe, catch_unwind};

use npc_core::{Millis, TreeNodeStatus};
use tracing::info;

use crate::agent::Agent;
use crate::error::{NodeError, NodeResult};
use crate::node::{NodeBase, TreeNode};
use crate::steering::WeightedSteering;

// ── Timed nodes ───────────────────────────────────────────────────────────────

/// Hooks of a leaf that lasts a fixed amount of agent time.
///
/// The first tick calls `start`; while time remains each tick calls
/// `running`; the tick on which the time runs out calls `expired`.  The timer
/// is cleared whenever a hook returns anything but `Ok(RUNNING)`, so the next
/// tick starts over.
pub trait TimedNode: Send + Sync {
    fn start(&self, _agent: &mut Agent) -> NodeResult<TreeNodeStatus> {
        Ok(TreeNodeStatus::Running)
    }

    fn running(&self, _agent: &mut Agent) -> NodeResult<TreeNodeStatus> {
        Ok(TreeNodeStatus::Running)
    }

    fn expired(&self, _agent: &mut Agent) -> NodeResult<TreeNodeStatus> {
        Ok(TreeNodeStatus::Finished)
    }
}

/// Drives a [`TimedNode`] with a timer kept in the agent.
pub struct Timed<T> {
    base:   NodeBase,
    millis: Millis,
    body:   T,
}

impl<T: TimedNode> Timed<T> {
    pub fn new(base: NodeBase, millis: Millis, body: T) -> Self {
        Self { base, millis, body }
    }

    pub fn millis(&self) -> Millis {
        self.millis
    }

    fn step(&self, agent: &mut Agent, delta: Millis) -> NodeResult<TreeNodeStatus> {
        let id = self.base.id();
        let result = match agent.node_states().timer(id) {
            None if !self.millis.is_positive() => self.body.expired(agent),
            None => {
                agent.node_states_mut().set_timer(id, self.millis);
                self.body.start(agent)
            }
            Some(remaining) if (remaining - delta).is_positive() => {
                agent.node_states_mut().set_timer(id, remaining - delta);
                self.body.running(agent)
            }
            Some(_) => self.body.expired(agent),
        };
        if !matches!(result, Ok(TreeNodeStatus::Running)) {
            agent.node_states_mut().clear_timer(id);
        }
        result
    }
}

impl<T: TimedNode> TreeNode for Timed<T> {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let result = self.step(agent, delta);
        self.base.finish(agent, result)
    }
}

/// Does nothing for a while: RUNNING, then FINISHED.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Idle {
    pub const KIND: &'static str = "Idle";

    pub fn node(base: NodeBase, millis: Millis) -> Timed<Idle> {
        Timed::new(base, millis, Idle)
    }
}

impl TimedNode for Idle {}

// ── Steer ─────────────────────────────────────────────────────────────────────

/// Moves the character along the combined output of its steerings.
///
/// The direction is scaled by `speed * delta`, the character is moved and
/// turned, and the node FINISHES.  FAILED when no steering produced a move.
pub struct Steer {
    base:      NodeBase,
    steerings: WeightedSteering,
}

impl Steer {
    pub const KIND: &'static str = "Steer";

    pub fn new(base: NodeBase, steerings: WeightedSteering) -> Self {
        Self { base, steerings }
    }

    pub fn steerings(&self) -> &WeightedSteering {
        &self.steerings
    }
}

impl TreeNode for Steer {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let speed = agent.character().speed();
        let Some(mv) = self.steerings.execute(agent, speed) else {
            return self.base.record(agent, TreeNodeStatus::Failed);
        };
        let step = mv.direction * (speed * delta.as_secs_f32());
        if !step.is_finite() {
            return self.base.fault(agent, &NodeError::fault("steering produced a non-finite move"));
        }
        let character = agent.character();
        character.set_position(character.position() + step);
        character.set_orientation(mv.orientation);
        self.base.record(agent, TreeNodeStatus::Finished)
    }
}

// ── Print ─────────────────────────────────────────────────────────────────────

/// Logs its parameter string at info level and FINISHES.
pub struct Print {
    base: NodeBase,
}

impl Print {
    pub const KIND: &'static str = "Print";

    pub fn new(base: NodeBase) -> Self {
        Self { base }
    }
}

impl TreeNode for Print {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, _delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        info!(node = %self.base.name(), character = agent.id().0, "{}", self.base.parameters());
        self.base.record(agent, TreeNodeStatus::Finished)
    }
}

// ── Task ──────────────────────────────────────────────────────────────────────

pub type TaskFn = dyn Fn(&mut Agent, Millis) -> NodeResult<TreeNodeStatus> + Send + Sync;

/// A leaf whose body is a closure.
///
/// `Err` results and panics inside the closure both become EXCEPTION at this
/// node; neither leaves the tick.
pub struct Task {
    base: NodeBase,
    body: Box<TaskFn>,
}

impl Task {
    pub fn new<F>(base: NodeBase, body: F) -> Self
    where
        F: Fn(&mut Agent, Millis) -> NodeResult<TreeNodeStatus> + Send + Sync + 'static,
    {
        Self { base, body: Box::new(body) }
    }
}

impl TreeNode for Task {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let result = catch_unwind(AssertUnwindSafe(|| (self.body)(agent, delta)))
            .unwrap_or_else(|panic| Err(NodeError::Fault(panic_message(panic.as_ref()))));
        self.base.finish(agent, result)
    }
}

/// Best-effort text of a panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
