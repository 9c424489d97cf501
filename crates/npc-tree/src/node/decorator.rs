//! Decorators: exactly one child whose status is transformed.
//!
//! | Kind      | Child status                 | Result            |
//! |-----------|------------------------------|-------------------|
//! | `Succeed` | RUNNING                      | RUNNING           |
//! |           | anything else                | FINISHED          |
//! | `Fail`    | RUNNING                      | RUNNING           |
//! |           | anything else                | FAILED            |
//! | `Invert`  | FINISHED / FAILED            | FAILED / FINISHED |
//! |           | CANNOT_EXECUTE               | FINISHED          |
//! |           | RUNNING / EXCEPTION          | unchanged         |
//! | `Limit`   | child's own, until `n` completions; then FINISHED without running it |

use npc_core::{Millis, TreeNodeStatus};

use crate::agent::Agent;
use crate::node::{NodeBase, TreeNode};

macro_rules! mapping_decorator {
    ($(#[$attr:meta])* $name:ident, $kind:literal, |$status:ident| $map:expr) => {
        $(#[$attr])*
        pub struct $name {
            base: NodeBase,
        }

        impl $name {
            pub const KIND: &'static str = $kind;

            pub fn new(base: NodeBase) -> Self {
                Self { base }
            }

            /// The status this decorator reports for a child status.
            pub fn map(status: TreeNodeStatus) -> TreeNodeStatus {
                let $status = status;
                $map
            }
        }

        impl TreeNode for $name {
            fn base(&self) -> &NodeBase {
                &self.base
            }

            fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
                if let Err(status) = self.base.enter(agent) {
                    return status;
                }
                let Some(child) = self.base.single_child() else {
                    return self.base.misconfigured(agent, "exactly one child");
                };
                let status = child.execute(agent, delta);
                self.base.record(agent, Self::map(status))
            }
        }
    };
}

mapping_decorator! {
    /// Suppresses failure: RUNNING passes through, everything else FINISHES.
    Succeed, "Succeed", |status| match status {
        TreeNodeStatus::Running => TreeNodeStatus::Running,
        _ => TreeNodeStatus::Finished,
    }
}

mapping_decorator! {
    /// RUNNING passes through, everything else FAILS.
    Fail, "Fail", |status| match status {
        TreeNodeStatus::Running => TreeNodeStatus::Running,
        _ => TreeNodeStatus::Failed,
    }
}

mapping_decorator! {
    Invert, "Invert", |status| match status {
        TreeNodeStatus::Finished => TreeNodeStatus::Failed,
        TreeNodeStatus::Failed | TreeNodeStatus::CannotExecute => TreeNodeStatus::Finished,
        other => other,
    }
}

// ── Limit ─────────────────────────────────────────────────────────────────────

/// Lets its child complete at most `amount` times per behaviour assignment.
///
/// A completion is any child status other than RUNNING.  Once the budget is
/// used up the child is no longer executed and the node reports FINISHED.
pub struct Limit {
    base:   NodeBase,
    amount: u32,
}

impl Limit {
    pub const KIND: &'static str = "Limit";

    pub fn new(base: NodeBase, amount: u32) -> Self {
        Self { base, amount }
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }
}

impl TreeNode for Limit {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let Some(child) = self.base.single_child() else {
            return self.base.misconfigured(agent, "exactly one child");
        };
        let id = self.base.id();
        if agent.node_states().limit_count(id) >= self.amount {
            return self.base.record(agent, TreeNodeStatus::Finished);
        }
        let status = child.execute(agent, delta);
        if !status.is_running() {
            agent.node_states_mut().increment_limit(id);
        }
        self.base.record(agent, status)
    }
}
