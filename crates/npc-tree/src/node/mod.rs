//! The behaviour-tree node model.
//!
//! Nodes are immutable once wrapped in a [`Tree`] and may be shared by any
//! number of agents on any number of threads.  Per-agent execution state is
//! kept in the agent's [`NodeStates`](crate::state::NodeStates), keyed by the
//! node's [`NodeId`].
//!
//! # Execution contract
//!
//! Every `execute` implementation:
//!
//! 1. calls [`NodeBase::enter`]; on `Err(status)` it returns that status at
//!    once, without touching children or the character;
//! 2. runs its own logic;
//! 3. returns through [`NodeBase::record`], which stores the status and the
//!    agent time only while debugging is active.
//!
//! | Module        | Kinds                                                          |
//! |---------------|----------------------------------------------------------------|
//! | [`composite`] | `PrioritySelector`, `Sequence`, `Parallel`, `RandomSelector`, `ProbabilitySelector` |
//! | [`decorator`] | `Succeed`, `Fail`, `Invert`, `Limit`                           |
//! | [`leaf`]      | `Timed<T>` / `Idle`, `Steer`, `Print`, `Task`                  |

pub mod composite;
pub mod decorator;
pub mod leaf;

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use npc_core::{Millis, NodeId, TreeNodeStatus};
use tracing::{error, trace, warn};

use crate::agent::Agent;
use crate::condition::{ConditionPtr, True};
use crate::error::NodeError;
use crate::node::leaf::panic_message;

/// A shared, immutable behaviour tree (or subtree).
pub type Tree = Arc<dyn TreeNode>;

pub trait TreeNode: Send + Sync {
    fn base(&self) -> &NodeBase;

    /// Run this node for one tick.  Must be called by the owning composite
    /// (or the agent, for the root) only.
    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus;
}

impl fmt::Debug for dyn TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.base(), f)
    }
}

/// Wrap a finished node into a shareable [`Tree`].
pub trait IntoTree {
    fn into_tree(self) -> Tree;
}

impl<T: TreeNode + 'static> IntoTree for T {
    fn into_tree(self) -> Tree {
        Arc::new(self)
    }
}

// ── NodeBase ──────────────────────────────────────────────────────────────────

/// Identity, guard and children shared by every node kind.
#[derive(Clone)]
pub struct NodeBase {
    id:         NodeId,
    kind:       String,
    name:       String,
    parameters: String,
    condition:  ConditionPtr,
    children:   Vec<Tree>,
}

impl fmt::Debug for NodeBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("condition", &self.condition.describe())
            .field("children", &self.children)
            .finish()
    }
}

impl NodeBase {
    /// A fresh node identity with the `True` guard and no children.
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id:         NodeId::next(),
            kind:       kind.into(),
            name:       name.into(),
            parameters: String::new(),
            condition:  True::shared(),
            children:   Vec::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: impl Into<String>) -> Self {
        self.parameters = parameters.into();
        self
    }

    pub fn with_condition(mut self, condition: ConditionPtr) -> Self {
        self.condition = condition;
        self
    }

    pub fn with_child(mut self, child: Tree) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Tree>) -> Self {
        self.children.extend(children);
        self
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Registered type name, e.g. `PrioritySelector`.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw parameter string the node was built from (may be empty).
    #[inline]
    pub fn parameters(&self) -> &str {
        &self.parameters
    }

    #[inline]
    pub fn condition(&self) -> &ConditionPtr {
        &self.condition
    }

    #[inline]
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    // ── Execution helpers ─────────────────────────────────────────────────

    /// Evaluate the guard.  On `Err` the outcome is already recorded and the
    /// caller must return that status without further work: `CANNOT_EXECUTE`
    /// for a rejection, `EXCEPTION` if the guard panicked.
    pub fn enter(&self, agent: &mut Agent) -> Result<(), TreeNodeStatus> {
        match catch_unwind(AssertUnwindSafe(|| self.condition.evaluate(agent))) {
            Ok(true) => Ok(()),
            Ok(false) => Err(self.record(agent, TreeNodeStatus::CannotExecute)),
            Err(panic) => {
                let err = NodeError::Fault(panic_message(panic.as_ref()));
                Err(self.fault(agent, &err))
            }
        }
    }

    /// Record `status` for this node (debugging only) and return it.
    pub fn record(&self, agent: &mut Agent, status: TreeNodeStatus) -> TreeNodeStatus {
        trace!(
            node = %self.name,
            node_id = self.id.0,
            character = agent.id().0,
            status = status.as_str(),
            "node executed"
        );
        if agent.is_debugging_active() {
            let now = agent.time();
            agent.node_states_mut().record(self.id, status, now);
        }
        status
    }

    /// Convert an internal fault into `EXCEPTION`.
    pub fn fault(&self, agent: &mut Agent, err: &NodeError) -> TreeNodeStatus {
        error!(
            node = %self.name,
            node_id = self.id.0,
            character = agent.id().0,
            error = %err,
            "node fault"
        );
        self.record(agent, TreeNodeStatus::Exception)
    }

    /// Finish a fallible leaf body: `Ok` is recorded, `Err` becomes `EXCEPTION`.
    pub fn finish(&self, agent: &mut Agent, result: Result<TreeNodeStatus, NodeError>) -> TreeNodeStatus {
        match result {
            Ok(status) => self.record(agent, status),
            Err(err) => self.fault(agent, &err),
        }
    }

    /// Degrade a node whose child count does not fit its kind.
    pub fn misconfigured(&self, agent: &mut Agent, expected: &str) -> TreeNodeStatus {
        warn!(
            node = %self.name,
            node_id = self.id.0,
            kind = %self.kind,
            children = self.children.len(),
            expected,
            "node misconfigured"
        );
        self.record(agent, TreeNodeStatus::CannotExecute)
    }

    /// The only child of a decorator, or `None` if there is not exactly one.
    pub fn single_child(&self) -> Option<&Tree> {
        match self.children.as_slice() {
            [child] => Some(child),
            _ => None,
        }
    }
}

// ── Tree walking ──────────────────────────────────────────────────────────────

/// Visit `tree` and all descendants, depth first, parents before children.
pub fn walk(tree: &Tree, visit: &mut impl FnMut(&Tree)) {
    visit(tree);
    for child in tree.base().children() {
        walk(child, visit);
    }
}

/// Ids of every node in `tree`.
pub fn node_ids(tree: &Tree) -> Vec<NodeId> {
    let mut ids = Vec::new();
    walk(tree, &mut |node| ids.push(node.base().id()));
    ids
}

/// Find a node by name (first match, depth first).
pub fn find_by_name(tree: &Tree, name: &str) -> Option<Tree> {
    let mut found = None;
    walk(tree, &mut |node| {
        if found.is_none() && node.base().name() == name {
            found = Some(Arc::clone(node));
        }
    });
    found
}
