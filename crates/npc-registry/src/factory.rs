//! Factory signatures and the contexts handed to them.
//!
//! A factory turns a context (instance name, raw parameter text, already
//! built children) into a shared, immutable object.  Factories validate
//! their inputs and report problems as [`RegistryError`]s; nothing they
//! build is checked again at tick time.

use std::sync::Arc;

use npc_tree::condition::True;
use npc_tree::{ConditionPtr, FilterPtr, NodeBase, SteeringPtr, Tree};

use crate::error::{RegistryError, RegistryResult};

pub type NodeFactory      = Arc<dyn Fn(&NodeFactoryContext) -> RegistryResult<Tree> + Send + Sync>;
pub type ConditionFactory = Arc<dyn Fn(&ConditionFactoryContext) -> RegistryResult<ConditionPtr> + Send + Sync>;
pub type FilterFactory    = Arc<dyn Fn(&FilterFactoryContext) -> RegistryResult<FilterPtr> + Send + Sync>;
pub type SteeringFactory  = Arc<dyn Fn(&SteeringFactoryContext) -> RegistryResult<SteeringPtr> + Send + Sync>;

// ── Nodes ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct NodeFactoryContext {
    /// Instance name, e.g. `"flee when hurt"`.
    pub name:       String,
    pub parameters: String,
    pub condition:  ConditionPtr,
    pub children:   Vec<Tree>,
    /// Arguments of a node-type expression such as `Steer(SelectionSeek,Wander{0.5})`.
    pub steerings:  Vec<SteeringPtr>,
}

impl NodeFactoryContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            parameters: String::new(),
            condition:  True::shared(),
            children:   Vec::new(),
            steerings:  Vec::new(),
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

    pub fn with_children(mut self, children: Vec<Tree>) -> Self {
        self.children = children;
        self
    }

    pub fn with_steerings(mut self, steerings: Vec<SteeringPtr>) -> Self {
        self.steerings = steerings;
        self
    }

    /// The `NodeBase` a factory for node type `kind` builds on.
    pub fn base(&self, kind: &str) -> NodeBase {
        NodeBase::new(kind, self.name.as_str())
            .with_parameters(self.parameters.as_str())
            .with_condition(Arc::clone(&self.condition))
            .with_children(self.children.iter().cloned())
    }

    pub(crate) fn expect_children(&self, kind: &str, arity: Arity) -> RegistryResult<()> {
        arity.check(kind, self.children.len())
    }
}

// ── Conditions ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct ConditionFactoryContext {
    pub parameters: String,
    pub children:   Vec<ConditionPtr>,
    /// Only the `Filter` condition takes filters.
    pub filters:    Vec<FilterPtr>,
}

impl ConditionFactoryContext {
    pub fn new(parameters: impl Into<String>) -> Self {
        Self { parameters: parameters.into(), ..Self::default() }
    }

    pub fn with_children(mut self, children: Vec<ConditionPtr>) -> Self {
        self.children = children;
        self
    }

    pub fn with_filters(mut self, filters: Vec<FilterPtr>) -> Self {
        self.filters = filters;
        self
    }
}

// ── Filters ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FilterFactoryContext {
    pub parameters: String,
    pub children:   Vec<FilterPtr>,
}

impl FilterFactoryContext {
    pub fn new(parameters: impl Into<String>) -> Self {
        Self { parameters: parameters.into(), children: Vec::new() }
    }

    pub fn with_children(mut self, children: Vec<FilterPtr>) -> Self {
        self.children = children;
        self
    }
}

// ── Steerings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct SteeringFactoryContext {
    pub parameters: String,
}

impl SteeringFactoryContext {
    pub fn new(parameters: impl Into<String>) -> Self {
        Self { parameters: parameters.into() }
    }
}

// ── Arity ─────────────────────────────────────────────────────────────────────

/// Child count a built-in type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arity {
    None,
    One,
    AtLeastOne,
}

impl Arity {
    pub(crate) fn check(self, kind: &str, found: usize) -> RegistryResult<()> {
        let (ok, expected) = match self {
            Arity::None       => (found == 0, "no"),
            Arity::One        => (found == 1, "exactly one"),
            Arity::AtLeastOne => (found >= 1, "at least one"),
        };
        if ok {
            Ok(())
        } else {
            Err(RegistryError::ChildCount { name: kind.to_string(), expected, found })
        }
    }
}
