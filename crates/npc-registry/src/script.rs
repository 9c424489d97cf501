//! Adapters for behaviour supplied by an embedded scripting host.
//!
//! The host registers a closure per type name; every instance built from
//! that name calls it.  Scripts see the agent only through a
//! [`ScriptContext`] and run under `catch_unwind`:
//!
//! | Adapter          | Script signature                               | On panic                   |
//! |------------------|------------------------------------------------|----------------------------|
//! | `ScriptNode`     | `(ctx, delta) -> NodeResult<TreeNodeStatus>`   | EXCEPTION                  |
//! | `ScriptCondition`| `(ctx) -> bool`                                | `false`                    |
//! | `ScriptFilter`   | `(ctx)`, edits `ctx.filtered_entities_mut()`   | candidate list left as is  |
//! | `ScriptSteering` | `(ctx, speed) -> Option<MoveVector>`           | `None`                     |

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::error;

use npc_aggro::{AggroEntry, AggroMgr};
use npc_core::{AgentRng, Character, CharacterId, Millis, MoveVector, TreeNodeStatus};
use npc_tree::node::leaf::panic_message;
use npc_tree::{
    Agent, Condition, ConditionPtr, Filter, FilterPtr, IntoTree, NodeBase, NodeError, NodeResult, Steering,
    SteeringPtr, TreeNode,
};
use npc_world::ZoneInfo;

use crate::error::RegistryResult;
use crate::registry::AIRegistry;

pub type NodeScript      = dyn Fn(&mut ScriptContext<'_>, Millis) -> NodeResult<TreeNodeStatus> + Send + Sync;
pub type ConditionScript = dyn Fn(&mut ScriptContext<'_>) -> bool + Send + Sync;
pub type FilterScript    = dyn Fn(&mut ScriptContext<'_>) + Send + Sync;
pub type SteeringScript  = dyn Fn(&mut ScriptContext<'_>, f32) -> Option<MoveVector> + Send + Sync;

// ── ScriptContext ─────────────────────────────────────────────────────────────

/// What a script may see and change of the agent it runs for.
pub struct ScriptContext<'a> {
    agent:      &'a mut Agent,
    parameters: &'a str,
}

impl<'a> ScriptContext<'a> {
    pub fn new(agent: &'a mut Agent, parameters: &'a str) -> Self {
        Self { agent, parameters }
    }

    pub fn id(&self) -> CharacterId {
        self.agent.id()
    }

    /// Agent time.
    pub fn time(&self) -> Millis {
        self.agent.time()
    }

    /// Parameter text of the instance being run.
    pub fn parameters(&self) -> &str {
        self.parameters
    }

    pub fn character(&self) -> &Arc<dyn Character> {
        self.agent.character()
    }

    pub fn aggro(&self) -> &AggroMgr {
        self.agent.aggro()
    }

    pub fn add_aggro(&mut self, target: CharacterId, amount: f64) -> Option<AggroEntry> {
        self.agent.aggro_mut().add_aggro(target, amount)
    }

    pub fn zone(&self) -> Option<Arc<ZoneInfo>> {
        self.agent.zone()
    }

    pub fn filtered_entities(&self) -> &[CharacterId] {
        self.agent.filtered_entities()
    }

    pub fn filtered_entities_mut(&mut self) -> &mut Vec<CharacterId> {
        self.agent.filtered_entities_mut()
    }

    pub fn rng(&mut self) -> &mut AgentRng {
        self.agent.rng()
    }
}

fn log_panic(kind: &str, name: &str, agent: &Agent, message: &str) {
    error!(kind, name, character = agent.id().0, error = message, "script panicked");
}

// ── ScriptNode ────────────────────────────────────────────────────────────────

pub struct ScriptNode {
    base:   NodeBase,
    script: Arc<NodeScript>,
}

impl ScriptNode {
    pub fn new(base: NodeBase, script: Arc<NodeScript>) -> Self {
        Self { base, script }
    }
}

impl TreeNode for ScriptNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, agent: &mut Agent, delta: Millis) -> TreeNodeStatus {
        if let Err(status) = self.base.enter(agent) {
            return status;
        }
        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = ScriptContext::new(agent, self.base.parameters());
            (self.script)(&mut ctx, delta)
        }))
        .unwrap_or_else(|panic| Err(NodeError::Fault(panic_message(panic.as_ref()))));
        self.base.finish(agent, result)
    }
}

// ── ScriptCondition ───────────────────────────────────────────────────────────

pub struct ScriptCondition {
    name:       String,
    parameters: String,
    script:     Arc<ConditionScript>,
}

impl ScriptCondition {
    pub fn new(name: impl Into<String>, parameters: impl Into<String>, script: Arc<ConditionScript>) -> Self {
        Self { name: name.into(), parameters: parameters.into(), script }
    }
}

impl Condition for ScriptCondition {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = ScriptContext::new(agent, &self.parameters);
            (self.script)(&mut ctx)
        }));
        outcome.unwrap_or_else(|panic| {
            log_panic("condition", &self.name, agent, &panic_message(panic.as_ref()));
            false
        })
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> String {
        self.parameters.clone()
    }
}

// ── ScriptFilter ──────────────────────────────────────────────────────────────

pub struct ScriptFilter {
    name:       String,
    parameters: String,
    script:     Arc<FilterScript>,
}

impl ScriptFilter {
    pub fn new(name: impl Into<String>, parameters: impl Into<String>, script: Arc<FilterScript>) -> Self {
        Self { name: name.into(), parameters: parameters.into(), script }
    }
}

impl Filter for ScriptFilter {
    fn filter(&self, agent: &mut Agent) {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = ScriptContext::new(agent, &self.parameters);
            (self.script)(&mut ctx)
        }));
        if let Err(panic) = outcome {
            log_panic("filter", &self.name, agent, &panic_message(panic.as_ref()));
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> String {
        self.parameters.clone()
    }
}

// ── ScriptSteering ────────────────────────────────────────────────────────────

pub struct ScriptSteering {
    name:       String,
    parameters: String,
    script:     Arc<SteeringScript>,
}

impl ScriptSteering {
    pub fn new(name: impl Into<String>, parameters: impl Into<String>, script: Arc<SteeringScript>) -> Self {
        Self { name: name.into(), parameters: parameters.into(), script }
    }
}

impl Steering for ScriptSteering {
    fn execute(&self, agent: &mut Agent, speed: f32) -> Option<MoveVector> {
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut ctx = ScriptContext::new(agent, &self.parameters);
            (self.script)(&mut ctx, speed)
        }));
        outcome.unwrap_or_else(|panic| {
            log_panic("steering", &self.name, agent, &panic_message(panic.as_ref()));
            None
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

// ── Registration ──────────────────────────────────────────────────────────────

impl AIRegistry {
    /// Register a script as node type `type_name`.
    pub fn register_script_node<F>(&self, type_name: &str, script: F) -> RegistryResult<()>
    where
        F: Fn(&mut ScriptContext<'_>, Millis) -> NodeResult<TreeNodeStatus> + Send + Sync + 'static,
    {
        let script: Arc<NodeScript> = Arc::new(script);
        let kind = type_name.to_string();
        self.register_node_factory(type_name, move |ctx| {
            Ok(ScriptNode::new(ctx.base(&kind), Arc::clone(&script)).into_tree())
        })
    }

    pub fn register_script_condition<F>(&self, type_name: &str, script: F) -> RegistryResult<()>
    where
        F: Fn(&mut ScriptContext<'_>) -> bool + Send + Sync + 'static,
    {
        let script: Arc<ConditionScript> = Arc::new(script);
        let name = type_name.to_string();
        self.register_condition_factory(type_name, move |ctx| {
            let condition = ScriptCondition::new(name.as_str(), ctx.parameters.as_str(), Arc::clone(&script));
            Ok(Arc::new(condition) as ConditionPtr)
        })
    }

    pub fn register_script_filter<F>(&self, type_name: &str, script: F) -> RegistryResult<()>
    where
        F: Fn(&mut ScriptContext<'_>) + Send + Sync + 'static,
    {
        let script: Arc<FilterScript> = Arc::new(script);
        let name = type_name.to_string();
        self.register_filter_factory(type_name, move |ctx| {
            let filter = ScriptFilter::new(name.as_str(), ctx.parameters.as_str(), Arc::clone(&script));
            Ok(Arc::new(filter) as FilterPtr)
        })
    }

    pub fn register_script_steering<F>(&self, type_name: &str, script: F) -> RegistryResult<()>
    where
        F: Fn(&mut ScriptContext<'_>, f32) -> Option<MoveVector> + Send + Sync + 'static,
    {
        let script: Arc<SteeringScript> = Arc::new(script);
        let name = type_name.to_string();
        self.register_steering_factory(type_name, move |ctx| {
            let steering = ScriptSteering::new(name.as_str(), ctx.parameters.as_str(), Arc::clone(&script));
            Ok(Arc::new(steering) as SteeringPtr)
        })
    }
}
