//! `AIRegistry`: type name → factory, for nodes, conditions, filters and
//! steerings.
//!
//! # Architecture
//!
//! ```text
//! AIRegistry
//! ├── nodes:      RwLock<BTreeMap<String, NodeFactory>>
//! ├── conditions: RwLock<BTreeMap<String, ConditionFactory>>
//! ├── filters:    RwLock<BTreeMap<String, FilterFactory>>
//! └── steerings:  RwLock<BTreeMap<String, SteeringFactory>>
//! ```
//!
//! Registration takes the write lock; lookups take the read lock only long
//! enough to clone the factory `Arc`, so a factory may itself call back into
//! the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use npc_tree::{ConditionPtr, FilterPtr, SteeringPtr, Tree};

use crate::builtins;
use crate::error::{FactoryKind, RegistryError, RegistryResult};
use crate::factory::{
    ConditionFactory, ConditionFactoryContext, FilterFactory, FilterFactoryContext, NodeFactory,
    NodeFactoryContext, SteeringFactory, SteeringFactoryContext,
};

// ── FactoryMap ────────────────────────────────────────────────────────────────

struct FactoryMap<F> {
    kind: FactoryKind,
    map:  RwLock<BTreeMap<String, F>>,
}

impl<F: Clone> FactoryMap<F> {
    fn new(kind: FactoryKind) -> Self {
        Self { kind, map: RwLock::new(BTreeMap::new()) }
    }

    fn insert(&self, name: &str, factory: F) -> RegistryResult<()> {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        if map.contains_key(name) {
            return Err(RegistryError::Duplicate { kind: self.kind, name: name.to_string() });
        }
        map.insert(name.to_string(), factory);
        debug!(kind = %self.kind, name, "factory registered");
        Ok(())
    }

    fn remove(&self, name: &str) -> bool {
        let removed = self.map.write().unwrap_or_else(PoisonError::into_inner).remove(name).is_some();
        if removed {
            debug!(kind = %self.kind, name, "factory unregistered");
        }
        removed
    }

    fn get(&self, name: &str) -> RegistryResult<F> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::Unknown { kind: self.kind, name: name.to_string() })
    }

    fn contains(&self, name: &str) -> bool {
        self.map.read().unwrap_or_else(PoisonError::into_inner).contains_key(name)
    }

    fn names(&self) -> Vec<String> {
        self.map.read().unwrap_or_else(PoisonError::into_inner).keys().cloned().collect()
    }
}

// ── AIRegistry ────────────────────────────────────────────────────────────────

pub struct AIRegistry {
    nodes:      FactoryMap<NodeFactory>,
    conditions: FactoryMap<ConditionFactory>,
    filters:    FactoryMap<FilterFactory>,
    steerings:  FactoryMap<SteeringFactory>,
}

impl AIRegistry {
    /// A registry with every built-in type registered.
    pub fn new() -> Self {
        let registry = Self::empty();
        builtins::register_all(&registry);
        registry
    }

    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            nodes:      FactoryMap::new(FactoryKind::Node),
            conditions: FactoryMap::new(FactoryKind::Condition),
            filters:    FactoryMap::new(FactoryKind::Filter),
            steerings:  FactoryMap::new(FactoryKind::Steering),
        }
    }

    // ── Nodes ─────────────────────────────────────────────────────────────

    pub fn register_node_factory<F>(&self, type_name: &str, factory: F) -> RegistryResult<()>
    where
        F: Fn(&NodeFactoryContext) -> RegistryResult<Tree> + Send + Sync + 'static,
    {
        self.nodes.insert(type_name, Arc::new(factory))
    }

    pub fn unregister_node_factory(&self, type_name: &str) -> bool {
        self.nodes.remove(type_name)
    }

    pub fn create_node(&self, type_name: &str, ctx: &NodeFactoryContext) -> RegistryResult<Tree> {
        let factory = self.nodes.get(type_name)?;
        factory(ctx)
    }

    pub fn has_node_type(&self, type_name: &str) -> bool {
        self.nodes.contains(type_name)
    }

    pub fn node_types(&self) -> Vec<String> {
        self.nodes.names()
    }

    // ── Conditions ────────────────────────────────────────────────────────

    pub fn register_condition_factory<F>(&self, type_name: &str, factory: F) -> RegistryResult<()>
    where
        F: Fn(&ConditionFactoryContext) -> RegistryResult<ConditionPtr> + Send + Sync + 'static,
    {
        self.conditions.insert(type_name, Arc::new(factory))
    }

    pub fn unregister_condition_factory(&self, type_name: &str) -> bool {
        self.conditions.remove(type_name)
    }

    pub fn create_condition(&self, type_name: &str, ctx: &ConditionFactoryContext) -> RegistryResult<ConditionPtr> {
        let factory = self.conditions.get(type_name)?;
        factory(ctx)
    }

    pub fn has_condition_type(&self, type_name: &str) -> bool {
        self.conditions.contains(type_name)
    }

    pub fn condition_types(&self) -> Vec<String> {
        self.conditions.names()
    }

    // ── Filters ───────────────────────────────────────────────────────────

    pub fn register_filter_factory<F>(&self, type_name: &str, factory: F) -> RegistryResult<()>
    where
        F: Fn(&FilterFactoryContext) -> RegistryResult<FilterPtr> + Send + Sync + 'static,
    {
        self.filters.insert(type_name, Arc::new(factory))
    }

    pub fn unregister_filter_factory(&self, type_name: &str) -> bool {
        self.filters.remove(type_name)
    }

    pub fn create_filter(&self, type_name: &str, ctx: &FilterFactoryContext) -> RegistryResult<FilterPtr> {
        let factory = self.filters.get(type_name)?;
        factory(ctx)
    }

    pub fn has_filter_type(&self, type_name: &str) -> bool {
        self.filters.contains(type_name)
    }

    pub fn filter_types(&self) -> Vec<String> {
        self.filters.names()
    }

    // ── Steerings ─────────────────────────────────────────────────────────

    pub fn register_steering_factory<F>(&self, type_name: &str, factory: F) -> RegistryResult<()>
    where
        F: Fn(&SteeringFactoryContext) -> RegistryResult<SteeringPtr> + Send + Sync + 'static,
    {
        self.steerings.insert(type_name, Arc::new(factory))
    }

    pub fn unregister_steering_factory(&self, type_name: &str) -> bool {
        self.steerings.remove(type_name)
    }

    pub fn create_steering(&self, type_name: &str, ctx: &SteeringFactoryContext) -> RegistryResult<SteeringPtr> {
        let factory = self.steerings.get(type_name)?;
        factory(ctx)
    }

    pub fn has_steering_type(&self, type_name: &str) -> bool {
        self.steerings.contains(type_name)
    }

    pub fn steering_types(&self) -> Vec<String> {
        self.steerings.names()
    }
}

impl Default for AIRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AIRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AIRegistry")
            .field("nodes", &self.nodes.names())
            .field("conditions", &self.conditions.names())
            .field("filters", &self.filters.names())
            .field("steerings", &self.steerings.names())
            .finish()
    }
}
