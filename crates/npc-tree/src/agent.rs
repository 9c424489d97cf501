//! `Agent`: one simulated entity bound to a behaviour tree.
//!
//! # Tick order
//!
//! ```text
//! update(delta, debug)
//!   ├─ reset flag set?         → install new tree, clear NodeStates + candidates
//!   ├─ paused?                 → None, nothing else happens
//!   ├─ time += delta
//!   ├─ debugging switched off?  → drop debug records
//!   ├─ aggro.update(delta)
//!   ├─ character.update(delta, debug)
//!   └─ root.execute(agent, delta)  → Some(status)
//! ```
//!
//! A panic escaping the root is contained and reported as EXCEPTION at the
//! root node.
//!
//! # Behaviour swap
//!
//! The tree can be replaced from any thread through a [`BehaviourHandle`].
//! The setter swaps the tree under a mutex and raises an atomic flag.  The
//! ticking thread only performs an atomic test-and-clear of the flag at the
//! start of each tick and touches the mutex when it was set, so the hot path
//! takes no lock.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use npc_aggro::AggroMgr;
use npc_core::{AgentRng, Character, CharacterId, EngineConfig, GroupId, Millis, NodeId, TreeNodeStatus, Vec3};
use npc_world::ZoneInfo;
use tracing::debug;

use crate::error::NodeError;
use crate::node::Tree;
use crate::node::leaf::panic_message;
use crate::state::NodeStates;

// ── BehaviourHandle ───────────────────────────────────────────────────────────

struct BehaviourSlot {
    tree:  Mutex<Tree>,
    reset: AtomicBool,
}

/// Cloneable, thread-safe handle used to replace an agent's tree.
#[derive(Clone)]
pub struct BehaviourHandle(Arc<BehaviourSlot>);

impl fmt::Debug for BehaviourHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviourHandle")
            .field("root", &self.behaviour().base().name())
            .field("reset_pending", &self.is_reset_pending())
            .finish()
    }
}

impl BehaviourHandle {
    fn new(tree: Tree) -> Self {
        Self(Arc::new(BehaviourSlot { tree: Mutex::new(tree), reset: AtomicBool::new(false) }))
    }

    /// Assign a new tree and return the previous one.  The agent discards its
    /// per-node state on its next tick.
    pub fn set_behaviour(&self, tree: Tree) -> Tree {
        let previous = {
            let mut slot = self.0.tree.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *slot, tree)
        };
        self.0.reset.store(true, Ordering::Release);
        previous
    }

    /// The most recently assigned tree.
    pub fn behaviour(&self) -> Tree {
        self.0.tree.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_reset_pending(&self) -> bool {
        self.0.reset.load(Ordering::Acquire)
    }

    /// Test-and-clear the reset flag, returning the tree to install.
    fn take_reset(&self) -> Option<Tree> {
        if self.0.reset.swap(false, Ordering::AcqRel) {
            Some(self.behaviour())
        } else {
            None
        }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

pub struct Agent {
    character: Arc<dyn Character>,
    behaviour: Tree,
    handle:    BehaviourHandle,
    aggro:     AggroMgr,
    states:    NodeStates,
    filtered:  Vec<CharacterId>,
    rng:       AgentRng,
    zone:      Weak<ZoneInfo>,
    time:      Millis,
    paused:    bool,
    debugging: bool,
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("id", &self.id())
            .field("behaviour", &self.behaviour.base().name())
            .field("time", &self.time)
            .field("paused", &self.paused)
            .field("debugging", &self.debugging)
            .field("aggro", &self.aggro.len())
            .finish()
    }
}

impl Agent {
    pub fn new(character: Arc<dyn Character>, behaviour: Tree) -> Self {
        Self::with_seed(character, behaviour, 0)
    }

    /// Build an agent whose RNG stream derives from `seed` and the character id.
    pub fn with_seed(character: Arc<dyn Character>, behaviour: Tree, seed: u64) -> Self {
        let rng = AgentRng::new(seed, character.id());
        Self {
            character,
            handle: BehaviourHandle::new(behaviour.clone()),
            behaviour,
            aggro: AggroMgr::default(),
            states: NodeStates::default(),
            filtered: Vec::new(),
            rng,
            zone: Weak::new(),
            time: Millis::ZERO,
            paused: false,
            debugging: false,
        }
    }

    /// Seed and aggro decay taken from `config`.
    pub fn from_config(character: Arc<dyn Character>, behaviour: Tree, config: &EngineConfig) -> Self {
        let mut agent = Self::with_seed(character, behaviour, config.seed);
        agent.aggro.set_decay(config.aggro_decay);
        agent
    }

    /// Advance this agent by one tick.
    ///
    /// Returns `None` when paused.  RUNNING state survives a pause and is
    /// resumed on the first tick after it; a pending behaviour swap is still
    /// applied while paused.
    pub fn update(&mut self, delta: Millis, debugging_active: bool) -> Option<TreeNodeStatus> {
        if let Some(tree) = self.handle.take_reset() {
            debug!(
                character = self.id().0,
                node = tree.base().name(),
                node_id = tree.base().id().0,
                "behaviour replaced"
            );
            self.behaviour = tree;
            self.states.clear();
            self.filtered.clear();
        }

        if self.paused {
            return None;
        }

        self.time += delta;
        if self.debugging && !debugging_active {
            self.states.clear_debug();
        }
        self.debugging = debugging_active;
        self.aggro.update(delta);
        self.character.update(delta, debugging_active);

        let root = Arc::clone(&self.behaviour);
        let status = match catch_unwind(AssertUnwindSafe(|| root.execute(self, delta))) {
            Ok(status) => status,
            Err(panic) => {
                let err = NodeError::Fault(panic_message(panic.as_ref()));
                root.base().fault(self, &err)
            }
        };
        Some(status)
    }

    // ── Behaviour ─────────────────────────────────────────────────────────

    /// Assign a new tree and return the previous one.
    pub fn set_behaviour(&mut self, tree: Tree) -> Tree {
        self.handle.set_behaviour(tree)
    }

    /// The most recently assigned tree (it becomes active on the next tick).
    pub fn behaviour(&self) -> Tree {
        self.handle.behaviour()
    }

    /// The tree the last tick executed.
    pub fn active_behaviour(&self) -> &Tree {
        &self.behaviour
    }

    pub fn behaviour_handle(&self) -> BehaviourHandle {
        self.handle.clone()
    }

    // ── Flags ─────────────────────────────────────────────────────────────

    pub fn set_pause(&mut self, pause: bool) {
        self.paused = pause;
    }

    pub fn is_pause(&self) -> bool {
        self.paused
    }

    pub fn is_debugging_active(&self) -> bool {
        self.debugging
    }

    /// Accumulated time of all unpaused ticks.
    pub fn time(&self) -> Millis {
        self.time
    }

    // ── Bound state ───────────────────────────────────────────────────────

    pub fn id(&self) -> CharacterId {
        self.character.id()
    }

    pub fn character(&self) -> &Arc<dyn Character> {
        &self.character
    }

    pub fn aggro(&self) -> &AggroMgr {
        &self.aggro
    }

    pub fn aggro_mut(&mut self) -> &mut AggroMgr {
        &mut self.aggro
    }

    /// Candidate list written by filters.  Only meaningful inside a tick.
    pub fn filtered_entities(&self) -> &[CharacterId] {
        &self.filtered
    }

    pub fn filtered_entities_mut(&mut self) -> &mut Vec<CharacterId> {
        &mut self.filtered
    }

    pub fn rng(&mut self) -> &mut AgentRng {
        &mut self.rng
    }

    pub fn node_states(&self) -> &NodeStates {
        &self.states
    }

    pub fn node_states_mut(&mut self) -> &mut NodeStates {
        &mut self.states
    }

    pub fn last_status(&self, node: NodeId) -> Option<TreeNodeStatus> {
        self.states.last_status(node)
    }

    // ── Zone ──────────────────────────────────────────────────────────────

    /// Attach to (or with `None`, detach from) a zone.  The agent only keeps
    /// a weak reference; the zone owns the agent.
    pub fn set_zone(&mut self, zone: Option<&Arc<ZoneInfo>>) {
        self.zone = zone.map(Arc::downgrade).unwrap_or_default();
    }

    pub fn zone(&self) -> Option<Arc<ZoneInfo>> {
        self.zone.upgrade()
    }

    pub fn has_zone(&self) -> bool {
        self.zone.strong_count() > 0
    }

    /// Average position of a group in this agent's zone.
    pub fn group_position(&self, group: GroupId) -> Option<Vec3> {
        self.zone()?.group_position(group)
    }
}
