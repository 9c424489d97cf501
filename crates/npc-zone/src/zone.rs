//! The `Zone` struct and its tick loop.

use std::collections::BTreeMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, RwLockReadGuard};

use tracing::{debug, error, info, trace, warn};

use npc_core::{CharacterId, EngineConfig, Millis};
use npc_tree::node::leaf::panic_message;
use npc_tree::{Agent, BehaviourHandle, Tree};
use npc_world::{GroupMgr, ZoneInfo};

use crate::{AgentOutcome, NoopObserver, ZoneError, ZoneObserver, ZoneResult, ZoneTickReport};

// ── Zone ──────────────────────────────────────────────────────────────────────

/// Owns the agents of one zone and ticks them.
///
/// Agents are kept in ascending `CharacterId` order.  Each tick:
///
/// 1. every agent runs `Agent::update` once (on rayon with the `parallel`
///    feature).  Node panics become EXCEPTION inside the agent; anything
///    else that unwinds out of the update, such as a panicking
///    `Character::update`, is caught here and reported as `Faulted`;
/// 2. the outcomes are reported to the observer sequentially in id order.
///
/// The shared [`ZoneInfo`] is handed to each agent as a weak reference, so an
/// agent removed from the zone stops seeing its neighbours.
pub struct Zone {
    info:   Arc<ZoneInfo>,
    agents: BTreeMap<CharacterId, Agent>,
    debug:  bool,
    tick:   u64,
    #[cfg(feature = "parallel")]
    pool:   Option<rayon::ThreadPool>,
}

impl fmt::Debug for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zone")
            .field("name", &self.name())
            .field("agents", &self.agents.len())
            .field("debug", &self.debug)
            .field("tick", &self.tick)
            .finish()
    }
}

impl Zone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            info:   Arc::new(ZoneInfo::new(name)),
            agents: BTreeMap::new(),
            debug:  false,
            tick:   0,
            #[cfg(feature = "parallel")]
            pool:   None,
        }
    }

    /// A zone whose debug flag and worker pool come from `config`.
    ///
    /// Without the `parallel` feature `num_threads` has no effect.
    pub fn from_config(name: impl Into<String>, config: &EngineConfig) -> ZoneResult<Self> {
        config.validate()?;
        let mut zone = Self::new(name);
        zone.debug = config.debug;

        #[cfg(feature = "parallel")]
        {
            if let Some(threads) = config.num_threads {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| ZoneError::ThreadPool(e.to_string()))?;
                zone.pool = Some(pool);
            }
        }

        #[cfg(not(feature = "parallel"))]
        {
            if let Some(threads) = config.num_threads {
                warn!(zone = zone.name(), threads, "num_threads ignored: built without the parallel feature");
            }
        }

        info!(zone = zone.name(), debug = zone.debug, "zone created");
        Ok(zone)
    }

    pub fn name(&self) -> &str {
        self.info.name()
    }

    pub fn info(&self) -> &Arc<ZoneInfo> {
        &self.info
    }

    /// Read access to the zone's groups.
    pub fn groups(&self) -> RwLockReadGuard<'_, GroupMgr> {
        self.info.groups()
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    // ── Debugging ─────────────────────────────────────────────────────────

    /// Record per-node status and timing for every agent from the next tick.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    // ── Agents ────────────────────────────────────────────────────────────

    /// Take ownership of `agent`.  Returns `false`, dropping the agent, if
    /// the zone already has one for the same character.
    ///
    /// The agent's character joins the zone directory unless a character
    /// with that id is already listed there.
    pub fn add_agent(&mut self, mut agent: Agent) -> bool {
        let id = agent.id();
        if self.agents.contains_key(&id) {
            warn!(zone = self.name(), character = id.0, "agent already in zone");
            return false;
        }
        agent.set_zone(Some(&self.info));
        if !self.info.insert_character(Arc::clone(agent.character())) {
            debug!(zone = self.name(), character = id.0, "character already listed");
        }
        self.agents.insert(id, agent);
        debug!(zone = self.name(), character = id.0, "agent added");
        true
    }

    /// Like [`add_agent`][Self::add_agent] but reports a duplicate as an error.
    pub fn try_add_agent(&mut self, agent: Agent) -> ZoneResult<()> {
        let id = agent.id();
        if self.agents.contains_key(&id) {
            return Err(ZoneError::DuplicateAgent { zone: self.name().to_string(), id });
        }
        self.add_agent(agent);
        Ok(())
    }

    /// Hand an agent back.  Its character leaves the directory and every
    /// group, and the agent no longer references the zone.
    pub fn remove_agent(&mut self, id: CharacterId) -> Option<Agent> {
        let mut agent = self.agents.remove(&id)?;
        self.info.remove_character(id);
        agent.set_zone(None);
        debug!(zone = self.name(), character = id.0, "agent removed");
        Some(agent)
    }

    pub fn agent(&self, id: CharacterId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn agent_mut(&mut self, id: CharacterId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// A handle that can swap the agent's tree from any thread.
    pub fn behaviour_handle(&self, id: CharacterId) -> Option<BehaviourHandle> {
        self.agents.get(&id).map(Agent::behaviour_handle)
    }

    /// Assign a new tree to one agent and return the previous one.
    pub fn set_behaviour(&mut self, id: CharacterId, tree: Tree) -> ZoneResult<Tree> {
        match self.agents.get_mut(&id) {
            Some(agent) => Ok(agent.set_behaviour(tree)),
            None => Err(ZoneError::UnknownAgent { zone: self.name().to_string(), id }),
        }
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Agent ids in ascending order.
    pub fn ids(&self) -> Vec<CharacterId> {
        self.agents.keys().copied().collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    // ── Tick loop ─────────────────────────────────────────────────────────

    /// Tick every agent once.
    pub fn update(&mut self, delta: Millis) -> ZoneTickReport {
        self.update_with(delta, &mut NoopObserver)
    }

    /// Tick every agent once, reporting to `observer`.
    pub fn update_with<O: ZoneObserver + ?Sized>(&mut self, delta: Millis, observer: &mut O) -> ZoneTickReport {
        self.tick += 1;
        let tick = self.tick;
        observer.on_tick_start(tick);

        let outcomes = self.tick_agents(delta);

        let mut report = ZoneTickReport::default();
        for (id, outcome) in outcomes {
            observer.on_agent_status(tick, id, outcome);
            report.record(outcome);
        }

        trace!(
            zone = self.name(),
            tick,
            executed = report.executed,
            paused = report.paused,
            faulted = report.faulted,
            "zone tick"
        );
        observer.on_tick_end(tick, &report);
        report
    }

    /// Run `ticks` consecutive updates and return the summed report.
    pub fn run_ticks<O: ZoneObserver + ?Sized>(
        &mut self,
        ticks:    u64,
        delta:    Millis,
        observer: &mut O,
    ) -> ZoneTickReport {
        let mut total = ZoneTickReport::default();
        for _ in 0..ticks {
            total.merge(&self.update_with(delta, observer));
        }
        total
    }

    /// Sequential tick: agents in ascending id order.
    #[cfg(not(feature = "parallel"))]
    fn tick_agents(&mut self, delta: Millis) -> Vec<(CharacterId, AgentOutcome)> {
        let zone = self.info.name();
        let debug = self.debug;
        self.agents
            .iter_mut()
            .map(|(&id, agent)| (id, tick_agent(zone, agent, delta, debug)))
            .collect()
    }

    /// Parallel tick on the zone pool, or rayon's global pool when none was
    /// configured.  The returned outcomes are still in ascending id order.
    #[cfg(feature = "parallel")]
    fn tick_agents(&mut self, delta: Millis) -> Vec<(CharacterId, AgentOutcome)> {
        use rayon::prelude::*;

        let Zone { info, agents, debug, pool, .. } = self;
        let zone = info.name();
        let debug = *debug;
        let run = move || {
            agents
                .par_iter_mut()
                .map(|(&id, agent)| (id, tick_agent(zone, agent, delta, debug)))
                .collect::<Vec<_>>()
        };
        match pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

fn tick_agent(zone: &str, agent: &mut Agent, delta: Millis, debug: bool) -> AgentOutcome {
    match catch_unwind(AssertUnwindSafe(|| agent.update(delta, debug))) {
        Ok(Some(status)) => AgentOutcome::Executed(status),
        Ok(None) => AgentOutcome::Paused,
        Err(panic) => {
            error!(
                zone,
                character = agent.id().0,
                error = %panic_message(panic.as_ref()),
                "agent tick panicked"
            );
            AgentOutcome::Faulted
        }
    }
}
