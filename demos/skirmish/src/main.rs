//! skirmish — smallest runnable host for the npc behaviour engine.
//!
//! A knight advances on a goblin war band.  Two goblins start out provoked
//! and charge; the rest follow their leader or rest.  The knight backs off
//! once it gets too close to the band.
//!
//! ```text
//! cargo run -p skirmish                       # built-in configuration
//! cargo run -p skirmish -- engine.json        # EngineConfig from a JSON file
//! RUST_LOG=npc_tree=trace cargo run -p skirmish
//! ```

mod roster;

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use npc_core::{AggroDecay, CharacterId, EngineConfig, TreeNodeStatus, attributes};
use npc_registry::{AIRegistry, JsonTreeLoader, TreeLoader};
use npc_tree::Agent;
use npc_zone::{AgentOutcome, Zone, ZoneObserver, ZoneTickReport};

use roster::{KNIGHT, PROVOKED, WAR_BAND};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED:          u64 = 42;
const DEFAULT_TICKS: u64 = 120;
const LOG_INTERVAL:  u64 = 20;

// ── Behaviour trees ───────────────────────────────────────────────────────────

const TREES_JSON: &str = r#"{
  "trees": [
    {
      "name": "guard",
      "root": {
        "name": "guard",
        "type": "PrioritySelector",
        "children": [
          {
            "name": "attack",
            "type": "Sequence",
            "condition": "Filter(SelectHighestAggro)",
            "children": [
              { "name": "charge", "type": "Steer(SelectionSeek)" },
              { "name": "shout", "type": "Shout{for the band}" }
            ]
          },
          {
            "name": "follow",
            "type": "Steer{1,0.3}(GroupSeek{1},Wander{0.5})",
            "condition": "And(IsInGroup{1},Not(IsGroupLeader{1}))"
          },
          { "name": "rest", "type": "Idle{500}" }
        ]
      }
    },
    {
      "name": "patrol",
      "root": {
        "name": "patrol",
        "type": "PrioritySelector",
        "children": [
          {
            "name": "retreat",
            "type": "Steer(GroupFlee{1})",
            "condition": "IsCloseToGroup{1,4}"
          },
          { "name": "advance", "type": "Steer(GroupSeek{1})" }
        ]
      }
    }
  ]
}"#;

// ── Observer ──────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SummaryObserver {
    faulted: Vec<CharacterId>,
}

impl ZoneObserver for SummaryObserver {
    fn on_agent_status(&mut self, tick: u64, id: CharacterId, outcome: AgentOutcome) {
        if outcome == AgentOutcome::Faulted && !self.faulted.contains(&id) {
            debug!(tick, character = id.0, "first fault");
            self.faulted.push(id);
        }
    }

    fn on_tick_end(&mut self, tick: u64, report: &ZoneTickReport) {
        if tick % LOG_INTERVAL == 0 {
            info!(
                tick,
                running = report.count(TreeNodeStatus::Running),
                finished = report.count(TreeNodeStatus::Finished),
                faulted = report.faulted,
                "progress"
            );
        }
    }
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?
        }
        None => EngineConfig {
            seed: SEED,
            total_ticks: DEFAULT_TICKS,
            aggro_decay: AggroDecay::ByValue { per_second: 2.0 },
            ..EngineConfig::default()
        },
    };
    config.validate()?;
    Ok(config)
}

fn registry() -> Result<AIRegistry> {
    let registry = AIRegistry::new();
    registry.register_script_node("Shout", |ctx, _delta| {
        if let Some(top) = ctx.aggro().highest_entry() {
            debug!(character = ctx.id().0, target = top.target.0, aggro = top.aggro, "{}", ctx.parameters());
        }
        Ok(TreeNodeStatus::Finished)
    })?;
    Ok(registry)
}

// ── main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    init_logging();

    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref().map(Path::new))?;
    let ticks = if config.total_ticks == 0 { DEFAULT_TICKS } else { config.total_ticks };
    info!(ticks, tick_millis = config.tick_millis, seed = config.seed, "skirmish starting");

    // 1. Trees.
    let registry = registry()?;
    let trees = JsonTreeLoader.load(&registry, TREES_JSON)?;
    let guard = trees.get("guard").cloned().context("tree `guard` missing")?;
    let patrol = trees.get("patrol").cloned().context("tree `patrol` missing")?;
    info!(trees = trees.len(), "behaviour trees loaded");

    // 2. Zone and agents.
    let mut zone = Zone::from_config("border", &config)?;
    zone.try_add_agent(Agent::from_config(roster::knight(), patrol, &config))?;
    for goblin in roster::goblins() {
        let id = goblin.id();
        let mut agent = Agent::from_config(goblin, guard.clone(), &config);
        if let Some(&(_, aggro)) = PROVOKED.iter().find(|(provoked, _)| *provoked == id) {
            agent.aggro_mut().add_aggro(KNIGHT, aggro);
        }
        zone.try_add_agent(agent)?;
        zone.info().join_group(WAR_BAND, id);
    }
    let (band, leader) = {
        let groups = zone.groups();
        (groups.size(WAR_BAND), groups.leader(WAR_BAND))
    };
    info!(agents = zone.len(), band, leader = ?leader, "zone ready");

    // 3. Run.
    let mut observer = SummaryObserver::default();
    let t0 = Instant::now();
    let total = zone.run_ticks(ticks, config.tick(), &mut observer);
    let elapsed = t0.elapsed();

    // 4. Summary.
    println!("Skirmish complete in {:.3} s", elapsed.as_secs_f64());
    println!(
        "  agent ticks: {}  |  paused: {}  |  faulted: {} ({} agents)",
        total.executed,
        total.paused,
        total.faulted,
        observer.faulted.len()
    );
    println!();

    println!("{:<6} {:<10} {:<24} {:<6}", "Id", "Name", "Position", "Aggro");
    println!("{}", "-".repeat(48));
    for agent in zone.agents() {
        let character = agent.character();
        println!(
            "{:<6} {:<10} {:<24} {:<6}",
            agent.id().0,
            character.attribute(attributes::NAME).unwrap_or_default(),
            character.position().to_string(),
            agent.aggro().len(),
        );
    }

    Ok(())
}
