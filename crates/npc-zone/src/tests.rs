//! Unit tests for the zone driver.

use std::collections::BTreeMap;
use std::sync::Arc;

use npc_core::{BasicCharacter, Character, CharacterId, EngineConfig, GroupId, Millis, TreeNodeStatus, Vec3};
use npc_tree::node::leaf::Task;
use npc_tree::{Agent, IntoTree, NodeBase, Tree, TreeNode};

use crate::{AgentOutcome, Zone, ZoneObserver, ZoneTickReport};

const TICK: Millis = Millis(100);

fn agent(id: i32, tree: &Tree) -> Agent {
    let character: Arc<dyn Character> = Arc::new(BasicCharacter::new(CharacterId(id)));
    Agent::new(character, Arc::clone(tree))
}

fn fixed(name: &str, status: TreeNodeStatus) -> Tree {
    Task::new(NodeBase::new("Task", name), move |_, _| Ok(status)).into_tree()
}

/// A node that panics outside any task boundary.
struct Explode {
    base: NodeBase,
}

impl TreeNode for Explode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn execute(&self, _agent: &mut Agent, _delta: Millis) -> TreeNodeStatus {
        panic!("boom")
    }
}

fn explode() -> Tree {
    Explode { base: NodeBase::new("Explode", "explode") }.into_tree()
}

/// A character whose per-tick update panics before the tree runs.
struct Unstable(BasicCharacter);

impl Character for Unstable {
    fn id(&self) -> CharacterId {
        self.0.id()
    }

    fn position(&self) -> Vec3 {
        self.0.position()
    }

    fn set_position(&self, position: Vec3) {
        self.0.set_position(position)
    }

    fn orientation(&self) -> f32 {
        self.0.orientation()
    }

    fn set_orientation(&self, orientation: f32) {
        self.0.set_orientation(orientation)
    }

    fn speed(&self) -> f32 {
        self.0.speed()
    }

    fn set_speed(&self, speed: f32) {
        self.0.set_speed(speed)
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.0.attribute(key)
    }

    fn set_attribute(&self, key: &str, value: String) {
        self.0.set_attribute(key, value)
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        self.0.attributes()
    }

    fn update(&self, _delta: Millis, _debugging_active: bool) {
        panic!("character update failed")
    }
}

fn unstable_agent(id: i32, tree: &Tree) -> Agent {
    let character: Arc<dyn Character> = Arc::new(Unstable(BasicCharacter::new(CharacterId(id))));
    Agent::new(character, Arc::clone(tree))
}

/// Records every callback in order.
#[derive(Default)]
struct Recorder {
    events: Vec<String>,
}

impl ZoneObserver for Recorder {
    fn on_tick_start(&mut self, tick: u64) {
        self.events.push(format!("start {tick}"));
    }

    fn on_agent_status(&mut self, tick: u64, id: CharacterId, outcome: AgentOutcome) {
        self.events.push(format!("{tick} {} {outcome:?}", id.0));
    }

    fn on_tick_end(&mut self, tick: u64, report: &ZoneTickReport) {
        self.events.push(format!("end {tick} {}", report.total()));
    }
}

// ── Membership ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod membership_tests {
    use super::*;
    use crate::ZoneError;

    #[test]
    fn add_agent_joins_directory_and_zone() {
        let tree = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        assert!(zone.add_agent(agent(1, &tree)));
        assert!(zone.add_agent(agent(2, &tree)));

        assert_eq!(zone.len(), 2);
        assert_eq!(zone.ids(), vec![CharacterId(1), CharacterId(2)]);
        assert!(zone.info().contains(CharacterId(1)));
        let agent = zone.agent(CharacterId(1)).unwrap();
        assert!(agent.has_zone());
        assert_eq!(agent.zone().unwrap().name(), "forest");
    }

    #[test]
    fn duplicate_agent_rejected() {
        let tree = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        assert!(zone.add_agent(agent(1, &tree)));
        assert!(!zone.add_agent(agent(1, &tree)));
        assert_eq!(zone.len(), 1);

        let err = zone.try_add_agent(agent(1, &tree)).unwrap_err();
        assert!(matches!(err, ZoneError::DuplicateAgent { id: CharacterId(1), .. }));
    }

    #[test]
    fn remove_agent_leaves_groups() {
        let tree = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &tree));
        zone.add_agent(agent(2, &tree));
        assert!(zone.info().join_group(GroupId(1), CharacterId(1)));
        assert!(zone.info().join_group(GroupId(1), CharacterId(2)));
        assert_eq!(zone.groups().leader(GroupId(1)), Some(CharacterId(1)));

        let removed = zone.remove_agent(CharacterId(1)).unwrap();
        assert!(!removed.has_zone());
        assert!(!zone.info().contains(CharacterId(1)));
        assert_eq!(zone.groups().members(GroupId(1)), vec![CharacterId(2)]);
        assert_eq!(zone.groups().leader(GroupId(1)), Some(CharacterId(2)));
        assert!(zone.remove_agent(CharacterId(1)).is_none());
        assert!(!zone.is_empty());
    }

    #[test]
    fn set_behaviour_unknown_agent() {
        let tree = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        let err = zone.set_behaviour(CharacterId(9), tree).unwrap_err();
        assert!(matches!(err, ZoneError::UnknownAgent { id: CharacterId(9), .. }));
    }

    #[test]
    fn invalid_config_rejected() {
        let config = EngineConfig { tick_millis: 0, ..EngineConfig::default() };
        assert!(matches!(Zone::from_config("forest", &config), Err(ZoneError::Config(_))));
    }
}

// ── Tick loop ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tick_tests {
    use super::*;
    use crate::NoopObserver;

    #[test]
    fn report_counts_statuses_and_pauses() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let bad = fixed("bad", TreeNodeStatus::Failed);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &ok));
        zone.add_agent(agent(2, &ok));
        zone.add_agent(agent(3, &bad));
        zone.agent_mut(CharacterId(2)).unwrap().set_pause(true);

        let report = zone.update(TICK);
        assert_eq!(report.executed, 2);
        assert_eq!(report.paused, 1);
        assert_eq!(report.faulted, 0);
        assert_eq!(report.count(TreeNodeStatus::Finished), 1);
        assert_eq!(report.count(TreeNodeStatus::Failed), 1);
        assert_eq!(report.count(TreeNodeStatus::Running), 0);
        assert_eq!(zone.tick(), 1);
        assert_eq!(zone.agent(CharacterId(1)).unwrap().time(), TICK);
        assert_eq!(zone.agent(CharacterId(2)).unwrap().time(), Millis::ZERO);
    }

    #[test]
    fn panicking_agent_does_not_stop_the_others() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &ok));
        zone.add_agent(unstable_agent(2, &ok));
        zone.add_agent(agent(3, &ok));

        for _ in 0..2 {
            let report = zone.update(TICK);
            assert_eq!(report.faulted, 1);
            assert_eq!(report.count(TreeNodeStatus::Finished), 2);
        }
        assert_eq!(zone.agent(CharacterId(3)).unwrap().time(), Millis(200));
    }

    #[test]
    fn observer_sees_agents_in_id_order() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(5, &ok));
        zone.add_agent(unstable_agent(2, &ok));
        zone.add_agent(agent(3, &explode()));

        let mut recorder = Recorder::default();
        zone.update_with(TICK, &mut recorder);
        assert_eq!(
            recorder.events,
            vec![
                "start 1".to_string(),
                "1 2 Faulted".to_string(),
                "1 3 Executed(Exception)".to_string(),
                "1 5 Executed(Finished)".to_string(),
                "end 1 3".to_string(),
            ]
        );
    }

    #[test]
    fn panicking_node_is_contained_by_the_agent() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &ok));
        zone.add_agent(agent(2, &explode()));

        for _ in 0..2 {
            let report = zone.update(TICK);
            assert_eq!(report.faulted, 0);
            assert_eq!(report.executed, 2);
            assert_eq!(report.count(TreeNodeStatus::Exception), 1);
        }
        assert_eq!(zone.agent(CharacterId(2)).unwrap().time(), Millis(200));
    }

    #[test]
    fn run_ticks_sums_reports() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &ok));
        zone.add_agent(agent(2, &ok));

        let total = zone.run_ticks(3, TICK, &mut NoopObserver);
        assert_eq!(total.executed, 6);
        assert_eq!(total.count(TreeNodeStatus::Finished), 6);
        assert_eq!(zone.tick(), 3);
    }

    #[test]
    fn behaviour_handle_swaps_tree() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let bad = fixed("bad", TreeNodeStatus::Failed);
        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &ok));

        let handle = zone.behaviour_handle(CharacterId(1)).unwrap();
        std::thread::spawn(move || {
            handle.set_behaviour(bad);
        })
        .join()
        .unwrap();

        let report = zone.update(TICK);
        assert_eq!(report.count(TreeNodeStatus::Failed), 1);
    }

    #[test]
    fn debug_flag_reaches_agents() {
        let ok = fixed("ok", TreeNodeStatus::Finished);
        let config = EngineConfig { debug: true, ..EngineConfig::default() };
        let mut zone = Zone::from_config("forest", &config).unwrap();
        assert!(zone.is_debug());
        zone.add_agent(agent(1, &ok));
        zone.update(config.tick());
        let agent = zone.agent(CharacterId(1)).unwrap();
        assert_eq!(agent.last_status(ok.base().id()), Some(TreeNodeStatus::Finished));

        zone.set_debug(false);
        assert!(!zone.is_debug());
    }
}

// ── Shared zone state ─────────────────────────────────────────────────────────

#[cfg(test)]
mod neighbour_tests {
    use super::*;
    use npc_registry::{AIRegistry, ConditionParser};

    #[test]
    fn group_guard_sees_zone_groups() {
        let registry = AIRegistry::new();
        let guard = ConditionParser::new(&registry).parse("IsGroupLeader{1}").unwrap();
        let lead: Tree = Task::new(NodeBase::new("Task", "lead").with_condition(guard), |_, _| {
            Ok(TreeNodeStatus::Finished)
        })
        .into_tree();

        let mut zone = Zone::new("forest");
        zone.add_agent(agent(1, &lead));
        zone.add_agent(agent(2, &lead));
        zone.info().join_group(GroupId(1), CharacterId(1));
        zone.info().join_group(GroupId(1), CharacterId(2));

        let report = zone.update(TICK);
        assert_eq!(report.count(TreeNodeStatus::Finished), 1);
        assert_eq!(report.count(TreeNodeStatus::CannotExecute), 1);
    }
}
