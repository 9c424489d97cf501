//! Unit tests for npc-registry.

use std::sync::Arc;

use npc_core::{BasicCharacter, Character, CharacterId, Millis, TreeNodeStatus, Vec3};
use npc_tree::{Agent, Condition, Filter, IntoTree, Tree};

use crate::{AIRegistry, ConditionParser, JsonTreeLoader, LoaderError, NodeFactoryContext, TreeLoader, TreeNodeParser};

const TICK: Millis = Millis(100);

fn agent_at(position: Vec3, tree: Tree) -> (Agent, Arc<dyn Character>) {
    let character: Arc<dyn Character> =
        Arc::new(BasicCharacter::new(CharacterId(1)).at(position).with_speed(1.0));
    (Agent::new(Arc::clone(&character), tree), character)
}

fn node(registry: &AIRegistry, expr: &str) -> Tree {
    TreeNodeParser::new(registry).parse(expr, NodeFactoryContext::new(expr)).unwrap()
}

const DOCUMENT: &str = r#"{
  "trees": [
    {
      "name": "guard",
      "root": {
        "name": "root",
        "type": "PrioritySelector",
        "children": [
          { "name": "chase", "type": "Steer(TargetSeek{10:0:0})", "condition": "HasEnemies" },
          { "name": "wait", "type": "Idle{0}" }
        ]
      }
    },
    {
      "name": "idle",
      "root": { "type": "Idle{300}" }
    }
  ]
}"#;

// ── Registry ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod registry_tests {
    use npc_tree::node::leaf::Idle;

    use super::*;
    use crate::{ConditionFactoryContext, FactoryKind, FilterFactoryContext, RegistryError, SteeringFactoryContext};

    #[test]
    fn builtins_are_registered() {
        let registry = AIRegistry::new();
        for kind in ["PrioritySelector", "Sequence", "Parallel", "Limit", "Idle", "Steer", "Print"] {
            assert!(registry.has_node_type(kind), "{kind}");
        }
        for kind in ["True", "And", "Not", "HasEnemies", "IsCloseToGroup", "Filter"] {
            assert!(registry.has_condition_type(kind), "{kind}");
        }
        for kind in ["SelectZone", "Last", "Union", "Random"] {
            assert!(registry.has_filter_type(kind), "{kind}");
        }
        for kind in ["Wander", "TargetSeek", "SelectionFlee"] {
            assert!(registry.has_steering_type(kind), "{kind}");
        }
        assert!(AIRegistry::empty().node_types().is_empty());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let registry = AIRegistry::new();
        let err = registry
            .register_node_factory(Idle::KIND, |ctx| Ok(Idle::node(ctx.base(Idle::KIND), Millis(1)).into_tree()))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate { kind: FactoryKind::Node, name: "Idle".into() });
    }

    #[test]
    fn unknown_type_is_rejected() {
        let registry = AIRegistry::new();
        let err = registry.create_node("Teleport", &NodeFactoryContext::new("t")).unwrap_err();
        assert_eq!(err, RegistryError::Unknown { kind: FactoryKind::Node, name: "Teleport".into() });
        assert!(matches!(
            registry.create_condition("Maybe", &ConditionFactoryContext::default()),
            Err(RegistryError::Unknown { kind: FactoryKind::Condition, .. })
        ));
        assert!(matches!(
            registry.create_filter("SelectAll", &FilterFactoryContext::default()),
            Err(RegistryError::Unknown { kind: FactoryKind::Filter, .. })
        ));
        assert!(matches!(
            registry.create_steering("Teleport", &SteeringFactoryContext::default()),
            Err(RegistryError::Unknown { kind: FactoryKind::Steering, .. })
        ));
    }

    #[test]
    fn unregister_then_register_again() {
        let registry = AIRegistry::new();
        assert!(registry.unregister_node_factory("Print"));
        assert!(!registry.unregister_node_factory("Print"));
        assert!(registry.create_node("Print", &NodeFactoryContext::new("p")).is_err());
        registry
            .register_node_factory("Print", |ctx| Ok(Idle::node(ctx.base("Print"), Millis(0)).into_tree()))
            .unwrap();
        assert!(registry.has_node_type("Print"));
    }

    #[test]
    fn child_count_is_validated() {
        let registry = AIRegistry::new();
        let leaf = || node(&registry, "Idle{1}");
        let ctx = NodeFactoryContext::new("bad").with_children(vec![leaf(), leaf()]);
        assert_eq!(
            registry.create_node("Succeed", &ctx).unwrap_err(),
            RegistryError::ChildCount { name: "Succeed".into(), expected: "exactly one", found: 2 }
        );
        assert!(matches!(
            registry.create_node("Sequence", &NodeFactoryContext::new("empty")),
            Err(RegistryError::ChildCount { found: 0, .. })
        ));
        let ctx = NodeFactoryContext::new("leaf").with_parameters("5").with_children(vec![leaf()]);
        assert!(matches!(registry.create_node("Idle", &ctx), Err(RegistryError::ChildCount { .. })));
    }

    #[test]
    fn parameters_are_validated() {
        let registry = AIRegistry::new();
        let bad = |kind: &str, params: &str| {
            registry.create_node(kind, &NodeFactoryContext::new("n").with_parameters(params))
        };
        assert!(matches!(bad("Idle", "soon"), Err(RegistryError::InvalidParameter { .. })));
        assert!(matches!(bad("Idle", ""), Err(RegistryError::InvalidParameter { .. })));
        assert!(bad("Idle", " 250 ").is_ok());
        assert!(matches!(
            registry.create_steering("TargetSeek", &SteeringFactoryContext::new("1:2")),
            Err(RegistryError::InvalidParameter { .. })
        ));
        assert!(matches!(
            registry.create_condition("IsGroupLeader", &ConditionFactoryContext::new("")),
            Err(RegistryError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn node_carries_context() {
        let registry = AIRegistry::new();
        let tree = TreeNodeParser::new(&registry)
            .parse("Print{hello}", NodeFactoryContext::new("greeter"))
            .unwrap();
        assert_eq!(tree.base().name(), "greeter");
        assert_eq!(tree.base().kind(), "Print");
        assert_eq!(tree.base().parameters(), "hello");
    }
}

// ── Expressions and parsers ───────────────────────────────────────────────────

#[cfg(test)]
mod parser_tests {
    use super::*;
    use crate::expr;

    #[test]
    fn expression_round_trips() {
        for text in [
            "Idle{1500}",
            "Steer{1,2}(SelectionSeek,Wander{0.5})",
            "And(Not(HasEnemies{2}),Filter(SelectZone,SelectHighestAggro))",
            "TargetSeek{1:0:-5}",
        ] {
            assert_eq!(expr::parse(text).unwrap().to_string(), text);
        }
        let spaced = expr::parse(" And ( True , Not( False ) ) ").unwrap();
        assert_eq!(spaced.to_string(), "And(True,Not(False))");
        assert_eq!(expr::parse("Empty()").unwrap().args.len(), 0);
    }

    #[test]
    fn nested_braces_stay_in_parameters() {
        let e = expr::parse("Print{a {b} c}").unwrap();
        assert_eq!(e.parameters, "a {b} c");
    }

    #[test]
    fn syntax_errors_carry_positions() {
        let position = |text: &str| match expr::parse(text) {
            Err(LoaderError::Syntax { position, .. }) => position,
            other => panic!("expected a syntax error for {text:?}, got {other:?}"),
        };
        assert_eq!(position(""), 0);
        assert_eq!(position("And(True"), 3);
        assert_eq!(position("Idle{5"), 4);
        assert_eq!(position("And(True)x"), 9);
        assert_eq!(position("And(True;False)"), 8);
        assert_eq!(position("And(,)"), 4);
    }

    #[test]
    fn deep_nesting_is_a_syntax_error() {
        let nested = |depth: usize| format!("{}True{}", "Not(".repeat(depth), ")".repeat(depth));
        let registry = AIRegistry::new();
        let parser = ConditionParser::new(&registry);

        let deepest = expr::MAX_DEPTH - 1;
        assert!(parser.parse(&nested(deepest)).is_ok());

        let err = parser.parse(&nested(100_000)).unwrap_err();
        assert!(
            matches!(err, LoaderError::Syntax { position, .. } if position == 4 * expr::MAX_DEPTH),
            "{err}"
        );
    }

    #[test]
    fn condition_parser_round_trips() {
        let registry = AIRegistry::new();
        let parser = ConditionParser::new(&registry);
        for text in [
            "True",
            "And(Not(HasEnemies{2}),Filter(SelectZone,SelectHighestAggro))",
            "Or(IsInGroup{1},IsCloseToGroup{2,15})",
            "Filter(Last(SelectAggroAbove{2.5}),Random{1}(SelectZone))",
        ] {
            assert_eq!(parser.parse(text).unwrap().describe(), text);
        }
    }

    #[test]
    fn condition_parser_rejects_bad_input() {
        let registry = AIRegistry::new();
        let parser = ConditionParser::new(&registry);
        assert!(matches!(parser.parse("Not(True,False)"), Err(LoaderError::Registry(_))));
        assert!(matches!(parser.parse("Filter(Nobody)"), Err(LoaderError::Registry(_))));
        assert!(matches!(parser.parse("And(True"), Err(LoaderError::Syntax { .. })));
    }

    #[test]
    fn parsed_condition_evaluates() {
        let registry = AIRegistry::new();
        let cond = ConditionParser::new(&registry).parse("And(HasEnemies,Filter(SelectHighestAggro))").unwrap();
        let (mut agent, _) = agent_at(Vec3::ZERO, node(&registry, "Idle{0}"));
        assert!(!cond.evaluate(&mut agent));
        agent.aggro_mut().add_aggro(CharacterId(9), 4.0);
        assert!(cond.evaluate(&mut agent));
        assert_eq!(agent.filtered_entities(), &[CharacterId(9)]);
    }

    #[test]
    fn steer_expression_moves_character() {
        let registry = AIRegistry::new();
        let tree = node(&registry, "Steer{1,1}(TargetSeek{0:0:10},TargetSeek{0:0:10})");
        let (mut agent, character) = agent_at(Vec3::ZERO, tree);
        assert_eq!(agent.update(Millis(1000), false), Some(TreeNodeStatus::Finished));
        assert!(character.position().distance(Vec3::new(0.0, 0.0, 1.0)) < 1e-4);
    }

    #[test]
    fn steerings_take_no_arguments() {
        let registry = AIRegistry::new();
        let err = TreeNodeParser::new(&registry)
            .parse("Steer(Wander{1}(SelectionSeek))", NodeFactoryContext::new("s"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Syntax { position: 6, .. }), "{err}");
    }

    #[test]
    fn weight_count_must_match() {
        let registry = AIRegistry::new();
        let err = TreeNodeParser::new(&registry)
            .parse("Steer{1,2,3}(SelectionSeek)", NodeFactoryContext::new("s"))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Registry(_)));
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod loader_tests {
    use std::io::Write;

    use super::*;
    use crate::{load_tree_file, load_tree_reader};

    #[test]
    fn loads_named_trees() {
        let registry = AIRegistry::new();
        let trees = JsonTreeLoader.load(&registry, DOCUMENT).unwrap();
        assert_eq!(trees.keys().map(String::as_str).collect::<Vec<_>>(), ["guard", "idle"]);
        let guard = &trees["guard"];
        assert_eq!(guard.base().name(), "root");
        assert_eq!(guard.base().children().len(), 2);
        assert_eq!(guard.base().children()[0].base().condition().describe(), "HasEnemies");
        // Unnamed nodes are named after their type expression.
        assert_eq!(trees["idle"].base().name(), "Idle{300}");
    }

    #[test]
    fn loaded_tree_ticks() {
        let registry = AIRegistry::new();
        let trees = JsonTreeLoader.load(&registry, DOCUMENT).unwrap();
        let (mut agent, character) = agent_at(Vec3::ZERO, Arc::clone(&trees["guard"]));

        assert_eq!(agent.update(TICK, false), Some(TreeNodeStatus::Finished));
        assert_eq!(character.position(), Vec3::ZERO);

        agent.aggro_mut().add_aggro(CharacterId(5), 1.0);
        assert_eq!(agent.update(Millis(1000), false), Some(TreeNodeStatus::Finished));
        assert!(character.position().distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn two_agents_share_one_tree() {
        let registry = AIRegistry::new();
        let trees = JsonTreeLoader.load(&registry, DOCUMENT).unwrap();
        let idle = &trees["idle"];
        let (mut a, _) = agent_at(Vec3::ZERO, Arc::clone(idle));
        let (mut b, _) = agent_at(Vec3::ZERO, Arc::clone(idle));
        for _ in 0..3 {
            a.update(TICK, false);
        }
        // `a` is on its last tick; `b` has only just started.
        assert_eq!(a.update(TICK, false), Some(TreeNodeStatus::Finished));
        assert_eq!(b.update(TICK, false), Some(TreeNodeStatus::Running));
    }

    #[test]
    fn document_errors() {
        let registry = AIRegistry::new();
        assert!(matches!(JsonTreeLoader.load(&registry, r#"{"trees": []}"#), Err(LoaderError::Empty)));
        assert!(matches!(JsonTreeLoader.load(&registry, "{"), Err(LoaderError::Json(_))));
        assert!(matches!(
            JsonTreeLoader.load(&registry, r#"{"trees": [{"name": "a", "root": {"type": "Idle{1}", "colour": "red"}}]}"#),
            Err(LoaderError::Json(_))
        ));
        let twice = r#"{"trees": [
            {"name": "a", "root": {"type": "Idle{1}"}},
            {"name": "a", "root": {"type": "Idle{2}"}}
        ]}"#;
        assert!(matches!(JsonTreeLoader.load(&registry, twice), Err(LoaderError::DuplicateTree(name)) if name == "a"));
        let unknown = r#"{"trees": [{"name": "a", "root": {"type": "Dance"}}]}"#;
        assert!(matches!(JsonTreeLoader.load(&registry, unknown), Err(LoaderError::Registry(_))));
        let bad_condition = r#"{"trees": [{"name": "a", "root": {"type": "Idle{1}", "condition": "Not("}}]}"#;
        assert!(matches!(JsonTreeLoader.load(&registry, bad_condition), Err(LoaderError::Syntax { .. })));
    }

    #[test]
    fn loads_from_file_and_reader() {
        let registry = AIRegistry::new();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOCUMENT.as_bytes()).unwrap();
        let trees = load_tree_file(&registry, file.path()).unwrap();
        assert_eq!(trees.len(), 2);

        let trees = load_tree_reader(&registry, std::io::Cursor::new(DOCUMENT)).unwrap();
        assert!(trees.contains_key("guard"));

        let missing = file.path().with_extension("missing");
        assert!(matches!(load_tree_file(&registry, &missing), Err(LoaderError::Io(_))));
    }
}

// ── Scripts ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod script_tests {
    use npc_core::MoveVector;
    use npc_tree::{NodeError, node::walk};

    use super::*;
    use crate::{ConditionFactoryContext, FilterFactoryContext};

    #[test]
    fn script_node_reads_parameters() {
        let registry = AIRegistry::new();
        registry
            .register_script_node("Taunt", |ctx, _| {
                let target: i32 = ctx.parameters().parse().map_err(|_| NodeError::fault("bad target"))?;
                ctx.add_aggro(CharacterId(target), 5.0);
                Ok(TreeNodeStatus::Finished)
            })
            .unwrap();
        let tree = node(&registry, "Taunt{7}");
        let (mut agent, _) = agent_at(Vec3::ZERO, tree);
        assert_eq!(agent.update(TICK, false), Some(TreeNodeStatus::Finished));
        assert_eq!(agent.aggro().aggro_of(CharacterId(7)), Some(5.0));
    }

    #[test]
    fn script_node_faults_become_exceptions() {
        let registry = AIRegistry::new();
        registry.register_script_node("Broken", |_, _| Err(NodeError::fault("broken"))).unwrap();
        registry.register_script_node("Panics", |_, _| panic!("script bug")).unwrap();
        let mut seen = 0;
        for kind in ["Broken", "Panics"] {
            let (mut agent, _) = agent_at(Vec3::ZERO, node(&registry, kind));
            assert_eq!(agent.update(TICK, true), Some(TreeNodeStatus::Exception), "{kind}");
            walk(agent.active_behaviour(), &mut |n| {
                assert_eq!(agent.last_status(n.base().id()), Some(TreeNodeStatus::Exception));
                seen += 1;
            });
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn script_condition_and_filter() {
        let registry = AIRegistry::new();
        registry.register_script_condition("IsEven", |ctx| ctx.id().0 % 2 == 0).unwrap();
        registry
            .register_script_filter("SelectSelf", |ctx| {
                let me = ctx.id();
                ctx.filtered_entities_mut().push(me);
            })
            .unwrap();
        registry.register_script_condition("Panics", |_| panic!("script bug")).unwrap();

        let (mut agent, _) = agent_at(Vec3::ZERO, node(&registry, "Idle{0}"));
        let even = registry.create_condition("IsEven", &ConditionFactoryContext::default()).unwrap();
        assert!(!even.evaluate(&mut agent));
        let panics = registry.create_condition("Panics", &ConditionFactoryContext::default()).unwrap();
        assert!(!panics.evaluate(&mut agent));

        let filter = registry.create_filter("SelectSelf", &FilterFactoryContext::default()).unwrap();
        filter.filter(&mut agent);
        assert_eq!(agent.filtered_entities(), &[CharacterId(1)]);

        let cond = ConditionParser::new(&registry).parse("Filter(SelectSelf)").unwrap();
        assert!(cond.evaluate(&mut agent));
    }

    #[test]
    fn script_steering_drives_steer() {
        let registry = AIRegistry::new();
        registry
            .register_script_steering("North", |_, _| Some(MoveVector::towards(Vec3::new(0.0, 0.0, 1.0))))
            .unwrap();
        registry.register_script_steering("Panics", |_, _| panic!("script bug")).unwrap();

        let (mut agent, character) = agent_at(Vec3::ZERO, node(&registry, "Steer(North)"));
        assert_eq!(agent.update(Millis(2000), false), Some(TreeNodeStatus::Finished));
        assert!(character.position().distance(Vec3::new(0.0, 0.0, 2.0)) < 1e-4);

        let (mut agent, _) = agent_at(Vec3::ZERO, node(&registry, "Steer(Panics)"));
        assert_eq!(agent.update(TICK, false), Some(TreeNodeStatus::Failed));
    }

    #[test]
    fn duplicate_script_names_are_rejected() {
        let registry = AIRegistry::new();
        assert!(registry.register_script_condition("HasEnemies", |_| true).is_err());
    }
}
