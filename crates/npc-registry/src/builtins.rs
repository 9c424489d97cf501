//! Factories for every built-in type, and the parameter grammar they share.
//!
//! | Parameter form | Example              | Used by                                   |
//! |----------------|----------------------|-------------------------------------------|
//! | integer        | `Idle{1500}`         | `Idle`, `Limit`, `HasEnemies`, `Random`   |
//! | float          | `Wander{0.5}`        | `Wander`, `SelectAggroAbove`              |
//! | group id       | `IsGroupLeader{3}`   | group conditions, filters and steerings   |
//! | list           | `IsCloseToGroup{3,10}`, `ProbabilitySelector{1,3}` | comma separated |
//! | position       | `TargetSeek{1:0:5}`  | `x:y:z`                                   |

use std::str::FromStr;
use std::sync::Arc;

use npc_core::{GroupId, Millis, Vec3};
use npc_tree::condition::{
    And, False, FilterCondition, HasEnemies, IsCloseToGroup, IsGroupLeader, IsInGroup, Not, Or, True,
};
use npc_tree::filter::{
    Chain, Difference, First, Intersection, Last, RandomFilter, SelectAggroAbove, SelectEmpty,
    SelectGroupLeader, SelectGroupMembers, SelectHighestAggro, SelectZone, Union,
};
use npc_tree::node::composite::{Parallel, PrioritySelector, ProbabilitySelector, RandomSelector, Sequence};
use npc_tree::node::decorator::{Fail, Invert, Limit, Succeed};
use npc_tree::node::leaf::{Idle, Print, Steer};
use npc_tree::steering::{
    GroupFlee, GroupSeek, SelectionFlee, SelectionSeek, TargetFlee, TargetSeek, Wander,
};
use npc_tree::{ConditionPtr, FilterPtr, IntoTree, SteeringPtr, WeightedSteering};
use tracing::error;

use crate::error::{RegistryError, RegistryResult};
use crate::factory::{Arity, ConditionFactoryContext, FilterFactoryContext, NodeFactoryContext};
use crate::registry::AIRegistry;

pub(crate) fn register_all(registry: &AIRegistry) {
    let results = [
        register_nodes(registry),
        register_conditions(registry),
        register_filters(registry),
        register_steerings(registry),
    ];
    for err in results.into_iter().filter_map(Result::err) {
        error!(error = %err, "built-in registration failed");
    }
}

// ── Parameter parsing ─────────────────────────────────────────────────────────

pub(crate) fn number<T>(kind: &str, text: &str) -> RegistryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    text.trim().parse::<T>().map_err(|e| RegistryError::invalid(kind, text, e.to_string()))
}

/// `None` for empty parameter text.
pub(crate) fn optional<T>(kind: &str, text: &str) -> RegistryResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if text.trim().is_empty() { Ok(None) } else { number(kind, text).map(Some) }
}

pub(crate) fn list<T>(kind: &str, text: &str) -> RegistryResult<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    text.split(',').map(|part| number(kind, part)).collect()
}

fn finite(kind: &str, text: &str) -> RegistryResult<f32> {
    let value: f32 = number(kind, text)?;
    if value.is_finite() { Ok(value) } else { Err(RegistryError::invalid(kind, text, "not a finite number")) }
}

fn group(kind: &str, text: &str) -> RegistryResult<GroupId> {
    let group = GroupId(number(kind, text)?);
    if group.is_valid() { Ok(group) } else { Err(RegistryError::invalid(kind, text, "reserved group id")) }
}

fn position(kind: &str, text: &str) -> RegistryResult<Vec3> {
    let parts: Vec<&str> = text.split(':').collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(RegistryError::invalid(kind, text, "expected x:y:z"));
    };
    Ok(Vec3::new(finite(kind, x)?, finite(kind, y)?, finite(kind, z)?))
}

fn weights(kind: &str, text: &str, expected: usize) -> RegistryResult<Vec<f32>> {
    let weights: Vec<f32> = list(kind, text)?;
    if weights.is_empty() {
        return Ok(vec![1.0; expected]);
    }
    if weights.len() != expected {
        return Err(RegistryError::invalid(kind, text, format!("expected {expected} weights")));
    }
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(RegistryError::invalid(kind, text, "weights must be finite and non-negative"));
    }
    Ok(weights)
}

fn no_parameters(kind: &str, text: &str) -> RegistryResult<()> {
    if text.trim().is_empty() { Ok(()) } else { Err(RegistryError::invalid(kind, text, "takes no parameters")) }
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

fn register_nodes(r: &AIRegistry) -> RegistryResult<()> {
    macro_rules! plain {
        ($ty:ident, $arity:expr) => {
            r.register_node_factory($ty::KIND, |ctx: &NodeFactoryContext| {
                ctx.expect_children($ty::KIND, $arity)?;
                Ok($ty::new(ctx.base($ty::KIND)).into_tree())
            })?;
        };
    }

    plain!(PrioritySelector, Arity::AtLeastOne);
    plain!(Sequence, Arity::AtLeastOne);
    plain!(Parallel, Arity::AtLeastOne);
    plain!(RandomSelector, Arity::AtLeastOne);
    plain!(Succeed, Arity::One);
    plain!(Fail, Arity::One);
    plain!(Invert, Arity::One);
    plain!(Print, Arity::None);

    r.register_node_factory(ProbabilitySelector::KIND, |ctx| {
        let kind = ProbabilitySelector::KIND;
        ctx.expect_children(kind, Arity::AtLeastOne)?;
        let weights = weights(kind, &ctx.parameters, ctx.children.len())?;
        Ok(ProbabilitySelector::new(ctx.base(kind), weights).into_tree())
    })?;

    r.register_node_factory(Limit::KIND, |ctx| {
        ctx.expect_children(Limit::KIND, Arity::One)?;
        let amount: u32 = number(Limit::KIND, &ctx.parameters)?;
        Ok(Limit::new(ctx.base(Limit::KIND), amount).into_tree())
    })?;

    r.register_node_factory(Idle::KIND, |ctx| {
        ctx.expect_children(Idle::KIND, Arity::None)?;
        let millis: i64 = number(Idle::KIND, &ctx.parameters)?;
        Ok(Idle::node(ctx.base(Idle::KIND), Millis(millis)).into_tree())
    })?;

    r.register_node_factory(Steer::KIND, |ctx| {
        let kind = Steer::KIND;
        ctx.expect_children(kind, Arity::None)?;
        if ctx.steerings.is_empty() {
            return Err(RegistryError::invalid(kind, "", "needs at least one steering"));
        }
        let weights = weights(kind, &ctx.parameters, ctx.steerings.len())?;
        let parts: Vec<(SteeringPtr, f32)> = ctx.steerings.iter().cloned().zip(weights).collect();
        Ok(Steer::new(ctx.base(kind), WeightedSteering::new(parts)).into_tree())
    })?;

    Ok(())
}

// ── Conditions ────────────────────────────────────────────────────────────────

fn leaf_condition(kind: &str, ctx: &ConditionFactoryContext) -> RegistryResult<()> {
    Arity::None.check(kind, ctx.children.len() + ctx.filters.len())
}

fn register_conditions(r: &AIRegistry) -> RegistryResult<()> {
    r.register_condition_factory(True::NAME, |ctx| {
        leaf_condition(True::NAME, ctx)?;
        no_parameters(True::NAME, &ctx.parameters)?;
        Ok(True::shared())
    })?;
    r.register_condition_factory(False::NAME, |ctx| {
        leaf_condition(False::NAME, ctx)?;
        no_parameters(False::NAME, &ctx.parameters)?;
        Ok(Arc::new(False) as ConditionPtr)
    })?;
    r.register_condition_factory(And::NAME, |ctx| {
        Arity::AtLeastOne.check(And::NAME, ctx.children.len())?;
        Ok(Arc::new(And::new(ctx.children.clone())) as ConditionPtr)
    })?;
    r.register_condition_factory(Or::NAME, |ctx| {
        Arity::AtLeastOne.check(Or::NAME, ctx.children.len())?;
        Ok(Arc::new(Or::new(ctx.children.clone())) as ConditionPtr)
    })?;
    r.register_condition_factory(Not::NAME, |ctx| {
        Arity::One.check(Not::NAME, ctx.children.len())?;
        Ok(Arc::new(Not::new(Arc::clone(&ctx.children[0]))) as ConditionPtr)
    })?;
    r.register_condition_factory(HasEnemies::NAME, |ctx| {
        leaf_condition(HasEnemies::NAME, ctx)?;
        let count: Option<usize> = optional(HasEnemies::NAME, &ctx.parameters)?;
        Ok(Arc::new(HasEnemies::new(count)) as ConditionPtr)
    })?;
    r.register_condition_factory(IsGroupLeader::NAME, |ctx| {
        leaf_condition(IsGroupLeader::NAME, ctx)?;
        let g = group(IsGroupLeader::NAME, &ctx.parameters)?;
        Ok(Arc::new(IsGroupLeader::new(g)) as ConditionPtr)
    })?;
    r.register_condition_factory(IsInGroup::NAME, |ctx| {
        leaf_condition(IsInGroup::NAME, ctx)?;
        let g = if ctx.parameters.trim().is_empty() {
            None
        } else {
            Some(group(IsInGroup::NAME, &ctx.parameters)?)
        };
        Ok(Arc::new(IsInGroup::new(g)) as ConditionPtr)
    })?;
    r.register_condition_factory(IsCloseToGroup::NAME, |ctx| {
        let kind = IsCloseToGroup::NAME;
        leaf_condition(kind, ctx)?;
        let Some((g, distance)) = ctx.parameters.split_once(',') else {
            return Err(RegistryError::invalid(kind, &ctx.parameters, "expected group,distance"));
        };
        Ok(Arc::new(IsCloseToGroup::new(group(kind, g)?, finite(kind, distance)?)) as ConditionPtr)
    })?;
    r.register_condition_factory(FilterCondition::NAME, |ctx| {
        let kind = FilterCondition::NAME;
        Arity::None.check(kind, ctx.children.len())?;
        Arity::AtLeastOne.check(kind, ctx.filters.len())?;
        Ok(Arc::new(FilterCondition::new(ctx.filters.clone())) as ConditionPtr)
    })?;
    Ok(())
}

// ── Filters ───────────────────────────────────────────────────────────────────

fn register_filters(r: &AIRegistry) -> RegistryResult<()> {
    macro_rules! unit {
        ($ty:ident) => {
            r.register_filter_factory($ty::NAME, |ctx: &FilterFactoryContext| {
                Arity::None.check($ty::NAME, ctx.children.len())?;
                no_parameters($ty::NAME, &ctx.parameters)?;
                Ok(Arc::new($ty) as FilterPtr)
            })?;
        };
    }
    macro_rules! composite {
        ($ty:ident, $arity:expr) => {
            r.register_filter_factory($ty::NAME, |ctx: &FilterFactoryContext| {
                $arity.check($ty::NAME, ctx.children.len())?;
                Ok(Arc::new($ty::new(ctx.children.clone())) as FilterPtr)
            })?;
        };
    }
    macro_rules! grouped {
        ($ty:ident) => {
            r.register_filter_factory($ty::NAME, |ctx: &FilterFactoryContext| {
                Arity::None.check($ty::NAME, ctx.children.len())?;
                Ok(Arc::new($ty::new(group($ty::NAME, &ctx.parameters)?)) as FilterPtr)
            })?;
        };
    }

    unit!(SelectEmpty);
    unit!(SelectHighestAggro);
    unit!(SelectZone);
    grouped!(SelectGroupLeader);
    grouped!(SelectGroupMembers);
    composite!(Chain, Arity::AtLeastOne);
    composite!(Union, Arity::AtLeastOne);
    composite!(Intersection, Arity::AtLeastOne);
    composite!(Difference, Arity::AtLeastOne);
    composite!(Last, Arity::One);
    composite!(First, Arity::One);

    r.register_filter_factory(SelectAggroAbove::NAME, |ctx| {
        let kind = SelectAggroAbove::NAME;
        Arity::None.check(kind, ctx.children.len())?;
        let threshold: f64 = number(kind, &ctx.parameters)?;
        Ok(Arc::new(SelectAggroAbove::new(threshold)) as FilterPtr)
    })?;
    r.register_filter_factory(RandomFilter::NAME, |ctx| {
        let kind = RandomFilter::NAME;
        Arity::One.check(kind, ctx.children.len())?;
        let count: usize = number(kind, &ctx.parameters)?;
        Ok(Arc::new(RandomFilter::new(count, ctx.children.clone())) as FilterPtr)
    })?;
    Ok(())
}

// ── Steerings ─────────────────────────────────────────────────────────────────

fn register_steerings(r: &AIRegistry) -> RegistryResult<()> {
    r.register_steering_factory(Wander::NAME, |ctx| {
        Ok(Arc::new(Wander::new(finite(Wander::NAME, &ctx.parameters)?)) as SteeringPtr)
    })?;
    r.register_steering_factory(TargetSeek::NAME, |ctx| {
        Ok(Arc::new(TargetSeek::new(position(TargetSeek::NAME, &ctx.parameters)?)) as SteeringPtr)
    })?;
    r.register_steering_factory(TargetFlee::NAME, |ctx| {
        Ok(Arc::new(TargetFlee::new(position(TargetFlee::NAME, &ctx.parameters)?)) as SteeringPtr)
    })?;
    r.register_steering_factory(GroupSeek::NAME, |ctx| {
        Ok(Arc::new(GroupSeek::new(group(GroupSeek::NAME, &ctx.parameters)?)) as SteeringPtr)
    })?;
    r.register_steering_factory(GroupFlee::NAME, |ctx| {
        Ok(Arc::new(GroupFlee::new(group(GroupFlee::NAME, &ctx.parameters)?)) as SteeringPtr)
    })?;
    r.register_steering_factory(SelectionSeek::NAME, |ctx| {
        no_parameters(SelectionSeek::NAME, &ctx.parameters)?;
        Ok(Arc::new(SelectionSeek) as SteeringPtr)
    })?;
    r.register_steering_factory(SelectionFlee::NAME, |ctx| {
        no_parameters(SelectionFlee::NAME, &ctx.parameters)?;
        Ok(Arc::new(SelectionFlee) as SteeringPtr)
    })?;
    Ok(())
}
