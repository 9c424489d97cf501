//! Conditions: boolean predicates over an agent.
//!
//! A condition attached to a node is its guard.  Conditions read the agent
//! (aggro table, candidate list, zone); only `Filter` writes, and only the
//! candidate list.
//!
//! | Name             | Parameters         | True when                                      |
//! |------------------|--------------------|------------------------------------------------|
//! | `True`           | –                  | always                                         |
//! | `False`          | –                  | never                                          |
//! | `And` / `Or`     | ≥1 child           | all / any child, short-circuit left to right   |
//! | `Not`            | 1 child            | the child is false                             |
//! | `HasEnemies`     | optional count     | aggro table holds at least that many (1) entries |
//! | `IsGroupLeader`  | group              | the agent leads the group                      |
//! | `IsInGroup`      | optional group     | member of that group, or of any group          |
//! | `IsCloseToGroup` | `group,distance`   | within `distance` of the group's average position |
//! | `Filter`         | ≥1 filter          | running the filters leaves a non-empty list    |

use std::fmt;
use std::sync::{Arc, OnceLock};

use npc_core::GroupId;

use crate::agent::Agent;
use crate::filter::{FilterPtr, describe_filters};

pub type ConditionPtr = Arc<dyn Condition>;

pub trait Condition: Send + Sync {
    fn evaluate(&self, agent: &mut Agent) -> bool;

    fn name(&self) -> &str;

    /// Parameter text, as it would appear between braces.
    fn parameters(&self) -> String {
        String::new()
    }

    fn children(&self) -> &[ConditionPtr] {
        &[]
    }

    /// Expression form, e.g. `And(Not(HasEnemies{2}),True)`.
    fn describe(&self) -> String {
        let mut out = self.name().to_string();
        let params = self.parameters();
        if !params.is_empty() {
            out.push('{');
            out.push_str(&params);
            out.push('}');
        }
        let children = self.children();
        if !children.is_empty() {
            let inner: Vec<String> = children.iter().map(|c| c.describe()).collect();
            out.push('(');
            out.push_str(&inner.join(","));
            out.push(')');
        }
        out
    }
}

impl fmt::Debug for dyn Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Combinators on shared conditions.
pub trait ConditionExt {
    fn and(self, other: ConditionPtr) -> ConditionPtr;
    fn or(self, other: ConditionPtr) -> ConditionPtr;
    fn not(self) -> ConditionPtr;
}

impl ConditionExt for ConditionPtr {
    fn and(self, other: ConditionPtr) -> ConditionPtr {
        Arc::new(And::new(vec![self, other]))
    }

    fn or(self, other: ConditionPtr) -> ConditionPtr {
        Arc::new(Or::new(vec![self, other]))
    }

    fn not(self) -> ConditionPtr {
        Arc::new(Not::new(self))
    }
}

// ── Constants ─────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct True;

impl True {
    pub const NAME: &'static str = "True";

    /// The process-wide instance used as every node's default guard.
    pub fn shared() -> ConditionPtr {
        static SHARED: OnceLock<ConditionPtr> = OnceLock::new();
        Arc::clone(SHARED.get_or_init(|| Arc::new(True)))
    }
}

impl Condition for True {
    fn evaluate(&self, _agent: &mut Agent) -> bool {
        true
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct False;

impl False {
    pub const NAME: &'static str = "False";
}

impl Condition for False {
    fn evaluate(&self, _agent: &mut Agent) -> bool {
        false
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── Logic ─────────────────────────────────────────────────────────────────────

pub struct And {
    children: Vec<ConditionPtr>,
}

impl And {
    pub const NAME: &'static str = "And";

    pub fn new(children: Vec<ConditionPtr>) -> Self {
        Self { children }
    }
}

impl Condition for And {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        self.children.iter().all(|c| c.evaluate(agent))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn children(&self) -> &[ConditionPtr] {
        &self.children
    }
}

pub struct Or {
    children: Vec<ConditionPtr>,
}

impl Or {
    pub const NAME: &'static str = "Or";

    pub fn new(children: Vec<ConditionPtr>) -> Self {
        Self { children }
    }
}

impl Condition for Or {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        self.children.iter().any(|c| c.evaluate(agent))
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn children(&self) -> &[ConditionPtr] {
        &self.children
    }
}

pub struct Not {
    child: [ConditionPtr; 1],
}

impl Not {
    pub const NAME: &'static str = "Not";

    pub fn new(child: ConditionPtr) -> Self {
        Self { child: [child] }
    }
}

impl Condition for Not {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        !self.child[0].evaluate(agent)
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn children(&self) -> &[ConditionPtr] {
        &self.child
    }
}

// ── Aggro ─────────────────────────────────────────────────────────────────────

pub struct HasEnemies {
    count: Option<usize>,
}

impl HasEnemies {
    pub const NAME: &'static str = "HasEnemies";

    /// With `None`, any entry in the aggro table is enough.
    pub fn new(count: Option<usize>) -> Self {
        Self { count }
    }
}

impl Condition for HasEnemies {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        agent.aggro().len() >= self.count.unwrap_or(1).max(1)
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.count.map(|n| n.to_string()).unwrap_or_default()
    }
}

// ── Groups ────────────────────────────────────────────────────────────────────

pub struct IsGroupLeader {
    group: GroupId,
}

impl IsGroupLeader {
    pub const NAME: &'static str = "IsGroupLeader";

    pub fn new(group: GroupId) -> Self {
        Self { group }
    }
}

impl Condition for IsGroupLeader {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        let Some(zone) = agent.zone() else {
            return false;
        };
        zone.groups().is_group_leader(self.group, agent.id())
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.group.0.to_string()
    }
}

pub struct IsInGroup {
    group: Option<GroupId>,
}

impl IsInGroup {
    pub const NAME: &'static str = "IsInGroup";

    pub fn new(group: Option<GroupId>) -> Self {
        Self { group }
    }
}

impl Condition for IsInGroup {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        let Some(zone) = agent.zone() else {
            return false;
        };
        zone.groups().is_in_group(agent.id(), self.group)
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.group.map(|g| g.0.to_string()).unwrap_or_default()
    }
}

pub struct IsCloseToGroup {
    group:    GroupId,
    distance: f32,
}

impl IsCloseToGroup {
    pub const NAME: &'static str = "IsCloseToGroup";

    pub fn new(group: GroupId, distance: f32) -> Self {
        Self { group, distance }
    }
}

impl Condition for IsCloseToGroup {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        match agent.group_position(self.group) {
            Some(center) => agent.character().position().distance(center) <= self.distance,
            None => false,
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        format!("{},{}", self.group.0, self.distance)
    }
}

// ── Filter ────────────────────────────────────────────────────────────────────

/// Clears the candidate list, runs its filters in order and is true if any
/// candidate is left.
pub struct FilterCondition {
    filters: Vec<FilterPtr>,
}

impl FilterCondition {
    pub const NAME: &'static str = "Filter";

    pub fn new(filters: Vec<FilterPtr>) -> Self {
        Self { filters }
    }

    pub fn filters(&self) -> &[FilterPtr] {
        &self.filters
    }
}

impl Condition for FilterCondition {
    fn evaluate(&self, agent: &mut Agent) -> bool {
        agent.filtered_entities_mut().clear();
        for filter in &self.filters {
            filter.filter(agent);
        }
        !agent.filtered_entities().is_empty()
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn describe(&self) -> String {
        format!("{}({})", Self::NAME, describe_filters(&self.filters))
    }
}
