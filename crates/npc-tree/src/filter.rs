//! Filters: fill and narrow the agent's candidate list.
//!
//! Filters return nothing; their output is the candidate list itself.  An
//! empty list is a valid result and never an error.
//!
//! The composites other than `Chain` snapshot the list, run their children
//! on a cleared list, and then rebuild it as *snapshot + selection*, so the
//! candidates seen so far are kept while only the new selection is added.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use npc_core::{CharacterId, GroupId};
use tracing::trace;

use crate::agent::Agent;

pub type FilterPtr = Arc<dyn Filter>;

pub trait Filter: Send + Sync {
    fn filter(&self, agent: &mut Agent);

    fn name(&self) -> &str;

    fn parameters(&self) -> String {
        String::new()
    }

    fn children(&self) -> &[FilterPtr] {
        &[]
    }

    /// Expression form, e.g. `Last(SelectZone)`.
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
            out.push('(');
            out.push_str(&describe_filters(children));
            out.push(')');
        }
        out
    }
}

impl fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

pub(crate) fn describe_filters(filters: &[FilterPtr]) -> String {
    filters.iter().map(|f| f.describe()).collect::<Vec<_>>().join(",")
}

/// Run `child` on a cleared list and return what it produced, leaving the
/// list empty.
fn run_isolated(agent: &mut Agent, child: &FilterPtr) -> Vec<CharacterId> {
    agent.filtered_entities_mut().clear();
    child.filter(agent);
    std::mem::take(agent.filtered_entities_mut())
}

/// Replace the list with `snapshot` followed by `selection`.
fn restore(agent: &mut Agent, mut snapshot: Vec<CharacterId>, selection: impl IntoIterator<Item = CharacterId>) {
    snapshot.extend(selection);
    *agent.filtered_entities_mut() = snapshot;
}

// ── Leaf filters ──────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectEmpty;

impl SelectEmpty {
    pub const NAME: &'static str = "SelectEmpty";
}

impl Filter for SelectEmpty {
    fn filter(&self, agent: &mut Agent) {
        agent.filtered_entities_mut().clear();
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectHighestAggro;

impl SelectHighestAggro {
    pub const NAME: &'static str = "SelectHighestAggro";
}

impl Filter for SelectHighestAggro {
    fn filter(&self, agent: &mut Agent) {
        if let Some(entry) = agent.aggro().highest_entry() {
            agent.filtered_entities_mut().push(entry.target);
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Every aggro target above a threshold, best first.
#[derive(Debug, Clone, Copy)]
pub struct SelectAggroAbove {
    threshold: f64,
}

impl SelectAggroAbove {
    pub const NAME: &'static str = "SelectAggroAbove";

    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Filter for SelectAggroAbove {
    fn filter(&self, agent: &mut Agent) {
        let targets: Vec<CharacterId> =
            agent.aggro().entries_above(self.threshold).map(|e| e.target).collect();
        agent.filtered_entities_mut().extend(targets);
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.threshold.to_string()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SelectGroupLeader {
    group: GroupId,
}

impl SelectGroupLeader {
    pub const NAME: &'static str = "SelectGroupLeader";

    pub fn new(group: GroupId) -> Self {
        Self { group }
    }
}

impl Filter for SelectGroupLeader {
    fn filter(&self, agent: &mut Agent) {
        let Some(zone) = agent.zone() else {
            return;
        };
        let leader = zone.groups().leader(self.group);
        if let Some(leader) = leader {
            agent.filtered_entities_mut().push(leader);
        }
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.group.0.to_string()
    }
}

/// Members of a group other than the agent itself.
#[derive(Debug, Clone, Copy)]
pub struct SelectGroupMembers {
    group: GroupId,
}

impl SelectGroupMembers {
    pub const NAME: &'static str = "SelectGroupMembers";

    pub fn new(group: GroupId) -> Self {
        Self { group }
    }
}

impl Filter for SelectGroupMembers {
    fn filter(&self, agent: &mut Agent) {
        let Some(zone) = agent.zone() else {
            return;
        };
        let me = agent.id();
        let members = zone.groups().members(self.group);
        agent.filtered_entities_mut().extend(members.into_iter().filter(|&id| id != me));
    }

    fn name(&self) -> &str {
        Self::NAME
    }

    fn parameters(&self) -> String {
        self.group.0.to_string()
    }
}

/// Every other character in the agent's zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectZone;

impl SelectZone {
    pub const NAME: &'static str = "SelectZone";
}

impl Filter for SelectZone {
    fn filter(&self, agent: &mut Agent) {
        let Some(zone) = agent.zone() else {
            trace!(character = agent.id().0, "SelectZone without a zone");
            return;
        };
        let me = agent.id();
        let ids = zone.character_ids();
        agent.filtered_entities_mut().extend(ids.into_iter().filter(|&id| id != me));
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── Composite filters ─────────────────────────────────────────────────────────

macro_rules! composite_filter {
    ($(#[$attr:meta])* $name:ident, $label:literal) => {
        $(#[$attr])*
        pub struct $name {
            children: Vec<FilterPtr>,
        }

        impl $name {
            pub const NAME: &'static str = $label;

            pub fn new(children: Vec<FilterPtr>) -> Self {
                Self { children }
            }
        }
    };
}

macro_rules! filter_names {
    () => {
        fn name(&self) -> &str {
            Self::NAME
        }

        fn children(&self) -> &[FilterPtr] {
            &self.children
        }
    };
}

composite_filter! {
    /// Runs the children in order on the shared list.
    Chain, "Chain"
}

impl Filter for Chain {
    fn filter(&self, agent: &mut Agent) {
        for child in &self.children {
            child.filter(agent);
        }
    }

    filter_names!();
}

composite_filter! {
    /// Keeps the prior list and appends only the final element the (first)
    /// child produced.  `[A, B, C]` with a child yielding `[X, Y, Z]`
    /// becomes `[A, B, C, Z]`.
    Last, "Last"
}

impl Filter for Last {
    fn filter(&self, agent: &mut Agent) {
        let Some(child) = self.children.first() else {
            return;
        };
        let snapshot = agent.filtered_entities().to_vec();
        let produced = run_isolated(agent, child);
        restore(agent, snapshot, produced.last().copied());
    }

    filter_names!();
}

composite_filter! {
    /// Keeps the prior list and appends the first element the child produced.
    First, "First"
}

impl Filter for First {
    fn filter(&self, agent: &mut Agent) {
        let Some(child) = self.children.first() else {
            return;
        };
        let snapshot = agent.filtered_entities().to_vec();
        let produced = run_isolated(agent, child);
        restore(agent, snapshot, produced.first().copied());
    }

    filter_names!();
}

composite_filter! {
    /// Keeps the prior list and appends the sorted union of the children.
    Union, "Union"
}

impl Filter for Union {
    fn filter(&self, agent: &mut Agent) {
        let snapshot = agent.filtered_entities().to_vec();
        let mut union = BTreeSet::new();
        for child in &self.children {
            union.extend(run_isolated(agent, child));
        }
        restore(agent, snapshot, union);
    }

    filter_names!();
}

composite_filter! {
    /// Keeps the prior list and appends the sorted intersection of the children.
    Intersection, "Intersection"
}

impl Filter for Intersection {
    fn filter(&self, agent: &mut Agent) {
        let snapshot = agent.filtered_entities().to_vec();
        let mut result: Option<BTreeSet<CharacterId>> = None;
        for child in &self.children {
            let set: BTreeSet<CharacterId> = run_isolated(agent, child).into_iter().collect();
            result = Some(match result {
                None => set,
                Some(acc) => acc.intersection(&set).copied().collect(),
            });
        }
        restore(agent, snapshot, result.unwrap_or_default());
    }

    filter_names!();
}

composite_filter! {
    /// Keeps the prior list and appends the first child's output minus
    /// everything the other children produced, sorted.
    Difference, "Difference"
}

impl Filter for Difference {
    fn filter(&self, agent: &mut Agent) {
        let snapshot = agent.filtered_entities().to_vec();
        let mut children = self.children.iter();
        let Some(first) = children.next() else {
            return;
        };
        let mut result: BTreeSet<CharacterId> = run_isolated(agent, first).into_iter().collect();
        for child in children {
            for id in run_isolated(agent, child) {
                result.remove(&id);
            }
        }
        restore(agent, snapshot, result);
    }

    filter_names!();
}

/// Keeps the prior list and appends `count` random elements of the child's
/// output, drawn with the agent's RNG.
pub struct RandomFilter {
    count:    usize,
    children: Vec<FilterPtr>,
}

impl RandomFilter {
    pub const NAME: &'static str = "Random";

    pub fn new(count: usize, children: Vec<FilterPtr>) -> Self {
        Self { count, children }
    }
}

impl Filter for RandomFilter {
    fn filter(&self, agent: &mut Agent) {
        let Some(child) = self.children.first() else {
            return;
        };
        let snapshot = agent.filtered_entities().to_vec();
        let produced = run_isolated(agent, child);
        let picked = agent.rng().choose_multiple(&produced, self.count);
        restore(agent, snapshot, picked);
    }

    fn parameters(&self) -> String {
        self.count.to_string()
    }

    filter_names!();
}
