//! Group membership for one zone.
//!
//! A group is an ordered list of members.  The first member is the leader;
//! when the leader leaves, the next member in insertion order takes over.
//! Empty groups are dropped.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use npc_core::{Character, CharacterId, GroupId, Vec3};
use tracing::debug;

#[derive(Default)]
pub struct GroupMgr {
    groups: BTreeMap<GroupId, Vec<Arc<dyn Character>>>,
}

impl fmt::Debug for GroupMgr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (group, members) in &self.groups {
            let ids: Vec<CharacterId> = members.iter().map(|c| c.id()).collect();
            map.entry(group, &ids);
        }
        map.finish()
    }
}

impl GroupMgr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `character` to `group`, creating the group if needed.
    ///
    /// Returns `false` if the character is already a member or `group` is the
    /// invalid sentinel.
    pub fn add(&mut self, group: GroupId, character: Arc<dyn Character>) -> bool {
        if !group.is_valid() {
            return false;
        }
        let members = self.groups.entry(group).or_default();
        let id = character.id();
        if members.iter().any(|c| c.id() == id) {
            return false;
        }
        members.push(character);
        true
    }

    /// Remove `id` from `group`.  Returns `false` if it was not a member.
    pub fn remove(&mut self, group: GroupId, id: CharacterId) -> bool {
        let Some(members) = self.groups.get_mut(&group) else {
            return false;
        };
        let Some(pos) = members.iter().position(|c| c.id() == id) else {
            return false;
        };
        members.remove(pos);
        if members.is_empty() {
            self.groups.remove(&group);
        } else if pos == 0 {
            debug!(group = group.0, leader = members[0].id().0, "group leader reassigned");
        }
        true
    }

    /// Remove `id` from every group.  Returns the number of groups it left.
    pub fn remove_from_all(&mut self, id: CharacterId) -> usize {
        let groups: Vec<GroupId> = self
            .groups
            .iter()
            .filter(|(_, members)| members.iter().any(|c| c.id() == id))
            .map(|(group, _)| *group)
            .collect();
        groups.iter().filter(|&&group| self.remove(group, id)).count()
    }

    pub fn leader(&self, group: GroupId) -> Option<CharacterId> {
        self.groups.get(&group)?.first().map(|c| c.id())
    }

    pub fn is_group_leader(&self, group: GroupId, id: CharacterId) -> bool {
        self.leader(group) == Some(id)
    }

    /// With `Some(group)`, whether `id` is a member of that group.  With
    /// `None`, whether it belongs to any group.
    pub fn is_in_group(&self, id: CharacterId, group: Option<GroupId>) -> bool {
        match group {
            Some(group) => self
                .groups
                .get(&group)
                .is_some_and(|members| members.iter().any(|c| c.id() == id)),
            None => self.groups.values().any(|members| members.iter().any(|c| c.id() == id)),
        }
    }

    /// Member ids in insertion order (leader first).
    pub fn members(&self, group: GroupId) -> Vec<CharacterId> {
        self.groups
            .get(&group)
            .map(|members| members.iter().map(|c| c.id()).collect())
            .unwrap_or_default()
    }

    /// Average position of the members; `None` for an unknown group.
    pub fn position(&self, group: GroupId) -> Option<Vec3> {
        let members = self.groups.get(&group)?;
        Vec3::average(members.iter().map(|c| c.position()))
    }

    pub fn size(&self, group: GroupId) -> usize {
        self.groups.get(&group).map_or(0, Vec::len)
    }

    /// Groups `id` belongs to, ascending.
    pub fn groups_of(&self, id: CharacterId) -> Vec<GroupId> {
        self.groups
            .iter()
            .filter(|(_, members)| members.iter().any(|c| c.id() == id))
            .map(|(group, _)| *group)
            .collect()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
