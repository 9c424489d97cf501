//! `ZoneInfo`: the read-mostly state of a zone.
//!
//! The owning zone writes the directory when agents join or leave; agents
//! read it during their ticks through a `Weak<ZoneInfo>`.  Both maps sit
//! behind `RwLock`s, and poisoned locks are recovered rather than
//! propagated, since every writer leaves the maps in a consistent state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use npc_core::{Character, CharacterId, GroupId, Vec3};

use crate::group::GroupMgr;

pub struct ZoneInfo {
    name:       String,
    characters: RwLock<BTreeMap<CharacterId, Arc<dyn Character>>>,
    groups:     RwLock<GroupMgr>,
}

impl fmt::Debug for ZoneInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZoneInfo")
            .field("name", &self.name)
            .field("characters", &self.character_ids())
            .field("groups", &*self.groups())
            .finish()
    }
}

impl ZoneInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            characters: RwLock::new(BTreeMap::new()),
            groups:     RwLock::new(GroupMgr::new()),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ── Character directory ───────────────────────────────────────────────

    /// Register `character`.  Returns `false` if its id is already present.
    pub fn insert_character(&self, character: Arc<dyn Character>) -> bool {
        let mut map = self.characters.write().unwrap_or_else(PoisonError::into_inner);
        let id = character.id();
        if map.contains_key(&id) {
            return false;
        }
        map.insert(id, character);
        true
    }

    /// Remove a character from the directory and from every group.
    pub fn remove_character(&self, id: CharacterId) -> Option<Arc<dyn Character>> {
        let removed = self
            .characters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        self.groups_mut().remove_from_all(id);
        removed
    }

    pub fn character(&self, id: CharacterId) -> Option<Arc<dyn Character>> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn contains(&self, id: CharacterId) -> bool {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// All character ids, ascending.
    pub fn character_ids(&self) -> Vec<CharacterId> {
        self.characters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .copied()
            .collect()
    }

    pub fn position_of(&self, id: CharacterId) -> Option<Vec3> {
        self.character(id).map(|c| c.position())
    }

    pub fn len(&self) -> usize {
        self.characters.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ── Groups ────────────────────────────────────────────────────────────

    pub fn groups(&self) -> RwLockReadGuard<'_, GroupMgr> {
        self.groups.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn groups_mut(&self) -> RwLockWriteGuard<'_, GroupMgr> {
        self.groups.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a registered character to `group`.  Returns `false` if the
    /// character is unknown to this zone or already in the group.
    pub fn join_group(&self, group: GroupId, id: CharacterId) -> bool {
        match self.character(id) {
            Some(character) => self.groups_mut().add(group, character),
            None => false,
        }
    }

    pub fn group_position(&self, group: GroupId) -> Option<Vec3> {
        self.groups().position(group)
    }
}
