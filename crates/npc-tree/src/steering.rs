//! Steering behaviours: per-tick movement directions.
//!
//! A steering returns a unit direction plus the orientation to face, or
//! `None` when it has no valid move this tick (no target, already there).
//! The `Steer` node scales the result by speed and elapsed time.

use std::fmt;
use std::sync::Arc;

use npc_core::{GroupId, MoveVector, Vec3};

use crate::agent::Agent;

pub type SteeringPtr = Arc<dyn Steering>;

pub trait Steering: Send + Sync {
    fn execute(&self, agent: &mut Agent, speed: f32) -> Option<MoveVector>;

    fn name(&self) -> &str;
}

impl fmt::Debug for dyn Steering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn seek(from: Vec3, to: Vec3) -> Option<MoveVector> {
    (to - from).normalized().map(MoveVector::towards)
}

fn flee(from: Vec3, to: Vec3) -> Option<MoveVector> {
    (from - to).normalized().map(MoveVector::towards)
}

// ── Wander ────────────────────────────────────────────────────────────────────

/// Keeps walking forward while turning by a random amount of up to
/// `rotation` radians each tick.
#[derive(Debug, Clone, Copy)]
pub struct Wander {
    rotation: f32,
}

impl Wander {
    pub const NAME: &'static str = "Wander";

    pub fn new(rotation: f32) -> Self {
        Self { rotation: rotation.abs() }
    }
}

impl Steering for Wander {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        let turn = if self.rotation > 0.0 {
            agent.rng().gen_range(-self.rotation..=self.rotation)
        } else {
            0.0
        };
        let orientation = agent.character().orientation() + turn;
        Some(MoveVector::new(Vec3::from_orientation(orientation), orientation))
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── Fixed targets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct TargetSeek {
    target: Vec3,
}

impl TargetSeek {
    pub const NAME: &'static str = "TargetSeek";

    pub fn new(target: Vec3) -> Self {
        Self { target }
    }
}

impl Steering for TargetSeek {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        seek(agent.character().position(), self.target)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TargetFlee {
    target: Vec3,
}

impl TargetFlee {
    pub const NAME: &'static str = "TargetFlee";

    pub fn new(target: Vec3) -> Self {
        Self { target }
    }
}

impl Steering for TargetFlee {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        flee(agent.character().position(), self.target)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── Groups ────────────────────────────────────────────────────────────────────

/// Towards a group's average position.
#[derive(Debug, Clone, Copy)]
pub struct GroupSeek {
    group: GroupId,
}

impl GroupSeek {
    pub const NAME: &'static str = "GroupSeek";

    pub fn new(group: GroupId) -> Self {
        Self { group }
    }
}

impl Steering for GroupSeek {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        seek(agent.character().position(), agent.group_position(self.group)?)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GroupFlee {
    group: GroupId,
}

impl GroupFlee {
    pub const NAME: &'static str = "GroupFlee";

    pub fn new(group: GroupId) -> Self {
        Self { group }
    }
}

impl Steering for GroupFlee {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        flee(agent.character().position(), agent.group_position(self.group)?)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── Selection ─────────────────────────────────────────────────────────────────

fn selection_position(agent: &Agent) -> Option<Vec3> {
    let target = *agent.filtered_entities().first()?;
    agent.zone()?.position_of(target)
}

/// Towards the first candidate of the filter list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectionSeek;

impl SelectionSeek {
    pub const NAME: &'static str = "SelectionSeek";
}

impl Steering for SelectionSeek {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        seek(agent.character().position(), selection_position(agent)?)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

/// Away from the first candidate of the filter list.
#[derive(Debug, Default, Clone, Copy)]
pub struct SelectionFlee;

impl SelectionFlee {
    pub const NAME: &'static str = "SelectionFlee";
}

impl Steering for SelectionFlee {
    fn execute(&self, agent: &mut Agent, _speed: f32) -> Option<MoveVector> {
        flee(agent.character().position(), selection_position(agent)?)
    }

    fn name(&self) -> &str {
        Self::NAME
    }
}

// ── WeightedSteering ──────────────────────────────────────────────────────────

/// Weighted blend of several steerings.
///
/// Steerings returning `None` are left out.  The blended direction is
/// normalised; `None` if nothing contributed or the contributions cancel out.
#[derive(Debug, Clone, Default)]
pub struct WeightedSteering {
    parts: Vec<(SteeringPtr, f32)>,
}

impl WeightedSteering {
    pub fn new(parts: Vec<(SteeringPtr, f32)>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[(SteeringPtr, f32)] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn execute(&self, agent: &mut Agent, speed: f32) -> Option<MoveVector> {
        let mut sum = Vec3::ZERO;
        let mut contributed = false;
        for (steering, weight) in &self.parts {
            if let Some(mv) = steering.execute(agent, speed) {
                sum += mv.direction * *weight;
                contributed = true;
            }
        }
        if !contributed {
            return None;
        }
        sum.normalized().map(MoveVector::towards)
    }
}
