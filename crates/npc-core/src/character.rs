//! The narrow interface through which the engine drives a simulated entity.
//!
//! Characters are owned by the host and outlive the agents bound to them.
//! Every accessor takes `&self`: a character may be read from several worker
//! threads at once (group positions, selection steering), so implementations
//! provide their own interior synchronisation.  [`BasicCharacter`] is a
//! ready-made implementation behind a `RwLock`.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::{CharacterId, Millis, Vec3};

/// Well-known attribute keys written for debug telemetry.
pub mod attributes {
    pub const NAME:        &str = "Name";
    pub const ID:          &str = "Id";
    pub const POSITION:    &str = "Position";
    pub const SPEED:       &str = "Speed";
    pub const ORIENTATION: &str = "Orientation";
    pub const GROUP:       &str = "Group";
}

/// A simulated entity as seen by the decision engine.
pub trait Character: Send + Sync {
    fn id(&self) -> CharacterId;

    fn position(&self) -> Vec3;
    fn set_position(&self, position: Vec3);

    /// Orientation in radians around the up axis.
    fn orientation(&self) -> f32;
    fn set_orientation(&self, orientation: f32);

    /// Movement speed in units per second.
    fn speed(&self) -> f32;
    fn set_speed(&self, speed: f32);

    /// String-keyed attributes.  Used for debug telemetry, not core logic.
    fn attribute(&self, key: &str) -> Option<String>;
    fn set_attribute(&self, key: &str, value: String);
    fn attributes(&self) -> BTreeMap<String, String>;

    /// Per-tick hook called by the owning agent before its tree executes.
    ///
    /// Default: does nothing.
    fn update(&self, _delta: Millis, _debugging_active: bool) {}
}

// ── BasicCharacter ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CharacterState {
    position:    Vec3,
    orientation: f32,
    speed:       f32,
    attributes:  BTreeMap<String, String>,
}

/// A thread-safe `Character` holding plain data.
///
/// With `debugging_active`, `update` refreshes the position, speed and
/// orientation attributes so tooling can display them.
#[derive(Debug)]
pub struct BasicCharacter {
    id:    CharacterId,
    state: RwLock<CharacterState>,
}

impl BasicCharacter {
    pub fn new(id: CharacterId) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(attributes::ID.to_string(), id.0.to_string());
        Self {
            id,
            state: RwLock::new(CharacterState { attributes: attrs, ..Default::default() }),
        }
    }

    /// Builder-style initial position.
    pub fn at(self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Builder-style initial speed.
    pub fn with_speed(self, speed: f32) -> Self {
        self.set_speed(speed);
        self
    }

    fn read<R>(&self, f: impl FnOnce(&CharacterState) -> R) -> R {
        f(&self.state.read().unwrap_or_else(PoisonError::into_inner))
    }

    fn write<R>(&self, f: impl FnOnce(&mut CharacterState) -> R) -> R {
        f(&mut self.state.write().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Character for BasicCharacter {
    fn id(&self) -> CharacterId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.read(|s| s.position)
    }

    fn set_position(&self, position: Vec3) {
        self.write(|s| s.position = position);
    }

    fn orientation(&self) -> f32 {
        self.read(|s| s.orientation)
    }

    fn set_orientation(&self, orientation: f32) {
        self.write(|s| s.orientation = orientation);
    }

    fn speed(&self) -> f32 {
        self.read(|s| s.speed)
    }

    fn set_speed(&self, speed: f32) {
        self.write(|s| s.speed = speed);
    }

    fn attribute(&self, key: &str) -> Option<String> {
        self.read(|s| s.attributes.get(key).cloned())
    }

    fn set_attribute(&self, key: &str, value: String) {
        self.write(|s| {
            s.attributes.insert(key.to_string(), value);
        });
    }

    fn attributes(&self) -> BTreeMap<String, String> {
        self.read(|s| s.attributes.clone())
    }

    fn update(&self, _delta: Millis, debugging_active: bool) {
        if !debugging_active {
            return;
        }
        self.write(|s| {
            let position = s.position.to_string();
            let speed = s.speed.to_string();
            let orientation = s.orientation.to_degrees().to_string();
            s.attributes.insert(attributes::POSITION.to_string(), position);
            s.attributes.insert(attributes::SPEED.to_string(), speed);
            s.attributes.insert(attributes::ORIENTATION.to_string(), orientation);
        });
    }
}
