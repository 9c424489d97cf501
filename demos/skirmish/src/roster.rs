//! The cast: one knight and a goblin war band.

use std::sync::Arc;

use npc_core::character::attributes;
use npc_core::{BasicCharacter, Character, CharacterId, GroupId, Vec3};

pub const KNIGHT:   CharacterId = CharacterId(1);
pub const WAR_BAND: GroupId     = GroupId(1);

/// Goblin ids; the first one to join leads the band.
pub const GOBLINS: [CharacterId; 5] =
    [CharacterId(10), CharacterId(11), CharacterId(12), CharacterId(13), CharacterId(14)];

/// Goblins that start out angry at the knight, with their initial aggro.
pub const PROVOKED: [(CharacterId, f64); 2] = [(CharacterId(11), 40.0), (CharacterId(12), 25.0)];

fn named(character: BasicCharacter, name: String) -> Arc<dyn Character> {
    character.set_attribute(attributes::NAME, name);
    Arc::new(character)
}

pub fn knight() -> Arc<dyn Character> {
    let knight = BasicCharacter::new(KNIGHT).at(Vec3::new(-20.0, 0.0, 0.0)).with_speed(1.5);
    named(knight, "Knight".to_string())
}

/// Goblins camp in a loose line along the y axis.
pub fn goblins() -> Vec<Arc<dyn Character>> {
    GOBLINS
        .iter()
        .enumerate()
        .map(|(i, &id)| {
            let goblin = BasicCharacter::new(id).at(Vec3::new(0.0, 2.0 * i as f32, 0.0)).with_speed(1.0);
            named(goblin, format!("Goblin {}", i + 1))
        })
        .collect()
}
