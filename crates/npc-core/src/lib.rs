//! `npc-core` — foundational types for the npc behaviour engine.
//!
//! This crate is a dependency of every other `npc-*` crate.  It has no
//! `npc-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                                  |
//! |-----------------|-----------------------------------------------------------|
//! | [`ids`]         | `CharacterId`, `NodeId`, `GroupId`                        |
//! | [`status`]      | `TreeNodeStatus` — the execution status vocabulary        |
//! | [`time`]        | `Millis` — tick deltas and accumulated agent time         |
//! | [`geo`]         | `Vec3`, `MoveVector`                                      |
//! | [`rng`]         | `AgentRng` (per-agent, deterministic)                     |
//! | [`character`]   | `Character` trait, `BasicCharacter`, attribute keys       |
//! | [`config`]      | `EngineConfig`, `AggroDecay`                              |
//! | [`error`]       | `CoreError`, `CoreResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod character;
pub mod config;
pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod status;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use character::{BasicCharacter, Character, attributes};
pub use config::{AggroDecay, EngineConfig};
pub use error::{CoreError, CoreResult};
pub use geo::{MoveVector, Vec3};
pub use ids::{CharacterId, GroupId, NodeId};
pub use rng::AgentRng;
pub use status::TreeNodeStatus;
pub use time::Millis;
