//! `npc-zone` — the driver that owns a zone's agents and ticks them.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`zone`]     | `Zone` — agent map, shared `ZoneInfo`, the tick loop      |
//! | [`report`]   | `AgentOutcome`, `ZoneTickReport`                          |
//! | [`observer`] | `ZoneObserver` callbacks, `NoopObserver`                  |
//! | [`error`]    | `ZoneError`, `ZoneResult<T>`                              |
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                     |
//! |------------|------------------------------------------------------------|
//! | `parallel` | Agents tick on rayon; `EngineConfig::num_threads` sizes the pool. |
//! | `serde`    | Propagates serde derives to `npc-core` and `npc-tree`.     |

pub mod error;
pub mod observer;
pub mod report;
pub mod zone;

#[cfg(test)]
mod tests;

pub use error::{ZoneError, ZoneResult};
pub use observer::{NoopObserver, ZoneObserver};
pub use report::{AgentOutcome, ZoneTickReport};
pub use zone::Zone;
