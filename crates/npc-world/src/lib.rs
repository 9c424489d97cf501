//! `npc-world` — the state a zone shares with all of its agents.
//!
//! Agents never read one another directly.  Anything an agent needs to know
//! about its neighbours (positions, group membership) goes through the
//! [`ZoneInfo`] of its zone, which holds `Arc<dyn Character>` handles only.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                |
//! |------------|---------------------------------------------------------|
//! | [`group`]  | `GroupMgr` — membership, leaders, average positions     |
//! | [`info`]   | `ZoneInfo` — zone name, character directory, groups     |

pub mod group;
pub mod info;


pub use group::GroupMgr;
pub use info::ZoneInfo;
