//! `npc-aggro` — the per-agent threat table.
//!
//! # Crate layout
//!
//! | Module     | Contents                                                    |
//! |------------|-------------------------------------------------------------|
//! | [`entry`]  | `AggroEntry` — a `(target, score)` snapshot                 |
//! | [`mgr`]    | `AggroMgr` — ordered, decaying table                        |
//!
//! # Cost model (summary)
//!
//! ```text
//! add_aggro        O(log n)
//! highest_entry    O(log n)      (first element of a BTreeSet)
//! update(delta)    O(1) + O(k log n) for the k entries that decayed out
//! ```
//!
//! Decay is applied to a shared affine basis instead of to every entry, so a
//! table with hundreds of entries costs the same to decay as a table with one.

pub mod entry;
pub mod mgr;

#[cfg(test)]
mod tests;

pub use entry::AggroEntry;
pub use mgr::AggroMgr;
pub use npc_core::AggroDecay;
