//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` so hosts
//! can map their own entity handles onto them directly.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// `true` unless this is the `INVALID` sentinel.
            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$inner> for $name {
            #[inline(always)]
            fn from(raw: $inner) -> $name {
                $name(raw)
            }
        }
    };
}

typed_id! {
    /// Opaque identifier of a simulated entity.  Used as the key of the aggro
    /// table, the candidate-entity list and group membership.
    pub struct CharacterId(i32);
}

typed_id! {
    /// Identifier of one behaviour-tree node instance.  Keys every per-agent
    /// state map, which is what lets one tree serve many agents.
    pub struct NodeId(u32);
}

typed_id! {
    /// Identifier of a group inside a zone.
    pub struct GroupId(i32);
}

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(0);

impl NodeId {
    /// Allocate a fresh, process-wide unique node id.
    ///
    /// Ids are never reused, so they are unique within every tree and stable
    /// for the lifetime of the node that owns them.
    pub fn next() -> NodeId {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }
}
