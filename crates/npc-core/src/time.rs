//! Time model.
//!
//! # Design
//!
//! The engine never reads a wall clock.  The external driver passes an
//! elapsed-time delta into every `Agent::update`, and each agent accumulates
//! those deltas into its own monotonic `Millis` timestamp.  Debug records,
//! timers and aggro decay are all expressed in this unit.
//!
//! Millisecond integers keep timer arithmetic exact; conversion to seconds is
//! only done where a rate is applied (decay per second, speed per second).

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

// ── Millis ───────────────────────────────────────────────────────────────────

/// A signed millisecond count: either a delta or an accumulated timestamp.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Millis(pub i64);

impl Millis {
    pub const ZERO: Millis = Millis(0);

    #[inline]
    pub fn from_secs(secs: i64) -> Millis {
        Millis(secs * 1_000)
    }

    /// Fractional seconds, for per-second rates.
    #[inline]
    pub fn as_secs_f32(self) -> f32 {
        self.0 as f32 / 1_000.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    /// `true` if this is a strictly positive duration.
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Add for Millis {
    type Output = Millis;
    #[inline]
    fn add(self, rhs: Millis) -> Millis {
        Millis(self.0 + rhs.0)
    }
}

impl AddAssign for Millis {
    #[inline]
    fn add_assign(&mut self, rhs: Millis) {
        self.0 += rhs.0;
    }
}

impl Sub for Millis {
    type Output = Millis;
    #[inline]
    fn sub(self, rhs: Millis) -> Millis {
        Millis(self.0 - rhs.0)
    }
}

impl SubAssign for Millis {
    #[inline]
    fn sub_assign(&mut self, rhs: Millis) {
        self.0 -= rhs.0;
    }
}

impl From<i64> for Millis {
    #[inline]
    fn from(ms: i64) -> Millis {
        Millis(ms)
    }
}

impl fmt::Display for Millis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
