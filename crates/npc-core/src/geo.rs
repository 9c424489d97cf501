//! Positions, directions and steering output.
//!
//! `Vec3` uses `f32`; the y axis is "up" and orientation is an angle in
//! radians around it, so ground movement lives in the x/z plane.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// A 3D point or direction.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len <= f32::EPSILON || !len.is_finite() {
            return None;
        }
        Some(self * (1.0 / len))
    }

    /// Unit direction on the ground plane for an orientation angle.
    #[inline]
    pub fn from_orientation(orientation: f32) -> Vec3 {
        Vec3::new(orientation.cos(), 0.0, orientation.sin())
    }

    /// Orientation angle (radians) of this direction on the ground plane.
    #[inline]
    pub fn orientation(self) -> f32 {
        self.z.atan2(self.x)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Average of a set of points; `None` for an empty iterator.
    pub fn average<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Vec3> {
        let mut sum = Vec3::ZERO;
        let mut n = 0usize;
        for p in points {
            sum += p;
            n += 1;
        }
        if n == 0 {
            return None;
        }
        Some(sum * (1.0 / n as f32))
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}:{:.3}:{:.3}", self.x, self.y, self.z)
    }
}

impl std::str::FromStr for Vec3 {
    type Err = String;

    /// Parses the `x:y:z` form used in node and steering parameters.
    fn from_str(s: &str) -> Result<Vec3, String> {
        let parts: Vec<&str> = s.split(':').map(str::trim).collect();
        let [x, y, z] = parts.as_slice() else {
            return Err(format!("expected \"x:y:z\", got {s:?}"));
        };
        let parse = |v: &str| {
            v.parse::<f32>()
                .map_err(|_| format!("invalid coordinate {v:?} in {s:?}"))
        };
        Ok(Vec3::new(parse(x)?, parse(y)?, parse(z)?))
    }
}

// ── MoveVector ────────────────────────────────────────────────────────────────

/// Output of a steering behaviour for one tick: a direction to move in and a
/// target orientation.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveVector {
    pub direction:   Vec3,
    pub orientation: f32,
}

impl MoveVector {
    #[inline]
    pub fn new(direction: Vec3, orientation: f32) -> Self {
        Self { direction, orientation }
    }

    /// Build a move along `direction`, facing the way it points.
    #[inline]
    pub fn towards(direction: Vec3) -> Self {
        Self { direction, orientation: direction.orientation() }
    }
}
