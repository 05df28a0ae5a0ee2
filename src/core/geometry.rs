//! Typed 2D vector algebra.
//!
//! Absolute positions (`Point`) and relative offsets (`Displacement`) are
//! distinct types, and only the legal combinations compile:
//! point ± displacement, point − point, displacement ± displacement,
//! displacement × scalar. Adding two positions is meaningless and is
//! therefore not defined.
//!
//! World coordinates are in millimetres; headings are radians,
//! counter-clockwise positive.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// An absolute position in the world frame, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A relative offset between two positions, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Displacement {
    pub x: f64,
    pub y: f64,
}

impl Displacement {
    pub const ZERO: Displacement = Displacement { x: 0.0, y: 0.0 };

    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Displacement of `distance` along `angle` (radians, world frame).
    #[inline]
    pub fn from_angle_and_distance(angle: f64, distance: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            x: distance * cos_a,
            y: distance * sin_a,
        }
    }

    /// This displacement rotated counter-clockwise by `angle` radians.
    #[inline]
    pub fn rotated(self, angle: f64) -> Self {
        let (sin_a, cos_a) = angle.sin_cos();
        Self {
            x: self.x * cos_a - self.y * sin_a,
            y: self.x * sin_a + self.y * cos_a,
        }
    }

    #[inline]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Add<Displacement> for Point {
    type Output = Point;
    #[inline]
    fn add(self, d: Displacement) -> Point {
        Point::new(self.x + d.x, self.y + d.y)
    }
}

impl Sub<Displacement> for Point {
    type Output = Point;
    #[inline]
    fn sub(self, d: Displacement) -> Point {
        Point::new(self.x - d.x, self.y - d.y)
    }
}

impl Sub<Point> for Point {
    type Output = Displacement;
    #[inline]
    fn sub(self, other: Point) -> Displacement {
        Displacement::new(self.x - other.x, self.y - other.y)
    }
}

impl Add for Displacement {
    type Output = Displacement;
    #[inline]
    fn add(self, other: Displacement) -> Displacement {
        Displacement::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Displacement {
    #[inline]
    fn add_assign(&mut self, other: Displacement) {
        self.x += other.x;
        self.y += other.y;
    }
}

impl Sub for Displacement {
    type Output = Displacement;
    #[inline]
    fn sub(self, other: Displacement) -> Displacement {
        Displacement::new(self.x - other.x, self.y - other.y)
    }
}

impl SubAssign for Displacement {
    #[inline]
    fn sub_assign(&mut self, other: Displacement) {
        self.x -= other.x;
        self.y -= other.y;
    }
}

impl Mul<f64> for Displacement {
    type Output = Displacement;
    #[inline]
    fn mul(self, s: f64) -> Displacement {
        Displacement::new(self.x * s, self.y * s)
    }
}

impl Neg for Displacement {
    type Output = Displacement;
    #[inline]
    fn neg(self) -> Displacement {
        Displacement::new(-self.x, -self.y)
    }
}

/// Robot pose: world position plus a continuous heading in radians.
///
/// The heading is deliberately not normalized; accumulated rotation keeps
/// its winding so that repeated small deltas compose without jumps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pose {
    pub position: Point,
    pub heading: f64,
}

impl Pose {
    #[inline]
    pub fn new(position: Point, heading: f64) -> Self {
        Self { position, heading }
    }

    /// Pose at the world origin, facing along +x.
    #[inline]
    pub fn origin() -> Self {
        Self::default()
    }

    /// Advance by a displacement expressed in this pose's local frame,
    /// then turn by `rotation` radians.
    #[inline]
    pub fn advanced(&self, translation: Displacement, rotation: f64) -> Pose {
        Pose {
            position: self.position + translation.rotated(self.heading),
            heading: self.heading + rotation,
        }
    }
}

/// A cell index pair in the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridCell {
    pub x: i32,
    pub y: i32,
}

impl GridCell {
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}
