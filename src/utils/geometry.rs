// src/utils/geometry.rs
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// A point or offset in building/world space. `y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };
    pub const X: Vec3 = Vec3 { x: 1.0, y: 0.0, z: 0.0 };
    pub const Y: Vec3 = Vec3 { x: 0.0, y: 1.0, z: 0.0 };
    pub const Z: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 1.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(&self, other: &Vec3) -> f64 {
        (*self - *other).length()
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation about the up axis in whole quarter turns.
///
/// One positive quarter turn maps `+z` onto `+x` (and `+x` onto `-z`), i.e. a
/// clockwise turn when looking down. Every rotation the generator produces is
/// a multiple of 90 degrees, so positions stay exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QuarterTurns(u8);

impl QuarterTurns {
    pub const IDENTITY: QuarterTurns = QuarterTurns(0);

    pub fn new(turns: i32) -> Self {
        QuarterTurns(turns.rem_euclid(4) as u8)
    }

    pub fn turns(&self) -> u8 {
        self.0
    }

    pub fn degrees(&self) -> f64 {
        f64::from(self.0) * 90.0
    }

    pub fn then(self, other: QuarterTurns) -> QuarterTurns {
        QuarterTurns((self.0 + other.0) % 4)
    }

    pub fn rotate(&self, v: Vec3) -> Vec3 {
        match self.0 {
            0 => v,
            1 => Vec3::new(v.z, v.y, -v.x),
            2 => Vec3::new(-v.x, v.y, -v.z),
            _ => Vec3::new(-v.z, v.y, v.x),
        }
    }
}

/// A parent-relative (or resolved world) placement: position plus yaw.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: QuarterTurns,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        position: Vec3::ZERO,
        rotation: QuarterTurns::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: QuarterTurns) -> Self {
        Self { position, rotation }
    }

    pub fn from_position(position: Vec3) -> Self {
        Self { position, rotation: QuarterTurns::IDENTITY }
    }

    /// Resolves `local` (expressed in this transform's frame) into the parent frame.
    pub fn compose(&self, local: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation.rotate(local.position),
            rotation: self.rotation.then(local.rotation),
        }
    }
}

/// Axis-aligned rectangle on the ground plane (`x` east, `y` north in plan view).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect { x, y, width, height }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_degenerate(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.max_x() && y >= self.y && y <= self.max_y()
    }

    /// Open-interval overlap: rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.max_x()
            && other.x < self.max_x()
            && self.y < other.max_y()
            && other.y < self.max_y()
    }

    /// Shrinks every side by `amount`.
    pub fn inset(&self, amount: f64) -> Rect {
        Rect::new(
            self.x + amount,
            self.y + amount,
            self.width - 2.0 * amount,
            self.height - 2.0 * amount,
        )
    }

    pub fn contains_rect(&self, other: &Rect, tolerance: f64) -> bool {
        other.x >= self.x - tolerance
            && other.y >= self.y - tolerance
            && other.max_x() <= self.max_x() + tolerance
            && other.max_y() <= self.max_y() + tolerance
    }
}

/// 3D bounds, used for LOD bound recalculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new_empty() -> Self {
        Aabb {
            min: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn expand_point(&mut self, p: Vec3) {
        self.min = Vec3::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z));
        self.max = Vec3::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z));
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_quarter_turn_maps_forward_to_right() {
        let r = QuarterTurns::new(1);
        assert_eq!(r.rotate(Vec3::Z), Vec3::X);
        assert_eq!(r.rotate(Vec3::X), -Vec3::Z);
        assert_eq!(QuarterTurns::new(-1), QuarterTurns::new(3));
        assert_approx_eq!(QuarterTurns::new(6).degrees(), 180.0);
    }

    #[test]
    fn test_full_turn_is_identity() {
        let v = Vec3::new(1.5, 2.0, -3.0);
        let mut r = QuarterTurns::IDENTITY;
        for _ in 0..4 {
            r = r.then(QuarterTurns::new(1));
        }
        assert_eq!(r.rotate(v), v);
    }

    #[test]
    fn test_transform_composition() {
        let parent = Transform::new(Vec3::new(10.0, 0.0, 5.0), QuarterTurns::new(1));
        let local = Transform::new(Vec3::new(0.0, 1.0, 2.0), QuarterTurns::new(1));
        let world = parent.compose(&local);
        assert_eq!(world.position, Vec3::new(12.0, 1.0, 5.0));
        assert_eq!(world.rotation, QuarterTurns::new(2));
    }

    #[test]
    fn test_rect_intersection_is_open() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 5.0, 5.0);
        let c = Rect::new(9.0, 9.0, 5.0, 5.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(a.contains_rect(&Rect::new(1.0, 1.0, 2.0, 2.0), 0.0));
        assert_approx_eq!(a.area(), 100.0);
    }

    #[test]
    fn test_aabb_expand() {
        let mut bounds = Aabb::new_empty();
        assert!(bounds.is_empty());
        bounds.expand_point(Vec3::new(-1.0, 0.0, 2.0));
        bounds.expand_point(Vec3::new(3.0, 4.0, -2.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 4.0, 4.0));
    }
}
