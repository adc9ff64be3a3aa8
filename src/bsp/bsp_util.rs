// src/bsp/bsp_util.rs
// Geometry helpers shared by the BSP writer and the light baker.

use std::ops::{Add, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    /// The xyz part of a 4-float texture axis (the fourth float is the offset).
    pub fn from_axis(axis: &[f64; 4]) -> Self {
        Vec3::new(axis[0], axis[1], axis[2])
    }

    pub fn dot(&self, other: Vec3) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(&self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(&self) -> f64 {
        self.dot(*self).sqrt()
    }

    pub fn normalize(&self) -> Vec3 {
        let len = self.length();
        if len == 0.0 {
            return *self;
        }
        *self * (1.0 / len)
    }

    pub fn distance_to(&self, other: Vec3) -> f64 {
        (*self - other).length()
    }

    pub fn component(&self, axis: usize) -> f64 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
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

/// An infinite plane: points `p` with `normal . p == dist`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f64,
}

impl Plane {
    pub fn new(normal: Vec3, dist: f64) -> Self {
        Plane { normal, dist }
    }

    /// Plane through `point` with the given normal.
    pub fn from_point(normal: Vec3, point: Vec3) -> Self {
        Plane { normal, dist: normal.dot(point) }
    }

    /// Signed distance, positive on the front side.
    pub fn distance_to(&self, point: Vec3) -> f64 {
        self.normal.dot(point) - self.dist
    }

    pub fn flipped(&self) -> Plane {
        Plane { normal: -self.normal, dist: -self.dist }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub mins: Vec3,
    pub maxs: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        BoundingBox::new_empty()
    }
}

impl BoundingBox {
    pub fn new_empty() -> Self {
        BoundingBox {
            mins: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            maxs: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn new(mins: Vec3, maxs: Vec3) -> Self {
        BoundingBox { mins, maxs }
    }

    pub fn expand_point(&mut self, p: Vec3) {
        self.mins = Vec3::new(self.mins.x.min(p.x), self.mins.y.min(p.y), self.mins.z.min(p.z));
        self.maxs = Vec3::new(self.maxs.x.max(p.x), self.maxs.y.max(p.y), self.maxs.z.max(p.z));
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bbox = BoundingBox::new_empty();
        for p in points {
            bbox.expand_point(*p);
        }
        bbox
    }

    pub fn center(&self) -> Vec3 {
        (self.mins + self.maxs) * 0.5
    }

    // Check if the bounding box contains a point
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.mins.x && p.x <= self.maxs.x
            && p.y >= self.mins.y && p.y <= self.maxs.y
            && p.z >= self.mins.z && p.z <= self.maxs.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_cross_product() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(y.cross(x), Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn test_normalize() {
        let v = Vec3::new(3.0, 0.0, 4.0).normalize();
        assert_approx_eq!(v.length(), 1.0);
        assert_approx_eq!(v.x, 0.6);
        assert_eq!(Vec3::ZERO.normalize(), Vec3::ZERO);
    }

    #[test]
    fn test_plane_distance() {
        let plane = Plane::from_point(Vec3::new(0.0, 0.0, 1.0), Vec3::new(5.0, 5.0, 64.0));
        assert_approx_eq!(plane.dist, 64.0);
        assert_approx_eq!(plane.distance_to(Vec3::new(0.0, 0.0, 100.0)), 36.0);
        assert_approx_eq!(plane.flipped().distance_to(Vec3::new(0.0, 0.0, 100.0)), -36.0);
    }

    #[test]
    fn test_bbox_from_points() {
        let bbox = BoundingBox::from_points(&[
            Vec3::new(-16.0, 0.0, 8.0),
            Vec3::new(32.0, -4.0, 0.0),
        ]);
        assert_eq!(bbox.mins, Vec3::new(-16.0, -4.0, 0.0));
        assert_eq!(bbox.maxs, Vec3::new(32.0, 0.0, 8.0));
        assert_eq!(bbox.center(), Vec3::new(8.0, -2.0, 4.0));
        assert!(bbox.contains_point(Vec3::new(0.0, -1.0, 1.0)));
    }
}
