//! Pointer projection boundary
//!
//! The gesture layer owns the real camera; the engine only needs a way to
//! turn a screen position into a world ray and to know the sightline for
//! the drag plane.

use glam::{Vec2, Vec3};

#[derive(Debug, Clone, Copy)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    /// Intersect with the plane through `point` with `normal`
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<Vec3> {
        let denom = self.dir.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        if t < 0.0 {
            return None;
        }
        Some(self.origin + self.dir * t)
    }
}

/// Screen-space to world-space projection, implemented by the camera layer
pub trait PointerProjector {
    /// World ray through the given screen position
    fn ray(&self, screen_pos: Vec2) -> Ray;
    /// The viewer's sightline direction
    fn forward(&self) -> Vec3;
}

/// Orthographic projector for tests and headless runs
///
/// Screen pixels map linearly onto the camera's right/up axes.
#[derive(Debug, Clone)]
pub struct OrthoPointer {
    pub origin: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub units_per_pixel: f32,
}

impl OrthoPointer {
    /// A camera looking down -Z at the world origin
    pub fn front(distance: f32, units_per_pixel: f32) -> Self {
        Self {
            origin: Vec3::new(0.0, 0.0, distance),
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            units_per_pixel,
        }
    }
}

impl PointerProjector for OrthoPointer {
    fn ray(&self, screen_pos: Vec2) -> Ray {
        let offset =
            (self.right * screen_pos.x + self.up * screen_pos.y) * self.units_per_pixel;
        Ray {
            origin: self.origin + offset,
            dir: self.forward,
        }
    }

    fn forward(&self) -> Vec3 {
        self.forward
    }
}
