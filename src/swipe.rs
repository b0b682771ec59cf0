//! Swipe-to-throw mapping
//!
//! Pure helper for the gesture layer: turns a 2-D screen swipe into a world
//! throw direction and a normalized power. The camera supplies its basis;
//! both axes are flattened onto the ground plane so a tilted camera still
//! throws level.

use glam::{Vec2, Vec3};

use crate::inverse_lerp;

/// Horizontal camera basis used to lift a planar swipe into world space
#[derive(Debug, Clone, Copy)]
pub struct CameraBasis {
    pub right: Vec3,
    pub forward: Vec3,
}

impl CameraBasis {
    /// Build from raw camera axes, projecting both onto the ground plane
    pub fn from_axes(right: Vec3, forward: Vec3) -> Option<Self> {
        let flatten = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        let right = flatten(right);
        let forward = flatten(forward);
        if right == Vec3::ZERO || forward == Vec3::ZERO {
            return None;
        }
        Some(Self { right, forward })
    }
}

/// Map a swipe in pixels to `(world direction, power in [0, 1])`.
///
/// Swipes shorter than `min_pixels` are ignored; power saturates at five
/// times that threshold.
pub fn swipe_to_throw(swipe: Vec2, min_pixels: f32, camera: &CameraBasis) -> Option<(Vec3, f32)> {
    if min_pixels <= 0.0 || swipe.length_squared() < min_pixels * min_pixels {
        return None;
    }

    let planar = swipe.normalize();
    let dir = (camera.right * planar.x + camera.forward * planar.y).normalize_or_zero();
    if dir == Vec3::ZERO {
        return None;
    }

    let max_pixels = min_pixels * 5.0;
    let magnitude = swipe.length().clamp(min_pixels, max_pixels);
    let power = inverse_lerp(min_pixels, max_pixels, magnitude);
    Some((dir, power))
}
