//! Downward surface probing
//!
//! While the piece is in flight the sampler casts a short ray down from its
//! bottom reference point. Only hits carrying the target tag qualify for
//! best-distance updates; anything else is an ordinary ground contact.

use glam::Vec3;

/// What a probe ray landed on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// The designated landing target
    Target,
    /// Any other surface
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub surface: Surface,
}

/// Scene query boundary: cast straight down from `origin` up to `max_dist`
pub trait GroundProbe {
    fn probe(&self, origin: Vec3, max_dist: f32) -> Option<SurfaceHit>;
}

/// A flat floor with one raised circular target pad
///
/// Minimal scene used by tests and headless simulation: the pad's top disk
/// carries the target tag, everything else is ground.
#[derive(Debug, Clone)]
pub struct FlatScene {
    pub ground_height: f32,
    pub target_center: Vec3,
    /// Radius of the tagged top surface
    pub target_radius: f32,
}

impl FlatScene {
    pub fn new(ground_height: f32, target_center: Vec3, target_radius: f32) -> Self {
        Self {
            ground_height,
            target_center,
            target_radius,
        }
    }
}

impl GroundProbe for FlatScene {
    fn probe(&self, origin: Vec3, max_dist: f32) -> Option<SurfaceHit> {
        let dx = origin.x - self.target_center.x;
        let dz = origin.z - self.target_center.z;
        let over_pad = (dx * dx + dz * dz).sqrt() <= self.target_radius;

        if over_pad {
            let gap = origin.y - self.target_center.y;
            if gap >= 0.0 && gap <= max_dist {
                return Some(SurfaceHit {
                    point: Vec3::new(origin.x, self.target_center.y, origin.z),
                    normal: Vec3::Y,
                    surface: Surface::Target,
                });
            }
        }

        let gap = origin.y - self.ground_height;
        if gap >= 0.0 && gap <= max_dist {
            return Some(SurfaceHit {
                point: Vec3::new(origin.x, self.ground_height, origin.z),
                normal: Vec3::Y,
                surface: Surface::Ground,
            });
        }
        None
    }
}
