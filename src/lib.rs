//! Toss Core - a precision throw-resolution engine
//!
//! Core modules:
//! - `sim`: Deterministic simulation (throw state machine, ballistic body,
//!   proximity sampling, time-dilation sequencer)
//! - `audio`: Voice pool, mixer parameter fades/ducking, background music
//! - `tuning`: Data-driven balance for every named tunable
//! - `swipe`: Pure swipe-to-throw mapping for the gesture layer

pub mod audio;
pub mod error;
pub mod sim;
pub mod swipe;
pub mod tuning;

pub use error::ThrowError;
pub use tuning::Tuning;

use glam::Vec3;

/// Engine timing constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz physics)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Start offsets are clamped this far before a clip's end (seconds)
    pub const CLIP_OFFSET_EPSILON: f32 = 0.005;
    /// Mixer floor used when converting a zero linear volume to decibels
    pub const MIN_DB: f32 = -80.0;
}

/// Inverse linear interpolation: where `value` sits between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        0.0
    } else {
        ((value - a) / (b - a)).clamp(0.0, 1.0)
    }
}

/// Smooth hermite curve over [0, 1], used as the impact loudness curve
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Eased 1 -> 0 falloff over [0, 1], used by the curve-force window
#[inline]
pub fn fade_out(t: f32) -> f32 {
    1.0 - smoothstep(t)
}

/// Plan-view (horizontal) distance between two world points, ignoring height
#[inline]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}
