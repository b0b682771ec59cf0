//! Throw state and core simulation types

use glam::Vec3;

use crate::sim::body::{BodyProxy, Pose, SimBody};

/// Landing quality, computed once at resolution time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Best observed distance within the snap radius; the piece attaches
    Snap,
    /// Close, but outside the snap radius
    NearMiss,
    /// Nowhere near the target center
    WideMiss,
    /// No qualifying alignment+proximity sample during the whole flight
    Unresolved,
}

impl Outcome {
    /// Pure classification of a flight's best center distance.
    /// Both radius boundaries are inclusive.
    pub fn classify(best_center_distance: f32, snap_radius: f32, near_miss_radius: f32) -> Self {
        if !best_center_distance.is_finite() {
            Outcome::Unresolved
        } else if best_center_distance <= snap_radius {
            Outcome::Snap
        } else if best_center_distance <= near_miss_radius {
            Outcome::NearMiss
        } else {
            Outcome::WideMiss
        }
    }
}

/// Lifecycle of the thrown piece
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PieceState {
    /// At rest at its origin pose, waiting to be picked up
    Idle,
    /// Dragged along a plane perpendicular to the viewer's sightline
    Held {
        /// Offset between the grab point and the piece origin at pickup
        grab_offset: Vec3,
        plane_point: Vec3,
        plane_normal: Vec3,
    },
    /// In flight
    Thrown {
        /// Seconds since launch, advanced on the fixed physics clock
        air_time: f32,
        /// Running minimum horizontal distance to the target center.
        /// Monotonically non-increasing; infinite until the first
        /// qualifying sample.
        best_center_distance: f32,
        /// Speed recorded at the most recent surface contact sample
        impact_speed: f32,
    },
    /// Resolved; stays here until `reset`
    Landed { outcome: Outcome },
}

impl PieceState {
    pub fn name(&self) -> &'static str {
        match self {
            PieceState::Idle => "idle",
            PieceState::Held { .. } => "held",
            PieceState::Thrown { .. } => "thrown",
            PieceState::Landed { .. } => "landed",
        }
    }
}

/// The thrown entity: a physics body plus lifecycle state
///
/// Created once at scene setup and never destroyed, only reset to its
/// origin pose.
#[derive(Debug)]
pub struct Piece<B: BodyProxy = SimBody> {
    pub body: B,
    pub state: PieceState,
    origin: Pose,
    /// Distance from the piece center to its bottom reference point
    pub half_height: f32,
}

impl<B: BodyProxy> Piece<B> {
    pub fn new(body: B, half_height: f32) -> Self {
        let origin = body.pose();
        Self {
            body,
            state: PieceState::Idle,
            origin,
            half_height,
        }
    }

    pub fn origin(&self) -> Pose {
        self.origin
    }

    /// World-space up axis of the piece
    pub fn up(&self) -> Vec3 {
        self.body.rotation() * Vec3::Y
    }

    /// Bottom reference point the proximity probe casts from
    pub fn bottom_point(&self) -> Vec3 {
        self.body.position() - self.up() * self.half_height
    }

    /// Restore the origin pose with zero velocity, gravity off
    pub fn restore_origin(&mut self) {
        self.body.set_kinematic(false);
        self.body.zero_velocity();
        self.body.set_gravity_enabled(false);
        self.body.move_position(self.origin.position);
        self.body.move_rotation(self.origin.rotation);
    }
}

/// The fixed landing anchor. Read-only to the engine.
#[derive(Debug, Clone)]
pub struct Target {
    pub center: Vec3,
    /// Upright surface normal of the landing face
    pub up: Vec3,
    /// Pose the piece snaps to on a successful stack; a missing anchor is
    /// the `MissingReference` case (attach is skipped, not corrupted)
    pub anchor: Option<Pose>,
}

/// One-shot sound categories the engine triggered this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SfxCue {
    Throw,
    Fail,
    Drop { loudness: f32 },
    Success,
}

/// Outbound events for the feedback dispatcher
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Fired once per throw
    AttemptMade,
    /// Fired once per Snap resolution
    SuccessfulStack,
    /// Camera hint bracketing a dilation sequence
    CloseUpEnabled,
    CloseUpDisabled,
    /// Mirror of a one-shot the built-in audio context played
    SfxPlayed(SfxCue),
    /// Mirror of a stop-all issued to the voice pool
    AllSfxStopped,
}
