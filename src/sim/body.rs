//! Physics body proxy
//!
//! The engine only consumes the narrow `BodyProxy` contract; a real physics
//! backend can sit behind it. `SimBody` is the built-in ballistic
//! integrator used by the fixed-step loop and by tests.

use glam::{Quat, Vec3};

/// Gravity applied by the built-in integrator (m/s^2)
pub const GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// A world-space position + orientation pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

/// The contract an external physics body must satisfy
pub trait BodyProxy {
    fn position(&self) -> Vec3;
    fn rotation(&self) -> Quat;
    fn linear_velocity(&self) -> Vec3;
    fn angular_velocity(&self) -> Vec3;

    /// Instantaneous velocity change (unit mass)
    fn add_impulse(&mut self, impulse: Vec3);
    /// Instantaneous angular velocity change (unit inertia)
    fn add_angular_impulse(&mut self, impulse: Vec3);
    /// Continuous force accumulated until the next `step`
    fn add_force(&mut self, force: Vec3);
    /// Continuous torque accumulated until the next `step`
    fn add_torque(&mut self, torque: Vec3);

    fn set_kinematic(&mut self, kinematic: bool);
    fn set_gravity_enabled(&mut self, enabled: bool);
    fn zero_velocity(&mut self);
    fn move_position(&mut self, position: Vec3);
    fn move_rotation(&mut self, rotation: Quat);

    /// Advance the body by one fixed timestep
    fn step(&mut self, dt: f32);

    fn pose(&self) -> Pose {
        Pose::new(self.position(), self.rotation())
    }

    fn speed(&self) -> f32 {
        self.linear_velocity().length()
    }
}

/// Built-in semi-implicit Euler body with unit mass and unit inertia
#[derive(Debug, Clone)]
pub struct SimBody {
    position: Vec3,
    rotation: Quat,
    linear_velocity: Vec3,
    angular_velocity: Vec3,
    force_accum: Vec3,
    torque_accum: Vec3,
    kinematic: bool,
    gravity_enabled: bool,
}

impl SimBody {
    pub fn new(pose: Pose) -> Self {
        Self {
            position: pose.position,
            rotation: pose.rotation,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            kinematic: false,
            gravity_enabled: false,
        }
    }
}

impl BodyProxy for SimBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn rotation(&self) -> Quat {
        self.rotation
    }

    fn linear_velocity(&self) -> Vec3 {
        self.linear_velocity
    }

    fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    fn add_impulse(&mut self, impulse: Vec3) {
        if !self.kinematic {
            self.linear_velocity += impulse;
        }
    }

    fn add_angular_impulse(&mut self, impulse: Vec3) {
        if !self.kinematic {
            self.angular_velocity += impulse;
        }
    }

    fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    fn add_torque(&mut self, torque: Vec3) {
        self.torque_accum += torque;
    }

    fn set_kinematic(&mut self, kinematic: bool) {
        self.kinematic = kinematic;
        if kinematic {
            self.linear_velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
        }
    }

    fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
    }

    fn zero_velocity(&mut self) {
        self.linear_velocity = Vec3::ZERO;
        self.angular_velocity = Vec3::ZERO;
        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;
    }

    fn move_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn move_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    fn step(&mut self, dt: f32) {
        let force = self.force_accum;
        let torque = self.torque_accum;
        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;

        if self.kinematic {
            return;
        }

        let mut accel = force;
        if self.gravity_enabled {
            accel += GRAVITY;
        }
        self.linear_velocity += accel * dt;
        self.angular_velocity += torque * dt;

        self.position += self.linear_velocity * dt;
        let spin = self.angular_velocity * dt;
        if spin.length_squared() > 0.0 {
            self.rotation = (Quat::from_scaled_axis(spin) * self.rotation).normalize();
        }
    }
}
