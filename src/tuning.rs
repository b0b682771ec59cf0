//! Data-driven engine balance
//!
//! Every named tunable of the throw pipeline lives here, serialized as one
//! JSON document so balance passes never require a rebuild.

use serde::{Deserialize, Serialize};

use crate::ThrowError;

/// All throw/landing/audio tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tuning {
    // === Launch ===
    /// Impulse magnitude at power 1.0
    pub impulse_scale: f32,
    /// Small downward impulse added at launch (keeps low lobs from ballooning)
    pub down_bias_impulse: f32,
    /// Fixed forward flip torque applied at launch
    pub flip_force: f32,
    /// Scale of the spin-induced lift force (and of the sideways launch spin)
    pub curve_force: f32,
    /// Seconds after launch during which the curve force is active
    pub curve_duration: f32,

    // === Pickup ===
    /// Exponential smoothing rate for drag-follow while held
    pub drag_lerp: f32,

    // === Landing ===
    /// How upright the piece must be for a proximity sample to count
    pub self_alignment_threshold: f32,
    /// How upright the sampled surface must be for a hit to count
    pub target_alignment_threshold: f32,
    /// Speed below which a flight is considered settled
    pub settle_speed: f32,
    /// Best-distance bound for a Snap outcome (inclusive)
    pub snap_radius: f32,
    /// Best-distance bound for a NearMiss outcome (inclusive)
    pub near_miss_radius: f32,
    /// Length of the downward probe ray from the piece's bottom point
    pub probe_length: f32,
    /// Minimum airborne seconds before a settle can resolve the throw
    pub min_air_time: f32,
    /// Flight seconds after which resolution is forced
    pub max_flight_time: f32,

    // === Impact loudness ===
    /// Impact speed mapped to silence
    pub min_impact_speed: f32,
    /// Impact speed mapped to full loudness
    pub max_impact_speed: f32,

    // === Time dilation ===
    /// Unscaled seconds the simulation stays pinned at `min_time_scale`
    pub freeze_duration: f32,
    /// Unscaled seconds of the eased recovery back to 1.0
    pub recover_duration: f32,
    /// Simulation rate during the freeze phase
    pub min_time_scale: f32,
    /// Music level (dB) during the freeze phase
    pub min_audio_db: f32,

    // === Audio ===
    /// Fade length used when none is given explicitly
    pub default_fade_seconds: f32,
    /// Music attenuation (dB) while a ducking one-shot plays
    pub duck_db: f32,
    /// Fade length of each duck edge
    pub duck_fade_seconds: f32,
    /// Voices provisioned up front (the pool still grows on demand)
    pub voice_pool_size: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            impulse_scale: 30.0,
            down_bias_impulse: 1.5,
            flip_force: 8.0,
            curve_force: 4.0,
            curve_duration: 0.6,

            drag_lerp: 80.0,

            self_alignment_threshold: 0.9,
            target_alignment_threshold: 0.9,
            settle_speed: 1.0,
            snap_radius: 0.03,
            near_miss_radius: 0.12,
            probe_length: 0.25,
            min_air_time: 0.25,
            max_flight_time: 6.0,

            min_impact_speed: 0.5,
            max_impact_speed: 12.0,

            freeze_duration: 0.35,
            recover_duration: 1.2,
            min_time_scale: 0.05,
            min_audio_db: -24.0,

            default_fade_seconds: 0.5,
            duck_db: -6.0,
            duck_fade_seconds: 0.25,
            voice_pool_size: 8,
        }
    }
}

impl Tuning {
    /// Reject tunable combinations that make the engine degenerate
    pub fn validate(&self) -> Result<(), ThrowError> {
        if !(self.snap_radius >= 0.0 && self.snap_radius < self.near_miss_radius) {
            return Err(ThrowError::InvalidArgument(
                "snap_radius must be non-negative and below near_miss_radius",
            ));
        }
        if !(self.min_time_scale > 0.0 && self.min_time_scale <= 1.0) {
            return Err(ThrowError::InvalidArgument(
                "min_time_scale must be within (0, 1]",
            ));
        }
        if self.freeze_duration < 0.0 || self.recover_duration < 0.0 {
            return Err(ThrowError::InvalidArgument(
                "dilation durations must be non-negative",
            ));
        }
        if self.min_impact_speed >= self.max_impact_speed {
            return Err(ThrowError::InvalidArgument(
                "min_impact_speed must be below max_impact_speed",
            ));
        }
        if self.max_flight_time <= self.min_air_time {
            return Err(ThrowError::InvalidArgument(
                "max_flight_time must exceed min_air_time",
            ));
        }
        Ok(())
    }

    /// Parse tunables from JSON, falling back to defaults on failure
    pub fn from_json_or_default(json: &str) -> Self {
        match serde_json::from_str::<Self>(json) {
            Ok(tuning) if tuning.validate().is_ok() => {
                log::info!("Loaded tuning from JSON");
                tuning
            }
            Ok(_) => {
                log::warn!("Tuning JSON failed validation, using defaults");
                Self::default()
            }
            Err(e) => {
                log::warn!("Tuning JSON parse error ({e}), using defaults");
                Self::default()
            }
        }
    }

    /// Serialize tunables to JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tuning_validates() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_degenerate_radii_rejected() {
        let mut tuning = Tuning::default();
        tuning.snap_radius = tuning.near_miss_radius;
        assert!(tuning.validate().is_err());

        tuning.snap_radius = tuning.near_miss_radius + 0.1;
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_zero_time_scale_rejected() {
        let tuning = Tuning {
            min_time_scale: 0.0,
            ..Default::default()
        };
        assert!(tuning.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let tuning = Tuning {
            snap_radius: 0.05,
            ..Default::default()
        };
        let parsed = Tuning::from_json_or_default(&tuning.to_json());
        assert_eq!(parsed.snap_radius, 0.05);
    }

    #[test]
    fn test_bad_json_falls_back() {
        let tuning = Tuning::from_json_or_default("not json");
        assert_eq!(tuning.voice_pool_size, Tuning::default().voice_pool_size);
    }
}
