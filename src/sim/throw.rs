//! Throw-resolution state machine
//!
//! Owns the piece's lifecycle (idle -> held -> thrown -> landed -> idle),
//! resolves each flight into a landing outcome, and drives the voice pool,
//! mixer ducking and time-dilation sequencer. All collaborators are held
//! explicitly on the engine struct; there are no ambient singletons.

use glam::{Vec2, Vec3};

use crate::audio::fade::FadeEngine;
use crate::audio::mixer::MixerParam;
use crate::audio::music::MusicChannel;
use crate::audio::voices::{Clip, SfxBank, VoicePool};
use crate::sim::body::{BodyProxy, SimBody};
use crate::sim::dilation::{DilationPhase, DilationSequence};
use crate::sim::pointer::PointerProjector;
use crate::sim::state::{Event, Outcome, Piece, PieceState, SfxCue, Target};
use crate::{ThrowError, Tuning, inverse_lerp, smoothstep};

/// Default volume for non-impact one-shots
const ONE_SHOT_VOLUME: f32 = 0.4;

/// The throw-resolution engine: state machine plus its audio/feedback context
pub struct ThrowEngine<B: BodyProxy = SimBody> {
    pub tuning: Tuning,
    pub piece: Piece<B>,
    pub target: Target,
    pub voices: VoicePool,
    pub bank: SfxBank,
    pub music: MusicChannel,
    pub fades: FadeEngine,
    pub(crate) dilation: DilationSequence,
    pub(crate) time_scale: f32,
    pub(crate) accumulator: f32,
    pub(crate) paused: bool,
    pub(crate) attempts: u32,
    pub(crate) music_paused_for_landing: bool,
    pub(crate) events: Vec<Event>,
}

impl<B: BodyProxy> ThrowEngine<B> {
    pub fn new(
        tuning: Tuning,
        piece: Piece<B>,
        target: Target,
        bank: SfxBank,
    ) -> Result<Self, ThrowError> {
        tuning.validate()?;
        let voices = VoicePool::new(tuning.voice_pool_size);
        let music = MusicChannel::new(tuning.default_fade_seconds);
        Ok(Self {
            tuning,
            piece,
            target,
            voices,
            bank,
            music,
            fades: FadeEngine::new(),
            dilation: DilationSequence::idle(),
            time_scale: 1.0,
            accumulator: 0.0,
            paused: false,
            attempts: 0,
            music_paused_for_landing: false,
            events: Vec::new(),
        })
    }

    // === Accessors ===

    pub fn state(&self) -> &PieceState {
        &self.piece.state
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn dilation_phase(&self) -> DilationPhase {
        self.dilation.phase()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Gate gameplay operations without touching audio fades
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    // === Pickup ===

    /// Grab the piece at `contact_point`. Valid only from idle; picking up
    /// a thrown piece is rejected, not silently ignored.
    pub fn begin_pickup(
        &mut self,
        contact_point: Vec3,
        projector: &impl PointerProjector,
    ) -> Result<(), ThrowError> {
        if self.paused {
            return Err(ThrowError::InvalidTransition {
                op: "pick up",
                state: "paused",
            });
        }
        if !matches!(self.piece.state, PieceState::Idle) {
            return Err(ThrowError::InvalidTransition {
                op: "pick up",
                state: self.piece.state.name(),
            });
        }

        let plane_normal = -projector.forward().normalize_or_zero();
        if plane_normal == Vec3::ZERO {
            return Err(ThrowError::InvalidArgument("projector has no sightline"));
        }

        let grab_offset = contact_point - self.piece.body.position();
        // Zero explicitly; the proxy contract does not promise that
        // switching to kinematic clears motion
        self.piece.body.zero_velocity();
        self.piece.body.set_kinematic(true);
        self.piece.body.set_gravity_enabled(false);
        self.piece.state = PieceState::Held {
            grab_offset,
            plane_point: contact_point,
            plane_normal,
        };
        log::debug!("picked up at {contact_point}");
        Ok(())
    }

    /// Drag-follow: project the pointer onto the grab plane and move the
    /// piece toward it with exponential smoothing. Kinematic positioning
    /// keeps the holder in exact control.
    pub fn update_pickup(
        &mut self,
        screen_pos: Vec2,
        projector: &impl PointerProjector,
        dt: f32,
    ) -> Result<(), ThrowError> {
        if self.paused {
            return Err(ThrowError::InvalidTransition {
                op: "drag",
                state: "paused",
            });
        }
        let PieceState::Held {
            grab_offset,
            plane_point,
            plane_normal,
        } = self.piece.state
        else {
            return Err(ThrowError::InvalidTransition {
                op: "drag",
                state: self.piece.state.name(),
            });
        };

        let ray = projector.ray(screen_pos);
        // A grazing ray is a transient no-op, not an error
        let Some(plane_hit) = ray.intersect_plane(plane_point, plane_normal) else {
            return Ok(());
        };

        let target = plane_hit - grab_offset;
        let current = self.piece.body.position();
        let alpha = (self.tuning.drag_lerp * dt).clamp(0.0, 1.0);
        self.piece.body.move_position(current + (target - current) * alpha);
        Ok(())
    }

    /// Release without throwing: the piece returns to its origin pose.
    /// A release after a throw is the normal end of a gesture and a no-op.
    pub fn end_pickup(&mut self) {
        if matches!(self.piece.state, PieceState::Held { .. }) {
            self.piece.restore_origin();
            self.piece.state = PieceState::Idle;
            log::debug!("pickup released without a throw");
        }
    }

    // === Throw ===

    /// Launch the piece. Valid only while held, and never while paused.
    pub fn throw(&mut self, direction: Vec3, power: f32) -> Result<(), ThrowError> {
        if self.paused {
            return Err(ThrowError::InvalidTransition {
                op: "throw",
                state: "paused",
            });
        }
        if !matches!(self.piece.state, PieceState::Held { .. }) {
            return Err(ThrowError::InvalidTransition {
                op: "throw",
                state: self.piece.state.name(),
            });
        }
        if !(0.0..=1.0).contains(&power) {
            return Err(ThrowError::OutOfRange {
                what: "power",
                value: power,
            });
        }
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return Err(ThrowError::InvalidArgument("throw direction is zero"));
        }

        let body = &mut self.piece.body;
        body.set_kinematic(false);
        body.zero_velocity();
        body.set_gravity_enabled(true);

        // Launch impulse plus a small downward bias so low lobs don't balloon
        body.add_impulse(dir * power * self.tuning.impulse_scale
            + Vec3::NEG_Y * self.tuning.down_bias_impulse);

        // Forward flip around the axis perpendicular to the throw
        let flip_axis = Vec3::Y.cross(dir).normalize_or_zero();
        let flip_axis = if flip_axis == Vec3::ZERO { Vec3::X } else { flip_axis };
        body.add_angular_impulse(flip_axis * self.tuning.flip_force);

        // Sideways spin proportional to the lateral throw component; the
        // per-tick curve force turns this into a Magnus-style arc
        body.add_angular_impulse(Vec3::Y * dir.x * self.tuning.curve_force);

        self.piece.state = PieceState::Thrown {
            air_time: 0.0,
            best_center_distance: f32::INFINITY,
            impact_speed: 0.0,
        };
        self.attempts += 1;
        self.events.push(Event::AttemptMade);
        log::info!("throw #{}: dir {dir}, power {power:.2}", self.attempts);

        if let Some(clip) = self.bank.throw() {
            let length = clip.length;
            self.play_cue(&clip, ONE_SHOT_VOLUME, 0.0, SfxCue::Throw);
            if self.music.is_playing() {
                self.fades.duck_for(
                    MixerParam::MusicDb,
                    self.tuning.duck_db,
                    length,
                    self.tuning.duck_fade_seconds,
                );
            }
        }
        Ok(())
    }

    /// Resolve the current flight immediately with whatever samples exist
    /// (debug affordance, also used by timeouts)
    pub fn force_resolve(&mut self) -> Result<(), ThrowError> {
        if !matches!(self.piece.state, PieceState::Thrown { .. }) {
            return Err(ThrowError::InvalidTransition {
                op: "force resolve",
                state: self.piece.state.name(),
            });
        }
        self.resolve();
        Ok(())
    }

    // === Reset ===

    /// Return to idle from any state. Unconditionally force-restores
    /// baseline time scale and audio; never relies on handle cancellation.
    pub fn reset(&mut self) {
        if self.dilation.cancel(&mut self.time_scale, self.fades.mixer_mut()) {
            self.events.push(Event::CloseUpDisabled);
        }
        self.time_scale = 1.0;
        self.fades.cancel_all();
        self.voices.stop_all();
        self.events.push(Event::AllSfxStopped);
        if self.music_paused_for_landing {
            self.music.resume();
            self.music_paused_for_landing = false;
        }
        self.piece.restore_origin();
        self.piece.state = PieceState::Idle;
        self.accumulator = 0.0;
        log::info!("reset to idle");
    }

    // === Resolution ===

    pub(crate) fn resolve(&mut self) {
        let PieceState::Thrown {
            best_center_distance,
            impact_speed,
            ..
        } = self.piece.state
        else {
            return;
        };

        let classified = Outcome::classify(
            best_center_distance,
            self.tuning.snap_radius,
            self.tuning.near_miss_radius,
        );
        // A flight with no qualifying sample must still resolve
        let outcome = if classified == Outcome::Unresolved {
            log::debug!("no qualifying proximity sample; defaulting to wide miss");
            Outcome::WideMiss
        } else {
            classified
        };

        self.voices.stop_all();
        self.events.push(Event::AllSfxStopped);

        match outcome {
            Outcome::Snap => {
                if let Some(clip) = self.bank.drop() {
                    self.play_cue(&clip, 1.0, 0.0, SfxCue::Drop { loudness: 1.0 });
                }
                if let Some((clip, offset)) = self.bank.success() {
                    self.play_cue(&clip, ONE_SHOT_VOLUME, offset, SfxCue::Success);
                }
                self.attach_to_target();
                self.events.push(Event::SuccessfulStack);
                if self.music.is_playing() {
                    self.music.pause();
                    self.music_paused_for_landing = true;
                }
                self.start_dilation();
            }
            Outcome::NearMiss => {
                if let Some(clip) = self.bank.fail() {
                    self.play_cue(&clip, ONE_SHOT_VOLUME, 0.0, SfxCue::Fail);
                }
                self.start_dilation();
            }
            Outcome::WideMiss | Outcome::Unresolved => {
                let loudness = smoothstep(inverse_lerp(
                    self.tuning.min_impact_speed,
                    self.tuning.max_impact_speed,
                    impact_speed,
                ));
                if let Some(clip) = self.bank.drop() {
                    self.play_cue(&clip, loudness, 0.0, SfxCue::Drop { loudness });
                }
                // No slow-motion beat: normal time and audio, immediately
                if self.dilation.cancel(&mut self.time_scale, self.fades.mixer_mut()) {
                    self.events.push(Event::CloseUpDisabled);
                }
                self.fades.cancel_duck();
                self.time_scale = 1.0;
            }
        }

        self.piece.state = PieceState::Landed { outcome };
        log::info!(
            "throw resolved: {outcome:?} (best center distance {best_center_distance:.3})"
        );
    }

    /// Teleport the piece onto the target anchor and freeze it there. A
    /// missing anchor is logged and skipped; the piece stays where physics
    /// left it rather than corrupting state.
    fn attach_to_target(&mut self) {
        match self.target.anchor {
            Some(anchor) => {
                let body = &mut self.piece.body;
                body.set_kinematic(true);
                body.set_gravity_enabled(false);
                body.move_position(anchor.position);
                body.move_rotation(anchor.rotation);
            }
            None => {
                log::warn!(
                    "attach skipped: {}",
                    ThrowError::MissingReference("target anchor")
                );
            }
        }
    }

    fn start_dilation(&mut self) {
        // The duck and the sequencer share the music parameter; restore the
        // duck's baseline before the sequencer captures it
        self.fades.cancel_duck();
        let baseline = self.fades.mixer().get(MixerParam::MusicDb);
        self.dilation.start(&self.tuning, baseline);
        self.events.push(Event::CloseUpEnabled);
    }

    fn play_cue(&mut self, clip: &Clip, volume: f32, start_at: f32, cue: SfxCue) {
        match self.voices.play_one_shot(clip, volume, 1.0, start_at) {
            Ok(_) => self.events.push(Event::SfxPlayed(cue)),
            // Bank misconfiguration should not derail the state machine
            Err(e) => log::warn!("dropping {cue:?} cue: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::body::Pose;
    use crate::sim::pointer::{OrthoPointer, Ray};
    use glam::Quat;

    fn engine() -> ThrowEngine {
        let pose = Pose::new(Vec3::new(0.0, 1.2, 0.0), Quat::IDENTITY);
        let piece = Piece::new(SimBody::new(pose), 0.05);
        let target = Target {
            center: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
            anchor: Some(Pose::new(Vec3::new(0.0, 1.05, 0.0), Quat::IDENTITY)),
        };
        ThrowEngine::new(Tuning::default(), piece, target, SfxBank::placeholder(42)).unwrap()
    }

    fn pointer() -> OrthoPointer {
        OrthoPointer::front(5.0, 0.01)
    }

    #[test]
    fn test_paused_engine_rejects_throw() {
        let mut engine = engine();
        let grab = engine.piece.body.position();
        engine.begin_pickup(grab, &pointer()).unwrap();
        engine.set_paused(true);

        let err = engine.throw(Vec3::NEG_Y, 0.5).unwrap_err();
        assert_eq!(
            err,
            ThrowError::InvalidTransition {
                op: "throw",
                state: "paused",
            }
        );
        // Still held, no attempt counted, no events raised by the rejection
        assert!(matches!(engine.state(), PieceState::Held { .. }));
        assert_eq!(engine.attempts(), 0);
        assert!(!engine.drain_events().contains(&Event::AttemptMade));

        engine.set_paused(false);
        engine.throw(Vec3::NEG_Y, 0.5).unwrap();
        assert_eq!(engine.attempts(), 1);
    }

    #[test]
    fn test_paused_engine_rejects_drag() {
        let mut engine = engine();
        let grab = engine.piece.body.position();
        engine.begin_pickup(grab, &pointer()).unwrap();
        engine.set_paused(true);

        let before = engine.piece.body.position();
        let err = engine
            .update_pickup(Vec2::new(80.0, 200.0), &pointer(), 1.0 / 120.0)
            .unwrap_err();
        assert_eq!(
            err,
            ThrowError::InvalidTransition {
                op: "drag",
                state: "paused",
            }
        );
        assert_eq!(engine.piece.body.position(), before);
    }

    /// Proxy that keeps coasting through `set_kinematic`, like a backend
    /// whose kinematic switch leaves velocities untouched
    #[derive(Debug)]
    struct CoastingBody {
        position: Vec3,
        rotation: Quat,
        velocity: Vec3,
        spin: Vec3,
    }

    impl BodyProxy for CoastingBody {
        fn position(&self) -> Vec3 {
            self.position
        }
        fn rotation(&self) -> Quat {
            self.rotation
        }
        fn linear_velocity(&self) -> Vec3 {
            self.velocity
        }
        fn angular_velocity(&self) -> Vec3 {
            self.spin
        }
        fn add_impulse(&mut self, impulse: Vec3) {
            self.velocity += impulse;
        }
        fn add_angular_impulse(&mut self, impulse: Vec3) {
            self.spin += impulse;
        }
        fn add_force(&mut self, _force: Vec3) {}
        fn add_torque(&mut self, _torque: Vec3) {}
        fn set_kinematic(&mut self, _kinematic: bool) {}
        fn set_gravity_enabled(&mut self, _enabled: bool) {}
        fn zero_velocity(&mut self) {
            self.velocity = Vec3::ZERO;
            self.spin = Vec3::ZERO;
        }
        fn move_position(&mut self, position: Vec3) {
            self.position = position;
        }
        fn move_rotation(&mut self, rotation: Quat) {
            self.rotation = rotation;
        }
        fn step(&mut self, dt: f32) {
            self.position += self.velocity * dt;
        }
    }

    #[test]
    fn test_pickup_zeroes_velocity_on_any_backend() {
        let body = CoastingBody {
            position: Vec3::new(0.0, 1.2, 0.0),
            rotation: Quat::IDENTITY,
            velocity: Vec3::new(3.0, -1.0, 0.0),
            spin: Vec3::Y * 2.0,
        };
        let piece = Piece::new(body, 0.05);
        let target = Target {
            center: Vec3::new(0.0, 1.0, 0.0),
            up: Vec3::Y,
            anchor: None,
        };
        let mut engine =
            ThrowEngine::new(Tuning::default(), piece, target, SfxBank::placeholder(1)).unwrap();

        engine
            .begin_pickup(engine.piece.body.position(), &pointer())
            .unwrap();
        assert_eq!(engine.piece.body.linear_velocity(), Vec3::ZERO);
        assert_eq!(engine.piece.body.angular_velocity(), Vec3::ZERO);
    }

    #[test]
    fn test_grazing_drag_ray_is_a_no_op() {
        let mut engine = engine();
        let grab = engine.piece.body.position();
        engine.begin_pickup(grab, &pointer()).unwrap();

        // A projector whose rays run parallel to the drag plane
        struct Grazing;
        impl PointerProjector for Grazing {
            fn ray(&self, _screen_pos: Vec2) -> Ray {
                Ray {
                    origin: Vec3::new(0.0, 0.0, 5.0),
                    dir: Vec3::X,
                }
            }
            fn forward(&self) -> Vec3 {
                Vec3::NEG_Z
            }
        }

        let before = engine.piece.body.position();
        engine
            .update_pickup(Vec2::new(10.0, 10.0), &Grazing, 1.0 / 120.0)
            .unwrap();
        assert_eq!(engine.piece.body.position(), before);
    }
}
