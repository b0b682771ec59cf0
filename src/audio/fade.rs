//! Parameter ramps over unscaled wall time
//!
//! Fades and ducks are explicit resumable state advanced once per tick by
//! the engine's frame clock. They deliberately run on *unscaled* time so a
//! dilation sequence cannot stretch its own audio ramp.

use crate::audio::mixer::{Mixer, MixerParam};

/// A linear ramp in the parameter's native unit
///
/// The final sample sets exactly the target value; accumulated float error
/// never leaves a ramp short of its destination.
#[derive(Debug, Clone)]
pub struct Fade {
    start: f32,
    target: f32,
    seconds: f32,
    t: f32,
}

impl Fade {
    pub fn new(start: f32, target: f32, seconds: f32) -> Self {
        Self {
            start,
            target,
            seconds: seconds.max(1e-4),
            t: 0.0,
        }
    }

    /// Advance by one unscaled tick and return the current value
    pub fn advance(&mut self, unscaled_dt: f32) -> f32 {
        self.t = (self.t + unscaled_dt / self.seconds).min(1.0);
        self.value()
    }

    pub fn value(&self) -> f32 {
        if self.t >= 1.0 {
            self.target
        } else {
            self.start + (self.target - self.start) * self.t
        }
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn done(&self) -> bool {
        self.t >= 1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuckPhase {
    FadeDown,
    Hold,
    FadeUp,
}

/// A fade-down / hold / fade-back-to-baseline composition
///
/// The baseline is captured at duck start, not hardcoded, so the restore
/// always lands on the true pre-duck level.
#[derive(Debug, Clone)]
struct Duck {
    param: MixerParam,
    baseline: f32,
    phase: DuckPhase,
    fade: Fade,
    hold_remaining: f32,
    fade_seconds: f32,
}

impl Duck {
    fn new(param: MixerParam, baseline: f32, target: f32, total_seconds: f32, fade_seconds: f32) -> Self {
        let fade_seconds = fade_seconds.max(1e-4);
        Self {
            param,
            baseline,
            phase: DuckPhase::FadeDown,
            fade: Fade::new(baseline, target, fade_seconds),
            hold_remaining: (total_seconds - fade_seconds * 2.0).max(0.0),
            fade_seconds,
        }
    }

    /// Advance one tick; returns the current parameter value and whether the
    /// duck has fully restored its baseline.
    fn advance(&mut self, unscaled_dt: f32) -> (f32, bool) {
        match self.phase {
            DuckPhase::FadeDown => {
                let value = self.fade.advance(unscaled_dt);
                if self.fade.done() {
                    self.phase = DuckPhase::Hold;
                }
                (value, false)
            }
            DuckPhase::Hold => {
                self.hold_remaining -= unscaled_dt;
                if self.hold_remaining <= 0.0 {
                    self.phase = DuckPhase::FadeUp;
                    self.fade = Fade::new(self.fade.target(), self.baseline, self.fade_seconds);
                }
                (self.fade.target(), false)
            }
            DuckPhase::FadeUp => {
                let value = self.fade.advance(unscaled_dt);
                (value, self.fade.done())
            }
        }
    }
}

/// Owns the mixer and every in-flight ramp touching it
#[derive(Debug, Default)]
pub struct FadeEngine {
    mixer: Mixer,
    fades: Vec<(MixerParam, Fade)>,
    duck: Option<Duck>,
}

impl FadeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mixer(&self) -> &Mixer {
        &self.mixer
    }

    pub fn mixer_mut(&mut self) -> &mut Mixer {
        &mut self.mixer
    }

    /// Start a linear ramp on a parameter, replacing any ramp already on it
    pub fn fade(&mut self, param: MixerParam, from: f32, to: f32, seconds: f32) {
        self.fades.retain(|(p, _)| *p != param);
        self.mixer.set(param, from);
        self.fades.push((param, Fade::new(from, to, seconds)));
    }

    /// Duck a parameter for the duration of a one-shot sound
    ///
    /// Overlapping ducks are serialized by replacement: a new duck cancels
    /// the old one but inherits its captured baseline, so nested ducks still
    /// restore the true pre-duck level.
    pub fn duck_for(&mut self, param: MixerParam, target: f32, total_seconds: f32, fade_seconds: f32) {
        let baseline = match self.duck.take() {
            Some(old) if old.param == param => old.baseline,
            Some(old) => {
                // Duck moved to a different parameter: restore the old one first
                self.mixer.set(old.param, old.baseline);
                self.mixer.get(param)
            }
            None => self.mixer.get(param),
        };
        self.fades.retain(|(p, _)| *p != param);
        self.duck = Some(Duck::new(param, baseline, target, total_seconds, fade_seconds));
    }

    pub fn is_ducking(&self) -> bool {
        self.duck.is_some()
    }

    /// Cancel the active duck, restoring its captured baseline immediately
    pub fn cancel_duck(&mut self) {
        if let Some(duck) = self.duck.take() {
            self.mixer.set(duck.param, duck.baseline);
        }
    }

    /// Cancel everything in flight; ducked parameters restore their baseline,
    /// plain fades snap to their target.
    pub fn cancel_all(&mut self) {
        self.cancel_duck();
        for (param, fade) in self.fades.drain(..) {
            self.mixer.set(param, fade.target());
        }
    }

    /// Advance every ramp by one unscaled tick
    pub fn tick(&mut self, unscaled_dt: f32) {
        if let Some(duck) = self.duck.as_mut() {
            let (value, restored) = duck.advance(unscaled_dt);
            self.mixer.set(duck.param, value);
            if restored {
                self.duck = None;
            }
        }
        for (param, fade) in self.fades.iter_mut() {
            self.mixer.set(*param, fade.advance(unscaled_dt));
        }
        self.fades.retain(|(_, fade)| !fade.done());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_fade_reaches_exact_target() {
        let mut fade = Fade::new(0.0, -6.0, 0.1);
        let mut last = 0.0;
        // Tick count chosen so the duration does not divide evenly
        for _ in 0..100 {
            last = fade.advance(0.017);
        }
        assert_eq!(last, -6.0);
        assert!(fade.done());
    }

    #[test]
    fn test_fade_is_monotonic() {
        let mut fade = Fade::new(1.0, 0.0, 0.5);
        let mut prev = 1.0;
        while !fade.done() {
            let v = fade.advance(DT);
            assert!(v <= prev);
            prev = v;
        }
    }

    #[test]
    fn test_duck_restores_baseline() {
        let mut engine = FadeEngine::new();
        engine.mixer_mut().set(MixerParam::MusicDb, -3.0);
        engine.duck_for(MixerParam::MusicDb, -12.0, 1.0, 0.25);

        let mut reached_floor = false;
        for _ in 0..200 {
            engine.tick(DT);
            if engine.mixer().get(MixerParam::MusicDb) <= -11.9 {
                reached_floor = true;
            }
        }
        assert!(reached_floor);
        assert!(!engine.is_ducking());
        assert_eq!(engine.mixer().get(MixerParam::MusicDb), -3.0);
    }

    #[test]
    fn test_duck_cancel_restores_immediately() {
        let mut engine = FadeEngine::new();
        engine.mixer_mut().set(MixerParam::MusicDb, -2.0);
        engine.duck_for(MixerParam::MusicDb, -20.0, 2.0, 0.25);
        for _ in 0..30 {
            engine.tick(DT);
        }
        assert!(engine.mixer().get(MixerParam::MusicDb) < -2.0);

        engine.cancel_duck();
        assert_eq!(engine.mixer().get(MixerParam::MusicDb), -2.0);
    }

    #[test]
    fn test_overlapping_ducks_keep_original_baseline() {
        let mut engine = FadeEngine::new();
        engine.mixer_mut().set(MixerParam::MusicDb, -1.5);
        engine.duck_for(MixerParam::MusicDb, -10.0, 1.0, 0.1);
        for _ in 0..12 {
            engine.tick(DT);
        }
        // Second duck starts mid-way through the first
        engine.duck_for(MixerParam::MusicDb, -15.0, 0.5, 0.1);
        for _ in 0..120 {
            engine.tick(DT);
        }
        assert_eq!(engine.mixer().get(MixerParam::MusicDb), -1.5);
    }

    #[test]
    fn test_short_duck_skips_hold() {
        // total shorter than both fade edges: hold clamps to zero
        let mut engine = FadeEngine::new();
        engine.duck_for(MixerParam::MusicDb, -9.0, 0.1, 0.25);
        for _ in 0..120 {
            engine.tick(DT);
        }
        assert_eq!(engine.mixer().get(MixerParam::MusicDb), 0.0);
    }
}
