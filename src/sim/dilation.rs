//! Time-dilation sequencer
//!
//! A two-phase ramp keyed to unscaled wall time: the simulation rate is
//! pinned at its minimum for the freeze phase, then both the rate and the
//! music level ramp linearly back to baseline. Explicit resumable state, no
//! coroutines; cancellation always restores baseline immediately.

use crate::Tuning;
use crate::audio::mixer::{Mixer, MixerParam};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DilationPhase {
    Idle,
    Freezing,
    Recovering,
}

#[derive(Debug, Clone)]
pub struct DilationSequence {
    phase: DilationPhase,
    elapsed: f32,
    freeze_duration: f32,
    recover_duration: f32,
    min_time_scale: f32,
    min_audio_db: f32,
    /// Music level captured when the sequence started
    baseline_db: f32,
}

impl DilationSequence {
    pub fn idle() -> Self {
        Self {
            phase: DilationPhase::Idle,
            elapsed: 0.0,
            freeze_duration: 0.0,
            recover_duration: 0.0,
            min_time_scale: 1.0,
            min_audio_db: 0.0,
            baseline_db: 0.0,
        }
    }

    pub fn phase(&self) -> DilationPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase != DilationPhase::Idle
    }

    /// Begin a sequence, atomically replacing one already in flight.
    /// The caller passes the music baseline to restore to; a replaced
    /// sequence keeps its original baseline.
    pub fn start(&mut self, tuning: &Tuning, baseline_db: f32) {
        let baseline_db = if self.is_active() {
            // Replacement inherits the true pre-dilation baseline
            self.baseline_db
        } else {
            baseline_db
        };
        *self = Self {
            phase: DilationPhase::Freezing,
            elapsed: 0.0,
            freeze_duration: tuning.freeze_duration,
            recover_duration: tuning.recover_duration,
            min_time_scale: tuning.min_time_scale,
            min_audio_db: tuning.min_audio_db,
            baseline_db,
        };
    }

    /// Advance by one unscaled tick, writing the simulation rate and the
    /// music level. Returns true on the tick the sequence completes.
    pub fn advance(&mut self, unscaled_dt: f32, time_scale: &mut f32, mixer: &mut Mixer) -> bool {
        match self.phase {
            DilationPhase::Idle => false,
            DilationPhase::Freezing => {
                *time_scale = self.min_time_scale;
                mixer.set(MixerParam::MusicDb, self.min_audio_db);
                self.elapsed += unscaled_dt;
                if self.elapsed >= self.freeze_duration {
                    // Carry the overshoot into the recovery phase
                    self.elapsed -= self.freeze_duration;
                    self.phase = DilationPhase::Recovering;
                    if self.recover_duration <= 0.0 {
                        return self.finish(time_scale, mixer);
                    }
                }
                false
            }
            DilationPhase::Recovering => {
                self.elapsed += unscaled_dt;
                let t = (self.elapsed / self.recover_duration).min(1.0);
                if t >= 1.0 {
                    return self.finish(time_scale, mixer);
                }
                *time_scale = self.min_time_scale + (1.0 - self.min_time_scale) * t;
                mixer.set(
                    MixerParam::MusicDb,
                    self.min_audio_db + (self.baseline_db - self.min_audio_db) * t,
                );
                false
            }
        }
    }

    fn finish(&mut self, time_scale: &mut f32, mixer: &mut Mixer) -> bool {
        // Final sample snaps exactly to baseline
        *time_scale = 1.0;
        mixer.set(MixerParam::MusicDb, self.baseline_db);
        self.phase = DilationPhase::Idle;
        true
    }

    /// Cancel immediately, restoring baseline values. Returns true if a
    /// sequence was actually running.
    pub fn cancel(&mut self, time_scale: &mut f32, mixer: &mut Mixer) -> bool {
        if !self.is_active() {
            return false;
        }
        *time_scale = 1.0;
        mixer.set(MixerParam::MusicDb, self.baseline_db);
        self.phase = DilationPhase::Idle;
        true
    }
}
