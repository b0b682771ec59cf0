//! Background music channel
//!
//! One looping channel with fade-in, crossfade, pause/resume and
//! stop-with-fade. Volume ramps run on unscaled wall time, same as the
//! mixer fades.

use crate::ThrowError;
use crate::audio::fade::Fade;
use crate::audio::voices::Clip;

/// The looping background music channel
#[derive(Debug)]
pub struct MusicChannel {
    clip: Option<Clip>,
    volume: f32,
    paused: bool,
    /// Playback head in seconds, wraps at the clip length
    head: f32,
    default_fade_seconds: f32,
    fade: Option<Fade>,
    /// Clip, volume and fade-in seconds waiting behind a crossfade's
    /// fade-out half
    pending: Option<(Clip, f32, f32)>,
    stop_when_silent: bool,
}

impl MusicChannel {
    pub fn new(default_fade_seconds: f32) -> Self {
        Self {
            clip: None,
            volume: 0.0,
            paused: false,
            head: 0.0,
            default_fade_seconds: default_fade_seconds.max(1e-4),
            fade: None,
            pending: None,
            stop_when_silent: false,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.clip.is_some() && !self.paused
    }

    pub fn is_paused(&self) -> bool {
        self.clip.is_some() && self.paused
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn current_clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    /// Start a clip, crossfading from whatever is already playing
    pub fn play(&mut self, clip: Clip, volume: f32, fade_seconds: Option<f32>) -> Result<(), ThrowError> {
        if clip.name.is_empty() || !(clip.length > 0.0) {
            return Err(ThrowError::InvalidClip("bgm clip is not playable"));
        }
        if !(0.0..=1.0).contains(&volume) {
            return Err(ThrowError::OutOfRange {
                what: "volume",
                value: volume,
            });
        }
        let seconds = fade_seconds.unwrap_or(self.default_fade_seconds);
        self.stop_when_silent = false;
        self.paused = false;

        if self.clip.is_some() {
            // Crossfade: half out, swap, half in, both halves on the
            // requested length
            self.pending = Some((clip, volume, seconds * 0.5));
            self.fade = Some(Fade::new(self.volume, 0.0, seconds * 0.5));
        } else {
            self.clip = Some(clip);
            self.head = 0.0;
            self.volume = 0.0;
            self.fade = Some(Fade::new(0.0, volume, seconds));
        }
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.clip.is_some() {
            self.paused = true;
        }
    }

    pub fn resume(&mut self) {
        if self.clip.is_some() {
            self.paused = false;
        }
    }

    /// Fade to silence, then drop the clip
    pub fn stop(&mut self, fade_seconds: Option<f32>) {
        if self.clip.is_none() {
            return;
        }
        let seconds = fade_seconds.unwrap_or(self.default_fade_seconds);
        self.pending = None;
        self.stop_when_silent = true;
        self.fade = Some(Fade::new(self.volume, 0.0, seconds));
    }

    /// Advance the channel by one unscaled tick
    pub fn tick(&mut self, unscaled_dt: f32) {
        if let Some(fade) = self.fade.as_mut() {
            self.volume = fade.advance(unscaled_dt);
            if fade.done() {
                self.fade = None;
                if let Some((clip, volume, seconds)) = self.pending.take() {
                    // Fade-out half of a crossfade finished: swap and fade in
                    self.clip = Some(clip);
                    self.head = 0.0;
                    self.fade = Some(Fade::new(0.0, volume, seconds));
                } else if self.stop_when_silent && self.volume <= 0.0 {
                    self.clip = None;
                    self.stop_when_silent = false;
                }
            }
        }

        if self.paused {
            return;
        }
        if let Some(clip) = self.clip.as_ref() {
            self.head += unscaled_dt;
            if self.head >= clip.length {
                self.head %= clip.length;
            }
        }
    }
}
