//! Pooled one-shot playback voices
//!
//! A fixed-but-growable pool of playback channels with a borrow/return
//! lifecycle. A per-tick watcher returns each voice to the free list exactly
//! once its clip finishes, so a voice is always either free or owned by one
//! playback session, never both.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::ThrowError;
use crate::consts::CLIP_OFFSET_EPSILON;

/// A playable clip reference
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    /// Playable length in seconds
    pub length: f32,
}

impl Clip {
    pub fn new(name: impl Into<String>, length: f32) -> Self {
        Self {
            name: name.into(),
            length,
        }
    }

    fn check(&self) -> Result<(), ThrowError> {
        if self.name.is_empty() {
            return Err(ThrowError::InvalidClip("clip reference is empty"));
        }
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(ThrowError::InvalidClip("clip has no playable length"));
        }
        Ok(())
    }
}

pub type VoiceId = usize;

/// One pooled playback channel
#[derive(Debug, Clone)]
pub struct Voice {
    clip: Option<Clip>,
    volume: f32,
    pitch: f32,
    spatial_blend: f32,
    position: Vec3,
    remaining: f32,
}

impl Voice {
    fn fresh() -> Self {
        Self {
            clip: None,
            volume: 0.0,
            pitch: 1.0,
            spatial_blend: 0.0,
            position: Vec3::ZERO,
            remaining: 0.0,
        }
    }

    fn release(&mut self) {
        self.clip = None;
        self.spatial_blend = 0.0;
        self.remaining = 0.0;
    }

    pub fn is_playing(&self) -> bool {
        self.clip.is_some()
    }

    pub fn clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

/// Growable pool of voices with automatic reclamation
#[derive(Debug)]
pub struct VoicePool {
    voices: Vec<Voice>,
    free: VecDeque<VoiceId>,
}

impl VoicePool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let voices = (0..size).map(|_| Voice::fresh()).collect();
        let free = (0..size).collect();
        Self { voices, free }
    }

    /// Take a voice from the free list, growing the pool by one fresh voice
    /// if it is empty. Never blocks, never fails.
    fn borrow(&mut self) -> VoiceId {
        match self.free.pop_front() {
            Some(id) => id,
            None => {
                self.voices.push(Voice::fresh());
                self.voices.len() - 1
            }
        }
    }

    /// Play a clip on a pooled voice, optionally starting mid-clip
    pub fn play_one_shot(
        &mut self,
        clip: &Clip,
        volume: f32,
        pitch: f32,
        start_at: f32,
    ) -> Result<VoiceId, ThrowError> {
        clip.check()?;
        if !(0.0..=1.0).contains(&volume) {
            return Err(ThrowError::OutOfRange {
                what: "volume",
                value: volume,
            });
        }

        let start = start_at.clamp(0.0, (clip.length - CLIP_OFFSET_EPSILON).max(0.0));
        let pitch = if pitch.is_finite() && pitch > 0.0 { pitch } else { 1.0 };

        let id = self.borrow();
        let voice = &mut self.voices[id];
        voice.clip = Some(clip.clone());
        voice.volume = volume;
        voice.pitch = pitch;
        voice.spatial_blend = 0.0;
        voice.position = Vec3::ZERO;
        voice.remaining = (clip.length - start) / pitch;
        Ok(id)
    }

    /// Play a clip positioned in the world with a spatial blend factor
    pub fn play_at(
        &mut self,
        clip: &Clip,
        world_pos: Vec3,
        volume: f32,
        spatial_blend: f32,
    ) -> Result<VoiceId, ThrowError> {
        let id = self.play_one_shot(clip, volume, 1.0, 0.0)?;
        let voice = &mut self.voices[id];
        voice.position = world_pos;
        voice.spatial_blend = spatial_blend.clamp(0.0, 1.0);
        Ok(id)
    }

    /// The completion watcher: advance every active voice by one wall-clock
    /// tick and return finished voices to the free list exactly once.
    pub fn tick(&mut self, unscaled_dt: f32) {
        for (id, voice) in self.voices.iter_mut().enumerate() {
            if !voice.is_playing() {
                continue;
            }
            voice.remaining -= unscaled_dt;
            if voice.remaining <= 0.0 {
                voice.release();
                self.free.push_back(id);
            }
        }
    }

    /// Stop every outstanding voice, including ones mid-playback
    pub fn stop_all(&mut self) {
        self.free.clear();
        for (id, voice) in self.voices.iter_mut().enumerate() {
            voice.release();
            self.free.push_back(id);
        }
    }

    pub fn active_count(&self) -> usize {
        self.voices.len() - self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.get(id)
    }
}

/// Clip bank with seeded-random selection per category
#[derive(Debug)]
pub struct SfxBank {
    fail_clips: Vec<Clip>,
    throw_clips: Vec<Clip>,
    drop_clips: Vec<Clip>,
    success_clip: Option<Clip>,
    /// Start offsets the success clip may begin at
    success_offsets: Vec<f32>,
    rng: Pcg32,
}

impl SfxBank {
    pub fn new(
        fail_clips: Vec<Clip>,
        throw_clips: Vec<Clip>,
        drop_clips: Vec<Clip>,
        success_clip: Option<Clip>,
        success_offsets: Vec<f32>,
        seed: u64,
    ) -> Self {
        Self {
            fail_clips,
            throw_clips,
            drop_clips,
            success_clip,
            success_offsets,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// A bank of placeholder clips, handy for tests and headless runs
    pub fn placeholder(seed: u64) -> Self {
        Self::new(
            vec![Clip::new("fail_a", 1.2), Clip::new("fail_b", 1.4)],
            vec![Clip::new("whoosh_a", 0.6), Clip::new("whoosh_b", 0.7)],
            vec![Clip::new("thud_a", 0.9), Clip::new("thud_b", 1.1)],
            Some(Clip::new("success", 8.0)),
            vec![0.0, 2.5, 5.0],
            seed,
        )
    }

    fn choose(rng: &mut Pcg32, clips: &[Clip]) -> Option<Clip> {
        if clips.is_empty() {
            None
        } else {
            Some(clips[rng.random_range(0..clips.len())].clone())
        }
    }

    pub fn fail(&mut self) -> Option<Clip> {
        Self::choose(&mut self.rng, &self.fail_clips)
    }

    pub fn throw(&mut self) -> Option<Clip> {
        Self::choose(&mut self.rng, &self.throw_clips)
    }

    pub fn drop(&mut self) -> Option<Clip> {
        Self::choose(&mut self.rng, &self.drop_clips)
    }

    /// The success jingle plus a randomly chosen start offset
    pub fn success(&mut self) -> Option<(Clip, f32)> {
        let clip = self.success_clip.clone()?;
        let offset = if self.success_offsets.is_empty() {
            0.0
        } else {
            self.success_offsets[self.rng.random_range(0..self.success_offsets.len())]
        };
        Some((clip, offset))
    }
}
