//! Audio subsystem
//!
//! All timed behavior here runs on unscaled wall-clock ticks so the
//! time-dilation sequencer never stretches its own feedback audio.

pub mod fade;
pub mod mixer;
pub mod music;
pub mod voices;

pub use fade::{Fade, FadeEngine};
pub use mixer::{Mixer, MixerParam, db_from_linear, linear_from_db};
pub use music::MusicChannel;
pub use voices::{Clip, SfxBank, Voice, VoiceId, VoicePool};
