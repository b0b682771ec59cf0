//! Mixer parameter store
//!
//! Bus levels are stored in the decibel log-domain; the public volume
//! setters convert from linear [0, 1] fractions the way a UI slider
//! delivers them.

use crate::consts::MIN_DB;

/// Named mixer parameters touched by fades, ducks and the dilation sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MixerParam {
    /// Background music bus level (dB)
    MusicDb,
    /// Sound effect bus level (dB)
    SfxDb,
}

/// Convert a linear [0, 1] volume fraction to decibels, with a -80 dB floor
#[inline]
pub fn db_from_linear(volume: f32) -> f32 {
    if volume <= 1e-4 {
        MIN_DB
    } else {
        (volume.log10() * 20.0).max(MIN_DB)
    }
}

/// Convert decibels back to a linear volume fraction
#[inline]
pub fn linear_from_db(db: f32) -> f32 {
    if db <= MIN_DB {
        0.0
    } else {
        10.0_f32.powf(db / 20.0)
    }
}

/// The mixer's parameter state
#[derive(Debug, Clone)]
pub struct Mixer {
    music_db: f32,
    sfx_db: f32,
}

impl Default for Mixer {
    fn default() -> Self {
        // Both buses start at unity gain
        Self {
            music_db: 0.0,
            sfx_db: 0.0,
        }
    }
}

impl Mixer {
    pub fn get(&self, param: MixerParam) -> f32 {
        match param {
            MixerParam::MusicDb => self.music_db,
            MixerParam::SfxDb => self.sfx_db,
        }
    }

    pub fn set(&mut self, param: MixerParam, db: f32) {
        match param {
            MixerParam::MusicDb => self.music_db = db,
            MixerParam::SfxDb => self.sfx_db = db,
        }
    }

    /// Set the music bus from a linear [0, 1] slider value
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_db = db_from_linear(volume);
    }

    /// Set the sfx bus from a linear [0, 1] slider value
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_db = db_from_linear(volume);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_conversion_round_trip() {
        for v in [1.0, 0.5, 0.1, 0.01] {
            let back = linear_from_db(db_from_linear(v));
            assert!((back - v).abs() < 1e-4, "{v} -> {back}");
        }
    }

    #[test]
    fn test_zero_volume_hits_floor() {
        assert_eq!(db_from_linear(0.0), MIN_DB);
        assert_eq!(linear_from_db(MIN_DB), 0.0);
    }

    #[test]
    fn test_unity_gain_is_zero_db() {
        assert!(db_from_linear(1.0).abs() < 1e-6);
    }

    #[test]
    fn test_params_are_independent() {
        let mut mixer = Mixer::default();
        mixer.set(MixerParam::MusicDb, -6.0);
        assert_eq!(mixer.get(MixerParam::MusicDb), -6.0);
        assert_eq!(mixer.get(MixerParam::SfxDb), 0.0);
    }
}
