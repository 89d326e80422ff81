//! Translator and song configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

/// Default waveform per voice (triangle, phaser-ish, saw, organ)
pub const DEFAULT_WAVEFORMS: [u8; 4] = [1, 5, 3, 6];

/// Largest factor tried by the run-length compactor
pub const DEFAULT_MAX_COMPACTION_FACTOR: usize = 8;

/// Accepted compaction factors; a factor past 255 can never fit the SFX speed
pub const COMPACTION_FACTORS: RangeInclusive<usize> = 2..=255;

/// Largest per-voice octave shift
pub const MAX_OCTAVE_SHIFT: i32 = 10;

/// Largest per-voice volume shift
pub const MAX_VOLUME_SHIFT: i32 = 7;

/// How out-of-range voices are moved back into range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OctavePolicy {
    /// Shift one octave at a time and re-check, never reversing direction
    #[default]
    Iterative,
    /// Shift once, only if most audible steps are out of range
    Majority,
}

/// Settings for the translation pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorSettings {
    /// Snap note durations to the base tick grid
    pub quantization: bool,
    /// Replaces the inferred base ticks per step
    pub base_ticks_override: Option<u32>,
    /// Replaces the computed SFX speed
    pub step_duration_override: Option<u32>,
    /// Never emit a fade-out effect
    pub legato: bool,
    /// Fade out at the end of every note (ignored under legato)
    pub staccato: bool,
    /// Octave-shift voices that leave the playable range
    pub fix_octaves: bool,
    pub octave_policy: OctavePolicy,
    /// Run the run-length compactor
    pub compact: bool,
    pub max_compaction_factor: usize,
    /// Ignore durations that occur less often than average when picking the grid
    pub filter_outliers: bool,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            quantization: true,
            base_ticks_override: None,
            step_duration_override: None,
            legato: false,
            staccato: false,
            fix_octaves: true,
            octave_policy: OctavePolicy::Iterative,
            compact: true,
            max_compaction_factor: DEFAULT_MAX_COMPACTION_FACTOR,
            filter_outliers: true,
        }
    }
}

/// Per-voice overrides applied when writing the cartridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Leave this voice out of the cartridge
    pub mute: bool,
    /// Octaves added to every pitch
    pub octave_shift: i32,
    /// Added to every volume, result clamped to 1..=7
    pub volume_shift: i32,
    pub waveform: u8,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            mute: false,
            octave_shift: 0,
            volume_shift: 0,
            waveform: 0,
        }
    }
}

impl VoiceConfig {
    pub fn with_waveform(waveform: u8) -> Self {
        Self {
            waveform,
            ..Self::default()
        }
    }
}

/// Song-specific tracker settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SongConfig {
    /// Indexed by voice position
    pub voices: Vec<VoiceConfig>,
    /// Leading SFX blocks dropped from every voice
    pub start_offset: usize,
}

impl Default for SongConfig {
    fn default() -> Self {
        Self {
            voices: DEFAULT_WAVEFORMS
                .iter()
                .map(|&w| VoiceConfig::with_waveform(w))
                .collect(),
            start_offset: 0,
        }
    }
}

impl SongConfig {
    /// Configuration of a voice, defaulted past the configured ones
    pub fn voice(&self, index: usize) -> VoiceConfig {
        self.voices.get(index).copied().unwrap_or_default()
    }

    /// Mutable access, growing the list with defaults as needed
    pub fn voice_mut(&mut self, index: usize) -> &mut VoiceConfig {
        if self.voices.len() <= index {
            self.voices.resize(index + 1, VoiceConfig::default());
        }
        &mut self.voices[index]
    }
}

/// Everything a conversion can be configured with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub translator: TranslatorSettings,
    pub song: SongConfig,
}

impl Config {
    /// Load from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        let config: Config = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let t = &self.translator;
        if t.base_ticks_override == Some(0) {
            return Err(Error::Config("base ticks override must be positive".to_string()));
        }
        if let Some(d) = t.step_duration_override {
            if d == 0 || d > 255 {
                return Err(Error::Config(format!("step duration {} not in 1..=255", d)));
            }
        }
        if !COMPACTION_FACTORS.contains(&t.max_compaction_factor) {
            return Err(Error::Config(format!(
                "max compaction factor {} not in 2..=255",
                t.max_compaction_factor
            )));
        }
        for v in &self.song.voices {
            if v.waveform > crate::cart::MAX_WAVEFORM {
                return Err(Error::Config(format!("waveform {} not in 0..=15", v.waveform)));
            }
            if v.octave_shift.unsigned_abs() > MAX_OCTAVE_SHIFT.unsigned_abs() {
                return Err(Error::Config(format!(
                    "octave shift {} not in -{}..={}",
                    v.octave_shift, MAX_OCTAVE_SHIFT, MAX_OCTAVE_SHIFT
                )));
            }
            if v.volume_shift.unsigned_abs() > MAX_VOLUME_SHIFT.unsigned_abs() {
                return Err(Error::Config(format!(
                    "volume shift {} not in -{}..={}",
                    v.volume_shift, MAX_VOLUME_SHIFT, MAX_VOLUME_SHIFT
                )));
            }
        }
        Ok(())
    }
}
