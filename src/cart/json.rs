//! JSON serialization types for cartridge sound data

use super::{Cartridge, Effect, Pattern, Sfx, NUM_CHANNELS};
use serde::Serialize;

/// Top-level JSON structure for a cartridge
#[derive(Debug, Clone, Serialize)]
pub struct CartJson {
    /// SFX that differ from an empty slot
    pub sfx: Vec<SfxJson>,
    /// Music patterns that reference at least one SFX
    pub music: Vec<PatternJson>,
}

/// JSON representation of one SFX
#[derive(Debug, Clone, Serialize)]
pub struct SfxJson {
    pub index: usize,
    pub speed: u8,
    #[serde(skip_serializing_if = "is_zero")]
    pub loop_start: u8,
    #[serde(skip_serializing_if = "is_zero")]
    pub loop_end: u8,
    /// Audible notes only
    pub notes: Vec<NoteJson>,
}

/// JSON representation of one audible note
#[derive(Debug, Clone, Serialize)]
pub struct NoteJson {
    pub position: usize,
    pub pitch: u8,
    pub waveform: u8,
    pub volume: u8,
    #[serde(skip_serializing_if = "is_no_effect")]
    pub effect: Effect,
}

/// JSON representation of a music pattern
#[derive(Debug, Clone, Serialize)]
pub struct PatternJson {
    pub index: usize,
    #[serde(skip_serializing_if = "is_zero")]
    pub flags: u8,
    pub channels: [Option<u8>; NUM_CHANNELS],
}

fn is_zero(v: &u8) -> bool {
    *v == 0
}

fn is_no_effect(e: &Effect) -> bool {
    *e == Effect::None
}

impl CartJson {
    pub fn new(cart: &Cartridge) -> Self {
        Self {
            sfx: cart
                .sfx
                .iter()
                .enumerate()
                .filter(|(_, sfx)| !sfx.is_empty())
                .map(|(index, sfx)| SfxJson::new(index, sfx))
                .collect(),
            music: cart
                .music
                .iter()
                .enumerate()
                .filter(|(_, pattern)| !pattern.is_empty())
                .map(|(index, pattern)| PatternJson::new(index, pattern))
                .collect(),
        }
    }
}

impl SfxJson {
    fn new(index: usize, sfx: &Sfx) -> Self {
        Self {
            index,
            speed: sfx.speed,
            loop_start: sfx.loop_start,
            loop_end: sfx.loop_end,
            notes: sfx
                .notes
                .iter()
                .enumerate()
                .filter(|(_, note)| note.volume > 0)
                .map(|(position, note)| NoteJson {
                    position,
                    pitch: note.pitch,
                    waveform: note.waveform,
                    volume: note.volume,
                    effect: note.effect,
                })
                .collect(),
        }
    }
}

impl PatternJson {
    fn new(index: usize, pattern: &Pattern) -> Self {
        Self {
            index,
            flags: pattern.flags,
            channels: pattern.channels,
        }
    }
}
