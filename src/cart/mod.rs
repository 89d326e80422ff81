//! PICO-8 cartridge model
//!
//! Only the sound data of a cartridge is modelled: 64 SFX of 32 notes each
//! and 64 music patterns referencing up to 4 SFX. The Lua section is kept
//! as plain text.

pub mod json;
pub mod reader;
pub mod writer;

pub use json::CartJson;
pub use reader::P8Reader;
pub use writer::P8Writer;

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Number of SFX slots
pub const NUM_SFX: usize = 64;

/// Notes per SFX
pub const SFX_NOTES: usize = 32;

/// Number of music patterns
pub const NUM_PATTERNS: usize = 64;

/// Channels per music pattern
pub const NUM_CHANNELS: usize = 4;

/// Highest playable pitch (D#5)
pub const MAX_PITCH: u8 = 63;

/// Highest note volume
pub const MAX_VOLUME: u8 = 7;

/// Highest waveform id (8-15 select custom instruments)
pub const MAX_WAVEFORM: u8 = 15;

/// SFX speed used by PICO-8 for fresh SFX
pub const DEFAULT_SPEED: u8 = 16;

/// Lua stub that starts the song on load
pub const DEFAULT_LUA: &str = "music(0)\nfunction _update()\nend\n";

/// Per-note effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Effect {
    #[default]
    None = 0,
    Slide = 1,
    Vibrato = 2,
    Drop = 3,
    FadeIn = 4,
    FadeOut = 5,
    ArpFast = 6,
    ArpSlow = 7,
}

impl Effect {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Slide),
            2 => Some(Self::Vibrato),
            3 => Some(Self::Drop),
            4 => Some(Self::FadeIn),
            5 => Some(Self::FadeOut),
            6 => Some(Self::ArpFast),
            7 => Some(Self::ArpSlow),
            _ => None,
        }
    }
}

/// One note of an SFX
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct SfxNote {
    pub pitch: u8,
    pub waveform: u8,
    pub volume: u8,
    pub effect: Effect,
}

impl SfxNote {
    pub fn new(pitch: u8, waveform: u8, volume: u8, effect: Effect) -> Self {
        Self {
            pitch,
            waveform,
            volume,
            effect,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pitch > MAX_PITCH {
            return Err(Error::InvalidCartridge(format!("pitch {} out of range", self.pitch)));
        }
        if self.waveform > MAX_WAVEFORM {
            return Err(Error::InvalidCartridge(format!(
                "waveform {} out of range",
                self.waveform
            )));
        }
        if self.volume > MAX_VOLUME {
            return Err(Error::InvalidCartridge(format!(
                "volume {} out of range",
                self.volume
            )));
        }
        Ok(())
    }
}

/// One sound effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sfx {
    /// Editor view (0 = pitch, 1 = tracker)
    pub editor_mode: u8,
    /// Duration of each note in audio ticks
    pub speed: u8,
    pub loop_start: u8,
    pub loop_end: u8,
    pub notes: [SfxNote; SFX_NOTES],
}

impl Default for Sfx {
    fn default() -> Self {
        Self {
            editor_mode: 0,
            speed: DEFAULT_SPEED,
            loop_start: 0,
            loop_end: 0,
            notes: [SfxNote::default(); SFX_NOTES],
        }
    }
}

impl Sfx {
    /// True if no note is audible and the header is untouched
    pub fn is_empty(&self) -> bool {
        *self == Sfx::default()
    }
}

/// One music pattern row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pattern {
    /// Bit 0 = loop start, bit 1 = loop end, bit 2 = stop
    pub flags: u8,
    /// SFX index per channel (None = channel disabled)
    pub channels: [Option<u8>; NUM_CHANNELS],
}

impl Pattern {
    pub fn is_empty(&self) -> bool {
        self.flags == 0 && self.channels.iter().all(Option::is_none)
    }
}

/// In-memory cartridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    pub lua: String,
    pub sfx: Vec<Sfx>,
    pub music: Vec<Pattern>,
}

impl Cartridge {
    /// Empty cartridge with the default Lua stub
    pub fn new() -> Self {
        Self {
            lua: DEFAULT_LUA.to_string(),
            sfx: vec![Sfx::default(); NUM_SFX],
            music: vec![Pattern::default(); NUM_PATTERNS],
        }
    }

    fn sfx_mut(&mut self, index: usize) -> Result<&mut Sfx> {
        self.sfx
            .get_mut(index)
            .ok_or_else(|| Error::InvalidCartridge(format!("SFX index {} out of range", index)))
    }

    /// Set header fields of an SFX
    pub fn set_sfx_properties(
        &mut self,
        index: usize,
        editor_mode: u8,
        loop_start: u8,
        loop_end: u8,
        speed: u8,
    ) -> Result<()> {
        if loop_start as usize > SFX_NOTES || loop_end as usize > SFX_NOTES {
            return Err(Error::InvalidCartridge(format!(
                "loop {}..{} out of range",
                loop_start, loop_end
            )));
        }
        let sfx = self.sfx_mut(index)?;
        sfx.editor_mode = editor_mode;
        sfx.loop_start = loop_start;
        sfx.loop_end = loop_end;
        sfx.speed = speed;
        Ok(())
    }

    /// Set one note of an SFX
    pub fn set_note(&mut self, index: usize, position: usize, note: SfxNote) -> Result<()> {
        note.validate()?;
        if position >= SFX_NOTES {
            return Err(Error::InvalidCartridge(format!(
                "note position {} out of range",
                position
            )));
        }
        self.sfx_mut(index)?.notes[position] = note;
        Ok(())
    }

    /// Point a channel of a music pattern at an SFX
    pub fn set_pattern_channel(
        &mut self,
        pattern: usize,
        channel: usize,
        sfx: usize,
    ) -> Result<()> {
        if channel >= NUM_CHANNELS {
            return Err(Error::InvalidCartridge(format!("channel {} out of range", channel)));
        }
        if sfx >= NUM_SFX {
            return Err(Error::InvalidCartridge(format!("SFX index {} out of range", sfx)));
        }
        let row = self
            .music
            .get_mut(pattern)
            .ok_or_else(|| Error::InvalidCartridge(format!("pattern {} out of range", pattern)))?;
        row.channels[channel] = Some(sfx as u8);
        Ok(())
    }

    /// Serialize to `.p8` text
    pub fn to_p8_string(&self) -> String {
        let mut out = Vec::new();
        // Writing to a Vec cannot fail
        let _ = P8Writer::new(&mut out).write(self);
        String::from_utf8_lossy(&out).into_owned()
    }

    /// Write a `.p8` file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        P8Writer::new(BufWriter::new(file)).write(self)
    }
}

impl Default for Cartridge {
    fn default() -> Self {
        Self::new()
    }
}
