//! Notes, steps and voices

use crate::cart::{Effect, MAX_VOLUME};

/// Semitones subtracted from a MIDI key to get a PICO-8 pitch (MIDI 36 = C0)
pub const PITCH_OFFSET: i32 = 36;

/// One musical sound (or rest) extracted from a MIDI track
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Duration in source ticks
    pub midi_duration: u32,
    pub midi_pitch: Option<u8>,
    pub midi_channel: Option<u8>,
    pub midi_velocity: Option<u8>,

    /// Target pitch (None for rests); may leave 0..=63 until range corrected
    pub pitch: Option<i32>,
    /// Target volume 0..=7
    pub volume: u8,
    /// Number of grid steps, filled in by quantization
    pub steps: u32,
    pub effect: Option<Effect>,
}

impl Note {
    /// Silent note covering `duration` ticks
    pub fn rest(duration: u32) -> Self {
        Self {
            midi_duration: duration,
            midi_pitch: None,
            midi_channel: None,
            midi_velocity: None,
            pitch: None,
            volume: 0,
            steps: 0,
            effect: None,
        }
    }

    /// Note opened by a note-on event; duration is set when it closes
    pub fn from_note_on(channel: u8, key: u8, velocity: u8) -> Self {
        Self {
            midi_duration: 0,
            midi_pitch: Some(key),
            midi_channel: Some(channel),
            midi_velocity: Some(velocity),
            pitch: Some(key as i32 - PITCH_OFFSET),
            volume: velocity_to_volume(velocity),
            steps: 0,
            effect: None,
        }
    }

    pub fn is_audible(&self) -> bool {
        self.volume > 0
    }
}

/// Scale a MIDI velocity onto 0..=7, rounding down
pub fn velocity_to_volume(velocity: u8) -> u8 {
    ((velocity.min(127) as u32 * MAX_VOLUME as u32) / 127) as u8
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Step {
    pub pitch: Option<i32>,
    pub volume: u8,
    pub effect: Option<Effect>,
}

impl Step {
    pub fn new(pitch: i32, volume: u8) -> Self {
        Self {
            pitch: Some(pitch),
            volume,
            effect: None,
        }
    }

    pub fn silence() -> Self {
        Self::default()
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Copy of a note's tracker properties, without its effect
    pub fn from_note(note: &Note) -> Self {
        Self {
            pitch: note.pitch,
            volume: note.volume,
            effect: None,
        }
    }

    pub fn is_silent(&self) -> bool {
        self.volume == 0
    }
}

/// The notes of one (track, channel) pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub track: usize,
    pub channel: u8,
    pub notes: Vec<Note>,
}

impl Voice {
    pub fn has_audible_notes(&self) -> bool {
        self.notes.iter().any(Note::is_audible)
    }
}
