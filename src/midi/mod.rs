//! MIDI input model
//!
//! Byte-level parsing is done by `midly`; this module flattens its tracks
//! into the small event vocabulary the translator consumes.

pub mod reader;

pub use reader::{MidiSong, RawEvent, RawEventKind, TickTiming, TimeSignature};

/// Tempo assumed when a file carries no tempo meta-event (120 BPM)
pub const DEFAULT_MICROS_PER_QUARTER: u32 = 500_000;
