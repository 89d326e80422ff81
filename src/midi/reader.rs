//! Standard MIDI File reader

use super::DEFAULT_MICROS_PER_QUARTER;
use crate::error::{Error, Result};
use midly::{MetaMessage, MidiMessage, Smf, Timing, TrackEventKind};
use std::fs;
use std::path::Path;

/// How source ticks map to wall-clock time
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickTiming {
    /// Pulses per quarter note; tempo comes from meta-events
    Metrical { ppq: u16 },
    /// SMPTE timing, tempo independent
    Timecode { fps: f32, subframes: u8 },
}

impl TickTiming {
    /// Milliseconds per source tick at the given tempo
    pub fn ms_per_tick(&self, micros_per_quarter: u32) -> f64 {
        match *self {
            TickTiming::Metrical { ppq } => {
                micros_per_quarter as f64 / 1000.0 / ppq as f64
            }
            TickTiming::Timecode { fps, subframes } => {
                1000.0 / (fps as f64 * subframes as f64)
            }
        }
    }
}

/// Time signature meta-event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSignature {
    pub numerator: u8,
    /// Power of two (2 = quarter note)
    pub denominator: u8,
    pub clocks_per_click: u8,
    pub notated_32nds: u8,
}

/// Event payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    /// Microseconds per quarter note
    Tempo(u32),
    TimeSignature(TimeSignature),
    /// Any other channel message (controllers, program changes, ...)
    Channel { channel: u8 },
    /// Any other meta or sysex event
    Other,
}

/// A track event with its delta time in source ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub delta: u32,
    pub kind: RawEventKind,
}

impl RawEvent {
    pub fn new(delta: u32, kind: RawEventKind) -> Self {
        Self { delta, kind }
    }

    pub fn note_on(delta: u32, channel: u8, key: u8, velocity: u8) -> Self {
        Self::new(delta, RawEventKind::NoteOn { channel, key, velocity })
    }

    pub fn note_off(delta: u32, channel: u8, key: u8) -> Self {
        Self::new(delta, RawEventKind::NoteOff { channel, key, velocity: 0 })
    }

    /// MIDI channel of this event, if it is a channel message
    pub fn channel(&self) -> Option<u8> {
        match self.kind {
            RawEventKind::NoteOn { channel, .. }
            | RawEventKind::NoteOff { channel, .. }
            | RawEventKind::Channel { channel } => Some(channel),
            _ => None,
        }
    }
}

/// A parsed MIDI file
#[derive(Debug, Clone, PartialEq)]
pub struct MidiSong {
    pub timing: TickTiming,
    pub tracks: Vec<Vec<RawEvent>>,
}

impl MidiSong {
    pub fn new(timing: TickTiming, tracks: Vec<Vec<RawEvent>>) -> Self {
        Self { timing, tracks }
    }

    /// Read and parse a MIDI file from disk
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open '{}': {}", path.display(), e),
            ))
        })?;
        Self::parse(&data)
    }

    /// Parse MIDI file bytes
    pub fn parse(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data)?;
        Self::from_smf(&smf)
    }

    /// Convert a `midly` file into the translator's event model
    pub fn from_smf(smf: &Smf<'_>) -> Result<Self> {
        let timing = match smf.header.timing {
            Timing::Metrical(ppq) => {
                let ppq = ppq.as_int();
                if ppq == 0 {
                    return Err(Error::InvalidTiming(
                        "pulses per quarter note is zero".to_string(),
                    ));
                }
                TickTiming::Metrical { ppq }
            }
            Timing::Timecode(fps, subframes) => {
                if subframes == 0 {
                    return Err(Error::InvalidTiming(
                        "SMPTE subframes per frame is zero".to_string(),
                    ));
                }
                TickTiming::Timecode {
                    fps: fps.as_f32(),
                    subframes,
                }
            }
        };

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| RawEvent::new(event.delta.as_int(), convert_kind(&event.kind)))
                    .collect()
            })
            .collect();

        Ok(Self { timing, tracks })
    }

    /// Microseconds per quarter note of the first tempo event, in track order
    pub fn first_tempo(&self) -> Option<u32> {
        self.tracks.iter().flatten().find_map(|event| match event.kind {
            RawEventKind::Tempo(mpqn) => Some(mpqn),
            _ => None,
        })
    }

    /// First tempo, or 120 BPM
    pub fn tempo_or_default(&self) -> u32 {
        self.first_tempo().unwrap_or(DEFAULT_MICROS_PER_QUARTER)
    }

    /// First time signature event, if any
    pub fn time_signature(&self) -> Option<TimeSignature> {
        self.tracks.iter().flatten().find_map(|event| match event.kind {
            RawEventKind::TimeSignature(sig) => Some(sig),
            _ => None,
        })
    }
}

fn convert_kind(kind: &TrackEventKind<'_>) -> RawEventKind {
    match *kind {
        TrackEventKind::Midi { channel, message } => {
            let channel = channel.as_int();
            match message {
                MidiMessage::NoteOn { key, vel } => RawEventKind::NoteOn {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                MidiMessage::NoteOff { key, vel } => RawEventKind::NoteOff {
                    channel,
                    key: key.as_int(),
                    velocity: vel.as_int(),
                },
                _ => RawEventKind::Channel { channel },
            }
        }
        TrackEventKind::Meta(MetaMessage::Tempo(mpqn)) => RawEventKind::Tempo(mpqn.as_int()),
        TrackEventKind::Meta(MetaMessage::TimeSignature(
            numerator,
            denominator,
            clocks_per_click,
            notated_32nds,
        )) => RawEventKind::TimeSignature(TimeSignature {
            numerator,
            denominator,
            clocks_per_click,
            notated_32nds,
        }),
        _ => RawEventKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use midly::num::{u15, u24, u28, u4, u7};
    use midly::{Format, Header, TrackEvent};

    fn sample_smf_bytes() -> Vec<u8> {
        let mut smf = Smf::new(Header::new(
            Format::SingleTrack,
            Timing::Metrical(u15::new(480)),
        ));
        smf.tracks.push(vec![
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(400_000))),
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Midi {
                    channel: u4::new(2),
                    message: MidiMessage::NoteOn {
                        key: u7::new(64),
                        vel: u7::new(100),
                    },
                },
            },
            TrackEvent {
                delta: u28::new(480),
                kind: TrackEventKind::Midi {
                    channel: u4::new(2),
                    message: MidiMessage::NoteOff {
                        key: u7::new(64),
                        vel: u7::new(0),
                    },
                },
            },
            TrackEvent {
                delta: u28::new(0),
                kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
            },
        ]);
        let mut data = Vec::new();
        smf.write_std(&mut data).unwrap();
        data
    }

    #[test]
    fn test_parse_events() {
        let song = MidiSong::parse(&sample_smf_bytes()).unwrap();
        assert_eq!(song.timing, TickTiming::Metrical { ppq: 480 });
        assert_eq!(song.tracks.len(), 1);
        assert_eq!(
            &song.tracks[0][..3],
            &[
                RawEvent::new(0, RawEventKind::Tempo(400_000)),
                RawEvent::note_on(0, 2, 64, 100),
                RawEvent::note_off(480, 2, 64),
            ]
        );
        assert_eq!(song.first_tempo(), Some(400_000));
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            MidiSong::parse(b"not a midi file"),
            Err(Error::Midi(_))
        ));
    }

    #[test]
    fn test_default_tempo() {
        let song = MidiSong::new(TickTiming::Metrical { ppq: 96 }, vec![vec![]]);
        assert_eq!(song.first_tempo(), None);
        assert_eq!(song.tempo_or_default(), 500_000);
    }

    #[test]
    fn test_ms_per_tick() {
        let metrical = TickTiming::Metrical { ppq: 500 };
        assert!((metrical.ms_per_tick(500_000) - 1.0).abs() < 1e-9);

        let timecode = TickTiming::Timecode {
            fps: 25.0,
            subframes: 40,
        };
        assert!((timecode.ms_per_tick(123_456) - 1.0).abs() < 1e-9);
    }
}
