//! Note extraction from MIDI tracks

use super::note::{Note, Voice};
use crate::midi::{MidiSong, RawEvent, RawEventKind};

/// Channels used by a track, in order of first appearance
pub fn occupied_channels(track: &[RawEvent]) -> Vec<u8> {
    let mut channels = Vec::new();
    for channel in track.iter().filter_map(RawEvent::channel) {
        if !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    channels
}

/// Turn the events of one channel into a list of notes and rests
///
/// Every note-on or note-off on `channel` is a boundary. At a boundary the
/// active note (if any) is closed with the ticks accumulated since the
/// previous boundary; with no active note those ticks become a rest. A
/// note-on with nonzero velocity then opens the next active note. Deltas of
/// events on other channels still advance time.
pub fn find_notes(track: &[RawEvent], channel: u8) -> Vec<Note> {
    let mut notes: Vec<Note> = Vec::new();
    let mut active: Option<usize> = None;
    let mut delta: u32 = 0;

    for event in track {
        delta = delta.saturating_add(event.delta);

        let opens = match event.kind {
            RawEventKind::NoteOn {
                channel: c,
                key,
                velocity,
            } if c == channel => (velocity > 0).then_some((key, velocity)),
            RawEventKind::NoteOff { channel: c, .. } if c == channel => None,
            _ => continue,
        };

        if let Some(index) = active.take() {
            notes[index].midi_duration = delta;
        } else if delta > 0 {
            notes.push(Note::rest(delta));
        }

        if let Some((key, velocity)) = opens {
            active = Some(notes.len());
            notes.push(Note::from_note_on(channel, key, velocity));
        }

        delta = 0;
    }

    notes
}

/// Extract every (track, channel) voice that has at least one audible note
pub fn extract_voices(song: &MidiSong) -> Vec<Voice> {
    let mut voices = Vec::new();

    for (t, track) in song.tracks.iter().enumerate() {
        for channel in occupied_channels(track) {
            let voice = Voice {
                track: t,
                channel,
                notes: find_notes(track, channel),
            };
            if voice.has_audible_notes() {
                voices.push(voice);
            } else {
                log::debug!("track {} channel {} has no audible notes", t, channel);
            }
        }
    }

    log::info!("found {} voices", voices.len());
    voices
}
