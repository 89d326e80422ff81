//! Writing voices' blocks into SFX slots and music patterns
//!
//! Blocks are walked in lockstep: block `i` of every voice plays in the same
//! music pattern. Channels are handed out left to right on each pattern to
//! the voices that have something to play there.

use super::analyze::MAX_STEP_DURATION;
use super::dedup::{RenderedSfx, SfxDuplicateDetector};
use super::note::Step;
use super::octave::OCTAVE;
use super::sfx::Block;
use crate::cart::{
    Cartridge, SfxNote, MAX_PITCH, MAX_VOLUME, NUM_CHANNELS, NUM_PATTERNS, NUM_SFX,
};
use crate::config::{SongConfig, VoiceConfig};
use crate::error::Result;
use serde::Serialize;

/// Summary of what ended up in the cartridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlacementReport {
    /// SFX slots written
    pub sfx_used: usize,
    /// Music patterns written
    pub patterns_used: usize,
    /// Placements that pointed at an already written SFX
    pub duplicates_reused: usize,
    /// Voices left out for lack of channels
    pub dropped_voices: usize,
    /// Audible steps whose shifted pitch fell outside 0..=63
    pub omitted_notes: usize,
    /// Content was left over when a slot or pattern limit was hit
    pub truncated: bool,
}

fn render_step(position: usize, step: &Step, voice: &VoiceConfig) -> Option<SfxNote> {
    if step.is_silent() {
        return None;
    }
    let pitch = step.pitch?.saturating_add(voice.octave_shift.saturating_mul(OCTAVE));
    if !(0..=MAX_PITCH as i32).contains(&pitch) {
        log::debug!("skipping out-of-range pitch {} at step {}", pitch, position);
        return None;
    }
    let volume = (step.volume as i32)
        .saturating_add(voice.volume_shift)
        .clamp(1, MAX_VOLUME as i32);

    Some(SfxNote::new(
        pitch as u8,
        voice.waveform,
        volume as u8,
        step.effect.unwrap_or_default(),
    ))
}

/// Apply a voice's overrides to a block
///
/// Returns `None` for a block without a single audible step.
pub fn render(block: &Block, voice: &VoiceConfig) -> Option<RenderedSfx> {
    if block.is_silent() {
        return None;
    }
    Some(RenderedSfx {
        speed: block.step_duration.min(MAX_STEP_DURATION) as u8,
        notes: block
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| render_step(i, step, voice))
            .collect(),
    })
}

fn write_sfx(cart: &mut Cartridge, slot: usize, sfx: &RenderedSfx) -> Result<()> {
    cart.set_sfx_properties(slot, 1, 0, 0, sfx.speed)?;
    for (position, note) in sfx.notes.iter().enumerate() {
        if let Some(note) = note {
            cart.set_note(slot, position, *note)?;
        }
    }
    Ok(())
}

/// True if voice `index` can end up in the cartridge: it fits in a channel
/// and is not muted
pub fn is_placed(song: &SongConfig, index: usize) -> bool {
    index < NUM_CHANNELS && !song.voice(index).mute
}

/// Fill `cart` with the blocks of every voice
///
/// Voices past the channel count are dropped and `song.start_offset`
/// leading blocks are skipped in every voice. Placement stops once all 64
/// SFX slots or all 64 patterns are used; a pattern being filled when the
/// slots run out still receives its duplicate blocks.
pub fn place(
    tracks: &[Vec<Block>],
    song: &SongConfig,
    cart: &mut Cartridge,
) -> Result<PlacementReport> {
    let mut report = PlacementReport::default();

    let mut tracks = tracks;
    if tracks.len() > NUM_CHANNELS {
        report.dropped_voices = tracks.len() - NUM_CHANNELS;
        log::warn!(
            "{} voices but only {} channels; dropping {} voices",
            tracks.len(),
            NUM_CHANNELS,
            report.dropped_voices
        );
        tracks = &tracks[..NUM_CHANNELS];
    }

    let tracks: Vec<&[Block]> = tracks
        .iter()
        .map(|t| t.get(song.start_offset..).unwrap_or_default())
        .collect();
    let length = tracks.iter().map(|t| t.len()).max().unwrap_or(0);

    let mut detector = SfxDuplicateDetector::new();
    let mut next_slot = 0;
    let mut row = 0;

    for index in 0..length {
        if row == NUM_PATTERNS {
            log::warn!("reached max music patterns; dropping blocks from {}", index);
            report.truncated = true;
            break;
        }

        let mut channel = 0;
        let mut out_of_slots = false;
        for (v, track) in tracks.iter().enumerate() {
            let Some(block) = track.get(index) else {
                continue;
            };
            if !is_placed(song, v) {
                continue;
            }
            let Some(rendered) = render(block, &song.voice(v)) else {
                continue;
            };

            let slot = match detector.find(&rendered) {
                Some(slot) => slot,
                None if next_slot == NUM_SFX => {
                    if !out_of_slots {
                        log::warn!("reached max SFX; dropping blocks from {}", index);
                    }
                    out_of_slots = true;
                    continue;
                }
                None => {
                    write_sfx(cart, next_slot, &rendered)?;
                    let audible = block.steps.iter().filter(|s| !s.is_silent()).count();
                    report.omitted_notes += audible - rendered.written_notes();
                    detector.record(next_slot, rendered);
                    next_slot += 1;
                    next_slot - 1
                }
            };

            cart.set_pattern_channel(row, channel, slot)?;
            channel += 1;
        }

        if channel > 0 {
            row += 1;
        }
        if out_of_slots {
            report.truncated = true;
            break;
        }
    }

    report.sfx_used = next_slot;
    report.patterns_used = row;
    report.duplicates_reused = detector.savings();
    if report.duplicates_reused > 0 {
        log::info!(
            "optimized {} occurrences of duplicate SFX",
            report.duplicates_reused
        );
    }
    Ok(report)
}
