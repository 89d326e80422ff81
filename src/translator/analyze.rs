//! Grid and tempo inference
//!
//! Picks the base tick unit every voice is quantized to, and the SFX speed
//! that makes one grid step last as long as that many source ticks.

use super::note::Voice;
use crate::config::TranslatorSettings;
use crate::error::{Error, Result};
use crate::midi::MidiSong;
use std::collections::BTreeMap;

/// Milliseconds per PICO-8 audio tick (183 samples at 22050 Hz)
pub const PICO8_MS_PER_TICK: f64 = 183.0 / 22050.0 * 1000.0;

/// Shortest SFX speed
pub const MIN_STEP_DURATION: u32 = 1;

/// Longest SFX speed (stored in one byte)
pub const MAX_STEP_DURATION: u32 = 255;

/// Quantization grid shared by all voices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    /// Source ticks per grid step
    pub base_ticks: u32,
    /// PICO-8 ticks per grid step (SFX speed)
    pub step_duration: u32,
}

/// Occurrences of each positive note duration across all voices
pub fn duration_histogram(voices: &[Voice]) -> BTreeMap<u32, usize> {
    let mut histogram = BTreeMap::new();
    for note in voices.iter().flat_map(|v| &v.notes) {
        if note.midi_duration > 0 {
            *histogram.entry(note.midi_duration).or_insert(0) += 1;
        }
    }
    histogram
}

/// A candidate base unit and the number of other durations it divides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub ticks: u32,
    pub score: usize,
}

/// Score every duration that survives outlier filtering
///
/// With `filter_outliers`, durations occurring less often than the mean
/// occurrence count are dropped first. Results are in ascending tick order.
pub fn score_candidates(histogram: &BTreeMap<u32, usize>, filter_outliers: bool) -> Vec<Candidate> {
    let lengths: Vec<u32> = if filter_outliers && !histogram.is_empty() {
        let total: usize = histogram.values().sum();
        let mean = total as f64 / histogram.len() as f64;
        histogram
            .iter()
            .filter(|(_, &count)| count as f64 >= mean)
            .map(|(&ticks, _)| ticks)
            .collect()
    } else {
        histogram.keys().copied().collect()
    };

    lengths
        .iter()
        .map(|&ticks| Candidate {
            ticks,
            score: lengths
                .iter()
                .filter(|&&other| other != ticks && other % ticks == 0)
                .count(),
        })
        .collect()
}

/// Best candidate: highest score, smallest ticks on a tie
pub fn best_candidate(candidates: &[Candidate]) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    for &candidate in candidates {
        match best {
            Some(b) if candidate.score < b.score => {}
            Some(b) if candidate.score == b.score && candidate.ticks >= b.ticks => {}
            _ => best = Some(candidate),
        }
    }
    best
}

/// Infer the base tick unit from observed durations
pub fn choose_base_ticks(histogram: &BTreeMap<u32, usize>, filter_outliers: bool) -> Option<u32> {
    let candidates = score_candidates(histogram, filter_outliers);
    for c in &candidates {
        log::debug!("candidate base length {} divides {} others", c.ticks, c.score);
    }

    let best = best_candidate(&candidates)?;
    if best.score == 0 && histogram.len() > 1 {
        log::warn!(
            "no note duration divides any other; grid of {} ticks is a guess, \
             consider --midi-base-ticks",
            best.ticks
        );
    }
    Some(best.ticks)
}

/// SFX speed for a grid of `base_ticks` source ticks
pub fn step_duration(song: &MidiSong, base_ticks: u32) -> u32 {
    let midi_ms_per_tick = song.timing.ms_per_tick(song.tempo_or_default());
    let ticks = (base_ticks as f64 * (midi_ms_per_tick / PICO8_MS_PER_TICK)).round_ties_even();

    if ticks > MAX_STEP_DURATION as f64 {
        log::warn!(
            "step duration {} exceeds the SFX speed limit; clamping to {}",
            ticks,
            MAX_STEP_DURATION
        );
        return MAX_STEP_DURATION;
    }
    (ticks as u32).max(MIN_STEP_DURATION)
}

/// Derive the grid from all voices, honouring overrides
pub fn analyze(song: &MidiSong, voices: &[Voice], settings: &TranslatorSettings) -> Result<Grid> {
    let histogram = duration_histogram(voices);
    log::debug!("note lengths: {:?}", histogram);

    if let Some(sig) = song.time_signature() {
        log::debug!(
            "time signature {}/{}",
            sig.numerator,
            1u32 << sig.denominator.min(31)
        );
    }

    let base_ticks = match settings.base_ticks_override {
        Some(ticks) => {
            log::info!("setting MIDI base ticks per note to override setting of {}", ticks);
            ticks
        }
        None => {
            let ticks =
                choose_base_ticks(&histogram, settings.filter_outliers).ok_or(Error::EmptySong)?;
            log::info!("setting MIDI base ticks per note to {}", ticks);
            ticks
        }
    };
    if base_ticks == 0 {
        return Err(Error::Config("base ticks per note must be positive".to_string()));
    }

    let step_duration = match settings.step_duration_override {
        Some(d) => d.clamp(MIN_STEP_DURATION, MAX_STEP_DURATION),
        None => step_duration(song, base_ticks),
    };
    log::info!("PICO-8 note duration: {}", step_duration);

    Ok(Grid {
        base_ticks,
        step_duration,
    })
}
