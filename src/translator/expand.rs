//! Quantization and step expansion

use super::analyze::Grid;
use super::note::{Note, Step};
use crate::cart::Effect;
use crate::config::TranslatorSettings;

/// Round `ticks` to the nearest multiple of `base` (ties to even multiple)
pub fn quantize_length(ticks: u32, base: u32) -> u32 {
    let quotient = ticks / base;
    let remainder = ticks % base;
    let rounded = match (remainder as u64 * 2).cmp(&(base as u64)) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient & 1),
    };
    rounded.saturating_mul(base)
}

/// Number of grid steps a duration of `ticks` occupies
pub fn ticks_to_steps(ticks: u32, grid: &Grid, quantization: bool) -> u32 {
    let ticks = if quantization {
        let quantized = quantize_length(ticks, grid.base_ticks);
        if quantized != ticks {
            log::debug!("quantized deltaTime {} to {}", ticks, quantized);
        }
        quantized
    } else {
        ticks
    };
    ticks / grid.base_ticks
}

/// Fill in `steps` on every note
pub fn quantize_notes(notes: &mut [Note], grid: &Grid, settings: &TranslatorSettings) {
    for note in notes.iter_mut() {
        note.steps = ticks_to_steps(note.midi_duration, grid, settings.quantization);
    }
}

/// Expand quantized notes into grid steps
///
/// A note of N steps becomes N independent copies. Unless legato is set,
/// the last copy of an audible note fades out when the next sounding note
/// repeats its pitch, when it is the last note of the voice, or always under
/// staccato. Notes of zero steps are skipped when looking for the next note.
pub fn expand_notes(notes: &[Note], settings: &TranslatorSettings) -> Vec<Step> {
    let mut steps = Vec::new();

    for (n, note) in notes.iter().enumerate() {
        if note.steps == 0 {
            continue;
        }

        let start = steps.len();
        steps.extend(std::iter::repeat(Step::from_note(note)).take(note.steps as usize));

        if settings.legato || !note.is_audible() {
            continue;
        }

        let next = notes[n + 1..].iter().find(|other| other.steps > 0);
        let repeats = match next {
            Some(next) => next.pitch == note.pitch,
            None => true,
        };
        if repeats || settings.staccato {
            if let Some(last) = steps[start..].last_mut() {
                last.effect = Some(Effect::FadeOut);
            }
        }
    }

    steps
}

/// Quantize then expand a voice's notes
pub fn expand_voice(notes: &mut [Note], grid: &Grid, settings: &TranslatorSettings) -> Vec<Step> {
    quantize_notes(notes, grid, settings);
    expand_notes(notes, settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRID: Grid = Grid {
        base_ticks: 240,
        step_duration: 15,
    };

    fn note(pitch: u8, velocity: u8, ticks: u32) -> Note {
        let mut n = Note::from_note_on(0, pitch, velocity);
        n.midi_duration = ticks;
        n
    }

    #[test]
    fn test_quantize_length() {
        assert_eq!(quantize_length(230, 240), 240);
        assert_eq!(quantize_length(250, 240), 240);
        assert_eq!(quantize_length(370, 240), 480);
        assert_eq!(quantize_length(100, 240), 0);
        // Halfway rounds to the even multiple
        assert_eq!(quantize_length(120, 240), 0);
        assert_eq!(quantize_length(360, 240), 480);
        assert_eq!(quantize_length(600, 240), 480);
    }

    #[test]
    fn test_ticks_to_steps_without_quantization() {
        assert_eq!(ticks_to_steps(470, &GRID, false), 1);
        assert_eq!(ticks_to_steps(470, &GRID, true), 2);
    }

    #[test]
    fn test_repeated_pitch_fades_out() {
        let mut notes = vec![note(60, 127, 240), note(60, 127, 240)];
        let steps = expand_voice(&mut notes, &GRID, &TranslatorSettings::default());
        let faded = Step::new(24, 7).with_effect(Effect::FadeOut);
        assert_eq!(steps, vec![faded, faded]);
    }

    #[test]
    fn test_only_last_copy_marked() {
        let mut notes = vec![note(60, 127, 720), note(62, 127, 480)];
        let steps = expand_voice(&mut notes, &GRID, &TranslatorSettings::default());
        assert_eq!(steps.len(), 5);
        assert!(steps[..4].iter().all(|s| s.effect.is_none()));
        assert_eq!(steps[4].effect, Some(Effect::FadeOut));
    }

    #[test]
    fn test_legato_suppresses_effects() {
        let settings = TranslatorSettings {
            legato: true,
            staccato: true,
            ..TranslatorSettings::default()
        };
        let mut notes = vec![note(60, 127, 240), note(60, 127, 240)];
        let steps = expand_voice(&mut notes, &GRID, &settings);
        assert!(steps.iter().all(|s| s.effect.is_none()));
    }

    #[test]
    fn test_staccato_never_marks_rests() {
        let settings = TranslatorSettings {
            staccato: true,
            ..TranslatorSettings::default()
        };
        let mut notes = vec![
            Note::rest(480),
            note(60, 127, 480),
            Note::rest(240),
            note(64, 127, 240),
        ];
        let steps = expand_voice(&mut notes, &GRID, &settings);
        assert_eq!(steps.len(), 6);
        for step in &steps {
            if step.is_silent() {
                assert!(step.effect.is_none());
            }
        }
        assert_eq!(steps[3].effect, Some(Effect::FadeOut));
        assert_eq!(steps[5].effect, Some(Effect::FadeOut));
    }

    #[test]
    fn test_zero_step_rest_does_not_hide_repeat() {
        let mut notes = vec![note(60, 127, 240), Note::rest(60), note(60, 127, 240)];
        let steps = expand_voice(&mut notes, &GRID, &TranslatorSettings::default());
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].effect, Some(Effect::FadeOut));
    }

    #[test]
    fn test_step_count_matches_quantized_sum() {
        let mut notes = vec![
            note(60, 127, 250),
            Note::rest(470),
            note(67, 90, 0),
            note(65, 90, 1190),
        ];
        let steps = expand_voice(&mut notes, &GRID, &TranslatorSettings::default());
        let expected: u32 = notes
            .iter()
            .map(|n| quantize_length(n.midi_duration, GRID.base_ticks) / GRID.base_ticks)
            .sum();
        assert_eq!(steps.len() as u32, expected);
        assert_eq!(expected, 1 + 2 + 0 + 5);
    }
}
