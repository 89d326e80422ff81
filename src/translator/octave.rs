//! Octave correction for voices that leave the playable pitch range

use super::note::Step;
use crate::cart::MAX_PITCH;
use crate::config::OctavePolicy;

/// Semitones per octave
pub const OCTAVE: i32 = 12;

/// Outcome of correcting one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correction {
    /// Nothing to do
    InRange,
    /// Shifted by this many octaves (positive = up)
    Shifted(i32),
    /// Goes out of range in both directions; any shift applied before the
    /// conflict was found is reported
    Unresolvable { shifted: i32 },
}

/// Which sides of the range the audible steps of a voice fall off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeScan {
    pub audible: usize,
    pub too_low: usize,
    pub too_high: usize,
}

pub fn scan(steps: &[Step]) -> RangeScan {
    let mut result = RangeScan::default();
    for step in steps.iter().filter(|s| !s.is_silent()) {
        let Some(pitch) = step.pitch else { continue };
        result.audible += 1;
        if pitch < 0 {
            result.too_low += 1;
        } else if pitch > MAX_PITCH as i32 {
            result.too_high += 1;
        }
    }
    result
}

/// Move every pitched step by `octaves`
pub fn shift_octaves(steps: &mut [Step], octaves: i32) {
    for pitch in steps.iter_mut().filter_map(|s| s.pitch.as_mut()) {
        *pitch += octaves * OCTAVE;
    }
}

/// Bring a voice back into range according to `policy`
pub fn correct_octaves(steps: &mut [Step], policy: OctavePolicy) -> Correction {
    match policy {
        OctavePolicy::Iterative => correct_iterative(steps),
        OctavePolicy::Majority => correct_majority(steps),
    }
}

/// Shift one octave at a time until in range
///
/// Stops without reversing: a voice pushed off the top by raising (or off
/// the bottom by lowering) is left where it is and reported.
fn correct_iterative(steps: &mut [Step]) -> Correction {
    let mut shifted = 0;
    loop {
        let range = scan(steps);
        let direction = match (range.too_low > 0, range.too_high > 0) {
            (false, false) => break,
            (true, true) => return Correction::Unresolvable { shifted },
            (true, false) => 1,
            (false, true) => -1,
        };
        if shifted * direction < 0 {
            return Correction::Unresolvable { shifted };
        }
        shift_octaves(steps, direction);
        shifted += direction;
    }

    if shifted == 0 {
        Correction::InRange
    } else {
        Correction::Shifted(shifted)
    }
}

/// Shift a single octave if most audible steps are out of range on one side
fn correct_majority(steps: &mut [Step]) -> Correction {
    let range = scan(steps);
    if range.too_low > 0 && range.too_high > 0 {
        return Correction::Unresolvable { shifted: 0 };
    }
    let direction = if range.too_low * 2 > range.audible {
        1
    } else if range.too_high * 2 > range.audible {
        -1
    } else {
        return Correction::InRange;
    };
    shift_octaves(steps, direction);
    Correction::Shifted(direction)
}
