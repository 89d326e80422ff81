//! Cross-voice duplicate SFX detection

use crate::cart::SfxNote;
use std::collections::HashMap;

/// A block as it will be written to the cartridge
///
/// `notes` holds one entry per step; `None` marks a position left at the
/// cartridge's empty note.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RenderedSfx {
    pub speed: u8,
    pub notes: Vec<Option<SfxNote>>,
}

impl RenderedSfx {
    /// Number of notes actually written
    pub fn written_notes(&self) -> usize {
        self.notes.iter().filter(|n| n.is_some()).count()
    }
}

/// Maps already written SFX content to its slot
#[derive(Debug, Default)]
pub struct SfxDuplicateDetector {
    slots: HashMap<RenderedSfx, usize>,
    savings: usize,
}

impl SfxDuplicateDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot already holding identical content, counting the reuse
    pub fn find(&mut self, sfx: &RenderedSfx) -> Option<usize> {
        let slot = self.slots.get(sfx).copied();
        if slot.is_some() {
            self.savings += 1;
        }
        slot
    }

    /// Remember that `sfx` lives in `slot`; the first slot recorded wins
    pub fn record(&mut self, slot: usize, sfx: RenderedSfx) {
        self.slots.entry(sfx).or_insert(slot);
    }

    /// Number of placements that reused an existing slot
    pub fn savings(&self) -> usize {
        self.savings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Effect;

    fn sfx(speed: u8, pitches: &[u8]) -> RenderedSfx {
        RenderedSfx {
            speed,
            notes: pitches
                .iter()
                .map(|&p| Some(SfxNote::new(p, 1, 5, Effect::None)))
                .collect(),
        }
    }

    #[test]
    fn test_identical_content_shares_slot() {
        let mut detector = SfxDuplicateDetector::new();
        assert_eq!(detector.find(&sfx(12, &[1, 2, 3])), None);
        detector.record(0, sfx(12, &[1, 2, 3]));
        assert_eq!(detector.find(&sfx(12, &[1, 2, 3])), Some(0));
        assert_eq!(detector.find(&sfx(12, &[1, 2, 3])), Some(0));
        assert_eq!(detector.savings(), 2);
    }

    #[test]
    fn test_speed_and_length_distinguish() {
        let mut detector = SfxDuplicateDetector::new();
        detector.record(0, sfx(12, &[1, 2, 3]));
        assert_eq!(detector.find(&sfx(24, &[1, 2, 3])), None);
        assert_eq!(detector.find(&sfx(12, &[1, 2])), None);

        let mut gap = sfx(12, &[1, 2, 3]);
        gap.notes[1] = None;
        assert_eq!(detector.find(&gap), None);
        assert_eq!(detector.savings(), 0);
        assert_eq!(gap.written_notes(), 2);
    }

    #[test]
    fn test_first_recorded_slot_wins() {
        let mut detector = SfxDuplicateDetector::new();
        detector.record(3, sfx(8, &[9]));
        detector.record(7, sfx(8, &[9]));
        assert_eq!(detector.find(&sfx(8, &[9])), Some(3));
    }
}
