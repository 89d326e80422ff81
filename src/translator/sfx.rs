//! Packing step sequences into SFX-sized blocks

use super::note::Step;
use crate::cart::SFX_NOTES;

/// Up to 32 consecutive steps of one voice, played at `step_duration`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Block {
    pub steps: Vec<Step>,
    /// PICO-8 ticks per step
    pub step_duration: u32,
}

impl Block {
    pub fn new(steps: Vec<Step>, step_duration: u32) -> Self {
        Self {
            steps,
            step_duration,
        }
    }

    /// Total playback time in PICO-8 ticks
    pub fn playback_ticks(&self) -> u64 {
        self.steps.len() as u64 * self.step_duration as u64
    }

    pub fn is_silent(&self) -> bool {
        self.steps.iter().all(Step::is_silent)
    }
}

/// Slice a voice into blocks and trim silence off the end of the last one
pub fn pack_steps(steps: &[Step], step_duration: u32) -> Vec<Block> {
    let mut blocks: Vec<Block> = steps
        .chunks(SFX_NOTES)
        .map(|chunk| Block::new(chunk.to_vec(), step_duration))
        .collect();

    if let Some(last) = blocks.last_mut() {
        let keep = last
            .steps
            .iter()
            .rposition(|s| !s.is_silent())
            .map_or(0, |i| i + 1);
        last.steps.truncate(keep);
        if last.steps.is_empty() {
            blocks.pop();
        }
    }

    blocks
}

/// Total playback time of a voice's blocks
pub fn playback_ticks(blocks: &[Block]) -> u64 {
    blocks.iter().map(Block::playback_ticks).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notes(count: usize) -> Vec<Step> {
        (0..count).map(|i| Step::new((i % 40) as i32, 5)).collect()
    }

    #[test]
    fn test_fixed_size_blocks() {
        let blocks = pack_steps(&notes(70), 12);
        let lengths: Vec<usize> = blocks.iter().map(|b| b.steps.len()).collect();
        assert_eq!(lengths, vec![32, 32, 6]);
        assert!(blocks.iter().all(|b| b.step_duration == 12));
    }

    #[test]
    fn test_trailing_silence_trimmed_from_last_only() {
        let mut steps = notes(10);
        steps.extend(vec![Step::silence(); 30]);
        steps.extend(notes(2));
        steps.extend(vec![Step::silence(); 5]);
        let blocks = pack_steps(&steps, 8);
        assert_eq!(blocks.len(), 2);
        // Interior block keeps its silent tail
        assert_eq!(blocks[0].steps.len(), 32);
        assert!(blocks[0].steps[31].is_silent());
        // 10 + 30 + 2 = 42 audible-ending steps, 10 in the second block
        assert_eq!(blocks[1].steps.len(), 10);
        assert!(!blocks[1].steps[9].is_silent());
    }

    #[test]
    fn test_all_silent_tail_block_dropped() {
        let mut steps = notes(32);
        steps.extend(vec![Step::silence(); 12]);
        let blocks = pack_steps(&steps, 8);
        assert_eq!(blocks.len(), 1);
        assert!(pack_steps(&[], 8).is_empty());
    }
}
