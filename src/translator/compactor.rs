//! Run-length SFX compaction
//!
//! Looks for groups of N consecutive blocks, at the same position in every
//! voice, whose note runs all divide evenly by N. Such a group is replaced by
//! a single block with every run shortened N times and the step duration
//! multiplied by N, which sounds the same but uses one SFX slot instead of N.
//! Voices that will not be placed are left alone and never hold back a merge.

use super::analyze::MAX_STEP_DURATION;
use super::note::Step;
use super::sfx::Block;
use std::ops::Range;

/// True if `next` continues a run that `prev` belongs to
fn continues_run(prev: &Step, next: &Step) -> bool {
    if prev.effect.is_some() {
        return false;
    }
    (prev.pitch == next.pitch && prev.volume == next.volume)
        || (prev.is_silent() && next.is_silent())
}

/// Split steps into maximal runs of the same sound
///
/// A step carrying an effect always ends its run.
pub fn find_runs(steps: &[Step]) -> Vec<Range<usize>> {
    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..=steps.len() {
        if i == steps.len() || !continues_run(&steps[i - 1], &steps[i]) {
            runs.push(start..i);
            start = i;
        }
    }
    runs
}

/// Run-length compactor over all voices' blocks
pub struct SfxCompactor {
    tracks: Vec<Vec<Block>>,
    /// Voices taking part; missing entries count as active
    active: Vec<bool>,
    max_factor: usize,
    compactions: usize,
}

impl SfxCompactor {
    /// `max_factor` is capped at the largest SFX speed
    pub fn new(tracks: Vec<Vec<Block>>, max_factor: usize, active: Vec<bool>) -> Self {
        Self {
            tracks,
            active,
            max_factor: max_factor.min(MAX_STEP_DURATION as usize),
            compactions: 0,
        }
    }

    fn is_active(&self, voice: usize) -> bool {
        self.active.get(voice).copied().unwrap_or(true)
    }

    fn active_tracks(&self) -> impl Iterator<Item = &Vec<Block>> {
        self.tracks
            .iter()
            .enumerate()
            .filter(|(v, _)| self.is_active(*v))
            .map(|(_, track)| track)
    }

    /// Sweep factors from high to low until nothing changes
    pub fn run(&mut self) -> usize {
        loop {
            let mut changed = 0;
            for n in (2..=self.max_factor).rev() {
                changed += self.optimize_sfx_speeds(n);
            }
            if changed == 0 {
                break;
            }
            self.compactions += changed;
        }
        self.compactions
    }

    pub fn into_tracks(self) -> Vec<Vec<Block>> {
        self.tracks
    }

    fn longest_track_len(&self) -> usize {
        self.active_tracks().map(Vec::len).max().unwrap_or(0)
    }

    /// One sweep at factor `n`; returns the number of windows compacted
    fn optimize_sfx_speeds(&mut self, n: usize) -> usize {
        let mut compacted = 0;
        let mut start = 0;
        while start < self.longest_track_len() {
            if self.window_divides(start, n) {
                log::info!("compacting SFX group at {} by a factor of {}", start, n);
                self.compact_window(start, n);
                compacted += 1;
            }
            start += 1;
        }
        compacted
    }

    /// Check every voice that has a block at `start`
    fn window_divides(&self, start: usize, n: usize) -> bool {
        let mut participants = 0;

        for track in self.active_tracks() {
            if track.len() <= start {
                continue;
            }
            // Tail window shorter than n
            let end = start.saturating_add(n);
            if track.len() < end {
                return false;
            }

            let window = &track[start..end];
            let duration = window[0].step_duration;
            if window.iter().any(|b| b.step_duration != duration) {
                return false;
            }
            if duration as u64 * n as u64 > MAX_STEP_DURATION as u64 {
                return false;
            }

            let divides = window
                .iter()
                .all(|block| find_runs(&block.steps).iter().all(|run| run.len() % n == 0));
            if !divides {
                return false;
            }

            participants += 1;
        }

        participants > 0
    }

    fn compact_window(&mut self, start: usize, n: usize) {
        let active: Vec<bool> = (0..self.tracks.len()).map(|v| self.is_active(v)).collect();
        for (track, _) in self
            .tracks
            .iter_mut()
            .zip(active)
            .filter(|(t, active)| *active && t.len() > start)
        {
            let mut merged = Vec::new();
            for block in &track[start..start + n] {
                for run in find_runs(&block.steps) {
                    let keep = run.len() / n;
                    merged.extend_from_slice(&block.steps[run.end - keep..run.end]);
                }
            }

            let first = &mut track[start];
            first.steps = merged;
            first.step_duration *= n as u32;
            track.drain(start + 1..start + n);
        }
    }
}

/// Compact the voices flagged in `active`; returns the new blocks and the
/// number of merges
pub fn compact_tracks(
    tracks: Vec<Vec<Block>>,
    max_factor: usize,
    active: &[bool],
) -> (Vec<Vec<Block>>, usize) {
    let mut compactor = SfxCompactor::new(tracks, max_factor, active.to_vec());
    let count = compactor.run();
    (compactor.into_tracks(), count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Effect;
    use crate::translator::sfx::playback_ticks;

    fn run_of(pitch: i32, len: usize) -> Vec<Step> {
        vec![Step::new(pitch, 5); len]
    }

    fn block(parts: &[Vec<Step>], duration: u32) -> Block {
        Block::new(parts.concat(), duration)
    }

    #[test]
    fn test_find_runs() {
        let fade = Step::new(1, 5).with_effect(Effect::FadeOut);
        let mut steps = run_of(1, 2);
        steps.push(fade);
        steps.push(Step::new(1, 5));
        steps.extend(run_of(2, 2));
        steps.push(Step::silence());
        steps.push(Step::new(9, 0));
        let runs = find_runs(&steps);
        assert_eq!(runs, vec![0..3, 3..4, 4..6, 6..8]);
        assert!(find_runs(&[]).is_empty());
    }

    #[test]
    fn test_compacts_pair() {
        let tracks = vec![vec![
            block(&[run_of(10, 16), run_of(12, 16)], 10),
            block(&[run_of(14, 32)], 10),
        ]];
        let before = playback_ticks(&tracks[0]);
        let (tracks, count) = compact_tracks(tracks, 8, &[]);

        assert_eq!(count, 1);
        assert_eq!(tracks[0].len(), 1);
        let merged = &tracks[0][0];
        assert_eq!(merged.step_duration, 20);
        assert_eq!(merged.steps, [run_of(10, 8), run_of(12, 8), run_of(14, 16)].concat());
        assert_eq!(playback_ticks(&tracks[0]), before);
    }

    #[test]
    fn test_repeats_until_stable() {
        let tracks = vec![vec![block(&[run_of(20, 32)], 10); 4]];
        let (tracks, count) = compact_tracks(tracks, 8, &[]);
        assert_eq!(count, 1);
        assert_eq!(tracks[0].len(), 1);
        assert_eq!(tracks[0][0].steps.len(), 32);
        assert_eq!(tracks[0][0].step_duration, 40);
    }

    #[test]
    fn test_uneven_runs_untouched() {
        let tracks = vec![vec![
            block(&[run_of(10, 3), run_of(12, 29)], 10),
            block(&[run_of(14, 32)], 10),
        ]];
        let (after, count) = compact_tracks(tracks.clone(), 8, &[]);
        assert_eq!(count, 0);
        assert_eq!(after, tracks);
    }

    #[test]
    fn test_voices_compact_together() {
        let even = vec![block(&[run_of(10, 32)], 10); 2];
        let odd = vec![block(&[run_of(10, 31), run_of(11, 1)], 10), block(&[run_of(10, 32)], 10)];
        let (after, count) = compact_tracks(vec![even.clone(), odd.clone()], 8, &[]);
        assert_eq!(count, 0);
        assert_eq!(after, vec![even, odd]);
    }

    #[test]
    fn test_ended_voice_does_not_block() {
        let short = vec![block(&[run_of(3, 5)], 10)];
        let long = vec![
            block(&[run_of(10, 32)], 10),
            block(&[run_of(10, 32)], 10),
            block(&[run_of(12, 32)], 10),
        ];
        let (after, _) = compact_tracks(vec![short.clone(), long], 8, &[]);
        assert_eq!(after[0], short);
        // Window at 0 is cut short by the one-block voice; window at 1 holds only the long voice
        assert_eq!(after[1].len(), 2);
        assert_eq!(after[1][1].step_duration, 20);
    }

    #[test]
    fn test_inactive_voice_does_not_block() {
        let even = vec![block(&[run_of(10, 32)], 10); 2];
        let odd = vec![block(&[run_of(10, 31), run_of(11, 1)], 10), block(&[run_of(10, 32)], 10)];
        let mut tracks = vec![even.clone(); 4];
        tracks.push(odd.clone());

        let active = [true, true, true, true, false];
        let (after, count) = compact_tracks(tracks, 8, &active);
        assert_eq!(count, 1);
        for track in &after[..4] {
            assert_eq!(track.len(), 1);
            assert_eq!(track[0].step_duration, 20);
        }
        assert_eq!(after[4], odd);
    }

    #[test]
    fn test_huge_factor_is_capped() {
        let tracks = vec![vec![block(&[run_of(10, 32)], 10); 3]];
        let (after, count) = compact_tracks(tracks, usize::MAX, &[]);
        assert_eq!(count, 1);
        assert_eq!(after[0].len(), 2);
    }

    #[test]
    fn test_duration_cap() {
        let tracks = vec![vec![block(&[run_of(10, 32)], 200); 2]];
        let (after, count) = compact_tracks(tracks, 8, &[]);
        assert_eq!(count, 0);
        assert_eq!(after[0].len(), 2);
    }

    #[test]
    fn test_keeps_effect_tail() {
        let mut phrase = run_of(7, 3);
        phrase.push(Step::new(7, 5).with_effect(Effect::FadeOut));
        let tracks = vec![vec![block(&vec![phrase.clone(); 8], 10); 2]];
        let (after, _) = compact_tracks(tracks, 2, &[]);
        let steps = &after[0][0].steps;
        assert_eq!(steps.len(), 32);
        assert_eq!(steps[0].effect, None);
        assert_eq!(steps[1].effect, Some(Effect::FadeOut));
    }
}
