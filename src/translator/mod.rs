//! MIDI to PICO-8 translation pipeline
//!
//! Notes are extracted per (track, channel) voice, snapped to a grid shared
//! by all voices, expanded into steps, moved into the playable range and cut
//! into SFX-sized blocks. The run-length compactor then merges blocks that
//! can be played back slower without changing how they sound.

pub mod analyze;
pub mod compactor;
pub mod dedup;
pub mod expand;
pub mod extract;
pub mod note;
pub mod octave;
pub mod placement;
pub mod sfx;

pub use analyze::Grid;
pub use note::{Note, Step, Voice};
pub use placement::PlacementReport;
pub use sfx::Block;

use crate::config::{SongConfig, TranslatorSettings};
use crate::error::Result;
use crate::midi::MidiSong;
use octave::Correction;

/// Output of the translation pipeline, ready for placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub grid: Grid,
    /// Blocks per voice, in voice order
    pub tracks: Vec<Vec<Block>>,
    /// Windows merged by the run-length compactor
    pub compactions: usize,
}

/// Turns a parsed MIDI song into per-voice SFX blocks
pub struct Translator {
    settings: TranslatorSettings,
}

impl Translator {
    pub fn new(settings: TranslatorSettings) -> Self {
        Self { settings }
    }

    /// Translate `song`; voices that `song_config` keeps out of the
    /// cartridge are left uncompacted
    pub fn translate(&self, song: &MidiSong, song_config: &SongConfig) -> Result<Translation> {
        let mut voices = extract::extract_voices(song);
        let grid = analyze::analyze(song, &voices, &self.settings)?;

        let mut tracks = Vec::with_capacity(voices.len());
        for (v, voice) in voices.iter_mut().enumerate() {
            let mut steps = expand::expand_voice(&mut voice.notes, &grid, &self.settings);

            if self.settings.fix_octaves {
                match octave::correct_octaves(&mut steps, self.settings.octave_policy) {
                    Correction::InRange => {}
                    Correction::Shifted(octaves) => {
                        log::info!("shifted voice {} by {} octaves", v, octaves)
                    }
                    Correction::Unresolvable { shifted } => log::warn!(
                        "voice {} (track {} channel {}) goes both too low and too high; \
                         out-of-range notes will be dropped (shifted {} octaves)",
                        v,
                        voice.track,
                        voice.channel,
                        shifted
                    ),
                }
            }

            let blocks = sfx::pack_steps(&steps, grid.step_duration);
            log::debug!("voice {}: {} steps in {} blocks", v, steps.len(), blocks.len());
            tracks.push(blocks);
        }

        let (tracks, compactions) = if self.settings.compact {
            let active: Vec<bool> = (0..tracks.len())
                .map(|v| placement::is_placed(song_config, v))
                .collect();
            compactor::compact_tracks(tracks, self.settings.max_compaction_factor, &active)
        } else {
            (tracks, 0)
        };

        Ok(Translation {
            grid,
            tracks,
            compactions,
        })
    }
}
