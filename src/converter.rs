//! MIDI file to PICO-8 cartridge conversion

use crate::cart::Cartridge;
use crate::config::Config;
use crate::error::Result;
use crate::midi::MidiSong;
use crate::translator::placement::{self, PlacementReport};
use crate::translator::Translator;
use std::path::Path;

/// Runs translation and placement with one configuration
pub struct Converter {
    config: Config,
}

impl Converter {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build a cartridge from an already parsed song
    pub fn convert_song(&self, song: &MidiSong) -> Result<(Cartridge, PlacementReport)> {
        self.config.validate()?;

        let translator = Translator::new(self.config.translator.clone());
        let translation = translator.translate(song, &self.config.song)?;
        if translation.compactions > 0 {
            log::info!("compacted {} SFX groups", translation.compactions);
        }

        let mut cart = Cartridge::new();
        let report = placement::place(&translation.tracks, &self.config.song, &mut cart)?;
        log::info!(
            "wrote {} SFX in {} music patterns",
            report.sfx_used,
            report.patterns_used
        );
        Ok((cart, report))
    }

    /// Build a cartridge from the bytes of a Standard MIDI File
    pub fn convert_bytes(&self, data: &[u8]) -> Result<(Cartridge, PlacementReport)> {
        let song = MidiSong::parse(data)?;
        self.convert_song(&song)
    }

    /// Convert `input` and write the cartridge to `output`
    pub fn convert_file(&self, input: &Path, output: &Path) -> Result<PlacementReport> {
        let song = MidiSong::open(input)?;
        let (cart, report) = self.convert_song(&song)?;
        cart.save(output)?;
        Ok(report)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
