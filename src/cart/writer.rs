//! `.p8` text cartridge writer

use super::{Cartridge, Pattern, Sfx};
use crate::error::Result;
use std::fmt::Write as _;
use std::io::Write;

/// Cartridge file header
pub const P8_HEADER: &str = "pico-8 cartridge // http://www.pico-8.com";

/// Cartridge format version written
pub const P8_VERSION: u32 = 16;

/// Channel byte flag marking a disabled channel
pub const CHANNEL_DISABLED: u8 = 0x40;

/// `.p8` writer
pub struct P8Writer<W: Write> {
    out: W,
}

impl<W: Write> P8Writer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the whole cartridge and flush
    pub fn write(&mut self, cart: &Cartridge) -> Result<()> {
        writeln!(self.out, "{}", P8_HEADER)?;
        writeln!(self.out, "version {}", P8_VERSION)?;

        writeln!(self.out, "__lua__")?;
        self.out.write_all(cart.lua.as_bytes())?;
        if !cart.lua.is_empty() && !cart.lua.ends_with('\n') {
            writeln!(self.out)?;
        }

        writeln!(self.out, "__sfx__")?;
        for sfx in &cart.sfx {
            writeln!(self.out, "{}", sfx_line(sfx))?;
        }

        writeln!(self.out, "__music__")?;
        for pattern in &cart.music {
            writeln!(self.out, "{}", pattern_line(pattern))?;
        }
        writeln!(self.out)?;

        self.out.flush()?;
        Ok(())
    }
}

/// Encode an SFX as 8 header digits followed by 5 digits per note
pub fn sfx_line(sfx: &Sfx) -> String {
    let mut line = String::with_capacity(168);
    let _ = write!(
        line,
        "{:02x}{:02x}{:02x}{:02x}",
        sfx.editor_mode, sfx.speed, sfx.loop_start, sfx.loop_end
    );
    for note in &sfx.notes {
        let _ = write!(
            line,
            "{:02x}{:x}{:x}{:x}",
            note.pitch, note.waveform, note.volume, note.effect as u8
        );
    }
    line
}

/// Encode a music pattern as `FF AABBCCDD`
pub fn pattern_line(pattern: &Pattern) -> String {
    let mut line = format!("{:02x} ", pattern.flags);
    for (ch, sfx) in pattern.channels.iter().enumerate() {
        let byte = match sfx {
            Some(index) => *index,
            // PICO-8 itself writes 0x41..0x44 for untouched channels
            None => CHANNEL_DISABLED | (ch as u8 + 1),
        };
        let _ = write!(line, "{:02x}", byte);
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::{Effect, SfxNote};

    #[test]
    fn test_empty_sfx_line() {
        let line = sfx_line(&Sfx::default());
        assert_eq!(line.len(), 168);
        assert!(line.starts_with("00100000"));
        assert!(line[8..].bytes().all(|b| b == b'0'));
    }

    #[test]
    fn test_sfx_line_notes() {
        let mut sfx = Sfx {
            editor_mode: 1,
            speed: 15,
            ..Sfx::default()
        };
        sfx.notes[0] = SfxNote::new(24, 1, 7, Effect::FadeOut);
        sfx.notes[1] = SfxNote::new(0x3f, 0xa, 3, Effect::None);
        let line = sfx_line(&sfx);
        assert_eq!(&line[..8], "010f0000");
        assert_eq!(&line[8..13], "18175");
        assert_eq!(&line[13..18], "3fa30");
    }

    #[test]
    fn test_pattern_line() {
        assert_eq!(pattern_line(&Pattern::default()), "00 41424344");
        let pattern = Pattern {
            flags: 0,
            channels: [Some(0), Some(1), None, Some(0x3f)],
        };
        assert_eq!(pattern_line(&pattern), "00 0001433f");
    }

    #[test]
    fn test_write_sections() {
        let cart = Cartridge::new();
        let text = cart.to_p8_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], P8_HEADER);
        assert_eq!(lines[1], "version 16");
        assert_eq!(lines[2], "__lua__");
        assert_eq!(lines[3], "music(0)");
        let sfx_at = lines.iter().position(|l| *l == "__sfx__").unwrap();
        let music_at = lines.iter().position(|l| *l == "__music__").unwrap();
        assert_eq!(music_at - sfx_at - 1, 64);
        assert_eq!(lines[music_at + 1], "00 41424344");
    }
}
