//! `.p8` text cartridge reader

use super::writer::CHANNEL_DISABLED;
use super::{
    Cartridge, Effect, Pattern, Sfx, SfxNote, NUM_CHANNELS, NUM_PATTERNS, NUM_SFX, SFX_NOTES,
};
use crate::error::{Error, Result};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Lua,
    Sfx,
    Music,
    Other,
}

/// `.p8` reader
pub struct P8Reader<'a> {
    text: &'a str,
}

impl<'a> P8Reader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    /// Read a cartridge file
    pub fn read_file(path: &Path) -> Result<Cartridge> {
        let text = std::fs::read_to_string(path)?;
        P8Reader::new(&text).parse()
    }

    /// Parse the lua, sfx and music sections
    pub fn parse(&self) -> Result<Cartridge> {
        let mut cart = Cartridge {
            lua: String::new(),
            ..Cartridge::new()
        };
        let mut section = Section::Preamble;
        let mut sfx_index = 0;
        let mut music_index = 0;

        for (i, raw_line) in self.text.lines().enumerate() {
            let line_no = i + 1;
            let line = raw_line.trim_end();

            if line.len() > 4 && line.starts_with("__") && line.ends_with("__") {
                section = match &line[2..line.len() - 2] {
                    "lua" => Section::Lua,
                    "sfx" => Section::Sfx,
                    "music" => Section::Music,
                    _ => Section::Other,
                };
                continue;
            }

            match section {
                Section::Lua => {
                    cart.lua.push_str(raw_line);
                    cart.lua.push('\n');
                }
                Section::Sfx if !line.is_empty() => {
                    if sfx_index >= NUM_SFX {
                        return Err(parse_error(line_no, "too many SFX lines"));
                    }
                    cart.sfx[sfx_index] = parse_sfx_line(line, line_no)?;
                    sfx_index += 1;
                }
                Section::Music if !line.is_empty() => {
                    if music_index >= NUM_PATTERNS {
                        return Err(parse_error(line_no, "too many music lines"));
                    }
                    cart.music[music_index] = parse_pattern_line(line, line_no)?;
                    music_index += 1;
                }
                _ => {}
            }
        }

        Ok(cart)
    }
}

fn parse_error(line: usize, message: &str) -> Error {
    Error::CartParse {
        line,
        message: message.to_string(),
    }
}

fn hex_value(digits: &str, line: usize) -> Result<u8> {
    u8::from_str_radix(digits, 16)
        .map_err(|_| parse_error(line, &format!("invalid hex '{}'", digits)))
}

fn parse_sfx_line(line: &str, line_no: usize) -> Result<Sfx> {
    if line.len() != 8 + SFX_NOTES * 5 || !line.is_ascii() {
        return Err(parse_error(line_no, "SFX line must be 168 hex digits"));
    }

    let mut sfx = Sfx {
        editor_mode: hex_value(&line[0..2], line_no)?,
        speed: hex_value(&line[2..4], line_no)?,
        loop_start: hex_value(&line[4..6], line_no)?,
        loop_end: hex_value(&line[6..8], line_no)?,
        ..Sfx::default()
    };

    for (n, note) in sfx.notes.iter_mut().enumerate() {
        let at = 8 + n * 5;
        let effect = hex_value(&line[at + 4..at + 5], line_no)?;
        *note = SfxNote {
            pitch: hex_value(&line[at..at + 2], line_no)?,
            waveform: hex_value(&line[at + 2..at + 3], line_no)?,
            volume: hex_value(&line[at + 3..at + 4], line_no)?,
            effect: Effect::from_u8(effect)
                .ok_or_else(|| parse_error(line_no, &format!("unknown effect {}", effect)))?,
        };
    }

    Ok(sfx)
}

fn parse_pattern_line(line: &str, line_no: usize) -> Result<Pattern> {
    let (flags, channels) = line
        .split_once(' ')
        .ok_or_else(|| parse_error(line_no, "music line must be 'FF AABBCCDD'"))?;
    if flags.len() != 2 || channels.len() != NUM_CHANNELS * 2 || !channels.is_ascii() {
        return Err(parse_error(line_no, "music line must be 'FF AABBCCDD'"));
    }

    let mut pattern = Pattern {
        flags: hex_value(flags, line_no)?,
        ..Pattern::default()
    };
    for (ch, slot) in pattern.channels.iter_mut().enumerate() {
        let byte = hex_value(&channels[ch * 2..ch * 2 + 2], line_no)?;
        *slot = if byte & CHANNEL_DISABLED != 0 {
            None
        } else {
            Some(byte & 0x3f)
        };
    }

    Ok(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_sound_data() {
        let mut cart = Cartridge::new();
        cart.set_sfx_properties(3, 1, 0, 0, 42).unwrap();
        cart.set_note(3, 31, SfxNote::new(12, 6, 4, Effect::FadeOut)).unwrap();
        cart.set_pattern_channel(0, 0, 3).unwrap();
        cart.set_pattern_channel(0, 1, 3).unwrap();

        let parsed = P8Reader::new(&cart.to_p8_string()).parse().unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_bad_sfx_line() {
        let text = "pico-8 cartridge // http://www.pico-8.com\nversion 16\n__sfx__\n0010zz\n";
        match P8Reader::new(text).parse() {
            Err(Error::CartParse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_ignores_other_sections() {
        let text = "__gfx__\n0123\n__music__\n01 00414243\n";
        let cart = P8Reader::new(text).parse().unwrap();
        assert_eq!(cart.music[0].flags, 1);
        assert_eq!(cart.music[0].channels, [Some(0), None, None, None]);
        assert!(cart.lua.is_empty());
    }
}
