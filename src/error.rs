use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("MIDI parse error: {0}")]
    Midi(#[from] midly::Error),

    #[error("Invalid MIDI timing: {0}")]
    InvalidTiming(String),

    #[error("No note durations to derive a grid from (set a base ticks override)")]
    EmptySong,

    #[error("Invalid cartridge data: {0}")]
    InvalidCartridge(String),

    #[error("Cartridge parse error at line {line}: {message}")]
    CartParse { line: usize, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
