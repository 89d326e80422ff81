use clap::Parser;
use midi2p8::config::{Config, OctavePolicy};
use midi2p8::Converter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "midi2p8")]
#[command(version = "0.1.0")]
#[command(about = "Convert a MIDI file to PICO-8 music", long_about = None)]
struct Args {
    /// Input MIDI file
    midi_path: PathBuf,

    /// Output PICO-8 cartridge
    #[arg(default_value = "midi_out.p8")]
    cart_path: PathBuf,

    /// JSON file with translator and song settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Never fade out notes
    #[arg(long)]
    legato: bool,

    /// Fade out at the end of every note
    #[arg(long)]
    staccato: bool,

    /// Do not move out-of-range voices by octaves
    #[arg(long)]
    no_fix_octaves: bool,

    /// How out-of-range voices are corrected
    #[arg(long, value_enum)]
    octave_policy: Option<OctavePolicy>,

    /// Keep note lengths as they are instead of snapping them to the grid
    #[arg(long)]
    no_quantize: bool,

    /// MIDI ticks per PICO-8 note (inferred if not given)
    #[arg(short = 't', long)]
    midi_base_ticks: Option<u32>,

    /// PICO-8 SFX speed (computed from the tempo if not given)
    #[arg(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..=255))]
    note_duration: Option<u32>,

    /// Number of SFX blocks to skip at the start of every voice
    #[arg(long)]
    start_offset: Option<usize>,

    /// Do not merge blocks into slower SFX
    #[arg(long)]
    no_compact: bool,

    /// Largest merge factor tried when compacting
    #[arg(long)]
    max_compaction: Option<usize>,

    /// Consider every note length when inferring the grid
    #[arg(long)]
    no_outlier_filter: bool,

    /// Waveform per channel
    #[arg(long, num_args = 4, value_parser = clap::value_parser!(u8).range(0..=15))]
    waveform: Option<Vec<u8>>,

    /// Octave shift per channel
    #[arg(long, num_args = 4, allow_negative_numbers = true)]
    octave_shift: Option<Vec<i32>>,

    /// Volume shift per channel
    #[arg(long, num_args = 4, allow_negative_numbers = true)]
    volume_shift: Option<Vec<i32>>,

    /// Mute flags per channel (1 = mute)
    #[arg(long, num_args = 4, value_parser = clap::value_parser!(u8).range(0..=1))]
    mute: Option<Vec<u8>>,

    /// Print the placement report as JSON
    #[arg(long)]
    report: bool,
}

impl Args {
    /// Command line settings on top of the config file
    fn to_config(&self) -> Result<Config, midi2p8::Error> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_file(path)?,
            None => Config::default(),
        };

        let t = &mut config.translator;
        t.legato |= self.legato;
        t.staccato |= self.staccato;
        t.fix_octaves &= !self.no_fix_octaves;
        t.quantization &= !self.no_quantize;
        t.compact &= !self.no_compact;
        t.filter_outliers &= !self.no_outlier_filter;
        if let Some(policy) = self.octave_policy {
            t.octave_policy = policy;
        }
        if let Some(ticks) = self.midi_base_ticks {
            t.base_ticks_override = Some(ticks);
        }
        if let Some(duration) = self.note_duration {
            t.step_duration_override = Some(duration);
        }
        if let Some(factor) = self.max_compaction {
            t.max_compaction_factor = factor;
        }

        let song = &mut config.song;
        if let Some(offset) = self.start_offset {
            song.start_offset = offset;
        }
        for (i, &w) in self.waveform.iter().flatten().enumerate() {
            song.voice_mut(i).waveform = w;
        }
        for (i, &shift) in self.octave_shift.iter().flatten().enumerate() {
            song.voice_mut(i).octave_shift = shift;
        }
        for (i, &shift) in self.volume_shift.iter().flatten().enumerate() {
            song.voice_mut(i).volume_shift = shift;
        }
        for (i, &mute) in self.mute.iter().flatten().enumerate() {
            song.voice_mut(i).mute = mute == 1;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<(), midi2p8::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let converter = Converter::new(args.to_config()?);
    let report = converter.convert_file(&args.midi_path, &args.cart_path)?;

    if args.report {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}
