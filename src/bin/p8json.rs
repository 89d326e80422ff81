//! PICO-8 cartridge sound data to JSON

use clap::Parser;
use midi2p8::cart::{CartJson, P8Reader};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "p8json")]
#[command(version = "0.1.0")]
#[command(about = "Dump the SFX and music of a .p8 cartridge as JSON", long_about = None)]
struct Args {
    /// Input .p8 file
    input: PathBuf,

    /// Output JSON file (writes to stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output compact JSON (default is pretty-printed)
    #[arg(short, long)]
    compact: bool,
}

fn main() -> Result<(), midi2p8::Error> {
    let args = Args::parse();
    let cart = P8Reader::read_file(&args.input)?;

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    write_json(BufWriter::new(out), &CartJson::new(&cart), args.compact)
}

fn write_json<W: Write>(mut out: W, cart: &CartJson, compact: bool) -> Result<(), midi2p8::Error> {
    if compact {
        serde_json::to_writer(&mut out, cart)?;
    } else {
        serde_json::to_writer_pretty(&mut out, cart)?;
    }
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
