//! `ilda-wav` — convert an ILDA show file to a multi-channel WAV file.
//!
//! Samples are written as signed 16-bit little-endian integers, one channel
//! per selected signal, so the output can drive galvos and laser blanking
//! straight from a sound card.

use anyhow::{Context, Result, bail};
use ilda::{IldaDecoder, SynthConfig, WavSynth};
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Write};

const USAGE: &str = "\
ilda-wav — converts an .ild file to a .wav file

This is useful if you hook your galvometer and laser on a sound card.
Samples are written as 2-byte signed integers per channel, little endian.

Usage: ilda-wav [options] [filename]
If no filename is given, ilda-wav reads from stdin.

Options:
  -f, --fps <n>        Play speed in frames per second (default 20)
  -s, --signals <str>  Signals to include, in channel order (default xyl)
                         x: X axis    y: Y axis    z: Z axis
                         l: laser blanking
                         r: red       g: green     b: blue
  -i, --invert <str>   Invert the given axes (ex: xy)
  -r, --rate <n>       Sample rate (default 44100)
  -p, --pps <n>        Points per second your galvo can handle; points are
                       dropped when a frame is denser than this (default 20000)
  -o, --output <file>  Output file; stdout if omitted
      --help           Display this help
";

#[derive(Debug)]
struct CliArgs {
    fps: u32,
    pps: u32,
    rate: u32,
    signals: String,
    invert: String,
    output: Option<String>,
    input: Option<String>,
    show_help: bool,
}

impl Default for CliArgs {
    fn default() -> Self {
        CliArgs {
            fps: 20,
            pps: 20_000,
            rate: 44_100,
            signals: "xyl".to_string(),
            invert: String::new(),
            output: None,
            input: None,
            show_help: false,
        }
    }
}

impl CliArgs {
    fn parse() -> Result<Self> {
        let mut args = Self::default();
        let mut iter = env::args().skip(1);

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--help" => args.show_help = true,
                "-f" | "--fps" => args.fps = numeric_value(&mut iter, &arg)?,
                "-r" | "--rate" => args.rate = numeric_value(&mut iter, &arg)?,
                "-p" | "--pps" => args.pps = numeric_value(&mut iter, &arg)?,
                "-s" | "--signals" => args.signals = string_value(&mut iter, &arg)?,
                "-i" | "--invert" => args.invert = string_value(&mut iter, &arg)?,
                "-o" | "--output" => args.output = Some(string_value(&mut iter, &arg)?),
                other if other.starts_with('-') => bail!("unknown option '{other}'"),
                _ => {
                    if args.input.is_some() {
                        bail!("only one input filename may be given");
                    }
                    args.input = Some(arg);
                }
            }
        }
        Ok(args)
    }
}

fn string_value(iter: &mut impl Iterator<Item = String>, option: &str) -> Result<String> {
    iter.next()
        .with_context(|| format!("option '{option}' requires a value"))
}

fn numeric_value(iter: &mut impl Iterator<Item = String>, option: &str) -> Result<u32> {
    let value = string_value(iter, option)?;
    value
        .parse()
        .with_context(|| format!("option '{option}' expects a number, got '{value}'"))
}

fn main() -> Result<()> {
    let args = CliArgs::parse()?;
    if args.show_help {
        eprint!("{USAGE}");
        std::process::exit(1);
    }

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path).with_context(|| format!("cannot open input file '{path}'"))?,
        ),
        None => Box::new(io::stdin()),
    };
    let mut decoder = IldaDecoder::new(BufReader::new(input));

    let config = SynthConfig::default()
        .fps(args.fps)
        .pps(args.pps)
        .rate(args.rate)
        .signals(&args.signals)?
        .invert(&args.invert);
    let synth = WavSynth::new(config);

    let bytes = match &args.output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("cannot create output file '{path}'"))?;
            synth.synthesize(&mut decoder, out)?
        }
        None => {
            // stdout is not seekable, so the header patch cannot happen in
            // place; render into memory and dump the finished stream.
            let mut cursor = Cursor::new(Vec::new());
            let bytes = synth.synthesize(&mut decoder, &mut cursor)?;
            io::stdout().write_all(&cursor.into_inner())?;
            bytes
        }
    };

    eprintln!("wrote {bytes} sample bytes");
    Ok(())
}
