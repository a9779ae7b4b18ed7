//! ILDA laser-show decoding and WAV synthesis.
//!
//! This crate decodes the ILDA binary show format (typed sections of 2D/3D
//! points, true-color or palette-indexed) into a stream of frames, and can
//! render that frame stream into a multi-channel signed 16-bit WAV signal
//! for driving galvanometers and laser blanking directly from a sound card.
//!
//! # Example
//!
//! ```no_run
//! use ilda::{IldaDecoder, SynthConfig, WavSynth};
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! # fn main() -> ilda::Result<()> {
//! let input = BufReader::new(File::open("show.ild")?);
//! let mut decoder = IldaDecoder::new(input);
//!
//! let config = SynthConfig::default().signals("xyl")?;
//! let output = File::create("show.wav")?;
//! let bytes = WavSynth::new(config).synthesize(&mut decoder, output)?;
//! println!("wrote {bytes} sample bytes");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod decoder;
pub mod error;
pub mod format;
pub mod frame;
pub mod repeater;
pub mod wav;

pub use decoder::IldaDecoder;
pub use error::{IldaError, Result};
pub use format::{DEFAULT_PALETTE, Format, Rgb, SectionHeader, StatusFlags};
pub use frame::{Frame, FrameSource, Point};
pub use repeater::FrameRepeater;
pub use wav::{AxisInversion, Signal, SynthConfig, WavSynth, distribute};
