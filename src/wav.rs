//! WAV synthesis engine.
//!
//! Maps a frame stream onto a fixed sample rate under three independent
//! constraints: playback frame rate (fps), the galvo's point-rate ceiling
//! (pps) and the audio sample rate. Bandwidth is split with an exact
//! remainder-free distribution, so every one-second window consumes exactly
//! `pps` interpolated points and exactly `rate` samples with no cumulative
//! drift. Coordinates are linearly interpolated between consecutive points;
//! colors and the laser gate are not.

use crate::error::{IldaError, Result};
use crate::frame::FrameSource;
use std::io::{BufWriter, Seek, SeekFrom, Write};

/// 0-255 intensity to 16-bit sample scale.
const COLOR_SCALE: i64 = (i16::MAX / u8::MAX as i16) as i64;

/// Size of the n-th group when `total` is split maximally evenly into
/// `groups` groups.
///
/// Every result is `total / groups` or one more, and summing over all group
/// indices yields exactly `total`. Deterministic, no running accumulator.
///
/// `groups` must be nonzero.
pub fn distribute(total: u32, groups: u32, index: u32) -> u32 {
    let base = total / groups;
    let rem = (total % groups) as u64;
    let groups = groups as u64;
    let index = index as u64;
    let extra = (index * rem) % groups > ((index + 1) * rem) % groups;
    if extra { base + 1 } else { base }
}

/// Output channel selectable in the signal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Horizontal galvo position.
    X,
    /// Vertical galvo position.
    Y,
    /// Depth position.
    Z,
    /// Laser gate: full positive scale while the beam is on, zero while
    /// blanked.
    Laser,
    /// Red intensity.
    Red,
    /// Green intensity.
    Green,
    /// Blue intensity.
    Blue,
}

impl Signal {
    /// Map a channel code to a signal.
    pub fn from_char(code: char) -> Result<Self> {
        match code {
            'x' => Ok(Signal::X),
            'y' => Ok(Signal::Y),
            'z' => Ok(Signal::Z),
            'l' => Ok(Signal::Laser),
            'r' => Ok(Signal::Red),
            'g' => Ok(Signal::Green),
            'b' => Ok(Signal::Blue),
            signal => Err(IldaError::InvalidSignal { signal }),
        }
    }

    /// Parse a whole signal string, in channel order.
    pub fn parse_spec(spec: &str) -> Result<Vec<Signal>> {
        spec.chars().map(Signal::from_char).collect()
    }
}

/// Which coordinate axes to negate before interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AxisInversion {
    /// Negate x.
    pub x: bool,
    /// Negate y.
    pub y: bool,
    /// Negate z.
    pub z: bool,
}

impl AxisInversion {
    /// Build from an invert string; characters other than `xyz` are ignored.
    pub fn from_spec(spec: &str) -> Self {
        AxisInversion {
            x: spec.contains('x'),
            y: spec.contains('y'),
            z: spec.contains('z'),
        }
    }
}

/// Synthesis parameters.
#[derive(Debug, Clone)]
pub struct SynthConfig {
    /// Playback speed in frames per second.
    pub fps: u32,
    /// Point-rate ceiling of the galvo, in points per second.
    pub pps: u32,
    /// Audio sample rate in Hz.
    pub rate: u32,
    /// Output channels, one PCM channel per entry, in order.
    pub signals: Vec<Signal>,
    /// Axes to negate.
    pub invert: AxisInversion,
}

impl Default for SynthConfig {
    fn default() -> Self {
        SynthConfig {
            fps: 20,
            pps: 20_000,
            rate: 44_100,
            signals: vec![Signal::X, Signal::Y, Signal::Laser],
            invert: AxisInversion::default(),
        }
    }
}

impl SynthConfig {
    /// Set the playback frame rate.
    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Set the point-rate ceiling.
    pub fn pps(mut self, pps: u32) -> Self {
        self.pps = pps;
        self
    }

    /// Set the audio sample rate.
    pub fn rate(mut self, rate: u32) -> Self {
        self.rate = rate;
        self
    }

    /// Select output channels from a signal string such as `"xyl"`.
    pub fn signals(mut self, spec: &str) -> Result<Self> {
        self.signals = Signal::parse_spec(spec)?;
        Ok(self)
    }

    /// Select axes to invert from a string such as `"xy"`.
    pub fn invert(mut self, spec: &str) -> Self {
        self.invert = AxisInversion::from_spec(spec);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(IldaError::Config("fps must be positive".into()));
        }
        if self.pps == 0 {
            return Err(IldaError::Config("pps must be positive".into()));
        }
        if self.rate == 0 {
            return Err(IldaError::Config("sample rate must be positive".into()));
        }
        if self.signals.is_empty() {
            return Err(IldaError::Config("at least one signal is required".into()));
        }
        Ok(())
    }
}

/// Canonical 44-byte PCM WAV header, every field little-endian.
///
/// Written once with a zero data size, then rewritten in place at the start
/// of the stream when the true sample byte count is known. Always the plain
/// 16-byte PCM fmt chunk, whatever the channel count; downstream laser
/// tooling expects the data chunk at a fixed offset.
struct WavHeader {
    channels: u16,
    rate: u32,
    data_size: u32,
}

impl WavHeader {
    const SIZE: u32 = 44;

    fn to_bytes(&self) -> [u8; Self::SIZE as usize] {
        let bytes_per_block = self.channels * 2;
        let bytes_per_second = self.rate * bytes_per_block as u32;

        let mut raw = [0u8; Self::SIZE as usize];
        raw[0..4].copy_from_slice(b"RIFF");
        raw[4..8].copy_from_slice(&(self.data_size + Self::SIZE - 8).to_le_bytes());
        raw[8..12].copy_from_slice(b"WAVE");
        raw[12..16].copy_from_slice(b"fmt ");
        raw[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt chunk size
        raw[20..22].copy_from_slice(&1u16.to_le_bytes()); // format tag: PCM
        raw[22..24].copy_from_slice(&self.channels.to_le_bytes());
        raw[24..28].copy_from_slice(&self.rate.to_le_bytes());
        raw[28..32].copy_from_slice(&bytes_per_second.to_le_bytes());
        raw[32..34].copy_from_slice(&bytes_per_block.to_le_bytes());
        raw[34..36].copy_from_slice(&16u16.to_le_bytes()); // bits per sample
        raw[36..40].copy_from_slice(b"data");
        raw[40..44].copy_from_slice(&self.data_size.to_le_bytes());
        raw
    }
}

fn apply_invert(value: i16, invert: bool) -> i16 {
    // wrapping_neg keeps i16::MIN in range, as the original's truncation did.
    if invert { value.wrapping_neg() } else { value }
}

/// Renders a frame stream into an interleaved s16le WAV stream.
pub struct WavSynth {
    config: SynthConfig,
}

impl WavSynth {
    /// Create an engine with the given configuration.
    pub fn new(config: SynthConfig) -> Self {
        WavSynth { config }
    }

    /// Consume the source and write the complete WAV stream.
    ///
    /// The destination must be seekable: the container header is written
    /// first with placeholder sizes and patched once the sample count is
    /// known. Returns the number of sample data bytes written.
    pub fn synthesize<S, W>(&self, source: &mut S, out: W) -> Result<u64>
    where
        S: FrameSource,
        W: Write + Seek,
    {
        let config = &self.config;
        config.validate()?;

        let mut out = BufWriter::new(out);
        let mut header = WavHeader {
            channels: config.signals.len() as u16,
            rate: config.rate,
            data_size: 0,
        };
        out.write_all(&header.to_bytes())?;

        let mut frame_number: u64 = 0;
        // Interpolated points emitted since the start of the current
        // one-second window.
        let mut point_number: u32 = 0;
        // Last exact destination, not the last interpolated sample, so
        // truncation error never accumulates.
        let (mut last_x, mut last_y, mut last_z) = (0i16, 0i16, 0i16);
        let mut samples_written: u64 = 0;

        while let Some(frame) = source.next_frame()? {
            let frame_in_second = (frame_number % config.fps as u64) as u32;
            if frame_in_second == 0 {
                point_number = 0;
            }

            let frame_budget = distribute(config.pps, config.fps, frame_in_second);
            let location_count = frame.points.len() as u32;

            for (i, location) in frame.points.iter().enumerate() {
                let steps = distribute(frame_budget, location_count, i as u32);
                if steps == 0 {
                    // Too dense for the galvo; this location is dropped.
                    continue;
                }

                let x = apply_invert(location.x, config.invert.x);
                let y = apply_invert(location.y, config.invert.y);
                let z = apply_invert(location.z, config.invert.z);

                let dx = x as i64 - last_x as i64;
                let dy = y as i64 - last_y as i64;
                let dz = z as i64 - last_z as i64;

                let laser = if location.is_blanked() { 0 } else { i16::MAX };
                let red = (location.r as i64 * COLOR_SCALE) as i16;
                let green = (location.g as i64 * COLOR_SCALE) as i16;
                let blue = (location.b as i64 * COLOR_SCALE) as i16;

                let k = steps as i64;
                for p in 1..=k {
                    let ix = (last_x as i64 + dx * p / k) as i16;
                    let iy = (last_y as i64 + dy * p / k) as i16;
                    let iz = (last_z as i64 + dz * p / k) as i16;

                    let sample_count = distribute(config.rate, config.pps, point_number);
                    for _ in 0..sample_count {
                        for signal in &config.signals {
                            let value = match signal {
                                Signal::X => ix,
                                Signal::Y => iy,
                                Signal::Z => iz,
                                Signal::Laser => laser,
                                Signal::Red => red,
                                Signal::Green => green,
                                Signal::Blue => blue,
                            };
                            out.write_all(&value.to_le_bytes())?;
                            samples_written += 1;
                        }
                    }
                    point_number += 1;
                }

                last_x = x;
                last_y = y;
                last_z = z;
            }

            frame_number += 1;
        }

        header.data_size = (samples_written * 2) as u32;
        out.seek(SeekFrom::Start(0))?;
        out.write_all(&header.to_bytes())?;
        out.flush()?;
        Ok(samples_written * 2)
    }
}
