//! ILDA wire format: section headers, status flags, color tables.
//!
//! Every multi-byte field is read explicitly with a declared endianness.
//! The 16-bit section header fields are big-endian on the wire; record
//! payloads (point coordinates) are little-endian.

use crate::error::{IldaError, Result};
use bitflags::bitflags;
use std::io::Read;

/// Four-byte marker opening every section.
pub const MAGIC: [u8; 4] = *b"ILDA";

/// Size of a section header on the wire.
pub const HEADER_SIZE: usize = 32;

/// Section format codes recognized by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// 3D coordinates with palette-indexed color (8-byte records).
    Indexed3d,
    /// 2D coordinates with palette-indexed color (6-byte records).
    Indexed2d,
    /// Color palette table, one RGB triple per record.
    Palette,
    /// 3D coordinates with true color (10-byte records).
    TrueColor3d,
    /// 2D coordinates with true color (8-byte records).
    TrueColor2d,
}

impl Format {
    /// Map a wire format code to a known format.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Format::Indexed3d),
            1 => Ok(Format::Indexed2d),
            2 => Ok(Format::Palette),
            4 => Ok(Format::TrueColor3d),
            5 => Ok(Format::TrueColor2d),
            _ => Err(IldaError::UnsupportedFormat { code }),
        }
    }
}

bitflags! {
    /// Per-record status byte.
    ///
    /// Decoded with explicit masks; bit 6 is blanking, bit 7 marks the last
    /// point of a frame. The lower six bits are reserved.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        /// Beam off for this point; overrides any color source.
        const BLANKED = 0x40;
        /// Last point of the frame. Informational only; the record count in
        /// the section header already delimits the frame.
        const LAST_POINT = 0x80;
    }
}

impl StatusFlags {
    /// Decode a raw status byte, ignoring reserved bits.
    pub fn from_byte(byte: u8) -> Self {
        StatusFlags::from_bits_truncate(byte)
    }
}

/// One palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red intensity, 0-255.
    pub r: u8,
    /// Green intensity, 0-255.
    pub g: u8,
    /// Blue intensity, 0-255.
    pub b: u8,
}

impl Rgb {
    /// Construct an entry from raw intensities.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb::new(r, g, b)
}

/// Default 64-entry rainbow palette.
///
/// Used for any projector id that has never received an explicit palette
/// section. Immutable and process-wide; per-projector palettes live inside
/// each decoder instance.
pub const DEFAULT_PALETTE: [Rgb; 64] = [
    rgb(255, 0, 0),
    rgb(255, 16, 0),
    rgb(255, 32, 0),
    rgb(255, 48, 0),
    rgb(255, 64, 0),
    rgb(255, 80, 0),
    rgb(255, 96, 0),
    rgb(255, 112, 0),
    rgb(255, 128, 0),
    rgb(255, 144, 0),
    rgb(255, 160, 0),
    rgb(255, 176, 0),
    rgb(255, 192, 0),
    rgb(255, 208, 0),
    rgb(255, 224, 0),
    rgb(255, 240, 0),
    rgb(255, 255, 0),
    rgb(224, 255, 0),
    rgb(192, 255, 0),
    rgb(160, 255, 0),
    rgb(128, 255, 0),
    rgb(96, 255, 0),
    rgb(64, 255, 0),
    rgb(32, 255, 0),
    rgb(0, 255, 0),
    rgb(0, 255, 36),
    rgb(0, 255, 73),
    rgb(0, 255, 109),
    rgb(0, 255, 146),
    rgb(0, 255, 182),
    rgb(0, 255, 219),
    rgb(0, 255, 255),
    rgb(0, 227, 255),
    rgb(0, 198, 255),
    rgb(0, 170, 255),
    rgb(0, 142, 255),
    rgb(0, 113, 255),
    rgb(0, 85, 255),
    rgb(0, 56, 255),
    rgb(0, 28, 255),
    rgb(0, 0, 255),
    rgb(32, 0, 255),
    rgb(64, 0, 255),
    rgb(96, 0, 255),
    rgb(128, 0, 255),
    rgb(160, 0, 255),
    rgb(192, 0, 255),
    rgb(224, 0, 255),
    rgb(255, 0, 255),
    rgb(255, 32, 255),
    rgb(255, 64, 255),
    rgb(255, 96, 255),
    rgb(255, 128, 255),
    rgb(255, 160, 255),
    rgb(255, 192, 255),
    rgb(255, 224, 255),
    rgb(255, 255, 255),
    rgb(255, 224, 224),
    rgb(255, 192, 192),
    rgb(255, 160, 160),
    rgb(255, 128, 128),
    rgb(255, 96, 96),
    rgb(255, 64, 64),
    rgb(255, 32, 32),
];

/// Parsed section header.
#[derive(Debug, Clone)]
pub struct SectionHeader {
    /// Raw format code. Mapped through [`Format::from_code`] only for
    /// sections that carry records; the end sentinel (record count zero)
    /// may hold any value here.
    pub format_code: u8,
    /// Frame or palette name, trimmed of trailing NULs.
    pub name: String,
    /// Company name, trimmed of trailing NULs.
    pub company: String,
    /// Number of records following the header. Zero ends the stream.
    pub record_count: u16,
    /// Index of this frame within the file.
    pub frame_number: u16,
    /// Total frame count declared by the file.
    pub total_frames: u16,
    /// Projector the section belongs to.
    pub projector: u8,
}

impl SectionHeader {
    /// Read and validate one 32-byte section header.
    pub fn read_from<R: Read>(input: &mut R) -> Result<Self> {
        let mut raw = [0u8; HEADER_SIZE];
        read_exact(input, &mut raw)?;

        if raw[0..4] != MAGIC {
            return Err(IldaError::CorruptFormat);
        }

        // Bytes 4-6 and 31 are reserved.
        Ok(SectionHeader {
            format_code: raw[7],
            name: fixed_string(&raw[8..16]),
            company: fixed_string(&raw[16..24]),
            record_count: u16::from_be_bytes([raw[24], raw[25]]),
            frame_number: u16::from_be_bytes([raw[26], raw[27]]),
            total_frames: u16::from_be_bytes([raw[28], raw[29]]),
            projector: raw[30],
        })
    }
}

fn fixed_string(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

/// Fill `buf` from the input, mapping a short read to [`IldaError::Truncated`].
pub fn read_exact<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<()> {
    input.read_exact(buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            IldaError::Truncated
        } else {
            IldaError::Io(e)
        }
    })
}
