//! Streaming ILDA decoder.
//!
//! Pulls one section at a time from a byte stream and resolves every point's
//! color eagerly, so a decoded [`Frame`] never references palette state that
//! may later be replaced. Palette sections update decoder state and are
//! consumed transparently; each pull returns the next displayable frame or
//! end of stream.

use crate::error::Result;
use crate::format::{
    DEFAULT_PALETTE, Format, Rgb, SectionHeader, StatusFlags, read_exact,
};
use crate::frame::{Frame, FrameSource, Point};
use std::collections::HashMap;
use std::io::Read;

/// Decoder over any byte stream of ILDA sections.
///
/// Owns one current-frame buffer, overwritten on every pull, and one palette
/// table per projector id. Palette state is sticky across the whole decode
/// session. Not shareable across concurrent decode sessions.
pub struct IldaDecoder<R> {
    input: R,
    current: Frame,
    palettes: HashMap<u8, Vec<Rgb>>,
}

impl<R: Read> IldaDecoder<R> {
    /// Wrap a byte stream.
    pub fn new(input: R) -> Self {
        IldaDecoder {
            input,
            current: Frame::default(),
            palettes: HashMap::new(),
        }
    }

    fn palette_color(&self, projector: u8, index: u8, status: StatusFlags) -> Rgb {
        if status.contains(StatusFlags::BLANKED) {
            return Rgb::new(0, 0, 0);
        }
        let palette = self
            .palettes
            .get(&projector)
            .map(Vec::as_slice)
            .unwrap_or(&DEFAULT_PALETTE);
        // An index past the palette end decodes to blanked.
        palette.get(index as usize).copied().unwrap_or(Rgb::new(0, 0, 0))
    }

    fn decode_indexed(&mut self, header: &SectionHeader, three_d: bool) -> Result<()> {
        self.current.projector = header.projector;
        self.current.points.clear();

        for _ in 0..header.record_count {
            let (x, y, z, status_byte, index) = if three_d {
                let mut raw = [0u8; 8];
                read_exact(&mut self.input, &mut raw)?;
                (
                    i16::from_le_bytes([raw[0], raw[1]]),
                    i16::from_le_bytes([raw[2], raw[3]]),
                    i16::from_le_bytes([raw[4], raw[5]]),
                    raw[6],
                    raw[7],
                )
            } else {
                let mut raw = [0u8; 6];
                read_exact(&mut self.input, &mut raw)?;
                (
                    i16::from_le_bytes([raw[0], raw[1]]),
                    i16::from_le_bytes([raw[2], raw[3]]),
                    0,
                    raw[4],
                    raw[5],
                )
            };
            let status = StatusFlags::from_byte(status_byte);
            let color = self.palette_color(header.projector, index, status);
            self.current.points.push(Point {
                x,
                y,
                z,
                r: color.r as u16,
                g: color.g as u16,
                b: color.b as u16,
            });
        }
        Ok(())
    }

    fn decode_true_color(&mut self, header: &SectionHeader, three_d: bool) -> Result<()> {
        self.current.projector = header.projector;
        self.current.points.clear();

        for _ in 0..header.record_count {
            // True-color records carry b, g, r after the status byte.
            let (x, y, z, status_byte, b, g, r) = if three_d {
                let mut raw = [0u8; 10];
                read_exact(&mut self.input, &mut raw)?;
                (
                    i16::from_le_bytes([raw[0], raw[1]]),
                    i16::from_le_bytes([raw[2], raw[3]]),
                    i16::from_le_bytes([raw[4], raw[5]]),
                    raw[6],
                    raw[7],
                    raw[8],
                    raw[9],
                )
            } else {
                let mut raw = [0u8; 8];
                read_exact(&mut self.input, &mut raw)?;
                (
                    i16::from_le_bytes([raw[0], raw[1]]),
                    i16::from_le_bytes([raw[2], raw[3]]),
                    0,
                    raw[4],
                    raw[5],
                    raw[6],
                    raw[7],
                )
            };
            let status = StatusFlags::from_byte(status_byte);
            let (r, g, b) = if status.contains(StatusFlags::BLANKED) {
                (0, 0, 0)
            } else {
                (r as u16, g as u16, b as u16)
            };
            self.current.points.push(Point { x, y, z, r, g, b });
        }
        Ok(())
    }

    fn decode_palette(&mut self, header: &SectionHeader) -> Result<()> {
        let mut entries = Vec::with_capacity(header.record_count as usize);
        for _ in 0..header.record_count {
            let mut raw = [0u8; 3];
            read_exact(&mut self.input, &mut raw)?;
            entries.push(Rgb::new(raw[0], raw[1], raw[2]));
        }
        // A palette section replaces the projector's table outright.
        self.palettes.insert(header.projector, entries);
        Ok(())
    }
}

impl<R: Read> FrameSource for IldaDecoder<R> {
    fn next_frame(&mut self) -> Result<Option<&Frame>> {
        loop {
            let header = SectionHeader::read_from(&mut self.input)?;
            // The end sentinel is any header with a zero record count; its
            // format byte carries no meaning and is never validated.
            if header.record_count == 0 {
                return Ok(None);
            }

            match Format::from_code(header.format_code)? {
                Format::Indexed3d => self.decode_indexed(&header, true)?,
                Format::Indexed2d => self.decode_indexed(&header, false)?,
                Format::TrueColor3d => self.decode_true_color(&header, true)?,
                Format::TrueColor2d => self.decode_true_color(&header, false)?,
                Format::Palette => {
                    self.decode_palette(&header)?;
                    continue;
                }
            }

            return Ok(Some(&self.current));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::IldaError;
    use std::io::Cursor;

    fn section_header(format: u8, records: u16, projector: u8) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"ILDA");
        raw.extend_from_slice(&[0, 0, 0]);
        raw.push(format);
        raw.extend_from_slice(&[0u8; 16]); // name + company
        raw.extend_from_slice(&records.to_be_bytes());
        raw.extend_from_slice(&0u16.to_be_bytes());
        raw.extend_from_slice(&1u16.to_be_bytes());
        raw.push(projector);
        raw.push(0);
        raw
    }

    fn end_marker() -> Vec<u8> {
        section_header(0, 0, 0)
    }

    fn true_color_3d_point(x: i16, y: i16, z: i16, status: u8, rgb: (u8, u8, u8)) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&x.to_le_bytes());
        raw.extend_from_slice(&y.to_le_bytes());
        raw.extend_from_slice(&z.to_le_bytes());
        raw.push(status);
        raw.push(rgb.2);
        raw.push(rgb.1);
        raw.push(rgb.0);
        raw
    }

    fn indexed_3d_point(x: i16, y: i16, z: i16, status: u8, index: u8) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&x.to_le_bytes());
        raw.extend_from_slice(&y.to_le_bytes());
        raw.extend_from_slice(&z.to_le_bytes());
        raw.push(status);
        raw.push(index);
        raw
    }

    #[test]
    fn decodes_true_color_3d_frame() {
        let mut bytes = section_header(4, 2, 3);
        bytes.extend(true_color_3d_point(100, -200, 300, 0, (10, 20, 30)));
        bytes.extend(true_color_3d_point(-1, -2, -3, 0, (255, 0, 0)));
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.projector, 3);
        assert_eq!(frame.points.len(), 2);
        assert_eq!(
            frame.points[0],
            Point { x: 100, y: -200, z: 300, r: 10, g: 20, b: 30 }
        );
        assert_eq!(
            frame.points[1],
            Point { x: -1, y: -2, z: -3, r: 255, g: 0, b: 0 }
        );
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn blank_bit_overrides_true_color() {
        let mut bytes = section_header(4, 1, 0);
        bytes.extend(true_color_3d_point(0, 0, 0, 0x40, (255, 255, 255)));
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert!(frame.points[0].is_blanked());
    }

    #[test]
    fn last_point_bit_does_not_end_the_frame() {
        let mut bytes = section_header(4, 2, 0);
        bytes.extend(true_color_3d_point(1, 1, 1, 0x80, (1, 1, 1)));
        bytes.extend(true_color_3d_point(2, 2, 2, 0, (2, 2, 2)));
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.points.len(), 2);
    }

    #[test]
    fn indexed_frame_uses_default_palette() {
        let mut bytes = section_header(0, 1, 0);
        bytes.extend(indexed_3d_point(5, 6, 7, 0, 24));
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        // Entry 24 of the default palette is pure green.
        assert_eq!((frame.points[0].r, frame.points[0].g, frame.points[0].b), (0, 255, 0));
    }

    #[test]
    fn palette_section_replaces_palette_and_yields_no_frame() {
        let mut bytes = section_header(2, 2, 9);
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]); // two palette entries
        bytes.extend(section_header(0, 2, 9));
        bytes.extend(indexed_3d_point(0, 0, 0, 0, 1));
        bytes.extend(indexed_3d_point(0, 0, 0, 0, 2)); // out of range now
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!((frame.points[0].r, frame.points[0].g, frame.points[0].b), (4, 5, 6));
        assert!(frame.points[1].is_blanked());
    }

    #[test]
    fn palette_is_scoped_per_projector() {
        let mut bytes = section_header(2, 1, 1);
        bytes.extend_from_slice(&[9, 9, 9]);
        bytes.extend(section_header(0, 1, 2)); // other projector, default palette
        bytes.extend(indexed_3d_point(0, 0, 0, 0, 0));
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!((frame.points[0].r, frame.points[0].g, frame.points[0].b), (255, 0, 0));
    }

    #[test]
    fn indexed_2d_sets_z_to_zero() {
        let mut bytes = section_header(1, 1, 0);
        bytes.extend_from_slice(&10i16.to_le_bytes());
        bytes.extend_from_slice(&(-11i16).to_le_bytes());
        bytes.push(0); // status
        bytes.push(0); // color index
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!((frame.points[0].x, frame.points[0].y, frame.points[0].z), (10, -11, 0));
    }

    #[test]
    fn true_color_2d_sets_z_to_zero() {
        let mut bytes = section_header(5, 1, 0);
        bytes.extend_from_slice(&7i16.to_le_bytes());
        bytes.extend_from_slice(&8i16.to_le_bytes());
        bytes.push(0); // status
        bytes.extend_from_slice(&[30, 20, 10]); // b, g, r
        bytes.extend(end_marker());

        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(
            frame.points[0],
            Point { x: 7, y: 8, z: 0, r: 10, g: 20, b: 30 }
        );
    }

    #[test]
    fn zero_count_sentinel_ends_stream_despite_junk_format_byte() {
        let mut decoder = IldaDecoder::new(Cursor::new(section_header(7, 0, 0)));
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn unknown_format_with_records_is_unsupported() {
        let mut bytes = section_header(3, 1, 0);
        bytes.extend_from_slice(&[0u8; 8]);
        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        let err = decoder.next_frame().unwrap_err();
        assert!(matches!(err, IldaError::UnsupportedFormat { code: 3 }));
    }

    #[test]
    fn truncated_record_fails() {
        let mut bytes = section_header(4, 1, 0);
        bytes.extend_from_slice(&[0u8; 5]); // half a record
        let mut decoder = IldaDecoder::new(Cursor::new(bytes));
        assert!(matches!(decoder.next_frame().unwrap_err(), IldaError::Truncated));
    }

    #[test]
    fn decoding_is_deterministic() {
        let mut bytes = section_header(4, 1, 0);
        bytes.extend(true_color_3d_point(42, 43, 44, 0, (1, 2, 3)));
        bytes.extend(end_marker());

        let decode = |data: Vec<u8>| {
            let mut decoder = IldaDecoder::new(Cursor::new(data));
            decoder.next_frame().unwrap().cloned()
        };
        let a = decode(bytes.clone());
        let b = decode(bytes);
        assert_eq!(a.unwrap().points, b.unwrap().points);
    }
}
