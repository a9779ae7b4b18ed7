//! Decoded frame model and the pull-based frame source trait.

use crate::error::Result;

/// One beam position with its resolved color.
///
/// Coordinates span the full signed 16-bit range the hardware expects.
/// Intensities are 0-255 widened to `u16` for storage. A blanked point is
/// represented by the sentinel color (0, 0, 0), not by a separate flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    /// Horizontal galvo position.
    pub x: i16,
    /// Vertical galvo position.
    pub y: i16,
    /// Depth position; zero for 2D formats.
    pub z: i16,
    /// Red intensity.
    pub r: u16,
    /// Green intensity.
    pub g: u16,
    /// Blue intensity.
    pub b: u16,
}

impl Point {
    /// Whether the beam is off at this point.
    pub fn is_blanked(&self) -> bool {
        self.r == 0 && self.g == 0 && self.b == 0
    }
}

/// One decoded scan: a projector id plus points in beam-steering order.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Projector this frame belongs to.
    pub projector: u8,
    /// Points in the order the beam visits them.
    pub points: Vec<Point>,
}

/// Pull interface over anything that yields frames in order.
///
/// Implemented by [`IldaDecoder`](crate::IldaDecoder) and
/// [`FrameRepeater`](crate::FrameRepeater); consumed by the WAV synthesis
/// engine and by renderers. `Ok(None)` signals end of stream. The returned
/// reference is only valid until the next pull; callers that need to keep a
/// frame must clone it.
pub trait FrameSource {
    /// Produce the next frame, or `None` at end of stream.
    fn next_frame(&mut self) -> Result<Option<&Frame>>;
}
