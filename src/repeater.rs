//! Cyclic frame repeater for endless playback.

use crate::error::Result;
use crate::frame::{Frame, FrameSource};

/// Wraps a frame source and replays its frames forever.
///
/// Pass one forwards every frame unchanged while keeping a copy. Once the
/// source reports end of stream the repeater switches permanently to replay
/// mode and cycles the buffered frames in original order, never querying the
/// source again. A source that yields no frames at all makes the repeater a
/// permanent end of stream.
pub struct FrameRepeater<S> {
    source: S,
    buffered: Vec<Frame>,
    replaying: bool,
    position: usize,
}

impl<S: FrameSource> FrameRepeater<S> {
    /// Wrap a frame source.
    pub fn new(source: S) -> Self {
        FrameRepeater {
            source,
            buffered: Vec::new(),
            replaying: false,
            position: 0,
        }
    }
}

impl<S: FrameSource> FrameSource for FrameRepeater<S> {
    fn next_frame(&mut self) -> Result<Option<&Frame>> {
        if !self.replaying {
            match self.source.next_frame()? {
                Some(frame) => {
                    let copy = frame.clone();
                    self.buffered.push(copy);
                    return Ok(self.buffered.last());
                }
                None => {
                    self.replaying = true;
                    self.position = 0;
                }
            }
        }

        if self.buffered.is_empty() {
            return Ok(None);
        }
        if self.position >= self.buffered.len() {
            self.position = 0;
        }
        let frame = &self.buffered[self.position];
        self.position += 1;
        Ok(Some(frame))
    }
}
