//! Error handling for ILDA decoding and WAV synthesis.

use thiserror::Error;

/// Convenient result alias for decoding and synthesis operations.
pub type Result<T> = std::result::Result<T, IldaError>;

/// Errors that may occur while decoding an ILDA stream or rendering it to WAV.
///
/// All of these are fatal to the operation in progress. The decoder does not
/// rewind or resynchronize after a failure; whatever palette state earlier
/// sections committed is left in place.
#[derive(Debug, Error)]
pub enum IldaError {
    /// Section does not start with the expected `ILDA` marker.
    #[error("corrupt ILDA file: bad section magic")]
    CorruptFormat,
    /// Input ended in the middle of a header or record.
    #[error("unexpected end of input mid-record")]
    Truncated,
    /// Section header carries a format code this decoder does not know.
    #[error("unsupported ILDA format code {code}")]
    UnsupportedFormat {
        /// Format code encountered in the section header.
        code: u8,
    },
    /// A channel code in the signal string is not one of `xyzlrgb`.
    #[error("invalid signal '{signal}' (expected one of x, y, z, l, r, g, b)")]
    InvalidSignal {
        /// The offending channel character.
        signal: char,
    },
    /// Synthesis configuration is unusable (zero rate, empty signal set, ...).
    #[error("invalid configuration: {0}")]
    Config(String),
    /// IO error other than a short read (those map to [`IldaError::Truncated`]).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
