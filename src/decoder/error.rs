//! Decoder error types
//!
//! Every failure mode of a waveform decode maps onto exactly one of these
//! variants. All of them are terminal for the decode call: there is no
//! partial result and no silent defaulting.

use thiserror::Error;

/// Errors raised while decoding a raw waveform buffer
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The buffer does not contain a well-formed block
    /// (no `'#'` marker, or malformed length digits after it)
    #[error("invalid waveform format: {0}")]
    Format(String),

    /// A declared length exceeds the bytes actually available
    #[error("not enough data for {context}: expected {expected} bytes, got {actual}")]
    InsufficientData {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The origin tag is not a supported channel code
    #[error("unknown channel origin {origin:?}")]
    UnknownChannel { origin: String },

    /// The sample encoding tag is neither 8-bit nor 16-bit
    #[error("unsupported sample encoding tag {0}")]
    UnsupportedEncoding(u8),
}

impl DecodeError {
    /// Create a format error
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Create an insufficient-data error
    pub fn insufficient(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self::InsufficientData {
            context: context.into(),
            expected,
            actual,
        }
    }
}

/// Result type alias using DecodeError
pub type DecodeResult<T> = Result<T, DecodeError>;
