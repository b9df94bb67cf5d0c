//! Waveform decoder for LeCroy binary responses
//!
//! Converts the raw byte buffer returned by a `WF?` query into a calibrated
//! [`Waveform`]. The decode is a pure transformation: no I/O, no shared
//! state, safe to run concurrently on independent buffers. All failures are
//! immediate and terminal, reported through [`DecodeError`].

pub mod common;
pub mod error;
mod wavedesc;

pub use common::{Origin, Waveform};
pub use error::{DecodeError, DecodeResult};
