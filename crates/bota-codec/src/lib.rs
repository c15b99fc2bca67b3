//! Codecs behind the Bota64 app.
//!
//! - [`transcoder`]: a reversible bracket notation for pretty-printed JSON
//!   text.
//! - [`utf8`]: UTF-16 code units to UTF-8 bytes and back, with U+FFFD
//!   replacement or fatal errors for malformed input.
//! - [`envelope`]: the JSON wrapper of exported `.bota64` files (feature
//!   `envelope`, on by default).
//!
//! Every operation is a pure function of its input; nothing is cached or
//! shared between calls.

#![allow(missing_docs)]

mod error;
mod options;

pub mod transcoder;
pub mod utf8;

#[cfg(feature = "envelope")]
pub mod envelope;

#[cfg(test)]
mod tests;

pub use error::{DecodeError, EncodeError, Malformation, ParseError, TranscodeError};
pub use options::{DecodeOptions, Utf8Options};
pub use transcoder::{Decoded, Transcoder};
pub use utf8::Utf8Codec;

#[cfg(feature = "envelope")]
pub use envelope::{Content, Envelope, EnvelopeError, Method};
