//! UTF-16 code units to UTF-8 bytes and back.
//!
//! Encoding pairs surrogates into supplementary scalars and replaces every
//! unpaired half with U+FFFD. Decoding reads one byte at a time, replaces each
//! malformed sequence with U+FFFD and resynchronizes on the next byte, so the
//! decoded text never holds an unpaired surrogate.
//!
//! In fatal mode ([`Utf8Options::fatal`]) the first malformation is returned as
//! an error instead.
//!
//! ```rust
//! use bota_codec::utf8;
//!
//! assert_eq!(utf8::encode("€"), [0xE2, 0x82, 0xAC]);
//! assert_eq!(utf8::decode_lossy(&[0xF0, 0x9F, 0x98, 0x80]), "😀");
//! assert_eq!(utf8::decode_lossy(&[0xFF]), "\u{FFFD}");
//! ```

mod decoder;
mod encoder;


use core::{char::REPLACEMENT_CHARACTER, convert::Infallible};

use bstr::BStr;

pub use self::decoder::{DecoderState, Step};
use crate::{
    error::{DecodeError, EncodeError},
    options::Utf8Options,
};

/// Byte codec configured with [`Utf8Options`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Codec {
    options: Utf8Options,
}

impl Utf8Codec {
    #[must_use]
    pub const fn new(options: Utf8Options) -> Self {
        Self { options }
    }

    #[must_use]
    pub const fn options(&self) -> Utf8Options {
        self.options
    }

    /// Encode UTF-16 code units.
    ///
    /// # Errors
    ///
    /// In fatal mode, fails on the first unpaired surrogate. Never fails
    /// otherwise.
    pub fn encode_utf16(&self, units: &[u16]) -> Result<Vec<u8>, EncodeError> {
        let fatal = self.options.fatal;
        encoder::encode_units(units, |err| {
            if fatal {
                return Err(err);
            }
            log::warn!("replacing {err}");
            Ok(())
        })
    }

    /// Encode a string. A `str` holds no unpaired surrogates, so this cannot
    /// fail in either mode.
    #[must_use]
    pub fn encode_str(&self, text: &str) -> Vec<u8> {
        encoder::encode_chars(text.chars(), text.len())
    }

    /// Decode bytes into a string.
    ///
    /// # Errors
    ///
    /// In fatal mode, fails on the first malformed sequence. Never fails
    /// otherwise.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, DecodeError> {
        let mut out = String::with_capacity(bytes.len());
        self.decode_chars(bytes, |c| out.push(c))?;
        Ok(out)
    }

    /// Decode bytes into UTF-16 code units, splitting supplementary scalars
    /// into surrogate pairs.
    ///
    /// # Errors
    ///
    /// In fatal mode, fails on the first malformed sequence. Never fails
    /// otherwise.
    pub fn decode_utf16(&self, bytes: &[u8]) -> Result<Vec<u16>, DecodeError> {
        let mut out = Vec::with_capacity(bytes.len());
        self.decode_chars(bytes, |c| push_utf16(&mut out, c))?;
        Ok(out)
    }

    fn decode_chars(&self, bytes: &[u8], emit: impl FnMut(char)) -> Result<(), DecodeError> {
        let fatal = self.options.fatal;
        decode_with(bytes, emit, |err| {
            if fatal {
                return Err(err);
            }
            warn_replaced(bytes, err);
            Ok(())
        })
    }
}

/// Encode a string with the default options.
#[must_use]
pub fn encode(text: &str) -> Vec<u8> {
    Utf8Codec::default().encode_str(text)
}

/// Encode UTF-16 code units, replacing unpaired surrogates with U+FFFD.
#[must_use]
pub fn encode_lossy(units: &[u16]) -> Vec<u8> {
    let Ok(bytes) = encoder::encode_units(units, |err| -> Result<(), Infallible> {
        log::warn!("replacing {err}");
        Ok(())
    });
    bytes
}

/// Decode bytes into a string, replacing malformed sequences with U+FFFD.
#[must_use]
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    let Ok(()) = decode_with(bytes, |c| out.push(c), lossy(bytes));
    out
}

/// Decode bytes into UTF-16 code units, replacing malformed sequences with
/// U+FFFD.
#[must_use]
pub fn decode_utf16_lossy(bytes: &[u8]) -> Vec<u16> {
    let mut out = Vec::with_capacity(bytes.len());
    let Ok(()) = decode_with(bytes, |c| push_utf16(&mut out, c), lossy(bytes));
    out
}

fn lossy(bytes: &[u8]) -> impl FnMut(DecodeError) -> Result<(), Infallible> + '_ {
    move |err| {
        warn_replaced(bytes, err);
        Ok(())
    }
}

/// Fold `bytes` through [`DecoderState`]. Malformations go to `on_malformed`;
/// returning `Ok` emits U+FFFD in their place.
fn decode_with<E>(
    bytes: &[u8],
    mut emit: impl FnMut(char),
    mut on_malformed: impl FnMut(DecodeError) -> Result<(), E>,
) -> Result<(), E> {
    let mut on_step = |offset: usize, step: Step| -> Result<(), E> {
        match step {
            Step::Scalar(c) => emit(c),
            Step::Malformed(kind) => {
                on_malformed(DecodeError { offset, kind })?;
                emit(REPLACEMENT_CHARACTER);
            }
        }
        Ok(())
    };

    let state = bytes
        .iter()
        .enumerate()
        .try_fold(DecoderState::START, |state, (offset, &byte)| {
            state.feed(byte, &mut |step: Step| on_step(offset, step))
        })?;
    state.finish(&mut |step: Step| on_step(bytes.len(), step))
}

fn push_utf16(out: &mut Vec<u16>, c: char) {
    let mut buf = [0; 2];
    out.extend_from_slice(c.encode_utf16(&mut buf));
}

fn warn_replaced(bytes: &[u8], err: DecodeError) {
    let start = err.offset.saturating_sub(3);
    let end = (err.offset + 1).min(bytes.len());
    log::warn!(
        "replacing malformed UTF-8: {err} (near {:?})",
        BStr::new(&bytes[start.min(end)..end])
    );
}
