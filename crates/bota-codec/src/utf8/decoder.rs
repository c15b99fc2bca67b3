use crate::error::Malformation;

/// What feeding a byte into [`DecoderState`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A complete scalar value.
    Scalar(char),
    /// A malformed sequence. Lossy decoding emits U+FFFD in its place.
    Malformed(Malformation),
}

/// Sequence-in-progress state of the byte decoder.
///
/// The state is a plain value: [`feed`](Self::feed) consumes it together with
/// one byte and returns the next state, so decoding is a fold over the input
/// and a stream may be split into chunks at any byte boundary.
///
/// ```rust
/// use bota_codec::utf8::{DecoderState, Step};
///
/// let mut out = Vec::new();
/// let mut sink = |step: Step| -> Result<(), ()> {
///     out.push(step);
///     Ok(())
/// };
/// let state = [0xE2, 0x82]
///     .into_iter()
///     .try_fold(DecoderState::START, |state, byte| state.feed(byte, &mut sink))
///     .unwrap();
/// assert!(!state.is_idle());
/// let state = state.feed(0xAC, &mut sink).unwrap();
/// state.finish(&mut sink).unwrap();
/// assert_eq!(out, [Step::Scalar('€')]);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderState {
    bytes_needed: u8,
    bytes_seen: u8,
    code_point: u32,
    lower_boundary: u32,
}

impl DecoderState {
    /// No sequence in progress.
    pub const START: Self = Self {
        bytes_needed: 0,
        bytes_seen: 0,
        code_point: 0,
        lower_boundary: 0,
    };

    /// Whether the next byte starts a new sequence.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.bytes_needed == 0
    }

    /// Consume one byte, reporting completed scalars and malformations to
    /// `sink`.
    ///
    /// A byte that interrupts a sequence is reported as
    /// [`Malformation::Interrupted`] and then examined again as a lead byte,
    /// so `sink` may be called twice for a single byte.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `sink`.
    pub fn feed<E, F>(self, byte: u8, sink: &mut F) -> Result<Self, E>
    where
        F: FnMut(Step) -> Result<(), E>,
    {
        if self.is_idle() {
            return Self::lead(byte, sink);
        }

        if !is_continuation(byte) {
            sink(Step::Malformed(Malformation::Interrupted(byte)))?;
            return Self::lead(byte, sink);
        }

        let bytes_seen = self.bytes_seen + 1;
        let code_point = (self.code_point << 6) | u32::from(byte & 0x3F);
        if bytes_seen < self.bytes_needed {
            return Ok(Self {
                bytes_seen,
                code_point,
                ..self
            });
        }

        // `from_u32` rejects surrogates and values above U+10FFFF.
        let step = match char::from_u32(code_point) {
            Some(c) if code_point >= self.lower_boundary => Step::Scalar(c),
            _ => Step::Malformed(Malformation::OutOfRange(code_point)),
        };
        sink(step)?;
        Ok(Self::START)
    }

    /// Report a sequence left open by the end of input.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `sink`.
    pub fn finish<E, F>(self, sink: &mut F) -> Result<(), E>
    where
        F: FnMut(Step) -> Result<(), E>,
    {
        if self.is_idle() {
            Ok(())
        } else {
            sink(Step::Malformed(Malformation::Truncated))
        }
    }

    fn lead<E, F>(byte: u8, sink: &mut F) -> Result<Self, E>
    where
        F: FnMut(Step) -> Result<(), E>,
    {
        let (bytes_needed, lower_boundary, offset) = match byte {
            0x00..=0x7F => {
                sink(Step::Scalar(char::from(byte)))?;
                return Ok(Self::START);
            }
            0xC2..=0xDF => (1, 0x80, 0xC0),
            0xE0..=0xEF => (2, 0x800, 0xE0),
            0xF0..=0xF4 => (3, 0x1_0000, 0xF0),
            _ => {
                sink(Step::Malformed(Malformation::InvalidLeadByte(byte)))?;
                return Ok(Self::START);
            }
        };
        Ok(Self {
            bytes_needed,
            bytes_seen: 0,
            code_point: u32::from(byte - offset),
            lower_boundary,
        })
    }
}

fn is_continuation(byte: u8) -> bool {
    (0x80..=0xBF).contains(&byte)
}
