use thiserror::Error;

/// JSON text rebuilt by the transcoder could not be parsed. The message
/// already names the position; `line` and `column` expose it for callers.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct ParseError {
    #[source]
    pub(crate) source: serde_json::Error,
    /// One-based line of the failure within the rebuilt JSON text.
    pub line: usize,
    /// One-based column of the failure within the rebuilt JSON text.
    pub column: usize,
}

impl From<serde_json::Error> for ParseError {
    fn from(source: serde_json::Error) -> Self {
        Self {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}

/// Failures of the structural text transcoder.
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// The value handed to `encode` could not be serialized.
    #[error("serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
    /// The decoded text is not valid JSON.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
}

/// An isolated surrogate half met while encoding in fatal mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("unpaired surrogate 0x{unit:04X} at code unit {index}")]
pub struct EncodeError {
    /// Index of the offending code unit in the UTF-16 input.
    pub index: usize,
    /// The offending code unit.
    pub unit: u16,
}

/// A malformed byte sequence met while decoding in fatal mode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{kind} at byte {offset}")]
pub struct DecodeError {
    /// Offset of the byte that made the sequence malformed. For a sequence
    /// cut short by the end of input this is the input length.
    pub offset: usize,
    /// What was wrong with the sequence.
    pub kind: Malformation,
}

/// Ways a UTF-8 byte sequence can be malformed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformation {
    /// A byte that cannot start a sequence.
    #[error("invalid lead byte 0x{0:02X}")]
    InvalidLeadByte(u8),
    /// A non-continuation byte arrived while continuation bytes were due.
    #[error("sequence interrupted by byte 0x{0:02X}")]
    Interrupted(u8),
    /// Overlong form, surrogate, or value above U+10FFFF.
    #[error("decoded value 0x{0:X} is not a scalar value for its length")]
    OutOfRange(u32),
    /// Input ended inside a sequence.
    #[error("sequence truncated by end of input")]
    Truncated,
}
