/// Options for [`transcoder::decode`](crate::transcoder::decode).
///
/// # Examples
///
/// ```rust
/// use bota_codec::{DecodeOptions, transcoder};
///
/// let decoded = transcoder::decode("(<a>=1)", DecodeOptions { parse: true }).unwrap();
/// assert_eq!(decoded.into_value().unwrap(), serde_json::json!({"a": 1}));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Parse the rebuilt text as JSON and return the value instead of the
    /// text.
    ///
    /// # Default
    ///
    /// `false`
    pub parse: bool,
}

/// Options for [`Utf8Codec`](crate::utf8::Utf8Codec).
///
/// # Default
///
/// All options default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utf8Options {
    /// Fail on the first malformed input instead of substituting U+FFFD.
    ///
    /// When `false`, an unpaired surrogate (encoding) or a malformed byte
    /// sequence (decoding) is replaced with U+FFFD, a diagnostic is logged at
    /// `warn` level, and the call carries on with the next code unit or byte.
    ///
    /// # Default
    ///
    /// `false`
    pub fatal: bool,
}
