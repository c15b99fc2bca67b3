//! Reversible bracket notation for pretty-printed JSON text.
//!
//! Encoding renders a value as JSON with four-space indentation and then
//! rewrites it character class by character class:
//!
//! | JSON text | notation |
//! |-----------|----------|
//! | `{`       | `(`      |
//! | `}`       | `)`      |
//! | `: `      | `=`      |
//! | `,`       | `.`      |
//! | `"X"`     | `<X>`    |
//!
//! Decoding applies the inverse table. The rewrite is lexical: nothing
//! protects payload text that already contains `(`, `)`, `=`, `.`, `<` or
//! `>`, so a value such as `1.5` or `"a=b"` does not survive a round trip.
//! Files exported by earlier releases depend on this exact behavior, so no
//! escaping layer is added.
//!
//! ```rust
//! use bota_codec::transcoder;
//! use serde_json::json;
//!
//! let encoded = transcoder::encode(&json!({"a": 1, "b": "x"})).unwrap();
//! assert_eq!(encoded, "(\n    <a>=1.\n    <b>=<x>\n)");
//! assert_eq!(transcoder::decode_value(&encoded).unwrap(), json!({"a": 1, "b": "x"}));
//! ```

use serde::{Serialize, de::DeserializeOwned, ser::Error as _};
use serde_json::{Serializer, Value, ser::PrettyFormatter};

use crate::{
    error::{ParseError, TranscodeError},
    options::DecodeOptions,
};

const INDENT: &[u8] = b"    ";

const ENCODE_RULES: [(&str, &str); 4] = [("{", "("), ("}", ")"), (": ", "="), (",", ".")];
const DECODE_RULES: [(&str, &str); 4] = [("(", "{"), (")", "}"), ("=", ": "), (".", ",")];

/// Result of [`decode`]: the rebuilt text, or the parsed value when
/// [`DecodeOptions::parse`] is set.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The rebuilt JSON text.
    Text(String),
    /// The parsed value.
    Value(Value),
}

impl Decoded {
    /// The rebuilt text, if parsing was not requested.
    pub fn into_text(self) -> Option<String> {
        match self {
            Decoded::Text(text) => Some(text),
            Decoded::Value(_) => None,
        }
    }

    /// The parsed value, if parsing was requested.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Decoded::Value(value) => Some(value),
            Decoded::Text(_) => None,
        }
    }
}

/// A text staged for encoding or decoding.
///
/// Construction normalizes the input the same way for both directions: a
/// serializable value is rendered as pretty JSON, and a string that is itself
/// valid JSON is rendered as a JSON string literal. Only text that is not
/// JSON is kept verbatim.
///
/// Because of that guard, `Transcoder::from_text(encoded).decode(..)` re-quotes
/// encoded scalars such as `5` or `true`. The free function [`decode`] skips
/// the guard and is the exact inverse of [`encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcoder {
    text: String,
}

impl Transcoder {
    /// Stage a value rendered as four-space indented JSON.
    ///
    /// # Errors
    ///
    /// Fails with [`TranscodeError::Serialize`] when `value` cannot be
    /// represented as JSON (for example a map with non-string keys).
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> Result<Self, TranscodeError> {
        to_pretty_json(value).map(|text| Self { text })
    }

    /// Stage a string, quoting it first when it already parses as JSON.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if is_valid_encoded_form(text) {
            // A JSON string literal needs no indentation, so the compact form
            // equals the pretty one.
            Self {
                text: Value::String(text.to_owned()).to_string(),
            }
        } else {
            Self {
                text: text.to_owned(),
            }
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn encode(&self) -> String {
        let out = rewrite(&self.text, &ENCODE_RULES, ('"', '"'), ('<', '>'));
        log::trace!("encoded {} bytes into {} bytes of notation", self.text.len(), out.len());
        out
    }

    /// # Errors
    ///
    /// Fails with [`TranscodeError::Parse`] when `options.parse` is set and
    /// the rebuilt text is not valid JSON.
    pub fn decode(&self, options: DecodeOptions) -> Result<Decoded, TranscodeError> {
        decode(&self.text, options)
    }
}

/// Encode a serializable value into bracket notation.
///
/// # Errors
///
/// Only serialization of `value` can fail; the rewrite itself is total.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, TranscodeError> {
    Transcoder::from_value(value).map(|staged| staged.encode())
}

/// Encode a string. A string that parses as JSON is encoded as a JSON string
/// literal; any other text is rewritten as-is.
#[must_use]
pub fn encode_text(text: &str) -> String {
    Transcoder::from_text(text).encode()
}

/// Rebuild JSON text from bracket notation, optionally parsing it.
///
/// # Errors
///
/// Fails with [`TranscodeError::Parse`] when `options.parse` is set and the
/// rebuilt text is not valid JSON.
///
/// To parse through a reviver, use [`decode_with_reviver`].
pub fn decode(text: &str, options: DecodeOptions) -> Result<Decoded, TranscodeError> {
    let rebuilt = decode_text(text);
    if options.parse {
        Ok(Decoded::Value(parse(&rebuilt, None)?))
    } else {
        Ok(Decoded::Text(rebuilt))
    }
}

/// Rebuild JSON text from bracket notation without parsing it.
#[must_use]
pub fn decode_text(text: &str) -> String {
    let out = rewrite(text, &DECODE_RULES, ('<', '>'), ('"', '"'));
    log::trace!("decoded {} bytes of notation into {} bytes", text.len(), out.len());
    out
}

/// Rebuild and parse JSON text from bracket notation.
///
/// # Errors
///
/// Fails when the rebuilt text is not valid JSON.
pub fn decode_value(text: &str) -> Result<Value, TranscodeError> {
    Ok(parse(&decode_text(text), None)?)
}

/// Rebuild JSON text from bracket notation and deserialize it into `T`.
///
/// # Errors
///
/// Fails when the rebuilt text is not valid JSON or does not match `T`.
pub fn decode_into<T: DeserializeOwned>(text: &str) -> Result<T, TranscodeError> {
    serde_json::from_str(&decode_text(text)).map_err(|err| TranscodeError::Parse(err.into()))
}

/// Parse JSON text, passing every member through `reviver` bottom-up.
///
/// The reviver receives the member key (array indices as decimal strings) and
/// the already revived value, and finishes with the root under the key `""`.
/// Returning `None` removes an object member and turns an array slot into
/// `null`. A root revived to `None` yields `null`.
///
/// # Errors
///
/// Fails when `text` is not valid JSON.
pub fn parse(
    text: &str,
    reviver: Option<&mut dyn FnMut(&str, Value) -> Option<Value>>,
) -> Result<Value, ParseError> {
    let value: Value = serde_json::from_str(text)?;
    Ok(match reviver {
        Some(reviver) => revive("", value, reviver).unwrap_or(Value::Null),
        None => value,
    })
}

/// Rebuild JSON text from bracket notation and parse it through `reviver`.
///
/// ```rust
/// use bota_codec::transcoder;
/// use serde_json::{Value, json};
///
/// let mut drop_secrets = |key: &str, value: Value| (key != "secret").then_some(value);
/// let value = transcoder::decode_with_reviver("(<a>=1.<secret>=2)", &mut drop_secrets).unwrap();
/// assert_eq!(value, json!({"a": 1}));
/// ```
///
/// # Errors
///
/// Fails when the rebuilt text is not valid JSON.
pub fn decode_with_reviver(
    text: &str,
    reviver: &mut dyn FnMut(&str, Value) -> Option<Value>,
) -> Result<Value, TranscodeError> {
    Ok(parse(&decode_text(text), Some(reviver))?)
}

/// Whether `text` parses as JSON, under the same number range and nesting
/// limits as [`parse`]. The bracket notation itself is not checked.
#[must_use]
pub fn is_valid_encoded_form(text: &str) -> bool {
    serde_json::from_str::<Value>(text).is_ok()
}

fn revive(
    key: &str,
    value: Value,
    reviver: &mut dyn FnMut(&str, Value) -> Option<Value>,
) -> Option<Value> {
    let value = match value {
        Value::Object(members) => Value::Object(
            members
                .into_iter()
                .filter_map(|(k, v)| revive(&k, v, &mut *reviver).map(|v| (k, v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| revive(&i.to_string(), v, &mut *reviver).unwrap_or(Value::Null))
                .collect(),
        ),
        scalar => scalar,
    };
    reviver(key, value)
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, TranscodeError> {
    let mut out = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(INDENT));
    value.serialize(&mut ser).map_err(TranscodeError::Serialize)?;
    String::from_utf8(out).map_err(|err| TranscodeError::Serialize(serde_json::Error::custom(err)))
}

/// Apply `rules` in order, then rewrap every `open … close` run that stays on
/// one line with the replacement delimiters, then trim.
fn rewrite(
    text: &str,
    rules: &[(&str, &str)],
    (open, close): (char, char),
    (new_open, new_close): (char, char),
) -> String {
    let substituted = rules
        .iter()
        .fold(text.to_owned(), |acc, (from, to)| acc.replace(from, to));

    let mut out = String::with_capacity(substituted.len());
    let mut rest = substituted.as_str();
    while let Some(start) = rest.find(open) {
        out.push_str(&rest[..start]);
        let inner = &rest[start + open.len_utf8()..];
        if let Some(end) = find_on_line(inner, close) {
            out.push(new_open);
            out.push_str(&inner[..end]);
            out.push(new_close);
            rest = &inner[end + close.len_utf8()..];
        } else {
            // unmatched on this line: keep the delimiter and resume after it
            out.push(open);
            rest = inner;
        }
    }
    out.push_str(rest);

    out.trim_matches(is_trim_char).to_owned()
}

fn find_on_line(text: &str, needle: char) -> Option<usize> {
    for (idx, c) in text.char_indices() {
        if c == needle {
            return Some(idx);
        }
        if is_line_terminator(c) {
            return None;
        }
    }
    None
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

// NEL is not trimmed, the byte order mark is.
fn is_trim_char(c: char) -> bool {
    c == '\u{FEFF}' || (c.is_whitespace() && c != '\u{85}')
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case(json!({"a": 1, "b": "x"}), "(\n    <a>=1.\n    <b>=<x>\n)")]
    #[case(json!({}), "()")]
    #[case(json!([]), "[]")]
    #[case(json!([1, 2]), "[\n    1.\n    2\n]")]
    #[case(json!("plain"), "<plain>")]
    #[case(json!(null), "null")]
    #[case(
        json!({"k": {"n": [true]}}),
        "(\n    <k>=(\n        <n>=[\n            true\n        ]\n    )\n)"
    )]
    fn encodes_known_vectors(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(encode(&value).unwrap(), expected);
    }

    #[test]
    fn keeps_insertion_order() {
        let value: Value = serde_json::from_str(r#"{"z":1,"a":2}"#).unwrap();
        assert_eq!(encode(&value).unwrap(), "(\n    <z>=1.\n    <a>=2\n)");
    }

    #[test]
    fn decode_inverts_encode() {
        let value = json!({
            "lool": "ff",
            "hahah": "cool",
            "version": {"app": "1-1-0", "lib": "1-0-5"},
            "list": [1, "two", null, false]
        });
        let encoded = encode(&value).unwrap();
        assert_eq!(decode_value(&encoded).unwrap(), value);
        assert_eq!(decode_text(&encoded), to_pretty_json(&value).unwrap());
    }

    #[test]
    fn decode_returns_text_unless_parse_is_set() {
        let text = decode("(<a>=<b>)", DecodeOptions::default()).unwrap();
        assert_eq!(text, Decoded::Text("{\"a\": \"b\"}".to_owned()));

        let value = decode("(<a>=<b>)", DecodeOptions { parse: true }).unwrap();
        assert_eq!(value.into_value(), Some(json!({"a": "b"})));
    }

    #[test]
    fn decode_with_parse_propagates_parse_errors() {
        let err = decode("(<a>=)", DecodeOptions { parse: true }).unwrap_err();
        let TranscodeError::Parse(parse) = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert_eq!(parse.line, 1);
        assert!(parse.to_string().contains("at line 1 column"), "{parse}");
    }

    #[test]
    fn decode_into_deserializes_typed_values() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Pair {
            a: u32,
            b: String,
        }
        let pair: Pair = decode_into("(<a>=7. <b>=<x>)").unwrap();
        assert_eq!(pair, Pair { a: 7, b: "x".to_owned() });
    }

    #[test]
    fn text_that_is_not_json_is_rewritten_verbatim() {
        assert_eq!(encode_text("hello, world"), "hello. world");
        assert_eq!(encode_text("  say \"hi\"  "), "say <hi>");
    }

    #[test]
    fn text_that_is_json_is_quoted_first() {
        assert_eq!(encode_text("5"), "<5>");
        assert_eq!(encode_text("{\"a\":1}"), "<(\\>a\\<:1)>");
        assert_eq!(Transcoder::from_text("true").as_str(), "\"true\"");
    }

    #[test]
    fn staged_decode_requotes_encoded_scalars() {
        let encoded = encode(&json!(5)).unwrap();
        assert_eq!(encoded, "5");
        assert_eq!(decode_text(&encoded), "5");
        let staged = Transcoder::from_text(&encoded).decode(DecodeOptions { parse: true }).unwrap();
        assert_eq!(staged.into_value(), Some(json!("5")));
    }

    #[test]
    fn quoted_runs_do_not_cross_lines() {
        assert_eq!(decode_text("<a\nb>"), "<a\nb>");
        assert_eq!(encode_text("\"a\n\"b\""), "\"a\n<b>");
    }

    #[test]
    fn unmatched_delimiters_are_kept() {
        assert_eq!(decode_text("a > b < c"), "a > b < c");
        assert_eq!(decode_text("<a<b>"), "\"a<b\"");
    }

    #[test]
    fn decode_is_only_the_inverse_of_one_encode() {
        let once = decode_text("<pi>=3.14");
        assert_eq!(once, "\"pi\": 3,14");
        // A second pass has nothing left to undo for these classes, but
        // reserved characters in the payload were already rewritten.
        assert_eq!(decode_text(&once), once);
        assert_ne!(decode_value("(<pi>=3.14)").ok(), Some(json!({"pi": 3.14})));
    }

    #[test]
    fn reserved_characters_collide() {
        let value = json!({"eq": "a=b"});
        let encoded = encode(&value).unwrap();
        assert_ne!(decode_value(&encoded).ok(), Some(value));
    }

    #[test]
    fn trims_like_the_exported_files_expect() {
        assert_eq!(decode_text("\u{FEFF}  (<a>=1)\n\n"), "{\"a\": 1}");
        assert_eq!(decode_text("\u{85}x"), "\u{85}x");
    }

    #[test]
    fn serialize_failures_surface() {
        let mut map = std::collections::HashMap::new();
        map.insert(vec![1u8], 1);
        assert!(matches!(encode(&map), Err(TranscodeError::Serialize(_))));
    }

    #[test]
    fn valid_encoded_form_only_checks_json() {
        assert!(is_valid_encoded_form("{\"a\": [1, 2]}"));
        assert!(is_valid_encoded_form(" 12 "));
        assert!(!is_valid_encoded_form("(<a>=1)"));
        assert!(!is_valid_encoded_form(""));
    }

    #[rstest]
    #[case::number_out_of_range("1e400".to_owned())]
    #[case::nested_past_recursion_limit(format!("{}{}", "[".repeat(200), "]".repeat(200)))]
    fn validity_agrees_with_decode(#[case] text: String) {
        assert!(!is_valid_encoded_form(&text));
        assert!(decode(&text, DecodeOptions { parse: true }).is_err());

        // A BOM keeps the staging guard off; the trim then exposes the JSON.
        let encoded = encode_text(&format!("{text}\u{FEFF}"));
        let rebuilt = decode_text(&encoded);
        assert_eq!(rebuilt, text);
        assert_eq!(
            is_valid_encoded_form(&rebuilt),
            decode(&encoded, DecodeOptions { parse: true }).is_ok()
        );
    }

    #[test]
    fn decode_with_reviver_rebuilds_then_revives() {
        let mut reviver = |key: &str, value: Value| match key {
            "tmp" => None,
            _ => Some(value),
        };
        let value = decode_with_reviver("(<keep>=[1.2].<tmp>=true)", &mut reviver).unwrap();
        assert_eq!(value, json!({"keep": [1, 2]}));

        let err = decode_with_reviver("(<a>=)", &mut |_: &str, v: Value| Some(v)).unwrap_err();
        assert!(matches!(err, TranscodeError::Parse(_)));
    }

    #[test]
    fn reviver_runs_bottom_up_and_can_drop_members() {
        let mut seen = Vec::new();
        let mut reviver = |key: &str, value: Value| {
            seen.push(key.to_owned());
            match key {
                "drop" => None,
                "n" => value.as_i64().map(|n| json!(n * 10)),
                _ => Some(value),
            }
        };
        let value = parse(r#"{"n": 2, "drop": true, "xs": [1]}"#, Some(&mut reviver)).unwrap();
        assert_eq!(value, json!({"n": 20, "xs": [1]}));
        assert_eq!(seen, ["n", "drop", "0", "xs", ""]);
    }

    #[test]
    fn reviver_nulls_dropped_array_slots() {
        let mut reviver = |key: &str, value: Value| (key != "1").then_some(value);
        let value = parse("[1, 2, 3]", Some(&mut reviver)).unwrap();
        assert_eq!(value, json!([1, null, 3]));
    }
}
