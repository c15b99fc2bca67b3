//! The JSON envelope written around exported `.bota64` files.
//!
//! ```json
//! {
//!     "meta": {
//!         "date": "...",
//!         "usedMethod": "Bota64",
//!         "version": { "app": "1.1.0", "lib": "1.0.5" }
//!     },
//!     "file": {
//!         "name": "notes",
//!         "extension": "txt",
//!         "originalName": "notes.txt",
//!         "outputName": "notes.bota64"
//!     },
//!     "content": "..."
//! }
//! ```
//!
//! With the `"Bota64/Unit8Array"` method, `content` holds the UTF-8 bytes of
//! the encoded string as an object keyed by index (`{"0": 104, "1": 105}`),
//! which is how a serialized typed byte array looks.

use core::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{self, MapAccess, SeqAccess, Visitor},
    ser::SerializeMap,
};
use serde_json::{Serializer as JsonSerializer, ser::PrettyFormatter};
use thiserror::Error;

use crate::utf8;

/// Extension given to exported files.
pub const FILE_EXTENSION: &str = "bota64";

/// Encoding recorded in `meta.usedMethod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `content` is the encoded string.
    Bota64,
    /// `content` is the UTF-8 byte form of the encoded string.
    Bota64Bytes,
}

impl Method {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Bota64 => "Bota64",
            Method::Bota64Bytes => "Bota64/Unit8Array",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Bota64" => Some(Method::Bota64),
            "Bota64/Unit8Array" => Some(Method::Bota64Bytes),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures reading an envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The text is not JSON of the envelope's shape.
    #[error("envelope is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// `meta.usedMethod` is missing or names no known method.
    #[error("file isn't a Bota64 file (method {0:?})")]
    UnknownMethod(Option<String>),
    /// Text content under a byte method, or the other way round.
    #[error("content does not match method {method}")]
    ContentMismatch { method: Method },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    #[serde(default)]
    pub app: String,
    #[serde(default)]
    pub lib: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Older exports spell this field `usedBota64`.
    #[serde(default, alias = "usedBota64")]
    pub used_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Version>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileInfo {
    /// Original name without its last extension.
    pub name: String,
    pub extension: String,
    pub original_name: String,
    pub output_name: String,
}

impl FileInfo {
    /// Describe the export of a file called `original_name`.
    #[must_use]
    pub fn for_export(original_name: &str) -> Self {
        let name = strip_extension(original_name);
        Self {
            name: name.to_owned(),
            extension: file_extension(original_name).to_owned(),
            original_name: original_name.to_owned(),
            output_name: format!("{name}.{FILE_EXTENSION}"),
        }
    }
}

/// Payload of an envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    Bytes(Vec<u8>),
}

impl Serialize for Content {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Content::Text(text) => serializer.serialize_str(text),
            Content::Bytes(bytes) => {
                let mut map = serializer.serialize_map(Some(bytes.len()))?;
                for (idx, byte) in bytes.iter().enumerate() {
                    map.serialize_entry(&idx.to_string(), byte)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Content {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ContentVisitor)
    }
}

struct ContentVisitor;

impl<'de> Visitor<'de> for ContentVisitor {
    type Value = Content;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, an array of bytes, or an object of bytes keyed by index")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Content, E> {
        Ok(Content::Text(v.to_owned()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Content, E> {
        Ok(Content::Text(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Content, A::Error> {
        let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(byte) = seq.next_element::<u8>()? {
            bytes.push(byte);
        }
        Ok(Content::Bytes(bytes))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Content, A::Error> {
        let mut indexed = Vec::with_capacity(map.size_hint().unwrap_or(0));
        while let Some((key, byte)) = map.next_entry::<String, u8>()? {
            let idx = key.parse::<usize>().map_err(|_| {
                <A::Error as de::Error>::invalid_value(de::Unexpected::Str(&key), &"a byte index")
            })?;
            indexed.push((idx, byte));
        }
        // integer keys enumerate in ascending order
        indexed.sort_by_key(|&(idx, _)| idx);
        Ok(Content::Bytes(indexed.into_iter().map(|(_, byte)| byte).collect()))
    }
}

/// An exported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub file: FileInfo,
    pub content: Content,
}

impl Envelope {
    /// Wrap an already encoded string for export.
    ///
    /// ```rust
    /// use bota_codec::envelope::{Content, Envelope, Method, Version};
    ///
    /// let version = Version::default();
    /// let sealed = Envelope::seal(Method::Bota64Bytes, "notes.txt", "hi", version, "today");
    /// assert_eq!(sealed.file.output_name, "notes.bota64");
    /// assert_eq!(sealed.content, Content::Bytes(vec![0x68, 0x69]));
    /// assert_eq!(sealed.payload().unwrap(), "hi");
    /// ```
    #[must_use]
    pub fn seal(
        method: Method,
        original_name: &str,
        encoded: &str,
        version: Version,
        date: impl Into<String>,
    ) -> Self {
        let content = match method {
            Method::Bota64 => Content::Text(encoded.to_owned()),
            Method::Bota64Bytes => Content::Bytes(utf8::encode(encoded)),
        };
        Self {
            meta: Meta {
                date: Some(date.into()),
                used_method: Some(method.as_str().to_owned()),
                version: Some(version),
            },
            file: FileInfo::for_export(original_name),
            content,
        }
    }

    /// # Errors
    ///
    /// Fails when `text` is not JSON of the envelope's shape.
    pub fn from_json(text: &str) -> Result<Self, EnvelopeError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Render with four-space indentation, the layout of exported files.
    ///
    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, EnvelopeError> {
        let mut out = Vec::with_capacity(256);
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = JsonSerializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// # Errors
    ///
    /// Fails with [`EnvelopeError::UnknownMethod`] when `meta.usedMethod` is
    /// missing or names no known method.
    pub fn method(&self) -> Result<Method, EnvelopeError> {
        self.meta
            .used_method
            .as_deref()
            .and_then(Method::from_name)
            .ok_or_else(|| EnvelopeError::UnknownMethod(self.meta.used_method.clone()))
    }

    /// The encoded string carried by the envelope, ready for the Bota64
    /// decoder. Byte content is decoded lossily.
    ///
    /// # Errors
    ///
    /// Fails when the method is unknown or the content has the wrong form for
    /// it.
    pub fn payload(&self) -> Result<String, EnvelopeError> {
        let method = self.method()?;
        match (method, &self.content) {
            (Method::Bota64, Content::Text(text)) => Ok(text.clone()),
            (Method::Bota64Bytes, Content::Bytes(bytes)) => Ok(utf8::decode_lossy(bytes)),
            _ => Err(EnvelopeError::ContentMismatch { method }),
        }
    }

    /// Whether a file's text is already a sealed envelope. Used to refuse
    /// encoding a file twice.
    #[must_use]
    pub fn is_sealed(text: &str) -> bool {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default)]
            meta: Meta,
        }

        serde_json::from_str::<Probe>(text)
            .ok()
            .and_then(|probe| probe.meta.used_method)
            .is_some_and(|name| Method::from_name(&name).is_some())
    }
}

/// Text after the last `.` of `name`. Empty when there is no dot or the only
/// dot leads the name, as in `.bashrc`.
#[must_use]
pub fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx + 1..],
        _ => "",
    }
}

/// `name` without a trailing `.ext`, where `ext` is non-empty and holds no
/// `/`.
#[must_use]
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() && !name[idx + 1..].contains('/') => &name[..idx],
        _ => name,
    }
}

/// Whether `name` already carries the export extension.
#[must_use]
pub fn is_export_name(name: &str) -> bool {
    file_extension(name) == FILE_EXTENSION
}

#[cfg(test)]
mod tests {
    use quickcheck_macros::quickcheck;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("notes.txt", "txt", "notes")]
    #[case("archive.tar.gz", "gz", "archive.tar")]
    #[case(".bashrc", "", "")]
    #[case("README", "", "README")]
    #[case("trailing.", "", "trailing.")]
    #[case("dir.d/file", "d/file", "dir.d/file")]
    fn splits_file_names(#[case] name: &str, #[case] ext: &str, #[case] stem: &str) {
        assert_eq!(file_extension(name), ext);
        assert_eq!(strip_extension(name), stem);
    }

    #[quickcheck]
    fn stripping_removes_exactly_one_extension(name: String) -> bool {
        let stem = strip_extension(&name);
        if stem == name {
            return true;
        }
        let removed = &name[stem.len()..];
        name.starts_with(stem)
            && removed.starts_with('.')
            && removed.len() > 1
            && !removed[1..].contains(['.', '/'])
    }

    #[test]
    fn export_names_are_recognised() {
        assert!(is_export_name("notes.bota64"));
        assert!(!is_export_name("notes.txt"));
        assert!(!is_export_name(".bota64"));
    }

    #[test]
    fn reads_typed_array_objects_and_plain_arrays() {
        let keyed: Content = serde_json::from_value(json!({"1": 105, "0": 104, "10": 33})).unwrap();
        assert_eq!(keyed, Content::Bytes(vec![104, 105, 33]));
        let plain: Content = serde_json::from_value(json!([104, 105])).unwrap();
        assert_eq!(plain, Content::Bytes(vec![104, 105]));
        assert!(serde_json::from_value::<Content>(json!({"x": 1})).is_err());
        assert!(serde_json::from_value::<Content>(json!([256])).is_err());
    }

    #[test]
    fn writes_bytes_keyed_by_index() {
        let value = serde_json::to_value(Content::Bytes(vec![7, 8])).unwrap();
        assert_eq!(value, json!({"0": 7, "1": 8}));
    }

    #[test]
    fn accepts_the_legacy_method_field() {
        let env =
            Envelope::from_json(r#"{"meta": {"usedBota64": "Bota64"}, "content": "x"}"#).unwrap();
        assert_eq!(env.method().unwrap(), Method::Bota64);
        assert_eq!(env.payload().unwrap(), "x");
        assert_eq!(env.file, FileInfo::default());
    }

    #[test]
    fn rejects_unknown_methods_and_mismatched_content() {
        let env = Envelope::from_json(r#"{"meta": {"usedMethod": null}, "content": "x"}"#).unwrap();
        assert!(matches!(env.payload(), Err(EnvelopeError::UnknownMethod(None))));

        let env =
            Envelope::from_json(r#"{"meta": {"usedMethod": "Bota64"}, "content": [1]}"#).unwrap();
        assert!(matches!(
            env.payload(),
            Err(EnvelopeError::ContentMismatch { method: Method::Bota64 })
        ));
    }

    #[test]
    fn detects_sealed_files() {
        assert!(Envelope::is_sealed(r#"{"meta": {"usedMethod": "Bota64"}}"#));
        assert!(Envelope::is_sealed(r#"{"meta": {"usedMethod": "Bota64/Unit8Array"}}"#));
        assert!(!Envelope::is_sealed(r#"{"meta": {"usedMethod": "Base64"}}"#));
        assert!(!Envelope::is_sealed(r#"{"name": "x"}"#));
        assert!(!Envelope::is_sealed("plain text"));
    }
}
