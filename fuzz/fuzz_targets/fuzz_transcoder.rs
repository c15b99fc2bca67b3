#![no_main]
use arbitrary::{Arbitrary, Unstructured};
use bota_codec::{DecodeOptions, Decoded, Transcoder, transcoder};
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};

/// Characters whose JSON text the notation maps back unchanged.
const ALPHABET: &[char] = &[
    'a', 'z', 'Q', '0', '9', ' ', '_', '-', '!', ',', '{', '}', 'é', '日', '😀',
];

#[derive(Debug)]
struct NotationSafe(Value);

fn safe_string(u: &mut Unstructured<'_>) -> arbitrary::Result<String> {
    let len = u.int_in_range(0..=8)?;
    (0..len).map(|_| u.choose(ALPHABET).copied()).collect()
}

fn safe_value(u: &mut Unstructured<'_>, depth: usize) -> arbitrary::Result<Value> {
    let choices = if depth == 0 { 4 } else { 6 };
    let value = match u.choose_index(choices)? {
        0 => Value::Null,
        1 => Value::Bool(u.arbitrary()?),
        2 => Value::from(i64::arbitrary(u)?),
        3 => Value::String(safe_string(u)?),
        4 => {
            let len = u.int_in_range(0..=4)?;
            Value::Array(
                (0..len)
                    .map(|_| safe_value(u, depth - 1))
                    .collect::<arbitrary::Result<_>>()?,
            )
        }
        _ => {
            let len = u.int_in_range(0..=4)?;
            let mut members = Map::new();
            for _ in 0..len {
                members.insert(safe_string(u)?, safe_value(u, depth - 1)?);
            }
            Value::Object(members)
        }
    };
    Ok(value)
}

impl<'a> Arbitrary<'a> for NotationSafe {
    fn arbitrary(u: &mut Unstructured<'a>) -> arbitrary::Result<Self> {
        let depth = u.int_in_range(0..=4)?;
        safe_value(u, depth).map(Self)
    }
}

fn transcode(data: &[u8]) {
    let Some((&flags, rest)) = data.split_first() else {
        return;
    };

    if flags & 1 == 0 {
        // Arbitrary text: every operation is total except parsing.
        let text = String::from_utf8_lossy(rest);
        let encoded = transcoder::encode_text(&text);
        let rebuilt = transcoder::decode_text(&encoded);
        let parsed = transcoder::decode(&encoded, DecodeOptions { parse: true });
        assert_eq!(parsed.is_ok(), transcoder::is_valid_encoded_form(&rebuilt));
        let _ = Transcoder::from_text(&text).decode(DecodeOptions::default());
        return;
    }

    let Ok(NotationSafe(value)) = NotationSafe::arbitrary(&mut Unstructured::new(rest)) else {
        return;
    };
    let encoded = transcoder::encode(&value).expect("JSON values always serialize");
    assert!(!encoded.contains(['{', '}', '"']) || value_has_braces(&value));
    match transcoder::decode(&encoded, DecodeOptions { parse: true }) {
        Ok(Decoded::Value(decoded)) => assert_eq!(decoded, value),
        other => panic!("notation-safe value failed to round-trip: {other:?}"),
    }
}

fn value_has_braces(value: &Value) -> bool {
    match value {
        Value::String(s) => s.contains(['{', '}']),
        Value::Array(items) => items.iter().any(value_has_braces),
        Value::Object(members) => members
            .iter()
            .any(|(k, v)| k.contains(['{', '}']) || value_has_braces(v)),
        _ => false,
    }
}

fuzz_target!(|data: &[u8]| transcode(data));
