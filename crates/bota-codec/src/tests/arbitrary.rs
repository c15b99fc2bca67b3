use quickcheck::{Arbitrary, Gen};
use serde_json::{Map, Value};

/// JSON whose text survives the bracket notation: integers only and strings
/// drawn from characters the notation never rewrites on the way back.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NotationSafe(pub Value);

const ALPHABET: &[char] = &[
    'a', 'b', 'z', 'A', 'Q', '0', '7', ' ', '_', '-', '!', '?', ',', '{', '}', 'é', 'ß', '日',
    '😀',
];

fn safe_string(g: &mut Gen) -> String {
    let len = usize::arbitrary(g) % 8;
    (0..len).map(|_| *g.choose(ALPHABET).unwrap_or(&'a')).collect()
}

fn gen_value(g: &mut Gen, depth: usize) -> Value {
    let choices = if depth == 0 { 4 } else { 6 };
    match usize::arbitrary(g) % choices {
        0 => Value::Null,
        1 => Value::Bool(bool::arbitrary(g)),
        2 => Value::from(i64::arbitrary(g)),
        3 => Value::String(safe_string(g)),
        4 => {
            let len = usize::arbitrary(g) % 4;
            Value::Array((0..len).map(|_| gen_value(g, depth - 1)).collect())
        }
        _ => {
            let len = usize::arbitrary(g) % 4;
            let mut members = Map::new();
            for _ in 0..len {
                members.insert(safe_string(g), gen_value(g, depth - 1));
            }
            Value::Object(members)
        }
    }
}

impl Arbitrary for NotationSafe {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = usize::arbitrary(g) % 4;
        Self(gen_value(g, depth))
    }
}
