use core::char::REPLACEMENT_CHARACTER;

use crate::error::EncodeError;

/// Encode UTF-16 code units, pairing surrogates into supplementary scalars.
///
/// Each unpaired surrogate is reported to `on_unpaired`; returning `Ok`
/// substitutes U+FFFD and carries on with the next code unit.
pub(crate) fn encode_units<E>(
    units: &[u16],
    mut on_unpaired: impl FnMut(EncodeError) -> Result<(), E>,
) -> Result<Vec<u8>, E> {
    let mut out = Vec::with_capacity(units.len());
    let mut index = 0;
    for decoded in char::decode_utf16(units.iter().copied()) {
        let c = match decoded {
            Ok(c) => {
                index += c.len_utf16();
                c
            }
            Err(err) => {
                on_unpaired(EncodeError {
                    index,
                    unit: err.unpaired_surrogate(),
                })?;
                index += 1;
                REPLACEMENT_CHARACTER
            }
        };
        push_scalar(&mut out, c);
    }
    Ok(out)
}

pub(crate) fn encode_chars(chars: impl Iterator<Item = char>, size_hint: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(size_hint);
    chars.for_each(|c| push_scalar(&mut out, c));
    out
}

/// Append the one to four byte form of `c`: the lead byte carries the high
/// bits above an offset of `0xC0`, `0xE0` or `0xF0`, followed by one
/// continuation byte per remaining six bits, most significant first.
#[allow(clippy::cast_possible_truncation)]
fn push_scalar(out: &mut Vec<u8>, c: char) {
    let cp = u32::from(c);
    let (count, offset) = match cp {
        0x00..=0x7F => {
            out.push(cp as u8);
            return;
        }
        0x80..=0x7FF => (1, 0xC0),
        0x800..=0xFFFF => (2, 0xE0),
        _ => (3, 0xF0),
    };
    out.push(offset + (cp >> (6 * count)) as u8);
    for shift in (0..count).rev() {
        out.push(0x80 + ((cp >> (6 * shift)) % 64) as u8);
    }
}
