#![no_main]
use std::cell::RefCell;
use std::convert::Infallible;

use bota_codec::utf8::{self, DecoderState, Step};
use bota_codec::{Utf8Codec, Utf8Options};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

/// Sequences sitting on the edges of the byte grammar: boundary scalars,
/// overlong forms, encoded surrogates, lone continuations and cut-off leads.
static EDGE_TABLE: &[&[u8]] = &[
    b"\x00",
    b"\x7F",
    b"\xC2\x80",
    b"\xDF\xBF",
    b"\xE0\xA0\x80",
    b"\xEF\xBF\xBF",
    b"\xF0\x90\x80\x80",
    b"\xF4\x8F\xBF\xBF",
    b"\xC0\x80",
    b"\xC1\xBF",
    b"\xE0\x80\x80",
    b"\xF0\x80\x80\x80",
    b"\xED\xA0\x80",
    b"\xED\xBF\xBF",
    b"\xF4\x90\x80\x80",
    b"\xF5",
    b"\xFF",
    b"\x80",
    b"\xBF",
    b"\xE2\x82",
    b"\xF0\x9F\x98",
];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Splice edge sequences into the input most of the time, falling back to
/// the stock byte mutator otherwise.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if seed.is_multiple_of(4) {
        return fuzzer_mutate(data, size, max_size);
    }

    let mut len = size.min(max_size);
    let inserts = with_rng(|rng| rng.random_range(1..=4));
    for _ in 0..inserts {
        let edge = with_rng(|rng| EDGE_TABLE[rng.random_range(0..EDGE_TABLE.len())]);
        if len + edge.len() > max_size {
            break;
        }
        let at = with_rng(|rng| rng.random_range(0..=len));
        data.copy_within(at..len, at + edge.len());
        data[at..at + edge.len()].copy_from_slice(edge);
        len += edge.len();
    }
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

fn decoder(data: &[u8]) {
    let lossy = utf8::decode_lossy(data);

    // Valid input decodes exactly as std does, and fatal mode agrees with std
    // on what counts as valid.
    let fatal = Utf8Codec::new(Utf8Options { fatal: true }).decode(data);
    match std::str::from_utf8(data) {
        Ok(text) => {
            assert_eq!(lossy, text);
            assert_eq!(fatal.as_deref(), Ok(text));
        }
        Err(_) => assert!(fatal.is_err()),
    }

    // A lossy pass always yields well-formed text, so a second pass is exact.
    let bytes = utf8::encode(&lossy);
    assert_eq!(bytes, lossy.as_bytes());
    assert_eq!(utf8::decode_lossy(&bytes), lossy);

    let units = utf8::decode_utf16_lossy(data);
    assert!(units.iter().copied().eq(lossy.encode_utf16()));
    assert_eq!(utf8::encode_lossy(&units), bytes);

    // Feeding the bytes in two chunks matches the one-shot result.
    let split = data.first().map_or(0, |&b| usize::from(b)) % (data.len() + 1);
    let mut chunked = String::with_capacity(data.len());
    let mut sink = |step: Step| -> Result<(), Infallible> {
        chunked.push(match step {
            Step::Scalar(c) => c,
            Step::Malformed(_) => char::REPLACEMENT_CHARACTER,
        });
        Ok(())
    };
    let (head, tail) = data.split_at(split);
    let Ok(state) = head
        .iter()
        .try_fold(DecoderState::START, |state, &b| state.feed(b, &mut sink));
    let Ok(state) = tail.iter().try_fold(state, |state, &b| state.feed(b, &mut sink));
    let Ok(()) = state.finish(&mut sink);
    assert_eq!(chunked, lossy);
}

fuzz_target!(|data: &[u8]| decoder(data));
