#![no_main]

use libfuzzer_sys::fuzz_target;

use pocket_cbor::{Count, DecodeMode, Decoder, Encoder, ErrorCode, Item, Value};

/// Re-encode a decoded item in preferred form. Returns `false` for items the
/// encoder cannot reproduce one-to-one.
fn reencode(enc: &mut Encoder<'_>, item: &Item<'_>) -> bool {
    match item.value {
        Value::Int64(n) => enc.add_int64(n),
        Value::UInt64(n) => enc.add_uint64(n),
        Value::ByteString(b) => enc.add_bytes(b),
        Value::TextString(s) => match core::str::from_utf8(s) {
            Ok(s) => enc.add_text(s),
            Err(_) => return false,
        },
        Value::Double(d) => enc.add_double(d),
        Value::Bool(b) => enc.add_bool(b),
        Value::Null => enc.add_null(),
        Value::Undefined => enc.add_undef(),
        Value::UnknownSimple(v) => enc.add_simple(v),
        Value::Array(Count::Definite(0)) => {
            enc.open_array();
            enc.close_array();
        }
        _ => return false,
    }
    true
}

fuzz_target!(|data: &[u8]| {
    // Only flat top-level sequences of scalars: the re-encoding must decode to
    // the same values.
    let mut dec = Decoder::new(data, DecodeMode::Normal);
    let mut storage = vec![0u8; data.len() * 2 + 16];
    let mut enc = Encoder::new(&mut storage);
    let mut values = Vec::new();
    loop {
        match dec.get_next() {
            Ok(item) => {
                if !item.tags.is_empty() || !reencode(&mut enc, &item) {
                    return;
                }
                values.push(item.value);
            }
            Err(e) if e.code == ErrorCode::HitEnd => break,
            Err(_) => return,
        }
    }
    if dec.finish().is_err() {
        return;
    }
    let out = enc.finish().expect("re-encode");

    let mut again = Decoder::new(out, DecodeMode::Normal);
    for expected in &values {
        let item = again.get_next().expect("decode re-encoding");
        match (item.value, expected) {
            (Value::Double(a), Value::Double(b)) => assert!(a == *b || (a.is_nan() && b.is_nan())),
            (a, b) => assert_eq!(a, *b),
        }
    }
    assert_eq!(again.get_next().unwrap_err().code, ErrorCode::HitEnd);
    again.finish().expect("finish");
});
