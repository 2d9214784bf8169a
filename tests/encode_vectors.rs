use hex_literal::hex;
use pocket_cbor::{
    CborErrorKind, Count, DecodeMode, Decoder, Encoder, ErrorCategory, ErrorCode, Value,
    MAX_ITEMS_IN_ARRAY, MAX_NESTING,
};

const INTEGERS: [i64; 11] = [
    i64::MIN,
    -1,
    0,
    1,
    255,
    256,
    65_535,
    65_536,
    4_294_967_295,
    4_294_967_296,
    i64::MAX,
];

const INTEGERS_ENCODED: [u8; 49] = hex!(
    "8b"
    "3b7fffffffffffffff"
    "20"
    "00"
    "01"
    "18ff"
    "190100"
    "19ffff"
    "1a00010000"
    "1affffffff"
    "1b0000000100000000"
    "1b7fffffffffffffff"
);

const MAP_ENCODED: [u8; 151] = hex!(
    "a36d666972737420696e7465676572182a77616e206172726179206f66207477"
    "6f20737472696e67738267737472696e673167737472696e67326c6d61702069"
    "6e2061206d6170a4676279746573203144787878786762797465732032447979"
    "79796b616e6f7468657220696e74186266746578742032781e6c6965732c2064"
    "616d6e206c69657320616e642073746174697374696373"
);

fn encode_one(storage: &mut [u8], f: impl FnOnce(&mut Encoder<'_>)) -> Vec<u8> {
    let mut enc = Encoder::new(storage);
    f(&mut enc);
    enc.finish().unwrap().to_vec()
}

fn encode_err(f: impl FnOnce(&mut Encoder<'_>)) -> pocket_cbor::CborError {
    let mut storage = [0u8; 64];
    let mut enc = Encoder::new(&mut storage);
    f(&mut enc);
    enc.finish().unwrap_err()
}

#[test]
fn integer_array_vector() {
    let mut storage = [0u8; 64];
    let out = encode_one(&mut storage, |e| {
        e.open_array();
        for n in INTEGERS {
            e.add_int64(n);
        }
        e.close_array();
    });
    assert_eq!(out, INTEGERS_ENCODED);

    let mut dec = Decoder::new(&INTEGERS_ENCODED, DecodeMode::Normal);
    let head = dec.get_next().unwrap();
    assert_eq!(head.value, Value::Array(Count::Definite(11)));
    for (i, n) in INTEGERS.iter().enumerate() {
        let item = dec.get_next().unwrap();
        assert_eq!(item.value, Value::Int64(*n));
        assert_eq!(item.nesting_level, 1);
        let expected_next = if i == INTEGERS.len() - 1 { 0 } else { 1 };
        assert_eq!(item.next_nesting_level, expected_next);
    }
    dec.finish().unwrap();
}

#[test]
fn nested_map_vector() {
    let mut storage = [0u8; 256];
    let out = encode_one(&mut storage, |e| {
        e.open_map();
        e.add_int64_to_map("first integer", 42);
        e.open_array_in_map("an array of two strings");
        e.add_text("string1");
        e.add_text("string2");
        e.close_array();
        e.open_map_in_map("map in a map");
        e.add_bytes_to_map("bytes 1", b"xxxx");
        e.add_bytes_to_map("bytes 2", b"yyyy");
        e.add_int64_to_map("another int", 98);
        e.add_text_to_map("text 2", "lies, damn lies and statistics");
        e.close_map();
        e.close_map();
    });
    assert_eq!(out, MAP_ENCODED);
}

#[test]
fn preferred_integer_lengths() {
    let mut storage = [0u8; 16];
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(23)), hex!("17"));
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(24)), hex!("1818"));
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(256)), hex!("190100"));
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(-24)), hex!("37"));
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(-25)), hex!("3818"));
    assert_eq!(encode_one(&mut storage, |e| e.add_int64(-257)), hex!("390100"));
    assert_eq!(
        encode_one(&mut storage, |e| e.add_uint64(u64::MAX)),
        hex!("1bffffffffffffffff")
    );
}

#[test]
fn string_lengths() {
    let mut storage = [0u8; 64];
    assert_eq!(encode_one(&mut storage, |e| e.add_text("")), hex!("60"));
    assert_eq!(encode_one(&mut storage, |e| e.add_bytes(&[])), hex!("40"));

    let text = "a".repeat(24);
    let mut expected = vec![0x78, 24];
    expected.extend_from_slice(text.as_bytes());
    assert_eq!(encode_one(&mut storage, |e| e.add_text(&text)), expected);
}

#[test]
fn simple_values() {
    let mut storage = [0u8; 16];
    let out = encode_one(&mut storage, |e| {
        e.add_bool(false);
        e.add_bool(true);
        e.add_null();
        e.add_undef();
        e.add_simple(0);
        e.add_simple(255);
    });
    assert_eq!(out, hex!("f4f5f6f7e0f8ff"));
}

#[test]
fn reserved_simple_values_latch() {
    for v in 24..=31u8 {
        let err = encode_err(|e| e.add_simple(v));
        assert_eq!(err.code, ErrorCode::BadSimple);
    }
}

#[test]
fn tagged_helpers() {
    let mut storage = [0u8; 64];
    assert_eq!(
        encode_one(&mut storage, |e| e.add_date_epoch(1_400_000_000)),
        hex!("c11a53724e00")
    );
    assert_eq!(
        encode_one(&mut storage, |e| e.add_date_string("1985-04-12T23:20:50.52Z")),
        hex!("c07731393835 2d30342d31325432333a32303a35302e35325a")
    );
    assert_eq!(
        encode_one(&mut storage, |e| e.add_positive_bignum(&[0x01, 0x00])),
        hex!("c2420100")
    );
    assert_eq!(
        encode_one(&mut storage, |e| e.add_negative_bignum(&[0x01])),
        hex!("c34101")
    );
    assert_eq!(
        encode_one(&mut storage, |e| e.add_uri("http://a")),
        hex!("d8206868 7474703a2f2f61")
    );
    assert_eq!(
        encode_one(&mut storage, |e| {
            e.add_tag(55_799);
            e.add_null();
        }),
        hex!("d9d9f7f6")
    );
}

#[test]
fn integer_labels() {
    let mut storage = [0u8; 32];
    let out = encode_one(&mut storage, |e| {
        e.open_map();
        e.add_text_to_map_n(1, "a");
        e.add_bool_to_map_n(-1, true);
        e.open_array_in_map_n(2);
        e.close_array();
        e.close_map();
    });
    assert_eq!(out, hex!("a3016161 20f5 0280"));
}

#[test]
fn empty_containers() {
    let mut storage = [0u8; 8];
    let out = encode_one(&mut storage, |e| {
        e.open_array();
        e.open_map();
        e.close_map();
        e.close_array();
    });
    assert_eq!(out, hex!("81a0"));
}

#[test]
fn add_encoded_counts_as_one_item() {
    let mut storage = [0u8; 16];
    let out = encode_one(&mut storage, |e| {
        e.open_array();
        e.add_encoded(&hex!("820102"));
        e.add_int64(3);
        e.close_array();
    });
    assert_eq!(out, hex!("82 820102 03"));
}

#[test]
fn bstr_wrap_returns_payload() {
    let mut storage = [0u8; 32];
    let mut enc = Encoder::new(&mut storage);
    enc.open_array();
    enc.bstr_wrap();
    enc.add_int64(1);
    enc.add_text("hi");
    let wrapped = enc.close_bstr_wrap().unwrap().to_vec();
    assert_eq!(wrapped, hex!("01626869"));
    enc.close_array();
    assert_eq!(enc.finish().unwrap(), hex!("81 44 01626869"));
}

#[test]
fn bstr_wrap_in_map_label() {
    let mut storage = [0u8; 32];
    let out = encode_one(&mut storage, |e| {
        e.open_map();
        e.bstr_wrap_in_map("p");
        e.add_null();
        e.close_bstr_wrap();
        e.close_map();
    });
    assert_eq!(out, hex!("a1 6170 41f6"));
}

#[cfg(feature = "sha2")]
#[test]
fn bstr_wrap_digest() {
    let mut storage = [0u8; 32];
    let mut enc = Encoder::new(&mut storage);
    enc.bstr_wrap();
    enc.add_text("abc");
    let digest = enc.close_bstr_wrap_sha256().unwrap();
    // SHA-256 of 0x63 'a' 'b' 'c'.
    let mut expected = [0u8; 32];
    {
        use sha2::{Digest, Sha256};
        expected.copy_from_slice(&Sha256::digest(hex!("63616263")));
    }
    assert_eq!(digest, expected);
    enc.finish().unwrap();
}

#[test]
fn close_balance() {
    let err = encode_err(|e| {
        e.open_array();
        e.close_array();
        e.close_array();
    });
    assert_eq!(err.code, ErrorCode::TooManyCloses);
    assert_eq!(err.kind, CborErrorKind::Encode);
    assert_eq!(err.category(), ErrorCategory::Structure);

    let err = encode_err(|e| {
        e.open_array();
        e.open_map();
        e.close_map();
    });
    assert_eq!(err.code, ErrorCode::ArrayOrMapStillOpen);

    let err = encode_err(|e| {
        e.open_array();
        e.close_map();
    });
    assert_eq!(err.code, ErrorCode::CloseMismatch);

    let err = encode_err(|e| {
        e.bstr_wrap();
        e.close_array();
    });
    assert_eq!(err.code, ErrorCode::CloseMismatch);
}

#[test]
fn first_error_wins() {
    let err = encode_err(|e| {
        e.add_int64(7);
        e.add_simple(25);
        e.close_array();
        e.open_map();
    });
    assert_eq!(err.code, ErrorCode::BadSimple);
    assert_eq!(err.offset, 1);
}

#[test]
fn later_adds_are_ignored_after_error() {
    let mut storage = [0u8; 16];
    let mut enc = Encoder::new(&mut storage);
    enc.close_map();
    enc.add_text("ignored");
    assert_eq!(enc.error(), Some(ErrorCode::TooManyCloses));
    assert_eq!(enc.finish().unwrap_err().offset, 0);
}

#[test]
fn output_too_small() {
    let mut storage = [0u8; 3];
    let mut enc = Encoder::new(&mut storage);
    enc.add_text("hello");
    assert_eq!(enc.error(), None);
    let err = enc.finish().unwrap_err();
    assert_eq!(err.code, ErrorCode::BufferTooSmall);
    assert_eq!(err.category(), ErrorCategory::Capacity);
}

#[test]
fn size_only_matches_real_encoding() {
    let build = |e: &mut Encoder<'_>| {
        e.open_map();
        e.add_double_to_map("pi", 3.141_592_653_589_793);
        e.add_text_to_map("name", "pocket");
        e.open_array_in_map("list");
        for n in 0..30 {
            e.add_int64(n * 1000);
        }
        e.close_array();
        e.close_map();
    };

    let mut sizer = Encoder::size_only();
    build(&mut sizer);
    let size = sizer.finish_get_size().unwrap();

    let mut storage = vec![0u8; size];
    let mut enc = Encoder::new(&mut storage);
    build(&mut enc);
    assert_eq!(enc.finish_get_size().unwrap(), size);
    assert_eq!(enc.finish().unwrap().len(), size);

    let mut short = vec![0u8; size - 1];
    let mut enc = Encoder::new(&mut short);
    build(&mut enc);
    assert_eq!(enc.finish().unwrap_err().code, ErrorCode::BufferTooSmall);
}

#[test]
fn size_only_finish_is_empty() {
    let mut enc = Encoder::size_only();
    enc.add_int64(1000);
    assert_eq!(enc.finish_get_size().unwrap(), 3);
    assert_eq!(enc.finish().unwrap(), &[] as &[u8]);
}

#[cfg(feature = "alloc")]
#[test]
fn encode_to_vec_is_exact() {
    let out = pocket_cbor::encode_to_vec(|e| {
        e.open_array();
        for n in INTEGERS {
            e.add_int64(n);
        }
        e.close_array();
    })
    .unwrap();
    assert_eq!(out, INTEGERS_ENCODED);

    let err = pocket_cbor::encode_to_vec(|e| e.open_array()).unwrap_err();
    assert_eq!(err.code, ErrorCode::ArrayOrMapStillOpen);
}

#[test]
fn nesting_depth_limit() {
    let mut storage = [0u8; 64];
    let out = encode_one(&mut storage, |e| {
        for _ in 0..MAX_NESTING {
            e.open_array();
        }
        for _ in 0..MAX_NESTING {
            e.close_array();
        }
    });
    assert_eq!(out.len(), MAX_NESTING);
    assert!(out[..MAX_NESTING - 1].iter().all(|&b| b == 0x81));
    assert_eq!(out[MAX_NESTING - 1], 0x80);

    let err = encode_err(|e| {
        for _ in 0..=MAX_NESTING {
            e.open_array();
        }
    });
    assert_eq!(err.code, ErrorCode::ArrayNestingTooDeep);
}

#[test]
fn item_count_limit() {
    let mut enc = Encoder::size_only();
    enc.open_array();
    for _ in 0..MAX_ITEMS_IN_ARRAY - 1 {
        enc.add_null();
    }
    assert_eq!(enc.error(), None);
    enc.add_null();
    assert_eq!(enc.error(), Some(ErrorCode::ArrayTooLong));
}
