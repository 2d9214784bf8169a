use hex_literal::hex;
use pocket_cbor::{
    CborErrorKind, Count, DecodeMode, Decoder, ErrorCode, Item, Label, MemPool, TagListOut,
    Value, TAG_DATE_EPOCH, TAG_POS_BIGNUM,
};

const MAP_ENCODED: [u8; 151] = hex!(
    "a36d666972737420696e7465676572182a77616e206172726179206f66207477"
    "6f20737472696e67738267737472696e673167737472696e67326c6d61702069"
    "6e2061206d6170a4676279746573203144787878786762797465732032447979"
    "79796b616e6f7468657220696e74186266746578742032781e6c6965732c2064"
    "616d6e206c69657320616e642073746174697374696373"
);

fn decode_all(input: &[u8], mode: DecodeMode) -> Vec<Item<'_>> {
    let mut dec = Decoder::new(input, mode);
    let mut items = Vec::new();
    loop {
        match dec.get_next() {
            Ok(item) => items.push(item),
            Err(e) => {
                assert_eq!(e.code, ErrorCode::HitEnd);
                break;
            }
        }
    }
    dec.finish().unwrap();
    items
}

fn first_error(input: &[u8]) -> ErrorCode {
    let mut dec = Decoder::new(input, DecodeMode::Normal);
    loop {
        if let Err(e) = dec.get_next() {
            return e.code;
        }
    }
}

fn levels(items: &[Item<'_>]) -> Vec<(u8, u8)> {
    items
        .iter()
        .map(|i| (i.nesting_level, i.next_nesting_level))
        .collect()
}

fn text(label: &str) -> Label<'_> {
    Label::TextString(label.as_bytes())
}

fn check_map(mode: DecodeMode) {
    let items = decode_all(&MAP_ENCODED, mode);
    assert_eq!(items.len(), 10);
    assert_eq!(items[0].value, Value::Map(Count::Definite(3)));
    assert_eq!(items[0].label, Label::None);

    assert_eq!(items[1].label, text("first integer"));
    assert_eq!(items[1].value, Value::Int64(42));

    assert_eq!(items[2].label, text("an array of two strings"));
    assert_eq!(items[2].value, Value::Array(Count::Definite(2)));
    assert_eq!(items[3].text(), Some("string1"));
    assert_eq!(items[3].label, Label::None);
    assert_eq!(items[4].text(), Some("string2"));

    assert_eq!(items[5].label.text(), Some("map in a map"));
    assert_eq!(items[5].value, Value::Map(Count::Definite(4)));
    assert_eq!(items[6].label, text("bytes 1"));
    assert_eq!(items[6].value, Value::ByteString(b"xxxx"));
    assert_eq!(items[7].label, text("bytes 2"));
    assert_eq!(items[7].value, Value::ByteString(b"yyyy"));
    assert_eq!(items[8].label, text("another int"));
    assert_eq!(items[8].value, Value::Int64(98));
    assert_eq!(items[9].label, text("text 2"));
    assert_eq!(items[9].text(), Some("lies, damn lies and statistics"));

    assert_eq!(
        levels(&items),
        [
            (0, 1),
            (1, 1),
            (1, 2),
            (2, 2),
            (2, 1),
            (1, 2),
            (2, 2),
            (2, 2),
            (2, 2),
            (2, 0)
        ]
    );
    assert!(items.iter().all(|i| !i.data_allocated && i.tags.is_empty()));
}

#[test]
fn map_normal_mode() {
    check_map(DecodeMode::Normal);
}

#[test]
fn map_strings_only_mode() {
    check_map(DecodeMode::MapStringsOnly);
}

#[test]
fn end_of_input() {
    let input = hex!("01");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    assert_eq!(dec.get_next().unwrap().value, Value::Int64(1));
    assert_eq!(dec.tell(), 1);
    let err = dec.get_next().unwrap_err();
    assert_eq!(err.code, ErrorCode::HitEnd);
    assert_eq!(err.kind, CborErrorKind::Decode);
    dec.finish().unwrap();
}

#[test]
fn finish_reports_open_containers_and_extra_bytes() {
    let input = hex!("8201");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.get_next().unwrap();
    dec.get_next().unwrap();
    assert_eq!(dec.finish().unwrap_err().code, ErrorCode::ArrayOrMapStillOpen);

    let input = hex!("0102");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.get_next().unwrap();
    let err = dec.finish().unwrap_err();
    assert_eq!(err.code, ErrorCode::ExtraBytes);
    assert_eq!(err.offset, 1);
}

#[test]
fn integers() {
    let items = decode_all(
        &hex!("1bffffffffffffffff 1b7fffffffffffffff 3b7fffffffffffffff 3903e7"),
        DecodeMode::Normal,
    );
    let values: Vec<_> = items.iter().map(|i| i.value).collect();
    assert_eq!(
        values,
        [
            Value::UInt64(u64::MAX),
            Value::Int64(i64::MAX),
            Value::Int64(i64::MIN),
            Value::Int64(-1000)
        ]
    );
    assert_eq!(
        first_error(&hex!("3b8000000000000000")),
        ErrorCode::IntOverflow
    );
}

#[test]
fn simple_values() {
    let items = decode_all(&hex!("f4 f5 f6 f7 f0 f820 f8ff"), DecodeMode::Normal);
    let values: Vec<_> = items.iter().map(|i| i.value).collect();
    assert_eq!(
        values,
        [
            Value::Bool(false),
            Value::Bool(true),
            Value::Null,
            Value::Undefined,
            Value::UnknownSimple(16),
            Value::UnknownSimple(32),
            Value::UnknownSimple(255)
        ]
    );
    assert_eq!(first_error(&hex!("f818")), ErrorCode::BadSimple);
    assert_eq!(first_error(&hex!("f800")), ErrorCode::BadSimple);
}

#[test]
fn malformed_heads() {
    assert_eq!(first_error(&hex!("1c")), ErrorCode::Unsupported);
    assert_eq!(first_error(&hex!("5d")), ErrorCode::Unsupported);
    assert_eq!(first_error(&hex!("fe")), ErrorCode::Unsupported);
    assert_eq!(first_error(&hex!("1f")), ErrorCode::InvalidCbor);
    assert_eq!(first_error(&hex!("3f")), ErrorCode::InvalidCbor);
    assert_eq!(first_error(&hex!("df")), ErrorCode::InvalidCbor);
    assert_eq!(first_error(&hex!("1a0000")), ErrorCode::HitEnd);
    assert_eq!(first_error(&hex!("6361")), ErrorCode::HitEnd);
}

#[test]
fn error_offset_is_item_start() {
    let input = hex!("82 00 1c");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.get_next().unwrap();
    dec.get_next().unwrap();
    let err = dec.get_next().unwrap_err();
    assert_eq!(err.code, ErrorCode::Unsupported);
    assert_eq!(err.offset, 2);
}

#[test]
fn array_length_limit() {
    assert_eq!(first_error(&hex!("99ffff")), ErrorCode::ArrayTooLong);
    assert_eq!(first_error(&hex!("9a00010000")), ErrorCode::ArrayTooLong);
    assert_eq!(first_error(&hex!("b9ffff")), ErrorCode::ArrayTooLong);

    let input = hex!("99fffe");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    let head = dec.get_next().unwrap();
    assert_eq!(head.value, Value::Array(Count::Definite(65_534)));
    assert_eq!(head.next_nesting_level, 1);
}

#[test]
fn indefinite_arrays() {
    let items = decode_all(&hex!("9f 01 82 02 03 9f ff ff"), DecodeMode::Normal);
    assert_eq!(items[0].value, Value::Array(Count::Indefinite));
    assert_eq!(items[5].value, Value::Array(Count::Indefinite));
    assert_eq!(
        levels(&items),
        [(0, 1), (1, 1), (1, 2), (2, 2), (2, 1), (1, 0)]
    );
}

#[test]
fn indefinite_map() {
    let items = decode_all(&hex!("bf 6161 01 6162 9f ff ff"), DecodeMode::Normal);
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].label, text("a"));
    assert_eq!(items[2].label, text("b"));
    assert_eq!(items[2].value, Value::Array(Count::Indefinite));
    assert_eq!(levels(&items), [(0, 1), (1, 1), (1, 0)]);
}

#[test]
fn break_closes_into_definite_parent() {
    // [[_ 1], 2]: the break must also count the inner array in the outer one.
    let items = decode_all(&hex!("82 9f 01 ff 02"), DecodeMode::Normal);
    assert_eq!(levels(&items), [(0, 1), (1, 2), (2, 1), (1, 0)]);

    let items = decode_all(&hex!("82 9f ff 02"), DecodeMode::Normal);
    assert_eq!(levels(&items), [(0, 1), (1, 1), (1, 0)]);

    let items = decode_all(&hex!("81 81 9f 9f ff ff"), DecodeMode::Normal);
    assert_eq!(levels(&items), [(0, 1), (1, 2), (2, 3), (3, 0)]);
}

#[test]
fn empty_definite_containers_are_leaves() {
    let items = decode_all(&hex!("82 80 a0"), DecodeMode::Normal);
    assert_eq!(levels(&items), [(0, 1), (1, 1), (1, 0)]);
    assert_eq!(items[2].value, Value::Map(Count::Definite(0)));
}

#[test]
fn misplaced_breaks() {
    assert_eq!(first_error(&hex!("ff")), ErrorCode::BadBreak);
    assert_eq!(first_error(&hex!("81 ff")), ErrorCode::BadBreak);
    assert_eq!(first_error(&hex!("bf 6161 ff")), ErrorCode::BadBreak);
    assert_eq!(first_error(&hex!("9f 01")), ErrorCode::HitEnd);
}

#[test]
fn map_labels() {
    let items = decode_all(
        &hex!("a4 01 00 20 00 1bffffffffffffffff 00 4161 00"),
        DecodeMode::Normal,
    );
    let labels: Vec<_> = items[1..].iter().map(|i| i.label).collect();
    assert_eq!(
        labels,
        [
            Label::Int64(1),
            Label::Int64(-1),
            Label::UInt64(u64::MAX),
            Label::ByteString(b"a")
        ]
    );

    let input = hex!("a1 01 00");
    let mut dec = Decoder::new(&input, DecodeMode::MapStringsOnly);
    dec.get_next().unwrap();
    assert_eq!(dec.get_next().unwrap_err().code, ErrorCode::MapLabelType);

    assert_eq!(first_error(&hex!("a1 f5 00")), ErrorCode::MapLabelType);
    assert_eq!(first_error(&hex!("a1 80 00")), ErrorCode::MapLabelType);
    assert_eq!(first_error(&hex!("a1 c2 41 01 00")), ErrorCode::MapLabelType);
}

#[test]
fn tag_semantics() {
    let input = hex!(
        "86"
        "c11a53724e00"
        "c1fb41d4dc9380200000"
        "c1fbbff8000000000000"
        "c0 6a 323031332d30332d3231"
        "c2 42 0100"
        "c3 41 01"
    );
    let items = decode_all(&input, DecodeMode::Normal);
    assert_eq!(
        items[1].value,
        Value::DateEpoch {
            seconds: 1_400_000_000,
            fraction: 0.0
        }
    );
    assert_eq!(
        items[2].value,
        Value::DateEpoch {
            seconds: 1_400_000_000,
            fraction: 0.5
        }
    );
    assert_eq!(
        items[3].value,
        Value::DateEpoch {
            seconds: -1,
            fraction: -0.5
        }
    );
    assert_eq!(items[4].value, Value::DateString(b"2013-03-21"));
    assert_eq!(items[4].text(), Some("2013-03-21"));
    assert_eq!(items[5].value, Value::PosBignum(&[0x01, 0x00]));
    assert_eq!(items[6].value, Value::NegBignum(&[0x01]));
}

#[test]
fn bad_tag_content() {
    assert_eq!(first_error(&hex!("c0 01")), ErrorCode::BadOptTag);
    assert_eq!(first_error(&hex!("c1 61 61")), ErrorCode::BadOptTag);
    assert_eq!(first_error(&hex!("c2 01")), ErrorCode::BadOptTag);
    assert_eq!(first_error(&hex!("c2 c3 41 01")), ErrorCode::BadOptTag);
    assert_eq!(first_error(&hex!("c1 1bffffffffffffffff")), ErrorCode::DateOverflow);
    assert_eq!(first_error(&hex!("c1 f97e00")), ErrorCode::DateOverflow);
    assert_eq!(first_error(&hex!("c1 fa7f800000")), ErrorCode::DateOverflow);
    assert_eq!(first_error(&hex!("c1 fb43e158e460913d00")), ErrorCode::DateOverflow);
    assert_eq!(first_error(&hex!("c1 fb43e0000000000000")), ErrorCode::DateOverflow);
}

#[test]
fn epoch_date_lower_bound() {
    let input = hex!("c1 fbc3e0000000000000");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    assert_eq!(
        dec.get_next().unwrap().value,
        Value::DateEpoch {
            seconds: i64::MIN,
            fraction: 0.0
        }
    );
    dec.finish().unwrap();
}

#[test]
fn is_tagged_queries() {
    let input = hex!("c1 01 c2 40 d8 64 01 01");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);

    let epoch = dec.get_next().unwrap();
    assert!(dec.is_tagged(&epoch, TAG_DATE_EPOCH));
    assert!(!dec.is_tagged(&epoch, TAG_POS_BIGNUM));

    let bignum = dec.get_next().unwrap();
    assert!(dec.is_tagged(&bignum, TAG_POS_BIGNUM));
    assert_eq!(bignum.value, Value::PosBignum(b""));

    // 100 is neither built in nor configured.
    let unknown = dec.get_next().unwrap();
    assert!(unknown.tags.is_empty());
    assert!(!dec.is_tagged(&unknown, 100));

    let plain = dec.get_next().unwrap();
    assert!(plain.tags.is_empty());
    dec.finish().unwrap();
}

#[test]
fn tag_list_out_records_every_tag() {
    let input = hex!("d8 64 c1 01 d8 64 d8 65 01");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    let mut storage = [0u64; 2];
    let mut tags = TagListOut::new(&mut storage);

    let item = dec.get_next_with_tags(&mut tags).unwrap();
    assert_eq!(tags.as_slice(), &[100, 1]);
    assert!(dec.is_tagged(&item, TAG_DATE_EPOCH));

    let _ = dec.get_next_with_tags(&mut tags).unwrap();
    assert_eq!(tags.as_slice(), &[100, 101]);
    dec.finish().unwrap();

    let input = hex!("d8 64 d8 65 01");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    let mut storage = [0u64; 1];
    let mut tags = TagListOut::new(&mut storage);
    let err = dec.get_next_with_tags(&mut tags).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooManyTags);
}

#[test]
fn caller_configured_tags() {
    static CALLER_TAGS: [u64; 2] = [1000, 2000];
    let input = hex!("d9 07d0 01");
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.set_caller_configured_tag_list(&CALLER_TAGS).unwrap();
    let item = dec.get_next().unwrap();
    assert!(dec.is_tagged(&item, 2000));
    assert!(!dec.is_tagged(&item, 1000));
    assert!(item.tags.contains_bit(49));

    static TOO_MANY: [u64; 17] = [0; 17];
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    let err = dec.set_caller_configured_tag_list(&TOO_MANY).unwrap_err();
    assert_eq!(err.code, ErrorCode::TooManyTags);
}

#[test]
fn copy_all_strings_into_pool() {
    let input = hex!("a1 6161 62 6869");
    let mut block = [0u8; 32];
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.set_mem_pool(&mut block, true).unwrap();
    dec.get_next().unwrap();
    let entry = dec.get_next().unwrap();
    assert!(entry.data_allocated);
    assert!(entry.label_allocated);
    assert_eq!(entry.text(), Some("hi"));
    assert_eq!(entry.label.text(), Some("a"));
    dec.finish().unwrap();
}

#[test]
fn copy_all_strings_exhausts_pool() {
    let input = hex!("45 0102030405");
    let mut block = [0u8; 12];
    let mut dec = Decoder::new(&input, DecodeMode::Normal);
    dec.set_mem_pool(&mut block, true).unwrap();
    assert_eq!(dec.get_next().unwrap_err().code, ErrorCode::StringAllocate);
}

#[test]
fn mem_pool_too_small() {
    let mut block = [0u8; 8];
    let mut dec = Decoder::new(&[], DecodeMode::Normal);
    let err = dec.set_mem_pool(&mut block, false).unwrap_err();
    assert_eq!(err.code, ErrorCode::BufferTooSmall);
    let _ = MemPool::new(&mut [0u8; 9]).unwrap();
}
