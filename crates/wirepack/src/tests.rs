use crate::*;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::f64::consts::PI;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

// ============================================================================
//  HELPERS
// ============================================================================

fn writer() -> BinaryProtocol<MemoryTransport> {
    BinaryProtocol::new(MemoryTransport::new())
}

fn legacy_writer() -> BinaryProtocol<MemoryTransport> {
    BinaryProtocol::with_config(MemoryTransport::new(), ProtocolConfig::default().strict_write(false))
}

fn reader(bytes: &[u8]) -> BinaryProtocol<MemoryTransport> {
    BinaryProtocol::new(MemoryTransport::from_bytes(bytes))
}

fn lenient_reader(bytes: &[u8]) -> BinaryProtocol<MemoryTransport> {
    BinaryProtocol::with_config(MemoryTransport::from_bytes(bytes), ProtocolConfig::lenient())
}

fn finish(p: BinaryProtocol<MemoryTransport>) -> Vec<u8> {
    p.into_inner().take_output()
}

fn remaining(p: &BinaryProtocol<MemoryTransport>) -> usize {
    p.transport().remaining()
}

/// A struct exercising every wire shape once.
fn kitchen_sink() -> Value {
    Value::Struct(vec![
        (1, Value::Bool(true)),
        (2, Value::Byte(-7)),
        (3, Value::I16(i16::MIN)),
        (4, Value::I32(-123_456)),
        (5, Value::I64(i64::MAX)),
        (6, Value::Double(PI)),
        (7, Value::String("héllo wörld".into())),
        (8, Value::Binary(vec![0xff, 0xfe, 0x00])),
        (9, Value::Struct(vec![(1, Value::I32(1)), (-2, Value::String("neg id".into()))])),
        (10, Value::Map {
            key_type: WireType::String,
            value_type: WireType::List,
            entries: vec![(
                Value::String("k".into()),
                Value::List { element_type: WireType::I64, items: vec![Value::I64(1), Value::I64(2)] },
            )],
        }),
        (11, Value::Set { element_type: WireType::I16, items: vec![Value::I16(3), Value::I16(4)] }),
        (12, Value::List { element_type: WireType::Struct, items: vec![] }),
        (13, Value::Map { key_type: WireType::I32, value_type: WireType::Bool, entries: vec![] }),
    ])
}

// ============================================================================
//  BYTE LAYOUT
// ============================================================================

#[test]
fn test_string_hello_bytes() -> Result<()> {
    let mut p = writer();
    p.write_string("hello")?;
    let bytes = finish(p);
    assert_eq!(bytes, [0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o']);

    let mut r = reader(&bytes);
    assert_eq!(r.read_string()?, "hello");
    assert_eq!(remaining(&r), 0);
    Ok(())
}

#[test]
fn test_string_length_counts_bytes_not_chars() -> Result<()> {
    let mut p = writer();
    p.write_string("é")?;
    assert_eq!(finish(p), [0, 0, 0, 2, 0xc3, 0xa9]);
    Ok(())
}

#[test]
fn test_single_i32_field_struct_bytes() -> Result<()> {
    let mut p = writer();
    p.write_struct_begin("Single")?;
    write_field(&mut p, 1, &1234i32)?;
    p.write_field_stop()?;
    p.write_struct_end()?;
    assert_eq!(finish(p), [0x08, 0x00, 0x01, 0x00, 0x00, 0x04, 0xD2, 0x00]);
    Ok(())
}

#[test]
fn test_empty_struct_is_a_lone_stop() -> Result<()> {
    let mut p = writer();
    Empty.write(&mut p)?;
    assert_eq!(finish(p), [0x00]);
    Ok(())
}

#[test]
fn test_scalars_are_big_endian() -> Result<()> {
    let mut p = writer();
    p.write_i16(0x0102)?;
    p.write_i32(-2)?;
    p.write_i64(0x0102_0304_0506_0708)?;
    p.write_double(1.0)?;
    p.write_bool(true)?;
    p.write_bool(false)?;
    p.write_byte(-1)?;

    let bytes = finish(p);
    let expected: Vec<u8> = [
        &[0x01, 0x02][..],
        &[0xff, 0xff, 0xff, 0xfe],
        &[1, 2, 3, 4, 5, 6, 7, 8],
        &[0x3f, 0xf0, 0, 0, 0, 0, 0, 0],
        &[1, 0, 0xff],
    ]
    .concat();
    assert_eq!(bytes, expected);
    Ok(())
}

#[test]
fn test_container_headers() -> Result<()> {
    let mut p = writer();
    p.write_map_begin(&MapHeader::new(WireType::String, WireType::I32, 2))?;
    p.write_list_begin(&ListHeader::new(WireType::Double, 3))?;
    p.write_set_begin(&ListHeader::new(WireType::I64, 0))?;
    assert_eq!(finish(p), [11, 8, 0, 0, 0, 2, 4, 0, 0, 0, 3, 10, 0, 0, 0, 0]);
    Ok(())
}

// ============================================================================
//  SCALAR ROUNDTRIPS
// ============================================================================

#[test]
fn test_scalar_roundtrip() -> Result<()> {
    let mut p = writer();
    p.write_bool(true)?;
    p.write_bool(false)?;
    p.write_byte(i8::MIN)?;
    p.write_i16(i16::MIN)?;
    p.write_i32(i32::MAX)?;
    p.write_i64(i64::MIN)?;
    p.write_double(PI)?;
    p.write_double(-0.0)?;
    p.write_string("Hello World 🚀")?;
    p.write_binary(&[0, 159, 146, 150])?;

    let bytes = finish(p);
    let mut r = reader(&bytes);
    assert!(r.read_bool()?);
    assert!(!r.read_bool()?);
    assert_eq!(r.read_byte()?, i8::MIN);
    assert_eq!(r.read_i16()?, i16::MIN);
    assert_eq!(r.read_i32()?, i32::MAX);
    assert_eq!(r.read_i64()?, i64::MIN);
    assert_eq!(r.read_double()?, PI);
    assert_eq!(r.read_double()?.to_bits(), (-0.0f64).to_bits());
    assert_eq!(r.read_string()?, "Hello World 🚀");
    assert_eq!(r.read_binary()?, vec![0, 159, 146, 150]);
    assert_eq!(remaining(&r), 0);
    Ok(())
}

#[test]
fn test_bool_nonzero_reads_true() -> Result<()> {
    let mut r = reader(&[0x02]);
    assert!(r.read_bool()?);
    Ok(())
}

#[test]
fn test_invalid_utf8_string() {
    let mut r = reader(&[0, 0, 0, 2, 0xff, 0xfe]);
    assert!(matches!(r.read_string(), Err(Error::InvalidUtf8)));
}

// ============================================================================
//  ENVELOPES
// ============================================================================

#[test]
fn test_strict_envelope_bytes() -> Result<()> {
    let mut p = writer();
    p.write_message_begin(&MessageHeader::new("ping", MessageKind::Call, 1))?;
    assert_eq!(
        finish(p),
        [0x80, 0x01, 0x00, 0x01, 0, 0, 0, 4, b'p', b'i', b'n', b'g', 0, 0, 0, 1]
    );
    Ok(())
}

#[test]
fn test_legacy_envelope_bytes() -> Result<()> {
    let mut p = legacy_writer();
    p.write_message_begin(&MessageHeader::new("ping", MessageKind::Oneway, 258))?;
    assert_eq!(
        finish(p),
        [0, 0, 0, 4, b'p', b'i', b'n', b'g', 0x04, 0, 0, 1, 2]
    );
    Ok(())
}

#[test]
fn test_envelope_roundtrip_all_kinds() -> Result<()> {
    let kinds = [MessageKind::Call, MessageKind::Reply, MessageKind::Exception, MessageKind::Oneway];
    for kind in kinds {
        let header = MessageHeader::new("method", kind, -42);

        let mut strict = writer();
        strict.write_message_begin(&header)?;
        assert_eq!(reader(&finish(strict)).read_message_begin()?, header);

        let mut legacy = legacy_writer();
        legacy.write_message_begin(&header)?;
        assert_eq!(lenient_reader(&finish(legacy)).read_message_begin()?, header);
    }
    Ok(())
}

#[test]
fn test_strict_reader_rejects_legacy_envelope() -> Result<()> {
    let mut p = legacy_writer();
    p.write_message_begin(&MessageHeader::new("ping", MessageKind::Call, 1))?;
    let bytes = finish(p);

    assert!(matches!(reader(&bytes).read_message_begin(), Err(Error::MissingVersion)));
    assert_eq!(lenient_reader(&bytes).read_message_begin()?.name, "ping");
    Ok(())
}

#[test]
fn test_lenient_reader_accepts_strict_envelope() -> Result<()> {
    let mut p = writer();
    p.write_message_begin(&MessageHeader::new("ping", MessageKind::Call, 9))?;
    let header = lenient_reader(&finish(p)).read_message_begin()?;
    assert_eq!(header, MessageHeader::new("ping", MessageKind::Call, 9));
    Ok(())
}

#[test]
fn test_bad_version_rejected() {
    let bytes = [0x80, 0x02, 0x00, 0x01, 0, 0, 0, 1, b'x', 0, 0, 0, 1];
    match reader(&bytes).read_message_begin() {
        Err(Error::BadVersion(v)) => assert_eq!(v, 0x8002_0000),
        other => panic!("expected BadVersion, got {:?}", other),
    }
    // Lenient readers are no more forgiving about the version itself.
    assert!(matches!(lenient_reader(&bytes).read_message_begin(), Err(Error::BadVersion(_))));
}

#[test]
fn test_invalid_message_kind_rejected() {
    let bytes = [0x80, 0x01, 0x00, 0x09, 0, 0, 0, 1, b'x', 0, 0, 0, 1];
    assert!(matches!(reader(&bytes).read_message_begin(), Err(Error::InvalidMessageKind(9))));
}

#[test]
fn test_message_with_body_roundtrip_strict_and_legacy() -> Result<()> {
    let body = kitchen_sink();
    for strict in [true, false] {
        let config = ProtocolConfig::default().strict_write(strict).strict_read(strict);
        let mut p = BinaryProtocol::with_config(MemoryTransport::new(), config.clone());
        p.write_message_begin(&MessageHeader::new("echo", MessageKind::Reply, 7))?;
        write_value(&mut p, &body)?;
        p.write_message_end()?;

        let mut r = BinaryProtocol::with_config(MemoryTransport::from_bytes(finish(p)), config);
        let header = r.read_message_begin()?;
        assert_eq!(header, MessageHeader::new("echo", MessageKind::Reply, 7));
        assert_eq!(read_value(&mut r, WireType::Struct)?, body);
        r.read_message_end()?;
        assert_eq!(remaining(&r), 0);
    }
    Ok(())
}

// ============================================================================
//  FIELD FRAMING
// ============================================================================

#[test]
fn test_fields_read_back_in_write_order() -> Result<()> {
    let headers = [
        FieldHeader::new(WireType::I32, 1),
        FieldHeader::new(WireType::String, 7),
        FieldHeader::new(WireType::Bool, 3),
        FieldHeader::new(WireType::I64, -1),
        FieldHeader::new(WireType::Double, 32767),
    ];

    let mut p = writer();
    p.write_struct_begin("Ordered")?;
    for header in &headers {
        p.write_field_begin(header)?;
        match header.wire_type {
            WireType::I32 => p.write_i32(1)?,
            WireType::String => p.write_string("s")?,
            WireType::Bool => p.write_bool(true)?,
            WireType::I64 => p.write_i64(2)?,
            _ => p.write_double(3.0)?,
        }
        p.write_field_end()?;
    }
    p.write_field_stop()?;
    p.write_struct_end()?;

    let bytes = finish(p);
    let mut r = reader(&bytes);
    r.read_struct_begin()?;
    for expected in &headers {
        let header = r.read_field_begin()?;
        assert_eq!(&header, expected);
        skip(&mut r, header.wire_type)?;
        r.read_field_end()?;
    }
    assert!(r.read_field_begin()?.is_stop());
    r.read_struct_end()?;
    assert_eq!(remaining(&r), 0);
    Ok(())
}

#[test]
fn test_invalid_wire_type_in_field_header() {
    let mut r = reader(&[0x05, 0x00, 0x01]);
    assert!(matches!(r.read_field_begin(), Err(Error::InvalidWireType(5))));
}

#[test]
fn test_read_fields_skips_unknown_and_mistyped() -> Result<()> {
    let mut p = writer();
    p.write_struct_begin("Newer")?;
    write_field(&mut p, 1, &"not an int".to_string())?;
    write_field(&mut p, 2, &5i32)?;
    write_field(&mut p, 3, &vec![1i64, 2, 3])?;
    p.write_field_stop()?;
    p.write_struct_end()?;
    p.write_i32(99)?;

    let bytes = finish(p);
    let mut r = reader(&bytes);
    let mut first: Option<i32> = None;
    let mut second: Option<i32> = None;
    read_fields(&mut r, |input, field| match field.id {
        1 => read_field_into(input, field, &mut first),
        2 => read_field_into(input, field, &mut second),
        _ => Ok(false),
    })?;

    assert_eq!(first, None);
    assert_eq!(second, Some(5));
    assert_eq!(r.read_i32()?, 99);
    Ok(())
}

#[test]
fn test_optional_field_omitted_when_unset() -> Result<()> {
    let mut p = writer();
    write_optional_field::<i32>(&mut p, 1, &None)?;
    write_optional_field(&mut p, 2, &Some(true))?;
    assert_eq!(finish(p), [0x02, 0x00, 0x02, 0x01]);
    Ok(())
}

// ============================================================================
//  SKIP
// ============================================================================

#[test]
fn test_skip_leaves_stream_at_next_sibling() -> Result<()> {
    let mut p = writer();
    p.write_struct_begin("Outer")?;
    p.write_field_begin(&FieldHeader::new(WireType::Struct, 1))?;
    write_value(&mut p, &kitchen_sink())?;
    p.write_field_end()?;
    write_field(&mut p, 2, &0x0bad_cafei32)?;
    p.write_field_stop()?;
    p.write_struct_end()?;

    let bytes = finish(p);
    let mut r = reader(&bytes);
    r.read_struct_begin()?;
    let first = r.read_field_begin()?;
    skip(&mut r, first.wire_type)?;
    r.read_field_end()?;

    let second = r.read_field_begin()?;
    assert_eq!(second, FieldHeader::new(WireType::I32, 2));
    assert_eq!(r.read_i32()?, 0x0bad_cafe);
    assert!(r.read_field_begin()?.is_stop());
    Ok(())
}

#[test]
fn test_skip_consumes_same_bytes_as_decode() -> Result<()> {
    let mut p = writer();
    write_value(&mut p, &kitchen_sink())?;
    p.write_i32(1)?;
    let bytes = finish(p);

    let mut skipped = reader(&bytes);
    skip(&mut skipped, WireType::Struct)?;

    let mut decoded = reader(&bytes);
    read_value(&mut decoded, WireType::Struct)?;

    assert_eq!(remaining(&skipped), 4);
    assert_eq!(remaining(&skipped), remaining(&decoded));
    Ok(())
}

#[test]
fn test_skip_tolerates_non_utf8_strings() -> Result<()> {
    let mut r = reader(&[0, 0, 0, 2, 0xff, 0xfe, 0x01]);
    skip(&mut r, WireType::String)?;
    assert!(r.read_bool()?);
    Ok(())
}

#[test]
fn test_skip_depth_limit() {
    // 100 nested single-element lists of lists.
    let mut bytes = Vec::new();
    for _ in 0..100 {
        bytes.extend_from_slice(&[WireType::List as u8, 0, 0, 0, 1]);
    }
    let mut r = reader(&bytes);
    assert!(matches!(skip(&mut r, WireType::List), Err(Error::DepthLimitExceeded)));
}

#[test]
fn test_skip_truncated_struct_is_end_of_file() {
    let mut r = reader(&[0x08, 0x00, 0x01, 0x00, 0x00]);
    let err = skip(&mut r, WireType::Struct).unwrap_err();
    assert!(err.is_end_of_file(), "got {:?}", err);
}

#[test]
fn test_skip_rejects_containers_of_empty_types() -> Result<()> {
    // Five bytes claiming i32::MAX elements that occupy no bytes.
    let mut r = reader(&[WireType::Void as u8, 0x7f, 0xff, 0xff, 0xff]);
    assert!(matches!(skip(&mut r, WireType::List), Err(Error::InvalidWireType(1))));

    let mut r = reader(&[WireType::Stop as u8, 0x7f, 0xff, 0xff, 0xff]);
    assert!(matches!(skip(&mut r, WireType::Set), Err(Error::InvalidWireType(0))));

    let mut r = reader(&[WireType::I32 as u8, WireType::Void as u8, 0, 0, 0, 3]);
    assert!(matches!(skip(&mut r, WireType::Map), Err(Error::InvalidWireType(1))));

    // Reached through an unknown field while reading a struct.
    let mut r = reader(&[WireType::List as u8, 0, 9, WireType::Void as u8, 0x7f, 0xff, 0xff, 0xff, 0]);
    assert!(matches!(Empty::read(&mut r), Err(Error::InvalidWireType(1))));

    // With no elements there is nothing to misread.
    let mut r = reader(&[WireType::Void as u8, 0, 0, 0, 0, 0x01]);
    skip(&mut r, WireType::List)?;
    assert!(r.read_bool()?);
    Ok(())
}

fn random_type(rng: &mut StdRng, depth: usize) -> WireType {
    const SCALARS: [WireType; 7] = [
        WireType::Bool, WireType::Byte, WireType::I16, WireType::I32,
        WireType::I64, WireType::Double, WireType::String,
    ];
    const CONTAINERS: [WireType; 4] = [WireType::Struct, WireType::Map, WireType::Set, WireType::List];
    if depth >= 3 || rng.gen_bool(0.6) {
        SCALARS[rng.gen_range(0..SCALARS.len())]
    } else {
        CONTAINERS[rng.gen_range(0..CONTAINERS.len())]
    }
}

fn random_value(rng: &mut StdRng, wire_type: WireType, depth: usize) -> Value {
    match wire_type {
        WireType::Bool => Value::Bool(rng.r#gen()),
        WireType::Byte => Value::Byte(rng.r#gen()),
        WireType::I16 => Value::I16(rng.r#gen()),
        WireType::I32 => Value::I32(rng.r#gen()),
        WireType::I64 => Value::I64(rng.r#gen()),
        WireType::Double => Value::Double(rng.r#gen()),
        WireType::String => {
            let len = rng.gen_range(0..12);
            Value::String((0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect())
        },
        WireType::Struct => {
            let n = rng.gen_range(0..4);
            Value::Struct((0..n).map(|i| {
                let ty = random_type(rng, depth + 1);
                (i as i16 + 1, random_value(rng, ty, depth + 1))
            }).collect())
        },
        WireType::Map => {
            let key_type = random_type(rng, depth + 1);
            let value_type = random_type(rng, depth + 1);
            let n = rng.gen_range(0..4);
            let entries = (0..n)
                .map(|_| (random_value(rng, key_type, depth + 1), random_value(rng, value_type, depth + 1)))
                .collect();
            Value::Map { key_type, value_type, entries }
        },
        WireType::Set | WireType::List => {
            let element_type = random_type(rng, depth + 1);
            let n = rng.gen_range(0..4);
            let items = (0..n).map(|_| random_value(rng, element_type, depth + 1)).collect();
            if wire_type == WireType::Set {
                Value::Set { element_type, items }
            } else {
                Value::List { element_type, items }
            }
        },
        WireType::Stop | WireType::Void => Value::Bool(false),
    }
}

#[test]
fn test_skip_random_values() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let ty = random_type(&mut rng, 0);
        let value = random_value(&mut rng, ty, 0);

        let mut p = writer();
        write_value(&mut p, &value)?;
        p.write_i32(-1)?;
        let bytes = finish(p);

        let mut r = reader(&bytes);
        skip(&mut r, ty)?;
        assert_eq!(r.read_i32()?, -1, "skip misaligned on {:?}", value);
        assert_eq!(remaining(&r), 0);

        let mut r = reader(&bytes);
        assert_eq!(read_value(&mut r, ty)?, value);
    }
    Ok(())
}

// ============================================================================
//  LENGTH VALIDATION
// ============================================================================

#[test]
fn test_negative_lengths_rejected() {
    let mut r = reader(&[0xff, 0xff, 0xff, 0xff]);
    assert!(matches!(r.read_string(), Err(Error::NegativeSize(-1))));

    let mut r = reader(&[WireType::I32 as u8, 0x80, 0, 0, 0]);
    assert!(matches!(r.read_list_begin(), Err(Error::NegativeSize(i32::MIN))));
}

#[test]
fn test_configured_limits() -> Result<()> {
    let mut p = writer();
    p.write_string("hello")?;
    p.write_list_begin(&ListHeader::new(WireType::I32, 10))?;
    let bytes = finish(p);

    let config = ProtocolConfig::default().string_limit(3).container_limit(4);
    let mut r = BinaryProtocol::with_config(MemoryTransport::from_bytes(bytes.clone()), config);
    assert!(matches!(r.read_string(), Err(Error::SizeLimit { size: 5, limit: 3 })));

    let mut r = BinaryProtocol::with_config(
        MemoryTransport::from_bytes(&bytes[9..]),
        ProtocolConfig::default().container_limit(4),
    );
    assert!(matches!(r.read_list_begin(), Err(Error::SizeLimit { size: 10, limit: 4 })));
    Ok(())
}

#[test]
fn test_oversized_length_prefix_waits_for_bytes() {
    // The prefix claims 2 GiB; only two bytes follow.
    let mut r = reader(&[0x7f, 0xff, 0xff, 0xff, b'h', b'i']);
    let err = r.read_binary().unwrap_err();
    assert!(err.is_end_of_file(), "got {:?}", err);
}

#[test]
fn test_long_string_spans_read_chunks() -> Result<()> {
    let long = "wire".repeat(50_000);
    let mut p = writer();
    p.write_string(&long)?;
    let mut r = reader(&finish(p));
    assert_eq!(r.read_string()?, long);
    assert_eq!(remaining(&r), 0);
    Ok(())
}

#[test]
fn test_truncated_string_is_end_of_file() {
    let mut r = reader(&[0, 0, 0, 5, b'h', b'e']);
    let err = r.read_string().unwrap_err();
    assert!(err.is_end_of_file());
}

// ============================================================================
//  TYPED CODEC
// ============================================================================

#[test]
fn test_typed_containers_roundtrip() -> Result<()> {
    let list = vec![1i32, -2, 3];
    let map: BTreeMap<String, i64> = [("a".to_string(), 1), ("b".to_string(), -1)].into_iter().collect();
    let set: BTreeSet<i16> = [5, 6, 7].into_iter().collect();
    let nested = vec![vec![true], vec![], vec![false, true]];

    let mut p = writer();
    list.write(&mut p)?;
    map.write(&mut p)?;
    set.write(&mut p)?;
    nested.write(&mut p)?;
    let bytes = finish(p);

    let mut r = reader(&bytes);
    assert_eq!(Vec::<i32>::read(&mut r)?, list);
    assert_eq!(BTreeMap::<String, i64>::read(&mut r)?, map);
    assert_eq!(BTreeSet::<i16>::read(&mut r)?, set);
    assert_eq!(Vec::<Vec<bool>>::read(&mut r)?, nested);
    assert_eq!(remaining(&r), 0);
    Ok(())
}

#[test]
fn test_typed_list_element_mismatch() -> Result<()> {
    let mut p = writer();
    vec![1i64].write(&mut p)?;
    let bytes = finish(p);

    match Vec::<i32>::read(&mut reader(&bytes)) {
        Err(Error::UnexpectedType { expected, found }) => {
            assert_eq!(expected, WireType::I32);
            assert_eq!(found, WireType::I64);
        }
        other => panic!("expected UnexpectedType, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_empty_reads_past_unknown_fields() -> Result<()> {
    let mut p = writer();
    write_value(&mut p, &kitchen_sink())?;
    p.write_byte(42)?;
    let bytes = finish(p);

    let mut r = reader(&bytes);
    assert_eq!(Empty::read(&mut r)?, Empty);
    assert_eq!(r.read_byte()?, 42);
    Ok(())
}

#[test]
fn test_value_binary_for_non_utf8() -> Result<()> {
    let mut r = reader(&[0, 0, 0, 1, 0x80]);
    assert_eq!(read_value(&mut r, WireType::String)?, Value::Binary(vec![0x80]));
    Ok(())
}

#[test]
fn test_value_field_lookup() {
    let v = kitchen_sink();
    assert_eq!(v.field(4), Some(&Value::I32(-123_456)));
    assert_eq!(v.field(99), None);
    assert_eq!(Value::I32(1).field(1), None);
}

// ============================================================================
//  TRANSPORTS
// ============================================================================

#[test]
fn test_memory_transport_closed() {
    let mut t = MemoryTransport::from_bytes(vec![1, 2, 3]);
    t.close().unwrap();
    assert!(!t.is_open());
    let err = t.read_exact(&mut [0u8; 1]).unwrap_err();
    assert_eq!(err.kind(), TransportErrorKind::NotOpen);
    let err = t.write_all(&[1]).unwrap_err();
    assert_eq!(err.kind(), TransportErrorKind::NotOpen);
}

#[test]
fn test_shared_transport_handles_one_stream() -> Result<()> {
    let (input, output) = SharedTransport::pair(MemoryTransport::from_bytes(vec![0, 0, 0, 7]));
    let mut reader = BinaryProtocol::new(input);
    let mut writer = BinaryProtocol::new(output);

    let n = reader.read_i32()?;
    writer.write_i32(n * 2)?;
    writer.flush()?;

    let written = reader.transport().with(|t| t.output().to_vec());
    assert_eq!(written, [0, 0, 0, 14]);
    Ok(())
}

#[test]
fn test_io_error_kinds_map_to_transport_kinds() {
    use std::io::ErrorKind;
    let eof: TransportError = std::io::Error::new(ErrorKind::UnexpectedEof, "eof").into();
    assert_eq!(eof.kind(), TransportErrorKind::EndOfFile);
    let timeout: TransportError = std::io::Error::new(ErrorKind::WouldBlock, "slow").into();
    assert_eq!(timeout.kind(), TransportErrorKind::TimedOut);
    let other: TransportError = std::io::Error::new(ErrorKind::ConnectionReset, "reset").into();
    assert_eq!(other.kind(), TransportErrorKind::Unknown);
}

#[test]
fn test_socket_loopback() -> Result<()> {
    let mut server = ServerSocket::new("127.0.0.1:0");
    assert_eq!(server.accept().err().map(|e| e.kind()), Some(TransportErrorKind::NotOpen));
    server.listen()?;
    assert_eq!(server.listen().err().map(|e| e.kind()), Some(TransportErrorKind::AlreadyOpen));
    let addr = server.local_addr().expect("bound address");

    let echo = std::thread::spawn(move || -> Result<()> {
        let conn = server.accept()?;
        let mut p = BinaryProtocol::new(conn);
        let s = p.read_string()?;
        p.write_string(&s.to_uppercase())?;
        p.flush()?;
        Ok(())
    });

    let mut client = Socket::new(addr.to_string());
    assert!(!client.is_open());
    client.open()?;
    assert!(client.is_open());
    let mut p = BinaryProtocol::new(client);
    p.write_string("loopback")?;
    p.flush()?;
    assert_eq!(p.read_string()?, "LOOPBACK");

    echo.join().expect("echo thread")?;

    // The server side is gone; the next read hits end of stream.
    let err = p.read_i32().unwrap_err();
    assert!(err.is_end_of_file(), "got {:?}", err);
    p.transport_mut().close()?;
    assert!(!p.transport().is_open());
    Ok(())
}
