use super::*;

const EXPLORE: &str = include_str!("../../schemas/explore.kiwi");

fn explore() -> Codec {
    match Codec::from_source(EXPLORE) {
        Ok(codec) => codec,
        Err(error) => panic!("bundled schema is invalid: {error}"),
    }
}

fn point(x: f32, y: f32) -> Value {
    Value::Struct(vec![Value::Float(x), Value::Float(y)])
}

fn cartesian_camera() -> Value {
    Value::message([(1, Value::Enum(1)), (2, point(1.5, -2.0))])
}

const CARTESIAN_CAMERA_BYTES: [u8; 12] = [
    0x01, 0x01, // projection = CARTESIAN
    0x02, 0x00, 0x00, 0xc0, 0x3f, 0x00, 0x00, 0x00, 0xc0, // center
    0x00,
];

fn sample_payload() -> Value {
    let fill = Value::message([
        (1, Value::Enum(0)),
        (2, Value::from("#000000")),
        (3, Value::Int(100)),
    ]);
    let frame = Value::message([
        (1, Value::from("L6HOWTAJ79IUS6JN5GS")),
        (
            3,
            Value::Array(vec![Value::message([
                (1, Value::from("SQ6WJO0GNUJGFU8LHVV")),
                (2, Value::Array(vec![Value::from("Astro-Epen")])),
            ])]),
        ),
        (4, cartesian_camera()),
        (5, Value::Array(vec![Value::message([(1, Value::from("Gfap"))])])),
        (
            6,
            Value::message([
                (1, Value::Enum(1)),
                (3, Value::Float(0.5)),
                (4, Value::Bool(false)),
            ]),
        ),
        (10, Value::Array(Vec::new())),
        (11, Value::message([(4, fill.clone()), (5, fill)])),
    ]);
    Value::message([
        (1, Value::Array(vec![frame.clone(), frame])),
        (2, Value::Enum(8)),
    ])
}

#[test]
fn camera_scenario() {
    let codec = explore();
    let bytes = codec.encode("Camera", &cartesian_camera()).unwrap();
    assert_eq!(bytes, CARTESIAN_CAMERA_BYTES);
    assert_eq!(codec.decode("Camera", &bytes), Ok(cartesian_camera()));
}

#[test]
fn empty_message_is_a_single_terminator() {
    let codec = explore();
    for def in codec.definitions() {
        if let CompiledKind::Message { .. } = def.kind {
            let bytes = codec.encode(&def.name, &Value::empty_message()).unwrap();
            assert_eq!(bytes, [0x00], "{}", def.name);
            assert_eq!(codec.decode(&def.name, &bytes), Ok(Value::empty_message()));
        }
    }
}

#[test]
fn payload_round_trip() {
    let codec = explore();
    let payload = sample_payload();
    let bytes = codec.encode("ExplorePageInitPayload", &payload).unwrap();
    assert_eq!(codec.decode("ExplorePageInitPayload", &bytes), Ok(payload));
}

#[test]
fn encoding_is_deterministic() {
    let codec = explore();
    let first = codec.encode("ExplorePageInitPayload", &sample_payload()).unwrap();
    let second = explore()
        .encode("ExplorePageInitPayload", &sample_payload())
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn empty_repeated_field_is_set() {
    let codec = explore();
    let visualization = Value::message([(10, Value::Array(Vec::new()))]);
    let bytes = codec.encode("Visualization", &visualization).unwrap();
    assert_eq!(bytes, [0x0a, 0x00, 0x00]);
    assert_eq!(codec.decode("Visualization", &bytes), Ok(visualization));
}

#[test]
fn every_strict_prefix_is_rejected() {
    let codec = explore();
    let bytes = codec.encode("ExplorePageInitPayload", &sample_payload()).unwrap();
    for len in 0..bytes.len() {
        assert!(
            codec.decode("ExplorePageInitPayload", &bytes[..len]).is_err(),
            "prefix of length {len} decoded",
        );
    }
}

#[test]
fn truncation_reports_end_of_buffer() {
    let codec = explore();
    assert_eq!(
        codec.decode("Camera", &CARTESIAN_CAMERA_BYTES[..5]),
        Err(DecodeError::UnexpectedEndOfBuffer { offset: 5 }),
    );
}

#[test]
fn unknown_field_number_is_rejected() {
    let codec = explore();
    assert_eq!(
        codec.decode("Camera", &[0x09, 0x00, 0x00]),
        Err(DecodeError::UnknownField {
            message: "Camera".to_owned(),
            number: 9,
            offset: 0,
        }),
    );
    assert_eq!(
        codec.encode("Camera", &Value::message([(9, Value::Int(0))])),
        Err(EncodeError::UnknownField {
            message: "Camera".to_owned(),
            number: 9,
        }),
    );
}

#[test]
fn trailing_bytes_are_rejected() {
    let codec = explore();
    assert_eq!(
        codec.decode("Gene", &[0x00, 0x00]),
        Err(DecodeError::TrailingBytes { offset: 1, len: 1 }),
    );
}

#[test]
fn unknown_enum_values_fall_back_to_zero() {
    let codec = explore();
    assert_eq!(codec.decode("Projection", &[0x07]), Ok(Value::Enum(0)));
    assert_eq!(
        codec.decode("Camera", &[0x01, 0x2a, 0x00]),
        Ok(Value::message([(1, Value::Enum(0))])),
    );
}

#[test]
fn unknown_enum_values_without_zero_member() {
    let codec = explore();
    assert_eq!(
        codec.decode("Layout", &[0x00]),
        Err(DecodeError::InvalidEnumValue {
            enum_name: "Layout".to_owned(),
            value: 0,
        }),
    );
    assert_eq!(
        codec.encode("Layout", &Value::Enum(13)),
        Err(EncodeError::UnknownEnumValue {
            enum_name: "Layout".to_owned(),
            value: 13,
        }),
    );
}

#[test]
fn invalid_bool_is_rejected() {
    let codec = explore();
    assert_eq!(
        codec.decode("Camera", &[0x06, 0x02, 0x00]),
        Err(DecodeError::InvalidBool { offset: 1, byte: 2 }),
    );
}

#[test]
fn value_shape_mismatches() {
    let codec = explore();
    assert_eq!(
        codec.encode("Camera", &Value::Int(1)),
        Err(EncodeError::Mismatch {
            ty: "Camera".to_owned(),
            found: "int",
        }),
    );
    assert_eq!(
        codec.encode("point2d", &Value::Struct(vec![Value::Float(1.0)])),
        Err(EncodeError::StructArity {
            struct_name: "point2d".to_owned(),
            expected: 2,
            found: 1,
        }),
    );
    assert_eq!(
        codec.encode("Gene", &Value::message([(1, Value::Int(1))])),
        Err(EncodeError::Mismatch {
            ty: "string".to_owned(),
            found: "int",
        }),
    );
    assert_eq!(
        codec.encode("FilterCategory", &Value::message([(2, Value::from("a"))])),
        Err(EncodeError::Mismatch {
            ty: "string[]".to_owned(),
            found: "string",
        }),
    );
}

#[test]
fn unknown_type_names() {
    let codec = explore();
    assert!(codec.type_codec("Nope").is_none());
    assert_eq!(
        codec.encode("Nope", &Value::empty_message()),
        Err(EncodeError::UnknownType {
            name: "Nope".to_owned()
        }),
    );
    assert_eq!(
        codec.decode("Nope", &[0x00]),
        Err(DecodeError::UnknownType {
            name: "Nope".to_owned()
        }),
    );
}

#[test]
fn declaration_order_does_not_matter() {
    let codec = Codec::from_source(
        "message Tree { Forest children = 1; string label = 2; }
         message Forest { Tree[] trees = 1; }",
    )
    .unwrap();

    let leaf = Value::message([(2, Value::from("leaf"))]);
    let tree = Value::message([
        (1, Value::message([(1, Value::Array(vec![leaf.clone(), leaf]))])),
        (2, Value::from("root")),
    ]);
    let bytes = codec.encode("Tree", &tree).unwrap();
    assert_eq!(codec.decode("Tree", &bytes), Ok(tree));
}

#[test]
fn deep_nesting_is_rejected() {
    let codec = Codec::from_source("message Node { Node next = 1; }").unwrap();
    let mut bytes = vec![0x01; MAX_DECODE_DEPTH + 1];
    bytes.extend(std::iter::repeat(0x00).take(MAX_DECODE_DEPTH + 2));
    assert_eq!(
        codec.decode("Node", &bytes),
        Err(DecodeError::DepthLimitExceeded {
            offset: MAX_DECODE_DEPTH,
        }),
    );

    let mut value = Value::empty_message();
    for _ in 0..MAX_DECODE_DEPTH - 1 {
        value = Value::message([(1, value)]);
    }
    let bytes = codec.encode("Node", &value).unwrap();
    assert_eq!(codec.decode("Node", &bytes), Ok(value.clone()));

    // One more level can be neither decoded nor encoded.
    let value = Value::message([(1, value)]);
    assert_eq!(
        codec.encode("Node", &value),
        Err(EncodeError::DepthLimitExceeded {
            message: "Node".to_owned(),
        }),
    );
}

#[test]
fn deep_nesting_through_repeated_fields_is_rejected() {
    let codec = Codec::from_source("message Node { Node[] children = 1; }").unwrap();
    let mut value = Value::empty_message();
    for _ in 0..MAX_DECODE_DEPTH + 5 {
        value = Value::message([(1, Value::Array(vec![value]))]);
    }
    assert!(matches!(
        codec.encode("Node", &value),
        Err(EncodeError::DepthLimitExceeded { .. }),
    ));
}

#[test]
fn element_counts_beyond_the_input_are_rejected() {
    let codec = Codec::from_source(
        "message Empty { }
         message Bag { Empty[] empties = 1; bool[] flags = 2; }",
    )
    .unwrap();

    // 50 000 000 empty messages claimed by a six byte token.
    assert_eq!(
        codec.decode("Bag", &[0x01, 0x80, 0xe1, 0xeb, 0x17, 0x00]),
        Err(DecodeError::UnexpectedEndOfBuffer { offset: 6 }),
    );
    assert_eq!(
        codec.decode("Bag", &[0x02, 0xff, 0xff, 0xff, 0xff, 0x0f, 0x00]),
        Err(DecodeError::UnexpectedEndOfBuffer { offset: 7 }),
    );

    let bag = Value::message([(
        1,
        Value::Array(vec![Value::empty_message(), Value::empty_message()]),
    )]);
    assert_eq!(codec.decode("Bag", &[0x01, 0x02, 0x00, 0x00, 0x00]), Ok(bag));
}

#[test]
fn wide_integers() {
    let codec = Codec::from_source(
        "message Wide { int64 signed = 1; uint64 unsigned = 2; byte raw = 3; }",
    )
    .unwrap();
    let value = Value::message([
        (1, Value::Int64(i64::MIN)),
        (2, Value::Uint64(u64::MAX)),
        (3, Value::Byte(0xff)),
    ]);
    let bytes = codec.encode("Wide", &value).unwrap();
    assert_eq!(codec.decode("Wide", &bytes), Ok(value));
}
