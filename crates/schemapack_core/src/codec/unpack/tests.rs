use crate::codec::{
	CodecError, Data, Field, KeyPolicy, UnpackOptions, Value, pack_with_schema, parse_schema, unpack, unpack_with_options,
};

fn unpack_data(bytes: &[u8], schema: &str) -> Data {
	let tree = parse_schema(schema).expect("schema parses");
	let value = unpack(bytes, schema).expect("bytes unpack");
	value.to_data(&tree).expect("value reads back")
}

fn key(text: &str) -> Vec<u8> {
	let mut out = vec![0xa0 | text.len() as u8];
	out.extend_from_slice(text.as_bytes());
	out
}

#[test]
fn scalars_unpack_into_declared_widths() {
	assert_eq!(unpack_data(&[0xc0], "z"), Data::Nil);
	assert_eq!(unpack_data(&[0xc3], "b"), Data::Bool(true));
	assert_eq!(unpack_data(&[0xd0, 0xd6], "i4"), Data::Int(-42));
	assert_eq!(unpack_data(&[0xcd, 0x01, 0x2c], "u4"), Data::UInt(300));
	assert_eq!(unpack_data(&[0x2a], "i1"), Data::Int(42));

	let value = unpack(&[0xd0, 0xd6], "i4").expect("unpacks");
	assert_eq!(value.root(), &(-42_i32).to_le_bytes());
}

#[test]
fn floats_accept_float_and_integer_tokens() {
	assert_eq!(unpack_data(&[0xca, 0x3f, 0xc0, 0x00, 0x00], "f8"), Data::Float(1.5));
	assert_eq!(unpack_data(&[0x05], "f4"), Data::Float(5.0));
	assert_eq!(unpack_data(&[0xff], "f8"), Data::Float(-1.0));
}

#[test]
fn strings_accept_str_and_bin() {
	assert_eq!(unpack_data(&[0xa5, b'h', b'e', b'l', b'l', b'o'], "s"), Data::from("hello"));
	assert_eq!(unpack_data(&[0xc4, 0x02, b'h', b'i'], "s"), Data::from("hi"));
	assert_eq!(unpack_data(&[0xa0], "s"), Data::from(""));
}

#[test]
fn arrays_allocate_exact_payloads() {
	let value = unpack(&[0x93, 0x01, 0x02, 0x03], "au2").expect("unpacks");
	assert_eq!(value.payloads().len(), 1);
	assert_eq!(&*value.payloads()[0], &[1, 0, 2, 0, 3, 0]);
	assert_eq!(unpack_data(&[0x90], "ai4"), Data::Array(Vec::new()));
}

#[test]
fn map_validates_keys_positionally_by_default() {
	let schema = "m24key1i44key2s";
	let mut bytes = vec![0x82];
	bytes.extend(key("key1"));
	bytes.push(0x2a);
	bytes.extend(key("key2"));
	bytes.extend(key("value"));
	assert_eq!(
		unpack_data(&bytes, schema),
		Data::Map(vec![Field::new("key1", 42_i64), Field::new("key2", "value")])
	);

	let mut swapped = vec![0x82];
	swapped.extend(key("key2"));
	swapped.push(0x2a);
	swapped.extend(key("key1"));
	swapped.extend(key("value"));
	assert_eq!(
		unpack(&swapped, schema).expect_err("keys out of order"),
		CodecError::KeyMismatch {
			expected: "key1".to_owned(),
			got: "key2".to_owned()
		}
	);

	let tree = parse_schema(schema).expect("schema");
	let options = UnpackOptions {
		key_policy: KeyPolicy::Positional,
		..UnpackOptions::default()
	};
	let value = unpack_with_options(&swapped, &tree, &options).expect("positional ignores keys");
	assert_eq!(value.to_data(&tree).expect("reads back").get("key1"), Some(&Data::Int(42)));
}

#[test]
fn str_where_float_expected_is_a_type_mismatch() {
	let err = unpack(&[0x92, 0x01, 0xa1, b'x'], "t2i4f8").expect_err("str is not a float");
	assert_eq!(
		err,
		CodecError::TypeMismatch {
			expected: "float",
			got: "str",
			at: 2
		}
	);
}

#[test]
fn tuple_arity_must_match() {
	assert_eq!(
		unpack(&[0x91, 0x01], "t2i4i4").expect_err("one element"),
		CodecError::LengthMismatch { expected: 2, got: 1 }
	);
}

#[test]
fn integers_are_range_checked() {
	assert_eq!(
		unpack(&[0xcd, 0x01, 0x00], "u1").expect_err("256 in u1"),
		CodecError::IntegerRange {
			value: 256,
			width: 1,
			signed: false
		}
	);
	assert!(matches!(unpack(&[0xff], "u4"), Err(CodecError::IntegerRange { value: -1, .. })));
	assert!(matches!(unpack(&[0xcc, 0x80], "i1"), Err(CodecError::IntegerRange { value: 128, .. })));
}

#[test]
fn truncated_input_is_reported() {
	assert_eq!(unpack(&[], "z").expect_err("empty"), CodecError::Truncated { at: 0 });
	assert_eq!(unpack(&[0xcd, 0x01], "u4").expect_err("short header"), CodecError::Truncated { at: 2 });
	assert_eq!(unpack(&[0xa5, b'h', b'i'], "s").expect_err("short payload"), CodecError::Truncated { at: 3 });
	assert_eq!(unpack(&[0x92, 0x01], "ai4").expect_err("missing element"), CodecError::Truncated { at: 2 });
}

#[test]
fn huge_declared_array_is_rejected_before_allocating() {
	let err = unpack(&[0xdd, 0xff, 0xff, 0xff, 0xff, 0x00], "af8").expect_err("declared 4G elements");
	assert_eq!(err, CodecError::Truncated { at: 6 });
}

#[test]
fn payload_limit_is_enforced() {
	let tree = parse_schema("s").expect("schema");
	let options = UnpackOptions {
		max_payload_bytes: 4,
		..UnpackOptions::default()
	};
	let err = unpack_with_options(&[0xa5, b'h', b'e', b'l', b'l', b'o'], &tree, &options).expect_err("over limit");
	assert_eq!(err, CodecError::Allocation { requested: 5 });
}

#[test]
fn trailing_bytes_follow_policy() {
	assert_eq!(unpack(&[0xc0, 0xc0], "z").expect_err("trailing"), CodecError::TrailingBytes { leftover: 1 });

	let tree = parse_schema("z").expect("schema");
	let options = UnpackOptions {
		strict_trailing: false,
		..UnpackOptions::default()
	};
	unpack_with_options(&[0xc0, 0xc0], &tree, &options).expect("lenient trailing");
}

#[test]
fn reserved_marker_is_an_error() {
	assert_eq!(unpack(&[0xc1], "z").expect_err("reserved"), CodecError::InvalidMarker { marker: 0xc1, at: 0 });
}

#[test]
fn repack_reproduces_wire_bytes() {
	let tree = parse_schema("t3sau1m11kb").expect("schema");
	let mut bytes = vec![0x93, 0xa2, b'o', b'k', 0x92, 0x01, 0x02, 0x81];
	bytes.extend(key("k"));
	bytes.push(0xc2);
	let value = unpack(&bytes, "t3sau1m11kb").expect("unpacks");
	assert_eq!(pack_with_schema(&value, &tree).expect("packs"), bytes);

	let other = Value::from_data(&value.to_data(&tree).expect("reads"), &tree).expect("lays out");
	assert_eq!(pack_with_schema(&other, &tree).expect("packs"), bytes);
}
