use crate::codec::{ArrayHeader, CodecError, SchemaKind, SchemaOptions, decode_digit, encode_digit, parse_schema, parse_schema_with};

#[test]
fn digits_cover_base64_alphabet() {
	assert_eq!(decode_digit('0'), Some(0));
	assert_eq!(decode_digit('9'), Some(9));
	assert_eq!(decode_digit('a'), Some(10));
	assert_eq!(decode_digit('z'), Some(35));
	assert_eq!(decode_digit('A'), Some(36));
	assert_eq!(decode_digit('Z'), Some(61));
	assert_eq!(decode_digit('+'), Some(62));
	assert_eq!(decode_digit('/'), Some(63));
	assert_eq!(decode_digit('-'), None);
	assert_eq!(decode_digit('é'), None);

	for value in 0..64 {
		let digit = encode_digit(value).expect("digit in range");
		assert_eq!(decode_digit(digit), Some(value));
	}
	assert_eq!(encode_digit(64), Err(CodecError::SizeNotEncodable { size: 64 }));
}

#[test]
fn tuple_of_int_and_float_array() {
	let tree = parse_schema("t2i4af8").expect("schema parses");
	let root = tree.root_node();
	assert_eq!(root.kind(), SchemaKind::Tuple);
	assert_eq!(root.size(), 2);
	assert_eq!(root.offsets(), &[0, 4]);
	assert_eq!(root.width(), 4 + ArrayHeader::WIDTH);

	let first = tree.node(root.children()[0]);
	assert_eq!(first.kind(), SchemaKind::SInt(4));
	let array = tree.node(root.children()[1]);
	assert_eq!(array.kind(), SchemaKind::Array);
	let element = tree.node(array.element().expect("array element"));
	assert_eq!(element.kind(), SchemaKind::Float(8));
}

#[test]
fn map_keys_are_read_by_length_digit() {
	let tree = parse_schema("m24names3ageu4").expect("schema parses");
	let root = tree.root_node();
	assert_eq!(root.kind(), SchemaKind::Map);
	let keys: Vec<&str> = root.keys().iter().map(|key| &**key).collect();
	assert_eq!(keys, ["name", "age"]);
	assert_eq!(root.offsets(), &[0, ArrayHeader::WIDTH]);
	assert_eq!(root.width(), ArrayHeader::WIDTH + 4);
}

#[test]
fn map_keys_may_contain_grammar_characters() {
	let tree = parse_schema("m13t2ub").expect("schema parses");
	assert_eq!(&*tree.root_node().keys()[0], "t2u");
	assert_eq!(tree.node(tree.root_node().children()[0]).kind(), SchemaKind::Bool);
}

#[test]
fn multibyte_keys_count_bytes() {
	let tree = parse_schema("m12éz").expect("schema parses");
	assert_eq!(&*tree.root_node().keys()[0], "é");
}

#[test]
fn repeated_map_keys_are_rejected() {
	assert_eq!(
		parse_schema("m21ai41ai4").expect_err("key a twice"),
		CodecError::DuplicateKey {
			key: "a".to_owned(),
			at: 5
		}
	);
	assert!(parse_schema("m21am11ai41bi4").is_ok());
}

#[test]
fn key_splitting_a_character_is_rejected() {
	let err = parse_schema("m11éz").expect_err("key ends mid-character");
	assert_eq!(err, CodecError::InvalidKey { len: 1, at: 3 });
}

#[test]
fn unknown_type_characters_are_rejected() {
	for (schema, found, at) in [("x", 'x', 0), ("t2i4q", 'q', 4), ("aé", 'é', 1), ("m11kZ", 'Z', 4)] {
		assert_eq!(parse_schema(schema).expect_err("unknown type"), CodecError::UnknownType { found, at });
	}
}

#[test]
fn invalid_widths_are_rejected() {
	assert_eq!(
		parse_schema("i3").expect_err("i3"),
		CodecError::InvalidWidth {
			kind: "sint",
			width: 3,
			at: 1
		}
	);
	assert_eq!(
		parse_schema("f2").expect_err("f2"),
		CodecError::InvalidWidth {
			kind: "float",
			width: 2,
			at: 1
		}
	);
	assert!(matches!(parse_schema("u0"), Err(CodecError::InvalidWidth { kind: "uint", .. })));
	assert!(matches!(parse_schema("uz"), Err(CodecError::InvalidWidth { width: 35, .. })));
}

#[test]
fn invalid_digits_are_rejected() {
	assert_eq!(parse_schema("i-").expect_err("bad digit"), CodecError::InvalidDigit { found: '-', at: 1 });
	assert_eq!(parse_schema("t.").expect_err("bad digit"), CodecError::InvalidDigit { found: '.', at: 1 });
}

#[test]
fn truncated_schemas_are_rejected() {
	for (schema, at) in [("", 0), ("i", 1), ("a", 1), ("t2i4", 4), ("m2", 2), ("m14na", 5), ("m1", 2)] {
		assert_eq!(parse_schema(schema).expect_err("truncated"), CodecError::SchemaTruncated { at }, "{schema}");
	}
}

#[test]
fn trailing_input_is_rejected() {
	assert_eq!(parse_schema("i4z").expect_err("trailing"), CodecError::TrailingSchema { at: 2 });
	assert_eq!(parse_schema("t1bb").expect_err("trailing"), CodecError::TrailingSchema { at: 3 });
}

#[test]
fn nesting_depth_is_limited() {
	let options = SchemaOptions { max_depth: 3 };
	parse_schema_with("aaaz", &options).expect("three levels");
	assert_eq!(
		parse_schema_with("aaaaz", &options).expect_err("four levels"),
		CodecError::SchemaTooDeep { max_depth: 3 }
	);
	assert_eq!(
		parse_schema_with("t1t1t1t1z", &options).expect_err("four levels"),
		CodecError::SchemaTooDeep { max_depth: 3 }
	);

	let deep = format!("{}z", "a".repeat(64));
	parse_schema(&deep).expect("default depth allows 64");
	let too_deep = format!("{}z", "a".repeat(65));
	assert!(matches!(parse_schema(&too_deep), Err(CodecError::SchemaTooDeep { max_depth: 64 })));
}

#[test]
fn every_garbage_byte_fails_without_panicking() {
	for byte in 0_u8..=255 {
		let Ok(schema) = std::str::from_utf8(std::slice::from_ref(&byte)) else {
			continue;
		};
		let result = parse_schema(schema);
		match schema {
			"z" | "b" | "s" => assert!(result.is_ok(), "{schema:?}"),
			_ => assert!(result.is_err(), "{schema:?}"),
		}
	}
}
