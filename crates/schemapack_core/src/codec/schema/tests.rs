use crate::codec::{ArrayHeader, CodecError, SchemaBuilder, SchemaKind, SchemaTree, parse_schema};

fn assert_widths_conserved(tree: &SchemaTree) {
	for index in 0..tree.len() {
		let node = tree.get(crate::codec::schema::NodeId(index as u32)).expect("node in range");
		match node.kind() {
			SchemaKind::Tuple | SchemaKind::Map => {
				let widths: Vec<usize> = node.children().iter().map(|child| tree.node(*child).width()).collect();
				assert_eq!(node.width(), widths.iter().sum::<usize>(), "composite width is the sum of children");
				let mut expected = 0;
				for (offset, width) in node.offsets().iter().zip(&widths) {
					assert_eq!(*offset, expected, "offsets are a prefix sum");
					expected += width;
				}
			}
			SchemaKind::Array | SchemaKind::String => assert_eq!(node.width(), ArrayHeader::WIDTH),
			_ => {}
		}
	}
}

#[test]
fn builder_computes_offsets_bottom_up() {
	let mut builder = SchemaBuilder::new();
	let flag = builder.bool();
	let count = builder.uint(4).expect("u4");
	let name = builder.string();
	let ratio = builder.float(8).expect("f8");
	let inner = builder.tuple(vec![count, ratio]);
	let root = builder
		.map([("flag", flag), ("inner", inner), ("name", name)])
		.expect("distinct keys");
	let tree = builder.finish(root);

	let node = tree.root_node();
	assert_eq!(node.kind(), SchemaKind::Map);
	assert_eq!(node.offsets(), &[0, 1, 13]);
	assert_eq!(node.width(), 1 + 12 + ArrayHeader::WIDTH);
	assert_eq!(node.key_index("inner"), Some(1));
	assert_eq!(node.key_index("missing"), None);
	assert_widths_conserved(&tree);
}

#[test]
fn array_width_ignores_element_width() {
	let mut builder = SchemaBuilder::new();
	let element = builder.float(8).expect("f8");
	let wide = builder.tuple(vec![element, element, element]);
	let array = builder.array(wide);
	let tree = builder.finish(array);

	assert_eq!(tree.root_node().width(), ArrayHeader::WIDTH);
	assert_eq!(tree.root_node().size(), 1);
	assert_eq!(tree.root_node().element(), Some(wide));
}

#[test]
fn scalar_widths_are_validated() {
	let mut builder = SchemaBuilder::new();
	assert_eq!(
		builder.sint(3).expect_err("i3 is not a width"),
		CodecError::InvalidWidth {
			kind: "sint",
			width: 3,
			at: 0
		}
	);
	assert!(builder.float(2).is_err());
	assert!(builder.uint(8).is_ok());
}

#[test]
fn encode_renders_compact_grammar() {
	for schema in ["z", "b", "i4", "u8", "f4", "s", "ai4", "t2i4af8", "m24names3ageu4", "t0", "m0"] {
		let tree = parse_schema(schema).expect("schema parses");
		assert_eq!(tree.encode().expect("encodes"), schema);
	}
}

#[test]
fn encode_rejects_arity_above_one_digit() {
	let mut builder = SchemaBuilder::new();
	let children: Vec<_> = (0..64).map(|_| builder.nil()).collect();
	let root = builder.tuple(children);
	let tree = builder.finish(root);

	assert_eq!(tree.root_node().width(), 64);
	assert_eq!(tree.encode().expect_err("64 children"), CodecError::SizeNotEncodable { size: 64 });
}

#[test]
fn parsed_trees_conserve_width() {
	for schema in ["t3bi2af4", "m25alpham11xi12bbu2", "aat2sz", "t2t2i1i2t2u4u8"] {
		let tree = parse_schema(schema).expect("schema parses");
		assert_widths_conserved(&tree);
	}
}

#[test]
fn builder_rejects_repeated_map_keys() {
	let mut builder = SchemaBuilder::new();
	let first = builder.sint(4).expect("i4");
	let second = builder.sint(4).expect("i4");
	let err = builder.map([("a", first), ("b", second), ("a", second)]).expect_err("key a twice");
	assert_eq!(
		err,
		CodecError::DuplicateKey {
			key: "a".to_owned(),
			at: 2
		}
	);
}

#[test]
#[should_panic(expected = "was not built by this builder")]
fn foreign_node_ids_are_refused() {
	let mut other = SchemaBuilder::new();
	other.nil();
	let foreign = other.nil();

	let mut builder = SchemaBuilder::new();
	builder.array(foreign);
}
