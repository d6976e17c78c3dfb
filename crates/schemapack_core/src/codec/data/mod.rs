use std::fmt;

use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::bytes::{put_float_le, put_uint_le, split_fields};
use crate::codec::value::zeroed;
use crate::codec::{ArrayHeader, CodecError, NodeId, Result, SchemaKind, SchemaTree, Value, ValueView};

/// Dynamic value tree, independent of any schema.
///
/// This is the shape host-side code works with before it is laid out
/// flat by [`Value::from_data`].
#[derive(Debug, Clone, PartialEq)]
pub enum Data {
	/// Unit.
	Nil,
	/// Boolean.
	Bool(bool),
	/// Signed integer.
	Int(i64),
	/// Unsigned integer.
	UInt(u64),
	/// Floating point number.
	Float(f64),
	/// UTF-8 string.
	String(String),
	/// String payload that is not valid UTF-8.
	Bytes(Vec<u8>),
	/// Homogeneous sequence.
	Array(Vec<Data>),
	/// Heterogeneous fixed-arity sequence.
	Tuple(Vec<Data>),
	/// Named fields in order.
	Map(Vec<Field>),
}

/// One named entry of [`Data::Map`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	/// Field name.
	pub key: String,
	/// Field value.
	pub value: Data,
}

impl Field {
	/// Build a field from a key and value.
	pub fn new(key: impl Into<String>, value: impl Into<Data>) -> Self {
		Self {
			key: key.into(),
			value: value.into(),
		}
	}
}

impl Data {
	/// Stable lowercase label for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Data::Nil => "nil",
			Data::Bool(_) => "bool",
			Data::Int(_) => "int",
			Data::UInt(_) => "uint",
			Data::Float(_) => "float",
			Data::String(_) => "string",
			Data::Bytes(_) => "bytes",
			Data::Array(_) => "array",
			Data::Tuple(_) => "tuple",
			Data::Map(_) => "map",
		}
	}

	/// Look up a map field by key.
	pub fn get(&self, key: &str) -> Option<&Data> {
		match self {
			Data::Map(fields) => fields.iter().find(|field| field.key == key).map(|field| &field.value),
			_ => None,
		}
	}

	/// Check that this value can be laid out by `schema`.
	///
	/// Applies the same kind, arity, key and integer range rules as
	/// [`Value::from_data`] without allocating the flat value.
	pub fn conforms(&self, schema: &SchemaTree) -> Result<()> {
		check(self, schema, schema.root())
	}
}

fn check(data: &Data, schema: &SchemaTree, id: NodeId) -> Result<()> {
	let node = schema.node(id);
	match (node.kind(), data) {
		(SchemaKind::Nil, Data::Nil) | (SchemaKind::Bool, Data::Bool(_)) => Ok(()),
		(SchemaKind::SInt(_) | SchemaKind::UInt(_), Data::Int(_) | Data::UInt(_)) => {
			checked_int(node.kind(), int_of(data)).map(|_| ())
		}
		(SchemaKind::Float(_), Data::Float(_) | Data::Int(_) | Data::UInt(_)) => Ok(()),
		(SchemaKind::String, Data::String(_) | Data::Bytes(_)) => Ok(()),
		(SchemaKind::Array, Data::Array(items) | Data::Tuple(items)) => {
			let element = node.children()[0];
			items.iter().try_for_each(|item| check(item, schema, element))
		}
		(SchemaKind::Tuple, Data::Tuple(items) | Data::Array(items)) => {
			expect_len(node.size(), items.len())?;
			items
				.iter()
				.zip(node.children())
				.try_for_each(|(item, child)| check(item, schema, *child))
		}
		(SchemaKind::Map, Data::Map(fields)) => {
			expect_len(node.size(), fields.len())?;
			node.keys()
				.iter()
				.zip(node.children())
				.try_for_each(|(key, child)| check(lookup(fields, key)?, schema, *child))
		}
		(kind, data) => Err(mismatch(kind, data)),
	}
}

fn expect_len(expected: usize, got: usize) -> Result<()> {
	if expected != got {
		return Err(CodecError::LengthMismatch { expected, got });
	}
	Ok(())
}

fn lookup<'a>(fields: &'a [Field], key: &str) -> Result<&'a Data> {
	fields
		.iter()
		.find(|field| field.key == key)
		.map(|field| &field.value)
		.ok_or_else(|| CodecError::MissingField { key: key.to_owned() })
}

fn mismatch(kind: SchemaKind, data: &Data) -> CodecError {
	CodecError::TypeMismatch {
		expected: kind.name(),
		got: data.kind_name(),
		at: 0,
	}
}

fn int_of(data: &Data) -> i128 {
	match data {
		Data::Int(value) => i128::from(*value),
		Data::UInt(value) => i128::from(*value),
		_ => 0,
	}
}

/// Range-check `value` against an integer kind and return its stored bits.
pub(crate) fn checked_int(kind: SchemaKind, value: i128) -> Result<u64> {
	let (width, signed) = match kind {
		SchemaKind::SInt(width) => (width, true),
		SchemaKind::UInt(width) => (width, false),
		other => {
			return Err(CodecError::TypeMismatch {
				expected: "int",
				got: other.name(),
				at: 0,
			});
		}
	};
	let bits = u32::from(width) * 8;
	let (min, max) = if signed {
		(-(1_i128 << (bits - 1)), (1_i128 << (bits - 1)) - 1)
	} else {
		(0, (1_i128 << bits) - 1)
	};
	if value < min || value > max {
		return Err(CodecError::IntegerRange { value, width, signed });
	}
	Ok(value as u64)
}

impl Value {
	/// Lay out a dynamic value according to `schema`.
	///
	/// Integers are range-checked against their declared width and
	/// signedness; map fields are matched by key.
	pub fn from_data(data: &Data, schema: &SchemaTree) -> Result<Self> {
		let mut value = Value::default();
		let mut root = zeroed(schema.root_node().width())?;
		write(&mut value, schema, schema.root(), data, &mut root)?;
		value.set_root(root);
		Ok(value)
	}

	/// Read the flat value back into a dynamic tree.
	pub fn to_data(&self, schema: &SchemaTree) -> Result<Data> {
		read(self.view(schema)?)
	}
}

fn write(value: &mut Value, schema: &SchemaTree, id: NodeId, data: &Data, dst: &mut [u8]) -> Result<()> {
	let node = schema.node(id);
	match (node.kind(), data) {
		(SchemaKind::Nil, Data::Nil) => {}
		(SchemaKind::Bool, Data::Bool(flag)) => dst[0] = u8::from(*flag),
		(SchemaKind::SInt(_) | SchemaKind::UInt(_), Data::Int(_) | Data::UInt(_)) => {
			put_uint_le(dst, checked_int(node.kind(), int_of(data))?);
		}
		(SchemaKind::Float(_), Data::Float(number)) => put_float_le(dst, *number),
		(SchemaKind::Float(_), Data::Int(number)) => put_float_le(dst, *number as f64),
		(SchemaKind::Float(_), Data::UInt(number)) => put_float_le(dst, *number as f64),
		(SchemaKind::String, Data::String(text)) => write_payload(value, dst, text.as_bytes().to_vec()),
		(SchemaKind::String, Data::Bytes(bytes)) => write_payload(value, dst, bytes.clone()),
		(SchemaKind::Array, Data::Array(items) | Data::Tuple(items)) => {
			let element = node.children()[0];
			let width = schema.node(element).width();
			let len = items
				.len()
				.checked_mul(width)
				.ok_or(CodecError::Allocation { requested: usize::MAX })?;
			let mut payload = zeroed(len)?;
			for (item, slot) in items.iter().zip(split_fields(&mut payload, std::iter::repeat_n(width, items.len()))) {
				write(value, schema, element, item, slot)?;
			}
			let header = ArrayHeader {
				size: items.len() as u64,
				slot: value.push_payload(payload),
			};
			header.write(dst);
		}
		(SchemaKind::Tuple, Data::Tuple(items) | Data::Array(items)) => {
			expect_len(node.size(), items.len())?;
			let widths = node.children().iter().map(|child| schema.node(*child).width());
			for ((item, child), slot) in items.iter().zip(node.children()).zip(split_fields(dst, widths)) {
				write(value, schema, *child, item, slot)?;
			}
		}
		(SchemaKind::Map, Data::Map(fields)) => {
			expect_len(node.size(), fields.len())?;
			let widths = node.children().iter().map(|child| schema.node(*child).width());
			for ((key, child), slot) in node.keys().iter().zip(node.children()).zip(split_fields(dst, widths)) {
				write(value, schema, *child, lookup(fields, key)?, slot)?;
			}
		}
		(kind, data) => return Err(mismatch(kind, data)),
	}
	Ok(())
}

fn write_payload(value: &mut Value, dst: &mut [u8], payload: Vec<u8>) {
	let header = ArrayHeader {
		size: payload.len() as u64,
		slot: value.push_payload(payload),
	};
	header.write(dst);
}

fn read(view: ValueView<'_>) -> Result<Data> {
	Ok(match view.kind() {
		SchemaKind::Nil => Data::Nil,
		SchemaKind::Bool => Data::Bool(view.as_bool().unwrap_or_default()),
		SchemaKind::SInt(_) => Data::Int(view.as_i64().unwrap_or_default()),
		SchemaKind::UInt(_) => Data::UInt(view.as_u64().unwrap_or_default()),
		SchemaKind::Float(_) => Data::Float(view.as_f64().unwrap_or_default()),
		SchemaKind::String => {
			let bytes = view.as_bytes()?;
			match std::str::from_utf8(bytes) {
				Ok(text) => Data::String(text.to_owned()),
				Err(_) => Data::Bytes(bytes.to_vec()),
			}
		}
		SchemaKind::Array => {
			let mut items = Vec::with_capacity(view.checked_elements()?);
			let mut index = 0;
			while let Some(element) = view.element(index)? {
				items.push(read(element)?);
				index += 1;
			}
			Data::Array(items)
		}
		SchemaKind::Tuple => Data::Tuple(children(view)?),
		SchemaKind::Map => {
			let keys = view.node().keys();
			let values = children(view)?;
			Data::Map(
				keys.iter()
					.zip(values)
					.map(|(key, value)| Field {
						key: key.to_string(),
						value,
					})
					.collect(),
			)
		}
	})
}

fn children(view: ValueView<'_>) -> Result<Vec<Data>> {
	(0..view.node().size())
		.map_while(|index| view.child(index))
		.map(read)
		.collect()
}

impl From<bool> for Data {
	fn from(value: bool) -> Self {
		Data::Bool(value)
	}
}

impl From<i64> for Data {
	fn from(value: i64) -> Self {
		Data::Int(value)
	}
}

impl From<u64> for Data {
	fn from(value: u64) -> Self {
		Data::UInt(value)
	}
}

impl From<f64> for Data {
	fn from(value: f64) -> Self {
		Data::Float(value)
	}
}

impl From<&str> for Data {
	fn from(value: &str) -> Self {
		Data::String(value.to_owned())
	}
}

impl From<String> for Data {
	fn from(value: String) -> Self {
		Data::String(value)
	}
}

impl Serialize for Data {
	fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
		match self {
			Data::Nil => serializer.serialize_unit(),
			Data::Bool(value) => serializer.serialize_bool(*value),
			Data::Int(value) => serializer.serialize_i64(*value),
			Data::UInt(value) => serializer.serialize_u64(*value),
			Data::Float(value) => serializer.serialize_f64(*value),
			Data::String(value) => serializer.serialize_str(value),
			Data::Bytes(value) => serializer.serialize_bytes(value),
			Data::Array(items) | Data::Tuple(items) => {
				let mut seq = serializer.serialize_seq(Some(items.len()))?;
				for item in items {
					seq.serialize_element(item)?;
				}
				seq.end()
			}
			Data::Map(fields) => {
				let mut map = serializer.serialize_map(Some(fields.len()))?;
				for field in fields {
					map.serialize_entry(&field.key, &field.value)?;
				}
				map.end()
			}
		}
	}
}

impl<'de> Deserialize<'de> for Data {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
		deserializer.deserialize_any(DataVisitor)
	}
}

struct DataVisitor;

impl<'de> Visitor<'de> for DataVisitor {
	type Value = Data;

	fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("a nil, bool, number, string, sequence or map")
	}

	fn visit_unit<E: de::Error>(self) -> std::result::Result<Data, E> {
		Ok(Data::Nil)
	}

	fn visit_none<E: de::Error>(self) -> std::result::Result<Data, E> {
		Ok(Data::Nil)
	}

	fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Data, D::Error> {
		Data::deserialize(deserializer)
	}

	fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Data, E> {
		Ok(Data::Bool(value))
	}

	fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Data, E> {
		Ok(Data::Int(value))
	}

	fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Data, E> {
		Ok(Data::UInt(value))
	}

	fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Data, E> {
		Ok(Data::Float(value))
	}

	fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Data, E> {
		Ok(Data::String(value.to_owned()))
	}

	fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Data, E> {
		Ok(Data::String(value))
	}

	fn visit_bytes<E: de::Error>(self, value: &[u8]) -> std::result::Result<Data, E> {
		Ok(Data::Bytes(value.to_vec()))
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Data, A::Error> {
		let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
		while let Some(item) = seq.next_element()? {
			items.push(item);
		}
		Ok(Data::Array(items))
	}

	fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Data, A::Error> {
		let mut fields = Vec::new();
		while let Some((key, value)) = map.next_entry::<String, Data>()? {
			fields.push(Field { key, value });
		}
		Ok(Data::Map(fields))
	}
}
