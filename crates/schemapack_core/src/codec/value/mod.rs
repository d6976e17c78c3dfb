use crate::codec::bytes::{Cursor, float_le, put_uint_le, sint_le, uint_le};
use crate::codec::{CodecError, NodeId, Result, SchemaKind, SchemaNode, SchemaTree};

/// Inline record for strings and arrays: element count plus payload slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayHeader {
	/// Element count (bytes for strings).
	pub size: u64,
	/// Index of the payload in the owning [`Value`].
	pub slot: u64,
}

impl ArrayHeader {
	/// Inline byte width: two little-endian `u64`s.
	pub const WIDTH: usize = 16;

	/// Decode a header from exactly [`Self::WIDTH`] bytes.
	pub fn read(bytes: &[u8]) -> Result<Self> {
		if bytes.len() != Self::WIDTH {
			return Err(CodecError::LayoutMismatch {
				expected: Self::WIDTH,
				got: bytes.len(),
			});
		}
		let mut cursor = Cursor::new(bytes);
		let size = uint_le(cursor.read_exact(8)?);
		let slot = uint_le(cursor.read_exact(8)?);
		Ok(Self { size, slot })
	}

	/// Encode into the first [`Self::WIDTH`] bytes of `dst`.
	pub fn write(&self, dst: &mut [u8]) {
		put_uint_le(&mut dst[..8], self.size);
		put_uint_le(&mut dst[8..Self::WIDTH], self.slot);
	}
}

/// Flat value laid out by a schema.
///
/// `root` holds exactly the root node's width. Strings and arrays store an
/// [`ArrayHeader`] inline whose `slot` indexes `payloads`. Equality here is
/// byte equality; slot numbering can differ between values with the same
/// content, so compare through [`Value::to_data`] for content equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Value {
	root: Box<[u8]>,
	payloads: Vec<Box<[u8]>>,
}

impl Value {
	/// Wrap a root region with no payloads.
	pub fn new(root: impl Into<Box<[u8]>>) -> Self {
		Self {
			root: root.into(),
			payloads: Vec::new(),
		}
	}

	/// Root region bytes.
	pub fn root(&self) -> &[u8] {
		&self.root
	}

	/// Mutable root region bytes.
	pub fn root_mut(&mut self) -> &mut [u8] {
		&mut self.root
	}

	/// Replace the root region.
	pub fn set_root(&mut self, root: impl Into<Box<[u8]>>) {
		self.root = root.into();
	}

	/// All payloads in slot order.
	pub fn payloads(&self) -> &[Box<[u8]>] {
		&self.payloads
	}

	/// Payload stored at `slot`.
	pub fn payload(&self, slot: u64) -> Result<&[u8]> {
		usize::try_from(slot)
			.ok()
			.and_then(|index| self.payloads.get(index))
			.map(|payload| &**payload)
			.ok_or(CodecError::MissingPayload { slot })
	}

	/// Append a payload and return its slot.
	pub fn push_payload(&mut self, payload: impl Into<Box<[u8]>>) -> u64 {
		self.payloads.push(payload.into());
		(self.payloads.len() - 1) as u64
	}

	/// Payload behind `header`, checked to hold `size * element_width` bytes.
	pub(crate) fn array_payload(&self, header: ArrayHeader, element_width: usize) -> Result<&[u8]> {
		let payload = self.payload(header.slot)?;
		let expected = usize::try_from(header.size)
			.ok()
			.and_then(|size| size.checked_mul(element_width))
			.ok_or(CodecError::PayloadSizeMismatch {
				expected: usize::MAX,
				got: payload.len(),
			})?;
		if payload.len() != expected {
			return Err(CodecError::PayloadSizeMismatch {
				expected,
				got: payload.len(),
			});
		}
		Ok(payload)
	}

	/// Schema-driven view of the root region.
	pub fn view<'a>(&'a self, schema: &'a SchemaTree) -> Result<ValueView<'a>> {
		let node = schema.root_node();
		if self.root.len() != node.width() {
			return Err(CodecError::LayoutMismatch {
				expected: node.width(),
				got: self.root.len(),
			});
		}
		Ok(ValueView {
			value: self,
			schema,
			id: schema.root(),
			bytes: &self.root,
		})
	}
}

/// Zero-filled buffer allocated without aborting on failure.
pub(crate) fn zeroed(len: usize) -> Result<Vec<u8>> {
	let mut buf = Vec::new();
	buf.try_reserve_exact(len).map_err(|_| CodecError::Allocation { requested: len })?;
	buf.resize(len, 0);
	Ok(buf)
}

/// Read-only cursor into one node of a [`Value`].
#[derive(Debug, Clone, Copy)]
pub struct ValueView<'a> {
	value: &'a Value,
	schema: &'a SchemaTree,
	id: NodeId,
	bytes: &'a [u8],
}

impl<'a> ValueView<'a> {
	/// Schema node this view reads.
	pub fn node(&self) -> &'a SchemaNode {
		self.schema.node(self.id)
	}

	/// Shape of the viewed node.
	pub fn kind(&self) -> SchemaKind {
		self.node().kind()
	}

	/// Inline bytes of the viewed node.
	pub fn bytes(&self) -> &'a [u8] {
		self.bytes
	}

	/// Child `index` of a tuple or map.
	pub fn child(&self, index: usize) -> Option<ValueView<'a>> {
		let node = self.node();
		if !matches!(node.kind(), SchemaKind::Tuple | SchemaKind::Map) {
			return None;
		}
		let id = *node.children().get(index)?;
		let start = node.offsets()[index];
		let bytes = self.bytes.get(start..start + self.schema.node(id).width())?;
		Some(self.at(id, bytes))
	}

	/// Map field named `key`.
	pub fn field(&self, key: &str) -> Option<ValueView<'a>> {
		match self.kind() {
			SchemaKind::Map => self.child(self.node().key_index(key)?),
			_ => None,
		}
	}

	/// Element count of a string or array, or the arity of a tuple or map.
	pub fn len(&self) -> Result<usize> {
		match self.kind() {
			SchemaKind::String | SchemaKind::Array => {
				let header = ArrayHeader::read(self.bytes)?;
				usize::try_from(header.size).map_err(|_| CodecError::LengthOverflow { len: usize::MAX })
			}
			_ => Ok(self.node().size()),
		}
	}

	/// Return `true` when [`Self::len`] is zero.
	pub fn is_empty(&self) -> Result<bool> {
		Ok(self.len()? == 0)
	}

	/// Element `index` of an array; `None` past the end or on other kinds.
	pub fn element(&self, index: usize) -> Result<Option<ValueView<'a>>> {
		let Some(id) = self.node().element() else {
			return Ok(None);
		};
		let width = self.schema.node(id).width();
		let header = ArrayHeader::read(self.bytes)?;
		let payload = self.value.array_payload(header, width)?;
		if index as u64 >= header.size {
			return Ok(None);
		}
		let start = index * width;
		Ok(payload.get(start..start + width).map(|bytes| self.at(id, bytes)))
	}

	/// Element count of an array after checking its header against the payload.
	///
	/// Bounded by the payload length so zero-width elements cannot claim
	/// more items than a reservation can hold.
	pub(crate) fn checked_elements(&self) -> Result<usize> {
		let Some(id) = self.node().element() else {
			return Ok(0);
		};
		let width = self.schema.node(id).width();
		let header = ArrayHeader::read(self.bytes)?;
		let payload = self.value.array_payload(header, width)?;
		let size = usize::try_from(header.size).unwrap_or(usize::MAX);
		Ok(size.min(payload.len() / width.max(1)))
	}

	/// String payload bytes.
	pub fn as_bytes(&self) -> Result<&'a [u8]> {
		if self.kind() != SchemaKind::String {
			return Err(CodecError::TypeMismatch {
				expected: "string",
				got: self.kind().name(),
				at: 0,
			});
		}
		let header = ArrayHeader::read(self.bytes)?;
		self.value.array_payload(header, 1)
	}

	/// Integer value of an int node, if representable as `i64`.
	pub fn as_i64(&self) -> Option<i64> {
		match self.kind() {
			SchemaKind::SInt(_) => Some(sint_le(self.bytes)),
			SchemaKind::UInt(_) => i64::try_from(uint_le(self.bytes)).ok(),
			_ => None,
		}
	}

	/// Integer value of an int node, if non-negative.
	pub fn as_u64(&self) -> Option<u64> {
		match self.kind() {
			SchemaKind::UInt(_) => Some(uint_le(self.bytes)),
			SchemaKind::SInt(_) => u64::try_from(sint_le(self.bytes)).ok(),
			_ => None,
		}
	}

	/// Float value of a float node.
	pub fn as_f64(&self) -> Option<f64> {
		match self.kind() {
			SchemaKind::Float(_) => Some(float_le(self.bytes)),
			_ => None,
		}
	}

	/// Bool value of a bool node.
	pub fn as_bool(&self) -> Option<bool> {
		match self.kind() {
			SchemaKind::Bool => Some(self.bytes.first().is_some_and(|byte| *byte != 0)),
			_ => None,
		}
	}

	fn at(&self, id: NodeId, bytes: &'a [u8]) -> ValueView<'a> {
		ValueView {
			value: self.value,
			schema: self.schema,
			id,
			bytes,
		}
	}
}
