use crate::codec::bytes::{Cursor, float_le, sint_le, uint_le};
use crate::codec::{
	ArrayHeader, BufferOptions, CodecError, DynamicBuffer, NodeId, Result, SchemaKind, SchemaTree, Token, TokenWriter, Value, parse_schema,
};

/// Options for [`pack_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PackOptions {
	/// Output buffer sizing.
	pub buffer: BufferOptions,
}

/// Parse `schema` and encode `value` with it.
pub fn pack(value: &Value, schema: &str) -> Result<Vec<u8>> {
	let tree = parse_schema(schema)?;
	pack_with_schema(value, &tree)
}

/// Encode `value` with a parsed schema and default options.
pub fn pack_with_schema(value: &Value, schema: &SchemaTree) -> Result<Vec<u8>> {
	pack_with_options(value, schema, &PackOptions::default())
}

/// Encode `value` as MessagePack following `schema`.
///
/// Map keys come from the schema; the value only carries field bytes.
/// On error the partially written output is dropped.
pub fn pack_with_options(value: &Value, schema: &SchemaTree, options: &PackOptions) -> Result<Vec<u8>> {
	let root = schema.root_node();
	if value.root().len() != root.width() {
		return Err(CodecError::LayoutMismatch {
			expected: root.width(),
			got: value.root().len(),
		});
	}

	log::trace!(
		"pack {} root ({} bytes inline, {} payloads)",
		root.kind().name(),
		root.width(),
		value.payloads().len()
	);

	let mut packer = Packer {
		value,
		schema,
		out: DynamicBuffer::with_options(&options.buffer)?,
		writer: TokenWriter::new(),
	};
	packer.node(schema.root(), value.root())?;

	log::trace!("pack wrote {} bytes", packer.out.len());
	Ok(packer.out.finalize())
}

struct Packer<'a> {
	value: &'a Value,
	schema: &'a SchemaTree,
	out: DynamicBuffer,
	writer: TokenWriter,
}

impl<'a> Packer<'a> {
	fn node(&mut self, id: NodeId, bytes: &'a [u8]) -> Result<()> {
		let schema = self.schema;
		let value = self.value;
		let node = schema.node(id);

		match node.kind() {
			SchemaKind::Nil => self.token(Token::Nil),
			SchemaKind::Bool => self.token(Token::Bool(bytes.first().is_some_and(|byte| *byte != 0))),
			SchemaKind::SInt(_) => self.token(Token::int(sint_le(bytes))),
			SchemaKind::UInt(_) => self.token(Token::UInt(uint_le(bytes))),
			SchemaKind::Float(_) => self.token(Token::Float(float_le(bytes))),
			SchemaKind::String => {
				let payload = value.array_payload(ArrayHeader::read(bytes)?, 1)?;
				self.token(Token::Str(wire_len(payload.len())?))?;
				self.token(Token::Chunk(payload))
			}
			SchemaKind::Array => {
				let element = node.children()[0];
				let width = schema.node(element).width();
				let header = ArrayHeader::read(bytes)?;
				let payload = value.array_payload(header, width)?;
				let count = usize::try_from(header.size).map_err(|_| CodecError::LengthOverflow { len: usize::MAX })?;
				self.token(Token::Array(wire_len(count)?))?;

				let mut cursor = Cursor::new(payload);
				for _ in 0..count {
					self.node(element, cursor.read_exact(width)?)?;
				}
				Ok(())
			}
			SchemaKind::Tuple => {
				self.token(Token::Array(wire_len(node.size())?))?;
				let mut cursor = Cursor::new(bytes);
				for child in node.children() {
					self.node(*child, cursor.read_exact(schema.node(*child).width())?)?;
				}
				Ok(())
			}
			SchemaKind::Map => {
				self.token(Token::Map(wire_len(node.size())?))?;
				let mut cursor = Cursor::new(bytes);
				for (key, child) in node.keys().iter().zip(node.children()) {
					self.token(Token::Str(wire_len(key.len())?))?;
					self.token(Token::Chunk(key.as_bytes()))?;
					self.node(*child, cursor.read_exact(schema.node(*child).width())?)?;
				}
				Ok(())
			}
		}
	}

	fn token(&mut self, token: Token<'_>) -> Result<()> {
		self.out.write_token(&mut self.writer, &token)
	}
}

fn wire_len(len: usize) -> Result<u32> {
	u32::try_from(len).map_err(|_| CodecError::LengthOverflow { len })
}
