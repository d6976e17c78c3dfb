use crate::codec::bytes::{put_float_le, put_uint_le, split_fields};
use crate::codec::data::checked_int;
use crate::codec::value::zeroed;
use crate::codec::{
	ArrayHeader, CodecError, NodeId, ReadStep, Result, SchemaKind, SchemaTree, Token, TokenReader, Value, parse_schema,
};

/// How wire map keys are treated while unpacking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
	/// Each wire key must equal the schema key at the same position.
	#[default]
	Validate,
	/// Wire keys are read and ignored; fields are taken in schema order.
	Positional,
}

/// Options for [`unpack_with_options`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnpackOptions {
	/// Map key handling.
	pub key_policy: KeyPolicy,
	/// Reject bytes left after the root value.
	pub strict_trailing: bool,
	/// Largest single string or array payload to allocate.
	pub max_payload_bytes: usize,
}

impl Default for UnpackOptions {
	fn default() -> Self {
		Self {
			key_policy: KeyPolicy::default(),
			strict_trailing: true,
			max_payload_bytes: 1 << 30,
		}
	}
}

/// Parse `schema` and decode `bytes` with it.
pub fn unpack(bytes: &[u8], schema: &str) -> Result<Value> {
	let tree = parse_schema(schema)?;
	unpack_with_schema(bytes, &tree)
}

/// Decode `bytes` with a parsed schema and default options.
pub fn unpack_with_schema(bytes: &[u8], schema: &SchemaTree) -> Result<Value> {
	unpack_with_options(bytes, schema, &UnpackOptions::default())
}

/// Decode one MessagePack value laid out by `schema`.
///
/// Every failure discards the partially built value.
pub fn unpack_with_options(bytes: &[u8], schema: &SchemaTree, options: &UnpackOptions) -> Result<Value> {
	let root = schema.root_node();
	log::trace!("unpack {} bytes as {} root", bytes.len(), root.kind().name());

	let mut unpacker = Unpacker {
		input: bytes,
		reader: TokenReader::new(),
		schema,
		options,
		value: Value::default(),
	};
	let mut region = zeroed(root.width())?;
	unpacker.node(schema.root(), &mut region)?;

	let leftover = unpacker.input.len();
	if options.strict_trailing && leftover > 0 {
		return Err(CodecError::TrailingBytes { leftover });
	}

	let mut value = unpacker.value;
	value.set_root(region);
	log::trace!("unpack built {} payloads, {leftover} bytes unread", value.payloads().len());
	Ok(value)
}

struct Unpacker<'a, 'o> {
	input: &'a [u8],
	reader: TokenReader,
	schema: &'o SchemaTree,
	options: &'o UnpackOptions,
	value: Value,
}

impl<'a> Unpacker<'a, '_> {
	fn node(&mut self, id: NodeId, dst: &mut [u8]) -> Result<()> {
		let schema = self.schema;
		let node = schema.node(id);
		let kind = node.kind();
		let (token, at) = self.next()?;

		match (kind, token) {
			(SchemaKind::Nil, Token::Nil) => {}
			(SchemaKind::Bool, Token::Bool(flag)) => dst[0] = u8::from(flag),
			(SchemaKind::SInt(_) | SchemaKind::UInt(_), Token::UInt(number)) => {
				put_uint_le(dst, checked_int(kind, i128::from(number))?);
			}
			(SchemaKind::SInt(_) | SchemaKind::UInt(_), Token::SInt(number)) => {
				put_uint_le(dst, checked_int(kind, i128::from(number))?);
			}
			(SchemaKind::Float(_), Token::Float(number)) => put_float_le(dst, number),
			(SchemaKind::Float(_), Token::UInt(number)) => put_float_le(dst, number as f64),
			(SchemaKind::Float(_), Token::SInt(number)) => put_float_le(dst, number as f64),
			(SchemaKind::String, Token::Str(len) | Token::Bin(len)) => {
				let bytes = self.blob(len)?;
				let mut payload = self.alloc(bytes.len())?;
				payload.copy_from_slice(bytes);
				self.finish_payload(dst, bytes.len(), payload);
			}
			(SchemaKind::Array, Token::Array(count)) => {
				let count = count as usize;
				// Every element takes at least one wire byte.
				if count > self.input.len() {
					return Err(CodecError::Truncated {
						at: self.reader.position() + self.input.len(),
					});
				}
				let element = node.children()[0];
				let width = schema.node(element).width();
				let len = count
					.checked_mul(width)
					.ok_or(CodecError::Allocation { requested: usize::MAX })?;
				let mut payload = self.alloc(len)?;
				for slot in split_fields(&mut payload, std::iter::repeat_n(width, count)) {
					self.node(element, slot)?;
				}
				self.finish_payload(dst, count, payload);
			}
			(SchemaKind::Tuple, Token::Array(count)) => {
				expect_len(node.size(), count)?;
				let widths = node.children().iter().map(|child| schema.node(*child).width());
				for (child, slot) in node.children().iter().zip(split_fields(dst, widths)) {
					self.node(*child, slot)?;
				}
			}
			(SchemaKind::Map, Token::Map(count)) => {
				expect_len(node.size(), count)?;
				let widths = node.children().iter().map(|child| schema.node(*child).width());
				for ((key, child), slot) in node.keys().iter().zip(node.children()).zip(split_fields(dst, widths)) {
					self.key(key)?;
					self.node(*child, slot)?;
				}
			}
			(kind, token) => {
				return Err(CodecError::TypeMismatch {
					expected: kind.name(),
					got: token.kind_name(),
					at,
				});
			}
		}
		Ok(())
	}

	fn key(&mut self, expected: &str) -> Result<()> {
		let (token, at) = self.next()?;
		let wire = match token {
			Token::Str(len) | Token::Bin(len) => self.blob(len)?,
			other => {
				return Err(CodecError::TypeMismatch {
					expected: "str",
					got: other.kind_name(),
					at,
				});
			}
		};
		if self.options.key_policy == KeyPolicy::Validate && wire != expected.as_bytes() {
			return Err(CodecError::KeyMismatch {
				expected: expected.to_owned(),
				got: String::from_utf8_lossy(wire).into_owned(),
			});
		}
		Ok(())
	}

	fn next(&mut self) -> Result<(Token<'a>, usize)> {
		let at = self.reader.position();
		match self.reader.read(&mut self.input)? {
			ReadStep::Token(token) => Ok((token, at)),
			ReadStep::NeedMoreBytes => Err(CodecError::Truncated {
				at: self.reader.position(),
			}),
		}
	}

	fn blob(&mut self, len: u32) -> Result<&'a [u8]> {
		if len == 0 {
			return Ok(&[]);
		}
		match self.next()? {
			(Token::Chunk(bytes), _) if bytes.len() == len as usize => Ok(bytes),
			_ => Err(CodecError::Truncated {
				at: self.reader.position(),
			}),
		}
	}

	fn alloc(&self, len: usize) -> Result<Vec<u8>> {
		if len > self.options.max_payload_bytes {
			return Err(CodecError::Allocation { requested: len });
		}
		zeroed(len)
	}

	fn finish_payload(&mut self, dst: &mut [u8], size: usize, payload: Vec<u8>) {
		let header = ArrayHeader {
			size: size as u64,
			slot: self.value.push_payload(payload),
		};
		header.write(dst);
	}
}

fn expect_len(expected: usize, got: u32) -> Result<()> {
	if expected != got as usize {
		return Err(CodecError::LengthMismatch {
			expected,
			got: got as usize,
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests;
