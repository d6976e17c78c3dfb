use crate::codec::{CodecError, NodeId, Result, SchemaBuilder, SchemaKind, SchemaTree};

const DIGITS: &[u8; 64] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+/";

/// Parser limits for [`parse_schema_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaOptions {
	/// Deepest allowed nesting of composite nodes.
	pub max_depth: u32,
}

impl Default for SchemaOptions {
	fn default() -> Self {
		Self { max_depth: 64 }
	}
}

/// Parse a compact schema string with default limits.
pub fn parse_schema(schema: &str) -> Result<SchemaTree> {
	parse_schema_with(schema, &SchemaOptions::default())
}

/// Parse a compact schema string.
///
/// One character names each node; widths, arities and key lengths are a
/// single base-64 digit. The whole input must form exactly one schema.
pub fn parse_schema_with(schema: &str, options: &SchemaOptions) -> Result<SchemaTree> {
	let mut parser = Parser {
		schema,
		pos: 0,
		max_depth: options.max_depth,
		builder: SchemaBuilder::new(),
	};
	let root = parser.node(1)?;
	if parser.pos < schema.len() {
		return Err(CodecError::TrailingSchema { at: parser.pos });
	}

	let tree = parser.builder.finish(root);
	log::trace!("parsed schema {schema:?}: {} nodes, root width {}", tree.len(), tree.root_node().width());
	Ok(tree)
}

/// Value of one base-64 size digit (`0-9a-zA-Z+/`).
pub fn decode_digit(digit: char) -> Option<usize> {
	let byte = u8::try_from(digit).ok()?;
	DIGITS.iter().position(|candidate| *candidate == byte)
}

/// Base-64 digit for `value`, which must be below 64.
pub fn encode_digit(value: usize) -> Result<char> {
	DIGITS
		.get(value)
		.map(|byte| char::from(*byte))
		.ok_or(CodecError::SizeNotEncodable { size: value })
}

struct Parser<'a> {
	schema: &'a str,
	pos: usize,
	max_depth: u32,
	builder: SchemaBuilder,
}

impl<'a> Parser<'a> {
	fn node(&mut self, depth: u32) -> Result<NodeId> {
		let at = self.pos;
		let code = self.next_char()?;
		Ok(match code {
			'z' => self.builder.nil(),
			'b' => self.builder.bool(),
			's' => self.builder.string(),
			'i' | 'u' | 'f' => {
				let width_at = self.pos;
				let width = self.digit()?;
				self.builder.leaf(SchemaKind::scalar(code, width, width_at)?)
			}
			'a' => {
				self.check_depth(depth)?;
				let element = self.node(depth + 1)?;
				self.builder.array(element)
			}
			't' => {
				self.check_depth(depth)?;
				let size = self.digit()?;
				let mut children = Vec::with_capacity(size);
				for _ in 0..size {
					children.push(self.node(depth + 1)?);
				}
				self.builder.tuple(children)
			}
			'm' => {
				self.check_depth(depth)?;
				let size = self.digit()?;
				let mut fields = Vec::with_capacity(size);
				for _ in 0..size {
					let key_at = self.pos;
					let key = self.key()?;
					if fields.iter().any(|(seen, _)| *seen == key) {
						return Err(CodecError::DuplicateKey {
							key: key.to_owned(),
							at: key_at,
						});
					}
					let value = self.node(depth + 1)?;
					fields.push((key, value));
				}
				self.builder.map(fields)?
			}
			found => return Err(CodecError::UnknownType { found, at }),
		})
	}

	fn check_depth(&self, depth: u32) -> Result<()> {
		if depth > self.max_depth {
			return Err(CodecError::SchemaTooDeep { max_depth: self.max_depth });
		}
		Ok(())
	}

	fn next_char(&mut self) -> Result<char> {
		let Some(found) = self.schema[self.pos..].chars().next() else {
			return Err(CodecError::SchemaTruncated { at: self.pos });
		};
		self.pos += found.len_utf8();
		Ok(found)
	}

	fn digit(&mut self) -> Result<usize> {
		let at = self.pos;
		let found = self.next_char()?;
		decode_digit(found).ok_or(CodecError::InvalidDigit { found, at })
	}

	fn key(&mut self) -> Result<&'a str> {
		let len = self.digit()?;
		let at = self.pos;
		let end = at + len;
		if end > self.schema.len() {
			return Err(CodecError::SchemaTruncated { at: self.schema.len() });
		}
		let key = self.schema.get(at..end).ok_or(CodecError::InvalidKey { len, at })?;
		self.pos = end;
		Ok(key)
	}
}

#[cfg(test)]
mod tests;
