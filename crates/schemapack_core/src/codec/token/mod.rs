use crate::codec::{CodecError, Result};

/// Longest encoded token header: a marker byte plus an 8-byte payload.
pub const MAX_TOKEN_LEN: usize = 9;

/// One MessagePack primitive unit.
///
/// `Chunk` only appears as the streamed payload of a preceding `Str`, `Bin`
/// or `Ext` header and borrows from the buffer it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Token<'a> {
	/// `nil`.
	Nil,
	/// `true` / `false`.
	Bool(bool),
	/// Non-negative integer of any wire width.
	UInt(u64),
	/// Negative integer of any wire width.
	SInt(i64),
	/// `float32` or `float64`, widened on read.
	Float(f64),
	/// Array header with element count.
	Array(u32),
	/// Map header with pair count.
	Map(u32),
	/// String header with byte length.
	Str(u32),
	/// Binary header with byte length.
	Bin(u32),
	/// Extension header.
	Ext {
		/// Application-defined type code.
		kind: i8,
		/// Payload byte length.
		len: u32,
	},
	/// Raw payload bytes of a str/bin/ext.
	Chunk(&'a [u8]),
}

impl Token<'_> {
	/// Build an integer token, choosing `UInt` for non-negative values.
	pub fn int(value: i64) -> Self {
		if value >= 0 { Token::UInt(value as u64) } else { Token::SInt(value) }
	}

	/// Stable lowercase label for diagnostics.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Token::Nil => "nil",
			Token::Bool(_) => "bool",
			Token::UInt(_) => "uint",
			Token::SInt(_) => "sint",
			Token::Float(_) => "float",
			Token::Array(_) => "array",
			Token::Map(_) => "map",
			Token::Str(_) => "str",
			Token::Bin(_) => "bin",
			Token::Ext { .. } => "ext",
			Token::Chunk(_) => "chunk",
		}
	}
}

/// Outcome of one [`TokenReader::read`] call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReadStep<'a> {
	/// A complete token was decoded.
	Token(Token<'a>),
	/// The input ran out mid-header; call again with more bytes.
	NeedMoreBytes,
}

/// Outcome of one [`TokenWriter::write`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
	/// The token was fully emitted.
	Done {
		/// Bytes written into the output slice by this call.
		written: usize,
	},
	/// The output slice filled up; grow it and retry with the same token.
	NeedMoreSpace {
		/// Bytes written into the output slice by this call.
		written: usize,
	},
}

impl WriteStep {
	/// Bytes written by the call, regardless of completion.
	pub fn written(self) -> usize {
		match self {
			Self::Done { written } | Self::NeedMoreSpace { written } => written,
		}
	}
}

/// Incremental MessagePack token decoder.
///
/// Holds at most one partially received header between calls and the
/// remaining byte count of a str/bin/ext payload being passed through.
#[derive(Debug, Clone, Default)]
pub struct TokenReader {
	pending: [u8; MAX_TOKEN_LEN],
	plen: usize,
	ppos: usize,
	passthrough: u32,
	consumed: usize,
}

impl TokenReader {
	/// Create a reader with no pending state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Total bytes consumed across all calls.
	pub fn position(&self) -> usize {
		self.consumed
	}

	/// Payload bytes still to be delivered as chunks.
	pub fn passthrough(&self) -> u32 {
		self.passthrough
	}

	/// Return `true` when no partial header or payload is outstanding.
	pub fn is_idle(&self) -> bool {
		self.plen == 0 && self.passthrough == 0
	}

	/// Decode one token from the front of `input`, advancing it past consumed bytes.
	pub fn read<'a>(&mut self, input: &mut &'a [u8]) -> Result<ReadStep<'a>> {
		if self.passthrough > 0 {
			if input.is_empty() {
				return Ok(ReadStep::NeedMoreBytes);
			}
			let take = input.len().min(self.passthrough as usize);
			let (chunk, rest) = input.split_at(take);
			*input = rest;
			self.passthrough -= take as u32;
			self.consumed += take;
			return Ok(ReadStep::Token(Token::Chunk(chunk)));
		}

		let token = if self.plen > 0 {
			let take = (self.plen - self.ppos).min(input.len());
			self.pending[self.ppos..self.ppos + take].copy_from_slice(&input[..take]);
			*input = &input[take..];
			self.ppos += take;
			self.consumed += take;
			if self.ppos < self.plen {
				return Ok(ReadStep::NeedMoreBytes);
			}

			let header = self.pending;
			let len = self.plen;
			self.plen = 0;
			self.ppos = 0;
			decode_header(&header[..len], self.consumed - len)?
		} else {
			let Some(&marker) = input.first() else {
				return Ok(ReadStep::NeedMoreBytes);
			};
			let at = self.consumed;
			let need = header_len(marker).ok_or(CodecError::InvalidMarker { marker, at })?;
			if input.len() < need {
				let have = input.len();
				self.pending[..have].copy_from_slice(*input);
				self.plen = need;
				self.ppos = have;
				self.consumed += have;
				*input = &input[have..];
				return Ok(ReadStep::NeedMoreBytes);
			}

			let (header, rest) = input.split_at(need);
			*input = rest;
			self.consumed += need;
			decode_header(header, at)?
		};

		if let Token::Str(len) | Token::Bin(len) | Token::Ext { len, .. } = token {
			self.passthrough = len;
		}
		Ok(ReadStep::Token(token))
	}
}

/// Incremental MessagePack token encoder.
///
/// A header that does not fit the output is staged in a 9-byte pending
/// buffer; a chunk that does not fit records how far it got.
#[derive(Debug, Clone, Default)]
pub struct TokenWriter {
	pending: [u8; MAX_TOKEN_LEN],
	plen: usize,
	ppos: usize,
	chunk_pos: usize,
}

impl TokenWriter {
	/// Create a writer with no pending state.
	pub fn new() -> Self {
		Self::default()
	}

	/// Return `true` when no partially written token is outstanding.
	pub fn is_idle(&self) -> bool {
		self.plen == 0 && self.chunk_pos == 0
	}

	/// Encode `token` into `out`.
	///
	/// After [`WriteStep::NeedMoreSpace`] the caller must pass the same token
	/// again with fresh output space; only the remainder is emitted.
	pub fn write(&mut self, out: &mut [u8], token: &Token<'_>) -> Result<WriteStep> {
		if let Token::Chunk(bytes) = token {
			let rest = bytes.get(self.chunk_pos..).unwrap_or_default();
			let count = rest.len().min(out.len());
			out[..count].copy_from_slice(&rest[..count]);
			if count == rest.len() {
				self.chunk_pos = 0;
				return Ok(WriteStep::Done { written: count });
			}
			self.chunk_pos += count;
			return Ok(WriteStep::NeedMoreSpace { written: count });
		}

		if self.plen == 0 {
			self.plen = encode_header(token, &mut self.pending);
			self.ppos = 0;
		}

		let count = (self.plen - self.ppos).min(out.len());
		out[..count].copy_from_slice(&self.pending[self.ppos..self.ppos + count]);
		self.ppos += count;
		if self.ppos < self.plen {
			return Ok(WriteStep::NeedMoreSpace { written: count });
		}

		self.plen = 0;
		self.ppos = 0;
		Ok(WriteStep::Done { written: count })
	}
}

/// Encode a complete token into a fresh vector.
#[cfg(test)]
pub(crate) fn encode_to_vec(token: &Token<'_>) -> Vec<u8> {
	if let Token::Chunk(bytes) = token {
		return bytes.to_vec();
	}
	let mut buf = [0_u8; MAX_TOKEN_LEN];
	let len = encode_header(token, &mut buf);
	buf[..len].to_vec()
}

fn header_len(marker: u8) -> Option<usize> {
	Some(match marker {
		0x00..=0xbf | 0xe0..=0xff => 1,
		0xc0 | 0xc2 | 0xc3 => 1,
		0xc1 => return None,
		0xc4 | 0xcc | 0xd0 | 0xd9 => 2,
		0xd4..=0xd8 => 2,
		0xc5 | 0xcd | 0xd1 | 0xda | 0xdc | 0xde => 3,
		0xc7 => 3,
		0xc8 => 4,
		0xc6 | 0xca | 0xce | 0xd2 | 0xdb | 0xdd | 0xdf => 5,
		0xc9 => 6,
		0xcb | 0xcf | 0xd3 => 9,
	})
}

fn decode_header(header: &[u8], at: usize) -> Result<Token<'static>> {
	let marker = header[0];
	let body = &header[1..];
	Ok(match marker {
		0x00..=0x7f => Token::UInt(u64::from(marker)),
		0x80..=0x8f => Token::Map(u32::from(marker & 0x0f)),
		0x90..=0x9f => Token::Array(u32::from(marker & 0x0f)),
		0xa0..=0xbf => Token::Str(u32::from(marker & 0x1f)),
		0xc0 => Token::Nil,
		0xc1 => return Err(CodecError::InvalidMarker { marker, at }),
		0xc2 => Token::Bool(false),
		0xc3 => Token::Bool(true),
		0xc4..=0xc6 => Token::Bin(be_u32(body)),
		0xc7..=0xc9 => {
			let (len, kind) = body.split_at(body.len() - 1);
			Token::Ext {
				kind: kind[0] as i8,
				len: be_u32(len),
			}
		}
		0xca => Token::Float(f64::from(f32::from_bits(be_u32(body)))),
		0xcb => Token::Float(f64::from_bits(be_u64(body))),
		0xcc..=0xcf => Token::UInt(be_u64(body)),
		0xd0 => Token::int(i64::from(body[0] as i8)),
		0xd1 => Token::int(i64::from(be_u64(body) as u16 as i16)),
		0xd2 => Token::int(i64::from(be_u64(body) as u32 as i32)),
		0xd3 => Token::int(be_u64(body) as i64),
		0xd4..=0xd8 => Token::Ext {
			kind: body[0] as i8,
			len: 1 << (marker - 0xd4),
		},
		0xd9..=0xdb => Token::Str(be_u32(body)),
		0xdc | 0xdd => Token::Array(be_u32(body)),
		0xde | 0xdf => Token::Map(be_u32(body)),
		0xe0..=0xff => Token::SInt(i64::from(marker as i8)),
	})
}

fn be_u32(bytes: &[u8]) -> u32 {
	bytes.iter().fold(0_u32, |acc, byte| (acc << 8) | u32::from(*byte))
}

fn be_u64(bytes: &[u8]) -> u64 {
	bytes.iter().fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

fn encode_header(token: &Token<'_>, buf: &mut [u8; MAX_TOKEN_LEN]) -> usize {
	match *token {
		Token::Nil => put(buf, 0xc0, &[]),
		Token::Bool(value) => put(buf, if value { 0xc3 } else { 0xc2 }, &[]),
		Token::UInt(value) => encode_uint(buf, value),
		Token::SInt(value) => encode_sint(buf, value),
		Token::Float(value) => {
			let single = value as f32;
			if f64::from(single) == value {
				put(buf, 0xca, &single.to_bits().to_be_bytes())
			} else {
				put(buf, 0xcb, &value.to_bits().to_be_bytes())
			}
		}
		Token::Array(len) => encode_container(buf, len, 0x90, 0xdc),
		Token::Map(len) => encode_container(buf, len, 0x80, 0xde),
		Token::Str(len) => match len {
			0..=0x1f => put(buf, 0xa0 | len as u8, &[]),
			0x20..=0xff => put(buf, 0xd9, &[len as u8]),
			0x100..=0xffff => put(buf, 0xda, &(len as u16).to_be_bytes()),
			_ => put(buf, 0xdb, &len.to_be_bytes()),
		},
		Token::Bin(len) => match len {
			0..=0xff => put(buf, 0xc4, &[len as u8]),
			0x100..=0xffff => put(buf, 0xc5, &(len as u16).to_be_bytes()),
			_ => put(buf, 0xc6, &len.to_be_bytes()),
		},
		Token::Ext { kind, len } => {
			let kind = kind as u8;
			match len {
				1 => put(buf, 0xd4, &[kind]),
				2 => put(buf, 0xd5, &[kind]),
				4 => put(buf, 0xd6, &[kind]),
				8 => put(buf, 0xd7, &[kind]),
				16 => put(buf, 0xd8, &[kind]),
				0..=0xff => put(buf, 0xc7, &[len as u8, kind]),
				0x100..=0xffff => {
					let [hi, lo] = (len as u16).to_be_bytes();
					put(buf, 0xc8, &[hi, lo, kind])
				}
				_ => {
					let [b0, b1, b2, b3] = len.to_be_bytes();
					put(buf, 0xc9, &[b0, b1, b2, b3, kind])
				}
			}
		}
		// Chunks carry no header.
		Token::Chunk(_) => 0,
	}
}

fn encode_uint(buf: &mut [u8; MAX_TOKEN_LEN], value: u64) -> usize {
	match value {
		0..=0x7f => put(buf, value as u8, &[]),
		0x80..=0xff => put(buf, 0xcc, &[value as u8]),
		0x100..=0xffff => put(buf, 0xcd, &(value as u16).to_be_bytes()),
		0x1_0000..=0xffff_ffff => put(buf, 0xce, &(value as u32).to_be_bytes()),
		_ => put(buf, 0xcf, &value.to_be_bytes()),
	}
}

fn encode_sint(buf: &mut [u8; MAX_TOKEN_LEN], value: i64) -> usize {
	match value {
		0..=i64::MAX => encode_uint(buf, value as u64),
		-32..=-1 => put(buf, value as u8, &[]),
		-128..=-33 => put(buf, 0xd0, &(value as i8).to_be_bytes()),
		-32_768..=-129 => put(buf, 0xd1, &(value as i16).to_be_bytes()),
		-2_147_483_648..=-32_769 => put(buf, 0xd2, &(value as i32).to_be_bytes()),
		_ => put(buf, 0xd3, &value.to_be_bytes()),
	}
}

fn encode_container(buf: &mut [u8; MAX_TOKEN_LEN], len: u32, fix: u8, marker16: u8) -> usize {
	match len {
		0..=0x0f => put(buf, fix | len as u8, &[]),
		0x10..=0xffff => put(buf, marker16, &(len as u16).to_be_bytes()),
		_ => put(buf, marker16 + 1, &len.to_be_bytes()),
	}
}

fn put(buf: &mut [u8; MAX_TOKEN_LEN], marker: u8, body: &[u8]) -> usize {
	buf[0] = marker;
	buf[1..=body.len()].copy_from_slice(body);
	body.len() + 1
}
