use crate::codec::{CodecError, Result};

/// Bounded cursor over a flat value region.
///
/// Tuple and map children are laid out back to back, as are array elements,
/// so walking a region in schema order is a sequence of `read_exact` calls.
pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub(crate) fn new(bytes: &'a [u8]) -> Self {
		Self { bytes, pos: 0 }
	}

	/// Return remaining unread bytes.
	pub(crate) fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance cursor.
	pub(crate) fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(CodecError::LayoutMismatch {
				expected: self.pos + n,
				got: self.bytes.len(),
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}
}

/// Split a mutable region into consecutive fields of the given widths.
pub(crate) fn split_fields<'a>(mut bytes: &'a mut [u8], widths: impl IntoIterator<Item = usize>) -> Vec<&'a mut [u8]> {
	let mut out = Vec::new();
	for width in widths {
		let mid = width.min(bytes.len());
		let (head, tail) = std::mem::take(&mut bytes).split_at_mut(mid);
		out.push(head);
		bytes = tail;
	}
	out
}

/// Decode a little-endian unsigned integer of 1 to 8 bytes.
pub(crate) fn uint_le(bytes: &[u8]) -> u64 {
	bytes.iter().rev().fold(0_u64, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Decode a little-endian two's-complement integer of 1 to 8 bytes.
pub(crate) fn sint_le(bytes: &[u8]) -> i64 {
	let raw = uint_le(bytes);
	let shift = 64 - 8 * bytes.len().clamp(1, 8) as u32;
	((raw << shift) as i64) >> shift
}

/// Decode a little-endian IEEE-754 float of 4 or 8 bytes.
pub(crate) fn float_le(bytes: &[u8]) -> f64 {
	if bytes.len() == 4 {
		f64::from(f32::from_bits(uint_le(bytes) as u32))
	} else {
		f64::from_bits(uint_le(bytes))
	}
}

/// Write the low `dst.len()` bytes of `value` little-endian.
pub(crate) fn put_uint_le(dst: &mut [u8], value: u64) {
	let bytes = value.to_le_bytes();
	let len = dst.len().min(bytes.len());
	dst[..len].copy_from_slice(&bytes[..len]);
}

/// Write `value` as a 4- or 8-byte little-endian float.
pub(crate) fn put_float_le(dst: &mut [u8], value: f64) {
	if dst.len() == 4 {
		put_uint_le(dst, u64::from((value as f32).to_bits()));
	} else {
		put_uint_le(dst, value.to_bits());
	}
}
