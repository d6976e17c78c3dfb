use crate::codec::{CodecError, MAX_TOKEN_LEN, Result, Token, TokenWriter, WriteStep};

/// Growth parameters for [`DynamicBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferOptions {
	/// Capacity reserved up front.
	pub initial_capacity: usize,
	/// Fixed step used once doubling would pass `usize::MAX / 2`.
	pub growth_increment: usize,
}

impl Default for BufferOptions {
	fn default() -> Self {
		Self {
			initial_capacity: 4096,
			growth_increment: 4096,
		}
	}
}

/// Growable output buffer with a write cursor.
///
/// Capacity grows by doubling until the request fits. Bytes before the
/// cursor are never moved relative to each other and the cursor offset
/// survives every reallocation.
#[derive(Debug, Clone, Default)]
pub struct DynamicBuffer {
	// Initialized up to capacity; `len` is the write cursor.
	buf: Vec<u8>,
	len: usize,
	growth_increment: usize,
}

impl DynamicBuffer {
	/// Create an empty buffer with no reserved capacity.
	pub fn new() -> Self {
		Self {
			growth_increment: BufferOptions::default().growth_increment,
			..Self::default()
		}
	}

	/// Create a buffer reserving `options.initial_capacity` bytes.
	pub fn with_options(options: &BufferOptions) -> Result<Self> {
		let mut out = Self {
			buf: Vec::new(),
			len: 0,
			growth_increment: options.growth_increment.max(1),
		};
		out.resize_to(options.initial_capacity)?;
		Ok(out)
	}

	/// Make room for at least `additional` bytes past the cursor.
	pub fn ensure(&mut self, additional: usize) -> Result<()> {
		let required = self
			.len
			.checked_add(additional)
			.ok_or(CodecError::Allocation { requested: usize::MAX })?;
		if required <= self.buf.len() {
			return Ok(());
		}

		let mut target = self.buf.len().max(1);
		while target < required {
			target = if target > usize::MAX / 2 {
				required.max(target.saturating_add(self.growth_increment))
			} else {
				target * 2
			};
		}

		log::trace!("buffer grow {} -> {} (cursor {})", self.buf.len(), target, self.len);
		self.resize_to(target)
	}

	/// Copy `bytes` to the cursor, growing as needed.
	pub fn append(&mut self, bytes: &[u8]) -> Result<()> {
		self.ensure(bytes.len())?;
		self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
		self.len += bytes.len();
		Ok(())
	}

	/// Writable space between the cursor and the current capacity.
	pub fn spare_mut(&mut self) -> &mut [u8] {
		&mut self.buf[self.len..]
	}

	/// Advance the cursor over `n` bytes written through [`Self::spare_mut`].
	pub fn commit(&mut self, n: usize) {
		debug_assert!(n <= self.buf.len() - self.len);
		self.len = (self.len + n).min(self.buf.len());
	}

	/// Encode one token at the cursor, growing and resuming on short space.
	pub fn write_token(&mut self, writer: &mut TokenWriter, token: &Token<'_>) -> Result<()> {
		let need = match token {
			Token::Chunk(bytes) => bytes.len(),
			_ => MAX_TOKEN_LEN,
		};
		self.ensure(need)?;
		loop {
			let step = writer.write(self.spare_mut(), token)?;
			self.commit(step.written());
			match step {
				WriteStep::Done { .. } => return Ok(()),
				WriteStep::NeedMoreSpace { .. } => self.ensure(MAX_TOKEN_LEN)?,
			}
		}
	}

	/// Bytes written so far.
	pub fn as_slice(&self) -> &[u8] {
		&self.buf[..self.len]
	}

	/// Cursor offset.
	pub fn len(&self) -> usize {
		self.len
	}

	/// Return `true` when nothing has been written.
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Current capacity in bytes.
	pub fn capacity(&self) -> usize {
		self.buf.len()
	}

	/// Trim to the written length and hand out the bytes.
	pub fn finalize(mut self) -> Vec<u8> {
		self.buf.truncate(self.len);
		self.buf.shrink_to_fit();
		self.buf
	}

	fn resize_to(&mut self, target: usize) -> Result<()> {
		let additional = target.saturating_sub(self.buf.len());
		self.buf
			.try_reserve_exact(additional)
			.map_err(|_| CodecError::Allocation { requested: target })?;
		self.buf.resize(target, 0);
		Ok(())
	}
}

#[cfg(test)]
mod tests;
