use thiserror::Error;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors produced while parsing schemas, packing values, and unpacking wire bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
	/// Leading schema character does not name a type.
	#[error("unknown schema type {found:?} at offset {at}")]
	UnknownType {
		/// Offending character.
		found: char,
		/// Byte offset in the schema string.
		at: usize,
	},
	/// Width operand is not allowed for the given type.
	#[error("invalid {kind} width {width} at offset {at}")]
	InvalidWidth {
		/// Type family (`sint`, `uint`, `float`).
		kind: &'static str,
		/// Decoded width operand.
		width: usize,
		/// Byte offset of the operand.
		at: usize,
	},
	/// Operand character is outside the base-64 digit alphabet.
	#[error("invalid size digit {found:?} at offset {at}")]
	InvalidDigit {
		/// Offending character.
		found: char,
		/// Byte offset in the schema string.
		at: usize,
	},
	/// Schema string ended before the current node was complete.
	#[error("schema truncated at offset {at}")]
	SchemaTruncated {
		/// Offset where more input was expected.
		at: usize,
	},
	/// Map key bytes do not fall on UTF-8 character boundaries.
	#[error("invalid map key of {len} bytes at offset {at}")]
	InvalidKey {
		/// Declared key length.
		len: usize,
		/// Byte offset of the key.
		at: usize,
	},
	/// Map declares the same key twice.
	#[error("duplicate map key {key:?} at {at}")]
	DuplicateKey {
		/// Repeated key.
		key: String,
		/// Offset of the key's length digit when parsing, field position when building.
		at: usize,
	},
	/// Characters remained after a complete schema.
	#[error("trailing schema input at offset {at}")]
	TrailingSchema {
		/// Offset of the first unconsumed character.
		at: usize,
	},
	/// Schema nesting exceeded the configured limit.
	#[error("schema nesting exceeded (max={max_depth})")]
	SchemaTooDeep {
		/// Configured depth ceiling.
		max_depth: u32,
	},
	/// Arity or key length cannot be written as a single schema digit.
	#[error("size {size} cannot be encoded as a schema digit (max 63)")]
	SizeNotEncodable {
		/// Value that did not fit.
		size: usize,
	},
	/// Reserved or unknown MessagePack marker byte.
	#[error("invalid msgpack marker 0x{marker:02x} at offset {at}")]
	InvalidMarker {
		/// Marker byte.
		marker: u8,
		/// Byte offset in the input.
		at: usize,
	},
	/// Input ended in the middle of a value.
	#[error("truncated input at offset {at}")]
	Truncated {
		/// Offset where more bytes were required.
		at: usize,
	},
	/// Bytes remained after the root value was decoded.
	#[error("trailing bytes after value: leftover={leftover}")]
	TrailingBytes {
		/// Unconsumed byte count.
		leftover: usize,
	},
	/// Wire token kind disagrees with the schema node.
	#[error("type mismatch at offset {at}: expected {expected}, got {got}")]
	TypeMismatch {
		/// Schema-side kind.
		expected: &'static str,
		/// Token or data kind actually found.
		got: &'static str,
		/// Byte offset of the token (0 for in-memory conversions).
		at: usize,
	},
	/// Container arity disagrees with the schema node.
	#[error("length mismatch: expected {expected}, got {got}")]
	LengthMismatch {
		/// Arity required by the schema.
		expected: usize,
		/// Arity found.
		got: usize,
	},
	/// Map key on the wire differs from the schema key at the same position.
	#[error("map key mismatch: expected {expected:?}, got {got:?}")]
	KeyMismatch {
		/// Schema-declared key.
		expected: String,
		/// Key read from the wire (lossy UTF-8).
		got: String,
	},
	/// Dynamic map value lacks a schema-declared key.
	#[error("missing map field {key:?}")]
	MissingField {
		/// Schema-declared key.
		key: String,
	},
	/// Integer does not fit the declared width or signedness.
	#[error("integer {value} out of range for {kind}", kind = int_kind(.signed, .width))]
	IntegerRange {
		/// Offending value.
		value: i128,
		/// Declared byte width.
		width: u8,
		/// Whether the target is signed.
		signed: bool,
	},
	/// Memory for a buffer or payload could not be reserved.
	#[error("allocation of {requested} bytes failed")]
	Allocation {
		/// Requested byte count.
		requested: usize,
	},
	/// Flat value region has the wrong size for its schema node.
	#[error("value layout mismatch: expected {expected} bytes, got {got}")]
	LayoutMismatch {
		/// Width required by the schema.
		expected: usize,
		/// Bytes supplied.
		got: usize,
	},
	/// Array header points at a payload slot that does not exist.
	#[error("array header references missing payload slot {slot}")]
	MissingPayload {
		/// Referenced slot.
		slot: u64,
	},
	/// Payload length disagrees with `size * element_width`.
	#[error("payload size mismatch: expected {expected} bytes, got {got}")]
	PayloadSizeMismatch {
		/// Required byte length.
		expected: usize,
		/// Actual payload length.
		got: usize,
	},
	/// Length does not fit a 32-bit MessagePack length field.
	#[error("length {len} exceeds the msgpack 32-bit limit")]
	LengthOverflow {
		/// Offending length.
		len: usize,
	},
}

fn int_kind(signed: &bool, width: &u8) -> String {
	let prefix = if *signed { 'i' } else { 'u' };
	format!("{prefix}{}", u32::from(*width) * 8)
}
