use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;

use crate::codec::{BufferOptions, CodecError, DynamicBuffer, Token, TokenWriter};

fn digest(bytes: &[u8]) -> u64 {
	let mut hasher = DefaultHasher::new();
	bytes.hash(&mut hasher);
	hasher.finish()
}

fn small(initial_capacity: usize) -> DynamicBuffer {
	DynamicBuffer::with_options(&BufferOptions {
		initial_capacity,
		growth_increment: 16,
	})
	.expect("small buffer")
}

#[test]
fn growth_preserves_written_bytes() {
	let mut buffer = small(8);
	buffer.append(b"abcdefgh").expect("fill");
	assert_eq!(buffer.capacity(), 8);
	let before = digest(buffer.as_slice());

	buffer.ensure(1).expect("grow");
	assert_eq!(buffer.capacity(), 16);
	assert_eq!(buffer.len(), 8);
	assert_eq!(digest(buffer.as_slice()), before);

	buffer.append(b"ij").expect("append after growth");
	assert_eq!(buffer.as_slice(), b"abcdefghij");
}

#[test]
fn doubling_repeats_until_request_fits() {
	let mut buffer = small(4);
	buffer.ensure(33).expect("grow");
	assert_eq!(buffer.capacity(), 64);

	let mut empty = DynamicBuffer::new();
	assert_eq!(empty.capacity(), 0);
	empty.ensure(3).expect("grow from zero");
	assert_eq!(empty.capacity(), 4);
}

#[test]
fn ensure_within_capacity_does_not_reallocate() {
	let mut buffer = small(32);
	buffer.append(&[1; 10]).expect("append");
	buffer.ensure(22).expect("fits");
	assert_eq!(buffer.capacity(), 32);
}

#[test]
fn impossible_request_is_an_allocation_error() {
	let mut buffer = DynamicBuffer::new();
	let err = buffer.ensure(usize::MAX).expect_err("cannot allocate");
	assert_eq!(err, CodecError::Allocation { requested: usize::MAX });
	assert!(buffer.is_empty());
}

#[test]
fn cursor_overflow_is_an_allocation_error() {
	let mut buffer = small(4);
	buffer.append(b"x").expect("append");
	let err = buffer.ensure(usize::MAX).expect_err("overflows cursor");
	assert!(matches!(err, CodecError::Allocation { .. }));
	assert_eq!(buffer.as_slice(), b"x");
}

#[test]
fn spare_and_commit_advance_cursor() {
	let mut buffer = small(4);
	buffer.spare_mut()[..2].copy_from_slice(&[7, 8]);
	buffer.commit(2);
	assert_eq!(buffer.as_slice(), &[7, 8]);
	assert_eq!(buffer.spare_mut().len(), 2);
}

#[test]
fn write_token_grows_through_partial_writes() {
	let mut buffer = small(1);
	let mut writer = TokenWriter::new();
	buffer.write_token(&mut writer, &Token::Nil).expect("nil");
	buffer.write_token(&mut writer, &Token::UInt(u64::MAX)).expect("uint64");
	buffer.write_token(&mut writer, &Token::Str(3)).expect("str header");
	buffer.write_token(&mut writer, &Token::Chunk(b"abc")).expect("chunk");

	let mut expected = vec![0xc0, 0xcf];
	expected.extend_from_slice(&[0xff; 8]);
	expected.extend_from_slice(&[0xa3, b'a', b'b', b'c']);
	assert_eq!(buffer.as_slice(), expected.as_slice());
	assert!(writer.is_idle());
}

#[test]
fn finalize_trims_to_used_length() {
	let mut buffer = DynamicBuffer::with_options(&BufferOptions::default()).expect("default buffer");
	assert_eq!(buffer.capacity(), 4096);
	buffer.append(b"hello").expect("append");
	let bytes = buffer.finalize();
	assert_eq!(bytes, b"hello");
}

proptest! {
	#[test]
	fn appends_concatenate_across_growth(
		initial in 0_usize..8,
		parts in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..40), 0..20),
	) {
		let mut buffer = small(initial);
		let mut expected = Vec::new();
		for part in &parts {
			let prefix = digest(buffer.as_slice());
			buffer.append(part).expect("append");
			prop_assert_eq!(digest(&buffer.as_slice()[..expected.len()]), prefix);
			expected.extend_from_slice(part);
		}
		prop_assert!(buffer.capacity() >= expected.len());
		prop_assert_eq!(buffer.finalize(), expected);
	}
}
