//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// One exact-wire fixture: a schema, a JSON value and its encoding.
#[derive(Debug, Clone, Deserialize)]
pub struct WireCase {
	/// Case label used in assertion messages.
	pub name: String,
	/// Compact schema string.
	pub schema: String,
	/// Value as JSON.
	pub value: serde_json::Value,
	/// Expected encoding as lowercase hex.
	pub wire: String,
}

impl WireCase {
	/// Decode [`Self::wire`] into bytes.
	pub fn wire_bytes(&self) -> Vec<u8> {
		decode_hex(&self.wire).unwrap_or_else(|| panic!("case {}: invalid hex {:?}", self.name, self.wire))
	}
}

/// Load every case from `fixtures/wire_cases.json`.
pub fn wire_cases() -> Vec<WireCase> {
	let path = fixture_path("wire_cases.json");
	let text = std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("read {}: {err}", path.display()));
	serde_json::from_str(&text).unwrap_or_else(|err| panic!("parse {}: {err}", path.display()))
}

/// Decode a hex string, ignoring ASCII whitespace.
pub fn decode_hex(text: &str) -> Option<Vec<u8>> {
	let digits: Vec<u8> = text.bytes().filter(|byte| !byte.is_ascii_whitespace()).collect();
	if digits.len() % 2 != 0 {
		return None;
	}
	digits
		.chunks(2)
		.map(|pair| {
			let hi = char::from(pair[0]).to_digit(16)?;
			let lo = char::from(pair[1]).to_digit(16)?;
			Some((hi * 16 + lo) as u8)
		})
		.collect()
}
