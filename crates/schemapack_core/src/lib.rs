//! Schema-driven MessagePack encoding for flat in-memory values.

/// Schema grammar, token codec, and the pack/unpack engines.
pub mod codec;
