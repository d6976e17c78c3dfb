mod buffer;
mod bytes;
mod data;
mod error;
mod grammar;
mod pack;
mod schema;
mod token;
mod unpack;
mod value;

/// Growable output buffer used by the packer.
pub use buffer::{BufferOptions, DynamicBuffer};
/// Dynamic value tree and schema conformance check.
pub use data::{Data, Field};
/// Error and result aliases.
pub use error::{CodecError, Result};
/// Compact schema grammar entry points.
pub use grammar::{SchemaOptions, decode_digit, encode_digit, parse_schema, parse_schema_with};
/// Value-to-wire entry points and options.
pub use pack::{PackOptions, pack, pack_with_options, pack_with_schema};
/// Parsed schema representation and builder.
pub use schema::{NodeId, SchemaBuilder, SchemaKind, SchemaNode, SchemaTree};
/// Token-level MessagePack codec.
pub use token::{MAX_TOKEN_LEN, ReadStep, Token, TokenReader, TokenWriter, WriteStep};
/// Wire-to-value entry points and options.
pub use unpack::{KeyPolicy, UnpackOptions, unpack, unpack_with_options, unpack_with_schema};
/// Flat value storage and schema-driven accessors.
pub use value::{ArrayHeader, Value, ValueView};
