//! cbuf: a compact, C-memory-layout-oriented message schema and wire format.
//!
//! The crate ties the two halves of the codec together:
//!
//! - [`parse_schema`] turns cbuf IDL text into an immutable, insertion-ordered
//!   [`Schema`] of per-struct descriptors (content-hashed with the canonical
//!   64-bit DJB2 form).
//! - [`schema_to_hash_map`] derives the hash → descriptor index used to select
//!   a type from a framed record's header.
//! - [`deserialize_message`], [`serialize_message`] and
//!   [`serialized_message_size`] decode and encode framed records against
//!   those descriptors.
//!
//! Descriptors are read-only after the parse, so one schema/index pair can be
//! shared freely across threads. Decoded numeric arrays alias the input
//! buffer (refcounted through [`bytes::Bytes`]); everything else is owned.
//!
//! ```
//! use cbuf::{parse_schema, schema_to_hash_map, deserialize_message, serialize_message};
//!
//! let schema = parse_schema("namespace demo { struct ping { u32 seq; } }").unwrap();
//! let index = schema_to_hash_map(&schema).unwrap();
//!
//! let desc = schema.get_str("demo::ping").unwrap();
//! let mut message = cbuf::Fields::new();
//! message.set("seq", cbuf::Value::U32(7));
//! let record = cbuf::Record::for_descriptor(desc, message);
//!
//! let bytes = serialize_message(&schema, &index, &record).unwrap();
//! let decoded = deserialize_message(&schema, &index, &bytes, 0).unwrap();
//! assert_eq!(decoded.message.get("seq"), Some(&cbuf::Value::U32(7)));
//! ```

pub use cbuf_core::{
    metadata_descriptor, ArrayKind, DefaultValue, ElementDescriptor, ElementType, Fields,
    HashIndex, QualName, ScalarKind, Schema, StructDescriptor, TypedArray, Value, WireError,
    METADATA_HASH,
};
pub use cbuf_idl::parse_schema;
pub use cbuf_idl::SchemaError;
pub use cbuf_wire::{
    deserialize_message, serialize_message, serialized_message_size, Record, CBUF_MAGIC,
    PREAMBLE_SIZE,
};

/// Derive the hash → descriptor index from a schema map.
///
/// Fails with [`WireError::AmbiguousHash`] when two distinct descriptors
/// share a hash.
pub fn schema_to_hash_map(schema: &Schema) -> Result<HashIndex, WireError> {
    schema.hash_index()
}
