//! Binary wire codec for cbuf records.
//!
//! Framed records open with a 24-byte preamble (magic, size/variant word,
//! type hash, timestamp); naked records are payload only. Everything on the
//! wire is little-endian and packed at natural widths with no padding.
//! Decoding is zero-copy for numeric arrays; serializing a decoded record
//! reproduces the source bytes exactly when the variant flag and timestamp
//! are preserved.

mod decode;
mod encode;
mod frame;
mod record;

pub use decode::deserialize_message;
pub use encode::{serialize_message, serialized_message_size};
pub use frame::{pack_size_and_variant, unpack_size_and_variant, Preamble, CBUF_MAGIC, PREAMBLE_SIZE};
pub use record::Record;
