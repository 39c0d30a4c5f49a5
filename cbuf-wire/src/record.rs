//! The decoded (or to-be-encoded) framed record.

use cbuf_core::{Fields, StructDescriptor};

/// One framed cbuf record.
///
/// Produced by [`deserialize_message`](crate::deserialize_message); consumed
/// by [`serialize_message`](crate::serialize_message), which resolves the
/// descriptor through `hash_value` and recomputes `size` from the message.
/// `variant` distinguishes "variant bit clear" (`None`) from "variant bit
/// set" (`Some`, including `Some(0)`), which is what makes re-encoding
/// byte-exact.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Qualified name of the record's type.
    pub type_name: String,
    /// Total record length, header included, as declared on the wire.
    pub size: u32,
    pub variant: Option<u8>,
    pub hash_value: u64,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
    pub message: Fields,
}

impl Record {
    /// Build a record for a descriptor, ready to serialize.
    /// `size` is filled by the serializer; `timestamp` starts at zero.
    pub fn for_descriptor(desc: &StructDescriptor, message: Fields) -> Self {
        Self {
            type_name: desc.name.to_string(),
            size: 0,
            variant: None,
            hash_value: desc.hash_value,
            timestamp: 0.0,
            message,
        }
    }
}
