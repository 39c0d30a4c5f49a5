//! Shared core for the cbuf schema front-end and wire codec: descriptor
//! intermediate representation, decoded [`Value`] / [`Fields`] types, the
//! hash index and the bootstrap `cbufmsg::metadata` descriptor.

mod descriptor;
mod error;
mod metadata;
mod value;

pub use descriptor::{
    ArrayKind, DefaultValue, ElementDescriptor, ElementType, HashIndex, QualName, ScalarKind,
    Schema, StructDescriptor,
};
pub use error::WireError;
pub use metadata::{metadata_descriptor, METADATA_HASH};
pub use value::{Fields, TypedArray, Value};
