//! Built-in descriptor for `cbufmsg::metadata`.
//!
//! Self-describing streams open with a metadata record whose `msg_meta`
//! field carries the schema text for the records that follow. The codec
//! falls back to this descriptor when the incoming hash matches and the
//! caller's index has no equivalent entry, so such streams decode from an
//! empty index.

use std::sync::{Arc, OnceLock};

use crate::descriptor::{
    ArrayKind, ElementDescriptor, ElementType, QualName, ScalarKind, StructDescriptor,
};

/// Canonical hash of `cbufmsg::metadata`.
pub const METADATA_HASH: u64 = 0xBE67_38D5_44AB_72C6;

/// The bootstrap descriptor, equivalent to parsing
/// `namespace cbufmsg { struct metadata { u64 msg_hash; string msg_name; string msg_meta; } }`.
pub fn metadata_descriptor() -> Arc<StructDescriptor> {
    static DESCRIPTOR: OnceLock<Arc<StructDescriptor>> = OnceLock::new();
    Arc::clone(DESCRIPTOR.get_or_init(build))
}

fn build() -> Arc<StructDescriptor> {
    let element = |name: &str, ty: ElementType, column: u32| ElementDescriptor {
        name: name.to_string(),
        ty,
        array: ArrayKind::Scalar,
        default_value: None,
        line: 1,
        column,
    };

    Arc::new(StructDescriptor {
        name: QualName::new(Some("cbufmsg"), "metadata"),
        hash_value: METADATA_HASH,
        line: 1,
        column: 1,
        naked: false,
        simple: false,
        has_compact: false,
        fixed_size: None,
        elements: vec![
            element("msg_hash", ElementType::Scalar(ScalarKind::U64), 1),
            element("msg_name", ElementType::String { upper_bound: None }, 2),
            element("msg_meta", ElementType::String { upper_bound: None }, 3),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_descriptor_shape() {
        let desc = metadata_descriptor();
        assert_eq!(desc.name.as_str(), "cbufmsg::metadata");
        assert_eq!(desc.hash_value, 0xBE67_38D5_44AB_72C6);
        assert!(!desc.naked);
        assert!(!desc.simple);

        let names: Vec<&str> = desc.elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["msg_hash", "msg_name", "msg_meta"]);
        assert_eq!(desc.elements[0].ty.type_name(), "uint64");
        assert_eq!(desc.elements[1].ty.type_name(), "string");
        assert!(!desc.elements[2].is_complex());
    }

    #[test]
    fn metadata_descriptor_is_shared() {
        let a = metadata_descriptor();
        let b = metadata_descriptor();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
