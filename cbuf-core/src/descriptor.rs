//! Language-neutral descriptor model produced by the schema front-end and
//! consumed by the wire codec.
//!
//! Descriptors are immutable once a parse completes. The [`Schema`] map keeps
//! insertion order (global-namespace structs first, then named namespaces in
//! source order) and shares descriptors with the derived [`HashIndex`]
//! through `Arc`, so decoders and encoders on different threads can use both
//! without synchronization.

use std::{collections::HashMap, fmt, sync::Arc};

use indexmap::IndexMap;

use crate::{error::WireError, metadata};

/// A `namespace::name` pair, or a bare `name` for the global namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualName(String);

impl QualName {
    pub fn new(namespace: Option<&str>, name: &str) -> Self {
        match namespace {
            Some(ns) => Self(format!("{ns}::{name}")),
            None => Self(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The namespace segment, or `None` for the global namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.0.rsplit_once("::").map(|(ns, _)| ns)
    }

    /// The unqualified trailing name.
    pub fn leaf(&self) -> &str {
        self.0.rsplit_once("::").map_or(&self.0, |(_, leaf)| leaf)
    }
}

impl fmt::Display for QualName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualName {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for QualName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Fixed-width scalar kinds that can back a contiguous typed array view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl ScalarKind {
    /// Wire width in bytes. `bool` is one byte; everything else its natural size.
    pub fn wire_size(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Canonical emitted type name (`uint8`, `int32`, `float64`, ...).
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::U8 => "uint8",
            Self::U16 => "uint16",
            Self::U32 => "uint32",
            Self::U64 => "uint64",
            Self::I8 => "int8",
            Self::I16 => "int16",
            Self::I32 => "int32",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

/// The resolved type of one struct element.
#[derive(Debug, Clone, PartialEq)]
pub enum ElementType {
    Scalar(ScalarKind),
    /// UTF-8 string. `upper_bound` is set for fixed-size strings
    /// (`short_string` parses to `Some(16)`); `None` is length-prefixed.
    String { upper_bound: Option<u32> },
    /// Enum-typed element; a 32-bit signed integer on the wire.
    Enum32,
    /// Reference to another struct descriptor, by qualified name.
    Struct(QualName),
}

impl ElementType {
    /// True iff the element references a user struct (not an enum).
    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Struct(_))
    }

    /// Canonical emitted type string: primitive name, `int32` for enums,
    /// `string` for both string flavors, or the qualified struct name.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Scalar(kind) => kind.type_name(),
            Self::String { .. } => "string",
            Self::Enum32 => "int32",
            Self::Struct(name) => name.as_str(),
        }
    }
}

/// Array classification of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    /// Not an array.
    Scalar,
    /// `[N]`: exactly N elements on the wire, no count prefix.
    Fixed(u32),
    /// `[N] @compact`: u32 count prefix, at most N elements.
    Compact(u32),
    /// `[]`: u32 count prefix, unbounded.
    Dynamic,
}

impl ArrayKind {
    pub fn is_array(self) -> bool {
        !matches!(self, Self::Scalar)
    }

    /// Declared capacity for fixed and compact arrays.
    pub fn declared_len(self) -> Option<u32> {
        match self {
            Self::Fixed(n) | Self::Compact(n) => Some(n),
            _ => None,
        }
    }
}

/// A default value explicitly written in the schema, folded to the element's type.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// Array initializer lists are accepted by the grammar and normalized
    /// to an empty list.
    EmptyList,
}

/// One field of a struct descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementDescriptor {
    pub name: String,
    pub ty: ElementType,
    pub array: ArrayKind,
    /// Present only when the schema wrote an explicit `= EXPR`.
    pub default_value: Option<DefaultValue>,
    pub line: u32,
    pub column: u32,
}

impl ElementDescriptor {
    pub fn is_complex(&self) -> bool {
        self.ty.is_complex()
    }
}

/// The per-struct shape produced by one schema parse.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub name: QualName,
    /// Canonical 64-bit content hash; identifies the type on the wire.
    pub hash_value: u64,
    /// Source position of the identifier following `struct`.
    pub line: u32,
    pub column: u32,
    /// Naked structs carry no framing header, at top level or nested.
    pub naked: bool,
    /// No strings, no dynamic arrays, and every nested struct simple.
    pub simple: bool,
    /// Any element (transitively) is a compact array.
    pub has_compact: bool,
    /// Exact wire size when statically known: no dynamic string, dynamic
    /// array or compact array anywhere in the struct. Includes the 24-byte
    /// preamble for non-naked structs.
    pub fixed_size: Option<u32>,
    pub elements: Vec<ElementDescriptor>,
}

/// Insertion-ordered descriptor table keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    map: IndexMap<QualName, Arc<StructDescriptor>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor under its qualified name, preserving insertion order.
    pub fn insert(&mut self, desc: StructDescriptor) {
        self.map.insert(desc.name.clone(), Arc::new(desc));
    }

    pub fn get(&self, name: &QualName) -> Option<&Arc<StructDescriptor>> {
        self.map.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&Arc<StructDescriptor>> {
        self.map.get(&QualName::from(name))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&QualName, &Arc<StructDescriptor>)> {
        self.map.iter()
    }

    /// Build the secondary hash → descriptor index.
    ///
    /// Two structurally equal descriptors under the same hash collapse into
    /// one entry; distinct descriptors sharing a hash are a schema error.
    pub fn hash_index(&self) -> Result<HashIndex, WireError> {
        let mut map: HashMap<u64, Arc<StructDescriptor>> = HashMap::with_capacity(self.map.len());
        for desc in self.map.values() {
            if let Some(prev) = map.get(&desc.hash_value) {
                if prev.as_ref() != desc.as_ref() {
                    return Err(WireError::AmbiguousHash {
                        hash: desc.hash_value,
                        first: prev.name.to_string(),
                        second: desc.name.to_string(),
                    });
                }
                continue;
            }
            map.insert(desc.hash_value, Arc::clone(desc));
        }
        Ok(HashIndex { map })
    }
}

impl<'a> IntoIterator for &'a Schema {
    type Item = (&'a QualName, &'a Arc<StructDescriptor>);
    type IntoIter = indexmap::map::Iter<'a, QualName, Arc<StructDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

/// Hash → descriptor index derived from a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct HashIndex {
    map: HashMap<u64, Arc<StructDescriptor>>,
}

impl HashIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, hash: u64) -> Option<&Arc<StructDescriptor>> {
        self.map.get(&hash)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Look up a hash, falling back to the built-in `cbufmsg::metadata`
    /// descriptor so self-describing streams can bootstrap from an empty index.
    pub fn resolve(&self, hash: u64) -> Result<Arc<StructDescriptor>, WireError> {
        if let Some(desc) = self.map.get(&hash) {
            return Ok(Arc::clone(desc));
        }
        if hash == metadata::METADATA_HASH {
            return Ok(metadata::metadata_descriptor());
        }
        Err(WireError::UnknownHash { hash })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desc(name: &str, hash: u64) -> StructDescriptor {
        StructDescriptor {
            name: QualName::from(name),
            hash_value: hash,
            line: 1,
            column: 1,
            naked: false,
            simple: true,
            has_compact: false,
            fixed_size: Some(24),
            elements: Vec::new(),
        }
    }

    #[test]
    fn schema_iterates_in_insertion_order() {
        let mut schema = Schema::new();
        schema.insert(desc("zeta", 1));
        schema.insert(desc("ns::alpha", 2));
        schema.insert(desc("beta", 3));

        let names: Vec<&str> = schema.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["zeta", "ns::alpha", "beta"]);
    }

    #[test]
    fn hash_index_rejects_distinct_descriptors_with_equal_hash() {
        let mut schema = Schema::new();
        schema.insert(desc("a", 7));
        let mut other = desc("b", 7);
        other.naked = true;
        schema.insert(other);

        let err = schema.hash_index().expect_err("duplicate hash should fail");
        assert!(matches!(err, WireError::AmbiguousHash { hash: 7, .. }));
    }

    #[test]
    fn hash_index_falls_back_to_metadata() {
        let index = Schema::new().hash_index().expect("empty schema");
        let meta = index
            .resolve(metadata::METADATA_HASH)
            .expect("metadata fallback");
        assert_eq!(meta.name.as_str(), "cbufmsg::metadata");
        assert!(matches!(
            index.resolve(0xDEAD),
            Err(WireError::UnknownHash { hash: 0xDEAD })
        ));
    }

    #[test]
    fn qual_name_splits_namespace_and_leaf() {
        let q = QualName::new(Some("sensors"), "Frame");
        assert_eq!(q.as_str(), "sensors::Frame");
        assert_eq!(q.namespace(), Some("sensors"));
        assert_eq!(q.leaf(), "Frame");

        let g = QualName::new(None, "Health");
        assert_eq!(g.namespace(), None);
        assert_eq!(g.leaf(), "Health");
    }
}
