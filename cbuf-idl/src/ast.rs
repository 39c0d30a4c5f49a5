//! AST produced by the parser and consumed by resolution, layout, hashing
//! and descriptor emission.

use cbuf_core::ScalarKind;

/// Primitive cbuf types. `String` is length-prefixed on the wire,
/// `ShortString` a fixed 16-byte NUL-padded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimType {
    U8,
    U16,
    U32,
    U64,
    S8,
    S16,
    S32,
    S64,
    F32,
    F64,
    Bool,
    String,
    ShortString,
}

impl PrimType {
    /// Map a type identifier (`u8`, `uint8_t`, `float`, ...) to a primitive.
    pub fn from_ident(name: &str) -> Option<Self> {
        Some(match name {
            "u8" | "uint8_t" => Self::U8,
            "u16" | "uint16_t" => Self::U16,
            "u32" | "uint32_t" => Self::U32,
            "u64" | "uint64_t" => Self::U64,
            "s8" | "int8_t" => Self::S8,
            "s16" | "int16_t" => Self::S16,
            "s32" | "int32_t" => Self::S32,
            "s64" | "int64_t" => Self::S64,
            "f32" | "float" => Self::F32,
            "f64" | "double" => Self::F64,
            "bool" => Self::Bool,
            "string" => Self::String,
            "short_string" => Self::ShortString,
            _ => return None,
        })
    }

    /// C-style token used in the canonical hash text.
    pub fn canon_token(self) -> &'static str {
        match self {
            Self::U8 => "uint8_t",
            Self::U16 => "uint16_t",
            Self::U32 => "uint32_t",
            Self::U64 => "uint64_t",
            Self::S8 => "int8_t",
            Self::S16 => "int16_t",
            Self::S32 => "int32_t",
            Self::S64 => "int64_t",
            Self::F32 => "float",
            Self::F64 => "double",
            Self::String => "std::string",
            Self::ShortString => "VString<15>",
            Self::Bool => "bool",
        }
    }

    /// Fixed wire width, when the type has one.
    pub fn wire_size(self) -> Option<u32> {
        Some(match self {
            Self::U8 | Self::S8 | Self::Bool => 1,
            Self::U16 | Self::S16 => 2,
            Self::U32 | Self::S32 | Self::F32 => 4,
            Self::U64 | Self::S64 | Self::F64 => 8,
            Self::ShortString => 16,
            Self::String => return None,
        })
    }

    /// The scalar kind backing a typed array view, for numeric types.
    pub fn scalar_kind(self) -> Option<ScalarKind> {
        Some(match self {
            Self::U8 => ScalarKind::U8,
            Self::U16 => ScalarKind::U16,
            Self::U32 => ScalarKind::U32,
            Self::U64 => ScalarKind::U64,
            Self::S8 => ScalarKind::I8,
            Self::S16 => ScalarKind::I16,
            Self::S32 => ScalarKind::I32,
            Self::S64 => ScalarKind::I64,
            Self::F32 => ScalarKind::F32,
            Self::F64 => ScalarKind::F64,
            Self::Bool => ScalarKind::Bool,
            Self::String | Self::ShortString => return None,
        })
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
                | Self::S8
                | Self::S16
                | Self::S32
                | Self::S64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

/// The declared type of an element: primitive or a (possibly qualified)
/// custom reference resolved later by the symbol table.
#[derive(Debug, Clone, PartialEq)]
pub enum ElemType {
    Prim(PrimType),
    Custom {
        /// Explicit `ns::` qualifier, when the source wrote one.
        namespace: Option<String>,
        name: String,
    },
}

/// Array suffix on an element. `dynamic` for `[]`; `compact` when the
/// element carried `@compact` (fixed suffixes only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArraySuffix {
    /// Declared size; 0 for dynamic arrays.
    pub size: u32,
    pub dynamic: bool,
    pub compact: bool,
}

/// A default value already folded to the element's type.
#[derive(Debug, Clone, PartialEq)]
pub enum InitValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    /// `= { … }` initializer on an array element, normalized to empty.
    List,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    pub ty: ElemType,
    pub array: Option<ArraySuffix>,
    pub init: Option<InitValue>,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub naked: bool,
    pub elements: Vec<Element>,
    /// Position of the identifier following `struct`.
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumDef {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub line: u32,
    pub column: u32,
}

/// One namespace worth of declarations. `name == None` is the global
/// namespace.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NamespaceDef {
    pub name: Option<String>,
    pub structs: Vec<StructDef>,
    pub enums: Vec<EnumDef>,
}

/// The whole parsed schema: global declarations plus named namespaces in
/// source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaAst {
    pub global: NamespaceDef,
    pub spaces: Vec<NamespaceDef>,
}

impl SchemaAst {
    /// All namespaces, global first.
    pub fn namespaces(&self) -> impl Iterator<Item = &NamespaceDef> {
        std::iter::once(&self.global).chain(self.spaces.iter())
    }
}
