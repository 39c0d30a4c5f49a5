//! Error type for the schema front-end.

/// Error produced while turning schema text into a descriptor table.
///
/// Each variant corresponds to one front-end stage. `Display` renders a
/// single human-readable diagnostic with line/column where available,
/// which is the whole error contract of [`parse_schema`](crate::parse_schema).
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    /// Unknown token, unterminated comment or string, bad numeric literal.
    #[error("lex error at {line}:{column}: {detail}")]
    Lex { line: u32, column: u32, detail: String },

    /// Grammar violation, unknown annotation, duplicate name,
    /// multidimensional array.
    #[error("parse error at {line}:{column}: {detail}")]
    Parse { line: u32, column: u32, detail: String },

    /// An element references a type that no namespace defines.
    #[error("unresolved type at {line}:{column}: {detail}")]
    Resolve { line: u32, column: u32, detail: String },

    /// A default value or array size is not a foldable constant or lies
    /// outside the target type's range.
    #[error("constant evaluation failed at {line}:{column}: {detail}")]
    Eval { line: u32, column: u32, detail: String },

    /// Size or hash analysis failed (type cycles, unknown nested type).
    #[error("size analysis failed for '{name}': {detail}")]
    Size { name: String, detail: String },
}

impl SchemaError {
    pub(crate) fn lex(line: u32, column: u32, detail: impl Into<String>) -> Self {
        Self::Lex {
            line,
            column,
            detail: detail.into(),
        }
    }

    pub(crate) fn parse(line: u32, column: u32, detail: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            detail: detail.into(),
        }
    }

    pub(crate) fn eval(line: u32, column: u32, detail: impl Into<String>) -> Self {
        Self::Eval {
            line,
            column,
            detail: detail.into(),
        }
    }
}
