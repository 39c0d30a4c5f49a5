//! Symbol table: resolves custom type references across namespaces.
//!
//! Lookup rules: an explicit `ns::Name` resolves only inside `ns`; a bare
//! `Name` resolves inside the referencing struct's namespace first, then
//! the global namespace. Structs and enums share one name domain per
//! namespace (the parser already rejects duplicates).

use std::collections::HashMap;

use crate::{
    ast::{ElemType, Element, SchemaAst, StructDef},
    error::SchemaError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Struct,
    Enum,
}

/// Where a custom reference resolved: the defining namespace plus kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRef {
    pub kind: SymbolKind,
    pub namespace: Option<String>,
    pub name: String,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    map: HashMap<(Option<String>, String), SymbolKind>,
}

impl SymbolTable {
    pub fn build(ast: &SchemaAst) -> Self {
        let mut map = HashMap::new();
        for space in ast.namespaces() {
            for st in &space.structs {
                map.insert((space.name.clone(), st.name.clone()), SymbolKind::Struct);
            }
            for en in &space.enums {
                map.insert((space.name.clone(), en.name.clone()), SymbolKind::Enum);
            }
        }
        Self { map }
    }

    fn kind_in(&self, ns: Option<&str>, name: &str) -> Option<SymbolKind> {
        self.map
            .get(&(ns.map(str::to_string), name.to_string()))
            .copied()
    }

    /// Resolve an element's custom type reference from within `enclosing_ns`.
    pub fn resolve(
        &self,
        explicit_ns: Option<&str>,
        enclosing_ns: Option<&str>,
        name: &str,
    ) -> Option<ResolvedRef> {
        if let Some(ns) = explicit_ns {
            return self.kind_in(Some(ns), name).map(|kind| ResolvedRef {
                kind,
                namespace: Some(ns.to_string()),
                name: name.to_string(),
            });
        }
        if let Some(ns) = enclosing_ns {
            if let Some(kind) = self.kind_in(Some(ns), name) {
                return Some(ResolvedRef {
                    kind,
                    namespace: Some(ns.to_string()),
                    name: name.to_string(),
                });
            }
        }
        self.kind_in(None, name).map(|kind| ResolvedRef {
            kind,
            namespace: None,
            name: name.to_string(),
        })
    }

    /// Resolve an element reference or fail with a positioned diagnostic.
    pub fn resolve_element(
        &self,
        element: &Element,
        enclosing_ns: Option<&str>,
        enclosing_struct: &StructDef,
    ) -> Result<Option<ResolvedRef>, SchemaError> {
        let ElemType::Custom { namespace, name } = &element.ty else {
            return Ok(None);
        };
        match self.resolve(namespace.as_deref(), enclosing_ns, name) {
            Some(found) => Ok(Some(found)),
            None => {
                let written = match namespace {
                    Some(ns) => format!("{ns}::{name}"),
                    None => name.clone(),
                };
                Err(SchemaError::Resolve {
                    line: element.line,
                    column: element.column,
                    detail: format!(
                        "element '{}' of struct '{}' references unknown type '{written}'",
                        element.name, enclosing_struct.name
                    ),
                })
            }
        }
    }
}

/// Validate that every custom reference in the AST resolves.
pub fn check_references(ast: &SchemaAst, symbols: &SymbolTable) -> Result<(), SchemaError> {
    for space in ast.namespaces() {
        for st in &space.structs {
            for element in &st.elements {
                symbols.resolve_element(element, space.name.as_deref(), st)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::tokenize, parser::parse_tokens};

    fn ast(src: &str) -> SchemaAst {
        parse_tokens(tokenize(src).expect("lex")).expect("parse")
    }

    #[test]
    fn bare_reference_prefers_enclosing_namespace() {
        let schema = ast(
            "struct item { u8 v; }\n\
             namespace pack {\n  struct item { u16 v; }\n  struct holder { item it; }\n}\n",
        );
        let symbols = SymbolTable::build(&schema);
        let found = symbols.resolve(None, Some("pack"), "item").expect("resolve");
        assert_eq!(found.namespace.as_deref(), Some("pack"));
        assert_eq!(found.kind, SymbolKind::Struct);
    }

    #[test]
    fn bare_reference_falls_back_to_global() {
        let schema = ast(
            "enum level { LOW, HIGH }\n\
             namespace pack { struct holder { level l; } }\n",
        );
        let symbols = SymbolTable::build(&schema);
        let found = symbols.resolve(None, Some("pack"), "level").expect("resolve");
        assert_eq!(found.namespace, None);
        assert_eq!(found.kind, SymbolKind::Enum);
    }

    #[test]
    fn explicit_namespace_skips_fallback() {
        let schema = ast(
            "struct thing { u8 v; }\n\
             namespace pack { struct thing { u8 v; } }\n",
        );
        let symbols = SymbolTable::build(&schema);
        let found = symbols
            .resolve(Some("pack"), None, "thing")
            .expect("resolve");
        assert_eq!(found.namespace.as_deref(), Some("pack"));
        // An explicit qualifier never falls back to the global namespace.
        assert!(symbols.resolve(Some("other"), None, "thing").is_none());
    }

    #[test]
    fn unknown_reference_reports_position() {
        let schema = ast("struct holder {\n  missing m;\n}\n");
        let symbols = SymbolTable::build(&schema);
        let err = check_references(&schema, &symbols).expect_err("should fail");
        let SchemaError::Resolve { line, detail, .. } = err else {
            panic!("expected resolve error");
        };
        assert_eq!(line, 2);
        assert!(detail.contains("missing"));
    }
}
