//! Size and shape analysis.
//!
//! For every struct: the exact wire size when it is statically known, the
//! per-element offsets while the prefix stays statically sized, and the
//! `simple` / `has_compact` classifications. Strings and dynamic arrays
//! make a size dynamic; compact arrays do too (their wire footprint
//! depends on the runtime count). Reference cycles are reported here.

use std::collections::HashMap;

use crate::{
    ast::{ElemType, Element, PrimType, SchemaAst, StructDef},
    error::SchemaError,
    resolver::{SymbolKind, SymbolTable},
};

/// Byte size of the framing preamble carried by non-naked structs.
pub const PREAMBLE_SIZE: u32 = 24;

/// Analysis result for one struct.
#[derive(Debug, Clone, PartialEq)]
pub struct StructLayout {
    /// Exact wire size including the preamble for non-naked structs, when
    /// statically known.
    pub fixed_size: Option<u32>,
    /// Offset of each element from the start of the record; `None` once a
    /// dynamically-sized element precedes it.
    pub elem_offsets: Vec<Option<u32>>,
    /// No strings, no dynamic arrays, and all nested structs simple.
    pub simple: bool,
    /// A compact array appears in this struct or any nested one.
    pub has_compact: bool,
}

pub type LayoutKey = (Option<String>, String);

#[derive(Debug, Default)]
pub struct LayoutMap {
    map: HashMap<LayoutKey, StructLayout>,
}

impl LayoutMap {
    pub fn get(&self, ns: Option<&str>, name: &str) -> Option<&StructLayout> {
        self.map.get(&(ns.map(str::to_string), name.to_string()))
    }
}

/// Analyze every struct in the AST.
pub fn analyze(ast: &SchemaAst, symbols: &SymbolTable) -> Result<LayoutMap, SchemaError> {
    let mut analyzer = Analyzer {
        ast,
        symbols,
        done: HashMap::new(),
        visiting: Vec::new(),
    };
    for space in ast.namespaces() {
        for st in &space.structs {
            analyzer.layout_of(space.name.as_deref(), st)?;
        }
    }
    Ok(LayoutMap { map: analyzer.done })
}

struct Analyzer<'a> {
    ast: &'a SchemaAst,
    symbols: &'a SymbolTable,
    done: HashMap<LayoutKey, StructLayout>,
    visiting: Vec<LayoutKey>,
}

fn find_struct<'a>(ast: &'a SchemaAst, ns: Option<&str>, name: &str) -> Option<&'a StructDef> {
    ast.namespaces()
        .find(|space| space.name.as_deref() == ns)?
        .structs
        .iter()
        .find(|st| st.name == name)
}

impl<'a> Analyzer<'a> {
    fn layout_of(&mut self, ns: Option<&str>, st: &StructDef) -> Result<StructLayout, SchemaError> {
        let key: LayoutKey = (ns.map(str::to_string), st.name.clone());
        if let Some(done) = self.done.get(&key) {
            return Ok(done.clone());
        }
        if self.visiting.contains(&key) {
            return Err(SchemaError::Size {
                name: qualified(ns, &st.name),
                detail: "struct reference cycle".to_string(),
            });
        }
        self.visiting.push(key.clone());

        let mut simple = true;
        let mut has_compact = false;
        let mut cursor = if st.naked { Some(0u32) } else { Some(PREAMBLE_SIZE) };
        let mut elem_offsets = Vec::with_capacity(st.elements.len());

        for element in &st.elements {
            elem_offsets.push(cursor);
            let shape = self.element_shape(ns, st, element)?;
            simple &= shape.simple;
            has_compact |= shape.has_compact;
            cursor = match (cursor, shape.fixed_size) {
                (Some(at), Some(size)) => at.checked_add(size),
                _ => None,
            };
        }

        self.visiting.pop();
        let layout = StructLayout {
            fixed_size: cursor,
            elem_offsets,
            simple,
            has_compact,
        };
        self.done.insert(key, layout.clone());
        Ok(layout)
    }

    fn element_shape(
        &mut self,
        ns: Option<&str>,
        st: &StructDef,
        element: &Element,
    ) -> Result<ElementShape, SchemaError> {
        let base = match &element.ty {
            ElemType::Prim(prim) => ElementShape {
                fixed_size: prim.wire_size(),
                simple: *prim != PrimType::String,
                has_compact: false,
            },
            ElemType::Custom { namespace, name } => {
                let found = self
                    .symbols
                    .resolve(namespace.as_deref(), ns, name)
                    .ok_or_else(|| SchemaError::Size {
                        name: qualified(ns, &st.name),
                        detail: format!("unknown type '{name}' on element '{}'", element.name),
                    })?;
                match found.kind {
                    SymbolKind::Enum => ElementShape {
                        fixed_size: Some(4),
                        simple: true,
                        has_compact: false,
                    },
                    SymbolKind::Struct => {
                        let ast = self.ast;
                        let inner = find_struct(ast, found.namespace.as_deref(), &found.name)
                            .ok_or_else(|| SchemaError::Size {
                                name: qualified(ns, &st.name),
                                detail: format!("missing struct '{}'", found.name),
                            })?;
                        let inner_layout = self.layout_of(found.namespace.as_deref(), inner)?;
                        ElementShape {
                            fixed_size: inner_layout.fixed_size,
                            simple: inner_layout.simple,
                            has_compact: inner_layout.has_compact,
                        }
                    }
                }
            }
        };

        let Some(suffix) = element.array else {
            return Ok(base);
        };
        if suffix.dynamic {
            return Ok(ElementShape {
                fixed_size: None,
                simple: false,
                has_compact: base.has_compact,
            });
        }
        if suffix.compact {
            return Ok(ElementShape {
                fixed_size: None,
                simple: base.simple,
                has_compact: true,
            });
        }
        Ok(ElementShape {
            fixed_size: base
                .fixed_size
                .and_then(|size| size.checked_mul(suffix.size)),
            simple: base.simple,
            has_compact: base.has_compact,
        })
    }
}

struct ElementShape {
    fixed_size: Option<u32>,
    simple: bool,
    has_compact: bool,
}

fn qualified(ns: Option<&str>, name: &str) -> String {
    match ns {
        Some(ns) => format!("{ns}::{name}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{lex::tokenize, parser::parse_tokens};

    fn analyzed(src: &str) -> (SchemaAst, LayoutMap) {
        let ast = parse_tokens(tokenize(src).expect("lex")).expect("parse");
        let symbols = SymbolTable::build(&ast);
        let layouts = analyze(&ast, &symbols).expect("analysis should succeed");
        (ast, layouts)
    }

    #[test]
    fn computes_offsets_behind_preamble() {
        let (_, layouts) = analyzed("struct t { u8 a; u32 b; f64 c; }\n");
        let layout = layouts.get(None, "t").expect("layout");
        assert_eq!(layout.elem_offsets, vec![Some(24), Some(25), Some(29)]);
        assert_eq!(layout.fixed_size, Some(37));
        assert!(layout.simple);
        assert!(!layout.has_compact);
    }

    #[test]
    fn naked_struct_offsets_start_at_zero() {
        let (_, layouts) = analyzed("struct t @naked { u16 a; u16 b[3]; }\n");
        let layout = layouts.get(None, "t").expect("layout");
        assert_eq!(layout.elem_offsets, vec![Some(0), Some(2)]);
        assert_eq!(layout.fixed_size, Some(8));
    }

    #[test]
    fn string_and_dynamic_array_make_size_dynamic() {
        let (_, layouts) = analyzed("struct t { string s; u8 tail; }\n");
        let layout = layouts.get(None, "t").expect("layout");
        assert_eq!(layout.fixed_size, None);
        assert_eq!(layout.elem_offsets, vec![Some(24), None]);
        assert!(!layout.simple);

        let (_, layouts) = analyzed("struct t { u8 v[]; }\n");
        assert!(!layouts.get(None, "t").unwrap().simple);
    }

    #[test]
    fn short_string_is_simple_and_fixed() {
        let (_, layouts) = analyzed("struct t @naked { short_string tag; }\n");
        let layout = layouts.get(None, "t").expect("layout");
        assert_eq!(layout.fixed_size, Some(16));
        assert!(layout.simple);
    }

    #[test]
    fn compact_arrays_propagate_through_nesting() {
        let (_, layouts) = analyzed(
            "struct inner @naked { u8 v[4] @compact; }\n\
             struct outer { inner i; }\n",
        );
        let inner = layouts.get(None, "inner").expect("inner");
        assert!(inner.has_compact && inner.simple);
        assert_eq!(inner.fixed_size, None);

        let outer = layouts.get(None, "outer").expect("outer");
        assert!(outer.has_compact);
    }

    #[test]
    fn nested_struct_sizes_include_their_preamble() {
        let (_, layouts) = analyzed(
            "struct inner { u8 v; }\n\
             struct outer { inner i; u8 after; }\n",
        );
        // inner: 24 + 1
        assert_eq!(layouts.get(None, "inner").unwrap().fixed_size, Some(25));
        let outer = layouts.get(None, "outer").expect("outer");
        assert_eq!(outer.fixed_size, Some(24 + 25 + 1));
        assert_eq!(outer.elem_offsets, vec![Some(24), Some(49)]);
    }

    #[test]
    fn reference_cycle_is_a_size_error() {
        let ast = parse_tokens(
            tokenize("struct a { b other; }\nstruct b { a other; }\n").expect("lex"),
        )
        .expect("parse");
        let symbols = SymbolTable::build(&ast);
        let err = analyze(&ast, &symbols).expect_err("cycle should fail");
        let SchemaError::Size { detail, .. } = err else {
            panic!("expected size error");
        };
        assert!(detail.contains("cycle"));
    }

    #[test]
    fn enum_elements_are_four_bytes_and_simple() {
        let (_, layouts) = analyzed("enum mode { A, B }\nstruct t @naked { mode m; }\n");
        let layout = layouts.get(None, "t").expect("layout");
        assert_eq!(layout.fixed_size, Some(4));
        assert!(layout.simple);
    }
}
