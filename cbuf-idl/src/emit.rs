//! Projects the analyzed AST into the descriptor table.
//!
//! Insertion order is global-namespace structs first, then named namespaces
//! in source order, matching how the table is iterated downstream.

use cbuf_core::{
    ArrayKind, DefaultValue, ElementDescriptor, ElementType, QualName, Schema, StructDescriptor,
};

use crate::{
    ast::{ElemType, Element, InitValue, PrimType, SchemaAst, StructDef},
    error::SchemaError,
    hash::HashValues,
    layout::LayoutMap,
    resolver::{SymbolKind, SymbolTable},
};

/// Build the descriptor table for a fully analyzed AST.
pub fn emit(
    ast: &SchemaAst,
    symbols: &SymbolTable,
    layouts: &LayoutMap,
    hashes: &HashValues,
) -> Result<Schema, SchemaError> {
    let mut schema = Schema::new();
    for space in ast.namespaces() {
        let ns = space.name.as_deref();
        for st in &space.structs {
            schema.insert(emit_struct(ns, st, symbols, layouts, hashes)?);
        }
    }
    Ok(schema)
}

fn emit_struct(
    ns: Option<&str>,
    st: &StructDef,
    symbols: &SymbolTable,
    layouts: &LayoutMap,
    hashes: &HashValues,
) -> Result<StructDescriptor, SchemaError> {
    let layout = layouts.get(ns, &st.name).ok_or_else(|| SchemaError::Size {
        name: QualName::new(ns, &st.name).to_string(),
        detail: "layout missing".to_string(),
    })?;
    let hash_value = hashes
        .get(ns, &st.name)
        .ok_or_else(|| SchemaError::Size {
            name: QualName::new(ns, &st.name).to_string(),
            detail: "hash missing".to_string(),
        })?;

    let mut elements = Vec::with_capacity(st.elements.len());
    for element in st.elements.iter() {
        elements.push(emit_element(ns, st, element, symbols)?);
    }

    Ok(StructDescriptor {
        name: QualName::new(ns, &st.name),
        hash_value,
        line: st.line,
        column: st.column,
        naked: st.naked,
        simple: layout.simple,
        has_compact: layout.has_compact,
        fixed_size: layout.fixed_size,
        elements,
    })
}

fn emit_element(
    ns: Option<&str>,
    st: &StructDef,
    element: &Element,
    symbols: &SymbolTable,
) -> Result<ElementDescriptor, SchemaError> {
    let ty = match &element.ty {
        ElemType::Prim(PrimType::String) => ElementType::String { upper_bound: None },
        ElemType::Prim(PrimType::ShortString) => ElementType::String {
            upper_bound: Some(16),
        },
        ElemType::Prim(prim) => {
            let kind = prim.scalar_kind().expect("numeric primitive");
            ElementType::Scalar(kind)
        }
        ElemType::Custom { .. } => {
            let found = symbols
                .resolve_element(element, ns, st)?
                .expect("custom element resolves");
            match found.kind {
                SymbolKind::Enum => ElementType::Enum32,
                SymbolKind::Struct => {
                    ElementType::Struct(QualName::new(found.namespace.as_deref(), &found.name))
                }
            }
        }
    };

    let array = match element.array {
        None => ArrayKind::Scalar,
        Some(suffix) if suffix.dynamic => ArrayKind::Dynamic,
        Some(suffix) if suffix.compact => ArrayKind::Compact(suffix.size),
        Some(suffix) => ArrayKind::Fixed(suffix.size),
    };

    let default_value = element.init.as_ref().map(|init| match init {
        InitValue::Int(v) => DefaultValue::Int(*v),
        InitValue::UInt(v) => DefaultValue::UInt(*v),
        InitValue::Float(v) => DefaultValue::Float(*v),
        InitValue::Bool(v) => DefaultValue::Bool(*v),
        InitValue::Str(s) => DefaultValue::Str(s.clone()),
        InitValue::List => DefaultValue::EmptyList,
    });

    Ok(ElementDescriptor {
        name: element.name.clone(),
        ty,
        array,
        default_value,
        line: element.line,
        column: element.column,
    })
}
