//! Canonical content hashing.
//!
//! Each struct is rendered to a canonical textual form and hashed with
//! 64-bit wrapping DJB2. The form is byte-compatible with the original
//! implementation, spacing quirks included: primitive lines end in `"; \n"`
//! while struct- and enum-typed lines end in `";\n"`, and the header line
//! carries a space before its newline. Nested struct references embed the
//! referenced struct's hash in uppercase hex, so hashing is depth-first
//! and cycles are an error.

use std::collections::HashMap;

use crate::{
    ast::{ElemType, SchemaAst, StructDef},
    error::SchemaError,
    layout::LayoutKey,
    resolver::{SymbolKind, SymbolTable},
};

/// 64-bit DJB2 over raw bytes: `h = h * 33 + byte`, wrapping, seed 5381.
pub fn djb2(bytes: &[u8]) -> u64 {
    let mut hash = 5381u64;
    for &byte in bytes {
        hash = hash.wrapping_mul(33).wrapping_add(u64::from(byte));
    }
    hash
}

/// Per-struct hashes keyed by (namespace, name).
#[derive(Debug, Default)]
pub struct HashValues {
    map: HashMap<LayoutKey, u64>,
}

impl HashValues {
    pub fn get(&self, ns: Option<&str>, name: &str) -> Option<u64> {
        self.map
            .get(&(ns.map(str::to_string), name.to_string()))
            .copied()
    }
}

/// Compute the canonical hash of every struct in the AST.
pub fn compute_hashes(
    ast: &SchemaAst,
    symbols: &SymbolTable,
) -> Result<HashValues, SchemaError> {
    let mut hasher = Hasher {
        ast,
        symbols,
        done: HashMap::new(),
        visiting: Vec::new(),
    };
    for space in ast.namespaces() {
        for st in &space.structs {
            hasher.hash_of(space.name.as_deref(), st)?;
        }
    }
    Ok(HashValues { map: hasher.done })
}

struct Hasher<'a> {
    ast: &'a SchemaAst,
    symbols: &'a SymbolTable,
    done: HashMap<LayoutKey, u64>,
    visiting: Vec<LayoutKey>,
}

impl Hasher<'_> {
    fn hash_of(&mut self, ns: Option<&str>, st: &StructDef) -> Result<u64, SchemaError> {
        let key: LayoutKey = (ns.map(str::to_string), st.name.clone());
        if let Some(&hash) = self.done.get(&key) {
            return Ok(hash);
        }
        if self.visiting.contains(&key) {
            return Err(SchemaError::Size {
                name: qualified(ns, &st.name),
                detail: "struct reference cycle while hashing".to_string(),
            });
        }
        self.visiting.push(key.clone());

        let text = self.canonical_text(ns, st)?;
        let hash = djb2(text.as_bytes());

        self.visiting.pop();
        self.done.insert(key, hash);
        Ok(hash)
    }

    fn canonical_text(&mut self, ns: Option<&str>, st: &StructDef) -> Result<String, SchemaError> {
        let mut text = String::from("struct ");
        if let Some(ns) = ns {
            text.push_str(ns);
            text.push_str("::");
        }
        text.push_str(&st.name);
        text.push_str(" \n");

        for element in &st.elements {
            if let Some(suffix) = element.array {
                let size = if suffix.dynamic { 0 } else { suffix.size };
                text.push_str(&format!("[{size}] "));
            }
            match &element.ty {
                ElemType::Prim(prim) => {
                    text.push_str(&format!("{} {}; \n", prim.canon_token(), element.name));
                }
                ElemType::Custom { namespace, name } => {
                    let found = self
                        .symbols
                        .resolve(namespace.as_deref(), ns, name)
                        .ok_or_else(|| SchemaError::Size {
                            name: qualified(ns, &st.name),
                            detail: format!(
                                "unknown type '{name}' on element '{}'",
                                element.name
                            ),
                        })?;
                    match found.kind {
                        SymbolKind::Enum => {
                            text.push_str(&format!("{} {};\n", name, element.name));
                        }
                        SymbolKind::Struct => {
                            let ast = self.ast;
                            let inner = find_struct(ast, found.namespace.as_deref(), &found.name)
                                .ok_or_else(|| SchemaError::Size {
                                    name: qualified(ns, &st.name),
                                    detail: format!("missing struct '{}'", found.name),
                                })?;
                            let inner_hash =
                                self.hash_of(found.namespace.as_deref(), inner)?;
                            text.push_str(&format!("{inner_hash:X} {};\n", element.name));
                        }
                    }
                }
            }
        }
        Ok(text)
    }
}

fn find_struct<'a>(ast: &'a SchemaAst, ns: Option<&str>, name: &str) -> Option<&'a StructDef> {
    ast.namespaces()
        .find(|space| space.name.as_deref() == ns)?
        .structs
        .iter()
        .find(|st| st.name == name)
}

fn qualified(ns: Option<&str>, name: &str) -> String {
    match ns {
        Some(ns) => format!("{ns}::{name}"),
        None => name.to_string(),
    }
}
