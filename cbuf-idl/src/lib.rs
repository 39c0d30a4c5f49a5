//! Schema front-end for the cbuf IDL.
//!
//! Turns schema text into the immutable descriptor table consumed by the
//! wire codec: lexing, parsing, symbol resolution across namespaces,
//! constant folding for defaults and array sizes, size/shape analysis,
//! canonical content hashing and descriptor emission.

mod ast;
mod emit;
mod error;
mod expr;
mod hash;
mod layout;
mod lex;
mod parser;
mod resolver;
mod token;

pub use error::SchemaError;
pub use hash::djb2;

use cbuf_core::Schema;
use resolver::SymbolTable;

/// Parse cbuf schema text into a descriptor table.
///
/// A trailing newline is appended when the input lacks one, matching the
/// original front-end's contract. All failures collapse into one
/// [`SchemaError`] whose `Display` carries the human-readable diagnostic
/// with line/column where available.
pub fn parse_schema(text: &str) -> Result<Schema, SchemaError> {
    let tokens = if text.ends_with('\n') {
        lex::tokenize(text)?
    } else {
        let mut owned = String::with_capacity(text.len() + 1);
        owned.push_str(text);
        owned.push('\n');
        lex::tokenize(&owned)?
    };

    let ast = parser::parse_tokens(tokens)?;
    let symbols = SymbolTable::build(&ast);
    resolver::check_references(&ast, &symbols)?;
    let layouts = layout::analyze(&ast, &symbols)?;
    let hashes = hash::compute_hashes(&ast, &symbols)?;
    emit::emit(&ast, &symbols, &layouts, &hashes)
}
