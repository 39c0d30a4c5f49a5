//! Recursive-descent parser over the token stream.
//!
//! Builds the [`SchemaAst`], folding constant expressions as it goes so
//! array sizes and default values are plain numbers by the time the AST
//! leaves this module. Constants are visible to expressions only after
//! their own declaration, scoped to the enclosing namespace with a global
//! fallback.

use std::collections::{HashMap, HashSet};

use crate::{
    ast::{
        ArraySuffix, Element, ElemType, EnumDef, EnumMember, InitValue, NamespaceDef, PrimType,
        SchemaAst, StructDef,
    },
    error::SchemaError,
    expr::{self, BinOp, Expr, Num},
    token::{Token, TokenKind},
};

/// Parse a full token stream into an AST.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<SchemaAst, SchemaError> {
    Parser::new(tokens).run()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    ast: SchemaAst,
    /// Folded constants keyed by (namespace, name).
    consts: HashMap<(Option<String>, String), Num>,
    /// Qualified struct and enum names (one shared domain per namespace).
    type_names: HashSet<(Option<String>, String)>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: SchemaAst::default(),
            consts: HashMap::new(),
            type_names: HashSet::new(),
        }
    }

    fn run(mut self) -> Result<SchemaAst, SchemaError> {
        while let Some(tok) = self.peek() {
            match tok.kind {
                TokenKind::KwNamespace => self.parse_namespace()?,
                TokenKind::KwStruct => self.parse_struct(None)?,
                TokenKind::KwEnum => self.parse_enum(None)?,
                TokenKind::KwConst => self.parse_const(None)?,
                _ => {
                    let (line, column) = self.here();
                    return Err(SchemaError::parse(
                        line,
                        column,
                        format!(
                            "expected namespace, struct, enum or const, found {}",
                            tok.kind.describe()
                        ),
                    ));
                }
            }
        }
        Ok(self.ast)
    }

    // ── token cursor ─────────────────────────────────────────────────────

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    /// Position of the current token, or of the end of input.
    fn here(&self) -> (u32, u32) {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or((1, 1), |t| (t.line, t.column))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == Some(kind) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, SchemaError> {
        let (line, column) = self.here();
        match self.bump() {
            Some(tok) if tok.kind == kind => Ok(tok),
            Some(tok) => Err(SchemaError::parse(
                line,
                column,
                format!("expected {}, found {}", kind.describe(), tok.kind.describe()),
            )),
            None => Err(SchemaError::parse(
                line,
                column,
                format!("expected {}, found end of input", kind.describe()),
            )),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<(String, u32, u32), SchemaError> {
        let (line, column) = self.here();
        match self.bump() {
            Some(Token {
                kind: TokenKind::Ident(name),
                line,
                column,
            }) => Ok((name, line, column)),
            Some(tok) => Err(SchemaError::parse(
                line,
                column,
                format!("expected {what}, found {}", tok.kind.describe()),
            )),
            None => Err(SchemaError::parse(
                line,
                column,
                format!("expected {what}, found end of input"),
            )),
        }
    }

    // ── declarations ─────────────────────────────────────────────────────

    fn parse_namespace(&mut self) -> Result<(), SchemaError> {
        self.expect(TokenKind::KwNamespace)?;
        let (name, _, _) = self.expect_ident("namespace name")?;
        self.expect(TokenKind::LBrace)?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.bump();
                    break;
                }
                Some(TokenKind::KwStruct) => self.parse_struct(Some(name.clone()))?,
                Some(TokenKind::KwEnum) => self.parse_enum(Some(name.clone()))?,
                Some(TokenKind::KwConst) => self.parse_const(Some(name.clone()))?,
                Some(kind) => {
                    let (line, column) = self.here();
                    return Err(SchemaError::parse(
                        line,
                        column,
                        format!(
                            "expected struct, enum, const or '}}' in namespace '{name}', found {}",
                            kind.describe()
                        ),
                    ));
                }
                None => {
                    let (line, column) = self.here();
                    return Err(SchemaError::parse(
                        line,
                        column,
                        format!("namespace '{name}' is not closed"),
                    ));
                }
            }
        }
        self.eat(&TokenKind::Semi);
        Ok(())
    }

    fn namespace_mut(&mut self, ns: Option<&str>) -> &mut NamespaceDef {
        let Some(name) = ns else {
            return &mut self.ast.global;
        };
        // Reopening a namespace appends to the first occurrence.
        if let Some(idx) = self
            .ast
            .spaces
            .iter()
            .position(|s| s.name.as_deref() == Some(name))
        {
            return &mut self.ast.spaces[idx];
        }
        self.ast.spaces.push(NamespaceDef {
            name: Some(name.to_string()),
            ..NamespaceDef::default()
        });
        self.ast.spaces.last_mut().expect("just pushed")
    }

    fn claim_type_name(
        &mut self,
        ns: Option<&str>,
        name: &str,
        line: u32,
        column: u32,
    ) -> Result<(), SchemaError> {
        let key = (ns.map(str::to_string), name.to_string());
        if !self.type_names.insert(key) {
            return Err(SchemaError::parse(
                line,
                column,
                format!("duplicate struct or enum name '{name}'"),
            ));
        }
        Ok(())
    }

    fn parse_struct(&mut self, ns: Option<String>) -> Result<(), SchemaError> {
        self.expect(TokenKind::KwStruct)?;
        let (name, line, column) = self.expect_ident("struct name")?;
        self.claim_type_name(ns.as_deref(), &name, line, column)?;

        let mut naked = false;
        if self.eat(&TokenKind::At) {
            let (ann, ann_line, ann_column) = self.expect_ident("annotation name")?;
            if ann != "naked" {
                return Err(SchemaError::parse(
                    ann_line,
                    ann_column,
                    format!("unknown annotation '@{ann}' on struct '{name}'"),
                ));
            }
            naked = true;
        }

        self.expect(TokenKind::LBrace)?;
        let mut elements = Vec::new();
        while self.peek_kind() != Some(&TokenKind::RBrace) {
            if self.peek().is_none() {
                let (line, column) = self.here();
                return Err(SchemaError::parse(
                    line,
                    column,
                    format!("struct '{name}' is not closed"),
                ));
            }
            elements.push(self.parse_element(ns.as_deref())?);
        }
        self.expect(TokenKind::RBrace)?;
        self.eat(&TokenKind::Semi);

        self.namespace_mut(ns.as_deref()).structs.push(StructDef {
            name,
            naked,
            elements,
            line,
            column,
        });
        Ok(())
    }

    fn parse_element(&mut self, ns: Option<&str>) -> Result<Element, SchemaError> {
        let (type_name, _, _) = self.expect_ident("element type")?;
        let ty = if self.eat(&TokenKind::ColonColon) {
            let (leaf, _, _) = self.expect_ident("type name after '::'")?;
            ElemType::Custom {
                namespace: Some(type_name),
                name: leaf,
            }
        } else if let Some(prim) = PrimType::from_ident(&type_name) {
            ElemType::Prim(prim)
        } else {
            ElemType::Custom {
                namespace: None,
                name: type_name,
            }
        };

        let (name, line, column) = self.expect_ident("element name")?;

        let mut array = None;
        if self.eat(&TokenKind::LBracket) {
            if self.eat(&TokenKind::RBracket) {
                array = Some(ArraySuffix {
                    size: 0,
                    dynamic: true,
                    compact: false,
                });
            } else {
                let (expr_line, expr_column) = self.here();
                let size_expr = self.parse_expr()?;
                let size = self.fold_array_size(ns, &size_expr, expr_line, expr_column)?;
                self.expect(TokenKind::RBracket)?;
                array = Some(ArraySuffix {
                    size,
                    dynamic: false,
                    compact: false,
                });
            }
            if self.peek_kind() == Some(&TokenKind::LBracket) {
                let (l, c) = self.here();
                return Err(SchemaError::parse(
                    l,
                    c,
                    format!("multidimensional array on element '{name}' is not supported"),
                ));
            }
        }

        if self.eat(&TokenKind::At) {
            let (ann, ann_line, ann_column) = self.expect_ident("annotation name")?;
            if ann != "compact" {
                return Err(SchemaError::parse(
                    ann_line,
                    ann_column,
                    format!("unknown annotation '@{ann}' on element '{name}'"),
                ));
            }
            match array.as_mut() {
                Some(suffix) if !suffix.dynamic => suffix.compact = true,
                _ => {
                    return Err(SchemaError::parse(
                        ann_line,
                        ann_column,
                        format!("@compact on element '{name}' requires a fixed-size array"),
                    ));
                }
            }
        }

        let mut init = None;
        if self.eat(&TokenKind::Eq) {
            init = Some(self.parse_init(ns, &ty, array.is_some(), &name)?);
        }

        self.expect(TokenKind::Semi)?;
        Ok(Element {
            name,
            ty,
            array,
            init,
            line,
            column,
        })
    }

    /// Parse the right-hand side of `= …` on an element.
    fn parse_init(
        &mut self,
        ns: Option<&str>,
        ty: &ElemType,
        is_array: bool,
        elem_name: &str,
    ) -> Result<InitValue, SchemaError> {
        let (line, column) = self.here();

        // Array initializer lists are accepted and normalized to empty.
        if is_array && self.peek_kind() == Some(&TokenKind::LBrace) {
            self.parse_init_list(ns)?;
            return Ok(InitValue::List);
        }

        let prim = match ty {
            ElemType::Prim(prim) => *prim,
            ElemType::Custom { name, .. } => {
                return Err(SchemaError::parse(
                    line,
                    column,
                    format!("default value on '{elem_name}': custom type '{name}' defaults are not supported"),
                ));
            }
        };

        match prim {
            PrimType::Bool => match self.bump().map(|t| t.kind) {
                Some(TokenKind::KwTrue) => Ok(InitValue::Bool(true)),
                Some(TokenKind::KwFalse) => Ok(InitValue::Bool(false)),
                _ => Err(SchemaError::parse(
                    line,
                    column,
                    format!("default for bool element '{elem_name}' must be true or false"),
                )),
            },
            PrimType::String | PrimType::ShortString => match self.bump().map(|t| t.kind) {
                Some(TokenKind::Str(s)) => Ok(InitValue::Str(s)),
                _ => Err(SchemaError::parse(
                    line,
                    column,
                    format!("default for string element '{elem_name}' must be a string literal"),
                )),
            },
            _ => {
                let expr = self.parse_expr()?;
                let num = self.fold(ns, &expr, line, column)?;
                fit_to_type(prim, num, elem_name, line, column)
            }
        }
    }

    /// Consume a `{ … }` initializer list, validating its items.
    fn parse_init_list(&mut self, ns: Option<&str>) -> Result<(), SchemaError> {
        self.expect(TokenKind::LBrace)?;
        loop {
            match self.peek_kind() {
                Some(TokenKind::RBrace) => {
                    self.bump();
                    return Ok(());
                }
                Some(TokenKind::Str(_)) | Some(TokenKind::KwTrue) | Some(TokenKind::KwFalse) => {
                    self.bump();
                }
                Some(_) => {
                    let (line, column) = self.here();
                    let expr = self.parse_expr()?;
                    // Items must still be constant; fold and discard.
                    self.fold(ns, &expr, line, column)?;
                }
                None => {
                    let (line, column) = self.here();
                    return Err(SchemaError::parse(line, column, "initializer list is not closed"));
                }
            }
            if !self.eat(&TokenKind::Comma) && self.peek_kind() != Some(&TokenKind::RBrace) {
                let (line, column) = self.here();
                return Err(SchemaError::parse(
                    line,
                    column,
                    "expected ',' or '}' in initializer list",
                ));
            }
        }
    }

    fn parse_enum(&mut self, ns: Option<String>) -> Result<(), SchemaError> {
        self.expect(TokenKind::KwEnum)?;
        let (name, line, column) = self.expect_ident("enum name")?;
        self.claim_type_name(ns.as_deref(), &name, line, column)?;
        self.expect(TokenKind::LBrace)?;

        let mut members: Vec<EnumMember> = Vec::new();
        let mut next_value = 0i64;
        loop {
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            let (member, member_line, member_column) = self.expect_ident("enum member")?;
            if members.iter().any(|m| m.name == member) {
                return Err(SchemaError::parse(
                    member_line,
                    member_column,
                    format!("duplicate enum member '{member}' in '{name}'"),
                ));
            }
            let value = if self.eat(&TokenKind::Eq) {
                let (expr_line, expr_column) = self.here();
                let expr = self.parse_expr()?;
                match self.fold(ns.as_deref(), &expr, expr_line, expr_column)? {
                    Num::Int(v) => i64::try_from(v).map_err(|_| {
                        SchemaError::eval(expr_line, expr_column, "enum value out of range")
                    })?,
                    Num::Float(_) => {
                        return Err(SchemaError::eval(
                            expr_line,
                            expr_column,
                            format!("enum member '{member}' value must be an integer"),
                        ));
                    }
                }
            } else {
                next_value
            };
            next_value = value.wrapping_add(1);
            members.push(EnumMember {
                name: member,
                value,
            });

            if !self.eat(&TokenKind::Comma) && self.peek_kind() != Some(&TokenKind::RBrace) {
                let (l, c) = self.here();
                return Err(SchemaError::parse(l, c, "expected ',' or '}' in enum body"));
            }
        }
        self.eat(&TokenKind::Semi);

        self.namespace_mut(ns.as_deref()).enums.push(EnumDef {
            name,
            members,
            line,
            column,
        });
        Ok(())
    }

    fn parse_const(&mut self, ns: Option<String>) -> Result<(), SchemaError> {
        self.expect(TokenKind::KwConst)?;
        let (type_name, type_line, type_column) = self.expect_ident("const type")?;
        let prim = PrimType::from_ident(&type_name).ok_or_else(|| {
            SchemaError::parse(
                type_line,
                type_column,
                format!("unknown const type '{type_name}'"),
            )
        })?;
        if !prim.is_integer() && !prim.is_float() {
            return Err(SchemaError::parse(
                type_line,
                type_column,
                format!("const type '{type_name}' must be numeric"),
            ));
        }

        let (name, name_line, name_column) = self.expect_ident("const name")?;
        let key = (ns.clone(), name.clone());
        if self.consts.contains_key(&key) {
            return Err(SchemaError::parse(
                name_line,
                name_column,
                format!("duplicate const '{name}'"),
            ));
        }

        self.expect(TokenKind::Eq)?;
        let (expr_line, expr_column) = self.here();
        let expr = self.parse_expr()?;
        let num = self.fold(ns.as_deref(), &expr, expr_line, expr_column)?;
        let folded = match fit_to_type(prim, num, &name, expr_line, expr_column)? {
            InitValue::Int(v) => Num::Int(v as i128),
            InitValue::UInt(v) => Num::Int(v as i128),
            InitValue::Float(v) => Num::Float(v),
            _ => unreachable!("numeric const folds to a number"),
        };
        self.expect(TokenKind::Semi)?;

        self.consts.insert(key, folded);
        Ok(())
    }

    // ── expressions ──────────────────────────────────────────────────────

    fn parse_expr(&mut self) -> Result<Expr, SchemaError> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinOp::Add,
                Some(TokenKind::Minus) => BinOp::Sub,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_term()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> Result<Expr, SchemaError> {
        let mut lhs = self.parse_factor()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinOp::Mul,
                Some(TokenKind::Slash) => BinOp::Div,
                _ => break,
            };
            self.bump();
            let rhs = self.parse_factor()?;
            lhs = Expr::Bin(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, SchemaError> {
        let (line, column) = self.here();
        match self.bump().map(|t| t.kind) {
            Some(TokenKind::Int(v)) => Ok(Expr::Int(v)),
            Some(TokenKind::Float(v)) => Ok(Expr::Float(v)),
            Some(TokenKind::Ident(name)) => Ok(Expr::Ident(name)),
            Some(TokenKind::Minus) => Ok(Expr::Neg(Box::new(self.parse_factor()?))),
            Some(TokenKind::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            Some(kind) => Err(SchemaError::parse(
                line,
                column,
                format!("expected constant expression, found {}", kind.describe()),
            )),
            None => Err(SchemaError::parse(
                line,
                column,
                "expected constant expression, found end of input",
            )),
        }
    }

    fn fold(
        &self,
        ns: Option<&str>,
        expr: &Expr,
        line: u32,
        column: u32,
    ) -> Result<Num, SchemaError> {
        let lookup = |name: &str| {
            self.consts
                .get(&(ns.map(str::to_string), name.to_string()))
                .or_else(|| self.consts.get(&(None, name.to_string())))
                .copied()
        };
        expr::eval(expr, &lookup, line, column)
    }

    fn fold_array_size(
        &self,
        ns: Option<&str>,
        expr: &Expr,
        line: u32,
        column: u32,
    ) -> Result<u32, SchemaError> {
        match self.fold(ns, expr, line, column)? {
            Num::Int(v) if v > 0 => u32::try_from(v)
                .map_err(|_| SchemaError::eval(line, column, "array size too large")),
            Num::Int(v) => Err(SchemaError::eval(
                line,
                column,
                format!("array size must be positive, got {v}"),
            )),
            Num::Float(_) => Err(SchemaError::eval(
                line,
                column,
                "array size must be an integer",
            )),
        }
    }
}

/// Range-check a folded number against the element's primitive type.
fn fit_to_type(
    prim: PrimType,
    num: Num,
    elem_name: &str,
    line: u32,
    column: u32,
) -> Result<InitValue, SchemaError> {
    if prim.is_float() {
        return Ok(InitValue::Float(num.as_f64()));
    }

    let Num::Int(v) = num else {
        return Err(SchemaError::eval(
            line,
            column,
            format!("float value for integer element '{elem_name}'"),
        ));
    };

    let (lo, hi): (i128, i128) = match prim {
        PrimType::U8 => (0, u8::MAX as i128),
        PrimType::U16 => (0, u16::MAX as i128),
        PrimType::U32 => (0, u32::MAX as i128),
        PrimType::U64 => (0, u64::MAX as i128),
        PrimType::S8 => (i8::MIN as i128, i8::MAX as i128),
        PrimType::S16 => (i16::MIN as i128, i16::MAX as i128),
        PrimType::S32 => (i32::MIN as i128, i32::MAX as i128),
        PrimType::S64 => (i64::MIN as i128, i64::MAX as i128),
        _ => {
            return Err(SchemaError::eval(
                line,
                column,
                format!("numeric default on non-numeric element '{elem_name}'"),
            ));
        }
    };
    if v < lo || v > hi {
        return Err(SchemaError::eval(
            line,
            column,
            format!("value {v} out of range for '{elem_name}'"),
        ));
    }
    if prim == PrimType::U64 {
        Ok(InitValue::UInt(v as u64))
    } else {
        Ok(InitValue::Int(v as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::tokenize;

    fn parse(src: &str) -> SchemaAst {
        parse_tokens(tokenize(src).expect("lex")).expect("parse should succeed")
    }

    fn parse_err(src: &str) -> SchemaError {
        parse_tokens(tokenize(src).expect("lex")).expect_err("parse should fail")
    }

    #[test]
    fn parses_namespaced_struct_with_elements() {
        let ast = parse(
            "namespace msgs {\n  struct point {\n    f64 x;\n    f64 y = 1.5;\n  }\n}\n",
        );
        assert!(ast.global.structs.is_empty());
        assert_eq!(ast.spaces.len(), 1);
        let st = &ast.spaces[0].structs[0];
        assert_eq!(st.name, "point");
        assert!(!st.naked);
        assert_eq!(st.elements.len(), 2);
        assert_eq!(st.elements[1].init, Some(InitValue::Float(1.5)));
    }

    #[test]
    fn records_struct_name_position() {
        let ast = parse("namespace a {\n\n  struct late {}\n}\n");
        let st = &ast.spaces[0].structs[0];
        assert_eq!((st.line, st.column), (3, 10));
    }

    #[test]
    fn folds_integer_default_with_precedence() {
        let ast = parse("struct t { s32 f = 3*4*(12*23 + 70)/2; }\n");
        assert_eq!(
            ast.global.structs[0].elements[0].init,
            Some(InitValue::Int(2076))
        );
    }

    #[test]
    fn folds_negative_default() {
        let ast = parse("struct t { s16 d = -4; }\n");
        assert_eq!(
            ast.global.structs[0].elements[0].init,
            Some(InitValue::Int(-4))
        );
    }

    #[test]
    fn folds_float_default() {
        let ast = parse("struct t { f64 j = 2.0 * 3.4 / 2.7; }\n");
        let Some(InitValue::Float(v)) = ast.global.structs[0].elements[0].init else {
            panic!("expected float default");
        };
        assert!((v - 2.0 * 3.4 / 2.7).abs() < f64::EPSILON);
    }

    #[test]
    fn const_references_fold_in_later_expressions() {
        let ast = parse("const u32 N = 4;\nstruct t { u8 buf[N * 2]; }\n");
        let suffix = ast.global.structs[0].elements[0].array.expect("array");
        assert_eq!(suffix.size, 8);
        assert!(!suffix.dynamic);
    }

    #[test]
    fn namespace_consts_shadow_global() {
        let ast = parse(
            "const u32 N = 2;\nnamespace a { const u32 N = 5; struct t { u8 b[N]; } }\n",
        );
        assert_eq!(ast.spaces[0].structs[0].elements[0].array.unwrap().size, 5);
    }

    #[test]
    fn default_out_of_range_fails() {
        assert!(matches!(
            parse_err("struct t { u8 v = 300; }\n"),
            SchemaError::Eval { .. }
        ));
        assert!(matches!(
            parse_err("struct t { u16 v = -1; }\n"),
            SchemaError::Eval { .. }
        ));
    }

    #[test]
    fn u64_default_uses_full_range() {
        let ast = parse("struct t { u64 v = 0xFFFFFFFFFFFFFFFF; }\n");
        assert_eq!(
            ast.global.structs[0].elements[0].init,
            Some(InitValue::UInt(u64::MAX))
        );
    }

    #[test]
    fn naked_annotation_sets_flag_and_unknown_fails() {
        let ast = parse("struct t @naked { u8 v; }\n");
        assert!(ast.global.structs[0].naked);
        assert!(matches!(
            parse_err("struct t @packed { u8 v; }\n"),
            SchemaError::Parse { .. }
        ));
    }

    #[test]
    fn compact_requires_fixed_array() {
        let ast = parse("struct t { u8 v[4] @compact; }\n");
        let suffix = ast.global.structs[0].elements[0].array.unwrap();
        assert!(suffix.compact && !suffix.dynamic && suffix.size == 4);

        assert!(matches!(
            parse_err("struct t { u8 v[] @compact; }\n"),
            SchemaError::Parse { .. }
        ));
        assert!(matches!(
            parse_err("struct t { u8 v @compact; }\n"),
            SchemaError::Parse { .. }
        ));
    }

    #[test]
    fn multidimensional_array_fails() {
        let err = parse_err("struct t { u8 grid[3][3]; }\n");
        let SchemaError::Parse { detail, .. } = err else {
            panic!("expected parse error");
        };
        assert!(detail.contains("multidimensional"));
    }

    #[test]
    fn duplicate_qualified_names_fail_across_kinds() {
        assert!(matches!(
            parse_err("struct t {}\nenum t { A }\n"),
            SchemaError::Parse { .. }
        ));
        // Same leaf name in different namespaces is fine.
        parse("struct t {}\nnamespace a { struct t {} }\n");
    }

    #[test]
    fn enum_values_auto_increment_from_explicit() {
        let ast = parse("enum mode { OFF, LOW = 5, HIGH, PEAK = 2 + 6, TOP }\n");
        let values: Vec<i64> = ast.global.enums[0].members.iter().map(|m| m.value).collect();
        assert_eq!(values, [0, 5, 6, 8, 9]);
    }

    #[test]
    fn array_default_list_normalizes() {
        let ast = parse("struct t { u8 n[4] = {1, 2, 3, 4}; }\n");
        assert_eq!(ast.global.structs[0].elements[0].init, Some(InitValue::List));
    }

    #[test]
    fn custom_type_default_fails() {
        assert!(matches!(
            parse_err("struct a {}\nstruct t { a field = 3; }\n"),
            SchemaError::Parse { .. }
        ));
    }

    #[test]
    fn string_defaults_take_literals_only() {
        let ast = parse("struct t { string s = \"hi\\n\"; short_string n = \"id\"; }\n");
        assert_eq!(
            ast.global.structs[0].elements[0].init,
            Some(InitValue::Str("hi\n".into()))
        );
        assert!(matches!(
            parse_err("struct t { string s = 3; }\n"),
            SchemaError::Parse { .. }
        ));
    }

    #[test]
    fn qualified_custom_reference_keeps_namespace() {
        let ast = parse("namespace a { struct inner {} }\nstruct t { a::inner i; }\n");
        let elem = &ast.global.structs[0].elements[0];
        assert_eq!(
            elem.ty,
            ElemType::Custom {
                namespace: Some("a".into()),
                name: "inner".into()
            }
        );
    }

    #[test]
    fn reopened_namespace_merges() {
        let ast = parse("namespace a { struct x {} }\nnamespace a { struct y {} }\n");
        assert_eq!(ast.spaces.len(), 1);
        assert_eq!(ast.spaces[0].structs.len(), 2);
    }
}
