//! Hand-written lexer for cbuf schema text.
//!
//! Tracks 1-based line/column per token. `//` comments run to end of line;
//! `/* … */` comments nest and must be balanced. Whitespace and newlines
//! are otherwise insignificant.

use crate::{
    error::SchemaError,
    token::{Token, TokenKind},
};

/// Lex the whole input into a token vector.
pub fn tokenize(src: &str) -> Result<Vec<Token>, SchemaError> {
    Lexer::new(src).run()
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    column: u32,
}

impl Lexer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, SchemaError> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let (line, column) = (self.line, self.column);
            let Some(ch) = self.peek() else {
                break;
            };
            let kind = match ch {
                '{' => self.punct(TokenKind::LBrace),
                '}' => self.punct(TokenKind::RBrace),
                '[' => self.punct(TokenKind::LBracket),
                ']' => self.punct(TokenKind::RBracket),
                '(' => self.punct(TokenKind::LParen),
                ')' => self.punct(TokenKind::RParen),
                ';' => self.punct(TokenKind::Semi),
                ',' => self.punct(TokenKind::Comma),
                '=' => self.punct(TokenKind::Eq),
                '*' => self.punct(TokenKind::Star),
                '+' => self.punct(TokenKind::Plus),
                '-' => self.punct(TokenKind::Minus),
                '/' => self.punct(TokenKind::Slash),
                '@' => self.punct(TokenKind::At),
                ':' => {
                    self.bump();
                    if self.peek() == Some(':') {
                        self.bump();
                        TokenKind::ColonColon
                    } else {
                        return Err(SchemaError::lex(line, column, "unexpected character ':'"));
                    }
                }
                '"' => self.string_literal(line, column)?,
                c if c.is_ascii_digit() => self.number(line, column)?,
                c if is_ident_start(c) => self.ident_or_keyword(),
                c => {
                    return Err(SchemaError::lex(
                        line,
                        column,
                        format!("unexpected character '{c}'"),
                    ));
                }
            };
            tokens.push(Token { kind, line, column });
        }
        Ok(tokens)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<char> {
        self.chars.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn punct(&mut self, kind: TokenKind) -> TokenKind {
        self.bump();
        kind
    }

    /// Skip whitespace and comments. Block comments nest.
    fn skip_trivia(&mut self) -> Result<(), SchemaError> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let (line, column) = (self.line, self.column);
                    self.bump();
                    self.bump();
                    let mut depth = 1usize;
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some('/'), Some('*')) => {
                                self.bump();
                                self.bump();
                                depth += 1;
                            }
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                depth -= 1;
                                if depth == 0 {
                                    break;
                                }
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => {
                                return Err(SchemaError::lex(
                                    line,
                                    column,
                                    "unterminated block comment",
                                ));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn ident_or_keyword(&mut self) -> TokenKind {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if !is_ident_continue(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        match name.as_str() {
            "struct" => TokenKind::KwStruct,
            "enum" => TokenKind::KwEnum,
            "namespace" => TokenKind::KwNamespace,
            "const" => TokenKind::KwConst,
            "true" => TokenKind::KwTrue,
            "false" => TokenKind::KwFalse,
            _ => TokenKind::Ident(name),
        }
    }

    fn number(&mut self, line: u32, column: u32) -> Result<TokenKind, SchemaError> {
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.bump();
            self.bump();
            let mut digits = String::new();
            while let Some(c) = self.peek() {
                if !c.is_ascii_hexdigit() {
                    break;
                }
                digits.push(c);
                self.bump();
            }
            if digits.is_empty() {
                return Err(SchemaError::lex(line, column, "hex literal without digits"));
            }
            return u64::from_str_radix(&digits, 16)
                .map(TokenKind::Int)
                .map_err(|_| SchemaError::lex(line, column, "hex literal out of range"));
        }

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            text.push(c);
            self.bump();
        }

        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if !c.is_ascii_digit() {
                    break;
                }
                text.push(c);
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign_ok = match self.peek_at(1) {
                Some('+') | Some('-') => self.peek_at(2).is_some_and(|c| c.is_ascii_digit()),
                Some(c) => c.is_ascii_digit(),
                None => false,
            };
            if sign_ok {
                is_float = true;
                text.push('e');
                self.bump();
                if matches!(self.peek(), Some('+') | Some('-')) {
                    text.push(self.bump().expect("sign"));
                }
                while let Some(c) = self.peek() {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    text.push(c);
                    self.bump();
                }
            }
        }

        if is_float {
            text.parse::<f64>()
                .map(TokenKind::Float)
                .map_err(|_| SchemaError::lex(line, column, format!("bad float literal '{text}'")))
        } else {
            text.parse::<u64>()
                .map(TokenKind::Int)
                .map_err(|_| SchemaError::lex(line, column, "integer literal out of range"))
        }
    }

    fn string_literal(&mut self, line: u32, column: u32) -> Result<TokenKind, SchemaError> {
        self.bump(); // opening quote
        let mut out = String::new();
        loop {
            let Some(ch) = self.bump() else {
                return Err(SchemaError::lex(line, column, "unterminated string literal"));
            };
            match ch {
                '"' => return Ok(TokenKind::Str(out)),
                '\n' => {
                    return Err(SchemaError::lex(line, column, "unterminated string literal"));
                }
                '\\' => {
                    let (esc_line, esc_column) = (self.line, self.column);
                    let Some(esc) = self.bump() else {
                        return Err(SchemaError::lex(line, column, "unterminated string literal"));
                    };
                    match esc {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '0' => out.push('\0'),
                        'x' => {
                            let hi = self.bump().and_then(|c| c.to_digit(16));
                            let lo = self.bump().and_then(|c| c.to_digit(16));
                            match (hi, lo) {
                                (Some(hi), Some(lo)) => {
                                    out.push(char::from((hi * 16 + lo) as u8));
                                }
                                _ => {
                                    return Err(SchemaError::lex(
                                        esc_line,
                                        esc_column,
                                        "\\x escape needs two hex digits",
                                    ));
                                }
                            }
                        }
                        other => {
                            return Err(SchemaError::lex(
                                esc_line,
                                esc_column,
                                format!("unknown escape '\\{other}'"),
                            ));
                        }
                    }
                }
                other => out.push(other),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
