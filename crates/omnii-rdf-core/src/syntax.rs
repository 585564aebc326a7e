//! # Shared Lexer
//!
//! Tokenizer and token cursor for query text. The query parser gives the
//! tokens their grammar; the augmenter only needs token boundaries to find
//! where a pattern group opens.

use crate::types::{RdfError, has_scheme};
use crate::vocab::STANDARD_PREFIXES;
use std::collections::BTreeMap;

// =============================================================================
// TOKENS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `<...>`, unresolved.
    Iri(String),
    /// `prefix:local`; either part may be empty.
    PrefixedName { prefix: String, local: String },
    /// `_:label`
    BlankLabel(String),
    /// `?name` or `$name`
    Variable(String),
    /// A quoted string, escapes already decoded.
    Str(String),
    /// `@word`: a directive (`@prefix`) or a language tag.
    At(String),
    DoubleCaret,
    Integer(String),
    Decimal(String),
    Double(String),
    /// A bare word: keywords, `a`, `true`, `false`.
    Word(String),
    Dot,
    Semicolon,
    Comma,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Star,
}

#[derive(Debug, Clone)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    /// Byte offset just past the token.
    pub end: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Tokens {
    pub items: Vec<Spanned>,
    eof_line: usize,
    eof_column: usize,
}

/// Tokenize a document or query.
pub(crate) fn tokenize(input: &str) -> Result<Tokens, RdfError> {
    Lexer::new(input).run()
}

// =============================================================================
// LEXER
// =============================================================================

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
    line: usize,
    column: usize,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn is_local_char(c: char) -> bool {
    is_name_char(c) || c == ':' || c == '%'
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos.saturating_add(n)).map(|(_, c)| *c)
    }

    fn offset(&self) -> usize {
        self.chars.get(self.pos).map_or(self.src.len(), |(i, _)| *i)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos = self.pos.saturating_add(1);
        if c == '\n' {
            self.line = self.line.saturating_add(1);
            self.column = 1;
        } else {
            self.column = self.column.saturating_add(1);
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> RdfError {
        RdfError::syntax(self.line, self.column, message)
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else if c == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
    }

    fn run(mut self) -> Result<Tokens, RdfError> {
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            let Some(c) = self.peek() else {
                break;
            };
            let (line, column) = (self.line, self.column);
            let token = self.token(c)?;
            items.push(Spanned {
                token,
                line,
                column,
                end: self.offset(),
            });
        }
        Ok(Tokens {
            items,
            eof_line: self.line,
            eof_column: self.column,
        })
    }

    fn token(&mut self, c: char) -> Result<Token, RdfError> {
        let punct = match c {
            '.' => Some(Token::Dot),
            ';' => Some(Token::Semicolon),
            ',' => Some(Token::Comma),
            '{' => Some(Token::LBrace),
            '}' => Some(Token::RBrace),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '*' => Some(Token::Star),
            _ => None,
        };
        if let Some(token) = punct {
            self.bump();
            return Ok(token);
        }

        match c {
            '<' => self.iri(),
            '"' | '\'' => self.string(c),
            '?' | '$' => {
                self.bump();
                let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
                if name.is_empty() {
                    return Err(self.error("expected variable name"));
                }
                Ok(Token::Variable(name))
            }
            '@' => {
                self.bump();
                let word = self.take_while(|c| c.is_ascii_alphanumeric() || c == '-');
                if word.is_empty() {
                    return Err(self.error("expected directive or language tag after '@'"));
                }
                Ok(Token::At(word))
            }
            '^' if self.peek_at(1) == Some('^') => {
                self.bump();
                self.bump();
                Ok(Token::DoubleCaret)
            }
            '_' if self.peek_at(1) == Some(':') => {
                self.bump();
                self.bump();
                let label = self.take_while(is_name_char);
                if label.is_empty() {
                    return Err(self.error("expected blank node label"));
                }
                Ok(Token::BlankLabel(label))
            }
            ':' => {
                self.bump();
                Ok(Token::PrefixedName {
                    prefix: String::new(),
                    local: self.local_name(),
                })
            }
            c if c.is_ascii_digit()
                || (matches!(c, '+' | '-') && self.peek_at(1).is_some_and(|n| n.is_ascii_digit())) =>
            {
                Ok(self.number())
            }
            c if c.is_alphabetic() => {
                let word = self.take_while(is_name_char);
                if self.peek() == Some(':') {
                    self.bump();
                    Ok(Token::PrefixedName {
                        prefix: word,
                        local: self.local_name(),
                    })
                } else {
                    Ok(Token::Word(word))
                }
            }
            other => Err(self.error(format!("unexpected character '{other}'"))),
        }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            out.push(c);
            self.bump();
        }
        out
    }

    /// Local part of a prefixed name. A trailing `.` is a statement
    /// terminator, not part of the name.
    fn local_name(&mut self) -> String {
        let mut out = String::new();
        loop {
            match self.peek() {
                Some(c) if is_local_char(c) => {
                    out.push(c);
                    self.bump();
                }
                Some('.') if self.peek_at(1).is_some_and(is_local_char) && !out.is_empty() => {
                    out.push('.');
                    self.bump();
                }
                Some('\\') if self.peek_at(1).is_some_and(|c| !c.is_whitespace()) => {
                    self.bump();
                    if let Some(escaped) = self.bump() {
                        out.push(escaped);
                    }
                }
                _ => break,
            }
        }
        out
    }

    fn iri(&mut self) -> Result<Token, RdfError> {
        self.bump();
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('>') => return Ok(Token::Iri(out)),
                Some(c) if c.is_whitespace() || matches!(c, '<' | '"' | '{' | '}' | '|' | '^' | '`' | '\\') => {
                    return Err(self.error(format!("invalid character '{}' in IRI", c.escape_default())));
                }
                Some(c) => out.push(c),
                None => return Err(self.error("unterminated IRI")),
            }
        }
    }

    fn number(&mut self) -> Token {
        let mut text = String::new();
        if let Some(sign) = self.peek().filter(|c| matches!(c, '+' | '-')) {
            text.push(sign);
            self.bump();
        }
        text.push_str(&self.take_while(|c| c.is_ascii_digit()));

        let mut decimal = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            decimal = true;
            text.push('.');
            self.bump();
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }

        let exponent = matches!(self.peek(), Some('e' | 'E'))
            && (self.peek_at(1).is_some_and(|c| c.is_ascii_digit())
                || (matches!(self.peek_at(1), Some('+' | '-'))
                    && self.peek_at(2).is_some_and(|c| c.is_ascii_digit())));
        if exponent {
            if let Some(e) = self.bump() {
                text.push(e);
            }
            if let Some(sign) = self.peek().filter(|c| matches!(c, '+' | '-')) {
                text.push(sign);
                self.bump();
            }
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            return Token::Double(text);
        }

        if decimal {
            Token::Decimal(text)
        } else {
            Token::Integer(text)
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, RdfError> {
        self.bump();
        let long = self.peek() == Some(quote) && self.peek_at(1) == Some(quote);
        if long {
            self.bump();
            self.bump();
        } else if self.peek() == Some(quote) {
            self.bump();
            return Ok(Token::Str(String::new()));
        }

        let mut out = String::new();
        loop {
            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => {
                    if !long {
                        self.bump();
                        return Ok(Token::Str(out));
                    }
                    if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                        self.bump();
                        self.bump();
                        self.bump();
                        return Ok(Token::Str(out));
                    }
                    out.push(c);
                    self.bump();
                }
                Some('\n' | '\r') if !long => {
                    return Err(self.error("line break in short string"));
                }
                Some('\\') => {
                    self.bump();
                    out.push(self.escape()?);
                }
                Some(c) => {
                    out.push(c);
                    self.bump();
                }
            }
        }
    }

    fn escape(&mut self) -> Result<char, RdfError> {
        let Some(c) = self.bump() else {
            return Err(self.error("unterminated escape"));
        };
        match c {
            't' => Ok('\t'),
            'b' => Ok('\u{8}'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            'f' => Ok('\u{c}'),
            '"' | '\'' | '\\' => Ok(c),
            'u' => self.hex_escape(4),
            'U' => self.hex_escape(8),
            other => Err(self.error(format!("invalid escape '\\{other}'"))),
        }
    }

    fn hex_escape(&mut self, digits: usize) -> Result<char, RdfError> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => hex.push(c),
                _ => return Err(self.error("invalid unicode escape")),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| self.error(format!("invalid code point U+{hex}")))
    }
}

// =============================================================================
// CURSOR
// =============================================================================

/// Token cursor with position-aware errors.
pub(crate) struct Cursor<'t> {
    tokens: &'t Tokens,
    pos: usize,
}

impl<'t> Cursor<'t> {
    pub fn new(tokens: &'t Tokens) -> Self {
        Self { tokens, pos: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.items.len()
    }

    pub fn peek(&self) -> Option<&'t Token> {
        self.peek_at(0)
    }

    pub fn peek_at(&self, n: usize) -> Option<&'t Token> {
        self.tokens
            .items
            .get(self.pos.saturating_add(n))
            .map(|s| &s.token)
    }

    pub fn next(&mut self) -> Option<&'t Token> {
        let token = self.tokens.items.get(self.pos).map(|s| &s.token);
        if token.is_some() {
            self.pos = self.pos.saturating_add(1);
        }
        token
    }

    /// Consume the next token if it equals `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos = self.pos.saturating_add(1);
            true
        } else {
            false
        }
    }

    /// Consume a bare word, case-insensitively.
    pub fn eat_keyword(&mut self, keyword: &str) -> bool {
        if self.peek_keyword(keyword) {
            self.pos = self.pos.saturating_add(1);
            true
        } else {
            false
        }
    }

    pub fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w.eq_ignore_ascii_case(keyword))
    }

    pub fn expect(&mut self, expected: &Token, what: &str) -> Result<(), RdfError> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {what}")))
        }
    }

    /// An error located at the current token (or end of input).
    pub fn error(&self, message: impl Into<String>) -> RdfError {
        let message = message.into();
        match self.tokens.items.get(self.pos) {
            Some(s) => RdfError::syntax(s.line, s.column, message),
            None => RdfError::syntax(
                self.tokens.eof_line,
                self.tokens.eof_column,
                format!("{message}, found end of input"),
            ),
        }
    }
}

// =============================================================================
// PREFIXES
// =============================================================================

/// Prefix bindings plus an optional base IRI.
#[derive(Debug, Clone)]
pub(crate) struct Prefixes {
    map: BTreeMap<String, String>,
    base: Option<String>,
}

impl Prefixes {
    /// The pre-bound standard prefixes.
    pub fn standard() -> Self {
        Self {
            map: STANDARD_PREFIXES
                .iter()
                .map(|(p, ns)| ((*p).to_string(), (*ns).to_string()))
                .collect(),
            base: None,
        }
    }

    pub fn bind(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.map.insert(prefix.into(), namespace.into());
    }

    pub fn set_base(&mut self, base: String) {
        self.base = Some(base);
    }

    /// Expand `prefix:local`.
    pub fn expand(&self, prefix: &str, local: &str) -> Option<String> {
        self.map.get(prefix).map(|ns| format!("{ns}{local}"))
    }

    /// Resolve an IRI reference against the base.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        if has_scheme(reference) {
            return Some(reference.to_string());
        }
        let base = self.base.as_deref()?;
        if reference.is_empty() {
            return Some(base.to_string());
        }
        if reference.starts_with('#') {
            let stem = base.split('#').next().unwrap_or(base);
            return Some(format!("{stem}{reference}"));
        }
        let stem = match base.rfind('/') {
            Some(idx) => &base[..=idx],
            None => base,
        };
        Some(format!("{stem}{}", reference.trim_start_matches('/')))
    }
}

// =============================================================================
// TESTS
// =============================================================================
