//! Lexer for the Go subset
//!
//! Hand-rolled character walker with line/column tracking. Comments are kept
//! as tokens so the parser can attach documentation blocks and trailing
//! comments to declarations. Semicolons are inserted at newlines after
//! statement-ending tokens, per the Go rule, so the parser only ever sees
//! explicit spec terminators.

use unicode_ident::{is_xid_continue, is_xid_start};

/// Token kinds the parser consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Ident,
    Int,
    Float,
    Rune,
    /// Interpreted string literal, text includes the quotes
    Str,
    /// Raw string literal, text includes the backquotes
    RawStr,
    /// `//` or `/* */` comment, text includes the markers
    Comment,
    /// Any operator or delimiter, text holds the exact spelling
    Punct,
    /// Explicit `;` or one inserted at a newline
    Semi,
    Eof,
}

/// A lexed token with position and byte span into the source
#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub line: u32,
    pub column: u32,
    pub start: usize,
    pub end: usize,
}

impl Token {
    pub fn is_punct(&self, s: &str) -> bool {
        self.kind == TokenKind::Punct && self.text == s
    }

    pub fn is_ident(&self, s: &str) -> bool {
        self.kind == TokenKind::Ident && self.text == s
    }
}

/// A lexer failure with its position
#[derive(Debug, Clone)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

/// Lex a whole file into tokens (ending with `Eof`)
pub fn lex(src: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(src).run()
}

struct Lexer<'a> {
    src: &'a str,
    chars: Vec<(usize, char)>,
    i: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    /// Kind and text of the last non-comment token, for semicolon insertion
    last_significant: Option<(TokenKind, String)>,
}

// Multi-character operators, longest first so maximal munch works.
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^", "+", "-", "*", "/", "%", "&", "|",
    "^", "<", ">", "=", "!", "(", ")", "[", "]", "{", "}", ",", ".", ":", "~",
];

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().collect(),
            i: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            last_significant: None,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.i).map(|&(_, c)| c)
    }

    fn peek_at(&self, off: usize) -> Option<char> {
        self.chars.get(self.i + off).map(|&(_, c)| c)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.i)
            .map(|&(o, _)| o)
            .unwrap_or(self.src.len())
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.i += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> LexError {
        LexError {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.maybe_insert_semi();
                    self.bump();
                }
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('/') => self.line_comment(),
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                c if is_xid_start(c) || c == '_' => self.ident(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) => self.number(),
                '"' => self.string_lit()?,
                '`' => self.raw_string_lit()?,
                '\'' => self.rune_lit()?,
                ';' => {
                    let tok = self.simple_token(TokenKind::Semi, 1);
                    self.push(tok);
                }
                _ => self.operator()?,
            }
        }
        self.maybe_insert_semi();
        self.tokens.push(Token {
            kind: TokenKind::Eof,
            text: String::new(),
            line: self.line,
            column: self.column,
            start: self.src.len(),
            end: self.src.len(),
        });
        Ok(self.tokens)
    }

    fn push(&mut self, token: Token) {
        if token.kind != TokenKind::Comment {
            self.last_significant = Some((token.kind, token.text.clone()));
        }
        self.tokens.push(token);
    }

    /// Insert a semicolon at a newline when the previous significant token
    /// can end a statement (the Go automatic-semicolon rule).
    fn maybe_insert_semi(&mut self) {
        let insert = match &self.last_significant {
            Some((TokenKind::Ident, text)) => {
                !matches!(text.as_str(), "const" | "var" | "type" | "import" | "package" | "func")
            }
            Some((
                TokenKind::Int | TokenKind::Float | TokenKind::Rune | TokenKind::Str
                | TokenKind::RawStr,
                _,
            )) => true,
            Some((TokenKind::Punct, text)) => {
                matches!(text.as_str(), ")" | "]" | "}" | "++" | "--")
            }
            _ => false,
        };
        if insert {
            let offset = self.offset();
            self.tokens.push(Token {
                kind: TokenKind::Semi,
                text: ";".to_string(),
                line: self.line,
                column: self.column,
                start: offset,
                end: offset,
            });
            self.last_significant = None;
        }
    }

    fn start_token(&self) -> (u32, u32, usize) {
        (self.line, self.column, self.offset())
    }

    fn finish(&mut self, kind: TokenKind, line: u32, column: u32, start: usize) {
        let end = self.offset();
        let token = Token {
            kind,
            text: self.src[start..end].to_string(),
            line,
            column,
            start,
            end,
        };
        self.push(token);
    }

    fn simple_token(&mut self, kind: TokenKind, chars: usize) -> Token {
        let (line, column, start) = self.start_token();
        for _ in 0..chars {
            self.bump();
        }
        Token {
            kind,
            text: self.src[start..self.offset()].to_string(),
            line,
            column,
            start,
            end: self.offset(),
        }
    }

    fn line_comment(&mut self) {
        let (line, column, start) = self.start_token();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.bump();
        }
        self.finish(TokenKind::Comment, line, column, start);
    }

    fn block_comment(&mut self) -> Result<(), LexError> {
        let (line, column, start) = self.start_token();
        self.bump();
        self.bump();
        loop {
            match self.peek() {
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.bump();
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error("unterminated block comment")),
            }
        }
        self.finish(TokenKind::Comment, line, column, start);
        Ok(())
    }

    fn ident(&mut self) {
        let (line, column, start) = self.start_token();
        while let Some(c) = self.peek() {
            if is_xid_continue(c) || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.finish(TokenKind::Ident, line, column, start);
    }

    fn number(&mut self) {
        let (line, column, start) = self.start_token();
        let mut kind = TokenKind::Int;
        // Prefixed integers: 0x, 0o, 0b.
        if self.peek() == Some('0')
            && matches!(self.peek_at(1), Some('x' | 'X' | 'o' | 'O' | 'b' | 'B'))
        {
            self.bump();
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    self.bump();
                } else {
                    break;
                }
            }
            self.finish(kind, line, column, start);
            return;
        }
        while let Some(c) = self.peek() {
            match c {
                c if c.is_ascii_digit() || c == '_' => {
                    self.bump();
                }
                '.' => {
                    kind = TokenKind::Float;
                    self.bump();
                }
                'e' | 'E' => {
                    kind = TokenKind::Float;
                    self.bump();
                    if matches!(self.peek(), Some('+' | '-')) {
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        self.finish(kind, line, column, start);
    }

    fn string_lit(&mut self) -> Result<(), LexError> {
        let (line, column, start) = self.start_token();
        self.bump();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\n') | None => return Err(self.error("unterminated string literal")),
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.finish(TokenKind::Str, line, column, start);
        Ok(())
    }

    fn raw_string_lit(&mut self) -> Result<(), LexError> {
        let (line, column, start) = self.start_token();
        self.bump();
        loop {
            match self.peek() {
                Some('`') => {
                    self.bump();
                    break;
                }
                Some(_) => {
                    self.bump();
                }
                None => return Err(self.error("unterminated raw string literal")),
            }
        }
        self.finish(TokenKind::RawStr, line, column, start);
        Ok(())
    }

    fn rune_lit(&mut self) -> Result<(), LexError> {
        let (line, column, start) = self.start_token();
        self.bump();
        loop {
            match self.peek() {
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('\'') => {
                    self.bump();
                    break;
                }
                Some('\n') | None => return Err(self.error("unterminated rune literal")),
                Some(_) => {
                    self.bump();
                }
            }
        }
        self.finish(TokenKind::Rune, line, column, start);
        Ok(())
    }

    fn operator(&mut self) -> Result<(), LexError> {
        let rest = &self.src[self.offset()..];
        for op in OPERATORS {
            if rest.starts_with(op) {
                let tok = self.simple_token(TokenKind::Punct, op.chars().count());
                self.push(tok);
                return Ok(());
            }
        }
        Err(self.error(format!(
            "unexpected character '{}'",
            self.peek().unwrap_or('\0')
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<(TokenKind, String)> {
        lex(src)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn test_idents_and_keywords_are_idents() {
        let toks = kinds("package main");
        assert_eq!(toks[0], (TokenKind::Ident, "package".to_string()));
        assert_eq!(toks[1], (TokenKind::Ident, "main".to_string()));
    }

    #[test]
    fn test_semicolon_insertion_after_ident() {
        let toks = kinds("package main\ntype Status int\n");
        let semis = toks.iter().filter(|(k, _)| *k == TokenKind::Semi).count();
        assert_eq!(semis, 2);
    }

    #[test]
    fn test_no_semi_after_open_brace() {
        let toks = kinds("type S struct {\n\tA int\n}\n");
        // No semi directly after `{`.
        let brace_idx = toks.iter().position(|(_, t)| t == "{").unwrap();
        assert_ne!(toks[brace_idx + 1].0, TokenKind::Semi);
    }

    #[test]
    fn test_comment_preserved_before_inserted_semi() {
        let toks = kinds("StatusActive Status = 1 // the active one\n");
        let comment_idx = toks
            .iter()
            .position(|(k, _)| *k == TokenKind::Comment)
            .unwrap();
        assert_eq!(toks[comment_idx].1, "// the active one");
        assert_eq!(toks[comment_idx + 1].0, TokenKind::Semi);
    }

    #[test]
    fn test_string_and_raw_string() {
        let toks = kinds(r#"x = "a\"b"; y = `raw`"#);
        assert!(toks.iter().any(|(k, t)| *k == TokenKind::Str && t == "\"a\\\"b\""));
        assert!(toks.iter().any(|(k, t)| *k == TokenKind::RawStr && t == "`raw`"));
    }

    #[test]
    fn test_unterminated_string_errors() {
        assert!(lex("x = \"oops\n").is_err());
    }

    #[test]
    fn test_hex_literal() {
        let toks = kinds("x = 0xFF_0");
        assert!(toks.iter().any(|(k, t)| *k == TokenKind::Int && t == "0xFF_0"));
    }
}
