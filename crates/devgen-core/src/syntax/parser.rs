//! Recursive-descent parser for the Go subset
//!
//! Parses package clause, imports, type declarations (named, struct,
//! interface), and const/var declarations with their documentation blocks
//! and trailing comments. Function declarations are recognised and skipped
//! with brace matching. Anything the parser does not interpret inside a
//! declaration is captured as raw source text.

use super::ast::{
    Decl, FieldDef, Import, MethodDef, SourceFile, TypeDecl, TypeExpr, ValueDecl, ValueKind,
    ValueSpec,
};
use super::lexer::{self, Token, TokenKind};
use crate::diagnostics::SourcePos;
use std::path::Path;

/// A parse failure with its position
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub pos: SourcePos,
}

impl ParseError {
    fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

/// Parse one `.go` file into its AST
pub fn parse_file(path: &Path, src: &str) -> Result<SourceFile, ParseError> {
    let tokens = lexer::lex(src).map_err(|e| {
        ParseError::new(
            e.message,
            SourcePos::new(path.to_path_buf(), e.line, e.column),
        )
    })?;
    Parser {
        path,
        src,
        tokens,
        i: 0,
        pending_comments: Vec::new(),
    }
    .parse()
}

struct Parser<'a> {
    path: &'a Path,
    src: &'a str,
    tokens: Vec<Token>,
    i: usize,
    /// Comments seen since the last doc/trailing extraction
    pending_comments: Vec<Token>,
}

impl<'a> Parser<'a> {
    fn pos_of(&self, token: &Token) -> SourcePos {
        SourcePos::new(self.path.to_path_buf(), token.line, token.column)
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> ParseError {
        ParseError::new(message, self.pos_of(token))
    }

    /// Current significant token, buffering any comments passed over
    fn cur(&mut self) -> Token {
        while self.tokens[self.i].kind == TokenKind::Comment {
            let c = self.tokens[self.i].clone();
            self.pending_comments.push(c);
            self.i += 1;
        }
        self.tokens[self.i].clone()
    }

    fn advance(&mut self) -> Token {
        let tok = self.cur();
        if tok.kind != TokenKind::Eof {
            self.i += 1;
        }
        tok
    }

    fn expect_ident(&mut self) -> Result<Token, ParseError> {
        let tok = self.advance();
        if tok.kind != TokenKind::Ident {
            return Err(self.error_at(&tok, format!("expected identifier, found '{}'", tok.text)));
        }
        Ok(tok)
    }

    fn expect_punct(&mut self, p: &str) -> Result<Token, ParseError> {
        let tok = self.advance();
        if !tok.is_punct(p) {
            return Err(self.error_at(&tok, format!("expected '{p}', found '{}'", tok.text)));
        }
        Ok(tok)
    }

    fn expect_semi(&mut self) -> Result<(), ParseError> {
        let tok = self.cur();
        if tok.kind == TokenKind::Semi {
            self.advance();
            return Ok(());
        }
        // Closing delimiters terminate the last spec of a group.
        if tok.is_punct(")") || tok.is_punct("}") || tok.kind == TokenKind::Eof {
            return Ok(());
        }
        Err(self.error_at(&tok, format!("expected end of statement, found '{}'", tok.text)))
    }

    /// The documentation block directly above a token starting on `line`
    ///
    /// Takes the maximal contiguous run of buffered comments ending on the
    /// previous line; a blank line breaks the run. Older buffered comments
    /// are discarded.
    fn take_doc(&mut self, line: u32) -> String {
        let mut block: Vec<Token> = Vec::new();
        let mut expected = line;
        for c in self.pending_comments.iter().rev() {
            let end_line = c.line + newlines_in(&c.text);
            if end_line + 1 == expected {
                block.push(c.clone());
                expected = c.line;
            } else {
                break;
            }
        }
        self.pending_comments.clear();
        block.reverse();
        let text: Vec<String> = block.iter().map(|c| strip_comment_markers(&c.text)).collect();
        text.join("\n")
    }

    /// The trailing comment on `line`, if one was buffered
    fn take_trailing(&mut self, line: u32) -> String {
        let mut out = String::new();
        self.pending_comments.retain(|c| {
            if c.line == line && out.is_empty() {
                out = strip_comment_markers(&c.text);
                false
            } else {
                true
            }
        });
        out
    }

    fn parse(mut self) -> Result<SourceFile, ParseError> {
        let package_kw = self.advance();
        if !package_kw.is_ident("package") {
            return Err(self.error_at(&package_kw, "expected package clause"));
        }
        let name = self.expect_ident()?;
        self.expect_semi()?;

        let mut file = SourceFile {
            path: self.path.to_path_buf(),
            package: name.text.clone(),
            package_pos: self.pos_of(&package_kw),
            imports: Vec::new(),
            decls: Vec::new(),
        };

        loop {
            let tok = self.cur();
            match tok.kind {
                TokenKind::Eof => break,
                TokenKind::Semi => {
                    self.advance();
                }
                TokenKind::Ident => match tok.text.as_str() {
                    "import" => self.parse_import_decl(&mut file)?,
                    "type" => self.parse_type_decl(&mut file)?,
                    "const" => self.parse_value_decl(&mut file, ValueKind::Const)?,
                    "var" => self.parse_value_decl(&mut file, ValueKind::Var)?,
                    "func" => self.skip_func()?,
                    other => {
                        return Err(self.error_at(
                            &tok,
                            format!("unexpected '{other}' at top level"),
                        ));
                    }
                },
                _ => {
                    return Err(
                        self.error_at(&tok, format!("unexpected '{}' at top level", tok.text))
                    );
                }
            }
        }
        Ok(file)
    }

    fn parse_import_decl(&mut self, file: &mut SourceFile) -> Result<(), ParseError> {
        self.advance(); // import
        if self.cur().is_punct("(") {
            self.advance();
            loop {
                let tok = self.cur();
                if tok.is_punct(")") {
                    self.advance();
                    break;
                }
                if tok.kind == TokenKind::Semi {
                    self.advance();
                    continue;
                }
                let import = self.parse_import_spec()?;
                file.imports.push(import);
                self.expect_semi()?;
            }
            self.expect_semi()?;
        } else {
            let import = self.parse_import_spec()?;
            file.imports.push(import);
            self.expect_semi()?;
        }
        Ok(())
    }

    fn parse_import_spec(&mut self) -> Result<Import, ParseError> {
        let tok = self.cur();
        let pos = self.pos_of(&tok);
        let alias = match tok.kind {
            TokenKind::Ident => {
                self.advance();
                Some(tok.text.clone())
            }
            TokenKind::Punct if tok.text == "." => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        let path_tok = self.advance();
        if path_tok.kind != TokenKind::Str {
            return Err(self.error_at(&path_tok, "expected import path string"));
        }
        Ok(Import {
            alias,
            path: unquote(&path_tok.text),
            pos,
        })
    }

    fn parse_type_decl(&mut self, file: &mut SourceFile) -> Result<(), ParseError> {
        let kw = self.cur();
        let decl_doc = self.take_doc(kw.line);
        self.advance(); // type
        if self.cur().is_punct("(") {
            self.advance();
            loop {
                let tok = self.cur();
                if tok.is_punct(")") {
                    self.advance();
                    break;
                }
                if tok.kind == TokenKind::Semi {
                    self.advance();
                    continue;
                }
                let spec_doc = self.take_doc(tok.line);
                let decl = self.parse_type_spec(spec_doc)?;
                file.decls.push(Decl::Type(decl));
                self.expect_semi()?;
            }
            self.expect_semi()?;
        } else {
            let decl = self.parse_type_spec(decl_doc)?;
            file.decls.push(Decl::Type(decl));
            self.expect_semi()?;
        }
        Ok(())
    }

    fn parse_type_spec(&mut self, doc: String) -> Result<TypeDecl, ParseError> {
        let name = self.expect_ident()?;
        let pos = self.pos_of(&name);
        let tok = self.cur();

        let expr = if tok.is_punct("=") {
            // Alias declaration; devgen treats the target as opaque.
            self.advance();
            TypeExpr::Other(self.capture_raw_until_spec_end()?)
        } else if tok.is_ident("struct") {
            self.advance();
            self.expect_punct("{")?;
            TypeExpr::Struct(self.parse_field_list()?)
        } else if tok.is_ident("interface") {
            self.advance();
            self.expect_punct("{")?;
            TypeExpr::Interface(self.parse_method_list()?)
        } else if tok.kind == TokenKind::Ident {
            // Possibly a plain named type, possibly the head of a composite
            // (`map[...]`, `chan ...`) or a generic declaration.
            let head = self.advance();
            let next = self.cur();
            if next.kind == TokenKind::Semi || next.is_punct(")") {
                TypeExpr::Named(head.text.clone())
            } else if next.is_punct(".") {
                self.advance();
                let sel = self.expect_ident()?;
                let after = self.cur();
                if after.kind == TokenKind::Semi || after.is_punct(")") {
                    TypeExpr::Named(format!("{}.{}", head.text, sel.text))
                } else {
                    let rest = self.capture_raw_until_spec_end()?;
                    TypeExpr::Other(format!("{}.{}{}", head.text, sel.text, rest))
                }
            } else {
                let rest = self.capture_raw_until_spec_end()?;
                TypeExpr::Other(format!("{} {}", head.text, rest))
            }
        } else {
            TypeExpr::Other(self.capture_raw_until_spec_end()?)
        };

        Ok(TypeDecl {
            name: name.text,
            doc,
            pos,
            expr,
        })
    }

    fn parse_field_list(&mut self) -> Result<Vec<FieldDef>, ParseError> {
        let mut fields = Vec::new();
        loop {
            let tok = self.cur();
            if tok.is_punct("}") {
                self.advance();
                break;
            }
            if tok.kind == TokenKind::Semi {
                self.advance();
                continue;
            }
            let doc = self.take_doc(tok.line);
            let parsed = self.parse_field(doc)?;
            fields.extend(parsed);
        }
        Ok(fields)
    }

    fn parse_field(&mut self, doc: String) -> Result<Vec<FieldDef>, ParseError> {
        let first = self.cur();
        let pos = self.pos_of(&first);
        let line = first.line;

        // Embedded pointer field: *pkg.Type or *Type.
        if first.is_punct("*") {
            let raw = self.capture_raw_until_field_end()?;
            let (tag, comment) = self.finish_field(line)?;
            let name = raw
                .rsplit('.')
                .next()
                .unwrap_or(&raw)
                .trim_start_matches('*')
                .to_string();
            return Ok(vec![FieldDef {
                name,
                ty: raw,
                tag,
                doc,
                comment,
                pos,
            }]);
        }

        let mut names = vec![self.expect_ident()?.text];
        while self.cur().is_punct(",") {
            self.advance();
            names.push(self.expect_ident()?.text);
        }

        let tok = self.cur();
        if names.len() == 1
            && (tok.kind == TokenKind::Semi
                || tok.is_punct("}")
                || tok.kind == TokenKind::Str
                || tok.kind == TokenKind::RawStr)
        {
            // Embedded field: the single identifier is the type.
            let (tag, comment) = self.finish_field(line)?;
            return Ok(vec![FieldDef {
                name: names.remove(0),
                ty: String::new(),
                tag,
                doc,
                comment,
                pos,
            }]);
        }
        if names.len() == 1 && tok.is_punct(".") {
            // Embedded qualified field: pkg.Type.
            self.advance();
            let sel = self.expect_ident()?;
            let (tag, comment) = self.finish_field(line)?;
            return Ok(vec![FieldDef {
                name: sel.text.clone(),
                ty: format!("{}.{}", names[0], sel.text),
                tag,
                doc,
                comment,
                pos,
            }]);
        }

        let ty = self.capture_raw_until_field_end()?;
        let (tag, comment) = self.finish_field(line)?;

        // One FieldDef per declared name, sharing type, tag, and docs.
        Ok(names
            .into_iter()
            .map(|name| FieldDef {
                name,
                ty: ty.clone(),
                tag: tag.clone(),
                doc: doc.clone(),
                comment: comment.clone(),
                pos: pos.clone(),
            })
            .collect())
    }

    /// Consume an optional tag and the spec terminator; trailing comment
    fn finish_field(&mut self, line: u32) -> Result<(Option<String>, String), ParseError> {
        let mut tag = None;
        let tok = self.cur();
        if tok.kind == TokenKind::Str || tok.kind == TokenKind::RawStr {
            self.advance();
            tag = Some(unquote(&tok.text));
        }
        self.expect_semi()?;
        Ok((tag, self.take_trailing(line)))
    }

    fn parse_method_list(&mut self) -> Result<Vec<MethodDef>, ParseError> {
        let mut methods = Vec::new();
        loop {
            let tok = self.cur();
            if tok.is_punct("}") {
                self.advance();
                break;
            }
            if tok.kind == TokenKind::Semi {
                self.advance();
                continue;
            }
            let doc = self.take_doc(tok.line);
            let name = self.expect_ident()?;
            let pos = self.pos_of(&name);
            let next = self.cur();
            let signature = if next.is_punct("(") {
                self.capture_raw_until_spec_end()?
            } else if next.is_punct(".") {
                // Embedded qualified interface.
                self.capture_raw_until_spec_end()?;
                String::new()
            } else {
                // Embedded interface name.
                String::new()
            };
            self.expect_semi()?;
            methods.push(MethodDef {
                name: name.text,
                signature,
                doc,
                pos,
            });
        }
        Ok(methods)
    }

    fn parse_value_decl(
        &mut self,
        file: &mut SourceFile,
        kind: ValueKind,
    ) -> Result<(), ParseError> {
        let kw = self.cur();
        let doc = self.take_doc(kw.line);
        let pos = self.pos_of(&kw);
        self.advance(); // const | var

        let mut decl = ValueDecl {
            kind,
            doc,
            pos,
            grouped: false,
            specs: Vec::new(),
        };

        if self.cur().is_punct("(") {
            decl.grouped = true;
            self.advance();
            loop {
                let tok = self.cur();
                if tok.is_punct(")") {
                    self.advance();
                    break;
                }
                if tok.kind == TokenKind::Semi {
                    self.advance();
                    continue;
                }
                let spec = self.parse_value_spec()?;
                decl.specs.push(spec);
            }
            self.expect_semi()?;
        } else {
            let spec = self.parse_value_spec()?;
            decl.specs.push(spec);
        }
        file.decls.push(Decl::Value(decl));
        Ok(())
    }

    fn parse_value_spec(&mut self) -> Result<ValueSpec, ParseError> {
        let first = self.cur();
        let doc = self.take_doc(first.line);
        let pos = self.pos_of(&first);
        let line = first.line;

        let mut names = vec![self.expect_ident()?.text];
        while self.cur().is_punct(",") {
            self.advance();
            names.push(self.expect_ident()?.text);
        }

        let mut ty = None;
        let mut values = Vec::new();

        let tok = self.cur();
        if tok.kind != TokenKind::Semi && !tok.is_punct(")") && !tok.is_punct("=") {
            ty = Some(self.capture_raw_until_eq_or_spec_end()?);
        }
        if self.cur().is_punct("=") {
            self.advance();
            let raw = self.capture_raw_until_spec_end()?;
            values = split_top_level_commas(&raw);
        }
        self.expect_semi()?;
        let comment = self.take_trailing(line);

        Ok(ValueSpec {
            names,
            ty,
            values,
            doc,
            comment,
            pos,
        })
    }

    fn skip_func(&mut self) -> Result<(), ParseError> {
        self.advance(); // func
        let mut depth = 0i32;
        loop {
            let tok = self.cur();
            match tok.kind {
                TokenKind::Eof => {
                    return Err(self.error_at(&tok, "unexpected end of file in function"));
                }
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::Punct => {
                    match tok.text.as_str() {
                        "(" | "[" => depth += 1,
                        ")" | "]" => depth -= 1,
                        "{" if depth == 0 => {
                            self.skip_braced_block()?;
                            return Ok(());
                        }
                        "{" => depth += 1,
                        "}" => depth -= 1,
                        _ => {}
                    }
                    self.advance();
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn skip_braced_block(&mut self) -> Result<(), ParseError> {
        let open = self.expect_punct("{")?;
        let mut depth = 1i32;
        loop {
            let tok = self.cur();
            match tok.kind {
                TokenKind::Eof => {
                    return Err(self.error_at(&open, "unclosed '{'"));
                }
                TokenKind::Punct if tok.text == "{" => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::Punct if tok.text == "}" => {
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        self.pending_comments.clear();
                        return Ok(());
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Raw source text from the current token to the end of the spec
    ///
    /// A `}` at depth zero can only be the enclosing body's closer, so it
    /// ends the spec too (single-line interface bodies).
    fn capture_raw_until_spec_end(&mut self) -> Result<String, ParseError> {
        self.capture_raw(|tok, depth| {
            depth == 0
                && (tok.kind == TokenKind::Semi || tok.is_punct(")") || tok.is_punct("}"))
        })
    }

    /// Raw source text up to a top-level `=`, spec end, or tag
    fn capture_raw_until_eq_or_spec_end(&mut self) -> Result<String, ParseError> {
        self.capture_raw(|tok, depth| {
            depth == 0 && (tok.kind == TokenKind::Semi || tok.is_punct(")") || tok.is_punct("="))
        })
    }

    /// Raw source text up to a field terminator (semi, `}`, or tag literal)
    fn capture_raw_until_field_end(&mut self) -> Result<String, ParseError> {
        self.capture_raw(|tok, depth| {
            depth == 0
                && (tok.kind == TokenKind::Semi
                    || tok.is_punct("}")
                    || tok.kind == TokenKind::Str
                    || tok.kind == TokenKind::RawStr)
        })
    }

    fn capture_raw(
        &mut self,
        stop: impl Fn(&Token, i32) -> bool,
    ) -> Result<String, ParseError> {
        let start_tok = self.cur();
        if start_tok.kind == TokenKind::Eof {
            return Err(self.error_at(&start_tok, "unexpected end of file"));
        }
        let start = start_tok.start;
        let mut end = start;
        let mut depth = 0i32;
        loop {
            let tok = self.cur();
            if tok.kind == TokenKind::Eof {
                return Err(self.error_at(&tok, "unexpected end of file"));
            }
            if stop(&tok, depth) {
                break;
            }
            if tok.kind == TokenKind::Punct {
                match tok.text.as_str() {
                    "(" | "[" | "{" => depth += 1,
                    ")" | "]" | "}" => depth -= 1,
                    _ => {}
                }
            }
            end = tok.end;
            self.advance();
        }
        Ok(self.src[start..end].trim().to_string())
    }
}

fn newlines_in(text: &str) -> u32 {
    text.matches('\n').count() as u32
}

/// Strip `//` / `/* */` markers and one leading space from a comment
fn strip_comment_markers(text: &str) -> String {
    if let Some(rest) = text.strip_prefix("//") {
        return rest.strip_prefix(' ').unwrap_or(rest).to_string();
    }
    if let Some(rest) = text.strip_prefix("/*") {
        let inner = rest.strip_suffix("*/").unwrap_or(rest);
        return inner.trim().to_string();
    }
    text.to_string()
}

fn unquote(text: &str) -> String {
    let t = text.trim();
    if (t.starts_with('"') && t.ends_with('"') && t.len() >= 2)
        || (t.starts_with('`') && t.ends_with('`') && t.len() >= 2)
    {
        t[1..t.len() - 1].to_string()
    } else {
        t.to_string()
    }
}

/// Split raw expression text on commas at paren/bracket/brace depth zero
fn split_top_level_commas(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut in_str = false;
    let mut in_raw = false;
    let mut start = 0;
    let mut prev_escape = false;
    for (i, c) in raw.char_indices() {
        if in_str {
            if prev_escape {
                prev_escape = false;
            } else if c == '\\' {
                prev_escape = true;
            } else if c == '"' {
                in_str = false;
            }
            continue;
        }
        if in_raw {
            if c == '`' {
                in_raw = false;
            }
            continue;
        }
        match c {
            '"' => in_str = true,
            '`' => in_raw = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                out.push(raw[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = raw[start..].trim();
    if !last.is_empty() {
        out.push(last.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(src: &str) -> SourceFile {
        parse_file(&PathBuf::from("test.go"), src).expect("parse failed")
    }

    #[test]
    fn test_package_clause() {
        let file = parse("package widgets\n");
        assert_eq!(file.package, "widgets");
    }

    #[test]
    fn test_imports() {
        let file = parse(
            "package p\n\nimport (\n\t\"fmt\"\n\tjson \"encoding/json\"\n)\n\nimport \"os\"\n",
        );
        assert_eq!(file.imports.len(), 3);
        assert_eq!(file.imports[0].path, "fmt");
        assert_eq!(file.imports[1].alias.as_deref(), Some("json"));
        assert_eq!(file.imports[1].path, "encoding/json");
        assert_eq!(file.imports[2].path, "os");
    }

    #[test]
    fn test_named_type_with_doc() {
        let src = "package p\n\n// Status of a job.\n// enumgen:@enum(string)\ntype Status int\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "Status");
        assert_eq!(decls[0].doc, "Status of a job.\nenumgen:@enum(string)");
        assert!(matches!(&decls[0].expr, TypeExpr::Named(n) if n == "int"));
    }

    #[test]
    fn test_blank_line_breaks_doc() {
        let src = "package p\n\n// unrelated\n\ntype Status int\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        assert_eq!(decls[0].doc, "");
    }

    #[test]
    fn test_const_group_with_iota() {
        let src = "package p\n\ntype Status int\n\nconst (\n\t// first\n\tStatusActive Status = iota + 1 // running\n\tStatusInactive\n)\n";
        let file = parse(src);
        let consts: Vec<_> = file.const_decls().collect();
        assert_eq!(consts.len(), 1);
        let specs = &consts[0].specs;
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].names, ["StatusActive"]);
        assert_eq!(specs[0].ty.as_deref(), Some("Status"));
        assert_eq!(specs[0].values, ["iota + 1"]);
        assert_eq!(specs[0].doc, "first");
        assert_eq!(specs[0].comment, "running");
        assert_eq!(specs[1].names, ["StatusInactive"]);
        assert!(specs[1].ty.is_none());
        assert!(specs[1].values.is_empty());
    }

    #[test]
    fn test_multi_name_const_spec() {
        let src = "package p\nconst A, B = 1, 2\n";
        let file = parse(src);
        let consts: Vec<_> = file.const_decls().collect();
        assert_eq!(consts[0].specs[0].names, ["A", "B"]);
        assert_eq!(consts[0].specs[0].values, ["1", "2"]);
    }

    #[test]
    fn test_struct_fields() {
        let src = "package p\n\n// A User record.\ntype User struct {\n\t// Unique id.\n\tID int64 `json:\"id\"`\n\tName string // display name\n\tEmbedded\n}\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        let TypeExpr::Struct(fields) = &decls[0].expr else {
            panic!("expected struct");
        };
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].name, "ID");
        assert_eq!(fields[0].ty, "int64");
        assert_eq!(fields[0].tag.as_deref(), Some("json:\"id\""));
        assert_eq!(fields[0].doc, "Unique id.");
        assert_eq!(fields[1].comment, "display name");
        assert_eq!(fields[2].name, "Embedded");
        assert_eq!(fields[2].ty, "");
    }

    #[test]
    fn test_interface_methods() {
        let src = "package p\n\ntype Store interface {\n\t// Get fetches a value.\n\tGet(key string) (string, error)\n\tPut(key, value string) error\n\tio.Closer\n}\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        let TypeExpr::Interface(methods) = &decls[0].expr else {
            panic!("expected interface");
        };
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[0].name, "Get");
        assert_eq!(methods[0].signature, "(key string) (string, error)");
        assert_eq!(methods[0].doc, "Get fetches a value.");
        assert_eq!(methods[2].name, "io");
        assert_eq!(methods[2].signature, "");
    }

    #[test]
    fn test_funcs_are_skipped() {
        let src = "package p\n\nfunc (s Status) String() string {\n\treturn \"x\"\n}\n\ntype After int\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name, "After");
    }

    #[test]
    fn test_map_type_is_other() {
        let src = "package p\ntype Index map[string]int\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        assert!(matches!(&decls[0].expr, TypeExpr::Other(_)));
    }

    #[test]
    fn test_grouped_types() {
        let src = "package p\n\ntype (\n\t// A named one.\n\tA int\n\tB string\n)\n";
        let file = parse(src);
        let decls: Vec<_> = file.type_decls().collect();
        assert_eq!(decls.len(), 2);
        assert_eq!(decls[0].doc, "A named one.");
        assert!(matches!(&decls[1].expr, TypeExpr::Named(n) if n == "string"));
    }

    #[test]
    fn test_syntax_error_is_fatal() {
        assert!(parse_file(&PathBuf::from("bad.go"), "package p\n$$$\n").is_err());
    }

    #[test]
    fn test_var_decl_parsed_and_distinct() {
        let src = "package p\nvar Default = 3\nconst Max = 10\n";
        let file = parse(src);
        assert_eq!(file.const_decls().count(), 1);
    }
}
