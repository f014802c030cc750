//! Annotation parsing for documentation comments
//!
//! A directive has the on-disk form `tool:@name` or `tool:@name(args)` and is
//! recognised only at the start of a line (after whitespace stripping; the
//! loader already removed comment markers). Anything else is prose and is
//! ignored without a diagnostic.
//!
//! This module is pure: string in, annotations out. No I/O and no package
//! knowledge.

use std::fmt;

/// A single directive extracted from a documentation comment
///
/// Immutable once parsed. `raw` preserves the original textual form for
/// display; equality is over the parsed fields, so a re-rendered annotation
/// compares equal to its source.
#[derive(Debug, Clone, Eq)]
pub struct Annotation {
    /// The generator the directive is addressed to
    pub tool: String,
    /// The directive name
    pub name: String,
    /// Positional arguments, in source order
    pub flags: Vec<String>,
    /// Named arguments; keys unique, later value wins
    pub kv: Vec<(String, String)>,
    /// The original textual form
    pub raw: String,
}

impl PartialEq for Annotation {
    fn eq(&self, other: &Self) -> bool {
        self.tool == other.tool
            && self.name == other.name
            && self.flags == other.flags
            && self.kv == other.kv
    }
}

impl Annotation {
    /// True if the positional flag is present
    pub fn has(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// The value for a named argument, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.kv
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The value for a named argument, or a default
    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Serialise back to directive form with canonical spacing
    pub fn render(&self) -> String {
        let mut out = format!("{}:@{}", self.tool, self.name);
        if self.flags.is_empty() && self.kv.is_empty() {
            return out;
        }
        out.push('(');
        let mut items: Vec<String> = self.flags.iter().map(|f| quote_if_needed(f)).collect();
        for (k, v) in &self.kv {
            items.push(format!("{}={}", k, quote_if_needed(v)));
        }
        out.push_str(&items.join(", "));
        out.push(')');
        out
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// Extract every directive from a documentation block, in source order
///
/// An empty doc yields an empty vec. A directive with a syntax error (e.g.
/// an unknown escape sequence) is dropped; the rest of the block continues
/// parsing.
pub fn parse_annotations(doc: &str) -> Vec<Annotation> {
    let mut out = Vec::new();
    for line in doc.lines() {
        let trimmed = line.trim_start();
        match parse_directive(trimmed) {
            Ok(Some(annotation)) => out.push(annotation),
            Ok(None) => {}
            Err(err) => {
                tracing::debug!("dropping malformed directive {trimmed:?}: {err}");
            }
        }
    }
    out
}

/// True iff the doc carries a directive addressed to `tool` named `name`
pub fn has_annotation(doc: &str, tool: &str, name: &str) -> bool {
    get_annotation(doc, tool, name).is_some()
}

/// The first directive addressed to `tool` named `name`, if any
pub fn get_annotation(doc: &str, tool: &str, name: &str) -> Option<Annotation> {
    parse_annotations(doc)
        .into_iter()
        .find(|a| a.tool == tool && a.name == name)
}

fn quote_if_needed(value: &str) -> String {
    let needs_quoting = value.is_empty()
        || value.chars().any(|c| {
            c.is_whitespace() || c == ',' || c == '"' || c == '\\'
        })
        || !balanced_parens(value);
    if !needs_quoting {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            other => quoted.push(other),
        }
    }
    quoted.push('"');
    quoted
}

fn balanced_parens(value: &str) -> bool {
    let mut depth = 0i32;
    for c in value.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse one line that may begin with a directive
///
/// `Ok(None)` means the line is prose; `Err` means the line started as a
/// directive but is malformed and must be dropped.
fn parse_directive(line: &str) -> Result<Option<Annotation>, String> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    let tool = scan_ident(&chars, &mut i);
    if tool.is_empty() {
        return Ok(None);
    }
    if chars.get(i) != Some(&':') {
        return Ok(None);
    }
    i += 1;
    if chars.get(i) != Some(&'@') {
        return Ok(None);
    }
    i += 1;
    let name = scan_ident(&chars, &mut i);
    if name.is_empty() {
        return Ok(None);
    }

    let (flags, kv, end) = match chars.get(i) {
        Some('(') => {
            let close = find_matching_paren(&chars, i)?;
            let args: String = chars[i + 1..close].iter().collect();
            let (flags, kv) = parse_args(&args)?;
            (flags, kv, close + 1)
        }
        // The directive token ends at whitespace or end of line; anything
        // glued on makes the token prose, not a directive.
        Some(c) if !c.is_whitespace() => return Ok(None),
        _ => (Vec::new(), Vec::new(), i),
    };

    let raw: String = chars[..end].iter().collect();
    Ok(Some(Annotation {
        tool,
        name,
        flags,
        kv,
        raw,
    }))
}

fn scan_ident(chars: &[char], i: &mut usize) -> String {
    let start = *i;
    if let Some(&c) = chars.get(*i) {
        if !is_ident_start(c) {
            return String::new();
        }
        *i += 1;
    } else {
        return String::new();
    }
    while let Some(&c) = chars.get(*i) {
        if is_ident_continue(c) {
            *i += 1;
        } else {
            break;
        }
    }
    chars[start..*i].iter().collect()
}

/// Index of the parenthesis matching `chars[open]`, quote-aware
fn find_matching_paren(chars: &[char], open: usize) -> Result<usize, String> {
    let mut depth = 0i32;
    let mut i = open;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                i = skip_quoted(chars, i)?;
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    Err("unclosed parenthesis".to_string())
}

/// Index just past the quoted string opening at `chars[start]`
fn skip_quoted(chars: &[char], start: usize) -> Result<usize, String> {
    let mut i = start + 1;
    while i < chars.len() {
        match chars[i] {
            '\\' => {
                match chars.get(i + 1) {
                    Some('\\' | '"' | 'n' | 't' | 'r') => i += 2,
                    Some(other) => return Err(format!("unknown escape sequence '\\{other}'")),
                    None => return Err("unterminated escape".to_string()),
                }
            }
            '"' => return Ok(i + 1),
            _ => i += 1,
        }
    }
    Err("unterminated string".to_string())
}

/// Split an argument list on top-level commas and classify each item
#[allow(clippy::type_complexity)]
fn parse_args(args: &str) -> Result<(Vec<String>, Vec<(String, String)>), String> {
    let mut flags = Vec::new();
    let mut kv: Vec<(String, String)> = Vec::new();

    for item in split_top_level(args)? {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        match split_key_value(item)? {
            Some((key, value)) => {
                // Later value wins for duplicate keys.
                if let Some(entry) = kv.iter_mut().find(|(k, _)| *k == key) {
                    entry.1 = value;
                } else {
                    kv.push((key, value));
                }
            }
            None => flags.push(parse_value(item)?),
        }
    }
    Ok((flags, kv))
}

/// Split on commas at paren depth zero outside quotes
fn split_top_level(args: &str) -> Result<Vec<String>, String> {
    let chars: Vec<char> = args.chars().collect();
    let mut items = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                i = skip_quoted(&chars, i)?;
                continue;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                items.push(chars[start..i].iter().collect());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    items.push(chars[start..].iter().collect());
    Ok(items)
}

/// Split `KEY=VALUE` at the first top-level `=`; `None` for a positional flag
fn split_key_value(item: &str) -> Result<Option<(String, String)>, String> {
    let chars: Vec<char> = item.chars().collect();
    let mut depth = 0i32;
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '"' => {
                i = skip_quoted(&chars, i)?;
                continue;
            }
            '(' => depth += 1,
            ')' => depth -= 1,
            '=' if depth == 0 => {
                let key: String = chars[..i].iter().collect::<String>().trim().to_string();
                let value_src: String = chars[i + 1..].iter().collect();
                if key.is_empty() || !key.chars().all(is_ident_continue) {
                    return Err(format!("invalid key '{key}'"));
                }
                return Ok(Some((key, parse_value(value_src.trim())?)));
            }
            _ => {}
        }
        i += 1;
    }
    Ok(None)
}

/// Decode a value: quoted strings are unescaped, everything else is raw text
fn parse_value(src: &str) -> Result<String, String> {
    let chars: Vec<char> = src.chars().collect();
    if chars.first() != Some(&'"') {
        return Ok(src.to_string());
    }
    let end = skip_quoted(&chars, 0)?;
    if end != chars.len() {
        return Err(format!("trailing content after string in '{src}'"));
    }
    let mut out = String::new();
    let mut i = 1;
    while i < end - 1 {
        if chars[i] == '\\' {
            match chars[i + 1] {
                '\\' => out.push('\\'),
                '"' => out.push('"'),
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                other => return Err(format!("unknown escape sequence '\\{other}'")),
            }
            i += 2;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    Ok(out)
}
