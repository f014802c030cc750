//! Stabilised formatting for rendered Go source
//!
//! devgen does not shell out to gofmt; rendering ends here instead. The
//! rules are fixed and documented (users diff generated files): tab
//! indentation derived from nesting depth, stripped trailing whitespace,
//! collapsed blank lines, one trailing newline, and a structural validation
//! pass. Validation failure is the "formatter rejected generated text"
//! fatal error of the pipeline.

/// Normalise and validate rendered Go source
pub fn format_go_source(src: &str) -> Result<String, String> {
    validate(src)?;
    Ok(reflow(src))
}

/// Structural validation: balanced delimiters outside literal and comment
/// contexts, and a package clause
fn validate(src: &str) -> Result<(), String> {
    let mut stack: Vec<char> = Vec::new();
    let mut scanner = Scanner::new(src);
    while let Some(c) = scanner.next_code_char() {
        match c {
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(expected) {
                    return Err(format!("unbalanced '{c}'"));
                }
            }
            _ => {}
        }
    }
    if let Some(open) = stack.last() {
        return Err(format!("unclosed '{open}'"));
    }
    if scanner.unterminated() {
        return Err("unterminated literal or comment".to_string());
    }
    if !src
        .lines()
        .any(|l| l.trim_start().starts_with("package "))
    {
        return Err("missing package clause".to_string());
    }
    Ok(())
}

/// Re-indent by nesting depth and normalise blank lines
fn reflow(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut depth: i32 = 0;
    let mut blank_run = 0usize;
    let mut wrote_any = false;
    let mut state = LineState::Code;

    for line in src.lines() {
        // Lines continuing a raw string or block comment pass through as-is.
        if state != LineState::Code {
            state = scan_line_state(line, state, &mut depth);
            out.push_str(line.trim_end());
            out.push('\n');
            blank_run = 0;
            wrote_any = true;
            continue;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }
        if wrote_any && blank_run > 0 {
            out.push('\n');
        }
        blank_run = 0;

        let mut indent = depth;
        let first = trimmed.chars().next().unwrap_or(' ');
        if matches!(first, '}' | ')' | ']') {
            indent -= 1;
        }
        // Switch case labels sit at the switch's own level.
        if trimmed.starts_with("case ") || trimmed.starts_with("default:") {
            indent -= 1;
        }
        for _ in 0..indent.max(0) {
            out.push('\t');
        }
        out.push_str(trimmed);
        out.push('\n');
        wrote_any = true;

        state = scan_line_state(trimmed, LineState::Code, &mut depth);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    Code,
    RawString,
    BlockComment,
}

/// Update nesting depth over one line, reporting the state it ends in
fn scan_line_state(line: &str, start: LineState, depth: &mut i32) -> LineState {
    let mut chars = line.chars().peekable();
    let mut state = start;
    let mut in_str = false;
    let mut in_rune = false;
    while let Some(c) = chars.next() {
        match state {
            LineState::RawString => {
                if c == '`' {
                    state = LineState::Code;
                }
            }
            LineState::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = LineState::Code;
                }
            }
            LineState::Code => {
                if in_str {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '"' => in_str = false,
                        _ => {}
                    }
                    continue;
                }
                if in_rune {
                    match c {
                        '\\' => {
                            chars.next();
                        }
                        '\'' => in_rune = false,
                        _ => {}
                    }
                    continue;
                }
                match c {
                    '"' => in_str = true,
                    '\'' => in_rune = true,
                    '`' => state = LineState::RawString,
                    '/' if chars.peek() == Some(&'/') => return state,
                    '/' if chars.peek() == Some(&'*') => {
                        chars.next();
                        state = LineState::BlockComment;
                    }
                    '{' | '(' | '[' => *depth += 1,
                    '}' | ')' | ']' => *depth -= 1,
                    _ => {}
                }
            }
        }
    }
    state
}

/// Character scanner yielding only code characters (outside literals and
/// comments), used by validation
struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    unterminated: bool,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            chars: src.chars().peekable(),
            unterminated: false,
        }
    }

    fn unterminated(&self) -> bool {
        self.unterminated
    }

    fn next_code_char(&mut self) -> Option<char> {
        loop {
            let c = self.chars.next()?;
            match c {
                '"' => {
                    if !self.skip_until_quote('"', true) {
                        self.unterminated = true;
                        return None;
                    }
                }
                '\'' => {
                    if !self.skip_until_quote('\'', true) {
                        self.unterminated = true;
                        return None;
                    }
                }
                '`' => {
                    if !self.skip_until_quote('`', false) {
                        self.unterminated = true;
                        return None;
                    }
                }
                '/' => match self.chars.peek() {
                    Some('/') => {
                        for c in self.chars.by_ref() {
                            if c == '\n' {
                                break;
                            }
                        }
                    }
                    Some('*') => {
                        self.chars.next();
                        let mut closed = false;
                        while let Some(c) = self.chars.next() {
                            if c == '*' && self.chars.peek() == Some(&'/') {
                                self.chars.next();
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            self.unterminated = true;
                            return None;
                        }
                    }
                    _ => return Some(c),
                },
                other => return Some(other),
            }
        }
    }

    fn skip_until_quote(&mut self, quote: char, escapes: bool) -> bool {
        while let Some(c) = self.chars.next() {
            if escapes && c == '\\' {
                self.chars.next();
            } else if c == quote {
                return true;
            }
        }
        false
    }
}
