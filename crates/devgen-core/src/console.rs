//! Severity-aware terminal rendering for human-readable runs
//!
//! Machine output (`--dry-run --json`) owns stdout, so everything here is
//! written for stderr: color detection checks stderr's tty and honours
//! NO_COLOR. Tools never print; they emit diagnostics, and the CLI renders
//! them through this type.

use crate::diagnostics::{Diagnostic, Severity};
use std::env;
use std::io::{self, IsTerminal};

/// ANSI color selection for terminal output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Yellow,
    Blue,
    Green,
    Bold,
    Dim,
}

impl Color {
    fn code(self) -> &'static str {
        match self {
            Color::Red => "31",
            Color::Yellow => "33",
            Color::Blue => "34",
            Color::Green => "32",
            Color::Bold => "1",
            Color::Dim => "2",
        }
    }
}

/// Renders diagnostics and summaries for humans
pub struct Console {
    color_enabled: bool,
}

impl Console {
    /// Detect color support from stderr and NO_COLOR
    pub fn new() -> Self {
        Self {
            color_enabled: io::stderr().is_terminal() && env::var("NO_COLOR").is_err(),
        }
    }

    /// A console that never emits escape codes
    pub fn no_colors() -> Self {
        Self {
            color_enabled: false,
        }
    }

    pub fn is_color_enabled(&self) -> bool {
        self.color_enabled
    }

    /// Wrap text in the escape codes for `color`, when enabled
    pub fn paint(&self, text: &str, color: Color) -> String {
        if !self.color_enabled {
            return text.to_string();
        }
        format!("\x1b[{}m{text}\x1b[0m", color.code())
    }

    /// The color a severity renders in
    pub fn severity_color(severity: Severity) -> Color {
        match severity {
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Info => Color::Blue,
        }
    }

    /// One diagnostic as its display line, colored by severity:
    /// `tool[code] file:line:col: message`
    pub fn diagnostic_line(&self, diagnostic: &Diagnostic) -> String {
        self.paint(
            &diagnostic.to_string(),
            Self::severity_color(diagnostic.severity),
        )
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
