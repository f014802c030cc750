//! Output formatting: human diagnostic lines and the dry-run JSON report

use devgen_core::{Color, Console, Diagnostic, Severity};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Maximum bytes of rendered text included per file in the JSON report
const PREVIEW_LIMIT: usize = 500;

/// Aggregate counters for one invocation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStats {
    pub packages_loaded: usize,
    pub files_generated: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

impl RunStats {
    pub fn count_diagnostics(&mut self, diagnostics: &[Diagnostic]) {
        for d in diagnostics {
            match d.severity {
                Severity::Error => self.error_count += 1,
                Severity::Warning => self.warning_count += 1,
                Severity::Info => {}
            }
        }
    }
}

/// The machine-readable dry-run report printed by `--dry-run --json`
#[derive(Debug, Serialize)]
pub struct DryRunReport {
    pub success: bool,
    pub files: BTreeMap<String, String>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: RunStats,
}

impl DryRunReport {
    pub fn new(
        rendered: &BTreeMap<PathBuf, Vec<u8>>,
        diagnostics: Vec<Diagnostic>,
        mut stats: RunStats,
    ) -> Self {
        stats.files_generated = rendered.len();
        stats.count_diagnostics(&diagnostics);
        let files = rendered
            .iter()
            .map(|(path, bytes)| {
                (
                    path.display().to_string(),
                    truncate_preview(bytes, PREVIEW_LIMIT),
                )
            })
            .collect();
        Self {
            success: stats.error_count == 0,
            files,
            diagnostics,
            stats,
        }
    }
}

/// Lossy UTF-8 preview cut at a char boundary within `limit` bytes
fn truncate_preview(bytes: &[u8], limit: usize) -> String {
    let text = String::from_utf8_lossy(bytes);
    if text.len() <= limit {
        return text.into_owned();
    }
    let mut end = limit;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

/// Print one diagnostic per line: `tool[code] file:line:col: message`
pub fn print_diagnostics_human(console: &Console, diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("{}", console.diagnostic_line(d));
    }
}

/// Print the closing human-readable summary
pub fn print_summary_human(console: &Console, stats: &RunStats, dry_run: bool) {
    let files = format!(
        "{} file{}",
        stats.files_generated,
        if stats.files_generated == 1 { "" } else { "s" }
    );
    let action = if dry_run { "would generate" } else { "generated" };
    let mut line = format!(
        "{} package{}, {action} {files}",
        stats.packages_loaded,
        if stats.packages_loaded == 1 { "" } else { "s" },
    );
    if stats.error_count > 0 {
        line.push_str(&format!(
            ", {}",
            console.paint(&format!("{} errors", stats.error_count), Color::Red)
        ));
    }
    if stats.warning_count > 0 {
        line.push_str(&format!(
            ", {}",
            console.paint(&format!("{} warnings", stats.warning_count), Color::Yellow)
        ));
    }
    eprintln!("{line}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgen_core::SourcePos;

    fn diag(severity: Severity) -> Diagnostic {
        Diagnostic::new(
            severity,
            "EG01",
            "enumgen",
            "boom",
            SourcePos::new("a.go", 1, 2),
        )
    }

    #[test]
    fn test_report_success_tracks_errors() {
        let rendered = BTreeMap::new();
        let ok = DryRunReport::new(&rendered, vec![diag(Severity::Warning)], RunStats::default());
        assert!(ok.success);
        let bad = DryRunReport::new(&rendered, vec![diag(Severity::Error)], RunStats::default());
        assert!(!bad.success);
        assert_eq!(bad.stats.error_count, 1);
    }

    #[test]
    fn test_preview_truncated_to_limit() {
        let long = vec![b'a'; 2000];
        let preview = truncate_preview(&long, PREVIEW_LIMIT);
        assert_eq!(preview.len(), PREVIEW_LIMIT);
    }

    #[test]
    fn test_report_schema_field_names() {
        let mut rendered = BTreeMap::new();
        rendered.insert(PathBuf::from("/p/a_enum.go"), b"package p\n".to_vec());
        let report = DryRunReport::new(&rendered, vec![diag(Severity::Error)], RunStats::default());
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["files"]["/p/a_enum.go"].is_string());
        assert_eq!(json["stats"]["filesGenerated"], 1);
        assert_eq!(json["stats"]["errorCount"], 1);
        assert_eq!(json["diagnostics"][0]["severity"], "error");
        assert_eq!(json["diagnostics"][0]["file"], "a.go");
        assert_eq!(json["diagnostics"][0]["line"], 1);
        assert_eq!(json["diagnostics"][0]["column"], 2);
    }
}
