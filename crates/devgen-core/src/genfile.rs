//! In-memory buffers for files-to-be
//!
//! A [`GeneratedFile`] accumulates text fragments and a deferred import
//! registry. Import sentinels resolve when the file is rendered, never when
//! appended, so tools can reference symbols without deciding local
//! identifiers. Rendering is pure; committing to disk is the driver's job.

use crate::format::format_go_source;
use crate::result::Result;
use crate::DevgenError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;

/// A symbol in another package: "the identifier under which import path P is
/// visible in this file, dot, name"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoSymbol {
    pub import_path: String,
    pub name: String,
}

/// One appendable piece of output
#[derive(Debug, Clone)]
pub enum Fragment {
    Str(String),
    Int(i64),
    Symbol(GoSymbol),
}

impl From<&str> for Fragment {
    fn from(s: &str) -> Self {
        Fragment::Str(s.to_string())
    }
}

impl From<String> for Fragment {
    fn from(s: String) -> Self {
        Fragment::Str(s)
    }
}

impl From<i64> for Fragment {
    fn from(n: i64) -> Self {
        Fragment::Int(n)
    }
}

impl From<GoSymbol> for Fragment {
    fn from(s: GoSymbol) -> Self {
        Fragment::Symbol(s)
    }
}

/// Build an import sentinel fragment
pub fn symbol(import_path: impl Into<String>, name: impl Into<String>) -> Fragment {
    Fragment::Symbol(GoSymbol {
        import_path: import_path.into(),
        name: name.into(),
    })
}

/// A buffered output file keyed by path
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    path: PathBuf,
    owning_import_path: String,
    package_name: String,
    /// Lines of fragments; each `p` call appends one line
    lines: Vec<Vec<Fragment>>,
    /// Imports requested without a sentinel, by tools that inline fully
    /// spelled references (plugins do)
    forced_imports: BTreeSet<String>,
    /// Tools that wrote to this buffer, for error attribution
    contributors: Vec<String>,
}

impl GeneratedFile {
    pub(crate) fn new(
        path: PathBuf,
        owning_import_path: impl Into<String>,
        package_name: impl Into<String>,
    ) -> Self {
        Self {
            path,
            owning_import_path: owning_import_path.into(),
            package_name: package_name.into(),
            lines: Vec::new(),
            forced_imports: BTreeSet::new(),
            contributors: Vec::new(),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn owning_import_path(&self) -> &str {
        &self.owning_import_path
    }

    pub(crate) fn note_contributor(&mut self, tool: &str) {
        if !self.contributors.iter().any(|t| t == tool) {
            self.contributors.push(tool.to_string());
        }
    }

    /// Append fragments followed by a single newline
    pub fn p(&mut self, fragments: impl IntoIterator<Item = Fragment>) {
        self.lines.push(fragments.into_iter().collect());
    }

    /// Append one literal line
    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(vec![Fragment::Str(text.into())]);
    }

    /// Append an empty line
    pub fn blank(&mut self) {
        self.lines.push(Vec::new());
    }

    /// Register an import whose references are already spelled out in the
    /// appended text; the caller is responsible for actually using it
    pub fn use_import(&mut self, path: impl Into<String>) {
        let path = path.into();
        if path != self.owning_import_path {
            self.forced_imports.insert(path);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Render header, import block, and body into formatted source
    pub fn render(&self) -> Result<Vec<u8>> {
        let imports = self.referenced_imports();
        let idents = elect_identifiers(&imports);

        let mut out = String::new();
        out.push_str("// Code generated by devgen. DO NOT EDIT.\n\n");
        let _ = writeln!(out, "package {}\n", self.package_name);

        if !idents.is_empty() {
            out.push_str("import (\n");
            for (path, ident) in &idents {
                if ident == default_identifier(path).as_str() {
                    let _ = writeln!(out, "\t\"{path}\"");
                } else {
                    let _ = writeln!(out, "\t{ident} \"{path}\"");
                }
            }
            out.push_str(")\n\n");
        }

        for line in &self.lines {
            for fragment in line {
                match fragment {
                    Fragment::Str(s) => out.push_str(s),
                    Fragment::Int(n) => {
                        let _ = write!(out, "{n}");
                    }
                    Fragment::Symbol(sym) => {
                        if sym.import_path == self.owning_import_path {
                            out.push_str(&sym.name);
                        } else {
                            let Some(ident) = idents.get(&sym.import_path) else {
                                return Err(DevgenError::internal(format!(
                                    "no identifier elected for import {}",
                                    sym.import_path
                                )));
                            };
                            let _ = write!(out, "{ident}.{}", sym.name);
                        }
                    }
                }
            }
            out.push('\n');
        }

        let formatted = format_go_source(&out).map_err(|message| DevgenError::Format {
            tool: self.contributors.join("+"),
            path: self.path.clone(),
            message,
        })?;
        Ok(formatted.into_bytes())
    }

    /// Import paths referenced by sentinels, excluding the owning package
    fn referenced_imports(&self) -> BTreeSet<String> {
        let mut paths = self.forced_imports.clone();
        for line in &self.lines {
            for fragment in line {
                if let Fragment::Symbol(sym) = fragment {
                    if sym.import_path != self.owning_import_path {
                        paths.insert(sym.import_path.clone());
                    }
                }
            }
        }
        paths
    }
}

/// The identifier gofmt would use by default: the last path segment
fn default_identifier(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}

fn sanitize_identifier(segment: &str) -> String {
    let mut ident: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
    {
        ident.insert(0, '_');
    }
    if ident.is_empty() {
        ident.push('_');
    }
    ident
}

/// Pick an unambiguous local identifier per import path
///
/// The trailing segment wins; on collision, a decimal suffix is appended
/// until unique. Paths are processed in lexicographic order so the election
/// is deterministic.
fn elect_identifiers(paths: &BTreeSet<String>) -> BTreeMap<String, String> {
    let mut chosen: BTreeMap<String, String> = BTreeMap::new();
    let mut taken: BTreeSet<String> = BTreeSet::new();
    for path in paths {
        let base = sanitize_identifier(&default_identifier(path));
        let mut candidate = base.clone();
        let mut n = 2usize;
        while taken.contains(&candidate) {
            candidate = format!("{base}{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        chosen.insert(path.clone(), candidate);
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> GeneratedFile {
        GeneratedFile::new(
            PathBuf::from("/tmp/jobs_enum.go"),
            "example.com/widgets/jobs",
            "jobs",
        )
    }

    #[test]
    fn test_p_appends_one_newline_per_call() {
        let mut f = file();
        f.p(["var X = ".into(), Fragment::Int(7)]);
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        assert!(text.contains("var X = 7\n"));
    }

    #[test]
    fn test_header_and_package_clause() {
        let mut f = file();
        f.line("var X = 1");
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        assert!(text.starts_with("// Code generated by devgen. DO NOT EDIT.\n"));
        assert!(text.contains("\npackage jobs\n"));
    }

    #[test]
    fn test_import_block_sorted_and_complete() {
        let mut f = file();
        f.p(["var _ = ".into(), symbol("fmt", "Sprintf")]);
        f.p(["var _ = ".into(), symbol("encoding/json", "Marshal")]);
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        let json_idx = text.find("\"encoding/json\"").unwrap();
        let fmt_idx = text.find("\"fmt\"").unwrap();
        assert!(json_idx < fmt_idx, "imports must be lexicographic");
        assert!(text.contains("json.Marshal"));
        assert!(text.contains("fmt.Sprintf"));
    }

    #[test]
    fn test_no_unreferenced_imports() {
        let mut f = file();
        f.line("var X = 1");
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        assert!(!text.contains("import"));
    }

    #[test]
    fn test_collision_gets_numeric_suffix() {
        let mut f = file();
        f.p(["var _ = ".into(), symbol("database/sql/driver", "Value")]);
        f.p(["var _ = ".into(), symbol("example.com/other/driver", "Open")]);
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        assert!(text.contains("\t\"database/sql/driver\"\n"));
        assert!(text.contains("\tdriver2 \"example.com/other/driver\"\n"));
        assert!(text.contains("driver.Value"));
        assert!(text.contains("driver2.Open"));
    }

    #[test]
    fn test_own_package_symbols_are_unqualified() {
        let mut f = file();
        f.p([
            "var _ = ".into(),
            symbol("example.com/widgets/jobs", "Status"),
        ]);
        let text = String::from_utf8(f.render().unwrap()).unwrap();
        assert!(text.contains("var _ = Status\n"));
        assert!(!text.contains("import"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let build = || {
            let mut f = file();
            f.p(["var _ = ".into(), symbol("fmt", "Sprintf")]);
            f.line("var X = 1");
            f.render().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_formatter_rejection_names_contributors() {
        let mut f = file();
        f.note_contributor("enumgen");
        f.line("func broken() {");
        let err = f.render().unwrap_err();
        assert!(err.to_string().contains("enumgen"));
    }
}
