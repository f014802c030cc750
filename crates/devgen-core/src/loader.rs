//! Package loading: path patterns in, typed packages out
//!
//! Translates user patterns (`./...`, `./pkg/...`, explicit directories)
//! into [`Package`] values enriched with the semantic pass and the
//! per-declaration summaries of [`crate::model`]. Load failures are fatal:
//! without syntax and type facts no meaningful pipeline run is possible.

use crate::error::DevgenError;
use crate::model::{
    Enum, EnumValue, Field, Interface, Method, Package, Struct, TypesInfo, UnderlyingKind,
    builtin_kind,
};
use crate::result::Result;
use crate::syntax::{self, SourceFile, TypeExpr};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// Options controlling what the loader admits into the syntax trees
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Exclude files carrying the generated-file marker (the default for a
    /// full run; dry-runs never exclude them)
    pub ignore_generated_files: bool,
    /// Include `_test.go` files
    pub include_tests: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            ignore_generated_files: true,
            include_tests: false,
        }
    }
}

/// True iff the file content carries the generated-file marker
///
/// The first non-blank line must begin with `// Code generated` and contain
/// `DO NOT EDIT`.
pub fn is_generated_file(content: &str) -> bool {
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        return trimmed.starts_with("// Code generated") && trimmed.contains("DO NOT EDIT");
    }
    false
}

/// Expand user patterns into package directories, in pattern order
pub fn expand_patterns(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut push = |dir: PathBuf| {
        if !dirs.contains(&dir) {
            dirs.push(dir);
        }
    };

    for pattern in patterns {
        let pattern = pattern.trim_end_matches('/');
        if let Some(prefix) = pattern.strip_suffix("...") {
            let root = normalize(base, prefix.trim_end_matches('/'));
            if !root.is_dir() {
                return Err(DevgenError::load(format!(
                    "pattern '{pattern}' does not match a directory: {}",
                    root.display()
                )));
            }
            for dir in walk_package_dirs(&root)? {
                push(dir);
            }
        } else {
            let dir = normalize(base, pattern);
            if !dir.is_dir() {
                return Err(DevgenError::load(format!(
                    "no package at {}",
                    dir.display()
                )));
            }
            if !dir_has_go_files(&dir) {
                return Err(DevgenError::load(format!(
                    "no Go files in {}",
                    dir.display()
                )));
            }
            push(dir);
        }
    }
    Ok(dirs)
}

fn normalize(base: &Path, rel: &str) -> PathBuf {
    let rel = rel.trim_start_matches("./");
    if rel.is_empty() || rel == "." {
        base.to_path_buf()
    } else if Path::new(rel).is_absolute() {
        PathBuf::from(rel)
    } else {
        base.join(rel)
    }
}

/// Directories under `root` holding at least one `.go` file
fn walk_package_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            let name = e.file_name().to_string_lossy();
            !(e.file_type().is_dir()
                && (name.starts_with('.') || name == "vendor" || name == "testdata"))
        });
    for entry in walker {
        let entry = entry.map_err(|e| DevgenError::load(format!("walking {}: {e}", root.display())))?;
        if entry.file_type().is_dir() && dir_has_go_files(entry.path()) {
            dirs.push(entry.path().to_path_buf());
        }
    }
    Ok(dirs)
}

fn dir_has_go_files(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|entries| {
            entries.flatten().any(|e| {
                e.path().extension().is_some_and(|ext| ext == "go") && e.path().is_file()
            })
        })
        .unwrap_or(false)
}

/// Load every package named by `patterns`, in pattern-expansion order
pub fn load_packages(
    base: &Path,
    patterns: &[String],
    opts: &LoadOptions,
    cancel: &CancellationToken,
) -> Result<Vec<Package>> {
    let dirs = expand_patterns(base, patterns)?;
    let mut packages = Vec::with_capacity(dirs.len());
    for dir in dirs {
        if cancel.is_cancelled() {
            return Err(DevgenError::Cancelled);
        }
        if let Some(package) = load_package(&dir, opts)? {
            packages.push(package);
        }
    }
    tracing::debug!("loaded {} package(s)", packages.len());
    Ok(packages)
}

/// Load the package in one directory; `None` when every file is filtered out
fn load_package(dir: &Path, opts: &LoadOptions) -> Result<Option<Package>> {
    let dir = dir
        .canonicalize()
        .map_err(|e| DevgenError::io(dir.to_path_buf(), e))?;

    let mut file_paths: Vec<PathBuf> = fs::read_dir(&dir)
        .map_err(|e| DevgenError::io(dir.clone(), e))?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "go"))
        .collect();
    file_paths.sort();

    let mut files: Vec<SourceFile> = Vec::new();
    for path in file_paths {
        let file_name = path.file_name().unwrap_or_default().to_string_lossy();
        if !opts.include_tests && file_name.ends_with("_test.go") {
            continue;
        }
        let content = fs::read_to_string(&path).map_err(|e| DevgenError::io(path.clone(), e))?;
        if opts.ignore_generated_files && is_generated_file(&content) {
            tracing::debug!("skipping generated file {}", path.display());
            continue;
        }
        let parsed = syntax::parse_file(&path, &content)
            .map_err(|e| DevgenError::parse(e.message, e.pos))?;
        files.push(parsed);
    }

    if files.is_empty() {
        return Ok(None);
    }

    // External test packages (`foo_test`) do not join the primary package.
    let package_name = files
        .iter()
        .map(|f| f.package.clone())
        .find(|n| !n.ends_with("_test"))
        .unwrap_or_else(|| files[0].package.clone());
    files.retain(|f| {
        if f.package == package_name || f.package == format!("{package_name}_test") {
            true
        } else {
            tracing::warn!(
                "skipping {}: package {} does not match {}",
                f.path.display(),
                f.package,
                package_name
            );
            false
        }
    });

    let go_import_path = derive_import_path(&dir, &package_name);
    let pkg_path = go_import_path.clone();

    let types_info = build_types_info(&files);
    let (enums, interfaces, structs) = summarize(&files, &types_info);

    Ok(Some(Package {
        name: package_name,
        go_import_path,
        pkg_path,
        dir,
        syntax: files,
        types_info,
        enums,
        interfaces,
        structs,
    }))
}

/// Canonical import path: nearest go.mod module path plus the relative dir
fn derive_import_path(dir: &Path, package_name: &str) -> String {
    let mut current = Some(dir.to_path_buf());
    while let Some(candidate) = current {
        let gomod = candidate.join("go.mod");
        if gomod.is_file() {
            if let Ok(content) = fs::read_to_string(&gomod) {
                if let Some(module) = parse_module_line(&content) {
                    let rel = dir.strip_prefix(&candidate).unwrap_or(Path::new(""));
                    return if rel.as_os_str().is_empty() {
                        module
                    } else {
                        format!("{module}/{}", rel.to_string_lossy().replace('\\', "/"))
                    };
                }
            }
        }
        current = candidate.parent().map(Path::to_path_buf);
    }
    // No module context; the package name stands in.
    package_name.to_string()
}

fn parse_module_line(gomod: &str) -> Option<String> {
    gomod.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module ")
            .map(|m| m.trim().trim_matches('"').to_string())
    })
}

/// Build the shallow type facts: defined-type underlyings and const types
fn build_types_info(files: &[SourceFile]) -> TypesInfo {
    let mut named: HashMap<String, String> = HashMap::new();
    for file in files {
        for decl in file.type_decls() {
            if let TypeExpr::Named(target) = &decl.expr {
                named.insert(decl.name.clone(), target.clone());
            }
        }
    }

    // Chase named chains down to a terminal, guarding against cycles. The
    // terminal may be a non-integer non-string builtin (float64, …); tools
    // reject those with a diagnostic, so the loader still records them.
    let mut underlying: HashMap<String, String> = HashMap::new();
    for name in named.keys() {
        let mut seen = vec![name.clone()];
        let mut cursor = name.clone();
        loop {
            let Some(target) = named.get(&cursor) else {
                // `cursor` is not a locally defined type: it is the terminal.
                if cursor != *name {
                    underlying.insert(name.clone(), cursor);
                }
                break;
            };
            if builtin_kind(target) != UnderlyingKind::Other {
                underlying.insert(name.clone(), target.clone());
                break;
            }
            if seen.contains(target) {
                break;
            }
            seen.push(target.clone());
            cursor = target.clone();
        }
    }

    let mut const_types: HashMap<String, String> = HashMap::new();
    for file in files {
        for decl in file.const_decls() {
            let mut last_ty: Option<String> = None;
            for spec in &decl.specs {
                let ty = if spec.ty.is_some() {
                    spec.ty.clone()
                } else if spec.values.is_empty() {
                    // Wholly omitted spec inherits from the previous one.
                    last_ty.clone()
                } else {
                    None
                };
                if spec.ty.is_some() || !spec.values.is_empty() {
                    last_ty = ty.clone();
                }
                if let Some(ty) = ty {
                    for name in &spec.names {
                        const_types.insert(name.clone(), ty.clone());
                    }
                }
            }
        }
    }

    TypesInfo {
        underlying,
        const_types,
    }
}

/// Derive the enum / interface / struct summaries, in source order
fn summarize(
    files: &[SourceFile],
    types_info: &TypesInfo,
) -> (Vec<Enum>, Vec<Interface>, Vec<Struct>) {
    let mut enums = Vec::new();
    let mut interfaces = Vec::new();
    let mut structs = Vec::new();

    for file in files {
        for decl in file.type_decls() {
            match &decl.expr {
                TypeExpr::Named(_) => {
                    let Some(builtin) = types_info.underlying.get(&decl.name) else {
                        continue;
                    };
                    let values = collect_enum_values(files, &decl.name);
                    if values.is_empty() {
                        continue;
                    }
                    enums.push(Enum {
                        name: decl.name.clone(),
                        doc: decl.doc.clone(),
                        underlying_type: builtin.clone(),
                        values,
                        pos: decl.pos.clone(),
                    });
                }
                TypeExpr::Interface(methods) => {
                    interfaces.push(Interface {
                        name: decl.name.clone(),
                        doc: decl.doc.clone(),
                        pos: decl.pos.clone(),
                        methods: methods
                            .iter()
                            .map(|m| Method {
                                name: m.name.clone(),
                                signature: m.signature.clone(),
                                doc: m.doc.clone(),
                                pos: m.pos.clone(),
                            })
                            .collect(),
                    });
                }
                TypeExpr::Struct(fields) => {
                    structs.push(Struct {
                        name: decl.name.clone(),
                        doc: decl.doc.clone(),
                        pos: decl.pos.clone(),
                        fields: fields
                            .iter()
                            .map(|f| Field {
                                name: f.name.clone(),
                                ty: f.ty.clone(),
                                tag: f.tag.clone(),
                                doc: f.doc.clone(),
                                comment: f.comment.clone(),
                                pos: f.pos.clone(),
                            })
                            .collect(),
                    });
                }
                TypeExpr::Other(_) => {}
            }
        }
    }

    (enums, interfaces, structs)
}

/// The constants of one enum type across the package, in source order
fn collect_enum_values(files: &[SourceFile], type_name: &str) -> Vec<EnumValue> {
    let mut values = Vec::new();
    for file in files {
        for decl in file.const_decls() {
            let mut last_ty: Option<String> = None;
            for spec in &decl.specs {
                let ty = if spec.ty.is_some() {
                    spec.ty.clone()
                } else if spec.values.is_empty() {
                    last_ty.clone()
                } else {
                    None
                };
                if spec.ty.is_some() || !spec.values.is_empty() {
                    last_ty = ty.clone();
                }
                if ty.as_deref() != Some(type_name) {
                    continue;
                }
                for (idx, name) in spec.names.iter().enumerate() {
                    if name == "_" {
                        continue;
                    }
                    values.push(EnumValue {
                        name: name.clone(),
                        doc: spec.doc.clone(),
                        comment: spec.comment.clone(),
                        value: spec.values.get(idx).cloned().unwrap_or_default(),
                        pos: spec.pos.clone(),
                    });
                }
            }
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    fn load_one(dir: &Path, opts: &LoadOptions) -> Package {
        load_package(dir, opts).unwrap().expect("package expected")
    }

    const STATUS_GO: &str = "package jobs\n\n// Status of a job.\n// enumgen:@enum(string)\ntype Status int\n\nconst (\n\tStatusActive Status = 1\n\tStatusInactive Status = 2\n)\n";

    #[test]
    fn test_generated_file_marker() {
        assert!(is_generated_file(
            "// Code generated by devgen. DO NOT EDIT.\n\npackage p\n"
        ));
        assert!(is_generated_file(
            "\n\n// Code generated by something. DO NOT EDIT.\npackage p\n"
        ));
        assert!(!is_generated_file("// Package p does things.\npackage p\n"));
        assert!(!is_generated_file("package p\n// Code generated DO NOT EDIT\n"));
    }

    #[test]
    fn test_load_simple_enum_package() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "status.go", STATUS_GO);
        let pkg = load_one(tmp.path(), &LoadOptions::default());
        assert_eq!(pkg.name, "jobs");
        assert_eq!(pkg.enums.len(), 1);
        let e = &pkg.enums[0];
        assert_eq!(e.name, "Status");
        assert_eq!(e.underlying_type, "int");
        let names: Vec<_> = e.values.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["StatusActive", "StatusInactive"]);
    }

    #[test]
    fn test_generated_files_excluded_by_default() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "status.go", STATUS_GO);
        write(
            tmp.path(),
            "jobs_enum.go",
            "// Code generated by devgen. DO NOT EDIT.\n\npackage jobs\n\ntype Shadow int\nconst ShadowA Shadow = 1\n",
        );
        let pkg = load_one(tmp.path(), &LoadOptions::default());
        assert_eq!(pkg.enums.len(), 1);

        let keep_generated = LoadOptions {
            ignore_generated_files: false,
            ..LoadOptions::default()
        };
        let pkg = load_one(tmp.path(), &keep_generated);
        assert_eq!(pkg.enums.len(), 2);
    }

    #[test]
    fn test_test_files_excluded_by_default() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "status.go", STATUS_GO);
        write(
            tmp.path(),
            "status_test.go",
            "package jobs\n\ntype TestOnly int\nconst TestOnlyA TestOnly = 1\n",
        );
        let pkg = load_one(tmp.path(), &LoadOptions::default());
        assert_eq!(pkg.enums.len(), 1);

        let with_tests = LoadOptions {
            include_tests: true,
            ..LoadOptions::default()
        };
        let pkg = load_one(tmp.path(), &with_tests);
        assert_eq!(pkg.enums.len(), 2);
    }

    #[test]
    fn test_import_path_from_go_mod() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "go.mod", "module example.com/widgets\n\ngo 1.22\n");
        let sub = tmp.path().join("jobs");
        fs::create_dir(&sub).unwrap();
        write(&sub, "status.go", STATUS_GO);
        let pkg = load_one(&sub, &LoadOptions::default());
        assert_eq!(pkg.go_import_path, "example.com/widgets/jobs");
        assert_eq!(pkg.pkg_path, pkg.go_import_path);
    }

    #[test]
    fn test_pattern_expansion_recursive() {
        let tmp = TempDir::new().unwrap();
        let a = tmp.path().join("a");
        let b = tmp.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        write(&a, "a.go", "package a\n");
        write(&b, "b.go", "package b\n");
        let dirs = expand_patterns(tmp.path(), &["./...".to_string()]).unwrap();
        assert_eq!(dirs.len(), 2);
        assert!(dirs[0].ends_with("a"));
        assert!(dirs[1].ends_with("b"));
    }

    #[test]
    fn test_missing_package_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = expand_patterns(tmp.path(), &["nope".to_string()]).unwrap_err();
        assert!(err.to_string().contains("no package"));
    }

    #[test]
    fn test_two_loads_identical_order() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "status.go", STATUS_GO);
        write(
            tmp.path(),
            "extra.go",
            "package jobs\n\ntype Level int\nconst (\n\tLevelLow Level = iota\n\tLevelHigh\n)\n",
        );
        let opts = LoadOptions::default();
        let first = load_one(tmp.path(), &opts);
        let second = load_one(tmp.path(), &opts);
        let names = |p: &Package| {
            p.enums
                .iter()
                .map(|e| e.name.clone())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(
            first.enums[1].values.iter().map(|v| &v.name).collect::<Vec<_>>(),
            ["LevelLow", "LevelHigh"]
        );
    }

    #[test]
    fn test_iota_continuation_inherits_type() {
        let tmp = TempDir::new().unwrap();
        write(
            tmp.path(),
            "level.go",
            "package p\n\ntype Level int\n\nconst (\n\tLevelLow Level = iota\n\tLevelMid\n\tLevelHigh\n)\n",
        );
        let pkg = load_one(tmp.path(), &LoadOptions::default());
        assert_eq!(pkg.enums[0].values.len(), 3);
        assert_eq!(pkg.enums[0].values[2].name, "LevelHigh");
        assert_eq!(pkg.enums[0].values[2].value, "");
    }
}
