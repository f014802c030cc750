//! Enum helper synthesis
//!
//! Recognises `enumgen:@enum(opts…)` on integer- or string-underlying named
//! types and `enumgen:@name(NAME)` on their constants, then generates
//! validity checks, display-name encodings, and a companion helper object
//! into one `<package>_enum.go` per input package.

mod emit;

use devgen_core::annotation::{get_annotation, has_annotation};
use devgen_core::diagnostics::{Diagnostic, DiagnosticCollector};
use devgen_core::driver::Driver;
use devgen_core::model::{Enum, Package, UnderlyingKind};
use devgen_core::tool::{
    AnnotationSpec, AnnotationTarget, ParamKind, ParamSpec, Rule, Tool, ToolConfig,
};
use devgen_core::Result;

/// Tool name; also the annotation namespace
pub const TOOL_NAME: &str = "enumgen";

/// Suffix of generated files, overridable through the config file
pub const OUTPUT_SUFFIX: &str = "_enum.go";

// Stable diagnostic codes.
const CODE_UNSUPPORTED_UNDERLYING: &str = "EG01";
const CODE_NAME_ON_STRING: &str = "EG02";
const CODE_DUPLICATE_NAME: &str = "EG03";
const CODE_NAME_WITHOUT_ARG: &str = "EG04";
const CODE_UNKNOWN_OPTION: &str = "EG05";

/// Which helper families an `@enum` annotation asked for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct EnumOptions {
    pub string: bool,
    pub json: bool,
    pub text: bool,
    pub sql: bool,
}

/// A validated generation target
pub(crate) struct EnumPlan<'a> {
    pub decl: &'a Enum,
    pub options: EnumOptions,
    /// Constant name → display name, in declaration order (integer kinds)
    pub display_names: Vec<(String, String)>,
}

/// The enum helper generator
#[derive(Debug, Default)]
pub struct EnumGen;

impl EnumGen {
    pub fn new() -> Self {
        Self
    }
}

impl Tool for EnumGen {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn run(&self, driver: &mut Driver, diags: &mut DiagnosticCollector) -> Result<()> {
        let packages: Vec<Package> = driver.packages().to_vec();
        for package in &packages {
            let plans = analyze_package(package, diags);
            if plans.is_empty() {
                continue;
            }
            let out_path = package.dir.join(format!("{}{OUTPUT_SUFFIX}", package.name));
            let file = driver.new_generated_file(out_path, &package.go_import_path);
            for (i, plan) in plans.iter().enumerate() {
                if i > 0 {
                    file.blank();
                }
                emit::emit_enum(file, plan);
            }
            if driver.include_tests() {
                let test_path = package
                    .dir
                    .join(format!("{}_enum_test.go", package.name));
                let test_file = driver.new_generated_file(test_path, &package.go_import_path);
                emit::emit_test_file(test_file, &plans);
            }
        }
        Ok(())
    }

    fn validate(&self, driver: &Driver) -> Option<Vec<Diagnostic>> {
        let mut collector = DiagnosticCollector::new(TOOL_NAME);
        for package in driver.packages() {
            analyze_package(package, &mut collector);
        }
        Some(collector.into_collected())
    }

    fn config(&self) -> Option<ToolConfig> {
        Some(ToolConfig {
            tool: TOOL_NAME.to_string(),
            output_suffix: Some(OUTPUT_SUFFIX.to_string()),
            annotations: vec![
                AnnotationSpec {
                    name: "enum".to_string(),
                    target: AnnotationTarget::Type,
                    doc: "Marks an integer- or string-underlying type as an enum and \
                          selects generated helpers"
                        .to_string(),
                    params: Some(ParamSpec {
                        kind: ParamKind::Enumerated {
                            values: ["string", "json", "text", "sql"]
                                .iter()
                                .map(|s| s.to_string())
                                .collect(),
                        },
                        max_args: Some(4),
                    }),
                },
                AnnotationSpec {
                    name: "name".to_string(),
                    target: AnnotationTarget::Field,
                    doc: "Overrides the display name of a single constant; not allowed \
                          on string-underlying enums"
                        .to_string(),
                    params: Some(ParamSpec {
                        kind: ParamKind::Freeform {
                            placeholder: "NAME".to_string(),
                        },
                        max_args: Some(1),
                    }),
                },
            ],
        })
    }

    fn rules(&self) -> Vec<Rule> {
        vec![Rule {
            description: "Declaring enums for enumgen".to_string(),
            globs: vec!["**/*.go".to_string()],
            always_apply: false,
            content: "\
# Enum declarations

Annotate a named integer or string type with `// enumgen:@enum(...)` and \
declare its values as a contiguous const group of that type. Options: \
`string`, `json`, `text`, `sql`. Override a constant's display name with \
`// enumgen:@name(NAME)` (integer enums only). Run `devgen` after editing \
annotated declarations; never edit `*_enum.go` files by hand.\n"
                .to_string(),
        }]
    }
}

/// Validate every annotated enum of one package into plans
///
/// Enums whose validation produced an error are excluded, so a bad type
/// never reaches emission while its package siblings still generate.
pub(crate) fn analyze_package<'a>(
    package: &'a Package,
    diags: &mut DiagnosticCollector,
) -> Vec<EnumPlan<'a>> {
    let mut plans = Vec::new();
    for decl in &package.enums {
        if !has_annotation(&decl.doc, TOOL_NAME, "enum") {
            continue;
        }
        if let Some(plan) = analyze_enum(decl, diags) {
            plans.push(plan);
        }
    }
    plans
}

fn analyze_enum<'a>(decl: &'a Enum, diags: &mut DiagnosticCollector) -> Option<EnumPlan<'a>> {
    let annotation = get_annotation(&decl.doc, TOOL_NAME, "enum")?;

    let mut options = EnumOptions::default();
    for flag in &annotation.flags {
        match flag.as_str() {
            "string" => options.string = true,
            "json" => options.json = true,
            "text" => options.text = true,
            "sql" => options.sql = true,
            other => diags.warning(
                CODE_UNKNOWN_OPTION,
                format!("unknown @enum option '{other}' on {}", decl.name),
                decl.pos.clone(),
            ),
        }
    }

    let kind = decl.underlying_kind();
    if kind == UnderlyingKind::Other {
        diags.error(
            CODE_UNSUPPORTED_UNDERLYING,
            format!(
                "enum {} has unsupported underlying type {}; integer or string required",
                decl.name, decl.underlying_type
            ),
            decl.pos.clone(),
        );
        return None;
    }

    let mut failed = false;
    let mut display_names: Vec<(String, String)> = Vec::new();

    for value in &decl.values {
        let override_name = match get_annotation(&value.doc, TOOL_NAME, "name") {
            Some(name_annotation) => {
                if kind == UnderlyingKind::String {
                    diags.error(
                        CODE_NAME_ON_STRING,
                        format!(
                            "@name on {}.{}: string-underlying enums use their value as the name",
                            decl.name, value.name
                        ),
                        value.pos.clone(),
                    );
                    failed = true;
                    continue;
                }
                match name_annotation.flags.first() {
                    Some(name) => Some(name.clone()),
                    None => {
                        diags.error(
                            CODE_NAME_WITHOUT_ARG,
                            format!("@name on {}.{} has no argument", decl.name, value.name),
                            value.pos.clone(),
                        );
                        failed = true;
                        continue;
                    }
                }
            }
            None => None,
        };

        let display = override_name.unwrap_or_else(|| derive_display_name(&decl.name, &value.name));
        if let Some((previous, _)) = display_names.iter().find(|(_, d)| *d == display) {
            diags.error(
                CODE_DUPLICATE_NAME,
                format!(
                    "duplicate display name \"{display}\" on {}.{} (already used by {previous})",
                    decl.name, value.name
                ),
                value.pos.clone(),
            );
            failed = true;
            continue;
        }
        display_names.push((value.name.clone(), display));
    }

    if failed {
        return None;
    }
    Some(EnumPlan {
        decl,
        options,
        display_names,
    })
}

/// Default display name: the constant with the type name stripped as a
/// prefix, unless stripping leaves nothing
fn derive_display_name(type_name: &str, const_name: &str) -> String {
    match const_name.strip_prefix(type_name) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => const_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devgen_core::driver::{Driver, DriverOptions};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn run_over(files: &[(&str, &str)]) -> (DiagnosticCollector, Option<String>, TempDir) {
        let tmp = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(tmp.path().join(name), content).unwrap();
        }
        let mut driver = Driver::new(DriverOptions {
            dir: Some(tmp.path().to_path_buf()),
            ..DriverOptions::default()
        })
        .unwrap();
        driver.load(&[".".to_string()]).unwrap();

        let tool = EnumGen::new();
        let mut diags = DiagnosticCollector::new(TOOL_NAME);
        driver.begin_tool(TOOL_NAME);
        tool.run(&mut driver, &mut diags).unwrap();

        let rendered = driver.dry_run().unwrap();
        let text = rendered
            .iter()
            .find(|(path, _)| !path_is_test(path))
            .map(|(_, bytes)| String::from_utf8(bytes.clone()).unwrap());
        (diags, text, tmp)
    }

    fn path_is_test(path: &Path) -> bool {
        path.to_string_lossy().ends_with("_test.go")
    }

    const INT_ENUM: &str = "package jobs\n\n// Status of a job.\n// enumgen:@enum(string, json, text, sql)\ntype Status int\n\nconst (\n\tStatusActive Status = 1\n\tStatusInactive Status = 2\n)\n";

    #[test]
    fn test_derive_display_name() {
        assert_eq!(derive_display_name("Status", "StatusActive"), "Active");
        assert_eq!(derive_display_name("Status", "Status"), "Status");
        assert_eq!(derive_display_name("Status", "Other"), "Other");
    }

    #[test]
    fn test_int_enum_generates_full_surface() {
        let (diags, text, _tmp) = run_over(&[("status.go", INT_ENUM)]);
        assert!(!diags.has_errors(), "{:?}", diags.collect());
        let text = text.expect("output file expected");

        assert!(text.starts_with("// Code generated by devgen. DO NOT EDIT.\n"));
        assert!(text.contains("func (v Status) IsValid() bool"));
        assert!(text.contains("func (v Status) String() string"));
        assert!(text.contains("func (v Status) MarshalJSON() ([]byte, error)"));
        assert!(text.contains("func (v *Status) UnmarshalJSON(data []byte) error"));
        assert!(text.contains("func (v Status) MarshalText() ([]byte, error)"));
        assert!(text.contains("func (v *Status) UnmarshalText(text []byte) error"));
        assert!(text.contains("func (v Status) Value() (driver.Value, error)"));
        assert!(text.contains("func (v *Status) Scan(src any) error"));
        assert!(text.contains("var StatusEnums = statusEnums{}"));
        assert!(text.contains("StatusActive: \"Active\""));
        assert!(text.contains("\"Inactive\": StatusInactive"));
        assert!(text.contains("\"Status(%d)\""));
        assert!(text.contains("\"database/sql/driver\""));
        assert!(text.contains("\"encoding/json\""));
        assert!(text.contains("\"fmt\""));
    }

    #[test]
    fn test_name_override() {
        let src = "package jobs\n\n// enumgen:@enum(string)\ntype Code int\n\nconst (\n\t// enumgen:@name(ERR_NOT_FOUND)\n\tCodeNotFound Code = 404\n\tCodeOK Code = 200\n)\n";
        let (diags, text, _tmp) = run_over(&[("code.go", src)]);
        assert!(!diags.has_errors());
        let text = text.unwrap();
        assert!(text.contains("CodeNotFound: \"ERR_NOT_FOUND\""));
        assert!(text.contains("\"ERR_NOT_FOUND\": CodeNotFound"));
    }

    #[test]
    fn test_string_enum_surface() {
        let src = "package paint\n\n// enumgen:@enum(string, json)\ntype Color string\n\nconst (\n\tColorRed Color = \"red\"\n\tColorBlue Color = \"blue\"\n)\n";
        let (diags, text, _tmp) = run_over(&[("color.go", src)]);
        assert!(!diags.has_errors());
        let text = text.unwrap();
        assert!(text.contains("func (v Color) IsValid() bool"));
        assert!(text.contains("_ColorSet"));
        assert!(text.contains("func (v Color) String() string"));
        // Name helpers are not generated for string enums.
        assert!(!text.contains(") Name("));
        assert!(!text.contains(") Names("));
        assert!(!text.contains(") ContainsName("));
        assert!(text.contains(") Parse("));
    }

    #[test]
    fn test_string_enum_rejects_name_override() {
        let src = "package paint\n\n// enumgen:@enum(string, json)\ntype Color string\n\nconst (\n\t// enumgen:@name(RED)\n\tColorRed Color = \"red\"\n)\n";
        let (diags, text, _tmp) = run_over(&[("color.go", src)]);
        assert!(diags.has_errors());
        assert!(diags.collect().iter().any(|d| d.code == "EG02"));
        assert!(text.is_none(), "no output file for the failed type");
    }

    #[test]
    fn test_duplicate_display_name_rejected() {
        let src = "package jobs\n\n// enumgen:@enum(string)\ntype Status int\n\nconst (\n\t// enumgen:@name(Active)\n\tStatusA Status = 1\n\t// enumgen:@name(Active)\n\tStatusB Status = 2\n)\n";
        let (diags, text, _tmp) = run_over(&[("status.go", src)]);
        assert!(diags.has_errors());
        assert!(diags.collect().iter().any(|d| d.code == "EG03"));
        assert!(text.is_none());
    }

    #[test]
    fn test_name_without_argument_rejected() {
        let src = "package jobs\n\n// enumgen:@enum\ntype Status int\n\nconst (\n\t// enumgen:@name\n\tStatusA Status = 1\n)\n";
        let (diags, text, _tmp) = run_over(&[("status.go", src)]);
        assert!(diags.collect().iter().any(|d| d.code == "EG04"));
        assert!(text.is_none());
    }

    #[test]
    fn test_unannotated_enum_ignored() {
        let src = "package jobs\n\ntype Plain int\n\nconst PlainA Plain = 1\n";
        let (diags, text, _tmp) = run_over(&[("plain.go", src)]);
        assert!(diags.is_empty());
        assert!(text.is_none());
    }

    #[test]
    fn test_failed_enum_does_not_suppress_siblings() {
        let bad = "package jobs\n\n// enumgen:@enum(string)\ntype Bad float64\n\nconst BadA Bad = 1\n";
        let good = "package jobs\n\n// enumgen:@enum\ntype Good int\n\nconst GoodA Good = 1\n";
        let (diags, text, _tmp) = run_over(&[("a_bad.go", bad), ("b_good.go", good)]);
        assert!(diags.collect().iter().any(|d| d.code == "EG01"));
        let text = text.unwrap();
        assert!(text.contains("func (v Good) IsValid() bool"));
        assert!(!text.contains("Bad"));
    }

    #[test]
    fn test_include_tests_emits_sibling_test_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("status.go"), INT_ENUM).unwrap();
        let mut driver = Driver::new(DriverOptions {
            dir: Some(tmp.path().to_path_buf()),
            include_tests: true,
            ..DriverOptions::default()
        })
        .unwrap();
        driver.load(&[".".to_string()]).unwrap();
        let tool = EnumGen::new();
        let mut diags = DiagnosticCollector::new(TOOL_NAME);
        driver.begin_tool(TOOL_NAME);
        tool.run(&mut driver, &mut diags).unwrap();

        let rendered = driver.dry_run().unwrap();
        let test_entry = rendered
            .iter()
            .find(|(path, _)| path_is_test(path))
            .expect("test file expected");
        let text = String::from_utf8(test_entry.1.clone()).unwrap();
        assert!(text.contains("func TestStatusRoundTrip(t *testing.T)"));
        assert!(text.contains("\"testing\""));
    }

    #[test]
    fn test_validate_matches_run_diagnostics() {
        let src = "package jobs\n\n// enumgen:@enum(string)\ntype Bad float32\n\nconst BadA Bad = 1\n";
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("bad.go"), src).unwrap();
        let mut driver = Driver::new(DriverOptions {
            dir: Some(tmp.path().to_path_buf()),
            ..DriverOptions::default()
        })
        .unwrap();
        driver.load(&[".".to_string()]).unwrap();

        let tool = EnumGen::new();
        let validated = tool.validate(&driver).unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].code, "EG01");
        assert_eq!(validated[0].tool, TOOL_NAME);
    }

    #[test]
    fn test_output_path_shape() {
        let (_diags, _text, tmp) = run_over(&[("status.go", INT_ENUM)]);
        // Output buffers land beside the sources, named <pkg>_enum.go.
        let expected = tmp.path().canonicalize().unwrap().join("jobs_enum.go");
        assert_eq!(expected.file_name().unwrap(), PathBuf::from("jobs_enum.go"));
    }
}
