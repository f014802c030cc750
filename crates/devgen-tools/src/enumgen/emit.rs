//! Code emission for enum plans
//!
//! Integer enums route every encoding through the display-name maps; string
//! enums are their own names, so membership uses a set and the name helpers
//! are omitted.

use super::EnumPlan;
use devgen_core::genfile::{GeneratedFile, symbol};
use devgen_core::model::UnderlyingKind;

const FMT: &str = "fmt";
const JSON: &str = "encoding/json";
const SQL_DRIVER: &str = "database/sql/driver";
const TESTING: &str = "testing";

pub(crate) fn emit_enum(f: &mut GeneratedFile, plan: &EnumPlan) {
    match plan.decl.underlying_kind() {
        UnderlyingKind::String => emit_string_enum(f, plan),
        _ => emit_int_enum(f, plan),
    }
}

/// Lower-case the first rune: `Status` → `statusEnums` receiver type
fn helper_type(enum_name: &str) -> String {
    let mut chars = enum_name.chars();
    match chars.next() {
        Some(first) => format!("{}{}Enums", first.to_lowercase(), chars.as_str()),
        None => "enums".to_string(),
    }
}

fn emit_int_enum(f: &mut GeneratedFile, plan: &EnumPlan) {
    let name = &plan.decl.name;
    let helper = helper_type(name);
    let opts = &plan.options;

    // Name and value tables plus the declaration-order list.
    f.line("var (");
    f.line(format!("\t_{name}Names = map[{name}]string{{"));
    for (constant, display) in &plan.display_names {
        f.line(format!("\t\t{constant}: {display:?},"));
    }
    f.line("\t}");
    f.line(format!("\t_{name}Values = map[string]{name}{{"));
    for (constant, display) in &plan.display_names {
        f.line(format!("\t\t{display:?}: {constant},"));
    }
    f.line("\t}");
    f.line(format!("\t_{name}List = []{name}{{"));
    for (constant, _) in &plan.display_names {
        f.line(format!("\t\t{constant},"));
    }
    f.line("\t}");
    f.line(")");
    f.blank();

    f.line(format!(
        "// IsValid reports whether v is a declared {name} value."
    ));
    f.line(format!("func (v {name}) IsValid() bool {{"));
    f.line(format!("\t_, ok := _{name}Names[v]"));
    f.line("\treturn ok");
    f.line("}");
    f.blank();

    if opts.string {
        f.line(format!(
            "// String returns the display name of v, or \"{name}(<n>)\" for"
        ));
        f.line("// values outside the declared set.");
        f.line(format!("func (v {name}) String() string {{"));
        f.line(format!("\tif s, ok := _{name}Names[v]; ok {{"));
        f.line("\t\treturn s");
        f.line("\t}");
        f.p([
            "\treturn ".into(),
            symbol(FMT, "Sprintf"),
            format!("(\"{name}(%d)\", v)").into(),
        ]);
        f.line("}");
        f.blank();
    }

    if opts.json {
        f.line("// MarshalJSON encodes v as its display name.");
        f.line(format!("func (v {name}) MarshalJSON() ([]byte, error) {{"));
        f.line(format!("\ts, ok := _{name}Names[v]"));
        f.line("\tif !ok {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %d\", v)").into(),
        ]);
        f.line("\t}");
        f.p(["\treturn ".into(), symbol(JSON, "Marshal"), "(s)".into()]);
        f.line("}");
        f.blank();

        f.line("// UnmarshalJSON decodes a display name into v.");
        f.line(format!(
            "func (v *{name}) UnmarshalJSON(data []byte) error {{"
        ));
        f.line("\tvar s string");
        f.p([
            "\tif err := ".into(),
            symbol(JSON, "Unmarshal"),
            "(data, &s); err != nil {".into(),
        ]);
        f.line("\t\treturn err");
        f.line("\t}");
        emit_int_assign_from_name(f, name, "s");
        f.line("}");
        f.blank();
    }

    if opts.text {
        f.line("// MarshalText encodes v as its display name.");
        f.line(format!("func (v {name}) MarshalText() ([]byte, error) {{"));
        f.line(format!("\ts, ok := _{name}Names[v]"));
        f.line("\tif !ok {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %d\", v)").into(),
        ]);
        f.line("\t}");
        f.line("\treturn []byte(s), nil");
        f.line("}");
        f.blank();

        f.line("// UnmarshalText decodes a display name into v.");
        f.line(format!(
            "func (v *{name}) UnmarshalText(text []byte) error {{"
        ));
        emit_int_assign_from_name(f, name, "string(text)");
        f.line("}");
        f.blank();
    }

    if opts.sql {
        f.line("// Value implements driver.Valuer using the display name.");
        f.p([
            format!("func (v {name}) Value() (").into(),
            symbol(SQL_DRIVER, "Value"),
            ", error) {".into(),
        ]);
        f.line(format!("\ts, ok := _{name}Names[v]"));
        f.line("\tif !ok {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %d\", v)").into(),
        ]);
        f.line("\t}");
        f.line("\treturn s, nil");
        f.line("}");
        f.blank();

        f.line("// Scan implements sql.Scanner, accepting string and []byte names.");
        f.line(format!("func (v *{name}) Scan(src any) error {{"));
        f.line("\tvar name string");
        f.line("\tswitch s := src.(type) {");
        f.line("\tcase string:");
        f.line("\t\tname = s");
        f.line("\tcase []byte:");
        f.line("\t\tname = string(s)");
        f.line("\tdefault:");
        f.p([
            "\t\treturn ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"cannot scan %T into {name}\", src)").into(),
        ]);
        f.line("\t}");
        emit_int_assign_from_name(f, name, "name");
        f.line("}");
        f.blank();
    }

    f.line(format!(
        "// {name}Enums provides set-level helpers over the declared {name} values."
    ));
    f.line(format!("var {name}Enums = {helper}{{}}"));
    f.blank();
    f.line(format!("type {helper} struct{{}}"));
    f.blank();

    f.line("// List returns the declared values in declaration order.");
    f.line(format!("func ({helper}) List() []{name} {{"));
    f.line(format!("\tout := make([]{name}, len(_{name}List))"));
    f.line(format!("\tcopy(out, _{name}List)"));
    f.line("\treturn out");
    f.line("}");
    f.blank();

    f.line("// Contains reports whether v is a declared value.");
    f.line(format!("func ({helper}) Contains(v {name}) bool {{"));
    f.line("\treturn v.IsValid()");
    f.line("}");
    f.blank();

    f.line("// Parse resolves a display name, case-sensitively.");
    f.line(format!("func ({helper}) Parse(name string) ({name}, error) {{"));
    f.line(format!("\tif v, ok := _{name}Values[name]; ok {{"));
    f.line("\t\treturn v, nil");
    f.line("\t}");
    f.line(format!("\tvar zero {name}"));
    f.p([
        "\treturn zero, ".into(),
        symbol(FMT, "Errorf"),
        format!("(\"unknown {name} name: %q\", name)").into(),
    ]);
    f.line("}");
    f.blank();

    f.line(format!(
        "// Name returns the display name of v, or \"{name}(<n>)\" for values"
    ));
    f.line("// outside the declared set.");
    f.line(format!("func ({helper}) Name(v {name}) string {{"));
    f.line(format!("\tif s, ok := _{name}Names[v]; ok {{"));
    f.line("\t\treturn s");
    f.line("\t}");
    f.p([
        "\treturn ".into(),
        symbol(FMT, "Sprintf"),
        format!("(\"{name}(%d)\", v)").into(),
    ]);
    f.line("}");
    f.blank();

    f.line("// Names returns the display names in declaration order.");
    f.line(format!("func ({helper}) Names() []string {{"));
    f.line(format!("\tout := make([]string, 0, len(_{name}List))"));
    f.line(format!("\tfor _, v := range _{name}List {{"));
    f.line(format!("\t\tout = append(out, _{name}Names[v])"));
    f.line("\t}");
    f.line("\treturn out");
    f.line("}");
    f.blank();

    f.line("// ContainsName reports whether a display name is declared.");
    f.line(format!("func ({helper}) ContainsName(name string) bool {{"));
    f.line(format!("\t_, ok := _{name}Values[name]"));
    f.line("\treturn ok");
    f.line("}");
}

/// The shared "look up a display name and assign into *v" tail
fn emit_int_assign_from_name(f: &mut GeneratedFile, name: &str, expr: &str) {
    f.line(format!("\tparsed, ok := _{name}Values[{expr}]"));
    f.line("\tif !ok {");
    f.p([
        "\t\treturn ".into(),
        symbol(FMT, "Errorf"),
        format!("(\"unknown {name} name: %q\", {expr})").into(),
    ]);
    f.line("\t}");
    f.line("\t*v = parsed");
    f.line("\treturn nil");
}

fn emit_string_enum(f: &mut GeneratedFile, plan: &EnumPlan) {
    let name = &plan.decl.name;
    let helper = helper_type(name);
    let opts = &plan.options;

    f.line("var (");
    f.line(format!("\t_{name}Set = map[{name}]struct{{}}{{"));
    for value in &plan.decl.values {
        f.line(format!("\t\t{}: {{}},", value.name));
    }
    f.line("\t}");
    f.line(format!("\t_{name}List = []{name}{{"));
    for value in &plan.decl.values {
        f.line(format!("\t\t{},", value.name));
    }
    f.line("\t}");
    f.line(")");
    f.blank();

    f.line(format!(
        "// IsValid reports whether v is a declared {name} value."
    ));
    f.line(format!("func (v {name}) IsValid() bool {{"));
    f.line(format!("\t_, ok := _{name}Set[v]"));
    f.line("\treturn ok");
    f.line("}");
    f.blank();

    if opts.string {
        f.line("// String returns the value itself; string enums are their own name.");
        f.line(format!("func (v {name}) String() string {{"));
        f.line("\treturn string(v)");
        f.line("}");
        f.blank();
    }

    if opts.json {
        f.line("// MarshalJSON encodes v, rejecting undeclared values.");
        f.line(format!("func (v {name}) MarshalJSON() ([]byte, error) {{"));
        f.line("\tif !v.IsValid() {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %q\", string(v))").into(),
        ]);
        f.line("\t}");
        f.p([
            "\treturn ".into(),
            symbol(JSON, "Marshal"),
            "(string(v))".into(),
        ]);
        f.line("}");
        f.blank();

        f.line("// UnmarshalJSON decodes a declared value into v.");
        f.line(format!(
            "func (v *{name}) UnmarshalJSON(data []byte) error {{"
        ));
        f.line("\tvar s string");
        f.p([
            "\tif err := ".into(),
            symbol(JSON, "Unmarshal"),
            "(data, &s); err != nil {".into(),
        ]);
        f.line("\t\treturn err");
        f.line("\t}");
        emit_string_assign_checked(f, name, "s");
        f.line("}");
        f.blank();
    }

    if opts.text {
        f.line("// MarshalText encodes v, rejecting undeclared values.");
        f.line(format!("func (v {name}) MarshalText() ([]byte, error) {{"));
        f.line("\tif !v.IsValid() {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %q\", string(v))").into(),
        ]);
        f.line("\t}");
        f.line("\treturn []byte(v), nil");
        f.line("}");
        f.blank();

        f.line("// UnmarshalText decodes a declared value into v.");
        f.line(format!(
            "func (v *{name}) UnmarshalText(text []byte) error {{"
        ));
        emit_string_assign_checked(f, name, "string(text)");
        f.line("}");
        f.blank();
    }

    if opts.sql {
        f.line("// Value implements driver.Valuer.");
        f.p([
            format!("func (v {name}) Value() (").into(),
            symbol(SQL_DRIVER, "Value"),
            ", error) {".into(),
        ]);
        f.line("\tif !v.IsValid() {");
        f.p([
            "\t\treturn nil, ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"invalid {name} value: %q\", string(v))").into(),
        ]);
        f.line("\t}");
        f.line("\treturn string(v), nil");
        f.line("}");
        f.blank();

        f.line("// Scan implements sql.Scanner, accepting string and []byte values.");
        f.line(format!("func (v *{name}) Scan(src any) error {{"));
        f.line("\tvar s string");
        f.line("\tswitch t := src.(type) {");
        f.line("\tcase string:");
        f.line("\t\ts = t");
        f.line("\tcase []byte:");
        f.line("\t\ts = string(t)");
        f.line("\tdefault:");
        f.p([
            "\t\treturn ".into(),
            symbol(FMT, "Errorf"),
            format!("(\"cannot scan %T into {name}\", src)").into(),
        ]);
        f.line("\t}");
        emit_string_assign_checked(f, name, "s");
        f.line("}");
        f.blank();
    }

    f.line(format!(
        "// {name}Enums provides set-level helpers over the declared {name} values."
    ));
    f.line(format!("var {name}Enums = {helper}{{}}"));
    f.blank();
    f.line(format!("type {helper} struct{{}}"));
    f.blank();

    f.line("// List returns the declared values in declaration order.");
    f.line(format!("func ({helper}) List() []{name} {{"));
    f.line(format!("\tout := make([]{name}, len(_{name}List))"));
    f.line(format!("\tcopy(out, _{name}List)"));
    f.line("\treturn out");
    f.line("}");
    f.blank();

    f.line("// Contains reports whether v is a declared value.");
    f.line(format!("func ({helper}) Contains(v {name}) bool {{"));
    f.line("\treturn v.IsValid()");
    f.line("}");
    f.blank();

    f.line("// Parse resolves a declared value, case-sensitively.");
    f.line(format!("func ({helper}) Parse(name string) ({name}, error) {{"));
    f.line(format!("\tif _, ok := _{name}Set[{name}(name)]; ok {{"));
    f.line(format!("\t\treturn {name}(name), nil"));
    f.line("\t}");
    f.line(format!("\tvar zero {name}"));
    f.p([
        "\treturn zero, ".into(),
        symbol(FMT, "Errorf"),
        format!("(\"unknown {name} value: %q\", name)").into(),
    ]);
    f.line("}");
}

/// The shared "check membership and assign into *v" tail for string enums
fn emit_string_assign_checked(f: &mut GeneratedFile, name: &str, expr: &str) {
    f.line(format!("\tif _, ok := _{name}Set[{name}({expr})]; !ok {{"));
    f.p([
        "\t\treturn ".into(),
        symbol(FMT, "Errorf"),
        format!("(\"unknown {name} value: %q\", {expr})").into(),
    ]);
    f.line("\t}");
    f.line(format!("\t*v = {name}({expr})"));
    f.line("\treturn nil");
}

/// Round-trip tests for every plan, emitted as an internal test file
pub(crate) fn emit_test_file(f: &mut GeneratedFile, plans: &[EnumPlan]) {
    for (i, plan) in plans.iter().enumerate() {
        if i > 0 {
            f.blank();
        }
        let name = &plan.decl.name;
        f.p([
            format!("func Test{name}RoundTrip(t *").into(),
            symbol(TESTING, "T"),
            ") {".into(),
        ]);
        f.line(format!("\tfor _, v := range {name}Enums.List() {{"));
        f.line("\t\tif !v.IsValid() {");
        f.line("\t\t\tt.Fatalf(\"declared value %v reported invalid\", v)");
        f.line("\t\t}");
        if plan.decl.underlying_kind() == UnderlyingKind::String {
            f.line(format!(
                "\t\tparsed, err := {name}Enums.Parse(string(v))"
            ));
        } else {
            f.line(format!(
                "\t\tparsed, err := {name}Enums.Parse({name}Enums.Name(v))"
            ));
        }
        f.line("\t\tif err != nil {");
        f.line("\t\t\tt.Fatalf(\"parse %v: %v\", v, err)");
        f.line("\t\t}");
        f.line("\t\tif parsed != v {");
        f.line("\t\t\tt.Fatalf(\"round trip changed %v to %v\", v, parsed)");
        f.line("\t\t}");
        f.line("\t}");
        f.line("}");
    }
}
