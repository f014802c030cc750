//! The typed model tools consume: packages and their declaration summaries
//!
//! Summaries are derived once at load time from the parsed syntax and the
//! semantic pass, and are read-only afterwards. All orderings are source
//! order; users observe them (e.g. through the generated `List()` helpers).

use crate::diagnostics::SourcePos;
use crate::syntax::SourceFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Underlying kind of a defined type, as far as devgen resolves it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnderlyingKind {
    Integer,
    String,
    Other,
}

/// The Go builtin spellings devgen accepts as enum underlyings
const INTEGER_TYPES: &[&str] = &[
    "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16", "uint32", "uint64",
    "uintptr", "byte", "rune",
];

/// Classify a builtin type name
pub fn builtin_kind(name: &str) -> UnderlyingKind {
    if name == "string" {
        UnderlyingKind::String
    } else if INTEGER_TYPES.contains(&name) {
        UnderlyingKind::Integer
    } else {
        UnderlyingKind::Other
    }
}

/// A loaded compilation unit
#[derive(Debug, Clone)]
pub struct Package {
    /// Package name from the package clause
    pub name: String,
    /// Canonical import path as the Go compiler understands it
    pub go_import_path: String,
    /// Equal to `go_import_path`; for binary main packages this keeps the
    /// directory-derived path while `name` is "main"
    pub pkg_path: String,
    /// Absolute directory on disk
    pub dir: PathBuf,
    /// Parsed files, in deterministic (sorted) file order
    pub syntax: Vec<SourceFile>,
    /// Result of the semantic pass over the syntax
    pub types_info: TypesInfo,
    /// Enum-shaped declarations, in source order
    pub enums: Vec<Enum>,
    pub interfaces: Vec<Interface>,
    pub structs: Vec<Struct>,
}

/// Resolved type facts the loader derives from the syntax
///
/// This is deliberately shallow: defined-type underlyings (chased through
/// named chains) and the resolved type of every package-level constant.
#[derive(Debug, Clone, Default)]
pub struct TypesInfo {
    /// Defined type name → the builtin it ultimately names, if any
    pub underlying: HashMap<String, String>,
    /// Constant name → its resolved defined-type name, if any
    pub const_types: HashMap<String, String>,
}

impl TypesInfo {
    /// Underlying kind of a defined type, `Other` when unresolvable
    pub fn underlying_kind(&self, type_name: &str) -> UnderlyingKind {
        match self.underlying.get(type_name) {
            Some(builtin) => builtin_kind(builtin),
            None => UnderlyingKind::Other,
        }
    }
}

/// A named type whose constants form an enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enum {
    pub name: String,
    /// Combined documentation block, comment markers stripped
    pub doc: String,
    /// Textual name of the primitive underlying the type
    pub underlying_type: String,
    /// Declaration-ordered values
    pub values: Vec<EnumValue>,
    pub pos: SourcePos,
}

impl Enum {
    /// Kind of the underlying primitive
    pub fn underlying_kind(&self) -> UnderlyingKind {
        builtin_kind(&self.underlying_type)
    }
}

/// One constant of an enum
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    pub doc: String,
    /// Trailing line comment, if any
    pub comment: String,
    /// The literal or expression as source text
    pub value: String,
    pub pos: SourcePos,
}

/// An interface summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub doc: String,
    pub pos: SourcePos,
    pub methods: Vec<Method>,
}

/// A struct summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Struct {
    pub name: String,
    pub doc: String,
    pub pos: SourcePos,
    pub fields: Vec<Field>,
}

/// A method of an interface summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    /// Raw signature text starting at the parameter list
    pub signature: String,
    pub doc: String,
    pub pos: SourcePos,
}

/// A field of a struct summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    /// Raw type text; empty for embedded fields
    pub ty: String,
    pub tag: Option<String>,
    pub doc: String,
    pub comment: String,
    pub pos: SourcePos,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        assert_eq!(builtin_kind("int32"), UnderlyingKind::Integer);
        assert_eq!(builtin_kind("uintptr"), UnderlyingKind::Integer);
        assert_eq!(builtin_kind("string"), UnderlyingKind::String);
        assert_eq!(builtin_kind("float64"), UnderlyingKind::Other);
        assert_eq!(builtin_kind("Status"), UnderlyingKind::Other);
    }

    #[test]
    fn test_types_info_chased_kind() {
        let mut info = TypesInfo::default();
        info.underlying.insert("Status".to_string(), "int".to_string());
        assert_eq!(info.underlying_kind("Status"), UnderlyingKind::Integer);
        assert_eq!(info.underlying_kind("Missing"), UnderlyingKind::Other);
    }
}
