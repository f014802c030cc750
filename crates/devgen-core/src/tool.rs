//! The tool contract and the configuration surface tools publish
//!
//! Every generator satisfies one small base role; the extra capabilities
//! (publishing a config, validating before generation, emitting agent
//! rules) are narrow optional hooks with empty defaults rather than one
//! deep hierarchy.

use crate::diagnostics::{Diagnostic, DiagnosticCollector};
use crate::driver::Driver;
use crate::result::Result;
use serde::{Deserialize, Serialize};

/// A generator plugged into the pipeline
pub trait Tool {
    /// Unique tool name; also the annotation namespace (`name:@directive`)
    fn name(&self) -> &str;

    /// Generate into the driver's buffers, reporting user-source issues
    /// through the collector and infrastructure failures as errors
    fn run(&self, driver: &mut Driver, diags: &mut DiagnosticCollector) -> Result<()>;

    /// Published configuration for editor tooling (Configurable capability)
    fn config(&self) -> Option<ToolConfig> {
        None
    }

    /// Pre-generation validation (Validatable capability); `None` means the
    /// tool does not validate separately from generation
    fn validate(&self, _driver: &Driver) -> Option<Vec<Diagnostic>> {
        None
    }

    /// Markdown rules for agent tooling (RuleTool capability)
    fn rules(&self) -> Vec<Rule> {
        Vec::new()
    }
}

/// Where an annotation may appear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationTarget {
    /// On a type declaration
    Type,
    /// On a struct field or named constant
    Field,
}

/// Shape of an annotation's parameters, for editor completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum ParamKind {
    /// A closed set of accepted values
    Enumerated { values: Vec<String> },
    /// Free-form text with a placeholder shown by editors
    Freeform { placeholder: String },
}

/// Parameter descriptor of one annotation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(flatten)]
    pub kind: ParamKind,
    /// Maximum number of arguments, if bounded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_args: Option<u32>,
}

/// One recognised annotation of a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationSpec {
    pub name: String,
    pub target: AnnotationTarget,
    pub doc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ParamSpec>,
}

/// The configuration a tool publishes (and a config file may override)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolConfig {
    pub tool: String,
    /// Suffix of the tool's output files, e.g. `_enum.go`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<AnnotationSpec>,
}

impl ToolConfig {
    /// Apply a file-level override on top of the published defaults
    pub fn merged_with(mut self, file_entry: &ToolConfig) -> ToolConfig {
        if file_entry.output_suffix.is_some() {
            self.output_suffix = file_entry.output_suffix.clone();
        }
        if !file_entry.annotations.is_empty() {
            self.annotations = file_entry.annotations.clone();
        }
        self
    }
}

/// A Markdown rule a tool contributes for agent tooling
///
/// Collected by the `rules` subcommand; the adapter layer that rewrites
/// per-agent frontmatter is an external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Short description shown in rule listings
    pub description: String,
    /// File-pattern globs the rule applies to
    #[serde(default)]
    pub globs: Vec<String>,
    /// Apply regardless of the files in context
    #[serde(default)]
    pub always_apply: bool,
    /// Markdown body
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_with_overrides_suffix_only() {
        let published = ToolConfig {
            tool: "enumgen".to_string(),
            output_suffix: Some("_enum.go".to_string()),
            annotations: vec![AnnotationSpec {
                name: "enum".to_string(),
                target: AnnotationTarget::Type,
                doc: "Marks an enum".to_string(),
                params: None,
            }],
        };
        let file_entry = ToolConfig {
            tool: "enumgen".to_string(),
            output_suffix: Some("_gen.go".to_string()),
            annotations: Vec::new(),
        };
        let merged = published.clone().merged_with(&file_entry);
        assert_eq!(merged.output_suffix.as_deref(), Some("_gen.go"));
        assert_eq!(merged.annotations, published.annotations);
    }

    #[test]
    fn test_param_spec_serialization() {
        let spec = ParamSpec {
            kind: ParamKind::Enumerated {
                values: vec!["string".to_string(), "json".to_string()],
            },
            max_args: Some(4),
        };
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["kind"], "enumerated");
        assert_eq!(json["max_args"], 4);
    }
}
