//! devgen core
//!
//! The annotation-driven generation framework: package loading, annotation
//! parsing, diagnostics, generated-file buffers, the driver, the tool
//! contract, and plugin loading. The `devgen-tools` crate supplies the
//! built-in generators and `devgen-cli` the command surface.

pub mod annotation;
pub mod config;
pub mod console;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod format;
pub mod genfile;
pub mod loader;
pub mod model;
pub mod plugin;
pub mod result;
pub mod syntax;
pub mod tool;

// Re-export commonly used types
pub use annotation::{Annotation, get_annotation, has_annotation, parse_annotations};
pub use config::{CONFIG_FILE_NAME, ConfigLoader, DevgenConfig};
pub use console::{Color, Console};
pub use diagnostics::{Diagnostic, DiagnosticCollector, Severity, SourcePos};
pub use driver::{Driver, DriverOptions};
pub use error::{DevgenError, ErrorKind};
pub use format::format_go_source;
pub use genfile::{Fragment, GeneratedFile, GoSymbol, symbol};
pub use loader::{LoadOptions, expand_patterns, is_generated_file};
pub use model::{
    Enum, EnumValue, Field, Interface, Method, Package, Struct, TypesInfo, UnderlyingKind,
};
pub use plugin::{PluginDescriptor, PluginKind, PluginTool, load_plugins};
pub use result::Result;
pub use tool::{AnnotationSpec, AnnotationTarget, ParamKind, ParamSpec, Rule, Tool, ToolConfig};

pub use tokio_util::sync::CancellationToken;

/// Initialize the tracing subscriber for logging
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("devgen=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
