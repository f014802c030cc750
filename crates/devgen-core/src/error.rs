//! Error types and handling for generation runs

use crate::diagnostics::SourcePos;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for devgen operations
///
/// These are the fatal errors that abort a run. Observations about user
/// source travel as [`crate::diagnostics::Diagnostic`] values instead and
/// never through this type.
#[derive(Debug, Error)]
pub enum DevgenError {
    /// Syntax errors from the Go front end
    #[error("parse error: {message} at {pos}")]
    Parse { message: String, pos: SourcePos },

    /// Package loading errors (bad patterns, missing packages)
    #[error("load error: {message}")]
    Load { message: String },

    /// Configuration loading or validation errors
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Plugin compilation, handshake, or protocol errors
    #[error("plugin '{name}': {message}")]
    Plugin { name: String, message: String },

    /// An error returned from a tool's run, wrapped with the tool name
    #[error("tool '{tool}': {message}")]
    Tool { tool: String, message: String },

    /// The output formatter rejected generated text
    #[error("formatter rejected output of tool '{tool}' for {path}: {message}")]
    Format {
        tool: String,
        path: PathBuf,
        message: String,
    },

    /// File system I/O errors
    #[error("io error for path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The caller cancelled the run
    #[error("operation cancelled")]
    Cancelled,

    /// Generic internal errors
    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Error kind enumeration for categorizing errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Parse,
    Load,
    Config,
    Plugin,
    Tool,
    Format,
    Io,
    Cancelled,
    Internal,
}

impl DevgenError {
    /// Get the error kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            DevgenError::Parse { .. } => ErrorKind::Parse,
            DevgenError::Load { .. } => ErrorKind::Load,
            DevgenError::Config { .. } => ErrorKind::Config,
            DevgenError::Plugin { .. } => ErrorKind::Plugin,
            DevgenError::Tool { .. } => ErrorKind::Tool,
            DevgenError::Format { .. } => ErrorKind::Format,
            DevgenError::Io { .. } => ErrorKind::Io,
            DevgenError::Cancelled => ErrorKind::Cancelled,
            DevgenError::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Create a parse error
    pub fn parse(message: impl Into<String>, pos: SourcePos) -> Self {
        Self::Parse {
            message: message.into(),
            pos,
        }
    }

    /// Create a load error
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a plugin error
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Plugin {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Wrap a tool failure with the tool name so logs identify the culprit
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a formatter rejection error
    pub fn format(
        tool: impl Into<String>,
        path: impl Into<PathBuf>,
        message: impl Into<String>,
    ) -> Self {
        Self::Format {
            tool: tool.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for DevgenError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(DevgenError::load("x").kind(), ErrorKind::Load);
        assert_eq!(DevgenError::config("x").kind(), ErrorKind::Config);
        assert_eq!(DevgenError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(DevgenError::tool("enumgen", "boom").kind(), ErrorKind::Tool);
    }

    #[test]
    fn test_tool_error_names_the_tool() {
        let err = DevgenError::tool("enumgen", "formatter exploded");
        assert!(err.to_string().contains("enumgen"));
    }
}
