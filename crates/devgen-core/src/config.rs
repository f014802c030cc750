//! devgen.toml discovery and loading
//!
//! A single file at or above the invocation directory configures plugins
//! and per-tool overrides. Absence of the file is not an error; malformed
//! TOML is fatal.

use crate::error::DevgenError;
use crate::plugin::PluginDescriptor;
use crate::result::Result;
use crate::tool::ToolConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file devgen discovers
pub const CONFIG_FILE_NAME: &str = "devgen.toml";

/// The devgen configuration file schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DevgenConfig {
    /// External plugins, in the order they join the run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginDescriptor>,
    /// Per-tool overrides applied on top of published defaults
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, ToolConfig>,
}

/// Discovers and loads `devgen.toml`
pub struct ConfigLoader;

impl ConfigLoader {
    /// Walk upward from `start_dir` looking for a config file
    ///
    /// Discovery starts at the invocation directory and never at the first
    /// path argument; one precedence rule, applied everywhere.
    pub fn auto_discover(start_dir: &Path) -> Option<PathBuf> {
        let mut current = start_dir.canonicalize().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!("found config: {}", candidate.display());
                return Some(candidate);
            }
            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return None,
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<DevgenConfig> {
        let content = fs::read_to_string(path).map_err(|e| DevgenError::Config {
            message: format!("cannot read config file '{}': {e}", path.display()),
        })?;
        let config: DevgenConfig = toml::from_str(&content).map_err(|e| DevgenError::Config {
            message: format!("invalid TOML in '{}': {e}", path.display()),
        })?;
        tracing::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load from an explicit path, or discover upward, or default
    pub fn load_or_default(explicit: Option<&Path>, start_dir: &Path) -> Result<DevgenConfig> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }
        match Self::auto_discover(start_dir) {
            Some(path) => Self::load_from_file(&path),
            None => Ok(DevgenConfig::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_auto_discover_walks_upward() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            "[[plugins]]\nname = \"x\"\npath = \"./p\"\ntype = \"source\"\n",
        )
        .unwrap();
        let nested = tmp.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = ConfigLoader::auto_discover(&nested).unwrap();
        assert!(found.ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_absent_config_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = ConfigLoader::load_or_default(None, tmp.path()).unwrap();
        assert!(config.plugins.is_empty());
        assert!(config.tools.is_empty());
    }

    #[test]
    fn test_malformed_toml_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "plugins = not valid").unwrap();
        assert!(ConfigLoader::load_from_file(&path).is_err());
    }

    #[test]
    fn test_tool_overrides_parse() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(
            &path,
            "[tools.enumgen]\ntool = \"enumgen\"\noutput_suffix = \"_generated.go\"\n",
        )
        .unwrap();
        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(
            config.tools["enumgen"].output_suffix.as_deref(),
            Some("_generated.go")
        );
    }
}
