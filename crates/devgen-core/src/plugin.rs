//! External plugin loading and the subprocess protocol
//!
//! Every plugin runs out of process: its directory is compiled once per run
//! to a temporary executable, and the driver talks to it over a JSON
//! request/response pair on stdin/stdout. Loading is all-or-nothing: a
//! plugin that fails to compile or answer the describe handshake is fatal
//! for the whole run.

use crate::diagnostics::{Diagnostic, DiagnosticCollector};
use crate::driver::Driver;
use crate::error::DevgenError;
use crate::model::{Enum, Interface, Struct};
use crate::result::Result;
use crate::tool::{Rule, Tool, ToolConfig};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A plugin entry from the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub name: String,
    /// Directory holding the plugin's source
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub kind: PluginKind,
}

/// How a plugin is materialised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PluginKind {
    /// Compiled from source to a subprocess (the only supported kind)
    Source,
    /// In-process shared object; rejected as neither portable nor safe
    DynamicLibrary,
}

/// The request the driver sends on the plugin's stdin
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PluginRequest {
    /// Asks for the plugin's published config and rules
    Describe,
    /// Asks for generated files and diagnostics over the loaded packages
    Generate {
        packages: Vec<PluginPackage>,
        include_tests: bool,
    },
}

/// Package summary shipped to plugins
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginPackage {
    pub name: String,
    pub import_path: String,
    pub dir: PathBuf,
    pub enums: Vec<Enum>,
    pub interfaces: Vec<Interface>,
    pub structs: Vec<Struct>,
}

/// Answer to [`PluginRequest::Describe`]
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct DescribeResponse {
    #[serde(default)]
    pub config: Option<ToolConfig>,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// Answer to [`PluginRequest::Generate`]
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub files: Vec<PluginFile>,
    #[serde(default)]
    pub diagnostics: Vec<Diagnostic>,
}

/// One file a plugin wants written, fed through the ordinary buffers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginFile {
    pub path: PathBuf,
    pub owning_import_path: String,
    /// Imports the body references with fully spelled identifiers
    #[serde(default)]
    pub imports: Vec<String>,
    /// Body lines, without header, package clause, or import block
    #[serde(default)]
    pub lines: Vec<String>,
}

/// A loaded plugin, driven over the subprocess protocol
#[derive(Debug)]
pub struct PluginTool {
    descriptor: PluginDescriptor,
    executable: PathBuf,
    describe: DescribeResponse,
    // Keeps the compiled binary alive for the run.
    _workdir: tempfile::TempDir,
    cancel: CancellationToken,
}

/// Materialise every descriptor into a live tool; any failure is fatal
pub fn load_plugins(
    descriptors: &[PluginDescriptor],
    base_dir: &std::path::Path,
    cancel: &CancellationToken,
) -> Result<Vec<PluginTool>> {
    let mut tools = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        tools.push(PluginTool::load(descriptor.clone(), base_dir, cancel.clone())?);
    }
    Ok(tools)
}

impl PluginTool {
    fn load(
        descriptor: PluginDescriptor,
        base_dir: &std::path::Path,
        cancel: CancellationToken,
    ) -> Result<Self> {
        if descriptor.kind == PluginKind::DynamicLibrary {
            return Err(DevgenError::plugin(
                &descriptor.name,
                "dynamic-library plugins are not supported; use type = \"source\"",
            ));
        }

        let source_dir = if descriptor.path.is_absolute() {
            descriptor.path.clone()
        } else {
            base_dir.join(&descriptor.path)
        };
        if !source_dir.is_dir() {
            return Err(DevgenError::plugin(
                &descriptor.name,
                format!("plugin directory not found: {}", source_dir.display()),
            ));
        }

        let workdir = tempfile::tempdir()
            .map_err(|e| DevgenError::plugin(&descriptor.name, format!("temp dir: {e}")))?;
        let executable = workdir.path().join(&descriptor.name);

        tracing::info!(
            "compiling plugin '{}' from {}",
            descriptor.name,
            source_dir.display()
        );
        let output = Command::new("go")
            .arg("build")
            .arg("-o")
            .arg(&executable)
            .arg(".")
            .current_dir(&source_dir)
            .output()
            .map_err(|e| DevgenError::plugin(&descriptor.name, format!("running go build: {e}")))?;
        if !output.status.success() {
            return Err(DevgenError::plugin(
                &descriptor.name,
                format!(
                    "go build failed: {}",
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let mut tool = Self {
            descriptor,
            executable,
            describe: DescribeResponse::default(),
            _workdir: workdir,
            cancel,
        };
        let raw = tool.exchange(&PluginRequest::Describe)?;
        tool.describe = serde_json::from_str(&raw).map_err(|e| {
            DevgenError::plugin(&tool.descriptor.name, format!("bad describe response: {e}"))
        })?;
        Ok(tool)
    }

    /// One request out, one response in
    fn exchange(&self, request: &PluginRequest) -> Result<String> {
        let payload = serde_json::to_string(request).map_err(|e| {
            DevgenError::plugin(&self.descriptor.name, format!("encoding request: {e}"))
        })?;

        let mut child = Command::new(&self.executable)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| DevgenError::plugin(&self.descriptor.name, format!("spawn: {e}")))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(payload.as_bytes()).map_err(|e| {
                DevgenError::plugin(&self.descriptor.name, format!("writing request: {e}"))
            })?;
            // Dropping closes the pipe so the plugin sees EOF.
        }

        // Drain stdout on a helper thread so a chatty plugin cannot fill the
        // pipe and deadlock against our wait loop.
        let reader = child.stdout.take().map(|mut out| {
            std::thread::spawn(move || {
                use std::io::Read;
                let mut buf = String::new();
                out.read_to_string(&mut buf).map(|_| buf)
            })
        });

        loop {
            if self.cancel.is_cancelled() {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DevgenError::Cancelled);
            }
            match child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        return Err(DevgenError::plugin(
                            &self.descriptor.name,
                            format!("plugin exited with {status}"),
                        ));
                    }
                    break;
                }
                Ok(None) => std::thread::sleep(Duration::from_millis(20)),
                Err(e) => {
                    return Err(DevgenError::plugin(
                        &self.descriptor.name,
                        format!("waiting for plugin: {e}"),
                    ));
                }
            }
        }

        match reader {
            Some(handle) => match handle.join() {
                Ok(Ok(stdout)) => Ok(stdout),
                Ok(Err(e)) => Err(DevgenError::plugin(
                    &self.descriptor.name,
                    format!("reading response: {e}"),
                )),
                Err(_) => Err(DevgenError::plugin(
                    &self.descriptor.name,
                    "response reader panicked",
                )),
            },
            None => Ok(String::new()),
        }
    }
}

impl Tool for PluginTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn run(&self, driver: &mut Driver, diags: &mut DiagnosticCollector) -> Result<()> {
        let packages: Vec<PluginPackage> = driver
            .packages()
            .iter()
            .map(|p| PluginPackage {
                name: p.name.clone(),
                import_path: p.go_import_path.clone(),
                dir: p.dir.clone(),
                enums: p.enums.clone(),
                interfaces: p.interfaces.clone(),
                structs: p.structs.clone(),
            })
            .collect();

        let raw = self.exchange(&PluginRequest::Generate {
            packages,
            include_tests: driver.include_tests(),
        })?;
        let response: GenerateResponse = serde_json::from_str(&raw).map_err(|e| {
            DevgenError::plugin(&self.descriptor.name, format!("bad generate response: {e}"))
        })?;

        diags.extend(response.diagnostics);
        for file in response.files {
            let buffer = driver.new_generated_file(&file.path, &file.owning_import_path);
            for import in &file.imports {
                buffer.use_import(import);
            }
            for line in &file.lines {
                buffer.line(line.clone());
            }
        }
        Ok(())
    }

    fn config(&self) -> Option<ToolConfig> {
        self.describe.config.clone()
    }

    fn rules(&self) -> Vec<Rule> {
        self.describe.rules.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dynamic_library_rejected() {
        let descriptor = PluginDescriptor {
            name: "native".to_string(),
            path: PathBuf::from("./native"),
            kind: PluginKind::DynamicLibrary,
        };
        let cancel = CancellationToken::new();
        let err = load_plugins(&[descriptor], std::path::Path::new("."), &cancel).unwrap_err();
        assert!(err.to_string().contains("dynamic-library"));
    }

    #[test]
    fn test_missing_plugin_dir_is_fatal() {
        let descriptor = PluginDescriptor {
            name: "ghost".to_string(),
            path: PathBuf::from("./does/not/exist"),
            kind: PluginKind::Source,
        };
        let cancel = CancellationToken::new();
        let err = load_plugins(&[descriptor], std::path::Path::new("."), &cancel).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_descriptor_toml_shape() {
        let descriptor: PluginDescriptor =
            toml::from_str("name = \"mygen\"\npath = \"./plugins/mygen\"\ntype = \"source\"\n")
                .unwrap();
        assert_eq!(descriptor.name, "mygen");
        assert_eq!(descriptor.kind, PluginKind::Source);
    }
}
