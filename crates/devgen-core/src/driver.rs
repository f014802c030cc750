//! The generator driver: loaded packages, output buffers, commit logic
//!
//! The driver owns everything with a lifetime longer than a single tool
//! call: the resolved packages, the map of generated-file buffers, and the
//! cancellation token. Tools themselves are iterated by the outer command
//! loop so it can decide between validation-only and full generation.

use crate::error::DevgenError;
use crate::genfile::GeneratedFile;
use crate::loader::{self, LoadOptions};
use crate::model::Package;
use crate::result::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Construction options for [`Driver`]
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Base directory patterns resolve against; defaults to the cwd
    pub dir: Option<PathBuf>,
    /// Exclude previously generated files from the parsed syntax
    pub ignore_generated_files: bool,
    /// Include `_test.go` files in the load
    pub include_tests: bool,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            dir: None,
            ignore_generated_files: true,
            include_tests: false,
        }
    }
}

/// Orchestrator holding loaded packages and generated-file buffers
pub struct Driver {
    base_dir: PathBuf,
    load_options: LoadOptions,
    include_tests: bool,
    cancel: CancellationToken,
    packages: Vec<Package>,
    files: BTreeMap<PathBuf, GeneratedFile>,
    current_tool: Option<String>,
}

impl Driver {
    pub fn new(options: DriverOptions) -> Result<Self> {
        let base_dir = match options.dir {
            Some(dir) => dir,
            None => std::env::current_dir().map_err(|e| DevgenError::io(PathBuf::from("."), e))?,
        };
        Ok(Self {
            base_dir,
            load_options: LoadOptions {
                ignore_generated_files: options.ignore_generated_files,
                include_tests: options.include_tests,
            },
            include_tests: options.include_tests,
            cancel: CancellationToken::new(),
            packages: Vec::new(),
            files: BTreeMap::new(),
            current_tool: None,
        })
    }

    /// Replace the cancellation token with one supplied by the caller
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The directory patterns resolve against
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Whether tools may emit sibling test files
    pub fn include_tests(&self) -> bool {
        self.include_tests
    }

    /// Resolve patterns and cache the loaded packages
    pub fn load(&mut self, patterns: &[String]) -> Result<()> {
        let default_patterns = ["./...".to_string()];
        let patterns: &[String] = if patterns.is_empty() {
            &default_patterns
        } else {
            patterns
        };
        self.packages =
            loader::load_packages(&self.base_dir, patterns, &self.load_options, &self.cancel)?;
        tracing::info!(
            "loaded {} package(s) from {} pattern(s)",
            self.packages.len(),
            patterns.len()
        );
        Ok(())
    }

    /// The resolved packages, in pattern-expansion order
    pub fn packages(&self) -> &[Package] {
        &self.packages
    }

    /// Record the tool whose `run` is currently executing, for attribution
    pub fn begin_tool(&mut self, name: &str) {
        self.current_tool = Some(name.to_string());
    }

    /// The buffer for `path`, created on first request
    ///
    /// Idempotent by path: a second request for the same path returns the
    /// same buffer, so tools can share an output file.
    pub fn new_generated_file(
        &mut self,
        path: impl Into<PathBuf>,
        owning_import_path: &str,
    ) -> &mut GeneratedFile {
        let path = path.into();
        let package_name = self
            .packages
            .iter()
            .find(|p| p.go_import_path == owning_import_path)
            .map(|p| p.name.clone())
            .unwrap_or_else(|| {
                owning_import_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(owning_import_path)
                    .to_string()
            });
        let file = self
            .files
            .entry(path.clone())
            .or_insert_with(|| GeneratedFile::new(path, owning_import_path, package_name));
        if let Some(tool) = &self.current_tool {
            file.note_contributor(tool);
        }
        file
    }

    /// Render every non-empty buffer without touching the filesystem
    pub fn dry_run(&self) -> Result<BTreeMap<PathBuf, Vec<u8>>> {
        let mut out = BTreeMap::new();
        for (path, file) in &self.files {
            if file.is_empty() {
                continue;
            }
            out.insert(path.clone(), file.render()?);
        }
        Ok(out)
    }

    /// Render and commit every buffer atomically
    ///
    /// Parent directories are created; content lands in a temp file in the
    /// target directory and is renamed into place. A target already holding
    /// identical bytes is left untouched, so an unchanged re-run writes
    /// nothing.
    pub fn write(&self) -> Result<()> {
        for (path, file) in &self.files {
            if self.cancel.is_cancelled() {
                return Err(DevgenError::Cancelled);
            }
            if file.is_empty() {
                continue;
            }
            let rendered = file.render()?;
            if let Ok(existing) = fs::read(path) {
                if existing == rendered {
                    tracing::debug!("unchanged: {}", path.display());
                    continue;
                }
            }
            let parent = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            fs::create_dir_all(parent).map_err(|e| DevgenError::io(parent.to_path_buf(), e))?;
            let tmp = tempfile::NamedTempFile::new_in(parent)
                .map_err(|e| DevgenError::io(parent.to_path_buf(), e))?;
            fs::write(tmp.path(), &rendered)
                .map_err(|e| DevgenError::io(tmp.path().to_path_buf(), e))?;
            tmp.persist(path)
                .map_err(|e| DevgenError::io(path.clone(), e.error))?;
            tracing::info!("wrote {}", path.display());
        }
        Ok(())
    }

    /// Drop all buffers without rendering (the cancellation path)
    pub fn discard_buffers(&mut self) {
        self.files.clear();
    }

    /// Paths of all non-empty buffers, in path order
    pub fn buffered_paths(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|(_, f)| !f.is_empty())
            .map(|(p, _)| p.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const STATUS_GO: &str = "package jobs\n\n// enumgen:@enum(string)\ntype Status int\n\nconst (\n\tStatusActive Status = 1\n\tStatusInactive Status = 2\n)\n";

    fn driver_for(tmp: &TempDir) -> Driver {
        Driver::new(DriverOptions {
            dir: Some(tmp.path().to_path_buf()),
            ..DriverOptions::default()
        })
        .unwrap()
    }

    #[test]
    fn test_load_and_packages() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("status.go"), STATUS_GO).unwrap();
        let mut driver = driver_for(&tmp);
        driver.load(&[".".to_string()]).unwrap();
        assert_eq!(driver.packages().len(), 1);
        assert_eq!(driver.packages()[0].name, "jobs");
    }

    #[test]
    fn test_new_generated_file_idempotent_by_path() {
        let tmp = TempDir::new().unwrap();
        let mut driver = driver_for(&tmp);
        let path = tmp.path().join("jobs_enum.go");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .line("var A = 1");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .line("var B = 2");
        let rendered = driver.dry_run().unwrap();
        assert_eq!(rendered.len(), 1);
        let text = String::from_utf8(rendered[&path].clone()).unwrap();
        assert!(text.contains("var A = 1\nvar B = 2\n"));
    }

    #[test]
    fn test_dry_run_matches_write() {
        let tmp = TempDir::new().unwrap();
        let mut driver = driver_for(&tmp);
        let path = tmp.path().join("out/jobs_enum.go");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .line("var A = 1");
        let rendered = driver.dry_run().unwrap();
        driver.write().unwrap();
        assert_eq!(fs::read(&path).unwrap(), rendered[&path]);
    }

    #[test]
    fn test_unchanged_rewrite_keeps_mtime_content() {
        let tmp = TempDir::new().unwrap();
        let mut driver = driver_for(&tmp);
        let path = tmp.path().join("jobs_enum.go");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .line("var A = 1");
        driver.write().unwrap();
        let first = fs::read(&path).unwrap();
        driver.write().unwrap();
        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn test_cancelled_write_refuses() {
        let tmp = TempDir::new().unwrap();
        let mut driver = driver_for(&tmp);
        let path = tmp.path().join("jobs_enum.go");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .line("var A = 1");
        driver.cancellation().cancel();
        assert!(matches!(driver.write(), Err(DevgenError::Cancelled)));
        assert!(!path.exists());
    }

    #[test]
    fn test_shared_file_keeps_tool_order_and_import_union() {
        use crate::genfile::symbol;

        let tmp = TempDir::new().unwrap();
        let mut driver = driver_for(&tmp);
        let path = tmp.path().join("jobs_gen.go");

        driver.begin_tool("first");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .p(["var _ = ".into(), symbol("fmt", "Sprintf")]);
        driver.begin_tool("second");
        driver
            .new_generated_file(&path, "example.com/jobs")
            .p(["var _ = ".into(), symbol("encoding/json", "Marshal")]);

        let rendered = driver.dry_run().unwrap();
        let text = String::from_utf8(rendered[&path].clone()).unwrap();
        let first_idx = text.find("fmt.Sprintf").unwrap();
        let second_idx = text.find("json.Marshal").unwrap();
        assert!(first_idx < second_idx, "contributions follow tool order");
        assert!(text.contains("\"encoding/json\""));
        assert!(text.contains("\"fmt\""));
        assert_eq!(text.matches("import (").count(), 1);
    }

    #[test]
    fn test_dry_run_deterministic_across_drivers() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("status.go"), STATUS_GO).unwrap();
        let render = || {
            let mut driver = driver_for(&tmp);
            driver.load(&[".".to_string()]).unwrap();
            let pkg_dir = driver.packages()[0].dir.clone();
            let import_path = driver.packages()[0].go_import_path.clone();
            driver
                .new_generated_file(pkg_dir.join("jobs_enum.go"), &import_path)
                .line("var A = 1");
            driver.dry_run().unwrap()
        };
        assert_eq!(render(), render());
    }
}
