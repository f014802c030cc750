//! CLI command implementations

use crate::output::{self, DryRunReport, RunStats};
use devgen_core::config::{CONFIG_FILE_NAME, ConfigLoader, DevgenConfig};
use devgen_core::diagnostics::{Diagnostic, DiagnosticCollector, Severity, SourcePos};
use devgen_core::driver::{Driver, DriverOptions};
use devgen_core::plugin::load_plugins;
use devgen_core::tool::ToolConfig;
use devgen_core::{CancellationToken, Console, DevgenError, Result};
use devgen_tools::{builtin_tools, resolve_tools};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Options shared by the generate paths
pub struct GenerateArgs {
    pub patterns: Vec<String>,
    pub dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub dry_run: bool,
    pub json: bool,
    pub include_tests: bool,
}

/// Run all tools and either commit or report; returns the exit code
pub fn generate_command(args: GenerateArgs) -> Result<i32> {
    let base_dir = resolve_base_dir(args.dir.as_deref())?;
    let config = ConfigLoader::load_or_default(args.config_path.as_deref(), &base_dir)?;
    let cancel = CancellationToken::new();

    let plugins = load_plugins(&config.plugins, &base_dir, &cancel)?;
    let tools = resolve_tools(plugins, builtin_tools())?;

    let mut driver = Driver::new(DriverOptions {
        dir: Some(base_dir.clone()),
        // Full runs exclude previously generated files so they do not
        // shadow the originals during re-generation; dry-runs never do.
        ignore_generated_files: !args.dry_run,
        include_tests: args.include_tests,
    })?
    .with_cancellation(cancel);

    driver.load(&args.patterns)?;

    let mut stats = RunStats {
        packages_loaded: driver.packages().len(),
        ..RunStats::default()
    };
    let mut diagnostics: Vec<Diagnostic> = Vec::new();

    for tool in &tools {
        let name = tool.name().to_string();
        debug!("running tool '{name}'");
        driver.begin_tool(&name);
        let mut collector = DiagnosticCollector::new(&name);

        let mut generation_suppressed = false;
        if args.dry_run {
            if let Some(validated) = tool.validate(&driver) {
                if validated.iter().any(|d| d.severity == Severity::Error) {
                    // Error-severity findings suppress generation for this
                    // tool; keep the validation diagnostics as the record.
                    generation_suppressed = true;
                    collector.extend(validated);
                }
                // Otherwise run() re-derives the same findings while
                // generating, so the validation pass is not double-counted.
            }
        }

        if !generation_suppressed {
            let run_result = tool.run(&mut driver, &mut collector);
            if let Err(err) = run_result {
                let wrapped = match err {
                    e @ DevgenError::Tool { .. } => e,
                    e @ DevgenError::Format { .. } => e,
                    e @ DevgenError::Cancelled => return Err(e),
                    other => DevgenError::tool(&name, other.to_string()),
                };
                if args.dry_run && args.json {
                    // Infrastructure failures are promoted into the report
                    // so machine consumers see one schema.
                    collector.error("FATL", wrapped.to_string(), SourcePos::default());
                } else {
                    return Err(wrapped);
                }
            }
        }

        diagnostics.extend(collector.into_collected());
    }

    let has_errors = diagnostics
        .iter()
        .any(|d| d.severity == Severity::Error);

    if args.dry_run {
        let rendered = driver.dry_run()?;
        if args.json {
            let report = DryRunReport::new(&rendered, diagnostics, stats);
            let success = report.success;
            println!("{}", serde_json::to_string_pretty(&report).map_err(|e| {
                DevgenError::internal(format!("encoding report: {e}"))
            })?);
            return Ok(if success { 0 } else { 1 });
        }
        stats.files_generated = rendered.len();
        stats.count_diagnostics(&diagnostics);
        let console = Console::new();
        output::print_diagnostics_human(&console, &diagnostics);
        output::print_summary_human(&console, &stats, true);
        return Ok(if has_errors { 1 } else { 0 });
    }

    driver.write()?;
    stats.files_generated = driver.buffered_paths().len();
    stats.count_diagnostics(&diagnostics);
    let console = Console::new();
    output::print_diagnostics_human(&console, &diagnostics);
    output::print_summary_human(&console, &stats, false);
    Ok(if has_errors { 1 } else { 0 })
}

/// Emit the union of every tool's published config, file overrides applied
pub fn config_command(
    dir: Option<&Path>,
    config_path: Option<&Path>,
    json: bool,
) -> Result<i32> {
    let base_dir = resolve_base_dir(dir)?;
    let config = ConfigLoader::load_or_default(config_path, &base_dir)?;
    let cancel = CancellationToken::new();
    let plugins = load_plugins(&config.plugins, &base_dir, &cancel)?;
    let tools = resolve_tools(plugins, builtin_tools())?;

    let mut published: BTreeMap<String, ToolConfig> = BTreeMap::new();
    for tool in &tools {
        if let Some(tool_config) = tool.config() {
            let merged = match config.tools.get(tool.name()) {
                Some(file_entry) => tool_config.merged_with(file_entry),
                None => tool_config,
            };
            published.insert(tool.name().to_string(), merged);
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&published)
                .map_err(|e| DevgenError::internal(format!("encoding config: {e}")))?
        );
    } else {
        let wrapper = DevgenConfig {
            plugins: config.plugins.clone(),
            tools: published,
        };
        print!(
            "{}",
            toml::to_string_pretty(&wrapper)
                .map_err(|e| DevgenError::internal(format!("encoding config: {e}")))?
        );
    }
    Ok(0)
}

/// Collect every tool's rules and print or write them for the named agent
pub fn rules_command(
    dir: Option<&Path>,
    config_path: Option<&Path>,
    agent: &str,
    write: bool,
) -> Result<i32> {
    let base_dir = resolve_base_dir(dir)?;
    let config = ConfigLoader::load_or_default(config_path, &base_dir)?;
    let cancel = CancellationToken::new();
    let plugins = load_plugins(&config.plugins, &base_dir, &cancel)?;
    let tools = resolve_tools(plugins, builtin_tools())?;

    let mut rendered = String::new();
    for tool in &tools {
        for rule in tool.rules() {
            rendered.push_str("---\n");
            rendered.push_str(&format!("description: {}\n", rule.description));
            if !rule.globs.is_empty() {
                rendered.push_str(&format!("globs: {}\n", rule.globs.join(",")));
            }
            rendered.push_str(&format!("alwaysApply: {}\n", rule.always_apply));
            rendered.push_str("---\n\n");
            rendered.push_str(&rule.content);
            if !rule.content.ends_with('\n') {
                rendered.push('\n');
            }
            rendered.push('\n');
        }
    }

    if rendered.is_empty() {
        eprintln!("no tool publishes rules");
        return Ok(0);
    }

    if write {
        let target = base_dir.join(format!("{agent}.rules.md"));
        fs::write(&target, &rendered).map_err(|e| DevgenError::io(target.clone(), e))?;
        eprintln!("wrote {}", target.display());
    } else {
        print!("{rendered}");
    }
    Ok(0)
}

/// Write a starter devgen.toml
pub fn init_command(dir: Option<&Path>, force: bool) -> Result<i32> {
    let base_dir = resolve_base_dir(dir)?;
    let target = base_dir.join(CONFIG_FILE_NAME);
    if target.exists() && !force {
        error!(
            "{} already exists; use --force to overwrite",
            target.display()
        );
        return Ok(1);
    }
    fs::write(&target, STARTER_CONFIG).map_err(|e| DevgenError::io(target.clone(), e))?;
    eprintln!("created {}", target.display());
    Ok(0)
}

const STARTER_CONFIG: &str = "\
# devgen configuration. Plugins join the run before the built-in tools;
# [tools.<name>] entries override tool-published defaults.

# [[plugins]]
# name = \"mygen\"
# path = \"./plugins/mygen\"
# type = \"source\"

# [tools.enumgen]
# tool = \"enumgen\"
# output_suffix = \"_enum.go\"
";

fn resolve_base_dir(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(d) => Ok(d.to_path_buf()),
        None => std::env::current_dir().map_err(|e| DevgenError::io(PathBuf::from("."), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_base_dir_explicit() {
        let dir = resolve_base_dir(Some(Path::new("/tmp"))).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp"));
    }
}
