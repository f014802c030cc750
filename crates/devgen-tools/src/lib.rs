//! Built-in tools and the registry that orders a run
//!
//! The registry is plain data assembled per invocation; there is no
//! module-level mutable state, so tests can build registries in parallel.

pub mod enumgen;

use devgen_core::plugin::PluginTool;
use devgen_core::{DevgenError, Result, Tool};

pub use enumgen::EnumGen;

/// The built-in tools, in their fixed run order
pub fn builtin_tools() -> Vec<Box<dyn Tool>> {
    vec![Box::new(EnumGen::new())]
}

/// Assemble the tool set for one run
///
/// External plugins come first, in configuration order; then the built-ins
/// in their fixed order, skipping any built-in whose name a plugin already
/// claimed. Two plugins with the same name are a configuration error.
pub fn resolve_tools(
    plugins: Vec<PluginTool>,
    builtins: Vec<Box<dyn Tool>>,
) -> Result<Vec<Box<dyn Tool>>> {
    let mut tools: Vec<Box<dyn Tool>> = Vec::with_capacity(plugins.len() + builtins.len());
    let mut names: Vec<String> = Vec::new();

    for plugin in plugins {
        let name = plugin.name().to_string();
        if names.contains(&name) {
            return Err(DevgenError::config(format!(
                "duplicate plugin name '{name}'"
            )));
        }
        names.push(name);
        tools.push(Box::new(plugin));
    }

    for builtin in builtins {
        let name = builtin.name().to_string();
        if names.contains(&name) {
            tracing::info!("built-in tool '{name}' overridden by a plugin");
            continue;
        }
        names.push(name);
        tools.push(builtin);
    }

    Ok(tools)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_fixed_order() {
        let tools = builtin_tools();
        let names: Vec<_> = tools.iter().map(|t| t.name().to_string()).collect();
        assert_eq!(names, ["enumgen"]);
    }

    #[test]
    fn test_resolve_without_plugins_keeps_builtins() {
        let tools = resolve_tools(Vec::new(), builtin_tools()).unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].name(), "enumgen");
    }
}
