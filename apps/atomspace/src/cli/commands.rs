//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use atomspace::{LoadedScript, Script};
use atomspace_core::{AtomSpaceError, Handle, MatchMode, SpaceConfig, TypeRegistry};
use std::path::Path;

/// Output switches shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json_mode: bool,
    pub verbose: bool,
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn load_script(file: &Path, config: &SpaceConfig) -> Result<LoadedScript, AtomSpaceError> {
    tracing::info!("Loading script {:?}", file);
    Script::from_file(file)?.load(config.clone())
}

fn render(loaded: &LoadedScript, handle: Handle, output: Output) -> String {
    let rendered = if output.verbose {
        loaded.space.describe(handle)
    } else {
        loaded.space.describe_short(handle)
    };
    rendered.unwrap_or_else(|| format!("#{}", handle))
}

// =============================================================================
// TYPES COMMAND
// =============================================================================

/// List the type hierarchy.
pub fn cmd_types(file: Option<&Path>, config: &SpaceConfig, output: Output) -> Result<(), AtomSpaceError> {
    match file {
        Some(file) => {
            let loaded = load_script(file, config)?;
            let table = loaded.space.read();
            print_types(table.registry(), output)
        }
        None => print_types(&TypeRegistry::new(), output),
    }
}

fn print_types(registry: &TypeRegistry, output: Output) -> Result<(), AtomSpaceError> {
    let rows: Vec<(String, Vec<String>)> = registry
        .iter()
        .map(|(t, name)| {
            let parents = registry
                .parents(t)
                .into_iter()
                .filter_map(|p| registry.type_name(p).map(str::to_string))
                .collect();
            (name.to_string(), parents)
        })
        .collect();

    if output.json_mode {
        let types: Vec<serde_json::Value> = rows
            .iter()
            .map(|(name, parents)| serde_json::json!({ "name": name, "parents": parents }))
            .collect();
        print_json(&serde_json::json!({ "types": types }));
        return Ok(());
    }

    println!("Atom Types");
    println!("==========");
    for (name, parents) in rows {
        if parents.is_empty() {
            println!("{}", name);
        } else {
            println!("{} <- {}", name, parents.join(", "));
        }
    }
    Ok(())
}

// =============================================================================
// LOAD COMMAND
// =============================================================================

/// Load a script and report the resulting space.
pub fn cmd_load(file: &Path, config: &SpaceConfig, output: Output) -> Result<(), AtomSpaceError> {
    let loaded = load_script(file, config)?;
    let (nodes, links) = {
        let table = loaded.space.read();
        let nodes = table.handles().filter(|h| table.atom(*h).is_some_and(|a| a.is_node())).count();
        (nodes, table.len().saturating_sub(nodes))
    };

    if output.json_mode {
        print_json(&serde_json::json!({
            "file": file.to_string_lossy(),
            "atoms": loaded.space.len(),
            "nodes": nodes,
            "links": links,
            "labels": loaded.labels.len(),
            "has_query": loaded.query.is_some(),
        }));
        return Ok(());
    }

    println!("AtomSpace Status");
    println!("================");
    println!("Script: {:?}", file);
    println!();
    println!("Atoms:  {}", loaded.space.len());
    println!("Nodes:  {}", nodes);
    println!("Links:  {}", links);
    println!("Query:  {}", if loaded.query.is_some() { "yes" } else { "no" });
    Ok(())
}

// =============================================================================
// QUERY COMMAND
// =============================================================================

/// Load a script and run its query.
pub fn cmd_query(
    file: &Path,
    config: &SpaceConfig,
    output: Output,
    first: bool,
) -> Result<(), AtomSpaceError> {
    let loaded = load_script(file, config)?;
    let mode = first.then_some(MatchMode::First);
    let outcome = loaded
        .run_query(mode)?
        .ok_or_else(|| AtomSpaceError::InvalidPattern("script has no query".into()))?;

    if output.json_mode {
        let bindings: Vec<serde_json::Value> = outcome
            .bindings
            .iter()
            .map(|binding| {
                let entries: serde_json::Map<String, serde_json::Value> = binding
                    .iter()
                    .map(|(var, handle)| {
                        (
                            var.clone(),
                            serde_json::json!({
                                "handle": handle.value(),
                                "atom": render(&loaded, *handle, output),
                            }),
                        )
                    })
                    .collect();
                serde_json::Value::Object(entries)
            })
            .collect();
        print_json(&serde_json::json!({
            "bindings": bindings,
            "truncated": outcome.truncated,
            "steps": outcome.steps,
            "inconclusive": outcome.inconclusive,
        }));
        return Ok(());
    }

    if outcome.bindings.is_empty() {
        println!("No match");
    }
    for (i, binding) in outcome.bindings.iter().enumerate() {
        println!("Binding {}:", i + 1);
        for (var, handle) in binding {
            println!("  {} -> {}", var, render(&loaded, *handle, output));
        }
    }
    if outcome.truncated {
        println!("(search truncated after {} steps)", outcome.steps);
    }
    Ok(())
}

// =============================================================================
// SHOW COMMAND
// =============================================================================

/// Load a script and render every atom.
pub fn cmd_show(file: &Path, config: &SpaceConfig, output: Output) -> Result<(), AtomSpaceError> {
    let loaded = load_script(file, config)?;
    let table = loaded.space.read();

    if output.json_mode {
        let atoms: Vec<serde_json::Value> = table
            .handles()
            .filter_map(|h| {
                let record = table.get(h)?;
                Some(serde_json::json!({
                    "handle": h.value(),
                    "rendered": table.describe(h),
                    "incoming": table.incoming(h).iter().map(|l| l.value()).collect::<Vec<_>>(),
                    "record": record,
                }))
            })
            .collect();
        print_json(&serde_json::json!({ "atoms": atoms }));
        return Ok(());
    }

    for handle in table.handles() {
        if let Some(line) = table.describe(handle) {
            println!("{:>6}  {}", handle.value(), line);
        }
    }
    Ok(())
}
