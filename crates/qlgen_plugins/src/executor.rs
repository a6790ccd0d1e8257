//! Runs the plugins of one output target.

use crate::config::merge_config;
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use crate::registry::PluginRegistry;
use indexmap::IndexSet;
use qlgen_core::{Error, Result};
use qlgen_schema::{FragmentDefinition, FragmentRegistry, Schema, Source};
use serde_json::Value;
use std::sync::Arc;

/// One configured plugin of a target.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginEntry {
    pub name: String,
    pub config: Value,
}

impl PluginEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: Value::Null,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }
}

/// Everything needed to generate one output file.
#[derive(Debug, Clone, Default)]
pub struct OutputTarget {
    /// Path of the generated file, used for extension checks.
    pub filename: String,
    /// Schema SDL before plugin extensions are merged.
    pub schema: String,
    pub documents: Vec<Source>,
    /// Fragments available to spreads without being part of `documents`.
    pub external_fragments: Vec<FragmentDefinition>,
    pub plugins: Vec<PluginEntry>,
    /// Config shared by every plugin of the target.
    pub config: Value,
}

/// Generates the content of `target`.
///
/// Every plugin is resolved and validated before the first one generates,
/// so a bad target fails without partial output. Validation failures other
/// than extension and config errors, and all generation failures, are
/// wrapped with the failing plugin's name.
pub async fn generate(
    registry: &PluginRegistry,
    target: &OutputTarget,
    ctx: &mut PluginContext,
) -> Result<String> {
    let plugins: Vec<(Arc<dyn Plugin>, Value)> = target
        .plugins
        .iter()
        .map(|entry| -> Result<(Arc<dyn Plugin>, Value)> {
            let plugin = registry.get(&entry.name)?;
            Ok((plugin, merge_config(&target.config, &entry.config)))
        })
        .collect::<Result<_>>()?;

    let extensions: Vec<String> = plugins
        .iter()
        .filter_map(|(plugin, config)| plugin.add_to_schema(config))
        .collect();
    let schema = Schema::parse_with_extensions(&target.schema, &extensions)?;
    let fragments = FragmentRegistry::build(&target.documents, &target.external_fragments)?;
    let all_plugins: Vec<String> = target.plugins.iter().map(|e| e.name.clone()).collect();

    let null = Value::Null;
    let base = PluginInput {
        schema: &schema,
        documents: &target.documents,
        fragments: &fragments,
        config: &null,
        output_file: &target.filename,
        all_plugins: &all_plugins,
    };

    for (plugin, config) in &plugins {
        plugin
            .validate(&PluginInput { config, ..base })
            .map_err(|err| validation_error(plugin.name(), err))?;
    }

    let mut outputs = Vec::with_capacity(plugins.len());
    for (plugin, config) in &plugins {
        tracing::debug!(plugin = plugin.name(), output = %target.filename, "running plugin");
        let output = plugin
            .generate(&PluginInput { config, ..base }, ctx)
            .await
            .map_err(|err| Error::PluginGeneration {
                plugin: plugin.name().to_string(),
                source: Box::new(err),
            })?;
        outputs.push(output);
    }

    Ok(merge_outputs(outputs))
}

/// Validates every plugin of `target` without generating anything.
///
/// Unlike [`generate`], this keeps going after a failure and returns every
/// error it finds. An empty list means the target is ready to generate.
#[must_use]
pub fn validate_target(registry: &PluginRegistry, target: &OutputTarget) -> Vec<Error> {
    let mut errors = Vec::new();
    let mut plugins = Vec::with_capacity(target.plugins.len());
    for entry in &target.plugins {
        match registry.get(&entry.name) {
            Ok(plugin) => plugins.push((plugin, merge_config(&target.config, &entry.config))),
            Err(err) => errors.push(err),
        }
    }

    let extensions: Vec<String> = plugins
        .iter()
        .filter_map(|(plugin, config)| plugin.add_to_schema(config))
        .collect();
    let schema = match Schema::parse_with_extensions(&target.schema, &extensions) {
        Ok(schema) => schema,
        Err(err) => {
            errors.push(err);
            return errors;
        }
    };
    let fragments = match FragmentRegistry::build(&target.documents, &target.external_fragments) {
        Ok(fragments) => fragments,
        Err(err) => {
            errors.push(err);
            return errors;
        }
    };
    let all_plugins: Vec<String> = target.plugins.iter().map(|e| e.name.clone()).collect();

    let null = Value::Null;
    let base = PluginInput {
        schema: &schema,
        documents: &target.documents,
        fragments: &fragments,
        config: &null,
        output_file: &target.filename,
        all_plugins: &all_plugins,
    };
    for (plugin, config) in &plugins {
        if let Err(err) = plugin.validate(&PluginInput { config, ..base }) {
            errors.push(validation_error(plugin.name(), err));
        }
    }
    errors
}

/// Extension and config errors already name their plugin.
fn validation_error(plugin: &str, err: Error) -> Error {
    match err {
        Error::OutputExtension { .. } | Error::MalformedConfig { .. } => err,
        other => Error::PluginValidation {
            plugin: plugin.to_string(),
            source: Box::new(other),
        },
    }
}

/// Joins plugin outputs: de-duplicated prepend lines, then every content,
/// then append lines.
#[must_use]
pub fn merge_outputs(outputs: Vec<PluginOutput>) -> String {
    let mut prepend = IndexSet::new();
    let mut content = Vec::new();
    let mut append = Vec::new();
    for output in outputs {
        prepend.extend(output.prepend);
        if !output.content.is_empty() {
            content.push(output.content);
        }
        append.extend(output.append);
    }
    prepend
        .into_iter()
        .chain(content)
        .chain(append)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_outputs_dedupes_prepend() {
        let merged = merge_outputs(vec![
            PluginOutput::new("type A = 1;").with_prepend("// @flow"),
            PluginOutput::new("")
                .with_prepend("// @flow")
                .with_append("// end"),
            PluginOutput::new("type B = 2;"),
        ]);
        assert_eq!(merged, "// @flow\ntype A = 1;\ntype B = 2;\n// end");
    }

    #[test]
    fn test_plugin_entry() {
        let entry = PluginEntry::new("add").with_config(serde_json::json!("x"));
        assert_eq!(entry.name, "add");
        assert_eq!(entry.config, serde_json::json!("x"));
    }
}
