//! Plugin configuration helpers.

use indexmap::IndexMap;
use qlgen_core::{Error, Result};
use qlgen_shape::{ScalarMap, ShapeOptions, TypeNames};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Merges a plugin's config over its target's config.
///
/// Objects merge shallowly with the plugin's keys winning. A plugin config
/// that is not an object (e.g. `add: "// header"`) replaces the target
/// config; a missing one keeps it.
#[must_use]
pub fn merge_config(target: &Value, plugin: &Value) -> Value {
    match (target, plugin) {
        (_, Value::Null) => target.clone(),
        (Value::Object(base), Value::Object(overrides)) => {
            let mut merged = base.clone();
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, other) => other.clone(),
    }
}

/// Deserializes a plugin config, mapping failures to
/// [`Error::MalformedConfig`]. `null` yields the default config.
pub fn parse_config<T: DeserializeOwned + Default>(plugin: &str, config: &Value) -> Result<T> {
    if config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(config.clone())
        .map_err(|e| Error::malformed_config(plugin, e.to_string()))
}

/// Fails with [`Error::OutputExtension`] unless `output_file` ends with one
/// of `allowed`.
pub fn require_extension(plugin: &str, output_file: &str, allowed: &[&str]) -> Result<()> {
    if allowed.iter().any(|ext| output_file.ends_with(ext)) {
        return Ok(());
    }
    Err(Error::OutputExtension {
        plugin: plugin.to_string(),
        path: output_file.to_string(),
        expected: allowed.join(", "),
    })
}

/// Options shared by the TypeScript and Flow plugins.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommonConfig {
    /// Extra scalar mappings, GraphQL name to target type.
    pub scalars: IndexMap<String, String>,
    pub types_prefix: String,
    pub types_suffix: String,
    pub skip_typename: bool,
    pub non_optional_typename: bool,
    pub avoid_optionals: bool,
    pub immutable_types: bool,
}

impl CommonConfig {
    #[must_use]
    pub fn names(&self) -> TypeNames {
        TypeNames::new(self.types_prefix.as_str(), self.types_suffix.as_str())
    }

    /// `defaults` with the configured scalar overrides applied.
    #[must_use]
    pub fn scalars(&self, defaults: ScalarMap) -> ScalarMap {
        defaults.with_overrides(self.scalars.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    #[must_use]
    pub fn shape_options(&self) -> ShapeOptions {
        ShapeOptions {
            skip_typename: self.skip_typename,
            non_optional_typename: self.non_optional_typename,
            avoid_optionals: self.avoid_optionals,
        }
    }
}
