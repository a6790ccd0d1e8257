//! The `fragment-matcher` plugin: possible types of every abstract type,
//! shaped for Apollo Client's cache.

use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use indexmap::IndexMap;
use qlgen_core::{Error, Result};
use qlgen_schema::Schema;
use serde::Deserialize;
use serde_json::{json, Value};

const EXTENSIONS: &[&str] = &[".json", ".ts", ".tsx", ".js", ".jsx"];

/// Module format of `.js` and `.ts` outputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Es2015,
    Commonjs,
}

/// Options of the `fragment-matcher` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FragmentMatcherConfig {
    /// `3` emits `possibleTypes`, `2` the introspection subset.
    pub apollo_client_version: u8,
    pub module: ModuleFormat,
}

impl Default for FragmentMatcherConfig {
    fn default() -> Self {
        Self {
            apollo_client_version: 3,
            module: ModuleFormat::default(),
        }
    }
}

impl FragmentMatcherConfig {
    fn check(&self, plugin: &str) -> Result<()> {
        if matches!(self.apollo_client_version, 2 | 3) {
            Ok(())
        } else {
            Err(Error::malformed_config(
                plugin,
                format!(
                    "apolloClientVersion must be 2 or 3, got {}",
                    self.apollo_client_version
                ),
            ))
        }
    }
}

/// Emits the possible types of interfaces and unions.
#[derive(Debug, Clone, Copy, Default)]
pub struct FragmentMatcherPlugin;

impl FragmentMatcherPlugin {
    pub const NAME: &'static str = "fragment-matcher";
}

#[async_trait]
impl Plugin for FragmentMatcherPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<FragmentMatcherConfig>(Self::NAME, input.config)?.check(Self::NAME)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: FragmentMatcherConfig = parse_config(Self::NAME, input.config)?;
        config.check(Self::NAME)?;
        let data = if config.apollo_client_version == 2 {
            introspection_result(input.schema)
        } else {
            possible_types(input.schema)
        };
        let json = serde_json::to_string_pretty(&data).map_err(|e| Error::custom(e.to_string()))?;

        let file = input.output_file;
        let is_ts = file.ends_with(".ts") || file.ends_with(".tsx");
        let content = if file.ends_with(".json") {
            json
        } else if is_ts {
            let (interface, name) = if config.apollo_client_version == 2 {
                (
                    "export interface IntrospectionResultData {\n  __schema: {\n    types: {\n      \
                     kind: string;\n      name: string;\n      possibleTypes: {\n        name: string;\n      \
                     }[];\n    }[];\n  };\n}",
                    "IntrospectionResultData",
                )
            } else {
                (
                    "export interface PossibleTypesResultData {\n  possibleTypes: {\n    \
                     [key: string]: string[];\n  };\n}",
                    "PossibleTypesResultData",
                )
            };
            format!("{interface}\n\nconst result: {name} = {json};\n\nexport default result;")
        } else {
            match config.module {
                ModuleFormat::Es2015 => format!("const result = {json};\n\nexport default result;"),
                ModuleFormat::Commonjs => format!("module.exports = {json};"),
            }
        };
        Ok(PluginOutput::new(content))
    }
}

/// `{ possibleTypes: { Abstract: [Concrete, ...] } }`.
fn possible_types(schema: &Schema) -> Value {
    let map: IndexMap<&str, Vec<&str>> = schema
        .types()
        .filter(|ty| ty.kind.is_abstract())
        .map(|ty| (ty.name.as_str(), schema.possible_types(&ty.name)))
        .collect();
    json!({ "possibleTypes": map })
}

/// The `__schema.types` subset older clients feed to their fragment
/// matcher.
fn introspection_result(schema: &Schema) -> Value {
    let types: Vec<Value> = schema
        .types()
        .filter(|ty| ty.kind.is_abstract())
        .map(|ty| {
            let possible: Vec<Value> = schema
                .possible_types(&ty.name)
                .into_iter()
                .map(|name| json!({ "name": name }))
                .collect();
            json!({ "kind": ty.kind.as_str(), "name": ty.name, "possibleTypes": possible })
        })
        .collect();
    json!({ "__schema": { "types": types } })
}
