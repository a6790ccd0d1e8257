//! The `schema-ast` plugin: the merged schema printed back as SDL.

use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use graphql_parser::schema::{Definition, TypeDefinition, TypeExtension};
use qlgen_core::Result;
use qlgen_schema::SchemaDocument;
use serde::Deserialize;

const EXTENSIONS: &[&str] = &[".graphql", ".gql", ".graphqls"];

/// Options of the `schema-ast` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchemaAstConfig {
    /// Keep directive definitions and usages.
    pub include_directives: bool,
    /// Sort types, fields and enum values by name.
    pub sort: bool,
}

impl Default for SchemaAstConfig {
    fn default() -> Self {
        Self {
            include_directives: true,
            sort: false,
        }
    }
}

/// Prints the schema, including every plugin's schema extensions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAstPlugin;

impl SchemaAstPlugin {
    pub const NAME: &'static str = "schema-ast";
}

#[async_trait]
impl Plugin for SchemaAstPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<SchemaAstConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: SchemaAstConfig = parse_config(Self::NAME, input.config)?;
        if config.include_directives && !config.sort {
            return Ok(PluginOutput::new(input.schema.print().trim_end()));
        }
        let mut document = input.schema.document().clone();
        if !config.include_directives {
            strip_directives(&mut document);
        }
        if config.sort {
            sort_definitions(&mut document);
        }
        Ok(PluginOutput::new(document.to_string().trim_end()))
    }
}

/// Removes directive definitions and every directive usage.
fn strip_directives(document: &mut SchemaDocument) {
    document
        .definitions
        .retain(|def| !matches!(def, Definition::DirectiveDefinition(_)));

    macro_rules! clear_fields {
        ($fields:expr) => {
            for field in &mut $fields {
                field.directives.clear();
                for argument in &mut field.arguments {
                    argument.directives.clear();
                }
            }
        };
    }
    macro_rules! clear_inputs {
        ($fields:expr) => {
            for field in &mut $fields {
                field.directives.clear();
            }
        };
    }

    for definition in &mut document.definitions {
        match definition {
            Definition::SchemaDefinition(schema) => schema.directives.clear(),
            Definition::TypeDefinition(ty) => match ty {
                TypeDefinition::Scalar(t) => t.directives.clear(),
                TypeDefinition::Object(t) => {
                    t.directives.clear();
                    clear_fields!(t.fields);
                }
                TypeDefinition::Interface(t) => {
                    t.directives.clear();
                    clear_fields!(t.fields);
                }
                TypeDefinition::Union(t) => t.directives.clear(),
                TypeDefinition::Enum(t) => {
                    t.directives.clear();
                    clear_inputs!(t.values);
                }
                TypeDefinition::InputObject(t) => {
                    t.directives.clear();
                    clear_inputs!(t.fields);
                }
            },
            Definition::TypeExtension(ext) => match ext {
                TypeExtension::Scalar(t) => t.directives.clear(),
                TypeExtension::Object(t) => {
                    t.directives.clear();
                    clear_fields!(t.fields);
                }
                TypeExtension::Interface(t) => {
                    t.directives.clear();
                    clear_fields!(t.fields);
                }
                TypeExtension::Union(t) => t.directives.clear(),
                TypeExtension::Enum(t) => {
                    t.directives.clear();
                    clear_inputs!(t.values);
                }
                TypeExtension::InputObject(t) => {
                    t.directives.clear();
                    clear_inputs!(t.fields);
                }
            },
            Definition::DirectiveDefinition(_) => {}
        }
    }
}

/// Sort key: schema definition first, then types, extensions and
/// directives, each group by name.
fn definition_key(definition: &Definition<'static, String>) -> (u8, String) {
    match definition {
        Definition::SchemaDefinition(_) => (0, String::new()),
        Definition::TypeDefinition(ty) => (
            1,
            match ty {
                TypeDefinition::Scalar(t) => t.name.clone(),
                TypeDefinition::Object(t) => t.name.clone(),
                TypeDefinition::Interface(t) => t.name.clone(),
                TypeDefinition::Union(t) => t.name.clone(),
                TypeDefinition::Enum(t) => t.name.clone(),
                TypeDefinition::InputObject(t) => t.name.clone(),
            },
        ),
        Definition::TypeExtension(ext) => (
            2,
            match ext {
                TypeExtension::Scalar(t) => t.name.clone(),
                TypeExtension::Object(t) => t.name.clone(),
                TypeExtension::Interface(t) => t.name.clone(),
                TypeExtension::Union(t) => t.name.clone(),
                TypeExtension::Enum(t) => t.name.clone(),
                TypeExtension::InputObject(t) => t.name.clone(),
            },
        ),
        Definition::DirectiveDefinition(d) => (3, d.name.clone()),
    }
}

fn sort_definitions(document: &mut SchemaDocument) {
    document.definitions.sort_by_key(definition_key);
    for definition in &mut document.definitions {
        if let Definition::TypeDefinition(ty) = definition {
            match ty {
                TypeDefinition::Object(t) => t.fields.sort_by(|a, b| a.name.cmp(&b.name)),
                TypeDefinition::Interface(t) => t.fields.sort_by(|a, b| a.name.cmp(&b.name)),
                TypeDefinition::Enum(t) => t.values.sort_by(|a, b| a.name.cmp(&b.name)),
                TypeDefinition::InputObject(t) => t.fields.sort_by(|a, b| a.name.cmp(&b.name)),
                TypeDefinition::Scalar(_) | TypeDefinition::Union(_) => {}
            }
        }
    }
}
