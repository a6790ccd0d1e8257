//! The `introspection` plugin: the schema as an introspection query result.

use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::{Error, Result};
use qlgen_schema::{
    Deprecation, InputValueDef, OperationKind, Schema, TypeDef, TypeKind, TypeRef,
};
use serde::Deserialize;
use serde_json::{json, Value};

const EXTENSIONS: &[&str] = &[".json"];

/// Options of the `introspection` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntrospectionConfig {
    /// Print without whitespace.
    pub minify: bool,
    /// Include descriptions.
    pub descriptions: bool,
}

impl Default for IntrospectionConfig {
    fn default() -> Self {
        Self {
            minify: false,
            descriptions: true,
        }
    }
}

/// Emits the `__schema` introspection result as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntrospectionPlugin;

impl IntrospectionPlugin {
    pub const NAME: &'static str = "introspection";
}

#[async_trait]
impl Plugin for IntrospectionPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<IntrospectionConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: IntrospectionConfig = parse_config(Self::NAME, input.config)?;
        let result = introspect(input.schema, config.descriptions);
        let content = if config.minify {
            serde_json::to_string(&result)
        } else {
            serde_json::to_string_pretty(&result)
        }
        .map_err(|e| Error::custom(e.to_string()))?;
        Ok(PluginOutput::new(content))
    }
}

/// Directives every schema supports without declaring them.
const BUILTIN_DIRECTIVES: &[(&str, &str, &[&str], &[(&str, &str, Option<&str>)])] = &[
    (
        "include",
        "Directs the executor to include this field or fragment only when the `if` argument is true.",
        &["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        &[("if", "Included when true.", None)],
    ),
    (
        "skip",
        "Directs the executor to skip this field or fragment when the `if` argument is true.",
        &["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
        &[("if", "Skipped when true.", None)],
    ),
    (
        "deprecated",
        "Marks an element of a GraphQL schema as no longer supported.",
        &["FIELD_DEFINITION", "ARGUMENT_DEFINITION", "INPUT_FIELD_DEFINITION", "ENUM_VALUE"],
        &[(
            "reason",
            "Explains why this element was deprecated.",
            Some("\"No longer supported\""),
        )],
    ),
];

/// Builds the `{ "__schema": ... }` document. Introspection meta types are
/// not listed.
#[must_use]
pub fn introspect(schema: &Schema, descriptions: bool) -> Value {
    let describe = |text: Option<&str>| -> Value {
        match text {
            Some(text) if descriptions => json!(text),
            _ => Value::Null,
        }
    };
    let root = |kind| match schema.root_type_name(kind) {
        Some(name) => json!({ "name": name }),
        None => Value::Null,
    };

    let types: Vec<Value> = schema
        .types()
        .filter(|ty| !ty.name.starts_with("__"))
        .map(|ty| type_node(schema, ty, &describe))
        .collect();

    let mut directives: Vec<Value> = BUILTIN_DIRECTIVES
        .iter()
        .filter(|(name, ..)| !schema.directives().any(|d| d.name == *name))
        .map(|(name, description, locations, args)| {
            let args: Vec<Value> = args
                .iter()
                .map(|(arg, description, default)| {
                    let ty = if *name == "deprecated" {
                        named("SCALAR", "String")
                    } else {
                        json!({ "kind": "NON_NULL", "name": null, "ofType": named("SCALAR", "Boolean") })
                    };
                    json!({
                        "name": arg,
                        "description": describe(Some(*description)),
                        "type": ty,
                        "defaultValue": default,
                    })
                })
                .collect();
            json!({
                "name": name,
                "description": describe(Some(*description)),
                "locations": locations,
                "args": args,
            })
        })
        .collect();
    directives.extend(schema.directives().map(|directive| {
        json!({
            "name": directive.name,
            "description": describe(directive.description.as_deref()),
            "locations": directive.locations,
            "args": input_values(schema, &directive.arguments.iter().collect::<Vec<_>>(), &describe),
        })
    }));

    json!({
        "__schema": {
            "queryType": root(OperationKind::Query),
            "mutationType": root(OperationKind::Mutation),
            "subscriptionType": root(OperationKind::Subscription),
            "types": types,
            "directives": directives,
        }
    })
}

fn named(kind: &str, name: &str) -> Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

/// The `ofType` chain of a reference, outermost wrapper first.
fn type_ref(schema: &Schema, ty: &TypeRef) -> Value {
    fn chain(schema: &Schema, sdl: &str) -> Value {
        if let Some(inner) = sdl.strip_suffix('!') {
            return json!({ "kind": "NON_NULL", "name": null, "ofType": chain(schema, inner) });
        }
        if let Some(inner) = sdl.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            return json!({ "kind": "LIST", "name": null, "ofType": chain(schema, inner) });
        }
        let kind = schema.type_def(sdl).map_or("SCALAR", |def| def.kind.as_str());
        named(kind, sdl)
    }

    chain(schema, &ty.to_string())
}

fn deprecation(deprecation: Option<&Deprecation>) -> (bool, Value) {
    match deprecation {
        Some(d) => (
            true,
            json!(d.reason.as_deref().unwrap_or("No longer supported")),
        ),
        None => (false, Value::Null),
    }
}

fn input_values(
    schema: &Schema,
    values: &[&InputValueDef],
    describe: &dyn Fn(Option<&str>) -> Value,
) -> Vec<Value> {
    values
        .iter()
        .map(|value| {
            json!({
                "name": value.name,
                "description": describe(value.description.as_deref()),
                "type": type_ref(schema, &value.ty),
                "defaultValue": value.default_value,
            })
        })
        .collect()
}

fn type_node(schema: &Schema, ty: &TypeDef, describe: &dyn Fn(Option<&str>) -> Value) -> Value {
    let has_fields = matches!(ty.kind, TypeKind::Object | TypeKind::Interface);
    let fields = has_fields.then(|| {
        ty.fields
            .values()
            .map(|field| {
                let (is_deprecated, reason) = deprecation(field.deprecation.as_ref());
                json!({
                    "name": field.name,
                    "description": describe(field.description.as_deref()),
                    "args": input_values(schema, &field.arguments.iter().collect::<Vec<_>>(), describe),
                    "type": type_ref(schema, &field.ty),
                    "isDeprecated": is_deprecated,
                    "deprecationReason": reason,
                })
            })
            .collect::<Vec<_>>()
    });
    let input_fields = (ty.kind == TypeKind::InputObject)
        .then(|| input_values(schema, &ty.input_fields.values().collect::<Vec<_>>(), describe));
    let interfaces = has_fields.then(|| {
        ty.interfaces
            .iter()
            .map(|name| named("INTERFACE", name))
            .collect::<Vec<_>>()
    });
    let enum_values = (ty.kind == TypeKind::Enum).then(|| {
        ty.enum_values
            .iter()
            .map(|value| {
                let (is_deprecated, reason) = deprecation(value.deprecation.as_ref());
                json!({
                    "name": value.name,
                    "description": describe(value.description.as_deref()),
                    "isDeprecated": is_deprecated,
                    "deprecationReason": reason,
                })
            })
            .collect::<Vec<_>>()
    });
    let possible_types = ty.kind.is_abstract().then(|| {
        schema
            .possible_types(&ty.name)
            .into_iter()
            .map(|name| named("OBJECT", name))
            .collect::<Vec<_>>()
    });

    json!({
        "kind": ty.kind.as_str(),
        "name": ty.name,
        "description": describe(ty.description.as_deref()),
        "fields": fields,
        "inputFields": input_fields,
        "interfaces": interfaces,
        "enumValues": enum_values,
        "possibleTypes": possible_types,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::FragmentRegistry;

    const SDL: &str = r#"
"The root"
type Query { users(first: Int = 10): [User!]! node: Node }
interface Node { id: ID! }
type User implements Node { id: ID! name: String @deprecated(reason: "use fullName") }
enum Role { ADMIN }
input Filter { role: Role }
directive @auth(role: Role!) on FIELD_DEFINITION
"#;

    #[test]
    fn test_schema_roots_and_types() {
        let schema = Schema::parse(SDL).unwrap();
        let result = introspect(&schema, true);
        let root = &result["__schema"];
        assert_eq!(root["queryType"], json!({ "name": "Query" }));
        assert_eq!(root["mutationType"], Value::Null);

        let types = root["types"].as_array().unwrap();
        assert!(types.iter().all(|t| !t["name"].as_str().unwrap().starts_with("__")));
        let query = types.iter().find(|t| t["name"] == "Query").unwrap();
        assert_eq!(query["description"], "The root");
        assert_eq!(query["inputFields"], Value::Null);
        let users = &query["fields"][0];
        assert_eq!(users["args"][0]["defaultValue"], "10");
        assert_eq!(
            users["type"],
            json!({
                "kind": "NON_NULL", "name": null, "ofType": {
                    "kind": "LIST", "name": null, "ofType": {
                        "kind": "NON_NULL", "name": null, "ofType": {
                            "kind": "OBJECT", "name": "User", "ofType": null
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_abstract_types_and_deprecation() {
        let schema = Schema::parse(SDL).unwrap();
        let result = introspect(&schema, false);
        let types = result["__schema"]["types"].as_array().unwrap();
        let node = types.iter().find(|t| t["name"] == "Node").unwrap();
        assert_eq!(node["possibleTypes"], json!([named("OBJECT", "User")]));
        let user = types.iter().find(|t| t["name"] == "User").unwrap();
        assert_eq!(user["interfaces"], json!([named("INTERFACE", "Node")]));
        assert_eq!(user["fields"][1]["isDeprecated"], true);
        assert_eq!(user["fields"][1]["deprecationReason"], "use fullName");
        let query = types.iter().find(|t| t["name"] == "Query").unwrap();
        assert_eq!(query["description"], Value::Null);
    }

    #[test]
    fn test_directives() {
        let schema = Schema::parse(SDL).unwrap();
        let result = introspect(&schema, true);
        let names: Vec<&str> = result["__schema"]["directives"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["include", "skip", "deprecated", "auth"]);
    }

    #[tokio::test]
    async fn test_minify() {
        let schema = Schema::parse(SDL).unwrap();
        let fragments = FragmentRegistry::default();
        let config = json!({ "minify": true });
        let input = PluginInput {
            schema: &schema,
            documents: &[],
            fragments: &fragments,
            config: &config,
            output_file: "schema.json",
            all_plugins: &[],
        };
        let output = IntrospectionPlugin
            .generate(&input, &mut PluginContext::new())
            .await
            .unwrap();
        assert!(output.content.starts_with("{\"__schema\":{\"queryType\":{\"name\":\"Query\"}"));
        assert!(!output.content.contains('\n'));
    }
}
