//! TypeScript plugins.
//!
//! - `typescript`: schema types (`Maybe`, `Scalars`, objects, inputs, enums, unions)
//! - `typescript-operations`: operation and fragment result types
//! - `typescript-documents`: document constants

mod ast;
mod documents;
mod operations;

pub use documents::{DocumentMode, TypeScriptDocumentsConfig, TypeScriptDocumentsPlugin};
pub use operations::{TypeScriptOperationsConfig, TypeScriptOperationsPlugin};

use crate::common::{args_type_name, declared_types, record_schema_types, schema_type_ref};
use crate::config::{parse_config, require_extension, CommonConfig};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::{block_comment, CodeWriter, Result};
use qlgen_schema::{FieldDef, InputValueDef, Schema, TypeDef, TypeKind};
use qlgen_shape::{Dialect, NameConverter, NullableStyle, ScalarMap, ScalarResolver, TypeNames, TypeScript};
use serde::Deserialize;
use serde_json::Value;

pub(crate) const EXTENSIONS: &[&str] = &[".ts", ".tsx"];

const FEDERATION_SDL: &str = "scalar _FieldSet

directive @external on FIELD_DEFINITION
directive @requires(fields: _FieldSet!) on FIELD_DEFINITION
directive @provides(fields: _FieldSet!) on FIELD_DEFINITION
directive @key(fields: _FieldSet!) on OBJECT | INTERFACE
directive @extends on OBJECT | INTERFACE";

/// Options of the `typescript` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeScriptConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Definition of `Maybe<T>`.
    pub maybe_value: String,
    /// Emit enums as string-literal unions.
    pub enums_as_types: bool,
    pub const_enums: bool,
    /// Add the federation directives and omit `@external` fields.
    pub federation: bool,
    pub no_export: bool,
}

impl Default for TypeScriptConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            maybe_value: "T | null".to_string(),
            enums_as_types: false,
            const_enums: false,
            federation: false,
            no_export: false,
        }
    }
}

/// Emits the schema types.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptPlugin;

impl TypeScriptPlugin {
    pub const NAME: &'static str = "typescript";
}

#[async_trait]
impl Plugin for TypeScriptPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn add_to_schema(&self, config: &Value) -> Option<String> {
        let federation = config
            .get("federation")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        federation.then(|| FEDERATION_SDL.to_string())
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<TypeScriptConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: TypeScriptConfig = parse_config(Self::NAME, input.config)?;
        let content = SchemaTypesVisitor::new(input.schema, &config).visit();
        record_schema_types(ctx, input.schema);
        Ok(PluginOutput::new(content))
    }
}

struct SchemaTypesVisitor<'a> {
    schema: &'a Schema,
    config: &'a TypeScriptConfig,
    dialect: TypeScript,
    names: TypeNames,
    scalars: ScalarMap,
    export: &'static str,
}

impl<'a> SchemaTypesVisitor<'a> {
    fn new(schema: &'a Schema, config: &'a TypeScriptConfig) -> Self {
        Self {
            schema,
            config,
            dialect: TypeScript::new(NullableStyle::Maybe).immutable(config.common.immutable_types),
            names: config.common.names(),
            scalars: config.common.scalars(ScalarMap::typescript()),
            export: if config.no_export { "" } else { "export " },
        }
    }

    fn visit(&self) -> String {
        let mut blocks = vec![
            format!(
                "{}type Maybe<T> = {};",
                self.export,
                self.config.maybe_value
            ),
            self.scalars_type(),
        ];
        for ty in declared_types(self.schema) {
            match ty.kind {
                TypeKind::Scalar => {}
                TypeKind::Object | TypeKind::Interface => {
                    blocks.push(self.object(ty));
                    blocks.extend(self.field_args(ty));
                }
                TypeKind::InputObject => blocks.push(self.input_object(ty)),
                TypeKind::Enum => blocks.push(self.enumeration(ty)),
                TypeKind::Union => blocks.push(self.union(ty)),
            }
        }
        blocks.join("\n\n")
    }

    fn scalars_type(&self) -> String {
        let mut w = CodeWriter::new();
        w.line("/** All built-in and custom scalars, mapped to their actual values */");
        w.block(&format!("{}type Scalars = {{", self.export), "};", |w| {
            for ty in self.schema.types_of_kind(TypeKind::Scalar) {
                if self.config.federation && ty.name == "_FieldSet" {
                    continue;
                }
                w.line(format!(
                    "{}: {};",
                    ty.name,
                    self.scalars.resolve_or_fallback(&ty.name)
                ));
            }
        });
        w.finish()
    }

    fn description(w: &mut CodeWriter, description: Option<&str>, deprecation: Option<&str>) {
        let mut text = description.unwrap_or_default().to_string();
        if let Some(reason) = deprecation {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str("@deprecated ");
            text.push_str(reason);
        }
        if !text.is_empty() {
            w.lines(&block_comment(&text));
        }
    }

    fn included_fields<'t>(&self, ty: &'t TypeDef) -> impl Iterator<Item = &'t FieldDef> + 't {
        let federation = self.config.federation;
        ty.fields
            .values()
            .filter(move |field| !(federation && field.has_directive("external")))
    }

    fn property(&self, key: &str, ty: &qlgen_schema::TypeRef, optional: bool) -> String {
        let readonly = if self.config.common.immutable_types {
            "readonly "
        } else {
            ""
        };
        let marker = if optional { "?" } else { "" };
        format!(
            "{readonly}{key}{marker}: {};",
            schema_type_ref(self.schema, &self.dialect, &self.names, ty)
        )
    }

    fn object(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::description(&mut w, ty.description.as_deref(), None);
        let mut head = String::new();
        for interface in &ty.interfaces {
            head.push_str(&self.names.convert(interface));
            head.push_str(" & ");
        }
        let open = format!(
            "{}type {} = {head}{{",
            self.export,
            self.names.convert(&ty.name)
        );
        w.block(&open, "};", |w| {
            if ty.kind == TypeKind::Object && !self.config.common.skip_typename {
                let marker = if self.config.common.non_optional_typename {
                    ""
                } else {
                    "?"
                };
                w.line(format!(
                    "__typename{marker}: {};",
                    self.dialect.string_literal(&ty.name)
                ));
            }
            for field in self.included_fields(ty) {
                Self::description(
                    w,
                    field.description.as_deref(),
                    field
                        .deprecation
                        .as_ref()
                        .map(|d| d.reason.as_deref().unwrap_or("No longer supported")),
                );
                let optional = field.ty.is_nullable() && !self.config.common.avoid_optionals;
                w.line(self.property(&field.name, &field.ty, optional));
            }
        });
        w.finish()
    }

    fn input_fields(&self, w: &mut CodeWriter, fields: &[&InputValueDef]) {
        for field in fields {
            Self::description(w, field.description.as_deref(), None);
            let optional = (field.ty.is_nullable() && !self.config.common.avoid_optionals)
                || field.default_value.is_some();
            w.line(self.property(&field.name, &field.ty, optional));
        }
    }

    fn field_args(&self, ty: &TypeDef) -> Vec<String> {
        self.included_fields(ty)
            .filter(|field| !field.arguments.is_empty())
            .map(|field| {
                let mut w = CodeWriter::new();
                let open = format!(
                    "{}type {} = {{",
                    self.export,
                    args_type_name(&self.names, &ty.name, &field.name)
                );
                let args: Vec<&InputValueDef> = field.arguments.iter().collect();
                w.block(&open, "};", |w| self.input_fields(w, &args));
                w.finish()
            })
            .collect()
    }

    fn input_object(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::description(&mut w, ty.description.as_deref(), None);
        let open = format!("{}type {} = {{", self.export, self.names.convert(&ty.name));
        let fields: Vec<&InputValueDef> = ty.input_fields.values().collect();
        w.block(&open, "};", |w| self.input_fields(w, &fields));
        w.finish()
    }

    fn enumeration(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::description(&mut w, ty.description.as_deref(), None);
        let name = self.names.convert(&ty.name);
        if self.config.enums_as_types {
            let values: Vec<String> = ty
                .enum_values
                .iter()
                .map(|v| self.dialect.string_literal(&v.name))
                .collect();
            w.line(format!("{}type {name} = {};", self.export, values.join(" | ")));
            return w.finish();
        }

        let keyword = if self.config.const_enums {
            "const enum"
        } else {
            "enum"
        };
        w.block(&format!("{}{keyword} {name} {{", self.export), "}", |w| {
            for value in &ty.enum_values {
                Self::description(
                    w,
                    value.description.as_deref(),
                    value
                        .deprecation
                        .as_ref()
                        .map(|d| d.reason.as_deref().unwrap_or("No longer supported")),
                );
                w.line(format!("{0} = '{0}',", value.name));
            }
        });
        w.finish()
    }

    fn union(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::description(&mut w, ty.description.as_deref(), None);
        let members: Vec<String> = ty.members.iter().map(|m| self.names.convert(m)).collect();
        w.line(format!(
            "{}type {} = {};",
            self.export,
            self.names.convert(&ty.name),
            members.join(" | ")
        ));
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SDL: &str = r#"
"A person"
type User implements Node {
  id: ID!
  name: String
  friends(first: Int = 10, after: String): [User!]!
  legacy: String @deprecated(reason: "use name")
}

interface Node {
  id: ID!
}

input UserFilter {
  name: String
  role: Role!
}

enum Role {
  ADMIN
  MEMBER
}

union Actor = User

scalar Date

type Query {
  me: User
  at: Date
}
"#;

    fn render(config: Value) -> String {
        let schema = Schema::parse(SDL).unwrap();
        let config: TypeScriptConfig = parse_config("typescript", &config).unwrap();
        SchemaTypesVisitor::new(&schema, &config).visit()
    }

    #[test]
    fn test_preamble() {
        let out = render(json!({ "scalars": { "Date": "string" } }));
        assert!(out.starts_with("export type Maybe<T> = T | null;\n\n"));
        assert!(out.contains(
            "export type Scalars = {\n  ID: string;\n  String: string;\n  Boolean: boolean;\n  \
             Int: number;\n  Float: number;\n  Date: string;\n};"
        ));
    }

    #[test]
    fn test_object_type() {
        let out = render(Value::Null);
        insta::assert_snapshot!(
            out.split("\n\n").nth(2).unwrap(),
            @r"
        /** A person */
        export type User = Node & {
          __typename?: 'User';
          id: Scalars['ID'];
          name?: Maybe<Scalars['String']>;
          friends: Array<User>;
          /** @deprecated use name */
          legacy?: Maybe<Scalars['String']>;
        };
        "
        );
    }

    #[test]
    fn test_field_args_and_inputs() {
        let out = render(Value::Null);
        assert!(out.contains(
            "export type UserFriendsArgs = {\n  first?: Maybe<Scalars['Int']>;\n  \
             after?: Maybe<Scalars['String']>;\n};"
        ));
        assert!(out.contains(
            "export type UserFilter = {\n  name?: Maybe<Scalars['String']>;\n  role: Role;\n};"
        ));
    }

    #[test]
    fn test_enums_and_unions() {
        let out = render(Value::Null);
        assert!(out.contains("export enum Role {\n  ADMIN = 'ADMIN',\n  MEMBER = 'MEMBER',\n}"));
        assert!(out.contains("export type Actor = User;"));

        let out = render(json!({ "enumsAsTypes": true, "typesPrefix": "I" }));
        assert!(out.contains("export type IRole = 'ADMIN' | 'MEMBER';"));
        assert!(out.contains("export type IActor = IUser;"));
    }

    #[test]
    fn test_avoid_optionals_and_immutable() {
        let out = render(json!({ "avoidOptionals": true, "immutableTypes": true, "skipTypename": true }));
        assert!(out.contains("  readonly name: Maybe<Scalars['String']>;"));
        assert!(out.contains("  readonly friends: ReadonlyArray<User>;"));
        assert!(!out.contains("__typename"));
    }

    #[test]
    fn test_federation_sdl_and_external_fields() {
        let plugin = TypeScriptPlugin;
        assert!(plugin.add_to_schema(&Value::Null).is_none());
        let sdl = plugin.add_to_schema(&json!({ "federation": true })).unwrap();
        let schema = Schema::parse_with_extensions(
            "type Query { me: User } type User @key(fields: \"id\") { id: ID! email: String @external }",
            &[sdl],
        )
        .unwrap();
        let config: TypeScriptConfig =
            parse_config("typescript", &json!({ "federation": true })).unwrap();
        let out = SchemaTypesVisitor::new(&schema, &config).visit();
        assert!(out.contains("id: Scalars['ID'];"));
        assert!(!out.contains("email"));
        assert!(!out.contains("_FieldSet"));
    }
}
