//! Flow plugins: `flow` for schema types and `flow-operations` for
//! operation and fragment shapes.

mod operations;

pub use operations::{FlowOperationsConfig, FlowOperationsPlugin};

use crate::common::{args_type_name, declared_types, record_schema_types, schema_type_ref};
use crate::config::{parse_config, require_extension, CommonConfig};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::{block_comment, CodeWriter, Result};
use qlgen_schema::{InputValueDef, Schema, TypeDef, TypeKind, TypeRef};
use qlgen_shape::{Dialect, Flow, ScalarMap, ScalarResolver, NameConverter, TypeNames};
use serde::Deserialize;

pub(crate) const EXTENSIONS: &[&str] = &[".js", ".jsx", ".flow"];

/// Header every Flow output starts with.
pub(crate) const FLOW_HEADER: &str = "// @flow";

/// Options of the `flow` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub use_flow_exact_objects: bool,
    pub use_flow_read_only_types: bool,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            common: CommonConfig::default(),
            use_flow_exact_objects: true,
            use_flow_read_only_types: false,
        }
    }
}

impl FlowConfig {
    pub(crate) fn dialect(&self) -> Flow {
        Flow {
            exact: self.use_flow_exact_objects,
            read_only: self.use_flow_read_only_types,
        }
    }
}

/// Emits Flow schema types.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowPlugin;

impl FlowPlugin {
    pub const NAME: &'static str = "flow";
}

#[async_trait]
impl Plugin for FlowPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<FlowConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: FlowConfig = parse_config(Self::NAME, input.config)?;
        let content = FlowVisitor::new(input.schema, &config).visit();
        record_schema_types(ctx, input.schema);
        Ok(PluginOutput::new(content).with_prepend(FLOW_HEADER))
    }
}

struct FlowVisitor<'a> {
    schema: &'a Schema,
    config: &'a FlowConfig,
    dialect: Flow,
    names: TypeNames,
    scalars: ScalarMap,
}

impl<'a> FlowVisitor<'a> {
    fn new(schema: &'a Schema, config: &'a FlowConfig) -> Self {
        Self {
            schema,
            config,
            dialect: config.dialect(),
            names: config.common.names(),
            scalars: config.common.scalars(ScalarMap::flow()),
        }
    }

    fn visit(&self) -> String {
        let mut blocks = vec![self.scalars_type()];
        for ty in declared_types(self.schema) {
            match ty.kind {
                TypeKind::Scalar => {}
                TypeKind::Object | TypeKind::Interface => {
                    blocks.push(self.object(ty));
                    blocks.extend(self.field_args(ty));
                }
                TypeKind::InputObject => {
                    let fields: Vec<&InputValueDef> = ty.input_fields.values().collect();
                    blocks.push(self.input_type(
                        ty.description.as_deref(),
                        &self.names.convert(&ty.name),
                        &fields,
                    ));
                }
                TypeKind::Enum => blocks.push(self.enumeration(ty)),
                TypeKind::Union => blocks.push(self.union(ty)),
            }
        }
        blocks.join("\n\n")
    }

    fn braces(&self) -> (&'static str, &'static str) {
        if self.config.use_flow_exact_objects {
            ("{|", "|}")
        } else {
            ("{", "}")
        }
    }

    fn variance(&self) -> &'static str {
        if self.config.use_flow_read_only_types {
            "+"
        } else {
            ""
        }
    }

    fn scalars_type(&self) -> String {
        let (open, close) = self.braces();
        let mut w = CodeWriter::new();
        w.line("/** All built-in and custom scalars, mapped to their actual values */");
        w.block(&format!("export type Scalars = {open}"), &format!("{close};"), |w| {
            for ty in self.schema.types_of_kind(TypeKind::Scalar) {
                w.line(format!(
                    "{}: {},",
                    ty.name,
                    self.scalars.resolve_or_fallback(&ty.name)
                ));
            }
        });
        w.finish()
    }

    fn property(&self, key: &str, ty: &TypeRef, optional: bool) -> String {
        let marker = if optional { "?" } else { "" };
        format!(
            "{}{key}{marker}: {},",
            self.variance(),
            schema_type_ref(self.schema, &self.dialect, &self.names, ty)
        )
    }

    fn object(&self, ty: &TypeDef) -> String {
        let (open, close) = self.braces();
        let mut w = CodeWriter::new();
        if let Some(description) = ty.description.as_deref() {
            w.lines(&block_comment(description));
        }
        let mut head = String::new();
        for interface in &ty.interfaces {
            head.push_str(&self.names.convert(interface));
            head.push_str(" & ");
        }
        let decl = format!("export type {} = {head}{open}", self.names.convert(&ty.name));
        w.block(&decl, &format!("{close};"), |w| {
            if ty.kind == TypeKind::Object && !self.config.common.skip_typename {
                let marker = if self.config.common.non_optional_typename {
                    ""
                } else {
                    "?"
                };
                w.line(format!(
                    "__typename{marker}: {},",
                    self.dialect.string_literal(&ty.name)
                ));
            }
            for field in ty.fields.values() {
                if let Some(description) = field.description.as_deref() {
                    w.lines(&block_comment(description));
                }
                let optional = field.ty.is_nullable() && !self.config.common.avoid_optionals;
                w.line(self.property(&field.name, &field.ty, optional));
            }
        });
        w.finish()
    }

    fn input_type(&self, description: Option<&str>, name: &str, fields: &[&InputValueDef]) -> String {
        let (open, close) = self.braces();
        let mut w = CodeWriter::new();
        if let Some(description) = description {
            w.lines(&block_comment(description));
        }
        w.block(&format!("export type {name} = {open}"), &format!("{close};"), |w| {
            for field in fields {
                let optional = (field.ty.is_nullable() && !self.config.common.avoid_optionals)
                    || field.default_value.is_some();
                w.line(self.property(&field.name, &field.ty, optional));
            }
        });
        w.finish()
    }

    fn field_args(&self, ty: &TypeDef) -> Vec<String> {
        ty.fields
            .values()
            .filter(|field| !field.arguments.is_empty())
            .map(|field| {
                let args: Vec<&InputValueDef> = field.arguments.iter().collect();
                self.input_type(None, &args_type_name(&self.names, &ty.name, &field.name), &args)
            })
            .collect()
    }

    fn enumeration(&self, ty: &TypeDef) -> String {
        let name = self.names.convert(&ty.name);
        let mut w = CodeWriter::new();
        if let Some(description) = ty.description.as_deref() {
            w.lines(&block_comment(description));
        }
        w.block(
            &format!("export const {name}Values = Object.freeze({{"),
            "});",
            |w| {
                for value in &ty.enum_values {
                    w.line(format!("{}: {},", value.name, self.dialect.string_literal(&value.name)));
                }
            },
        );
        w.blank();
        w.line(format!("export type {name} = $Values<typeof {name}Values>;"));
        w.finish()
    }

    fn union(&self, ty: &TypeDef) -> String {
        let members: Vec<String> = ty.members.iter().map(|m| self.names.convert(m)).collect();
        format!(
            "export type {} = {};",
            self.names.convert(&ty.name),
            members.join(" | ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    const SDL: &str = "
interface Node { id: ID! }
type User implements Node { id: ID! name: String tags: [String!]! posts(first: Int): [Post] }
type Post { title: String! }
input PostFilter { title: String limit: Int = 10 }
enum Role { ADMIN MEMBER }
union Entry = User | Post
type Query { me: User }
";

    fn render(config: Value) -> String {
        let schema = Schema::parse(SDL).unwrap();
        let config: FlowConfig = parse_config("flow", &config).unwrap();
        FlowVisitor::new(&schema, &config).visit()
    }

    #[test]
    fn test_scalars_and_object() {
        let out = render(Value::Null);
        assert!(out.starts_with(
            "/** All built-in and custom scalars, mapped to their actual values */\n\
             export type Scalars = {|\n  ID: string,\n"
        ));
        insta::assert_snapshot!(
            out.split("\n\n").find(|b| b.starts_with("export type User ")).unwrap(),
            @r"
        export type User = Node & {|
          __typename?: 'User',
          id: $ElementType<Scalars, 'ID'>,
          name?: ?$ElementType<Scalars, 'String'>,
          tags: Array<$ElementType<Scalars, 'String'>>,
          posts?: ?Array<?Post>,
        |};
        "
        );
    }

    #[test]
    fn test_inputs_args_enums_unions() {
        let out = render(Value::Null);
        assert!(out.contains(
            "export type PostFilter = {|\n  title?: ?$ElementType<Scalars, 'String'>,\n  \
             limit?: ?$ElementType<Scalars, 'Int'>,\n|};"
        ));
        assert!(out.contains("export type UserPostsArgs = {|\n  first?: ?$ElementType<Scalars, 'Int'>,\n|};"));
        assert!(out.contains(
            "export const RoleValues = Object.freeze({\n  ADMIN: 'ADMIN',\n  MEMBER: 'MEMBER',\n});\n\n\
             export type Role = $Values<typeof RoleValues>;"
        ));
        assert!(out.contains("export type Entry = User | Post;"));
    }

    #[test]
    fn test_inexact_read_only() {
        let out = render(json!({
            "useFlowExactObjects": false,
            "useFlowReadOnlyTypes": true,
            "skipTypename": true
        }));
        assert!(out.contains("export type Post = {\n  +title: $ElementType<Scalars, 'String'>,\n};"));
        assert!(out.contains("+tags: $ReadOnlyArray<$ElementType<Scalars, 'String'>>,"));
    }

    #[tokio::test]
    async fn test_plugin_prepends_header_and_records_types() {
        let schema = Schema::parse(SDL).unwrap();
        let fragments = qlgen_schema::FragmentRegistry::default();
        let config = Value::Null;
        let input = PluginInput {
            schema: &schema,
            documents: &[],
            fragments: &fragments,
            config: &config,
            output_file: "types.js",
            all_plugins: &[],
        };
        let mut ctx = PluginContext::new();
        FlowPlugin.validate(&input).unwrap();
        let output = FlowPlugin.generate(&input, &mut ctx).await.unwrap();
        assert_eq!(output.prepend, [FLOW_HEADER]);
        let recorded: Vec<String> = ctx.get_as(crate::common::SCHEMA_TYPES_KEY).unwrap();
        assert!(recorded.contains(&"User".to_string()));

        let input = PluginInput {
            output_file: "types.ts",
            ..input
        };
        assert!(FlowPlugin.validate(&input).is_err());
    }
}
