//! The `kotlin` plugin.

use crate::common::{args_type_name, declared_types, package_from_path};
use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use indexmap::IndexMap;
use qlgen_core::{block_comment, CodeWriter, Result};
use qlgen_schema::{FieldDef, InputValueDef, Schema, TypeDef, TypeKind, TypeRef, WrappingEncoder};
use qlgen_shape::{ScalarMap, ScalarResolver, TypeNames};
use serde::Deserialize;

const EXTENSIONS: &[&str] = &[".kt"];

/// Options of the `kotlin` plugin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KotlinConfig {
    /// Package of the output. Derived from the output path when unset.
    pub package: Option<String>,
    pub scalars: IndexMap<String, String>,
    /// Also emit data classes for object types.
    pub with_types: bool,
}

/// Emits Kotlin enum classes and data classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KotlinPlugin;

impl KotlinPlugin {
    pub const NAME: &'static str = "kotlin";
}

#[async_trait]
impl Plugin for KotlinPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<KotlinConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: KotlinConfig = parse_config(Self::NAME, input.config)?;
        let scalars = ScalarMap::kotlin()
            .with_overrides(config.scalars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let content = KotlinVisitor {
            schema: input.schema,
            scalars: &scalars,
            with_types: config.with_types,
        }
        .visit();
        let mut output = PluginOutput::new(content);
        if let Some(package) = config
            .package
            .or_else(|| package_from_path(input.output_file))
        {
            output = output.with_prepend(format!("package {package}\n"));
        }
        Ok(output)
    }
}

struct KotlinTypes;

impl WrappingEncoder for KotlinTypes {
    fn list(&self, item: String) -> String {
        format!("Iterable<{item}>")
    }

    fn nullable(&self, ty: String) -> String {
        format!("{ty}?")
    }
}

struct KotlinVisitor<'a> {
    schema: &'a Schema,
    scalars: &'a ScalarMap,
    with_types: bool,
}

impl KotlinVisitor<'_> {
    fn visit(&self) -> String {
        let mut blocks = Vec::new();
        for ty in declared_types(self.schema) {
            match ty.kind {
                TypeKind::Enum => blocks.push(Self::enumeration(ty)),
                TypeKind::InputObject => {
                    let fields: Vec<&InputValueDef> = ty.input_fields.values().collect();
                    blocks.push(self.input_class(ty.description.as_deref(), &ty.name, &fields));
                }
                TypeKind::Object | TypeKind::Interface => {
                    for field in ty.fields.values().filter(|f| !f.arguments.is_empty()) {
                        let args: Vec<&InputValueDef> = field.arguments.iter().collect();
                        let name = args_type_name(&TypeNames::default(), &ty.name, &field.name);
                        blocks.push(self.input_class(None, &name, &args));
                    }
                    if self.with_types && ty.kind == TypeKind::Object {
                        blocks.push(self.object_class(ty));
                    }
                }
                TypeKind::Scalar | TypeKind::Union => {}
            }
        }
        blocks.join("\n\n")
    }

    fn type_of(&self, ty: &TypeRef) -> String {
        let base = match self.schema.type_def(&ty.name).map(|def| def.kind) {
            Some(TypeKind::Scalar) | None => self.scalars.resolve_or_fallback(&ty.name).to_string(),
            Some(_) => ty.name.clone(),
        };
        ty.encode(base, &KotlinTypes)
    }

    fn enumeration(ty: &TypeDef) -> String {
        let name = &ty.name;
        let mut w = CodeWriter::new();
        if let Some(description) = ty.description.as_deref() {
            w.lines(&block_comment(description));
        }
        w.block(&format!("enum class {name}(val label: String) {{"), "}", |w| {
            let last = ty.enum_values.len().saturating_sub(1);
            for (i, value) in ty.enum_values.iter().enumerate() {
                let end = if i == last { ";" } else { "," };
                w.line(format!("{0}(\"{0}\"){end}", value.name));
            }
            w.blank();
            w.block("companion object {", "}", |w| {
                w.line("@JvmStatic");
                w.line(format!(
                    "fun valueOfLabel(label: String): {name}? = values().find {{ it.label == label }}"
                ));
            });
        });
        w.finish()
    }

    /// The expression reading `field` out of the `args` map.
    fn read_arg(&self, field: &InputValueDef) -> String {
        let key = &field.name;
        let ty = self.type_of(&field.ty);
        let item = &field.ty.name;
        let kind = self.schema.type_def(item).map(|def| def.kind);
        let nullable = field.ty.is_nullable();
        match (kind, field.ty.is_list()) {
            (Some(TypeKind::Enum), false) => {
                let fallback = format!("{item}.valueOfLabel(args[\"{key}\"] as String)");
                if nullable {
                    format!("args[\"{key}\"] as? {item} ?: (args[\"{key}\"] as String?)?.let {{ {item}.valueOfLabel(it) }}")
                } else {
                    format!("args[\"{key}\"] as? {item} ?: {fallback}!!")
                }
            }
            (Some(TypeKind::InputObject), false) => {
                let map = "Map<String, Any>";
                if nullable {
                    format!("(args[\"{key}\"] as {map}?)?.let {{ {item}(it) }}")
                } else {
                    format!("{item}(args[\"{key}\"] as {map})")
                }
            }
            _ => format!("args[\"{key}\"] as {ty}"),
        }
    }

    fn input_class(&self, description: Option<&str>, name: &str, fields: &[&InputValueDef]) -> String {
        let mut w = CodeWriter::new();
        if let Some(description) = description {
            w.lines(&block_comment(description));
        }
        w.line(format!("data class {name}("));
        w.indent();
        let last = fields.len().saturating_sub(1);
        for (i, field) in fields.iter().enumerate() {
            let ty = self.type_of(&field.ty);
            let default = if field.ty.is_nullable() { " = null" } else { "" };
            let end = if i == last { "" } else { "," };
            w.line(format!("val {}: {ty}{default}{end}", field.name));
        }
        w.dedent();
        w.block(") {", "}", |w| {
            w.line("@Suppress(\"UNCHECKED_CAST\")");
            w.line("constructor(args: Map<String, Any>) : this(");
            w.indent();
            for (i, field) in fields.iter().enumerate() {
                let end = if i == last { "" } else { "," };
                w.line(format!("{}{end}", self.read_arg(field)));
            }
            w.dedent();
            w.line(")");
        });
        w.finish()
    }

    fn object_class(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        if let Some(description) = ty.description.as_deref() {
            w.lines(&block_comment(description));
        }
        w.line(format!("data class {}(", ty.name));
        w.indent();
        let fields: Vec<&FieldDef> = ty.fields.values().collect();
        let last = fields.len().saturating_sub(1);
        for (i, field) in fields.iter().enumerate() {
            let ty = self.type_of(&field.ty);
            let default = if field.ty.is_nullable() { " = null" } else { "" };
            let end = if i == last { "" } else { "," };
            w.line(format!("val {}: {ty}{default}{end}", field.name));
        }
        w.dedent();
        w.line(")");
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::{TypeRef, Wrapping};
    use qlgen_schema::FragmentRegistry;
    use serde_json::{json, Value};

    const SDL: &str = "
type Query { users(filter: UserFilter, role: Role!): [User!]! }
type User { id: ID! name: String scores: [Float] }
input UserFilter { name: String role: Role nested: UserFilter }
enum Role { ADMIN MEMBER }
";

    async fn run(output_file: &str, config: Value) -> PluginOutput {
        let schema = Schema::parse(SDL).unwrap();
        let fragments = FragmentRegistry::default();
        let input = PluginInput {
            schema: &schema,
            documents: &[],
            fragments: &fragments,
            config: &config,
            output_file,
            all_plugins: &[],
        };
        KotlinPlugin.validate(&input).unwrap();
        KotlinPlugin
            .generate(&input, &mut PluginContext::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_package_from_output_path() {
        let output = run("src/main/kotlin/com/acme/Types.kt", Value::Null).await;
        assert_eq!(output.prepend, ["package com.acme\n"]);
    }

    #[tokio::test]
    async fn test_enum_class() {
        let output = run("Types.kt", Value::Null).await;
        assert!(output.content.contains(
            "enum class Role(val label: String) {\n  ADMIN(\"ADMIN\"),\n  MEMBER(\"MEMBER\");\n\n  \
             companion object {\n    @JvmStatic\n    \
             fun valueOfLabel(label: String): Role? = values().find { it.label == label }\n  }\n}"
        ));
    }

    #[tokio::test]
    async fn test_args_and_input_classes() {
        let content = run("Types.kt", Value::Null).await.content;
        assert!(content.starts_with(
            "data class QueryUsersArgs(\n  val filter: UserFilter? = null,\n  val role: Role\n) {\n"
        ));
        assert!(content.contains(
            "    (args[\"filter\"] as Map<String, Any>?)?.let { UserFilter(it) },\n    \
             args[\"role\"] as? Role ?: Role.valueOfLabel(args[\"role\"] as String)!!\n  )"
        ));
        assert!(content.contains("  val nested: UserFilter? = null\n"));
        assert!(!content.contains("data class User("));
    }

    #[tokio::test]
    async fn test_with_types() {
        let content = run("Types.kt", json!({ "withTypes": true, "package": "app" })).await.content;
        assert!(content.contains(
            "data class User(\n  val id: Any,\n  val name: String? = null,\n  val scores: Iterable<Float?>? = null\n)"
        ));
    }

    fn wrapping_matrix() -> [TypeRef; 4] {
        [
            TypeRef::new("T", Wrapping::nullable().wrap_list(false)),
            TypeRef::new("T", Wrapping::nullable().wrap_list(true)),
            TypeRef::new("T", Wrapping::required().wrap_list(false)),
            TypeRef::new("T", Wrapping::required().wrap_list(true)),
        ]
    }

    #[test]
    fn test_list_nullability_matrix() {
        let got: Vec<String> = wrapping_matrix()
            .iter()
            .map(|ty| ty.encode("String".into(), &KotlinTypes))
            .collect();
        assert_eq!(
            got,
            [
                "Iterable<String?>?",
                "Iterable<String?>",
                "Iterable<String>?",
                "Iterable<String>",
            ]
        );
    }
}
