//! The `java` plugin: enums, input and argument classes nested in one
//! holder class.

use crate::common::{args_type_name, declared_types, package_from_path, upper_first};
use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use indexmap::IndexMap;
use qlgen_core::{block_comment, CodeWriter, ImportSet, Result};
use qlgen_schema::{InputValueDef, Schema, TypeDef, TypeKind, TypeRef, WrappingEncoder};
use qlgen_shape::{ScalarMap, ScalarResolver, TypeNames};
use serde::Deserialize;
use serde_json::Value;

const EXTENSIONS: &[&str] = &[".java"];

/// Options of the `java` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JavaConfig {
    /// Package of the output. Derived from the output path when unset.
    pub package: Option<String>,
    /// Name of the class holding every generated type.
    pub class_name: String,
    pub scalars: IndexMap<String, String>,
}

impl Default for JavaConfig {
    fn default() -> Self {
        Self {
            package: None,
            class_name: "Types".to_string(),
            scalars: IndexMap::new(),
        }
    }
}

/// Emits Java enums and input classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaPlugin;

impl JavaPlugin {
    pub const NAME: &'static str = "java";
}

#[async_trait]
impl Plugin for JavaPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<JavaConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: JavaConfig = parse_config(Self::NAME, input.config)?;
        let package = config
            .package
            .clone()
            .or_else(|| package_from_path(input.output_file));
        let scalars = ScalarMap::java()
            .with_overrides(config.scalars.iter().map(|(k, v)| (k.as_str(), v.as_str())));

        let mut imports = ImportSet::new();
        imports.insert("import java.util.*;");
        let content = JavaVisitor {
            schema: input.schema,
            scalars: &scalars,
        }
        .visit(&config.class_name, &mut imports);

        let mut output = PluginOutput::new(content);
        if let Some(package) = package {
            output = output.with_prepend(format!("package {package};\n"));
        }
        Ok(output.with_imports(imports))
    }
}

/// Java's list and nullability encoding. `annotated` adds `@Nullable`,
/// which declarations carry but casts do not.
struct JavaTypes {
    annotated: bool,
}

impl WrappingEncoder for JavaTypes {
    fn list(&self, item: String) -> String {
        format!("Iterable<{item}>")
    }

    fn nullable(&self, ty: String) -> String {
        if self.annotated {
            format!("@Nullable {ty}")
        } else {
            ty
        }
    }
}

struct JavaVisitor<'a> {
    schema: &'a Schema,
    scalars: &'a ScalarMap,
}

impl JavaVisitor<'_> {
    fn visit(&self, class_name: &str, imports: &mut ImportSet) -> String {
        let mut w = CodeWriter::new();
        w.block(&format!("public class {class_name} {{"), "}", |w| {
            let mut first = true;
            for ty in declared_types(self.schema) {
                let blocks: Vec<String> = match ty.kind {
                    TypeKind::Enum => vec![Self::enumeration(ty)],
                    TypeKind::InputObject => {
                        let fields: Vec<&InputValueDef> = ty.input_fields.values().collect();
                        vec![self.input_class(
                            ty.description.as_deref(),
                            &ty.name,
                            &fields,
                            imports,
                        )]
                    }
                    TypeKind::Object | TypeKind::Interface => ty
                        .fields
                        .values()
                        .filter(|field| !field.arguments.is_empty())
                        .map(|field| {
                            let args: Vec<&InputValueDef> = field.arguments.iter().collect();
                            let name = args_type_name(&TypeNames::default(), &ty.name, &field.name);
                            self.input_class(None, &name, &args, imports)
                        })
                        .collect(),
                    TypeKind::Scalar | TypeKind::Union => Vec::new(),
                };
                for block in blocks {
                    if !first {
                        w.blank();
                    }
                    first = false;
                    w.lines(&block);
                }
            }
        });
        w.finish()
    }

    fn enumeration(ty: &TypeDef) -> String {
        let name = &ty.name;
        let mut w = CodeWriter::new();
        if let Some(description) = ty.description.as_deref() {
            w.lines(&block_comment(description));
        }
        w.block(&format!("public enum {name} {{"), "}", |w| {
            let last = ty.enum_values.len().saturating_sub(1);
            for (i, value) in ty.enum_values.iter().enumerate() {
                let end = if i == last { ";" } else { "," };
                w.line(format!("{0}(\"{0}\"){end}", value.name));
            }
            w.blank();
            w.line("public final String label;");
            w.blank();
            w.block(&format!("{name}(String label) {{"), "}", |w| {
                w.line("this.label = label;");
            });
            w.blank();
            w.line(format!(
                "private static final Map<String, {name}> BY_LABEL = new HashMap<>();"
            ));
            w.blank();
            w.block("static {", "}", |w| {
                w.block(&format!("for ({name} e : values()) {{"), "}", |w| {
                    w.line("BY_LABEL.put(e.label, e);");
                });
            });
            w.blank();
            w.block(
                &format!("public static {name} valueOfLabel(String label) {{"),
                "}",
                |w| {
                    w.line("return BY_LABEL.get(label);");
                },
            );
        });
        w.finish()
    }

    fn base_type(&self, name: &str) -> String {
        match self.schema.type_def(name).map(|def| def.kind) {
            Some(TypeKind::Scalar) | None => self.scalars.resolve_or_fallback(name).to_string(),
            Some(_) => name.to_string(),
        }
    }

    fn declared_type(&self, ty: &TypeRef, imports: &mut ImportSet) -> String {
        let declared = ty.encode(self.base_type(&ty.name), &JavaTypes { annotated: true });
        if declared.contains("@Nullable") {
            imports.insert("import javax.annotation.Nullable;");
        }
        declared
    }

    fn cast_type(&self, ty: &TypeRef) -> String {
        ty.encode(self.base_type(&ty.name), &JavaTypes { annotated: false })
    }

    /// The expression reading `field` out of the `args` map.
    fn read_arg(&self, field: &InputValueDef, imports: &mut ImportSet) -> String {
        let key = &field.name;
        let kind = self.schema.type_def(&field.ty.name).map(|def| def.kind);
        let item = &field.ty.name;
        match (kind, field.ty.is_list()) {
            (Some(TypeKind::InputObject), false) => {
                format!("new {item}((Map<String, Object>) args.get(\"{key}\"))")
            }
            (Some(TypeKind::Enum), false) => format!(
                "args.get(\"{key}\") instanceof {item} ? ({item}) args.get(\"{key}\") \
                 : {item}.valueOfLabel((String) args.get(\"{key}\"))"
            ),
            (Some(TypeKind::InputObject), true) if field.ty.wrapping.list_depth() == 1 => {
                imports.insert("import java.util.stream.Collectors;");
                imports.insert("import java.util.stream.StreamSupport;");
                format!(
                    "args.get(\"{key}\") == null ? null : StreamSupport.stream(\
                     ((Iterable<Map<String, Object>>) args.get(\"{key}\")).spliterator(), false)\
                     .map({item}::new).collect(Collectors.toList())"
                )
            }
            _ => format!("({}) args.get(\"{key}\")", self.cast_type(&field.ty)),
        }
    }

    fn input_class(
        &self,
        description: Option<&str>,
        name: &str,
        fields: &[&InputValueDef],
        imports: &mut ImportSet,
    ) -> String {
        let mut w = CodeWriter::new();
        if let Some(description) = description {
            w.lines(&block_comment(description));
        }
        w.block(&format!("public static class {name} {{"), "}", |w| {
            let declared: Vec<String> = fields
                .iter()
                .map(|field| self.declared_type(&field.ty, imports))
                .collect();
            for (field, ty) in fields.iter().zip(&declared) {
                if let Some(description) = field.description.as_deref() {
                    w.lines(&block_comment(description));
                }
                w.line(format!("private {ty} {};", field.name));
            }
            w.blank();
            w.line("@SuppressWarnings(\"unchecked\")");
            w.block(
                &format!("public {name}(Map<String, Object> args) {{"),
                "}",
                |w| {
                    w.block("if (args != null) {", "}", |w| {
                        for field in fields {
                            w.line(format!(
                                "this.{} = {};",
                                field.name,
                                self.read_arg(field, imports)
                            ));
                        }
                    });
                },
            );
            for (field, ty) in fields.iter().zip(&declared) {
                let accessor = upper_first(&field.name);
                w.blank();
                w.line(format!(
                    "public {ty} get{accessor}() {{ return this.{}; }}",
                    field.name
                ));
                w.line(format!(
                    "public void set{accessor}({ty} {0}) {{ this.{0} = {0}; }}",
                    field.name
                ));
            }
        });
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::{TypeRef, Wrapping};
    use qlgen_schema::FragmentRegistry;
    use serde_json::json;

    const SDL: &str = r#"
type Query { users(filter: UserFilter, ids: [ID!]!): [User] }
type User { id: ID! name: String }
"Filters users"
input UserFilter { name: String role: Role! nested: [UserFilter!] }
enum Role { ADMIN MEMBER }
"#;

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
        JavaPlugin.validate(&input).unwrap();
        JavaPlugin
            .generate(&input, &mut PluginContext::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_package_and_imports() {
        let output = run("src/main/java/com/acme/Types.java", Value::Null).await;
        assert_eq!(output.prepend[0], "package com.acme;\n");
        assert!(output.prepend.contains(&"import java.util.*;".to_string()));
        assert!(output.prepend.contains(&"import javax.annotation.Nullable;".to_string()));

        let output = run("Types.java", json!({ "package": "org.demo" })).await;
        assert_eq!(output.prepend[0], "package org.demo;\n");
    }

    #[tokio::test]
    async fn test_enum_with_labels() {
        let output = run("Types.java", json!({ "className": "Gql" })).await;
        assert!(output.content.starts_with("public class Gql {\n  public static class QueryUsersArgs {"));
        assert!(output.content.contains("\n\n  public enum Role {\n"));
        assert!(output.content.contains("    ADMIN(\"ADMIN\"),\n    MEMBER(\"MEMBER\");\n"));
        assert!(output
            .content
            .contains("    private static final Map<String, Role> BY_LABEL = new HashMap<>();"));
        assert!(output.content.contains("    public static Role valueOfLabel(String label) {"));
    }

    #[tokio::test]
    async fn test_input_and_args_classes() {
        let output = run("Types.java", Value::Null).await;
        let content = &output.content;
        assert!(content.contains("  /** Filters users */\n  public static class UserFilter {"));
        assert!(content.contains("    private @Nullable String name;"));
        assert!(content.contains("    private Role role;"));
        assert!(content.contains("    private @Nullable Iterable<UserFilter> nested;"));
        assert!(content.contains(
            "this.role = args.get(\"role\") instanceof Role ? (Role) args.get(\"role\") \
             : Role.valueOfLabel((String) args.get(\"role\"));"
        ));
        assert!(content.contains(".map(UserFilter::new).collect(Collectors.toList());"));
        assert!(content.contains("  public static class QueryUsersArgs {"));
        assert!(content.contains("    private Iterable<Object> ids;"));
        assert!(content.contains("this.ids = (Iterable<Object>) args.get(\"ids\");"));
        assert!(content.contains("    public @Nullable String getName() { return this.name; }"));
        assert!(content.contains("    public void setRole(Role role) { this.role = role; }"));
    }

    #[test]
    fn test_validate_extension() {
        let schema = Schema::parse(SDL).unwrap();
        let fragments = FragmentRegistry::default();
        let config = Value::Null;
        let input = PluginInput {
            schema: &schema,
            documents: &[],
            fragments: &fragments,
            config: &config,
            output_file: "Types.kt",
            all_plugins: &[],
        };
        assert!(JavaPlugin.validate(&input).is_err());
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
        let encode = |annotated: bool| -> Vec<String> {
            wrapping_matrix()
                .iter()
                .map(|ty| ty.encode("String".into(), &JavaTypes { annotated }))
                .collect()
        };
        assert_eq!(
            encode(true),
            [
                "@Nullable Iterable<@Nullable String>",
                "Iterable<@Nullable String>",
                "@Nullable Iterable<String>",
                "Iterable<String>",
            ]
        );
        assert!(encode(false).iter().all(|ty| ty == "Iterable<String>"));
    }
}
