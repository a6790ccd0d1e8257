//! The `c-sharp` plugin.

use crate::common::declared_types;
use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use indexmap::IndexMap;
use qlgen_core::{CodeWriter, ImportSet, Result};
use qlgen_schema::{Deprecation, Schema, TypeDef, TypeKind, TypeRef, WrappingEncoder};
use qlgen_shape::{ScalarMap, ScalarResolver};
use serde::Deserialize;

const EXTENSIONS: &[&str] = &[".cs"];

/// Options of the `c-sharp` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CSharpConfig {
    pub namespace_name: String,
    pub class_name: String,
    pub scalars: IndexMap<String, String>,
}

impl Default for CSharpConfig {
    fn default() -> Self {
        Self {
            namespace_name: "GraphQLCodeGen".to_string(),
            class_name: "Types".to_string(),
            scalars: IndexMap::new(),
        }
    }
}

/// Emits a namespace with enums, interfaces, unions and classes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CSharpPlugin;

impl CSharpPlugin {
    pub const NAME: &'static str = "c-sharp";
}

#[async_trait]
impl Plugin for CSharpPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<CSharpConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: CSharpConfig = parse_config(Self::NAME, input.config)?;
        let scalars = ScalarMap::csharp()
            .with_overrides(config.scalars.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        let mut imports = ImportSet::new();
        imports.insert("using System;");
        imports.insert("using System.Collections.Generic;");
        imports.insert("using Newtonsoft.Json;");
        let content = CSharpVisitor {
            schema: input.schema,
            scalars: &scalars,
        }
        .visit(&config, &mut imports);
        Ok(PluginOutput::new(content).with_imports(imports))
    }
}

struct CSharpTypes;

impl WrappingEncoder for CSharpTypes {
    fn list(&self, item: String) -> String {
        format!("List<{item}>")
    }

    fn nullable(&self, ty: String) -> String {
        format!("{ty}?")
    }
}

/// One property of a class or interface.
struct Member<'t> {
    name: &'t str,
    description: Option<&'t str>,
    ty: &'t TypeRef,
    deprecation: Option<&'t Deprecation>,
}

struct CSharpVisitor<'a> {
    schema: &'a Schema,
    scalars: &'a ScalarMap,
}

impl CSharpVisitor<'_> {
    fn visit(&self, config: &CSharpConfig, imports: &mut ImportSet) -> String {
        let mut w = CodeWriter::new();
        w.block(&format!("namespace {} {{", config.namespace_name), "}", |w| {
            w.block(&format!("public class {} {{", config.class_name), "}", |w| {
                for ty in declared_types(self.schema) {
                    let body = match ty.kind {
                        TypeKind::Scalar => continue,
                        TypeKind::Enum => Self::enumeration(ty),
                        TypeKind::Union => Self::union(ty),
                        TypeKind::Interface => self.interface(ty),
                        TypeKind::Object | TypeKind::InputObject => self.class(ty, imports),
                    };
                    w.blank();
                    w.line(format!("#region {}", ty.name));
                    w.lines(&body);
                    w.line("#endregion");
                }
            });
        });
        w.finish()
    }

    fn type_of(&self, ty: &TypeRef) -> String {
        let base = match self.schema.type_def(&ty.name).map(|def| def.kind) {
            Some(TypeKind::Scalar) | None => self.scalars.resolve_or_fallback(&ty.name).to_string(),
            Some(_) => ty.name.clone(),
        };
        ty.encode(base, &CSharpTypes)
    }

    fn summary(w: &mut CodeWriter, description: Option<&str>) {
        if let Some(description) = description {
            w.line("/// <summary>");
            for line in description.trim().lines() {
                w.line(format!("/// {}", line.trim_end()));
            }
            w.line("/// </summary>");
        }
    }

    fn members(ty: &TypeDef) -> Vec<Member<'_>> {
        if ty.kind == TypeKind::InputObject {
            ty.input_fields
                .values()
                .map(|field| Member {
                    name: &field.name,
                    description: field.description.as_deref(),
                    ty: &field.ty,
                    deprecation: None,
                })
                .collect()
        } else {
            ty.fields
                .values()
                .map(|field| Member {
                    name: &field.name,
                    description: field.description.as_deref(),
                    ty: &field.ty,
                    deprecation: field.deprecation.as_ref(),
                })
                .collect()
        }
    }

    fn enumeration(ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::summary(&mut w, ty.description.as_deref());
        w.block(&format!("public enum {} {{", ty.name), "}", |w| {
            let last = ty.enum_values.len().saturating_sub(1);
            for (i, value) in ty.enum_values.iter().enumerate() {
                Self::summary(w, value.description.as_deref());
                let end = if i == last { "" } else { "," };
                w.line(format!("{}{end}", value.name));
            }
        });
        w.finish()
    }

    fn union(ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::summary(&mut w, ty.description.as_deref());
        w.block(&format!("public class {} {{", ty.name), "}", |w| {
            w.line("#region members");
            for member in &ty.members {
                w.line(format!("public {member} As{member} {{ get; set; }}"));
            }
            w.line("#endregion");
        });
        w.finish()
    }

    fn interface(&self, ty: &TypeDef) -> String {
        let mut w = CodeWriter::new();
        Self::summary(&mut w, ty.description.as_deref());
        w.block(&format!("public interface {} {{", ty.name), "}", |w| {
            for member in Self::members(ty) {
                Self::summary(w, member.description);
                w.line(format!("[JsonProperty(\"{}\")]", member.name));
                w.line(format!("{} {} {{ get; set; }}", self.type_of(member.ty), member.name));
            }
        });
        w.finish()
    }

    fn class(&self, ty: &TypeDef, imports: &mut ImportSet) -> String {
        let mut w = CodeWriter::new();
        Self::summary(&mut w, ty.description.as_deref());
        let mut head = format!("public class {}", ty.name);
        if !ty.interfaces.is_empty() {
            head.push_str(" : ");
            head.push_str(&ty.interfaces.join(", "));
        }
        w.block(&format!("{head} {{"), "}", |w| {
            w.line("#region members");
            for member in Self::members(ty) {
                Self::summary(w, member.description);
                if let Some(deprecation) = member.deprecation {
                    let reason = deprecation.reason.as_deref().unwrap_or("No longer supported");
                    w.line(format!("[Obsolete(\"{}\")]", reason.replace('"', "\\\"")));
                }
                w.line(format!("[JsonProperty(\"{}\")]", member.name));
                if !member.ty.is_nullable() {
                    imports.insert("using System.ComponentModel.DataAnnotations;");
                    w.line("[Required]");
                    w.line("[JsonRequired]");
                }
                w.line(format!(
                    "public {} {} {{ get; set; }}",
                    self.type_of(member.ty),
                    member.name
                ));
            }
            w.line("#endregion");
        });
        w.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::{TypeRef, Wrapping};
    use qlgen_schema::FragmentRegistry;
    use serde_json::{json, Value};

    const SDL: &str = r#"
interface Node { id: ID! }
"A person"
type User implements Node {
  id: ID!
  age: Int
  tags: [String!]
  old: String @deprecated(reason: "gone")
}
union Entry = User
enum Role { ADMIN MEMBER }
input UserFilter { role: Role! }
type Query { me: User }
"#;

    async fn run(config: Value) -> PluginOutput {
        let schema = Schema::parse(SDL).unwrap();
        let fragments = FragmentRegistry::default();
        let input = PluginInput {
            schema: &schema,
            documents: &[],
            fragments: &fragments,
            config: &config,
            output_file: "Types.cs",
            all_plugins: &[],
        };
        CSharpPlugin.validate(&input).unwrap();
        CSharpPlugin
            .generate(&input, &mut PluginContext::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_namespace_and_usings() {
        let output = run(json!({ "namespaceName": "Acme.Api" })).await;
        assert!(output.content.starts_with("namespace Acme.Api {\n  public class Types {\n"));
        assert_eq!(
            output.prepend,
            [
                "using System;",
                "using System.Collections.Generic;",
                "using Newtonsoft.Json;",
                "using System.ComponentModel.DataAnnotations;",
            ]
        );
    }

    #[tokio::test]
    async fn test_class_members() {
        let content = run(Value::Null).await.content;
        assert!(content.contains(
            "    #region User\n    /// <summary>\n    /// A person\n    /// </summary>\n    \
             public class User : Node {\n      #region members\n"
        ));
        assert!(content.contains(
            "      [JsonProperty(\"id\")]\n      [Required]\n      [JsonRequired]\n      \
             public string id { get; set; }\n"
        ));
        assert!(content.contains("      public int? age { get; set; }\n"));
        assert!(content.contains("      public List<string>? tags { get; set; }\n"));
        assert!(content.contains(
            "      [Obsolete(\"gone\")]\n      [JsonProperty(\"old\")]\n      public string? old { get; set; }\n"
        ));
    }

    #[tokio::test]
    async fn test_enums_interfaces_unions() {
        let content = run(Value::Null).await.content;
        assert!(content.contains("    public enum Role {\n      ADMIN,\n      MEMBER\n    }"));
        assert!(content.contains("    public interface Node {\n      [JsonProperty(\"id\")]\n      string id { get; set; }\n    }"));
        assert!(content.contains("      public User AsUser { get; set; }"));
        assert!(content.contains("      public Role role { get; set; }"));
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
            .map(|ty| ty.encode("string".into(), &CSharpTypes))
            .collect();
        assert_eq!(
            got,
            ["List<string?>?", "List<string?>", "List<string>?", "List<string>"]
        );
    }
}
