//! Pieces shared by the TypeScript and Flow plugins.

use crate::plugin::{PluginContext, PluginInput};
use qlgen_core::Result;
use qlgen_schema::{OperationKind, Schema, TypeDef, TypeKind, TypeRef, VariableDefinition};
use qlgen_shape::{
    Dialect, NameConverter, ObjectField, PickProcessor, PreResolvedProcessor,
    SelectionSetProcessor, ShapeEnv, ShapeResolver,
};
use rustc_hash::FxHashSet;

/// Context key under which schema-type plugins list the types they emitted.
pub const SCHEMA_TYPES_KEY: &str = "schemaTypes";

/// Types a schema plugin declares: everything except the built-in scalars
/// and introspection types.
pub fn declared_types(schema: &Schema) -> impl Iterator<Item = &TypeDef> {
    schema
        .types()
        .filter(|ty| !ty.builtin && !ty.name.starts_with("__"))
}

/// Upper-cases the first character.
#[must_use]
pub fn upper_first(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The name of the arguments type of `type_name.field`.
#[must_use]
pub fn args_type_name(names: &dyn NameConverter, type_name: &str, field: &str) -> String {
    names.convert(&format!("{type_name}{}Args", upper_first(field)))
}

/// A reference to a schema type as the schema plugins declare it: scalars
/// through the `Scalars` map, everything else by converted name.
#[must_use]
pub fn schema_type_ref(
    schema: &Schema,
    dialect: &dyn Dialect,
    names: &dyn NameConverter,
    ty: &TypeRef,
) -> String {
    let is_scalar = schema
        .type_def(&ty.name)
        .is_some_and(|def| def.kind == TypeKind::Scalar);
    let base = if is_scalar {
        dialect.property_type("Scalars", &ty.name)
    } else {
        names.convert(&ty.name)
    };
    ty.encode(base, dialect)
}

/// Stores the names of the declared schema types in the context.
pub fn record_schema_types(ctx: &mut PluginContext, schema: &Schema) {
    let names: Vec<&str> = declared_types(schema).map(|ty| ty.name.as_str()).collect();
    ctx.insert(SCHEMA_TYPES_KEY, serde_json::json!(names));
}

/// Derives a JVM package from an output path: the directory below
/// `src/main/java/` or `src/main/kotlin/` (or the whole directory when
/// neither is present) with separators turned into dots.
#[must_use]
pub fn package_from_path(output_file: &str) -> Option<String> {
    let normalized = output_file.replace('\\', "/");
    let dir = normalized.rsplit_once('/').map_or("", |(dir, _)| dir);
    let dir = ["src/main/java", "src/main/kotlin"]
        .iter()
        .find_map(|root| dir.split_once(root).map(|(_, rest)| rest))
        .unwrap_or(dir);
    let package = dir
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join(".");
    (!package.is_empty()).then_some(package)
}

/// Options of the operations plugins.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperationsOptions {
    pub pre_resolve: bool,
    /// Do not append `Query` to an operation already named `...Query`.
    pub dedupe_operation_suffix: bool,
}

/// Declares `<Name><Kind>Variables` and `<Name><Kind>` for every operation
/// and `<Name>Fragment` for every fragment of the input documents.
pub fn render_operations(
    plugin: &str,
    input: &PluginInput<'_>,
    env: ShapeEnv<'_>,
    options: OperationsOptions,
    ctx: &PluginContext,
) -> Result<String> {
    let processor: &dyn SelectionSetProcessor = if options.pre_resolve {
        &PreResolvedProcessor
    } else {
        &PickProcessor
    };
    let resolver = ShapeResolver::new(env, input.fragments, processor);
    let mut declarations = Vec::new();
    let mut unnamed = 0;

    for source in input.documents {
        for fragment in source.fragments() {
            let condition = qlgen_schema::type_condition(fragment);
            let shape = resolver.resolve(condition, &fragment.selection_set)?;
            let name = env.names.convert(&format!("{}Fragment", fragment.name));
            declarations.push(format!("export type {name} = {shape};"));
        }

        for operation in source.operations() {
            let suffix = operation.kind.type_suffix();
            let base = match operation.name {
                Some(name) if options.dedupe_operation_suffix && name.ends_with(suffix) => {
                    name.to_string()
                }
                Some(name) => format!("{name}{suffix}"),
                None => {
                    unnamed += 1;
                    format!("Unnamed_{unnamed}_{suffix}")
                }
            };
            let root = root_type(input.schema, operation.kind)?;

            let variables = render_variables(&env, options, operation.variables)?;
            let variables_name = env.names.convert(&format!("{base}Variables"));
            declarations.push(format!("export type {variables_name} = {variables};"));

            let shape = resolver.resolve(root, operation.selection_set)?;
            declarations.push(format!(
                "export type {} = {shape};",
                env.names.convert(&base)
            ));
        }
    }

    if !options.pre_resolve {
        warn_missing_schema_types(plugin, ctx, &resolver.visited_types());
    }
    Ok(declarations.join("\n\n"))
}

fn root_type(schema: &Schema, kind: OperationKind) -> Result<&str> {
    schema
        .root_type_name(kind)
        .ok_or_else(|| qlgen_core::Error::UnknownType {
            name: kind.type_suffix().to_string(),
        })
}

fn render_variables(
    env: &ShapeEnv<'_>,
    options: OperationsOptions,
    variables: &[VariableDefinition],
) -> Result<String> {
    let mut fields = Vec::with_capacity(variables.len());
    for variable in variables {
        let ty = TypeRef::from_ast(&variable.var_type);
        env.schema.expect_type(&ty.name)?;
        let optional = variable.default_value.is_some() || env.is_optional(&ty);
        let rendered = if options.pre_resolve {
            let base = inline_input_type(env, &ty.name, &mut Vec::new());
            if env.is_optional(&ty) && env.dialect.optional_key_admits_null() {
                ty.wrapping.encode_inner(base, env.dialect)
            } else {
                ty.encode(base, env.dialect)
            }
        } else {
            schema_type_ref(env.schema, env.dialect, env.names, &ty)
        };
        fields.push(ObjectField::new(variable.name.as_str(), rendered, optional));
    }
    Ok(env.dialect.object(&fields))
}

/// The fully inlined type of an input value: scalars resolved, enums as
/// string-literal unions and input objects expanded. A recursive input
/// object is referenced by name where it re-enters.
fn inline_input_type(env: &ShapeEnv<'_>, name: &str, stack: &mut Vec<String>) -> String {
    let Some(def) = env.schema.type_def(name) else {
        return env.scalars.resolve_or_fallback(name).to_string();
    };
    match def.kind {
        TypeKind::Enum if !def.enum_values.is_empty() => def
            .enum_values
            .iter()
            .map(|v| env.dialect.string_literal(&v.name))
            .collect::<Vec<_>>()
            .join(" | "),
        TypeKind::InputObject if !stack.iter().any(|s| s == name) => {
            stack.push(name.to_string());
            let fields: Vec<ObjectField> = def
                .input_fields
                .values()
                .map(|field| {
                    let optional = env.is_optional(&field.ty);
                    let base = inline_input_type(env, &field.ty.name, stack);
                    let rendered = if optional && env.dialect.optional_key_admits_null() {
                        field.ty.wrapping.encode_inner(base, env.dialect)
                    } else {
                        field.ty.encode(base, env.dialect)
                    };
                    ObjectField::new(field.name.as_str(), rendered, optional)
                })
                .collect();
            stack.pop();
            env.dialect.object(&fields)
        }
        TypeKind::InputObject => env.names.convert(name),
        _ => env.scalars.resolve_or_fallback(name).to_string(),
    }
}

fn warn_missing_schema_types(plugin: &str, ctx: &PluginContext, referenced: &[String]) {
    if referenced.is_empty() {
        return;
    }
    let Some(emitted) = ctx.get_as::<Vec<String>>(SCHEMA_TYPES_KEY) else {
        tracing::warn!(
            plugin,
            "no earlier plugin of this output emitted schema types; \
             structural picks will reference undeclared types"
        );
        return;
    };
    let missing = missing_schema_types(&emitted, referenced);
    if !missing.is_empty() {
        tracing::warn!(plugin, missing = %missing.join(", "), "picked types were not emitted");
    }
}

/// The referenced types absent from `emitted`, sorted and deduplicated.
fn missing_schema_types<'r>(emitted: &[String], referenced: &'r [String]) -> Vec<&'r str> {
    let emitted: FxHashSet<&str> = emitted.iter().map(String::as_str).collect();
    let mut missing: Vec<&str> = referenced
        .iter()
        .map(String::as_str)
        .filter(|name| !emitted.contains(name))
        .collect();
    missing.sort_unstable();
    missing.dedup();
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_shape::{TypeNames, TypeScript};

    #[test]
    fn test_upper_first() {
        assert_eq!(upper_first("friends"), "Friends");
        assert_eq!(upper_first(""), "");
    }

    #[test]
    fn test_args_type_name() {
        let names = TypeNames::new("I", "");
        assert_eq!(args_type_name(&names, "User", "friends"), "IUserFriendsArgs");
    }

    #[test]
    fn test_schema_type_ref() {
        let schema = Schema::parse("type Query { a: [String!] b: Query! }").unwrap();
        let ts = TypeScript::default();
        let names = TypeNames::default();
        let query = schema.type_def("Query").unwrap();
        assert_eq!(
            schema_type_ref(&schema, &ts, &names, &query.fields["a"].ty),
            "Maybe<Array<Scalars['String']>>"
        );
        assert_eq!(
            schema_type_ref(&schema, &ts, &names, &query.fields["b"].ty),
            "Query"
        );
    }

    #[test]
    fn test_package_from_path() {
        assert_eq!(
            package_from_path("app/src/main/java/com/acme/types/Types.java").as_deref(),
            Some("com.acme.types")
        );
        assert_eq!(
            package_from_path("./generated/Types.kt").as_deref(),
            Some("generated")
        );
        assert_eq!(package_from_path("Types.java"), None);
    }

    #[test]
    fn test_declared_types_skip_builtins() {
        let schema = Schema::parse("type Query { a: String } scalar Date").unwrap();
        let names: Vec<&str> = declared_types(&schema).map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["Query", "Date"]);
    }

    #[test]
    fn test_missing_schema_types_cover_nested_picks() {
        let schema =
            Schema::parse("type Query { user: User } type User { id: ID! team: Team } type Team { id: ID! }")
                .unwrap();
        let documents = vec![qlgen_schema::Source::parse(
            "ops.graphql",
            "query GetUser { user { id team { id } } }",
        )
        .unwrap()];
        let fragments = qlgen_schema::FragmentRegistry::build(&documents, &[]).unwrap();
        let scalars = qlgen_shape::ScalarMap::typescript();
        let names = TypeNames::default();
        let dialect = TypeScript::default();
        let env = ShapeEnv {
            schema: &schema,
            dialect: &dialect,
            scalars: &scalars,
            names: &names,
            options: qlgen_shape::ShapeOptions::default(),
        };
        let resolver = ShapeResolver::new(env, &fragments, &PickProcessor);
        let operation = documents[0].operations().next().unwrap();
        resolver.resolve("Query", operation.selection_set).unwrap();

        let referenced = resolver.visited_types();
        let emitted = vec!["Query".to_string(), "User".to_string()];
        assert_eq!(missing_schema_types(&emitted, &referenced), ["Team"]);
        assert!(missing_schema_types(&referenced, &referenced).is_empty());
    }
}
