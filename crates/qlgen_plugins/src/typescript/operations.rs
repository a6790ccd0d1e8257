use super::EXTENSIONS;
use crate::common::{render_operations, OperationsOptions};
use crate::config::{parse_config, require_extension, CommonConfig};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::Result;
use qlgen_shape::{NullableStyle, ScalarMap, ShapeEnv, TypeScript};
use serde::Deserialize;

/// Options of the `typescript-operations` plugin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeScriptOperationsConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Inline every field type instead of picking from the schema types.
    pub pre_resolve_types: bool,
    /// Nullable template used by pre-resolved types, `T` marks the type.
    pub maybe_value: Option<String>,
    pub dedupe_operation_suffix: bool,
}

/// Emits result and variables types for operations and fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptOperationsPlugin;

impl TypeScriptOperationsPlugin {
    pub const NAME: &'static str = "typescript-operations";
}

#[async_trait]
impl Plugin for TypeScriptOperationsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<TypeScriptOperationsConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: TypeScriptOperationsConfig = parse_config(Self::NAME, input.config)?;
        let nullable = match (&config.maybe_value, config.pre_resolve_types) {
            (_, false) => NullableStyle::Maybe,
            (Some(template), true) => NullableStyle::Template(template.clone()),
            (None, true) => NullableStyle::NullUnion,
        };
        let dialect = TypeScript::new(nullable).immutable(config.common.immutable_types);
        let scalars = config.common.scalars(ScalarMap::typescript());
        let names = config.common.names();
        let env = ShapeEnv {
            schema: input.schema,
            dialect: &dialect,
            scalars: &scalars,
            names: &names,
            options: config.common.shape_options(),
        };
        let options = OperationsOptions {
            pre_resolve: config.pre_resolve_types,
            dedupe_operation_suffix: config.dedupe_operation_suffix,
        };
        let content = render_operations(Self::NAME, input, env, options, ctx)?;
        Ok(PluginOutput::new(content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::{FragmentRegistry, Schema, Source};
    use serde_json::{json, Value};

    const SDL: &str = "
type Query { user(id: ID!): User users(role: Role, first: Int = 10): [User!]! }
type Mutation { rename(id: ID!, name: String!): User }
type User { id: ID! name: String role: Role! }
enum Role { ADMIN MEMBER }
";

    async fn run(document: &str, config: Value) -> String {
        let schema = Schema::parse(SDL).unwrap();
        let documents = vec![Source::parse("ops.graphql", document).unwrap()];
        let fragments = FragmentRegistry::build(&documents, &[]).unwrap();
        let input = PluginInput {
            schema: &schema,
            documents: &documents,
            fragments: &fragments,
            config: &config,
            output_file: "ops.ts",
            all_plugins: &[],
        };
        let mut ctx = PluginContext::new();
        TypeScriptOperationsPlugin
            .generate(&input, &mut ctx)
            .await
            .unwrap()
            .content
    }

    #[tokio::test]
    async fn test_query_with_variables() {
        let out = run(
            "query GetUser($id: ID!) { user(id: $id) { id name } }",
            json!({ "skipTypename": true }),
        )
        .await;
        assert_eq!(
            out,
            "export type GetUserQueryVariables = { id: Scalars['ID'] };\n\n\
             export type GetUserQuery = { user?: Maybe<Pick<User, 'id' | 'name'>> };"
        );
    }

    #[tokio::test]
    async fn test_pre_resolved_variables_and_result() {
        let out = run(
            "query Users($role: Role, $first: Int = 5) { users(role: $role, first: $first) { name role } }",
            json!({ "skipTypename": true, "preResolveTypes": true }),
        )
        .await;
        assert_eq!(
            out,
            "export type UsersQueryVariables = { role?: 'ADMIN' | 'MEMBER'; first?: number };\n\n\
             export type UsersQuery = { users: Array<{ name?: string; role: 'ADMIN' | 'MEMBER' }> };"
        );
    }

    #[tokio::test]
    async fn test_fragments_mutations_and_unnamed() {
        let out = run(
            "fragment UserBits on User { id }
             mutation { rename(id: \"1\", name: \"x\") { ...UserBits } }
             { user(id: \"1\") { id } }",
            json!({ "skipTypename": true }),
        )
        .await;
        let blocks: Vec<&str> = out.split("\n\n").collect();
        assert_eq!(blocks[0], "export type UserBitsFragment = Pick<User, 'id'>;");
        assert_eq!(blocks[1], "export type Unnamed_1_MutationVariables = {};");
        assert_eq!(
            blocks[2],
            "export type Unnamed_1_Mutation = { rename?: Maybe<Pick<User, 'id'>> };"
        );
        assert_eq!(blocks[3], "export type Unnamed_2_QueryVariables = {};");
    }

    #[tokio::test]
    async fn test_dedupe_operation_suffix() {
        let config = json!({ "dedupeOperationSuffix": true, "skipTypename": true });
        let out = run("query MeQuery { user(id: \"1\") { id } }", config).await;
        assert!(out.contains("export type MeQuery = "));
        assert!(out.contains("export type MeQueryVariables = {};"));
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
            output_file: "ops.graphql",
            all_plugins: &[],
        };
        assert!(matches!(
            TypeScriptOperationsPlugin.validate(&input),
            Err(qlgen_core::Error::OutputExtension { .. })
        ));
    }
}
