use super::{FlowConfig, EXTENSIONS, FLOW_HEADER};
use crate::common::{render_operations, OperationsOptions};
use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::Result;
use qlgen_shape::{ScalarMap, ShapeEnv};
use serde::Deserialize;

/// Options of the `flow-operations` plugin.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowOperationsConfig {
    #[serde(flatten)]
    pub flow: FlowConfig,
    pub pre_resolve_types: bool,
    pub dedupe_operation_suffix: bool,
}

/// Emits Flow result and variables types for operations and fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlowOperationsPlugin;

impl FlowOperationsPlugin {
    pub const NAME: &'static str = "flow-operations";
}

#[async_trait]
impl Plugin for FlowOperationsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<FlowOperationsConfig>(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: FlowOperationsConfig = parse_config(Self::NAME, input.config)?;
        let common = &config.flow.common;
        let dialect = config.flow.dialect();
        let scalars = common.scalars(ScalarMap::flow());
        let names = common.names();
        let env = ShapeEnv {
            schema: input.schema,
            dialect: &dialect,
            scalars: &scalars,
            names: &names,
            options: common.shape_options(),
        };
        let options = OperationsOptions {
            pre_resolve: config.pre_resolve_types,
            dedupe_operation_suffix: config.dedupe_operation_suffix,
        };
        let content = render_operations(Self::NAME, input, env, options, ctx)?;
        Ok(PluginOutput::new(content).with_prepend(FLOW_HEADER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qlgen_schema::{FragmentRegistry, Schema, Source};
    use serde_json::{json, Value};

    const SDL: &str = "
type Query { user(id: ID!): User }
type User { id: ID! name: String role: Role! }
enum Role { ADMIN MEMBER }
";

    async fn run(document: &str, config: Value) -> PluginOutput {
        let schema = Schema::parse(SDL).unwrap();
        let documents = vec![Source::parse("ops.graphql", document).unwrap()];
        let fragments = FragmentRegistry::build(&documents, &[]).unwrap();
        let input = PluginInput {
            schema: &schema,
            documents: &documents,
            fragments: &fragments,
            config: &config,
            output_file: "ops.js",
            all_plugins: &[],
        };
        FlowOperationsPlugin
            .generate(&input, &mut PluginContext::new())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_pick_shapes() {
        let output = run(
            "query GetUser($id: ID!) { user(id: $id) { id name } }",
            json!({ "skipTypename": true }),
        )
        .await;
        assert_eq!(output.prepend, [FLOW_HEADER]);
        assert_eq!(
            output.content,
            "export type GetUserQueryVariables = {| id: $ElementType<Scalars, 'ID'> |};\n\n\
             export type GetUserQuery = {| user?: ?$Pick<User, {| id: *, name: * |}> |};"
        );
    }

    #[tokio::test]
    async fn test_pre_resolved_shapes() {
        let output = run(
            "query GetUser($id: ID!) { user(id: $id) { name role } }",
            json!({ "skipTypename": true, "preResolveTypes": true }),
        )
        .await;
        assert!(output.content.ends_with(
            "export type GetUserQuery = {| user?: ?{| name?: ?string, role: 'ADMIN' | 'MEMBER' |} |};"
        ));
    }
}
