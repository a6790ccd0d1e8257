use super::{ast, EXTENSIONS};
use crate::config::{parse_config, require_extension};
use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::{Error, ImportSet, Result};
use qlgen_schema::{collect_spreads, FragmentRegistry, SelectionSet};
use serde::Deserialize;
use serde_json::Value;

/// How document constants are emitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DocumentMode {
    /// `gql` tagged templates interpolating fragment constants.
    #[default]
    GraphQLTag,
    /// Inlined graphql-js AST carrying every fragment it needs.
    DocumentNode,
    /// AST whose fragment definitions come from the fragment constants.
    DocumentNodeImportFragments,
    /// Plain document text with fragment text appended.
    String,
    /// Re-exports from another module.
    External,
}

/// Options of the `typescript-documents` plugin.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeScriptDocumentsConfig {
    pub document_mode: DocumentMode,
    /// Module re-exported from in `external` mode.
    pub import_document_node_externally_from: Option<String>,
    /// `module` or `module#export` providing `gql`.
    pub gql_import: Option<String>,
    pub document_variable_prefix: String,
    pub document_variable_suffix: String,
    pub fragment_variable_prefix: String,
    pub fragment_variable_suffix: String,
}

impl Default for TypeScriptDocumentsConfig {
    fn default() -> Self {
        Self {
            document_mode: DocumentMode::default(),
            import_document_node_externally_from: None,
            gql_import: None,
            document_variable_prefix: String::new(),
            document_variable_suffix: "Document".to_string(),
            fragment_variable_prefix: String::new(),
            fragment_variable_suffix: "FragmentDoc".to_string(),
        }
    }
}

impl TypeScriptDocumentsConfig {
    fn check(&self, plugin: &str) -> Result<()> {
        match (
            self.document_mode,
            &self.import_document_node_externally_from,
        ) {
            (DocumentMode::External, None) => Err(Error::malformed_config(
                plugin,
                "documentMode `external` requires importDocumentNodeExternallyFrom",
            )),
            (mode, Some(_)) if mode != DocumentMode::External => Err(Error::malformed_config(
                plugin,
                "importDocumentNodeExternallyFrom is only valid with documentMode `external`",
            )),
            _ => Ok(()),
        }
    }

    fn gql_import_line(&self) -> String {
        let source = self.gql_import.as_deref().unwrap_or("graphql-tag");
        match source.split_once('#') {
            Some((module, name)) => format!("import {{ {name} }} from '{module}';"),
            None => format!("import gql from '{source}';"),
        }
    }

    fn document_variable(&self, name: &str) -> String {
        format!(
            "{}{name}{}",
            self.document_variable_prefix, self.document_variable_suffix
        )
    }

    fn fragment_variable(&self, name: &str) -> String {
        format!(
            "{}{name}{}",
            self.fragment_variable_prefix, self.fragment_variable_suffix
        )
    }
}

/// Emits one constant per named operation and per fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeScriptDocumentsPlugin;

impl TypeScriptDocumentsPlugin {
    pub const NAME: &'static str = "typescript-documents";
}

#[async_trait]
impl Plugin for TypeScriptDocumentsPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        require_extension(Self::NAME, input.output_file, EXTENSIONS)?;
        parse_config::<TypeScriptDocumentsConfig>(Self::NAME, input.config)?.check(Self::NAME)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config: TypeScriptDocumentsConfig = parse_config(Self::NAME, input.config)?;
        config.check(Self::NAME)?;
        let mut imports = ImportSet::new();
        let content = DocumentsVisitor {
            config: &config,
            fragments: input.fragments,
        }
        .visit(input, &mut imports)?;
        Ok(PluginOutput::new(content).with_imports(imports))
    }
}

/// One definition about to become a constant.
struct Definition<'a> {
    variable: String,
    text: String,
    node: Value,
    selection_set: &'a SelectionSet,
}

struct DocumentsVisitor<'a> {
    config: &'a TypeScriptDocumentsConfig,
    fragments: &'a FragmentRegistry,
}

impl DocumentsVisitor<'_> {
    fn visit(&self, input: &PluginInput<'_>, imports: &mut ImportSet) -> Result<String> {
        let mut definitions = Vec::new();
        for source in input.documents {
            for fragment in source.fragments() {
                definitions.push(Definition {
                    variable: self.config.fragment_variable(&fragment.name),
                    text: fragment.to_string(),
                    node: ast::fragment(fragment),
                    selection_set: &fragment.selection_set,
                });
            }
        }
        for source in input.documents {
            for operation in source.operations() {
                // Only named operations can be referenced by a constant.
                let Some(name) = operation.name else {
                    continue;
                };
                definitions.push(Definition {
                    variable: self.config.document_variable(name),
                    text: operation.definition.to_string(),
                    node: ast::operation(&operation),
                    selection_set: operation.selection_set,
                });
            }
        }

        if self.config.document_mode == DocumentMode::External {
            if definitions.is_empty() {
                return Ok(String::new());
            }
            let from = self
                .config
                .import_document_node_externally_from
                .as_deref()
                .unwrap_or_default();
            let names: Vec<&str> = definitions.iter().map(|d| d.variable.as_str()).collect();
            return Ok(format!("export {{ {} }} from '{from}';", names.join(", ")));
        }

        match self.config.document_mode {
            DocumentMode::GraphQLTag => {
                imports.insert(self.config.gql_import_line());
            }
            DocumentMode::DocumentNode | DocumentMode::DocumentNodeImportFragments => {
                imports.insert("import { DocumentNode } from 'graphql';");
            }
            DocumentMode::String | DocumentMode::External => {}
        }

        let constants = definitions
            .iter()
            .map(|definition| self.constant(definition))
            .collect::<Result<Vec<_>>>()?;
        Ok(constants.join("\n\n"))
    }

    fn constant(&self, definition: &Definition<'_>) -> Result<String> {
        let name = &definition.variable;
        let text = definition.text.trim_end();
        let constant = match self.config.document_mode {
            DocumentMode::GraphQLTag => {
                let mut body = format!("\n    {text}");
                for dep in self.direct_dependencies(definition.selection_set)? {
                    body.push_str(&format!("\n    ${{{}}}", self.config.fragment_variable(dep)));
                }
                format!("export const {name} = gql`{body}`;")
            }
            DocumentMode::DocumentNode => {
                let mut nodes = vec![definition.node.clone()];
                for entry in self.fragments.dependencies(definition.selection_set)? {
                    nodes.push(ast::fragment(&entry.definition));
                }
                format!(
                    "export const {name} = {} as unknown as DocumentNode;",
                    ast::document(nodes)
                )
            }
            DocumentMode::DocumentNodeImportFragments => {
                let mut spreads = String::new();
                for dep in self.direct_dependencies(definition.selection_set)? {
                    spreads.push_str(&format!(
                        ",...{}.definitions",
                        self.config.fragment_variable(dep)
                    ));
                }
                format!(
                    "export const {name} = {{\"kind\":\"Document\",\"definitions\":[{}{spreads}]}} \
                     as unknown as DocumentNode;",
                    definition.node
                )
            }
            DocumentMode::String => {
                let mut texts = vec![text.to_string()];
                for entry in self.fragments.dependencies(definition.selection_set)? {
                    texts.push(entry.definition.to_string().trim_end().to_string());
                }
                format!("export const {name} = `{}`;", escape_template(&texts.join("\n")))
            }
            DocumentMode::External => String::new(),
        };
        Ok(constant)
    }

    /// Fragments spread directly in `set`, de-duplicated, each checked to
    /// exist.
    fn direct_dependencies<'s>(&self, set: &'s SelectionSet) -> Result<Vec<&'s str>> {
        let mut spreads = Vec::new();
        collect_spreads(set, &mut spreads);
        let mut unique: Vec<&str> = Vec::with_capacity(spreads.len());
        for spread in spreads {
            if !unique.contains(&spread) {
                self.fragments.expect(spread)?;
                unique.push(spread);
            }
        }
        Ok(unique)
    }
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('`', "\\`")
        .replace("${", "\\${")
}
