//! The `add` plugin: literal text placed before, inside or after the output.

use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use qlgen_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Where the text goes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Placement {
    #[default]
    Prepend,
    Content,
    Append,
}

/// Options of the `add` plugin. A bare string config is the content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddConfig {
    pub content: Vec<String>,
    pub placement: Placement,
}

impl AddConfig {
    pub fn from_value(plugin: &str, config: &Value) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Content {
            One(String),
            Many(Vec<String>),
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Content(Content),
            Options {
                content: Content,
                #[serde(default)]
                placement: Placement,
            },
        }

        let raw: Raw = serde_json::from_value(config.clone()).map_err(|_| {
            Error::malformed_config(
                plugin,
                "expected a string, a list of strings or { content, placement }",
            )
        })?;
        let (content, placement) = match raw {
            Raw::Content(content) => (content, Placement::default()),
            Raw::Options { content, placement } => (content, placement),
        };
        let content = match content {
            Content::One(line) => vec![line],
            Content::Many(lines) => lines,
        };
        Ok(Self { content, placement })
    }
}

/// Adds configured text to the output.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddPlugin;

impl AddPlugin {
    pub const NAME: &'static str = "add";
}

#[async_trait]
impl Plugin for AddPlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        AddConfig::from_value(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config = AddConfig::from_value(Self::NAME, input.config)?;
        let output = match config.placement {
            Placement::Prepend => PluginOutput {
                prepend: config.content,
                ..PluginOutput::default()
            },
            Placement::Content => PluginOutput::new(config.content.join("\n")),
            Placement::Append => PluginOutput {
                append: config.content,
                ..PluginOutput::default()
            },
        };
        Ok(output)
    }
}
