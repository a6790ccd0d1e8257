//! The `time` plugin: a generation timestamp comment.

use crate::plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
use async_trait::async_trait;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use qlgen_core::{Error, Result};
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Write as _;

const DEFAULT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";
const DEFAULT_MESSAGE: &str = "Generated on ";

/// Options of the `time` plugin. A bare string config is the format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeConfig {
    /// `strftime` format of the timestamp.
    pub format: String,
    /// Text written before the timestamp.
    pub message: String,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            message: DEFAULT_MESSAGE.to_string(),
        }
    }
}

impl TimeConfig {
    /// Reads `"<format>"` or `{ format, message }`.
    pub fn from_value(plugin: &str, config: &Value) -> Result<Self> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Format(String),
            Options {
                format: Option<String>,
                message: Option<String>,
            },
        }

        let defaults = Self::default();
        let config = match config {
            Value::Null => defaults,
            other => match serde_json::from_value::<Raw>(other.clone())
                .map_err(|e| Error::malformed_config(plugin, e.to_string()))?
            {
                Raw::Format(format) => Self { format, ..defaults },
                Raw::Options { format, message } => Self {
                    format: format.unwrap_or(defaults.format),
                    message: message.unwrap_or(defaults.message),
                },
            },
        };
        if StrftimeItems::new(&config.format).any(|item| matches!(item, Item::Error)) {
            return Err(Error::malformed_config(
                plugin,
                format!("invalid time format `{}`", config.format),
            ));
        }
        Ok(config)
    }
}

/// Writes `Generated on <timestamp>` as a comment in the output's syntax.
#[derive(Debug, Clone, Copy)]
pub struct TimePlugin {
    now: fn() -> DateTime<Utc>,
}

impl Default for TimePlugin {
    fn default() -> Self {
        Self { now: Utc::now }
    }
}

impl TimePlugin {
    pub const NAME: &'static str = "time";

    /// Uses `now` instead of the system clock.
    #[must_use]
    pub fn with_clock(now: fn() -> DateTime<Utc>) -> Self {
        Self { now }
    }
}

#[async_trait]
impl Plugin for TimePlugin {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn validate(&self, input: &PluginInput<'_>) -> Result<()> {
        TimeConfig::from_value(Self::NAME, input.config).map(drop)
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        _ctx: &mut PluginContext,
    ) -> Result<PluginOutput> {
        let config = TimeConfig::from_value(Self::NAME, input.config)?;
        let file = input.output_file;
        let comment = if [".graphql", ".gql", ".graphqls"]
            .iter()
            .any(|ext| file.ends_with(ext))
        {
            "#"
        } else {
            "//"
        };
        let mut line = format!("{comment} {}", config.message);
        write!(
            line,
            "{}",
            (self.now)().format_with_items(StrftimeItems::new(&config.format))
        )
        .map_err(|e| Error::custom(e.to_string()))?;
        Ok(PluginOutput::new(line))
    }
}
