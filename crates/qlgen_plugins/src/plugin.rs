//! The plugin contract.

use async_trait::async_trait;
use qlgen_core::{ImportSet, Result};
use qlgen_schema::{FragmentRegistry, Schema, Source};
use rustc_hash::FxHashMap;
use serde_json::Value;

/// Everything a plugin sees for one output target.
#[derive(Debug, Clone, Copy)]
pub struct PluginInput<'a> {
    pub schema: &'a Schema,
    pub documents: &'a [Source],
    pub fragments: &'a FragmentRegistry,
    /// Target config with this plugin's config merged over it.
    pub config: &'a Value,
    /// Path of the file being generated.
    pub output_file: &'a str,
    /// Names of every plugin configured for the target, in order.
    pub all_plugins: &'a [String],
}

/// Output of one plugin.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOutput {
    /// Import and header lines. De-duplicated across plugins of a target.
    pub prepend: Vec<String>,
    pub content: String,
    /// Lines written after every plugin's content.
    pub append: Vec<String>,
}

impl PluginOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Drains `imports` into `prepend`.
    #[must_use]
    pub fn with_imports(mut self, imports: ImportSet) -> Self {
        self.prepend.extend(imports.drain());
        self
    }

    #[must_use]
    pub fn with_prepend(mut self, line: impl Into<String>) -> Self {
        self.prepend.push(line.into());
        self
    }

    #[must_use]
    pub fn with_append(mut self, line: impl Into<String>) -> Self {
        self.append.push(line.into());
        self
    }
}

impl From<String> for PluginOutput {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl From<&str> for PluginOutput {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

/// Key/value state shared by the plugins of one output target.
///
/// Plugins run in configuration order, so a plugin only sees what earlier
/// plugins stored.
#[derive(Debug, Clone, Default)]
pub struct PluginContext {
    values: FxHashMap<String, Value>,
}

impl PluginContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Gets a value deserialized as `T`. Missing or mistyped values yield `None`.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// An output plugin.
///
/// The executor calls [`Plugin::add_to_schema`] while building the schema,
/// [`Plugin::validate`] for every plugin of a target before any generation,
/// and finally [`Plugin::generate`] in configuration order.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// The name used in project configs.
    fn name(&self) -> &str;

    /// SDL merged into the schema before it is built.
    fn add_to_schema(&self, _config: &Value) -> Option<String> {
        None
    }

    /// Checks the target before generation, e.g. the output extension.
    fn validate(&self, _input: &PluginInput<'_>) -> Result<()> {
        Ok(())
    }

    async fn generate(
        &self,
        input: &PluginInput<'_>,
        ctx: &mut PluginContext,
    ) -> Result<PluginOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_output_from_string() {
        let output: PluginOutput = "content".into();
        assert_eq!(output.content, "content");
        assert!(output.prepend.is_empty());
    }

    #[test]
    fn test_output_with_imports() {
        let mut imports = ImportSet::new();
        imports.insert("import a;");
        imports.insert("import a;");
        imports.insert("import b;");
        let output = PluginOutput::new("x").with_imports(imports);
        assert_eq!(output.prepend, vec!["import a;", "import b;"]);
    }

    #[test]
    fn test_context_roundtrip() {
        let mut ctx = PluginContext::new();
        ctx.insert("types", json!(["User", "Post"]));
        assert!(ctx.contains("types"));
        let types: Vec<String> = ctx.get_as("types").unwrap();
        assert_eq!(types, ["User", "Post"]);
        assert_eq!(ctx.get_as::<u32>("types"), None);
        assert!(ctx.remove("types").is_some());
        assert!(ctx.is_empty());
    }
}
