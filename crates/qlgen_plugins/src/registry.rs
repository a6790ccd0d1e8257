//! Plugin lookup by name.

use crate::plugin::Plugin;
use indexmap::IndexMap;
use qlgen_core::{Error, Result};
use std::sync::Arc;

/// Plugins available to the executor, keyed by name.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    plugins: IndexMap<String, Arc<dyn Plugin>>,
}

impl PluginRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in plugin.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::typescript::TypeScriptPlugin));
        registry.register(Arc::new(crate::typescript::TypeScriptOperationsPlugin));
        registry.register(Arc::new(crate::typescript::TypeScriptDocumentsPlugin));
        registry.register(Arc::new(crate::flow::FlowPlugin));
        registry.register(Arc::new(crate::flow::FlowOperationsPlugin));
        registry.register(Arc::new(crate::java::JavaPlugin));
        registry.register(Arc::new(crate::csharp::CSharpPlugin));
        registry.register(Arc::new(crate::kotlin::KotlinPlugin));
        registry.register(Arc::new(crate::introspection::IntrospectionPlugin));
        registry.register(Arc::new(crate::schema_ast::SchemaAstPlugin));
        registry.register(Arc::new(crate::fragment_matcher::FragmentMatcherPlugin));
        registry.register(Arc::new(crate::time::TimePlugin::default()));
        registry.register(Arc::new(crate::add::AddPlugin));
        registry
    }

    /// Registers a plugin, replacing any plugin with the same name.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> Option<Arc<dyn Plugin>> {
        let name = plugin.name().to_string();
        tracing::debug!(plugin = %name, "registered plugin");
        self.plugins.insert(name, plugin)
    }

    /// Looks up a plugin, failing with [`Error::InvalidPlugin`].
    pub fn get(&self, name: &str) -> Result<Arc<dyn Plugin>> {
        self.plugins
            .get(name)
            .cloned()
            .ok_or_else(|| Error::InvalidPlugin {
                name: name.to_string(),
                known: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.plugins.contains_key(name)
    }

    /// Registered names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
