//! Error taxonomy shared by every qlgen crate.

use miette::Diagnostic;
use thiserror::Error;

/// Result alias used throughout qlgen.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while loading inputs, resolving shapes or running plugins.
#[derive(Debug, Error, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    #[error("failed to parse schema: {message}")]
    #[diagnostic(code(qlgen::schema_parse))]
    SchemaParse { message: String },

    #[error("invalid schema: {message}")]
    #[diagnostic(code(qlgen::invalid_schema))]
    InvalidSchema { message: String },

    #[error("failed to parse document `{location}`: {message}")]
    #[diagnostic(code(qlgen::document_parse))]
    DocumentParse { location: String, message: String },

    #[error("unknown type `{name}`")]
    #[diagnostic(code(qlgen::unknown_type))]
    UnknownType { name: String },

    #[error("type `{type_name}` has no field `{field}`")]
    #[diagnostic(code(qlgen::unknown_field))]
    UnknownField { type_name: String, field: String },

    #[error("unknown fragment `{name}`")]
    #[diagnostic(
        code(qlgen::unknown_fragment),
        help("make sure the document defining the fragment is part of `documents`")
    )]
    UnknownFragment { name: String },

    #[error("fragment `{name}` is defined more than once")]
    #[diagnostic(code(qlgen::duplicate_fragment))]
    DuplicateFragment { name: String },

    #[error("cyclic fragment reference: {}", .path.join(" -> "))]
    #[diagnostic(
        code(qlgen::cyclic_fragment),
        help("a fragment may not spread itself, directly or through other fragments")
    )]
    CyclicFragment { path: Vec<String> },

    #[error("plugin `{name}` is not registered (known plugins: {known})")]
    #[diagnostic(
        code(qlgen::invalid_plugin),
        help(
            "a plugin must implement `qlgen_plugins::Plugin` and be registered before use, for example:\n\n    let mut registry = PluginRegistry::with_builtins();\n    registry.register(Arc::new(MyPlugin));"
        )
    )]
    InvalidPlugin { name: String, known: String },

    #[error("plugin `{plugin}` cannot write `{path}`: expected an output file ending with {expected}")]
    #[diagnostic(code(qlgen::output_extension))]
    OutputExtension {
        plugin: String,
        path: String,
        expected: String,
    },

    #[error("invalid configuration for `{plugin}`: {message}")]
    #[diagnostic(code(qlgen::malformed_config))]
    MalformedConfig { plugin: String, message: String },

    #[error("plugin `{plugin}` rejected the output target")]
    #[diagnostic(code(qlgen::plugin_validation))]
    PluginValidation {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    #[error("plugin `{plugin}` failed to generate output")]
    #[diagnostic(code(qlgen::plugin_generation))]
    PluginGeneration {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    #[error("{0}")]
    #[diagnostic(code(qlgen::custom))]
    Custom(String),
}

impl Error {
    /// Creates a free-form error, mostly used by custom plugins.
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }

    /// Creates a malformed configuration error for a plugin.
    pub fn malformed_config(plugin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedConfig {
            plugin: plugin.into(),
            message: message.into(),
        }
    }
}
