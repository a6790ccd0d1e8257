//! Plugin contract, execution adapter and built-in output plugins for qlgen.
//!
//! A [`Plugin`] turns a schema and documents into text for one output
//! file. [`generate`] runs the plugins configured for an [`OutputTarget`]
//! in order, sharing one [`PluginContext`], and merges their outputs.
//!
//! # Example
//!
//! ```ignore
//! let registry = PluginRegistry::with_builtins();
//! let target = OutputTarget {
//!     filename: "types.ts".into(),
//!     schema: sdl,
//!     plugins: vec![PluginEntry::new("typescript")],
//!     ..OutputTarget::default()
//! };
//! let content = generate(&registry, &target, &mut PluginContext::new()).await?;
//! ```

pub mod add;
pub mod common;
pub mod config;
pub mod csharp;
pub mod executor;
pub mod flow;
pub mod fragment_matcher;
pub mod introspection;
pub mod java;
pub mod kotlin;
pub mod plugin;
pub mod registry;
pub mod schema_ast;
pub mod time;
pub mod typescript;

pub use add::{AddConfig, AddPlugin, Placement};
pub use config::{merge_config, parse_config, require_extension, CommonConfig};
pub use csharp::{CSharpConfig, CSharpPlugin};
pub use executor::{generate, merge_outputs, validate_target, OutputTarget, PluginEntry};
pub use flow::{FlowConfig, FlowOperationsConfig, FlowOperationsPlugin, FlowPlugin};
pub use fragment_matcher::{FragmentMatcherConfig, FragmentMatcherPlugin, ModuleFormat};
pub use introspection::{introspect, IntrospectionConfig, IntrospectionPlugin};
pub use java::{JavaConfig, JavaPlugin};
pub use kotlin::{KotlinConfig, KotlinPlugin};
pub use plugin::{Plugin, PluginContext, PluginInput, PluginOutput};
pub use registry::PluginRegistry;
pub use schema_ast::{SchemaAstConfig, SchemaAstPlugin};
pub use time::{TimeConfig, TimePlugin};
pub use typescript::{
    DocumentMode, TypeScriptConfig, TypeScriptDocumentsConfig, TypeScriptDocumentsPlugin,
    TypeScriptOperationsConfig, TypeScriptOperationsPlugin, TypeScriptPlugin,
};
