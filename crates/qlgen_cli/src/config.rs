//! The project file: where the schema and documents live and which files
//! to generate from them.

use indexmap::IndexMap;
use miette::Diagnostic;
use qlgen_plugins::{merge_config, OutputTarget, PluginEntry};
use qlgen_schema::Source;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Project file used when `--config` is not given.
pub const DEFAULT_CONFIG: &str = "codegen.json";

const DOCUMENT_EXTENSIONS: &[&str] = &["graphql", "gql"];

/// Failures while loading a project.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("cannot read `{}`", path.display())]
    #[diagnostic(code(qlgen::config::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot write `{}`", path.display())]
    #[diagnostic(code(qlgen::config::write))]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid project file `{}`", path.display())]
    #[diagnostic(
        code(qlgen::config::parse),
        help("a project file needs `schema` and `generates`, e.g. {{ \"schema\": \"schema.graphql\", \"generates\": {{ \"types.ts\": {{ \"plugins\": [\"typescript\"] }} }} }}")
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Codegen(#[from] qlgen_core::Error),
}

/// Contents of `codegen.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    /// Schema files, concatenated in order.
    #[serde(deserialize_with = "one_or_many")]
    pub schema: Vec<String>,
    /// Document files or directories searched for `.graphql`/`.gql` files.
    #[serde(default, deserialize_with = "one_or_many")]
    pub documents: Vec<String>,
    /// Config shared by every plugin of every output.
    #[serde(default)]
    pub config: Value,
    /// Output path to what generates it.
    pub generates: IndexMap<String, OutputConfig>,
}

/// One entry of `generates`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputConfig {
    pub plugins: Vec<PluginSpec>,
    /// Config shared by the plugins of this output.
    #[serde(default)]
    pub config: Value,
}

/// `"name"` or `{ "name": config }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawPluginSpec")]
pub struct PluginSpec {
    pub name: String,
    pub config: Value,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPluginSpec {
    Name(String),
    Configured(IndexMap<String, Value>),
}

impl TryFrom<RawPluginSpec> for PluginSpec {
    type Error = String;

    fn try_from(raw: RawPluginSpec) -> Result<Self, Self::Error> {
        match raw {
            RawPluginSpec::Name(name) => Ok(Self {
                name,
                config: Value::Null,
            }),
            RawPluginSpec::Configured(map) => {
                let count = map.len();
                let mut entries = map.into_iter();
                match (entries.next(), entries.next()) {
                    (Some((name, config)), None) => Ok(Self { name, config }),
                    _ => Err(format!(
                        "a plugin entry names exactly one plugin, found {count}"
                    )),
                }
            }
        }
    }
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// A loaded project file. Paths inside it are relative to its directory.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self { root, config })
    }

    /// All schema files joined into one SDL text.
    pub fn schema_sdl(&self) -> Result<String, ConfigError> {
        let parts = self
            .config
            .schema
            .iter()
            .map(|path| read(&self.root.join(path)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join("\n"))
    }

    /// Document files in configuration order; directories are searched
    /// recursively and their files sorted by path.
    pub fn document_files(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let mut files = Vec::new();
        for path in &self.config.documents {
            let path = self.root.join(path);
            if path.is_dir() {
                let mut found = Vec::new();
                collect_documents(&path, &mut found)?;
                found.sort();
                files.extend(found);
            } else {
                files.push(path);
            }
        }
        Ok(files)
    }

    /// Reads and parses every document, stopping at the first failure.
    pub fn parse_documents(&self) -> Result<Vec<Source>, ConfigError> {
        self.document_files()?
            .into_iter()
            .map(|path| -> Result<Source, ConfigError> {
                let text = read(&path)?;
                Ok(Source::parse(path.display().to_string(), &text)?)
            })
            .collect()
    }

    /// One target per `generates` entry, in file order.
    #[must_use]
    pub fn targets(&self, schema: &str, documents: &[Source]) -> Vec<OutputTarget> {
        self.config
            .generates
            .iter()
            .map(|(filename, output)| OutputTarget {
                filename: filename.clone(),
                schema: schema.to_string(),
                documents: documents.to_vec(),
                external_fragments: Vec::new(),
                plugins: output
                    .plugins
                    .iter()
                    .map(|spec| {
                        PluginEntry::new(spec.name.as_str()).with_config(spec.config.clone())
                    })
                    .collect(),
                config: merge_config(&self.config.config, &output.config),
            })
            .collect()
    }

    /// Where the output named `filename` is written.
    #[must_use]
    pub fn output_path(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

pub(crate) fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn collect_documents(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), ConfigError> {
    let io = |source| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io)? {
        let path = entry.map_err(io)?.path();
        if path.is_dir() {
            collect_documents(&path, out)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| DOCUMENT_EXTENSIONS.contains(&ext))
        {
            out.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<ProjectConfig, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn test_schema_and_plugin_forms() {
        let config = parse(json!({
            "schema": "schema.graphql",
            "documents": ["src/queries", "extra.gql"],
            "generates": {
                "types.ts": {
                    "plugins": ["typescript", { "add": "/* eslint-disable */" }],
                    "config": { "skipTypename": true }
                }
            }
        }))
        .unwrap();
        assert_eq!(config.schema, ["schema.graphql"]);
        assert_eq!(config.documents, ["src/queries", "extra.gql"]);
        let plugins = &config.generates["types.ts"].plugins;
        assert_eq!(plugins[0].name, "typescript");
        assert_eq!(plugins[0].config, Value::Null);
        assert_eq!(plugins[1].name, "add");
        assert_eq!(plugins[1].config, json!("/* eslint-disable */"));
    }

    #[test]
    fn test_plugin_entry_with_two_names() {
        let err = parse(json!({
            "schema": ["a.graphql"],
            "generates": { "t.ts": { "plugins": [{ "typescript": {}, "flow": {} }] } }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("a plugin entry names exactly one plugin, found 2"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(parse(json!({ "schema": "a.graphql", "generates": {}, "overwrite": true })).is_err());
    }

    #[test]
    fn test_targets_merge_config() {
        let project = Project {
            root: PathBuf::from("app"),
            config: parse(json!({
                "schema": "schema.graphql",
                "config": { "skipTypename": true, "typesPrefix": "I" },
                "generates": {
                    "b.ts": { "plugins": ["typescript"], "config": { "typesPrefix": "" } },
                    "a.graphql": { "plugins": ["schema-ast"] }
                }
            }))
            .unwrap(),
        };
        let targets = project.targets("type Query { ok: Boolean }", &[]);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].filename, "b.ts");
        assert_eq!(targets[0].config, json!({ "skipTypename": true, "typesPrefix": "" }));
        assert_eq!(targets[1].plugins, [PluginEntry::new("schema-ast")]);
        assert_eq!(project.output_path("b.ts"), Path::new("app/b.ts"));
    }

    #[test]
    fn test_missing_file() {
        let err = Project::load(Path::new("does/not/exist/codegen.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
