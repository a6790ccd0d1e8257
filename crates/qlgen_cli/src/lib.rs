//! Command-line interface for qlgen.
//!
//! # Usage
//!
//! ```bash
//! # Generate every output listed in codegen.json
//! qlgen generate
//!
//! # Use another project file
//! qlgen generate --config api/codegen.json
//!
//! # Report schema, document and plugin errors without writing files
//! qlgen check
//!
//! # List the available plugins
//! qlgen plugins
//! ```

pub mod config;

use crate::config::{ConfigError, Project, DEFAULT_CONFIG};
use clap::{Parser, Subcommand};
use colored::Colorize;
use qlgen_core::{Diagnostic, DiagnosticBag, DiagnosticSeverity};
use qlgen_plugins::{validate_target, OutputTarget, PluginContext, PluginRegistry};
use qlgen_schema::{FragmentRegistry, Schema, Source};
use qlgen_shape::{
    PickProcessor, ScalarMap, ShapeEnv, ShapeOptions, ShapeResolver, TypeNames, TypeScript,
};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "qlgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate every output file of the project
    #[command(alias = "gen")]
    Generate {
        /// Project file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// Check the schema, documents and plugin setup without writing
    Check {
        /// Project file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },

    /// List the available plugins
    Plugins,

    /// Print version information
    Version,
}

/// Status printing that honors `--verbose` and `--quiet`.
#[derive(Debug, Clone, Copy)]
struct Printer {
    verbose: bool,
    quiet: bool,
}

impl Printer {
    fn status(self, line: impl std::fmt::Display) {
        if !self.quiet {
            println!("{line}");
        }
    }

    fn detail(self, line: impl std::fmt::Display) {
        if self.verbose && !self.quiet {
            println!("{line}");
        }
    }
}

pub async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let printer = Printer {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };
    match cli.command {
        Commands::Generate { config } => generate_project(&config, printer).await,
        Commands::Check { config } => check_project(&config, printer),
        Commands::Plugins => {
            let registry = PluginRegistry::with_builtins();
            println!("{}", "Available plugins:".bold());
            for name in registry.names() {
                println!("  {name}");
            }
            Ok(0)
        }
        Commands::Version => {
            println!("qlgen {}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
    }
}

/// Prints an error with its code, help and causes.
fn report(error: impl miette::Diagnostic + Send + Sync + 'static) {
    eprintln!("{:?}", miette::Report::new(error));
}

fn load_targets(config: &Path) -> Result<(Project, Vec<OutputTarget>), ConfigError> {
    let project = Project::load(config)?;
    let schema = project.schema_sdl()?;
    let documents = project.parse_documents()?;
    let targets = project.targets(&schema, &documents);
    Ok((project, targets))
}

fn write_output(path: &Path, content: &str) -> Result<(), ConfigError> {
    let io = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io)?;
    }
    std::fs::write(path, content).map_err(io)
}

async fn generate_project(
    config: &Path,
    printer: Printer,
) -> Result<i32, Box<dyn std::error::Error>> {
    let (project, targets) = match load_targets(config) {
        Ok(loaded) => loaded,
        Err(err) => {
            report(err);
            return Ok(1);
        }
    };

    let registry = PluginRegistry::with_builtins();
    let mut failed = 0;
    for target in &targets {
        printer.detail(format!("{} {}", "Generating".blue(), target.filename));
        let started = Instant::now();
        let mut ctx = PluginContext::new();
        match qlgen_plugins::generate(&registry, target, &mut ctx).await {
            Ok(mut content) => {
                content.push('\n');
                let path = project.output_path(&target.filename);
                match write_output(&path, &content) {
                    Ok(()) => {
                        tracing::debug!(output = %path.display(), elapsed = ?started.elapsed(), "wrote output");
                        printer.status(format!("{} {}", "Generated".green(), path.display()));
                    }
                    Err(err) => {
                        failed += 1;
                        eprintln!("{} {}", "Failed".red().bold(), target.filename);
                        report(err);
                    }
                }
            }
            Err(err) => {
                failed += 1;
                eprintln!("{} {}", "Failed".red().bold(), target.filename);
                report(err);
            }
        }
    }

    if failed > 0 {
        eprintln!(
            "{} {failed} of {} output(s) failed",
            "Error:".red().bold(),
            targets.len()
        );
        Ok(1)
    } else {
        Ok(0)
    }
}

fn check_project(config: &Path, printer: Printer) -> Result<i32, Box<dyn std::error::Error>> {
    let (bag, outputs) = match collect_diagnostics(config, printer) {
        Ok(collected) => collected,
        Err(err) => {
            report(err);
            return Ok(1);
        }
    };

    print_diagnostics(&bag);
    if bag.has_errors() {
        eprintln!(
            "{} {} error(s) found",
            "Error:".red().bold(),
            bag.error_count()
        );
        Ok(1)
    } else {
        printer.status(format!(
            "{} {outputs} output(s) checked",
            "Success:".green().bold()
        ));
        Ok(0)
    }
}

/// Parses everything the project names, resolves every operation against
/// the schema and validates each output. Later stages only run once the
/// earlier ones are clean, since every output would repeat the same errors.
fn collect_diagnostics(
    config: &Path,
    printer: Printer,
) -> Result<(DiagnosticBag, usize), ConfigError> {
    let project = Project::load(config)?;
    let mut bag = DiagnosticBag::new();

    let sdl = project.schema_sdl()?;
    printer.detail(format!("{} schema", "Checking".blue()));
    let schema = Schema::parse(&sdl)
        .map_err(|err| bag.report(&err, project.config.schema.join(", ")))
        .ok();

    let mut documents = Vec::new();
    for path in project.document_files()? {
        let location = path.display().to_string();
        printer.detail(format!("{} {location}", "Checking".blue()));
        let text = config::read(&path)?;
        match Source::parse(location.as_str(), &text) {
            Ok(source) => documents.push(source),
            Err(err) => bag.report(&err, location),
        }
    }
    let fragments = FragmentRegistry::build(&documents, &[])
        .map_err(|err| bag.report(&err, "documents"))
        .ok();
    let (Some(schema), Some(fragments)) = (schema, fragments) else {
        return Ok((bag, 0));
    };
    if bag.has_errors() {
        return Ok((bag, 0));
    }
    check_operations(&schema, &fragments, &documents, &mut bag);
    if bag.has_errors() {
        return Ok((bag, 0));
    }

    let registry = PluginRegistry::with_builtins();
    let targets = project.targets(&sdl, &documents);
    for target in &targets {
        printer.detail(format!("{} {}", "Checking".blue(), target.filename));
        for err in validate_target(&registry, target) {
            bag.report(&err, target.filename.as_str());
        }
    }
    Ok((bag, targets.len()))
}

/// Resolves the selections of every operation, reporting failures at the
/// operation's position. Anonymous operations only get a warning.
fn check_operations(
    schema: &Schema,
    fragments: &FragmentRegistry,
    documents: &[Source],
    bag: &mut DiagnosticBag,
) {
    let scalars = ScalarMap::typescript();
    let names = TypeNames::default();
    let dialect = TypeScript::default();
    let env = ShapeEnv {
        schema,
        dialect: &dialect,
        scalars: &scalars,
        names: &names,
        options: ShapeOptions::default(),
    };
    let resolver = ShapeResolver::new(env, fragments, &PickProcessor);

    for source in documents {
        for operation in source.operations() {
            let location = operation.location();
            let suffix = operation.kind.type_suffix();
            if operation.name.is_none() {
                bag.add(
                    Diagnostic::warning("qlgen::anonymous_operation", format!("anonymous {suffix}"))
                        .with_source(source.location.as_str())
                        .at(location)
                        .with_message(format!("its types are named `Unnamed_<n>_{suffix}`")),
                );
            }
            let resolved = match schema.root_type_name(operation.kind) {
                Some(root) => resolver.resolve(root, operation.selection_set).map(drop),
                None => Err(qlgen_core::Error::UnknownType {
                    name: suffix.to_string(),
                }),
            };
            if let Err(err) = resolved {
                bag.add(
                    Diagnostic::from_error(&err)
                        .with_source(source.location.as_str())
                        .at(location),
                );
            }
        }
    }
}

fn print_diagnostics(bag: &DiagnosticBag) {
    for diagnostic in bag.iter() {
        let label = match diagnostic.severity {
            DiagnosticSeverity::Error => "error".red().bold(),
            DiagnosticSeverity::Warning => "warning".yellow().bold(),
        };
        eprintln!("{label}[{}]: {}", diagnostic.code, diagnostic.title);
        if let Some(origin) = diagnostic.origin() {
            eprintln!("  {} {origin}", "-->".blue());
        }
        if let Some(message) = &diagnostic.message {
            eprintln!("  {} {message}", "=".blue());
        }
    }
}
