//! Quarry CLI - Compile semantic models to SQL
//!
//! Usage:
//!   quarry compile <model> [--base <entity>] [--dialect <dialect>] [--output sql|verbose|json]
//!   quarry metric <model> <name> [--primary <entity>]
//!   quarry ask <model> "<question>"
//!   quarry validate <model>
//!   quarry list <model>
//!   quarry init <catalog.json> --name <model> --source <src>... [--out <file>]
//!   quarry template <model> <template> [--catalog <catalog.json>] [--map Entity=source]... [--replace]
//!
//! Examples:
//!   quarry compile models/sales.json --dialect tsql
//!   quarry metric sales Profit --output verbose
//!   quarry ask sales "total revenue by country last month"

use clap::{Parser, Subcommand, ValueEnum};
use quarry::compile::{answer_question, compile_metric, compile_model, CompileOptions};
use quarry::config::Settings;
use quarry::model::{InMemoryCatalog, MetricKind, Model, ModelDocument, TemplateMode};
use quarry::semantic::Warning;
use quarry::sql::Dialect;
use quarry::validation::validate;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Quarry - A semantic metric layer that compiles to multi-dialect SQL")]
#[command(version)]
struct Cli {
    /// SQL dialect to generate (overrides the config file)
    #[arg(short, long, global = true)]
    dialect: Option<DialectArg>,

    /// Output format
    #[arg(short, long, global = true, default_value = "sql")]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a whole model to one joined query
    Compile {
        /// Model file, or a model name in the configured store directory
        model: String,

        /// Entity at the root of the join tree
        #[arg(short, long)]
        base: Option<String>,
    },

    /// Compile a single metric
    Metric {
        model: String,

        /// Metric name
        name: String,

        /// Entity the metric is joined to
        #[arg(short, long)]
        primary: Option<String>,
    },

    /// Answer a natural-language question
    Ask { model: String, question: String },

    /// Check a model for broken references and cycles
    Validate { model: String },

    /// List entities, relationships and metrics
    List { model: String },

    /// Create a model from a schema catalog
    Init {
        /// Catalog JSON (`tables`/`columns` or `collections`/`fields`)
        catalog: PathBuf,

        /// Model name
        #[arg(short, long)]
        name: String,

        /// Sources to add as entities
        #[arg(short, long, required = true)]
        source: Vec<String>,

        /// Write to this `.json` / `.toml` file instead of stdout
        #[arg(long = "out")]
        out: Option<PathBuf>,
    },

    /// Apply another model as a template and print the result
    Template {
        /// Model to change
        model: String,

        /// Model whose entities, relationships and metrics are applied
        template: String,

        /// Catalog JSON that remapped sources are read from
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Remap a template entity onto a catalog source (`Entity=source`)
        #[arg(long = "map", value_parser = parse_mapping)]
        map: Vec<(String, String)>,

        /// Replace the model's contents instead of merging into them
        #[arg(long)]
        replace: bool,

        /// Write to this `.json` / `.toml` file instead of stdout
        #[arg(long = "out")]
        out: Option<PathBuf>,
    },
}

fn parse_mapping(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((entity, source)) if !entity.is_empty() && !source.is_empty() => {
            Ok((entity.to_string(), source.to_string()))
        }
        _ => Err(format!("expected Entity=source, got '{}'", arg)),
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Ansi,
    Postgres,
    Duckdb,
    Tsql,
}

impl From<DialectArg> for Dialect {
    fn from(arg: DialectArg) -> Self {
        match arg {
            DialectArg::Ansi => Dialect::Ansi,
            DialectArg::Postgres => Dialect::Postgres,
            DialectArg::Duckdb => Dialect::DuckDb,
            DialectArg::Tsql => Dialect::TSql,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with a header and warnings as comments
    Verbose,
    /// Output SQL and warnings as JSON
    Json,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("QUARRY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut options = settings.compile_options();
    if let Some(dialect) = cli.dialect {
        options = options.with_dialect(dialect.into());
    }

    let result = match cli.command {
        Commands::Compile { model, base } => {
            if let Some(base) = &base {
                options = options.with_base_entity(base);
            }
            load_model(&settings, &model).and_then(|m| cmd_compile(&m, &options, cli.output))
        }
        Commands::Metric {
            model,
            name,
            primary,
        } => {
            if let Some(primary) = &primary {
                options = options.with_primary_entity(primary);
            }
            load_model(&settings, &model)
                .and_then(|m| cmd_metric(&m, &name, &options, cli.output))
        }
        Commands::Ask { model, question } => load_model(&settings, &model)
            .and_then(|m| cmd_ask(&m, &question, &options, cli.output)),
        Commands::Validate { model } => load_model(&settings, &model).and_then(|m| cmd_validate(&m)),
        Commands::List { model } => load_model(&settings, &model).map(|m| cmd_list(&m)),
        Commands::Init {
            catalog,
            name,
            source,
            out,
        } => cmd_init(&catalog, &name, &source, out.as_deref()),
        Commands::Template {
            model,
            template,
            catalog,
            map,
            replace,
            out,
        } => {
            let mode = if replace {
                TemplateMode::Replace
            } else {
                TemplateMode::Merge
            };
            load_model(&settings, &model).and_then(|mut target| {
                let template = load_model(&settings, &template)?;
                let sources: HashMap<String, String> = map.into_iter().collect();
                cmd_template(&mut target, &template, catalog.as_deref(), &sources, mode)?;
                write_document(&target, out.as_deref())
            })
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

/// Resolve a model argument: a file path, or a name in the store directory.
fn resolve_model_path(settings: &Settings, arg: &str) -> Result<PathBuf, String> {
    let direct = PathBuf::from(arg);
    if direct.is_file() {
        return Ok(direct);
    }
    let directory = settings
        .store_directory()
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    if let Some(dir) = directory {
        for candidate in [
            dir.join(arg),
            dir.join(format!("{}.json", arg)),
            dir.join(format!("{}.toml", arg)),
        ] {
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(format!("Model '{}' not found", arg))
}

fn load_model(settings: &Settings, arg: &str) -> Result<Model, String> {
    let path = resolve_model_path(settings, arg)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| arg.to_string());
    ModelDocument::read(&path)
        .and_then(|doc| doc.into_model(&name))
        .map_err(|e| format!("Error reading model '{}': {}", path.display(), e))
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    sql: &'a str,
    dialect: Dialect,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_metrics: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    matched_dimensions: Option<&'a [String]>,
    warnings: &'a [Warning],
}

fn print_output(
    header: &str,
    sql: &str,
    dialect: Dialect,
    warnings: &[Warning],
    matched: Option<(&[String], &[String])>,
    output: OutputFormat,
) -> Result<(), String> {
    match output {
        OutputFormat::Sql => println!("{}", sql),
        OutputFormat::Verbose => {
            println!("-- Quarry Compiled SQL");
            println!("-- {}", header);
            println!("-- Dialect: {}", dialect);
            for warning in warnings {
                println!("-- warning: {}", warning);
            }
            println!();
            println!("{}", sql);
        }
        OutputFormat::Json => {
            let out = JsonOutput {
                sql,
                dialect,
                matched_metrics: matched.map(|(m, _)| m),
                matched_dimensions: matched.map(|(_, d)| d),
                warnings,
            };
            let text = serde_json::to_string_pretty(&out).map_err(|e| e.to_string())?;
            println!("{}", text);
        }
    }
    Ok(())
}

fn cmd_compile(model: &Model, options: &CompileOptions, output: OutputFormat) -> Result<(), String> {
    let compiled = compile_model(model, options).map_err(|e| format!("Compilation error: {}", e))?;
    print_output(
        &format!("Model: {}", model.name()),
        &compiled.sql,
        compiled.dialect,
        &compiled.warnings,
        None,
        output,
    )
}

fn cmd_metric(
    model: &Model,
    name: &str,
    options: &CompileOptions,
    output: OutputFormat,
) -> Result<(), String> {
    let compiled =
        compile_metric(model, name, options).map_err(|e| format!("Compilation error: {}", e))?;
    print_output(
        &format!("Metric: {}", name),
        &compiled.sql,
        compiled.dialect,
        &compiled.warnings,
        None,
        output,
    )
}

fn cmd_ask(
    model: &Model,
    question: &str,
    options: &CompileOptions,
    output: OutputFormat,
) -> Result<(), String> {
    let answer =
        answer_question(model, question, options).map_err(|e| format!("Compilation error: {}", e))?;
    print_output(
        &format!("Question: {}", question),
        &answer.sql,
        answer.dialect,
        &answer.warnings,
        Some((
            answer.matched_metrics.as_slice(),
            answer.matched_dimensions.as_slice(),
        )),
        output,
    )
}

fn cmd_validate(model: &Model) -> Result<(), String> {
    match validate(model) {
        Ok(()) => {
            println!("OK: {} is valid", model.name());
            Ok(())
        }
        Err(errors) => {
            let lines: Vec<String> = errors.iter().map(|e| format!("  {}", e)).collect();
            Err(format!("Validation errors:\n{}", lines.join("\n")))
        }
    }
}

fn cmd_list(model: &Model) {
    println!("Model: {}", model.name());
    if !model.description().is_empty() {
        println!("  {}", model.description());
    }
    println!();

    println!("Entities:");
    for (name, entity) in model.entities() {
        println!(
            "  - {} (source: \"{}\", {} fields)",
            name,
            entity.source,
            entity.fields.len()
        );
    }
    println!();

    if !model.relationships().is_empty() {
        println!("Relationships:");
        for (i, rel) in model.relationships().iter().enumerate() {
            println!(
                "  #{} {}.{} -> {}.{} ({})",
                i, rel.from_entity, rel.from_field, rel.to_entity, rel.to_field, rel.cardinality
            );
        }
        println!();
    }

    if model.metrics().is_empty() {
        println!("No metrics defined.");
        return;
    }
    println!("Metrics:");
    for (name, metric) in model.metrics() {
        let detail = match &metric.kind {
            MetricKind::Measure {
                entity,
                field,
                aggregation,
            } => format!("{}({}.{})", aggregation, entity, field),
            MetricKind::Dimension { entity, field } => format!("dimension {}.{}", entity, field),
            MetricKind::Calculated { expression } => expression.clone(),
        };
        let flag = if metric.orphaned { " [orphaned]" } else { "" };
        println!("  - {} = {}{}", name, detail, flag);
    }
}

fn cmd_init(catalog: &Path, name: &str, sources: &[String], out: Option<&Path>) -> Result<(), String> {
    let text = fs::read_to_string(catalog)
        .map_err(|e| format!("Error reading file '{}': {}", catalog.display(), e))?;
    let catalog = InMemoryCatalog::from_json(&text).map_err(|e| format!("Invalid catalog: {}", e))?;

    let mut model = Model::new(name);
    for source in sources {
        let entity = source.rsplit('.').next().unwrap_or(source);
        model
            .add_entity(&catalog, source, &inflector::cases::pascalcase::to_pascal_case(entity))
            .map_err(|e| format!("Error adding '{}': {}", source, e))?;
    }

    write_document(&model, out)
}

fn cmd_template(
    target: &mut Model,
    template: &Model,
    catalog: Option<&Path>,
    sources: &HashMap<String, String>,
    mode: TemplateMode,
) -> Result<(), String> {
    let catalog = match catalog {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("Error reading file '{}': {}", path.display(), e))?;
            InMemoryCatalog::from_json(&text).map_err(|e| format!("Invalid catalog: {}", e))?
        }
        None if sources.is_empty() => InMemoryCatalog::new(),
        None => return Err("--map needs --catalog to read remapped sources from".into()),
    };

    let report = target
        .apply_template(template, &catalog, sources, mode)
        .map_err(|e| format!("Error applying template '{}': {}", template.name(), e))?;
    eprintln!(
        "Added {} entities, {} relationships, {} metrics",
        report.entities_added.len(),
        report.relationships_added,
        report.metrics_added.len()
    );
    if !report.entities_skipped.is_empty() {
        eprintln!("Kept existing entities: {}", report.entities_skipped.join(", "));
    }
    if !report.metrics_skipped.is_empty() {
        eprintln!("Skipped metrics: {}", report.metrics_skipped.join(", "));
    }
    Ok(())
}

fn write_document(model: &Model, out: Option<&Path>) -> Result<(), String> {
    let doc = ModelDocument::from_model(model, true);
    match out {
        Some(path) => {
            doc.write(path)
                .map_err(|e| format!("Error writing '{}': {}", path.display(), e))?;
            println!("Wrote {}", path.display());
        }
        None => println!("{}", doc.to_json().map_err(|e| e.to_string())?),
    }
    Ok(())
}
