//! schema-codegen CLI
//!
//! Generates Kotlin, Java or Rust classes from a JSON Schema document or
//! from the definitions of a Swagger/OpenAPI document.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use schema_codegen::{
    load_document, load_document_auto, CodeGenerator, DirectoryOutput, GenerateOptions,
    TargetLanguage,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "schema-codegen")]
#[command(about = "Generate data classes from JSON Schema and OpenAPI definitions")]
#[command(version)]
struct Cli {
    /// Schema source: file path or URL (http:// or https://)
    source: String,

    /// Generate every member of this definitions container
    /// (e.g. /definitions or #/components/schemas)
    #[arg(long, short)]
    definitions: Option<String>,

    /// Only generate these definitions members (repeatable)
    #[arg(long, short, requires = "definitions")]
    include: Vec<String>,

    /// Target language: kotlin, java or rust
    #[arg(long, short, value_parser = parse_language)]
    language: Option<TargetLanguage>,

    /// Package or namespace of the generated classes
    #[arg(long, short)]
    package: Option<String>,

    /// Base output directory
    #[arg(long, short)]
    output: Option<String>,

    /// Class name for a root schema without a title
    #[arg(long, conflicts_with = "definitions")]
    name: Option<String>,

    /// Options file (JSON or YAML, camelCase keys); flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check each root schema against its meta-schema first
    #[arg(long)]
    validate: bool,

    /// Log progress to stderr (-vv for debug output)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_language(s: &str) -> Result<TargetLanguage, String> {
    TargetLanguage::parse(s)
        .ok_or_else(|| format!("unknown language '{}' (expected kotlin, java or rust)", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), u8> {
    let mut options = match &cli.config {
        Some(path) => load_options(path)?,
        None => GenerateOptions::default(),
    };
    if let Some(language) = cli.language {
        options.language = language;
    }
    if let Some(package) = cli.package {
        options.base_package = package;
    }
    if let Some(output) = cli.output {
        options.base_directory = output;
    }
    if cli.validate {
        options.validate_schema = true;
    }

    let document = load_document_auto(&cli.source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let generator = CodeGenerator::new(options);
    let mut output = DirectoryOutput;
    let result = match &cli.definitions {
        Some(container) => {
            let include = cli.include;
            generator.generate_all_filtered(
                &document,
                container,
                |name| include.is_empty() || include.iter().any(|i| i == name),
                &mut output,
            )
        }
        None => {
            let name = cli.name.unwrap_or_else(|| source_stem(&cli.source));
            generator.generate(&document, &name, &mut output)
        }
    };

    let files = result.map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    for file in files {
        println!("{}", file.path().display());
    }
    Ok(())
}

fn load_options(path: &Path) -> Result<GenerateOptions, u8> {
    let value = load_document(path).map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e.exit_code() as u8
    })?;
    serde_json::from_value(value).map_err(|e| {
        eprintln!("Error in config {}: {}", path.display(), e);
        2u8
    })
}

/// Root class name from the source file name: `person.schema.json` gives
/// `person`.
fn source_stem(source: &str) -> String {
    let file = source.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(source);
    file.split('.')
        .next()
        .filter(|stem| !stem.is_empty())
        .unwrap_or("Root")
        .to_string()
}
