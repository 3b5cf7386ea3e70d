//! entrypoint for the docx command line

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docx_analysis::{extract_routes, generate, ErrorFinder, GenerateOptions, Project, Route};
use docx_core::config::CliOverrides;
use docx_core::errors::{DocumentError, DocxErrorCode, GenerateError};
use docx_core::tracing::init_tracing;
use docx_core::DocxConfig;
use serde_json::Value as Json;

mod document;

/// Add the HTTP errors each FastAPI route can raise to its OpenAPI document.
#[derive(Debug, Parser)]
#[command(name = "docx")]
#[command(bin_name = "docx")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmds: CliCommands,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Root of the Python project (where `docx.toml` is looked up)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Application error base class, as `module.path:ClassName`
    #[arg(long, global = true)]
    custom_error: Option<String>,

    /// Model class documenting the custom error payload
    #[arg(long, global = true)]
    custom_error_schema: Option<String>,

    /// Model class replacing the generic HTTP error schema
    #[arg(long, global = true)]
    http_error_schema: Option<String>,

    /// Marker base class for injected dependency providers (repeatable)
    #[arg(long = "dependency-class", global = true)]
    dependency_classes: Vec<String>,

    /// Marker base class for service objects (repeatable)
    #[arg(long = "service-class", global = true)]
    service_classes: Vec<String>,
}

#[derive(Debug, Subcommand)]
enum CliCommands {
    /// Write the augmented interface document
    Generate {
        /// Framework-generated document to read (default: `openapi.json`)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Where to write the result (default: overwrite the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the document to stdout instead of writing it
        #[arg(long)]
        stdout: bool,
    },
    /// Print the route table as JSON
    Routes {
        /// Include routes registered with `include_in_schema=False`
        #[arg(long)]
        all: bool,
    },
    /// Print the errors discovered for every documented route as JSON
    Errors,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    #[allow(clippy::exit)]
    if let Err(err) = run(cli) {
        eprintln!("{}", err.coded_string());
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), GenerateError> {
    let mut overrides = CliOverrides {
        custom_error: cli.global.custom_error,
        custom_error_schema: cli.global.custom_error_schema,
        http_error_schema: cli.global.http_error_schema,
        dependency_classes: cli.global.dependency_classes,
        service_classes: cli.global.service_classes,
        ..CliOverrides::default()
    };
    if let CliCommands::Generate { input, output, .. } = &cli.cmds {
        overrides.openapi = input.clone();
        overrides.output = output.clone();
    }
    let config = DocxConfig::load(&cli.global.root, Some(&overrides))?;
    let root = config.project.effective_root(&cli.global.root);
    let project = Project::load(&root, &config.project.extra_ignore)?;
    let routes = extract_routes(&project);
    tracing::info!(root = %root.display(), routes = routes.len(), "project loaded");

    match cli.cmds {
        CliCommands::Generate { stdout, .. } => {
            let input = config.project.effective_openapi();
            let options = GenerateOptions::from_config(&config.errors)?;
            let original = document::read(&input)?;
            let report = generate(&original, &project, &routes, &options)?;
            if stdout {
                print_json(&report.document)?;
            } else {
                let output = config.project.effective_output();
                document::write(&output, &report.document)?;
                tracing::info!(
                    output = %output.display(),
                    documented = report.stats.routes,
                    hidden = report.stats.hidden,
                    responses = report.stats.responses,
                    "document written"
                );
            }
        }
        CliCommands::Routes { all } => {
            let shown: Vec<&Route> = routes
                .iter()
                .filter(|route| all || route.include_in_schema)
                .collect();
            print_json(&serde_json::to_value(shown).map_err(stdout_error)?)?;
        }
        CliCommands::Errors => {
            let options = GenerateOptions::from_config(&config.errors)?;
            let finder = ErrorFinder::new(&project, &options.discovery)?;
            let mut listing = Vec::new();
            for route in routes.iter().filter(|route| route.include_in_schema) {
                let errors = finder.extract_exceptions(route)?;
                listing.push(serde_json::json!({
                    "route": route,
                    "errors": errors,
                }));
            }
            print_json(&Json::Array(listing))?;
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
fn print_json(value: &Json) -> Result<(), GenerateError> {
    let rendered = serde_json::to_string_pretty(value).map_err(stdout_error)?;
    println!("{rendered}");
    Ok(())
}

fn stdout_error(err: serde_json::Error) -> DocumentError {
    DocumentError::Write {
        path: "<stdout>".to_string(),
        message: err.to_string(),
    }
}
