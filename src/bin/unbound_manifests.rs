//! UnboundUI manifest maintenance CLI
//!
//! Commands: update, validate, schema
//! Reports go to stdout (text, or JSON with --json); logs go to stderr.
//! `validate` exits non-zero when the registry must not be published.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use unbound_manifests::{
    schema, MaintenancePipeline, ManifestError, NormalizeOptions, RegistryLayout,
    UnknownFieldPolicy, Validator,
};

#[derive(Parser)]
#[command(name = "unbound-manifests")]
#[command(about = "Normalize and validate UnboundUI extension manifests", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Marketplace root holding `extensions/` and `api/`
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Override the extensions directory
    #[arg(long, global = true)]
    extensions_dir: Option<PathBuf>,

    /// Override the marketplace feed file
    #[arg(long, global = true)]
    feed: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upgrade every manifest and the marketplace feed to canonical form
    #[command(alias = "normalize")]
    Update {
        /// Report what would change without writing
        #[arg(long)]
        dry_run: bool,

        /// Keep non-canonical fields instead of dropping them
        #[arg(long)]
        preserve_unknown: bool,
    },

    /// Check every manifest against the schema (exit 1 on failure)
    Validate,

    /// Print the manifest schema
    Schema,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unbound_manifests=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let layout = RegistryLayout::from_root(&cli.root)
        .with_extensions_dir(cli.extensions_dir)
        .with_feed_path(cli.feed);

    match cli.command {
        Commands::Update { dry_run, preserve_unknown } => {
            let options = NormalizeOptions {
                unknown_fields: if preserve_unknown {
                    UnknownFieldPolicy::Preserve
                } else {
                    UnknownFieldPolicy::Drop
                },
                dry_run,
            };
            let pipeline = MaintenancePipeline::with_options(layout, options);
            match pipeline.update().and_then(|report| emit(&report, cli.json)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => fail(&e, cli.json),
            }
        }

        Commands::Validate => {
            let pipeline = MaintenancePipeline::new(layout);
            let passed = pipeline
                .validate()
                .and_then(|report| emit(&report, cli.json).map(|()| report.is_valid()));
            match passed {
                Ok(true) => ExitCode::SUCCESS,
                Ok(false) => ExitCode::FAILURE,
                Err(e) => fail(&e, cli.json),
            }
        }

        Commands::Schema => {
            let mut description = schema::describe();
            description["rules"] = Validator::new().rule_names().into();
            match serde_json::to_string_pretty(&description) {
                Ok(out) => {
                    println!("{}", out);
                    ExitCode::SUCCESS
                }
                Err(e) => fail(&e.into(), cli.json),
            }
        }
    }
}

fn emit<T: Serialize + Display>(report: &T, json: bool) -> Result<(), ManifestError> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{}", report);
    }
    Ok(())
}

fn fail(e: &ManifestError, json: bool) -> ExitCode {
    error!(error = %e, "run aborted");
    if json {
        println!("{}", serde_json::json!({ "error": e.to_string() }));
    }
    ExitCode::FAILURE
}
