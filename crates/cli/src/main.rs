//! Chatshop CLI - catalog inspection and scripted product edits.
//!
//! # Usage
//!
//! ```bash
//! # List products, optionally filtered by name or category
//! chatshop products list --query gorra
//!
//! # Show the category tree
//! chatshop categories list
//!
//! # Preview the calls an edit script would issue
//! chatshop products edit 42 --script edits.yaml --dry-run
//!
//! # Apply an edit script
//! chatshop products edit 42 --script edits.yaml
//! ```
//!
//! Configuration comes from the environment (and a `.env` file); see
//! `chatshop_admin::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use chatshop_admin::AdminConfig;
use chatshop_admin::config::LogFormat;
use chatshop_core::ProductId;
use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod error;

use error::CliError;

#[derive(Parser)]
#[command(name = "chatshop")]
#[command(author, version, about = "Chatshop catalog admin tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and edit products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Inspect categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List products with stock totals
    List {
        /// Case-insensitive match on product or category name
        #[arg(short, long)]
        query: Option<String>,
    },
    /// Apply an edit script to one product and save it
    Edit {
        /// Product id
        id: String,

        /// YAML file with the edit operations
        #[arg(short, long)]
        script: PathBuf,

        /// Print the planned calls without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Show main categories and their subcategories
    List,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &AdminConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "chatshop_admin=info,chatshop_cli=info".into());

    let json = format == LogFormat::Json;
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

#[tokio::main]
async fn main() {
    // Several rustls providers are linked in; pick one before any TLS use
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();

    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match AdminConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt::init();
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(2);
        }
    };

    let _sentry_guard = init_sentry(&config);
    init_tracing(config.log_format);

    if let Err(e) = run(cli, &config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &AdminConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Products { action } => match action {
            ProductAction::List { query } => {
                commands::products::list(config, query.as_deref()).await?;
            }
            ProductAction::Edit {
                id,
                script,
                dry_run,
            } => {
                commands::products::edit(config, &ProductId::new(id), &script, dry_run).await?;
            }
        },
        Commands::Categories { action } => match action {
            CategoryAction::List => commands::categories::list(config).await?,
        },
    }
    Ok(())
}
