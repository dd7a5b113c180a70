//! MUNREG CLI
//!
//! Command-line interface for the MUNREG conference registration service.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use munreg_api::ApiConfig;
use munreg_core::constants::{COMMITTEES, DEFAULT_HOST, DEFAULT_PORT};
use munreg_core::export::registrations_to_csv;
use munreg_core::traits::RegistrationStore;
use munreg_core::types::RegistrationQuery;
use munreg_core::validation::ValidationPolicy;
use munreg_storage::FileStore;

/// MUNREG - Model UN conference registrations
#[derive(Parser)]
#[command(name = "munreg")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Bind address
        #[arg(short, long, env = "HOST", default_value = DEFAULT_HOST)]
        bind: String,
        /// Snapshot file (in-memory only when omitted)
        #[arg(short, long, env = "DATA_FILE")]
        data_file: Option<PathBuf>,
        /// Registration schema: lenient or strict
        #[arg(short, long, env = "MUNREG_SCHEMA")]
        schema: Option<String>,
    },

    /// Export registrations from a snapshot file as CSV
    Export {
        /// Snapshot file
        #[arg(short, long, env = "DATA_FILE")]
        data_file: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Free-text search; overrides the filters
        #[arg(long)]
        search: Option<String>,
        /// Experience level filter
        #[arg(long)]
        experience: Option<String>,
        /// Committee code filter
        #[arg(long)]
        committee: Option<String>,
    },

    /// Show dashboard counters for a snapshot file
    Stats {
        /// Snapshot file
        #[arg(short, long, env = "DATA_FILE")]
        data_file: PathBuf,
    },

    /// List the committee catalog
    Committees,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "munreg=debug,info"
    } else {
        "munreg=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Serve {
            port,
            bind,
            data_file,
            schema,
        } => cmd_serve(port, &bind, data_file, schema.as_deref()).await,
        Commands::Export {
            data_file,
            output,
            search,
            experience,
            committee,
        } => {
            let query = RegistrationQuery {
                search,
                experience,
                committee,
            };
            cmd_export(&data_file, output.as_deref(), &query).await
        }
        Commands::Stats { data_file } => cmd_stats(&data_file).await,
        Commands::Committees => cmd_committees(),
    }
}

async fn open_existing(path: &Path) -> Result<FileStore> {
    if !path.exists() {
        bail!("Data file {} does not exist", path.display());
    }
    FileStore::new(path)
        .await
        .with_context(|| format!("Failed to load data file {}", path.display()))
}

/// Run API server
async fn cmd_serve(
    port: u16,
    bind: &str,
    data_file: Option<PathBuf>,
    schema: Option<&str>,
) -> Result<()> {
    println!("{}", "🚀 Starting MUNREG API server...".cyan().bold());

    let mut config = ApiConfig::from_env();
    config.host = bind.to_string();
    config.port = port;
    if data_file.is_some() {
        config.data_file = data_file;
    }
    if let Some(schema) = schema {
        let policy: ValidationPolicy = schema.parse().context("Invalid --schema")?;
        config.policy = policy.with_default_school(config.policy.default_school.clone());
    }

    println!("   {} http://{}:{}", "Listening on:".green(), bind, port);
    println!("   {} http://{}:{}/health", "Health check:".dimmed(), bind, port);
    println!("   {} {}", "Schema:".dimmed(), config.policy.mode());
    match &config.data_file {
        Some(path) => println!("   {} {}", "Data file:".dimmed(), path.display()),
        None => println!("   {}", "In-memory store (data is lost on exit)".yellow()),
    }
    println!("\n   Press Ctrl+C to stop.\n");

    munreg_api::start_server(config)
        .await
        .context("API server failed")?;

    Ok(())
}

/// Export registrations as CSV
async fn cmd_export(data_file: &Path, output: Option<&Path>, query: &RegistrationQuery) -> Result<()> {
    let store = open_existing(data_file).await?;
    let registrations = query.execute(&store).await?;
    let csv = registrations_to_csv(&registrations);

    match output {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(rows = registrations.len(), path = %path.display(), "Export written");
            println!(
                "{} {} registration(s) to {}",
                "✅ Exported".green(),
                registrations.len(),
                path.display()
            );
        }
        None => print!("{}", csv),
    }

    Ok(())
}

/// Show counters
async fn cmd_stats(data_file: &Path) -> Result<()> {
    let store = open_existing(data_file).await?;
    let stats = store.stats().await?;

    println!("{}", "📊 Registration statistics".cyan().bold());
    println!("   {:<12} {}", "Total:".green(), stats.total);
    println!("   {:<12} {}", "Confirmed:".green(), stats.confirmed);
    println!("   {:<12} {}", "Pending:".yellow(), stats.pending);
    println!("   {:<12} {}", "Rejected:".red(), stats.rejected);
    println!("   {:<12} {}", "Committees:".dimmed(), stats.committees);

    Ok(())
}

/// Print the committee catalog
fn cmd_committees() -> Result<()> {
    println!("{}", "🏛  Committees".cyan().bold());
    for (code, label) in COMMITTEES {
        println!("   {:<8} {}", code.green(), label);
    }
    Ok(())
}
