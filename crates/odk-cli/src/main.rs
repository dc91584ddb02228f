//! Operator CLI: schema migration and deployment checks.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(name = "odk")]
#[command(about = "OrderDesk CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Validate a config file and print its canonical hash
    ConfigHash {
        /// Path to the YAML config file
        path: String,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    /// Connectivity + schema presence check.
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Dev convenience; production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => db_status().await,
            DbCmd::Migrate => db_migrate().await,
        },
        Commands::ConfigHash { path } => config_hash(&path),
    }
}

async fn db_status() -> Result<()> {
    let pool = odk_db::connect_from_env(2).await?;
    let st = odk_db::status(&pool).await?;
    println!("connectivity: {}", if st.ok { "ok" } else { "FAILED" });
    println!(
        "schema: {}",
        if st.has_orders_table { "present" } else { "missing (run `odk-cli db migrate`)" }
    );
    Ok(())
}

async fn db_migrate() -> Result<()> {
    let pool = odk_db::connect_from_env(2).await?;
    odk_db::migrate(&pool).await?;
    let st = odk_db::status(&pool).await?;
    anyhow::ensure!(st.has_orders_table, "migration ran but schema still missing");
    println!("migrations applied");
    Ok(())
}

fn config_hash(path: &str) -> Result<()> {
    let cfg = odk_config::load_from_path(Path::new(path))
        .with_context(|| format!("load {path}"))?;
    let effective = odk_config::effective_json(&cfg)?;
    println!("{}", serde_json::to_string_pretty(&effective)?);
    println!("config_hash: {}", odk_config::config_hash(&effective));
    Ok(())
}
