//! SQLSage Control - CLI client for the SQLSage daemon.
//!
//! Asks questions, checks daemon health and provisions the demo database.

use anyhow::Result;
use chrono::Local;
use clap::{Parser, Subcommand};
use sqlsage_shared::SqlSageError;
use sqlsagectl::client::DEFAULT_URL;
use sqlsagectl::commands;
use sqlsagectl::seed::{SeedOptions, DEFAULT_DB_PATH};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sqlsagectl")]
#[command(about = "SQLSage - ask questions about your database in plain language", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a question
    Ask {
        /// The question, in plain language
        question: String,

        /// Daemon base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,

        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Create the demo office database, replacing any existing file
    Seed {
        #[arg(long, default_value = DEFAULT_DB_PATH)]
        db: PathBuf,

        /// Seed for the random data
        #[arg(long, default_value_t = 42)]
        rng_seed: u64,

        #[arg(long, default_value_t = 50)]
        employees: usize,

        #[arg(long, default_value_t = 200)]
        customers: usize,

        #[arg(long, default_value_t = 100)]
        products: usize,

        #[arg(long, default_value_t = 500)]
        orders: usize,
    },

    /// Show daemon health
    Health {
        /// Daemon base URL
        #[arg(long, default_value = DEFAULT_URL)]
        url: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<SqlSageError>()
            .map(SqlSageError::exit_code)
            .unwrap_or(1);
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            question,
            url,
            json,
        } => commands::ask(&url, &question, json),
        Commands::Seed {
            db,
            rng_seed,
            employees,
            customers,
            products,
            orders,
        } => {
            let options = SeedOptions {
                employees,
                customers,
                products,
                orders,
                rng_seed,
                ..SeedOptions::new(Local::now().date_naive())
            };
            commands::seed(&db, &options)
        }
        Commands::Health { url } => commands::health(&url),
    }
}
