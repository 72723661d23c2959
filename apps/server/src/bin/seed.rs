//! Sample data loader
//!
//! Loads a JSON-lines export of companies into the `companies` table in
//! batches. Lines that are not JSON objects are skipped.
//!
//! Usage:
//!   cargo run --bin directory-seed -- --file companies.jsonl [--limit 50000] [--force]

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::{info, warn};

use company_directory::{
    config::Config,
    db::{self, CompanyStore, PostgresCompanyStore},
    logging,
    models::NewCompany,
};

#[derive(Parser, Debug)]
#[command(name = "directory-seed")]
#[command(about = "Load sample companies from a JSON-lines file")]
struct Args {
    /// Path to the JSON-lines file
    #[arg(short, long)]
    file: PathBuf,

    /// Maximum number of companies to load
    #[arg(short, long, default_value_t = 1_000_000)]
    limit: usize,

    /// Rows per insert transaction
    #[arg(long, default_value_t = 1_000)]
    batch_size: usize,

    /// Database connection URL (or set DATABASE_URL env var)
    #[arg(short, long)]
    database_url: Option<String>,

    /// Load even if the table already contains companies
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_simple_logging();
    let args = Args::parse();

    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(url) = args.database_url {
        config.database.url = url;
    }

    let pool = db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    db::run_migrations(&pool).await?;
    let store = PostgresCompanyStore::new(pool);

    let existing = store.count_all().await?;
    if existing > 0 && !args.force {
        info!(
            existing,
            "Table already contains companies, skipping load (use --force to load anyway)"
        );
        return Ok(());
    }

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let batch_size = args.batch_size.max(1);

    let mut batch = Vec::with_capacity(batch_size);
    let mut loaded = 0u64;
    let mut parsed = 0usize;
    let mut skipped = 0usize;

    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        if parsed >= args.limit {
            break;
        }
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        match NewCompany::from_json_line(&line) {
            Ok(company) => {
                batch.push(company);
                parsed += 1;
            }
            Err(e) => {
                skipped += 1;
                warn!(line = line_no + 1, error = %e, "Skipping invalid line");
                continue;
            }
        }

        if batch.len() >= batch_size {
            loaded += store.insert_companies(&batch).await?;
            batch.clear();
            info!(loaded, "Processed batch");
        }
    }

    if !batch.is_empty() {
        loaded += store.insert_companies(&batch).await?;
    }

    info!(loaded, skipped, "Sample data loaded");
    Ok(())
}
