//! Tickshelf CLI: incremental sync of archived CSV files into partitioned storage.
//!
//! Commands:
//! - `sync`: clean, diff, enrich and commit every archived file in the input directory
//! - `catalog`: list the date partitions already materialized for some symbols

mod logging;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tickshelf_core::catalog::CatalogReader;
use tickshelf_core::store::PartitionLayout;
use tickshelf_runner::{
    discover_sources, run_sync, ComputeContext, ConfigOverrides, FileStatus, RunReport,
    SyncConfig, SyncSettings,
};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "tickshelf",
    about = "Tickshelf: incremental partition sync for archived market data"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync every `archived_<SYMBOL>_results.csv` file into the store.
    Sync {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Directory of archived CSV files (overrides LOCAL_DATA_DIR).
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Directory for the log file and run reports (overrides LOG_DIR).
        #[arg(long)]
        log_dir: Option<PathBuf>,

        /// Target store: s3://bucket, bucket, file:///path or memory:// (overrides S3_BUCKET).
        #[arg(long)]
        bucket: Option<String>,

        /// Root prefix for partitions (overrides S3_PREFIX_ROOT).
        #[arg(long)]
        prefix: Option<String>,

        /// Transform and preview, but commit nothing.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Log filter, e.g. `debug` or `tickshelf_runner=debug`.
        #[arg(long)]
        log_level: Option<String>,
    },
    /// List existing date partitions for one or more symbols.
    Catalog {
        /// Symbols to list.
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Target store (overrides S3_BUCKET).
        #[arg(long)]
        bucket: Option<String>,

        /// Root prefix for partitions (overrides S3_PREFIX_ROOT).
        #[arg(long)]
        prefix: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sync {
            config,
            input_dir,
            log_dir,
            bucket,
            prefix,
            dry_run,
            log_level,
        } => {
            let overrides = ConfigOverrides {
                input_dir,
                log_dir,
                bucket,
                prefix,
                dry_run: dry_run.then_some(true),
            };
            run_sync_cmd(config.as_deref(), overrides, log_level.as_deref())
        }
        Commands::Catalog {
            symbols,
            config,
            bucket,
            prefix,
        } => {
            let overrides = ConfigOverrides {
                bucket,
                prefix,
                ..Default::default()
            };
            run_catalog_cmd(config.as_deref(), overrides, &symbols)
        }
    }
}

fn load_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<SyncConfig> {
    let mut config = match path {
        Some(path) => SyncConfig::from_file(path)?,
        None => SyncConfig::default(),
    };
    config.apply_env()?;
    config.apply_overrides(overrides);
    Ok(config)
}

fn run_sync_cmd(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
    log_level: Option<&str>,
) -> Result<()> {
    let mut config = load_config(config_path, overrides)?;
    config.validate()?;

    logging::init_logging(config.log_dir.as_deref(), log_level)?;

    let sources = discover_sources(&config.input_dir)?;
    if sources.is_empty() {
        warn!(dir = %config.input_dir.display(), "no archived files found");
        return Ok(());
    }

    let settings = SyncSettings::from(&config);
    // The context is released when `scoped` returns, before any exit below.
    let report = ComputeContext::scoped(&config, |ctx| run_sync(ctx, &settings, &sources))?;

    if report.dry_run {
        print_previews(&report, &settings);
    }
    print_summary(&report);

    if let Some(dir) = &config.log_dir {
        let path = report.save(dir)?;
        info!(path = %path.display(), "run report saved");
    }

    if !report.all_succeeded() {
        eprintln!("{} of {} files failed; see the log for details", report.failed(), report.outcomes.len());
        std::process::exit(1);
    }

    Ok(())
}

fn run_catalog_cmd(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
    symbols: &[String],
) -> Result<()> {
    let mut config = load_config(config_path, overrides)?;
    if config.bucket.trim().is_empty() {
        bail!("no store configured: pass --bucket or set S3_BUCKET");
    }
    config.prefix = config.prefix.trim_matches('/').to_string();

    logging::init_logging(None, None)?;

    let layout = PartitionLayout::new(&config.prefix);
    ComputeContext::scoped(&config, |ctx| -> Result<()> {
        let reader = CatalogReader::new(ctx.store(), &layout);
        for symbol in symbols {
            let existing = reader
                .existing_partitions(symbol)
                .with_context(|| format!("listing {symbol}"))?;

            println!("{} ({} partitions)", layout.symbol_prefix(symbol), existing.len());
            match (existing.iter().next(), existing.iter().last()) {
                (Some(first), Some(last)) => println!("  {first} .. {last}"),
                _ => println!("  (none)"),
            };
        }
        Ok(())
    })??;

    Ok(())
}

fn print_previews(report: &RunReport, settings: &SyncSettings) {
    for outcome in &report.outcomes {
        if let FileStatus::Previewed {
            partitions,
            preview,
        } = &outcome.status
        {
            println!(
                "[DRY-RUN] {} -> {} ({} new partitions)",
                outcome.file_name,
                settings.layout.symbol_prefix(&outcome.symbol),
                partitions.len()
            );
            for key in partitions {
                println!("  would write {key}");
            }
            println!("{preview}");
            println!();
        }
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "{:<10} {:<10} {:>8} {:>8} {:>8} {:>11}",
        "Symbol", "Status", "Read", "Dropped", "Skipped", "Partitions"
    );
    println!("{}", "-".repeat(60));
    for outcome in &report.outcomes {
        let status = match &outcome.status {
            FileStatus::Synced => "synced",
            FileStatus::Previewed { .. } => "dry-run",
            FileStatus::Failed { .. } => "FAILED",
        };
        println!(
            "{:<10} {:<10} {:>8} {:>8} {:>8} {:>11}",
            outcome.symbol,
            status,
            outcome.rows_read,
            outcome.rows_dropped,
            outcome.rows_skipped,
            outcome.committed.len()
        );
    }
    println!();
    println!(
        "Files: {} ok ({} previewed), {} failed. Partitions written: {}",
        report.succeeded(),
        report.previewed(),
        report.failed(),
        report.partitions_written()
    );
    println!(
        "Rows: {} read, {} dropped, {} skipped",
        report.rows_read(),
        report.rows_dropped(),
        report.rows_skipped()
    );
}
