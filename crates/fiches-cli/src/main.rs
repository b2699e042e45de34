mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{backup, completions, export, import, show, stat, Context};
use crate::error::{exit_code_for, report_error};
use fiches_config as config;
use fiches_import::ImportOptions;
use fiches_store::{paths, FicheStore, SecondaryUniqueness, SnapshotFormat, StoreOptions};

#[derive(Debug, Parser)]
#[command(name = "fiches", version, about = "fiches record store")]
struct Cli {
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Import records from files, or stdin when none are given
    Import(import::ImportArgs),
    /// Print the record stored for a phone number
    Show(show::ShowArgs),
    /// Show the record count, store path and format
    Stat(stat::StatArgs),
    /// Write every record as one text document
    Export(export::ExportArgs),
    /// Copy the store to a SQLite backup file
    Backup(backup::BackupArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        db_path,
        config: config_path,
        json,
        verbose: _,
        command,
    } = cli;

    if let Command::Completions(args) = command {
        return completions::emit(args);
    }

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    match config::resolve_config_path(config_path) {
        Ok(path) if path.exists() => debug!(path = %path.display(), "config resolved"),
        Ok(path) => debug!(path = %path.display(), "config missing, using defaults"),
        Err(err) => debug!(error = %err, "config unavailable"),
    }

    let store_path = match db_path.or_else(|| app_config.store_path.clone()) {
        Some(path) => {
            paths::ensure_parent_dir(&path)
                .with_context(|| format!("create parent of {}", path.display()))?;
            path
        }
        None => paths::store_path().with_context(|| "resolve store path")?,
    };
    debug!(path = %store_path.display(), "store path resolved");

    let format = app_config.format.map(|format| match format {
        config::StoreFormat::Sqlite => SnapshotFormat::Sqlite,
        config::StoreFormat::Json => SnapshotFormat::Json,
    });
    let options = StoreOptions {
        secondary_uniqueness: SecondaryUniqueness::from_flag(app_config.secondary_uniqueness),
        import: ImportOptions {
            layout: app_config.layout.clone(),
        },
    };
    let (store, open_report) = FicheStore::open_path(store_path.clone(), format, options);

    let ctx = Context {
        store: &store,
        store_path: &store_path,
        open_report: &open_report,
        json,
    };

    match command {
        Command::Import(args) => import::import(&ctx, args),
        Command::Show(args) => show::show(&ctx, args),
        Command::Stat(args) => stat::stat(&ctx, args),
        Command::Export(args) => export::export(&ctx, args),
        Command::Backup(args) => backup::backup(&ctx, args),
        Command::Completions(_) => {
            unreachable!("completions command handled before store initialization")
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
