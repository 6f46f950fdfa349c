// src/main.rs

use anyhow::Result;
use clap::{Parser, Subcommand};
use debrepo::ingest::Ingestor;
use debrepo::prompt::{ConsolePrompter, Prompter};
use debrepo::repo::RepoLayout;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "debrepo")]
#[command(author, version, about = "Catalog manager for Sileo/Cydia-style Debian package repositories", long_about = None)]
struct Cli {
    /// Repository root directory (holds debs/ and packageInfo/)
    #[arg(short, long, default_value = ".", global = true)]
    root: PathBuf,

    /// Public base URL the repository is served from
    #[arg(
        long,
        env = "DEBREPO_BASE_URL",
        default_value = "https://repo.example.com",
        global = true
    )]
    base_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a single package to the repository
    Add {
        /// Path to the .deb file (prompted for when omitted)
        deb_path: Option<PathBuf>,
    },
    /// Add every .deb from a directory
    BulkAdd {
        /// Directory containing .deb files (prompted for when omitted)
        dir: Option<PathBuf>,
    },
    /// Re-ingest one package from the repository inbox
    Sync,
    /// Re-ingest every package from the repository inbox
    SyncAll,
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let layout = RepoLayout::new(cli.root, cli.base_url);
    let ingestor = Ingestor::new(layout);
    let mut prompter = ConsolePrompter;

    match cli.command {
        Some(Commands::Add { deb_path }) => add_package(&ingestor, &mut prompter, deb_path),
        Some(Commands::BulkAdd { dir }) => bulk_add(&ingestor, &mut prompter, dir),
        Some(Commands::Sync) => sync_one(&ingestor, &mut prompter),
        Some(Commands::SyncAll) => sync_all(&ingestor, &mut prompter),
        None => main_menu(&ingestor, &mut prompter),
    }
}

fn main_menu(ingestor: &Ingestor, prompter: &mut dyn Prompter) -> Result<()> {
    let choices = vec![
        "Add a package".to_string(),
        "Bulk add packages".to_string(),
        "Sync a package".to_string(),
        "Sync all packages".to_string(),
    ];

    match prompter.ask_choice("What do you want to do?", &choices)? {
        0 => add_package(ingestor, prompter, None),
        1 => bulk_add(ingestor, prompter, None),
        2 => sync_one(ingestor, prompter),
        _ => sync_all(ingestor, prompter),
    }
}

fn add_package(
    ingestor: &Ingestor,
    prompter: &mut dyn Prompter,
    deb_path: Option<PathBuf>,
) -> Result<()> {
    let deb_path = match deb_path {
        Some(path) => path,
        None => PathBuf::from(prompter.ask_text("Enter the path to the deb file", None)?),
    };

    ingest_one(ingestor, prompter, &deb_path);
    Ok(())
}

fn bulk_add(
    ingestor: &Ingestor,
    prompter: &mut dyn Prompter,
    dir: Option<PathBuf>,
) -> Result<()> {
    let dir = match dir {
        Some(dir) => dir,
        None => PathBuf::from(prompter.ask_text("Enter the path to the debs directory", None)?),
    };

    let summary = ingestor.ingest_dir(&dir, prompter)?;
    println!(
        "Processed {} package(s): {} succeeded, {} failed",
        summary.succeeded + summary.failed,
        summary.succeeded,
        summary.failed
    );
    Ok(())
}

fn sync_one(ingestor: &Ingestor, prompter: &mut dyn Prompter) -> Result<()> {
    let files = ingestor.inbox_debs()?;
    if files.is_empty() {
        println!("No debs to process");
        return Ok(());
    }

    let index = prompter.ask_choice("Select a deb", &files)?;
    let deb_path = ingestor.layout().debs_dir().join(&files[index]);

    ingest_one(ingestor, prompter, &deb_path);
    Ok(())
}

fn sync_all(ingestor: &Ingestor, prompter: &mut dyn Prompter) -> Result<()> {
    let debs_dir = ingestor.layout().debs_dir();
    let summary = ingestor.ingest_dir(&debs_dir, prompter)?;
    println!(
        "Synced {} package(s): {} succeeded, {} failed",
        summary.succeeded + summary.failed,
        summary.succeeded,
        summary.failed
    );
    Ok(())
}

/// Ingest one file; errors are reported and the process moves on.
fn ingest_one(ingestor: &Ingestor, prompter: &mut dyn Prompter, deb_path: &Path) {
    info!("Ingesting package: {}", deb_path.display());
    match ingestor.ingest_file(deb_path, prompter) {
        Ok(id) => println!("Added {} to the repository", id),
        Err(e) => error!("Failed to ingest {}: {}", deb_path.display(), e),
    }
}
