mod cli;

use anyhow::Result;
use cli::Cli;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use abmigrate_core::{FsMover, GitMover, MappingTable, MigrateOptions};

/// Default mapping-file name, looked up next to the tree being migrated.
const MAPPING_FILE_NAME: &str = "abmigrate.txt";

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    setup_logging(&cli)?;
    install_interrupt_handler()?;

    info!("Starting abmigrate");

    if !cli.modify && !cli.rename {
        info!("Nothing to do: pass --modify and/or --rename");
        return Ok(());
    }

    let target = match cli.target.clone() {
        Some(target) => target,
        None => std::env::current_dir()?,
    };

    if !target.exists() {
        anyhow::bail!("Target directory does not exist: {:?}", target);
    }
    if !target.is_dir() {
        anyhow::bail!("Target must be a directory: {:?}", target);
    }

    let mapping_path = mapping_path(&cli, &target);
    info!("Mapping file: {:?}", mapping_path);
    let mappings = MappingTable::load(&mapping_path)?;
    info!("Loaded {} mapping entries", mappings.len());

    info!("Target directory: {:?}", target);
    info!("Content rewriting: {}", cli.modify);
    info!("File renaming: {}", cli.rename);

    if cli.dry_run {
        warn!("Dry run mode - no changes will be made");
    }

    let options = MigrateOptions {
        modify: cli.modify,
        rename: cli.rename,
        dry_run: cli.dry_run,
    };

    let result = if cli.no_git {
        abmigrate_core::process_directory(&target, &mappings, &options, &FsMover)?
    } else {
        abmigrate_core::process_directory(&target, &mappings, &options, &GitMover)?
    };

    println!("Migration complete!");
    println!("  Files processed: {}", result.files_processed);
    println!("  Files modified: {}", result.files_modified);
    println!("  Files renamed: {}", result.files_renamed);

    info!("Abmigrate completed successfully");
    Ok(())
}

fn mapping_path(cli: &Cli, target: &std::path::Path) -> PathBuf {
    match cli.mappings.clone() {
        Some(path) => path,
        None => target.join(MAPPING_FILE_NAME),
    }
}

/// Turns Ctrl-C into a reported, clean abort instead of the default signal
/// death. A file mid-write is not cleaned up; the temp-file-then-rename
/// pattern already guarantees every completed file is whole.
fn install_interrupt_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        eprintln!("Interrupted");
        std::process::exit(130);
    })?;
    Ok(())
}

fn setup_logging(cli: &Cli) -> Result<()> {
    let filter = if cli.quiet {
        EnvFilter::new("error")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .with(filter)
        .init();

    Ok(())
}
