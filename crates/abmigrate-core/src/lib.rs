use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub mod files;
pub mod mappings;
pub mod rewriter;

pub use files::{FileMover, FsMover, GitMover};
pub use mappings::{MappingEntry, MappingTable};
pub use rewriter::{LineKind, LineRewriter, Rewritten};

/// Extension of the script files the migration operates on.
pub const SCRIPT_EXTENSION: &str = "ab";

#[derive(thiserror::Error, Debug)]
pub enum MigrateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Duplicate mappings: \"{name}\"")]
    DuplicateTarget { name: String },
    #[error("Already exists: {path:?}")]
    TargetExists { path: PathBuf },
    #[error("Move failed: {path:?}")]
    MoveFailed { path: PathBuf },
}

pub struct MigrateOptions {
    pub modify: bool,
    pub rename: bool,
    pub dry_run: bool,
}

pub struct MigrateResult {
    pub files_processed: usize,
    pub files_modified: usize,
    pub files_renamed: usize,
}

/// Walks `root` and applies content rewriting and/or file renaming to every
/// script file, per `options`.
///
/// At each directory level the files are visited in sorted name order
/// before descending into the sorted subdirectories, so output is
/// reproducible run to run. Files are processed one at a time, fully, and
/// the first error aborts the remaining walk.
pub fn process_directory(
    root: &Path,
    mappings: &MappingTable,
    options: &MigrateOptions,
    mover: &dyn FileMover,
) -> Result<MigrateResult> {
    let rewriter = LineRewriter::new(mappings);

    info!("Starting directory processing: {:?}", root);

    let mut result = MigrateResult {
        files_processed: 0,
        files_modified: 0,
        files_renamed: 0,
    };

    let mut candidates = Vec::new();
    collect_script_files(root, &mut candidates)?;

    for path in &candidates {
        debug!("Processing file: {:?}", path);
        result.files_processed += 1;

        if options.modify && files::modify_file(path, &rewriter, options.dry_run)? {
            result.files_modified += 1;
        }
        if options.rename && files::rename_file(path, root, mappings, options.dry_run, mover)? {
            result.files_renamed += 1;
        }
    }

    info!(
        "Processing complete: {} files processed, {} modified, {} renamed",
        result.files_processed, result.files_modified, result.files_renamed
    );

    Ok(result)
}

/// Collects script files under `dir`: each level's matching files in sorted
/// name order, then its subdirectories, recursively, also sorted.
fn collect_script_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), MigrateError> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in &entries {
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .is_some_and(|ext| ext == SCRIPT_EXTENSION)
        {
            files.push(path);
        }
    }
    for entry in &entries {
        let path = entry.path();
        if path.is_dir() {
            collect_script_files(&path, files)?;
        }
    }
    Ok(())
}
