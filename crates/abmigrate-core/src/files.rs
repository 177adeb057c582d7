use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use tracing::{debug, info};

use crate::mappings::MappingTable;
use crate::rewriter::LineRewriter;
use crate::MigrateError;

/// Performs the physical move of a renamed file.
///
/// The move itself is a thin delegation seam: the default implementation
/// goes through version control so file history follows the rename.
pub trait FileMover {
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), MigrateError>;
}

/// Moves files with `git mv`.
pub struct GitMover;

impl FileMover for GitMover {
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), MigrateError> {
        let status = Command::new("git").arg("mv").arg(from).arg(to).status()?;
        if !status.success() {
            return Err(MigrateError::MoveFailed {
                path: from.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Plain filesystem rename, for trees not tracked by version control.
pub struct FsMover;

impl FileMover for FsMover {
    fn move_file(&self, from: &Path, to: &Path) -> Result<(), MigrateError> {
        Ok(fs::rename(from, to)?)
    }
}

/// Rewrites `path` in place if the mapping table changes its content.
///
/// The rewritten content always goes to a sibling `.tmp` file first; a dirty
/// result takes the original's permission bits and is renamed over it
/// atomically, a clean result is discarded. Returns whether the file was
/// (or, in dry-run mode, would be) modified.
pub fn modify_file(
    path: &Path,
    rewriter: &LineRewriter,
    dry_run: bool,
) -> Result<bool, MigrateError> {
    let content = fs::read_to_string(path)?;
    let rewritten = rewriter.rewrite_content(&content);

    if dry_run {
        if rewritten.dirty {
            info!("Would modify: {:?}", path);
        }
        return Ok(rewritten.dirty);
    }

    let temp = path.with_extension("tmp");
    fs::write(&temp, &rewritten.text)?;
    if !rewritten.dirty {
        fs::remove_file(&temp)?;
        return Ok(false);
    }

    info!("Modifying: {:?}", path);
    // Permission bits must land on the temp file before it replaces the
    // original.
    let permissions = fs::metadata(path)?.permissions();
    fs::set_permissions(&temp, permissions)?;
    fs::rename(&temp, path)?;
    Ok(true)
}

/// Renames `path` when its stem maps to a different target stem.
///
/// Files without a mapping entry, files already carrying their target name,
/// and test fixtures are skipped. Fixture status is judged on the path
/// relative to the walk root, so segments in the root's own ancestry never
/// exempt anything. An occupied destination is a fatal error in both modes;
/// nothing is ever overwritten. Returns whether the file was (or would be)
/// renamed.
pub fn rename_file(
    path: &Path,
    root: &Path,
    mappings: &MappingTable,
    dry_run: bool,
    mover: &dyn FileMover,
) -> Result<bool, MigrateError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let Some(target) = mappings.target_stem(stem) else {
        if dry_run {
            info!("Would skip: {:?}", path);
        }
        return Ok(false);
    };

    let relative = path.strip_prefix(root).unwrap_or(path);
    if target == stem || is_fixture_exempt(relative) {
        if dry_run {
            info!("Would skip: {:?}", path);
        }
        return Ok(false);
    }

    let destination = with_stem(path, &target);
    if destination.exists() {
        return Err(MigrateError::TargetExists { path: destination });
    }

    if dry_run {
        info!("Would rename: {:?} -> {:?}", path, destination);
    } else {
        info!("Renaming: {:?} -> {:?}", path, destination);
        mover.move_file(path, &destination)?;
    }
    Ok(true)
}

/// Test-fixture paths keep their names so fixture identity survives the
/// migration.
fn is_fixture_exempt(path: &Path) -> bool {
    let exempt = Regex::new(r"\b(validity|no_output)\b").unwrap();
    let matched = exempt.is_match(&path.to_string_lossy());
    if matched {
        debug!("Fixture path exempt from renaming: {:?}", path);
    }
    matched
}

fn with_stem(path: &Path, stem: &str) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => path.with_file_name(format!("{stem}.{ext}")),
        None => path.with_file_name(stem.to_string()),
    }
}
