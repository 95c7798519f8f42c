//! Two-pass scan-and-clean engine: a read-only counting pass, then a
//! destructive bottom-up pass that removes matches and streams events.

use crate::events::{EngineEvent, LogEvent, ProgressEvent};
use crate::patterns::PatternSet;
use crossbeam_channel::Sender;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Root path validation failure. This is the only error that aborts a run;
/// everything else is recovered locally and reported on the log channel.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("no such directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

/// Final accounting for one clean pass.
///
/// Created fresh per invocation and returned by value; the engine keeps no
/// counters between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub files_removed: u64,
    /// Each matched folder counts once, not per contained file.
    pub folders_removed: u64,
    /// File sizes at the moment of removal; a folder contributes the sum of
    /// all regular files under it.
    pub bytes_reclaimed: u64,
}

impl CleanSummary {
    pub fn items_removed(&self) -> u64 {
        self.files_removed + self.folders_removed
    }
}

/// The scanning-and-cleaning engine.
///
/// Holds the pattern policy and the sending half of the event channel. Both
/// passes are sequential; callers wanting a responsive frontend run the
/// engine on a worker thread and drain the channel elsewhere.
pub struct Engine {
    patterns: PatternSet,
    events: Sender<EngineEvent>,
}

impl Engine {
    pub fn new(patterns: PatternSet, events: Sender<EngineEvent>) -> Self {
        Engine { patterns, events }
    }

    /// Count cleanable items under `root` without touching anything.
    ///
    /// Matched folders count as one unit each and are not descended into;
    /// traversal continues through every other subdirectory. Unreadable
    /// directories are logged and contribute zero matches.
    pub fn count(&self, root: &Path) -> Result<u64, PathError> {
        validate_root(root)?;
        self.log(format!("Scanning directory: {}", root.display()));

        let found = self.count_dir(root);
        if found > 0 {
            self.log(format!("Found {} items to clean", found));
        } else {
            self.log("No macOS metadata found to clean");
        }
        Ok(found)
    }

    fn count_dir(&self, dir: &Path) -> u64 {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.log(format!("Error reading directory {}: {}", dir.display(), err));
                return 0;
            }
        };

        let mut found = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.log(format!("Error reading entry in {}: {}", dir.display(), err));
                    continue;
                }
            };
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    self.log(format!("Error reading entry in {}: {}", dir.display(), err));
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();

            if file_type.is_dir() {
                if self.patterns.is_cleanable_folder(&name) {
                    // One deletable unit; its contents are never enumerated
                    found += 1;
                } else {
                    found += self.count_dir(&entry.path());
                }
            } else if self.patterns.is_cleanable_file(&name) {
                found += 1;
            }
        }
        found
    }

    /// Remove every cleanable item under `root`, deepest directories first.
    ///
    /// `total_expected` comes from a prior [`count`](Self::count) and only
    /// feeds progress reporting; when per-item errors occur the two diverge
    /// and the engine does not reconcile them. With `total_expected == 0`
    /// this is a no-op returning a zero summary.
    pub fn clean(&self, root: &Path, total_expected: u64) -> Result<CleanSummary, PathError> {
        validate_root(root)?;

        let mut summary = CleanSummary::default();
        let mut processed = 0u64;

        self.log(format!("Starting to clean directory: {}", root.display()));
        self.clean_dir(root, total_expected, &mut processed, &mut summary);

        self.log("Summary:");
        self.log(format!("Files removed: {}", summary.files_removed));
        self.log(format!("Folders removed: {}", summary.folders_removed));
        self.log(format!(
            "Total space cleaned: {} bytes",
            summary.bytes_reclaimed
        ));
        self.log("-".repeat(50));

        Ok(summary)
    }

    fn clean_dir(
        &self,
        dir: &Path,
        total: u64,
        processed: &mut u64,
        summary: &mut CleanSummary,
    ) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                self.log(format!("Error reading directory {}: {}", dir.display(), err));
                return;
            }
        };

        let mut files = Vec::new();
        let mut subdirs = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    self.log(format!("Error reading entry in {}: {}", dir.display(), err));
                    continue;
                }
            };
            match entry.file_type() {
                // Symlinks land in `files`: a matching name unlinks the link
                // itself, and a link is never treated as a folder
                Ok(file_type) if file_type.is_dir() => subdirs.push(entry.path()),
                Ok(_) => files.push(entry.path()),
                Err(err) => {
                    self.log(format!("Error reading entry in {}: {}", dir.display(), err));
                }
            }
        }

        // Fixed sibling order keeps the event stream deterministic
        files.sort();
        subdirs.sort();

        // Bottom-up: every non-matched subtree is fully processed before this
        // level's own entries are evaluated. Matched folders are not entered;
        // they fall whole in the folder pass below.
        for subdir in &subdirs {
            if !self.patterns.is_cleanable_folder(&file_name_of(subdir)) {
                self.clean_dir(subdir, total, processed, summary);
            }
        }

        // Files before folders at each level
        for file in &files {
            if self.patterns.is_cleanable_file(&file_name_of(file)) {
                self.remove_file(file, total, processed, summary);
            }
        }
        for subdir in &subdirs {
            if self.patterns.is_cleanable_folder(&file_name_of(subdir)) {
                self.remove_folder(subdir, total, processed, summary);
            }
        }
    }

    fn remove_file(
        &self,
        path: &Path,
        total: u64,
        processed: &mut u64,
        summary: &mut CleanSummary,
    ) {
        // Size is read before the unlink; use symlink_metadata so a link
        // reports its own size, not its target's
        let size = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata.len(),
            Err(err) => {
                self.log(format!("Error removing file {}: {}", path.display(), err));
                return;
            }
        };
        if let Err(err) = fs::remove_file(path) {
            self.log(format!("Error removing file {}: {}", path.display(), err));
            return;
        }

        summary.files_removed += 1;
        summary.bytes_reclaimed += size;
        self.log(format!("Removed file: {}", path.display()));
        *processed += 1;
        self.progress(*processed, total);
    }

    fn remove_folder(
        &self,
        path: &Path,
        total: u64,
        processed: &mut u64,
        summary: &mut CleanSummary,
    ) {
        // Full transitive byte size, priced before the subtree goes
        let size = dir_size(path);
        if let Err(err) = fs::remove_dir_all(path) {
            self.log(format!("Error removing folder {}: {}", path.display(), err));
            return;
        }

        summary.folders_removed += 1;
        summary.bytes_reclaimed += size;
        self.log(format!("Removed folder: {}", path.display()));
        *processed += 1;
        self.progress(*processed, total);
    }

    fn log(&self, message: impl Into<String>) {
        // A send failure means the receiver is gone; nothing left to notify
        let _ = self.events.send(EngineEvent::Log(LogEvent::now(message)));
    }

    fn progress(&self, processed: u64, total: u64) {
        let _ = self
            .events
            .send(EngineEvent::Progress(ProgressEvent::new(processed, total)));
    }
}

fn validate_root(root: &Path) -> Result<(), PathError> {
    let metadata = fs::metadata(root).map_err(|_| PathError::NotFound(root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(PathError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

/// Total size of the regular files under `path`. Symlinks are not followed
/// and unreadable entries contribute zero.
fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
