//! Cleanable-name policy, loaded from the embedded patterns.toml.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;

// Embed the TOML file directly in the binary at compile time
const PATTERNS_TOML: &str = include_str!("../patterns.toml");

/// Structure to deserialize the pattern manifest from TOML
#[derive(Debug, Deserialize)]
struct PatternManifest {
    files: FileSection,
    folders: FolderSection,
}

#[derive(Debug, Deserialize)]
struct FileSection {
    exact: Vec<String>,
    #[serde(default)]
    prefixes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FolderSection {
    exact: Vec<String>,
}

/// The fixed policy describing which names are cleanable.
///
/// Matching is exact-string or prefix-string comparison on the file name
/// alone: case-sensitive, no normalization, no globbing. A name may appear
/// in more than one category; each category is evaluated on its own.
#[derive(Debug, Clone)]
pub struct PatternSet {
    exact_files: HashSet<String>,
    file_prefixes: Vec<String>,
    exact_folders: HashSet<String>,
}

impl PatternSet {
    /// Parse the embedded pattern manifest.
    pub fn load() -> Result<Self> {
        let manifest: PatternManifest =
            toml::from_str(PATTERNS_TOML).context("Failed to parse embedded patterns.toml")?;

        Ok(PatternSet {
            exact_files: manifest.files.exact.into_iter().collect(),
            file_prefixes: manifest.files.prefixes,
            exact_folders: manifest.folders.exact.into_iter().collect(),
        })
    }

    /// True iff a file with this name should be removed.
    pub fn is_cleanable_file(&self, name: &str) -> bool {
        self.exact_files.contains(name)
            || self
                .file_prefixes
                .iter()
                .any(|prefix| name.starts_with(prefix.as_str()))
    }

    /// True iff a directory with this name should be removed as one unit.
    pub fn is_cleanable_folder(&self, name: &str) -> bool {
        self.exact_folders.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_builtin_patterns() {
        let patterns = PatternSet::load().expect("embedded manifest must parse");
        assert!(patterns.is_cleanable_file(".DS_Store"));
        assert!(patterns.is_cleanable_folder("__MACOSX"));
    }

    #[test]
    fn test_exact_file_names() {
        let patterns = PatternSet::load().unwrap();
        assert!(patterns.is_cleanable_file(".DS_Store"));
        assert!(patterns.is_cleanable_file("._.DS_Store"));
        assert!(patterns.is_cleanable_file(".apdisk"));
        assert!(!patterns.is_cleanable_file("DS_Store"));
        assert!(!patterns.is_cleanable_file("notes.txt"));
    }

    #[test]
    fn test_prefix_matches_start_of_name_only() {
        let patterns = PatternSet::load().unwrap();
        assert!(patterns.is_cleanable_file("._photo.jpg"));
        assert!(patterns.is_cleanable_file("._"));
        // The prefix occurring mid-name is not a match
        assert!(!patterns.is_cleanable_file("photo._backup.jpg"));
        assert!(!patterns.is_cleanable_file("archive_.zip"));
    }

    #[test]
    fn test_exact_folder_names() {
        let patterns = PatternSet::load().unwrap();
        assert!(patterns.is_cleanable_folder("__MACOSX"));
        assert!(patterns.is_cleanable_folder(".fseventsd"));
        assert!(patterns.is_cleanable_folder(".Spotlight-V100"));
        assert!(patterns.is_cleanable_folder(".TemporaryItems"));
        assert!(!patterns.is_cleanable_folder("__macosx"));
        assert!(!patterns.is_cleanable_folder("src"));
    }

    #[test]
    fn test_categories_are_independent() {
        let patterns = PatternSet::load().unwrap();
        // Folder names are not file matches and vice versa
        assert!(!patterns.is_cleanable_file("__MACOSX"));
        assert!(!patterns.is_cleanable_folder(".DS_Store"));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let patterns = PatternSet::load().unwrap();
        assert!(!patterns.is_cleanable_file(".ds_store"));
        assert!(!patterns.is_cleanable_file(".DS_STORE"));
    }
}
