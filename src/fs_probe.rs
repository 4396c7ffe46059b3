//! Case-correct filesystem probing (spec.md §4.1).
//!
//! On case-insensitive platforms `exists()` lies about case, so `dir_exists`
//! and `file_exists` go through a directory-listing cache and check the
//! basename's exact case instead of trusting the OS call.

use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;

use crate::fs::FileSystem;

/// Process-wide cache of directory listings, keyed by directory path.
///
/// Appended to within a pass, cleared only by an explicit [`clear`](Self::clear)
/// call at the top of the next pass (spec.md §4.1, §9: "hide behind an API
/// object passed by reference, not module-level globals").
#[derive(Default)]
pub struct DirectoryCache {
    listings: Mutex<FxHashMap<Utf8PathBuf, std::collections::BTreeSet<String>>>,
    case_sensitive: once_cell::sync::OnceCell<bool>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all cached listings. Called at the top of each typecheck pass.
    pub fn clear(&self) {
        self.listings.lock().unwrap().clear();
    }

    /// Determine, once per process, whether the filesystem is case-sensitive.
    ///
    /// Mirrors spec.md §4.1: test whether the current directory still exists
    /// when its path is upper-cased.
    pub fn is_case_sensitive(&self, fs: &dyn FileSystem) -> bool {
        *self.case_sensitive.get_or_init(|| detect_case_sensitivity(fs))
    }

    fn listing(&self, fs: &dyn FileSystem, dir: &Utf8Path) -> std::collections::BTreeSet<String> {
        let mut listings = self.listings.lock().unwrap();
        if let Some(existing) = listings.get(dir) {
            return existing.clone();
        }
        let names = fs.read_dir_names(dir);
        listings.insert(dir.to_path_buf(), names.clone());
        names
    }

    /// `true` only when `path` is an existing directory *and* its basename
    /// appears with exact case in the parent's cached listing.
    pub fn dir_exists(&self, fs: &dyn FileSystem, path: &Utf8Path) -> bool {
        if !fs.is_dir(path) {
            return false;
        }
        if !self.is_case_sensitive(fs) {
            return self.basename_matches(fs, path);
        }
        true
    }

    /// `true` when `path` exists, is not a directory, and (on case-insensitive
    /// platforms) its basename appears with exact case in the parent listing.
    pub fn file_exists(&self, fs: &dyn FileSystem, path: &Utf8Path) -> bool {
        if !fs.exists(path) || fs.is_dir(path) {
            return false;
        }
        if !self.is_case_sensitive(fs) {
            return self.basename_matches(fs, path);
        }
        true
    }

    fn basename_matches(&self, fs: &dyn FileSystem, path: &Utf8Path) -> bool {
        let Some(parent) = path.parent() else {
            return true;
        };
        let Some(name) = path.file_name() else {
            return false;
        };
        self.listing(fs, parent).contains(name)
    }
}

fn detect_case_sensitivity(fs: &dyn FileSystem) -> bool {
    let Ok(cwd) = std::env::current_dir() else {
        return true;
    };
    let Ok(cwd) = Utf8PathBuf::from_path_buf(cwd) else {
        return true;
    };
    let upper = Utf8PathBuf::from(cwd.as_str().to_uppercase());
    if upper == cwd {
        // Can't distinguish on a path with no alphabetic characters; assume
        // case-sensitive, the more conservative (slower but always-correct) choice.
        return true;
    }
    !fs.exists(&upper)
}

/// Normalize `path` through all symlinks and return an absolute path.
///
/// Any OS error during resolution falls back to a lexical absolutization
/// (spec.md §4.1: "any OS error while probing is treated as non-existence").
pub fn resolve_symlinks(fs: &dyn FileSystem, path: &Utf8Path) -> Utf8PathBuf {
    fs.canonicalize(path)
}
