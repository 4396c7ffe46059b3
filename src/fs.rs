//! Filesystem abstraction (spec.md §4.1's "failure semantics: any OS error
//! while probing is treated as non-existence").
//!
//! Mirrors the split used throughout the pack between a real-OS
//! implementation and an in-memory fake for tests (cf.
//! `ruff_db::system::{System, TestSystem}`).

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use camino::{Utf8Path, Utf8PathBuf};

/// Minimal filesystem surface the module-resolution core needs.
///
/// All methods treat any OS-level error as a negative answer
/// (`exists -> false`, `read_dir -> empty`), per spec.md §4.1.
pub trait FileSystem: Send + Sync {
    /// Whether `path` exists, without regard to case on case-insensitive
    /// platforms. Callers that need case-correctness must go through
    /// `fs_probe::dir_exists`/`file_exists` instead of calling this directly.
    fn exists(&self, path: &Utf8Path) -> bool;

    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Utf8Path) -> bool;

    /// The exact-case basenames of `dir`'s entries, or empty if `dir` can't
    /// be listed (doesn't exist, isn't a directory, permission error, ...).
    fn read_dir_names(&self, dir: &Utf8Path) -> BTreeSet<String>;

    /// Resolve all symlinks in `path` and return an absolute path. Falls
    /// back to a lexical absolutization if the path doesn't exist.
    fn canonicalize(&self, path: &Utf8Path) -> Utf8PathBuf;

    /// Read the full contents of a file as a string, or `None` on any error.
    fn read_to_string(&self, path: &Utf8Path) -> Option<String>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        path.as_std_path().exists()
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        path.as_std_path().is_dir()
    }

    fn read_dir_names(&self, dir: &Utf8Path) -> BTreeSet<String> {
        std::fs::read_dir(dir.as_std_path())
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect()
    }

    fn canonicalize(&self, path: &Utf8Path) -> Utf8PathBuf {
        std::fs::canonicalize(path.as_std_path())
            .ok()
            .and_then(|p| Utf8PathBuf::from_path_buf(p).ok())
            .unwrap_or_else(|| absolutize(path))
    }

    fn read_to_string(&self, path: &Utf8Path) -> Option<String> {
        std::fs::read_to_string(path.as_std_path()).ok()
    }
}

fn absolutize(path: &Utf8Path) -> Utf8PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .ok()
            .and_then(|cwd| Utf8PathBuf::from_path_buf(cwd).ok())
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|| path.to_path_buf())
    }
}

/// An in-memory filesystem for tests, so that module-resolution tests never
/// touch real directories and can assert exact-case behavior deterministically.
#[derive(Debug, Default, Clone)]
pub struct TestFileSystem {
    inner: Arc<Mutex<TestFsInner>>,
}

#[derive(Debug, Default)]
struct TestFsInner {
    files: std::collections::BTreeMap<Utf8PathBuf, String>,
    dirs: BTreeSet<Utf8PathBuf>,
}

impl TestFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a file (and all of its ancestor directories) in the fake filesystem.
    pub fn write_file(&self, path: impl AsRef<Utf8Path>, contents: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut inner = self.inner.lock().unwrap();
        let mut ancestor = path.parent().map(Utf8Path::to_path_buf);
        while let Some(dir) = ancestor {
            inner.dirs.insert(dir.clone());
            ancestor = dir.parent().map(Utf8Path::to_path_buf);
        }
        inner.files.insert(path, contents.into());
    }

    pub fn mkdir(&self, path: impl AsRef<Utf8Path>) {
        self.inner.lock().unwrap().dirs.insert(path.as_ref().to_path_buf());
    }

    pub fn remove_file(&self, path: impl AsRef<Utf8Path>) {
        self.inner.lock().unwrap().files.remove(path.as_ref());
    }
}

impl FileSystem for TestFileSystem {
    fn exists(&self, path: &Utf8Path) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.files.contains_key(path) || inner.dirs.contains(path)
    }

    fn is_dir(&self, path: &Utf8Path) -> bool {
        self.inner.lock().unwrap().dirs.contains(path)
    }

    fn read_dir_names(&self, dir: &Utf8Path) -> BTreeSet<String> {
        let inner = self.inner.lock().unwrap();
        let mut names = BTreeSet::new();
        for path in inner.files.keys().chain(inner.dirs.iter()) {
            if path.parent() == Some(dir) {
                if let Some(name) = path.file_name() {
                    names.insert(name.to_string());
                }
            }
        }
        names
    }

    fn canonicalize(&self, path: &Utf8Path) -> Utf8PathBuf {
        path.to_path_buf()
    }

    fn read_to_string(&self, path: &Utf8Path) -> Option<String> {
        self.inner.lock().unwrap().files.get(path).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_lists_exact_case_names() {
        let fs = TestFileSystem::new();
        fs.write_file("/r/Foo.js", "");
        fs.write_file("/r/bar.js", "");
        let names = fs.read_dir_names(Utf8Path::new("/r"));
        assert!(names.contains("Foo.js"));
        assert!(names.contains("bar.js"));
    }

    #[test]
    fn missing_dir_lists_empty() {
        let fs = TestFileSystem::new();
        assert!(fs.read_dir_names(Utf8Path::new("/nope")).is_empty());
    }

    /// `OsFileSystem::read_dir_names` against a real directory, cross-checked
    /// with an independent directory walk.
    #[test]
    fn os_filesystem_listing_matches_walkdir() -> anyhow::Result<()> {
        let temp_dir = tempfile::tempdir()?;
        let root = Utf8Path::from_path(temp_dir.path()).expect("tempdir path is valid UTF-8");

        std::fs::write(root.join("a.js").as_std_path(), "")?;
        std::fs::create_dir(root.join("pkg").as_std_path())?;

        let fs = OsFileSystem;
        let names = fs.read_dir_names(root);

        let walked: BTreeSet<String> = walkdir::WalkDir::new(root.as_std_path())
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect();

        assert_eq!(names, walked);
        Ok(())
    }
}
