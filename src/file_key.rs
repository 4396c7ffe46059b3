use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};

/// Identifies a single file known to the type checker.
///
/// Equality and hashing are by tag + path, so two `FileKey`s referring to the
/// same on-disk path under different variants (e.g. `SourceFile` vs.
/// `LibFile`) are distinct keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileKey {
    /// The language's built-in globals; has no backing path.
    Builtins,
    /// A first-party source file.
    SourceFile(Utf8PathBuf),
    /// A library/declaration-only file (e.g. vendored stubs).
    LibFile(Utf8PathBuf),
    /// A JSON file, such as a package manifest.
    JsonFile(Utf8PathBuf),
    /// A non-source resource file (image, font, etc.) that can still be `require`d.
    ResourceFile(Utf8PathBuf),
}

impl FileKey {
    /// The path backing this key, if any. `Builtins` has none.
    pub fn path(&self) -> Option<&Utf8Path> {
        match self {
            FileKey::Builtins => None,
            FileKey::SourceFile(p)
            | FileKey::LibFile(p)
            | FileKey::JsonFile(p)
            | FileKey::ResourceFile(p) => Some(p),
        }
    }

    /// A stable string form, used for logging and for fixing iteration order
    /// during provider election (spec.md §4.7: "iteration order ... must be
    /// fixed (lexicographic by file key string)").
    pub fn as_sort_key(&self) -> String {
        match self {
            FileKey::Builtins => "\0builtins".to_string(),
            FileKey::SourceFile(p) => format!("1:{p}"),
            FileKey::LibFile(p) => format!("2:{p}"),
            FileKey::JsonFile(p) => format!("3:{p}"),
            FileKey::ResourceFile(p) => format!("4:{p}"),
        }
    }

    /// `true` if `path` ends in the configured declaration extension
    /// (spec.md glossary: "Declaration file").
    pub fn is_declaration(&self, declaration_ext: &str) -> bool {
        self.path().is_some_and(|p| p.as_str().ends_with(declaration_ext))
    }
}

impl fmt::Display for FileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKey::Builtins => write!(f, "<builtins>"),
            FileKey::SourceFile(p) => write!(f, "{p}"),
            FileKey::LibFile(p) => write!(f, "{p} (lib)"),
            FileKey::JsonFile(p) => write!(f, "{p}"),
            FileKey::ResourceFile(p) => write!(f, "{p}"),
        }
    }
}
