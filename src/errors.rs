//! Error surface (spec.md §6, §7).

use std::fmt;

use crate::file_key::FileKey;
use crate::module_name::ModuleName;

/// A recoverable, structured message attached to a single file (spec.md §3:
/// `ResolutionAccumulator.errors`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorMessage {
    /// A package manifest path was expected in the store but hadn't been
    /// observed, and the manifest lives inside the project root (or on the
    /// included list). `0` is the manifest path relative to the root.
    PackageHeapNotFound(String),
    /// As above, but the manifest lives outside the project root and isn't
    /// on the included list.
    ModuleOutsideRoot(String),
    /// Another file already won the election for `module`; `provider` is the
    /// elected winner and `conflict` is the file this message is attached to.
    DuplicateProvider {
        module: ModuleName,
        provider: FileKey,
        conflict: FileKey,
    },
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorMessage::PackageHeapNotFound(path) => {
                write!(f, "package manifest not found: {path}")
            }
            ErrorMessage::ModuleOutsideRoot(path) => {
                write!(f, "module outside project root: {path}")
            }
            ErrorMessage::DuplicateProvider {
                module,
                provider,
                conflict,
            } => write!(
                f,
                "duplicate provider for module `{module}`: `{conflict}` conflicts with already-elected `{provider}`"
            ),
        }
    }
}

/// Errors that unwind through the worker and abort the whole pass
/// (spec.md §4.5, §7: "Fatal to the pass").
#[derive(Debug, thiserror::Error)]
pub enum FatalResolutionError {
    #[error("module resolver subprocess failed: {0}")]
    ModuleResolverFatal(String),
    #[error("module resolver returned a malformed response")]
    InvalidResolution,
}
