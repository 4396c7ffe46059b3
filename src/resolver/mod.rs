//! The pluggable module-system interface (spec.md §4.4, §4.6, §9) and the
//! per-file import driver (spec.md §4.6 "Per-file import driver").

mod flat_system;
mod path_system;

pub use flat_system::FlatResolver;
pub use path_system::PathResolver;

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::candidates::CandidateGenerator;
use crate::config::{ModuleSystemKind, ResolverConfig};
use crate::docblock::Docblock;
use crate::errors::{ErrorMessage, FatalResolutionError};
use crate::external_resolver::ExternalResolver;
use crate::file_key::FileKey;
use crate::fs::FileSystem;
use crate::fs_probe::DirectoryCache;
use crate::heaps::{ResolvedRequires, ResolvedRequiresHeap};
use crate::manifest::PackageManifestStore;
use crate::module_name::ModuleName;

/// Per-import-resolution mutable record (spec.md §3).
#[derive(Debug, Default)]
pub struct ResolutionAccumulator {
    paths: HashSet<String>,
    errors: Vec<ErrorMessage>,
}

impl ResolutionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a filesystem path that was probed but did not exist — a
    /// phantom dependent (spec.md glossary).
    pub fn record_path(&mut self, path: impl Into<String>) {
        self.paths.insert(path.into());
    }

    pub fn record_error(&mut self, error: ErrorMessage) {
        self.errors.push(error);
    }

    pub fn paths(&self) -> &HashSet<String> {
        &self.paths
    }

    pub fn errors(&self) -> &[ErrorMessage] {
        &self.errors
    }

    fn merge_into(self, into: &mut HashSet<String>) {
        into.extend(self.paths);
    }
}

/// The collaborators a single resolution needs, bundled to keep trait method
/// signatures from ballooning (spec.md §9's "hide behind an API object").
pub struct ResolveCtx<'a> {
    pub fs: &'a dyn FileSystem,
    pub dirs: &'a DirectoryCache,
    pub config: &'a ResolverConfig,
    pub candidates: &'a CandidateGenerator,
    pub manifests: &'a PackageManifestStore,
    pub external: Option<&'a ExternalResolver>,
}

/// Selects between the Path and Flat module systems (spec.md §9's trait/
/// interface design note). The two concrete implementations are
/// [`PathResolver`] and [`FlatResolver`].
pub trait ModuleSystem: Send + Sync {
    fn kind(&self) -> ModuleSystemKind;

    /// The name by which *other* files import `file` (spec.md §4.6, §4.9).
    fn exported_module(&self, file: &FileKey, docblock: &dyn Docblock, ctx: &ResolveCtx) -> ModuleName;

    /// Resolve a single reference from `importer`. Always returns a
    /// `ModuleName` — an unresolved reference yields a dangling `ByString`
    /// name rather than an error (spec.md §7).
    fn imported_module(
        &self,
        importer: &FileKey,
        reference: &str,
        ctx: &ResolveCtx,
        acc: &mut ResolutionAccumulator,
    ) -> Result<ModuleName, FatalResolutionError>;
}

/// The eponymous `ByFile` module every file provides (spec.md I4).
///
/// A declaration file's eponymous name is the *shadowed* name (its
/// declaration extension chopped) — see spec.md §9's open question. Its own
/// raw, un-chopped identity is instead carried by `exported_module`, so that
/// both claims get registered per §4.9.
pub fn eponymous(file: &FileKey, declaration_ext: &str) -> ModuleName {
    if file.is_declaration(declaration_ext) {
        ModuleName::by_file(chop_declaration(file, declaration_ext))
    } else {
        ModuleName::by_file(file.clone())
    }
}

fn chop_declaration(file: &FileKey, ext: &str) -> FileKey {
    let chop = |p: &Utf8Path| -> Utf8PathBuf {
        Utf8PathBuf::from(p.as_str().strip_suffix(ext).unwrap_or(p.as_str()))
    };
    match file {
        FileKey::Builtins => FileKey::Builtins,
        FileKey::SourceFile(p) => FileKey::SourceFile(chop(p)),
        FileKey::LibFile(p) => FileKey::LibFile(chop(p)),
        FileKey::JsonFile(p) => FileKey::JsonFile(chop(p)),
        FileKey::ResourceFile(p) => FileKey::ResourceFile(chop(p)),
    }
}

/// Resolve every reference a file makes, accumulating phantom dependents and
/// errors, and produce its `ResolvedRequires` record (spec.md §4.6 "Per-file
/// import driver").
pub fn resolve_file_imports(
    system: &dyn ModuleSystem,
    importer: &FileKey,
    references: &[String],
    ctx: &ResolveCtx,
    requires_heap: &ResolvedRequiresHeap,
) -> Result<(ResolvedRequires, Vec<ErrorMessage>), FatalResolutionError> {
    let _span = tracing::trace_span!("resolve_file_imports", %importer).entered();

    let mut resolved_modules = rustc_hash::FxHashMap::default();
    let mut phantom_dependents = HashSet::new();
    let mut errors = Vec::new();

    for reference in references {
        let mut acc = ResolutionAccumulator::new();
        let module = system.imported_module(importer, reference, ctx, &mut acc)?;
        resolved_modules.insert(reference.clone(), module);
        errors.extend(acc.errors().iter().cloned());
        acc.merge_into(&mut phantom_dependents);
    }

    if !errors.is_empty() {
        tracing::trace!(count = errors.len(), "import resolution raised errors");
    }

    let requires = ResolvedRequires {
        resolved_modules,
        phantom_dependents,
    };
    requires_heap.add_resolved_requires(importer.clone(), requires.clone());
    Ok((requires, errors))
}
