//! The mutable singleton a caller drives one typecheck pass at a time
//! (spec.md §9: "hide mutable global state behind an API object passed by
//! reference").

use camino::Utf8PathBuf;

use crate::candidates::CandidateGenerator;
use crate::config::{ModuleSystemKind, ResolverConfig};
use crate::external_resolver::ExternalResolver;
use crate::fs::{FileSystem, OsFileSystem};
use crate::fs_probe::DirectoryCache;
use crate::heaps::{AllProvidersIndex, InfoHeap, NameIndex, ResolvedRequiresHeap};
use crate::manifest::PackageManifestStore;
use crate::resolver::{FlatResolver, ModuleSystem, PathResolver, ResolveCtx};

/// Owns every persistent index and process-wide cache the core needs across
/// a sequence of typecheck passes.
pub struct ResolverState {
    pub config: ResolverConfig,
    fs: Box<dyn FileSystem>,
    dirs: DirectoryCache,
    candidates: CandidateGenerator,
    manifests: PackageManifestStore,
    all_providers: AllProvidersIndex,
    name_index: NameIndex,
    info_heap: InfoHeap,
    requires_heap: ResolvedRequiresHeap,
    system: Box<dyn ModuleSystem>,
    external: Option<ExternalResolver>,
}

impl ResolverState {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_filesystem(config, Box::new(OsFileSystem))
    }

    pub fn with_filesystem(config: ResolverConfig, fs: Box<dyn FileSystem>) -> Self {
        let system: Box<dyn ModuleSystem> = match config.module_system {
            ModuleSystemKind::Path => Box::new(PathResolver),
            ModuleSystemKind::Flat => Box::new(FlatResolver),
        };
        let external = config.module_resolver.clone().map(ExternalResolver::new);

        Self {
            config,
            fs,
            dirs: DirectoryCache::new(),
            candidates: CandidateGenerator::new(),
            manifests: PackageManifestStore::new(),
            all_providers: AllProvidersIndex::new(),
            name_index: NameIndex::new(),
            info_heap: InfoHeap::new(),
            requires_heap: ResolvedRequiresHeap::new(),
            system,
            external,
        }
    }

    /// Drop every process-wide cache that is only valid for the duration of
    /// one pass. Persistent indices (`AllProvidersIndex`, `NameIndex`,
    /// `InfoHeap`, `ResolvedRequiresHeap`, `PackageManifestStore`) survive —
    /// they carry state *across* passes by design.
    pub fn clear_pass_caches(&self) {
        tracing::trace!("clearing directory-listing cache for new pass");
        self.dirs.clear();
    }

    pub fn system(&self) -> &dyn ModuleSystem {
        self.system.as_ref()
    }

    pub fn ctx(&self) -> ResolveCtx<'_> {
        ResolveCtx {
            fs: self.fs.as_ref(),
            dirs: &self.dirs,
            config: &self.config,
            candidates: &self.candidates,
            manifests: &self.manifests,
            external: self.external.as_ref(),
        }
    }

    pub fn all_providers(&self) -> &AllProvidersIndex {
        &self.all_providers
    }

    pub fn name_index(&self) -> &NameIndex {
        &self.name_index
    }

    pub fn info_heap(&self) -> &InfoHeap {
        &self.info_heap
    }

    pub fn requires_heap(&self) -> &ResolvedRequiresHeap {
        &self.requires_heap
    }

    pub fn manifests(&self) -> &PackageManifestStore {
        &self.manifests
    }

    /// Parse and record a `package.json` observed at `path` (spec.md §4.3).
    pub fn observe_package_json(&self, path: Utf8PathBuf, contents: &str) {
        self.manifests.parse_and_add(path, contents);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::TestFileSystem;

    #[test]
    fn clear_pass_caches_drops_directory_listings_but_keeps_name_index() {
        let config = ResolverConfig::new("/r", ModuleSystemKind::Path);
        let state = ResolverState::with_filesystem(config, Box::new(TestFileSystem::new()));
        let m = crate::module_name::ModuleName::by_string("Foo");
        let f = crate::file_key::FileKey::SourceFile(Utf8PathBuf::from("/r/x.js"));
        state.name_index().remove_and_replace(&Default::default(), &[(m.clone(), f.clone())]);

        state.clear_pass_caches();

        assert_eq!(state.name_index().get(&m), Some(f));
    }
}
