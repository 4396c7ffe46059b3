//! The Flat (mock-aware, Haste-style) module system (spec.md §4.6).

use camino::Utf8PathBuf;

use crate::config::{expand_project_root, ModuleSystemKind};
use crate::docblock::Docblock;
use crate::election::is_mock;
use crate::errors::FatalResolutionError;
use crate::file_key::FileKey;
use crate::module_name::ModuleName;

use super::path_system::resolve_one;
use super::{ModuleSystem, ResolutionAccumulator, ResolveCtx};

/// Mock-aware, name-reducer/`providesModule`-driven module system.
#[derive(Debug, Default)]
pub struct FlatResolver;

impl ModuleSystem for FlatResolver {
    fn kind(&self) -> ModuleSystemKind {
        ModuleSystemKind::Flat
    }

    fn exported_module(&self, file: &FileKey, docblock: &dyn Docblock, ctx: &ResolveCtx) -> ModuleName {
        if matches!(file, FileKey::LibFile(_) | FileKey::ResourceFile(_) | FileKey::JsonFile(_)) {
            return ModuleName::by_file(file.clone());
        }

        if is_mock(file) {
            let short_name = file
                .path()
                .and_then(|p| p.file_stem())
                .unwrap_or_default();
            return ModuleName::by_string(short_name);
        }

        if ctx.config.haste_use_name_reducers {
            if let Some(path) = file.path() {
                let matches_whitelist = ctx.config.haste_paths_whitelist.iter().any(|re| re.is_match(path.as_str()));
                let matches_blacklist = ctx.config.haste_paths_blacklist.iter().any(|re| re.is_match(path.as_str()));
                if matches_whitelist && !matches_blacklist {
                    for reducer in &ctx.config.haste_name_reducers {
                        if reducer.regex.is_match(path.as_str()) {
                            let rewritten = reducer
                                .regex
                                .replace(path.as_str(), reducer.template.as_str())
                                .into_owned();
                            let expanded = expand_project_root(&rewritten, ctx.config.root.as_str());
                            return ModuleName::by_string(expanded);
                        }
                    }
                }
            }
        }

        if let Some(name) = docblock.provides_module() {
            return ModuleName::by_string(name);
        }

        ModuleName::by_file(file.clone())
    }

    fn imported_module(
        &self,
        importer: &FileKey,
        reference: &str,
        ctx: &ResolveCtx,
        acc: &mut ResolutionAccumulator,
    ) -> Result<ModuleName, FatalResolutionError> {
        let candidates = ctx.candidates.generate(ctx.config, reference);
        let chosen = candidates.first().cloned().unwrap_or_else(|| reference.to_string());

        if let Some(external) = ctx.external {
            let importer_key = importer.to_string();
            if let Some(resolved) = external.resolve(&chosen, &importer_key)? {
                return Ok(ModuleName::by_file(make_file_key(resolved)));
            }
        }

        if let Some(file) = resolve_one(importer, &chosen, ctx, acc) {
            return Ok(ModuleName::by_file(file));
        }

        if let Some((pkg, rest)) = chosen.split_once('/') {
            if let Some(pkg_dir) = ctx.manifests.get_package_directory(pkg) {
                let relative = format!("./{rest}");
                let rooted = FileKey::SourceFile(pkg_dir.join("__package__"));
                if let Some(file) = resolve_one(&rooted, &relative, ctx, acc) {
                    return Ok(ModuleName::by_file(file));
                }
            }
        }

        Ok(ModuleName::by_string(chosen))
    }
}

fn make_file_key(path: Utf8PathBuf) -> FileKey {
    if path.extension() == Some("json") {
        FileKey::JsonFile(path)
    } else {
        FileKey::SourceFile(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidates::CandidateGenerator;
    use crate::config::{Mapper, ResolverConfig};
    use crate::docblock::StubDocblock;
    use crate::fs::TestFileSystem;
    use crate::fs_probe::DirectoryCache;
    use crate::manifest::PackageManifestStore;

    fn file(p: &str) -> FileKey {
        FileKey::SourceFile(Utf8PathBuf::from(p))
    }

    fn ctx<'a>(
        fs: &'a TestFileSystem,
        dirs: &'a DirectoryCache,
        config: &'a ResolverConfig,
        candidates: &'a CandidateGenerator,
        manifests: &'a PackageManifestStore,
    ) -> ResolveCtx<'a> {
        ResolveCtx {
            fs,
            dirs,
            config,
            candidates,
            manifests,
            external: None,
        }
    }

    #[test]
    fn mock_file_gets_short_name() {
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let fs = TestFileSystem::new();
        let resolver = FlatResolver;
        let docblock = StubDocblock::default();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);

        let f = file("/r/__mocks__/Foo.js");
        assert_eq!(
            resolver.exported_module(&f, &docblock, &c),
            ModuleName::by_string("Foo")
        );
    }

    #[test]
    fn provides_module_pragma_wins_over_byfile() {
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let docblock = StubDocblock {
            provides_module: Some("Bar".to_string()),
            ..Default::default()
        };

        let f = file("/r/a.js");
        assert_eq!(
            resolver.exported_module(&f, &docblock, &c),
            ModuleName::by_string("Bar")
        );
    }

    #[test]
    fn plain_file_without_pragma_is_byfile() {
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let docblock = StubDocblock::default();

        let f = file("/r/a.js");
        assert_eq!(resolver.exported_module(&f, &docblock, &c), ModuleName::by_file(f));
    }

    #[test]
    fn resource_file_is_always_byfile_even_with_pragma() {
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let docblock = StubDocblock {
            provides_module: Some("Bar".to_string()),
            ..Default::default()
        };

        let f = FileKey::ResourceFile(Utf8PathBuf::from("/r/logo.png"));
        assert_eq!(resolver.exported_module(&f, &docblock, &c), ModuleName::by_file(f));
    }

    #[test]
    fn name_reducer_applies_when_whitelisted() {
        let mut config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        config.haste_use_name_reducers = true;
        config.haste_paths_whitelist = vec![regex::Regex::new(r"^/r/haste/").unwrap()];
        config.haste_name_reducers = vec![Mapper::new(r"^/r/haste/(.*)\.js$", "$1").unwrap()];
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let docblock = StubDocblock::default();

        let f = file("/r/haste/Widget.js");
        assert_eq!(
            resolver.exported_module(&f, &docblock, &c),
            ModuleName::by_string("Widget")
        );
    }

    #[test]
    fn blacklist_overrides_whitelist() {
        let mut config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        config.haste_use_name_reducers = true;
        config.haste_paths_whitelist = vec![regex::Regex::new(r"^/r/haste/").unwrap()];
        config.haste_paths_blacklist = vec![regex::Regex::new(r"__tests__").unwrap()];
        config.haste_name_reducers = vec![Mapper::new(r"^/r/haste/(.*)\.js$", "$1").unwrap()];
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let docblock = StubDocblock::default();

        let f = file("/r/haste/__tests__/Widget.js");
        assert_eq!(resolver.exported_module(&f, &docblock, &c), ModuleName::by_file(f));
    }

    #[test]
    fn import_falls_back_to_builtin_path_resolution() {
        let fs = TestFileSystem::new();
        fs.write_file("/r/a.js", "");
        fs.write_file("/r/b.js", "");
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let importer = file("/r/b.js");
        let mut acc = ResolutionAccumulator::new();

        let module = resolver.imported_module(&importer, "./a", &c, &mut acc).unwrap();
        assert_eq!(module, ModuleName::by_file(file("/r/a.js")));
    }

    #[test]
    fn unresolved_import_yields_dangling_name_of_first_candidate() {
        let fs = TestFileSystem::new();
        let config = ResolverConfig::new("/r", ModuleSystemKind::Flat);
        let dirs = DirectoryCache::new();
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ctx(&fs, &dirs, &config, &candidates, &manifests);
        let resolver = FlatResolver;
        let importer = file("/r/b.js");
        let mut acc = ResolutionAccumulator::new();

        let module = resolver.imported_module(&importer, "Missing", &c, &mut acc).unwrap();
        assert_eq!(module, ModuleName::by_string("Missing"));
    }
}
