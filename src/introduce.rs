//! File introduction / retirement (spec.md §4.9).

use crate::docblock::Docblock;
use crate::file_key::FileKey;
use crate::heaps::{AllProvidersIndex, FileInfo, InfoHeap, NameIndex};
use crate::module_name::ModuleName;
use crate::resolver::{eponymous, ModuleSystem, ResolveCtx};

/// `true` iff an unparsed file should still be treated as checked — a
/// lib/declaration file whose types are trusted without being parsed for
/// requires (spec.md §4.9).
fn is_lib_or_declaration(file: &FileKey, declaration_ext: &str) -> bool {
    matches!(file, FileKey::LibFile(_)) || file.is_declaration(declaration_ext)
}

/// Introduce a batch of files, writing their `InfoHeap` entries and
/// registering both their named and eponymous claims in `AllProvidersIndex`.
///
/// Returns the flattened `(ModuleName, Option<FileKey>)` list that becomes
/// the dirty input to the next [`crate::commit::commit`].
pub fn introduce(
    system: &dyn ModuleSystem,
    parsed: &[(FileKey, &dyn Docblock)],
    unparsed: &[(FileKey, &dyn Docblock)],
    force_check: bool,
    ctx: &ResolveCtx,
    all_providers: &AllProvidersIndex,
    info_heap: &InfoHeap,
    name_index: &NameIndex,
) -> Vec<(ModuleName, Option<FileKey>)> {
    let mutator = info_heap.mutator();
    let mut dirty = Vec::new();

    for (file, docblock, checked) in parsed
        .iter()
        .map(|(f, d)| (f, *d, force_check || d.is_flow()))
        .chain(
            unparsed
                .iter()
                .map(|(f, d)| (f, *d, force_check || is_lib_or_declaration(f, &ctx.config.declaration_ext))),
        )
    {
        let module_name = system.exported_module(file, docblock, ctx);
        let eponymous_name = eponymous(file, &ctx.config.declaration_ext);

        mutator.set(
            file.clone(),
            FileInfo {
                module_name: module_name.clone(),
                checked,
                parsed: parsed.iter().any(|(f, _)| f == file),
            },
        );

        let current_provider = name_index.get(&module_name);
        all_providers.add_provider(file.clone(), module_name.clone());
        dirty.push((module_name.clone(), current_provider));

        if eponymous_name != module_name {
            let current_provider_eponymous = name_index.get(&eponymous_name);
            all_providers.add_provider(file.clone(), eponymous_name.clone());
            dirty.push((eponymous_name, current_provider_eponymous));
        }
    }

    dirty
}

/// Retire a batch of files, unregistering their claims from
/// `AllProvidersIndex` and returning the dirty list for the next commit.
///
/// Each file's exported module name is read back from its (still-present)
/// `InfoHeap` entry rather than recomputed, since a retired file may no
/// longer be readable.
pub fn retire(
    files: &[FileKey],
    declaration_ext: &str,
    all_providers: &AllProvidersIndex,
    info_heap: &InfoHeap,
    name_index: &NameIndex,
) -> Vec<(ModuleName, Option<FileKey>)> {
    let mut dirty = Vec::new();

    for file in files {
        let Some(info) = info_heap.get_info(file) else {
            continue;
        };
        let module_name = info.module_name;
        let eponymous_name = eponymous(file, declaration_ext);

        all_providers.remove_provider(file, &module_name);
        dirty.push((module_name.clone(), prev_if_current(name_index, &module_name, file)));

        if eponymous_name != module_name {
            all_providers.remove_provider(file, &eponymous_name);
            dirty.push((eponymous_name.clone(), prev_if_current(name_index, &eponymous_name, file)));
        }

        info_heap.remove_info(file);
    }

    dirty
}

fn prev_if_current(name_index: &NameIndex, module: &ModuleName, file: &FileKey) -> Option<FileKey> {
    match name_index.get(module) {
        Some(ref current) if current == file => Some(file.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    use crate::candidates::CandidateGenerator;
    use crate::config::{ModuleSystemKind, ResolverConfig};
    use crate::docblock::EmptyDocblock;
    use crate::fs::TestFileSystem;
    use crate::fs_probe::DirectoryCache;
    use crate::manifest::PackageManifestStore;
    use crate::resolver::PathResolver;

    fn file(p: &str) -> FileKey {
        FileKey::SourceFile(Utf8PathBuf::from(p))
    }

    #[test]
    fn introduce_registers_eponymous_and_named_claims() {
        let fs = TestFileSystem::new();
        let dirs = DirectoryCache::new();
        let config = ResolverConfig::new("/r", ModuleSystemKind::Path);
        let candidates = CandidateGenerator::new();
        let manifests = PackageManifestStore::new();
        let c = ResolveCtx {
            fs: &fs,
            dirs: &dirs,
            config: &config,
            candidates: &candidates,
            manifests: &manifests,
            external: None,
        };

        let system = PathResolver;
        let all_providers = AllProvidersIndex::new();
        let info_heap = InfoHeap::new();
        let name_index = NameIndex::new();
        let docblock = EmptyDocblock;

        let f = file("/r/a.js");
        let dirty = introduce(
            &system,
            &[(f.clone(), &docblock)],
            &[],
            false,
            &c,
            &all_providers,
            &info_heap,
            &name_index,
        );

        // Path's exported_module is always ByFile(f), same as eponymous(f) for
        // a non-declaration file, so only one claim is registered.
        assert_eq!(dirty, vec![(ModuleName::by_file(f.clone()), None)]);
        assert_eq!(all_providers.find_in_all_providers(&ModuleName::by_file(f.clone())).len(), 1);
        assert!(info_heap.get_info(&f).is_some());
    }

    #[test]
    fn retire_unregisters_claims_and_clears_info() {
        let all_providers = AllProvidersIndex::new();
        let info_heap = InfoHeap::new();
        let name_index = NameIndex::new();

        let f = file("/r/a.js");
        let module = ModuleName::by_file(f.clone());
        info_heap.add_info(
            f.clone(),
            FileInfo {
                module_name: module.clone(),
                checked: true,
                parsed: true,
            },
        );
        all_providers.add_provider(f.clone(), module.clone());
        name_index.remove_and_replace(&Default::default(), &[(module.clone(), f.clone())]);

        let dirty = retire(&[f.clone()], ".flow", &all_providers, &info_heap, &name_index);

        assert_eq!(dirty, vec![(module.clone(), Some(f.clone()))]);
        assert!(all_providers.find_in_all_providers(&module).is_empty());
        assert!(info_heap.get_info(&f).is_none());
    }
}
