//! Incremental commit (spec.md §4.8).

use std::collections::HashSet;

use crate::config::ModuleSystemKind;
use crate::election::{choose_provider_flat, choose_provider_path, ErrorMap};
use crate::file_key::FileKey;
use crate::heaps::{AllProvidersIndex, NameIndex};
use crate::module_name::ModuleName;

/// The output of a commit (spec.md §4.8 step 4).
pub struct CommitResult {
    /// Newly- or re-elected providers (deduplicated would be reasonable, but
    /// the spec defines `providers` as an append-only list of winners).
    pub providers: Vec<FileKey>,
    /// Every module whose provider changed, or whose sole provider's
    /// contents changed without a re-election.
    pub changed: HashSet<ModuleName>,
    /// Per-file duplicate-provider (and any other per-module) errors raised
    /// during this commit's elections.
    pub errmap: ErrorMap,
}

fn choose_provider(
    module_system: ModuleSystemKind,
    module: &ModuleName,
    candidates: &HashSet<FileKey>,
    declaration_ext: &str,
    errmap: &mut ErrorMap,
) -> FileKey {
    match module_system {
        ModuleSystemKind::Path => choose_provider_path(module, candidates, declaration_ext, errmap),
        ModuleSystemKind::Flat => choose_provider_flat(module, candidates, declaration_ext, errmap),
    }
}

/// Reconcile `name_index` against `dirty_modules`, given the set of files
/// that changed contents this pass.
///
/// Preconditions (caller's responsibility, spec.md §4.8): every file in
/// `new_or_changed` already has an `InfoHeap` entry; every module not in
/// `dirty_modules` with a provider in `name_index` remains correct; every
/// module whose previous provider was removed appears in `dirty_modules`
/// with `prev = None` or a now-stale file.
pub fn commit(
    all_providers: &AllProvidersIndex,
    name_index: &NameIndex,
    module_system: ModuleSystemKind,
    declaration_ext: &str,
    dirty_modules: Vec<(ModuleName, Option<FileKey>)>,
    new_or_changed: &HashSet<FileKey>,
) -> CommitResult {
    let _span = tracing::trace_span!("commit", dirty = dirty_modules.len()).entered();

    let mut to_remove = HashSet::new();
    let mut to_replace = Vec::new();
    let mut providers = Vec::new();
    let mut errmap = ErrorMap::new();
    let mut changed = HashSet::new();

    for (module, prev) in dirty_modules {
        let candidates = all_providers.find_in_all_providers(&module);

        if candidates.is_empty() {
            to_remove.insert(module.clone());
            changed.insert(module);
            continue;
        }

        for f in &candidates {
            errmap.entry(f.clone()).or_default();
        }

        let winner = choose_provider(module_system, &module, &candidates, declaration_ext, &mut errmap);

        match prev {
            Some(ref f) if *f == winner => {
                if new_or_changed.contains(&winner) {
                    changed.insert(module);
                }
            }
            _ => {
                providers.push(winner.clone());
                to_replace.push((module.clone(), winner));
                changed.insert(module);
            }
        }
    }

    name_index.remove_and_replace(&to_remove, &to_replace);

    CommitResult {
        providers,
        changed,
        errmap,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn file(p: &str) -> FileKey {
        FileKey::SourceFile(Utf8PathBuf::from(p))
    }

    /// Idempotence: empty dirty input, empty changed-files set, is a no-op.
    #[test]
    fn empty_commit_is_a_noop() {
        let all_providers = AllProvidersIndex::new();
        let name_index = NameIndex::new();
        let result = commit(
            &all_providers,
            &name_index,
            ModuleSystemKind::Flat,
            ".flow",
            Vec::new(),
            &HashSet::new(),
        );
        assert!(result.providers.is_empty());
        assert!(result.changed.is_empty());
        assert!(name_index.is_empty());
    }

    /// Scenario 6: incremental re-election after a provider's file is deleted.
    #[test]
    fn reelection_after_deletion() {
        let all_providers = AllProvidersIndex::new();
        let name_index = NameIndex::new();
        let foo = ModuleName::by_string("Foo");

        // Before: Foo -> x.js in NameIndex; AllProvidersIndex[Foo] = {x.js, y.js}.
        name_index.remove_and_replace(&HashSet::new(), &[(foo.clone(), file("/r/x.js"))]);
        all_providers.add_provider(file("/r/y.js"), foo.clone());
        // x.js was deleted: its claim is retired from AllProvidersIndex before commit runs.

        let dirty = vec![(foo.clone(), Some(file("/r/x.js")))];
        let result = commit(
            &all_providers,
            &name_index,
            ModuleSystemKind::Flat,
            ".flow",
            dirty,
            &HashSet::new(),
        );

        assert_eq!(result.providers, vec![file("/r/y.js")]);
        assert!(result.changed.contains(&foo));
        assert_eq!(name_index.get(&foo), Some(file("/r/y.js")));
        assert_eq!(result.errmap.get(&file("/r/y.js")), Some(&Vec::new()));
    }

    #[test]
    fn module_with_no_providers_is_removed() {
        let all_providers = AllProvidersIndex::new();
        let name_index = NameIndex::new();
        let foo = ModuleName::by_string("Foo");
        name_index.remove_and_replace(&HashSet::new(), &[(foo.clone(), file("/r/x.js"))]);

        let dirty = vec![(foo.clone(), Some(file("/r/x.js")))];
        let result = commit(
            &all_providers,
            &name_index,
            ModuleSystemKind::Flat,
            ".flow",
            dirty,
            &HashSet::new(),
        );

        assert!(result.changed.contains(&foo));
        assert_eq!(name_index.get(&foo), None);
    }

    #[test]
    fn unchanged_provider_with_changed_contents_is_reported_changed() {
        let all_providers = AllProvidersIndex::new();
        let name_index = NameIndex::new();
        let foo = ModuleName::by_string("Foo");
        all_providers.add_provider(file("/r/x.js"), foo.clone());
        name_index.remove_and_replace(&HashSet::new(), &[(foo.clone(), file("/r/x.js"))]);

        let mut new_or_changed = HashSet::new();
        new_or_changed.insert(file("/r/x.js"));

        let dirty = vec![(foo.clone(), Some(file("/r/x.js")))];
        let result = commit(
            &all_providers,
            &name_index,
            ModuleSystemKind::Flat,
            ".flow",
            dirty,
            &new_or_changed,
        );

        assert!(result.changed.contains(&foo));
        assert!(result.providers.is_empty());
    }

    #[test]
    fn unchanged_provider_with_unchanged_contents_is_not_reported() {
        let all_providers = AllProvidersIndex::new();
        let name_index = NameIndex::new();
        let foo = ModuleName::by_string("Foo");
        all_providers.add_provider(file("/r/x.js"), foo.clone());
        name_index.remove_and_replace(&HashSet::new(), &[(foo.clone(), file("/r/x.js"))]);

        let dirty = vec![(foo.clone(), Some(file("/r/x.js")))];
        let result = commit(
            &all_providers,
            &name_index,
            ModuleSystemKind::Flat,
            ".flow",
            dirty,
            &HashSet::new(),
        );

        assert!(!result.changed.contains(&foo));
    }
}
