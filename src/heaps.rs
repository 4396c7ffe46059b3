//! Persistent indices (spec.md §3, §6): `AllProvidersIndex`, `NameIndex`,
//! `InfoHeap`, `ResolvedRequires`.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use rustc_hash::FxHashMap;

use crate::file_key::FileKey;
use crate::module_name::ModuleName;

/// `ModuleName -> set<FileKey>`: every file that currently claims a name,
/// regardless of who wins election (spec.md §3).
#[derive(Default)]
pub struct AllProvidersIndex {
    providers: RwLock<HashMap<ModuleName, HashSet<FileKey>>>,
}

impl AllProvidersIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_provider(&self, file: FileKey, module: ModuleName) {
        self.providers
            .write()
            .unwrap()
            .entry(module)
            .or_default()
            .insert(file);
    }

    pub fn remove_provider(&self, file: &FileKey, module: &ModuleName) {
        let mut providers = self.providers.write().unwrap();
        if let Some(set) = providers.get_mut(module) {
            set.remove(file);
            if set.is_empty() {
                providers.remove(module);
            }
        }
    }

    pub fn find_in_all_providers(&self, module: &ModuleName) -> HashSet<FileKey> {
        self.providers
            .read()
            .unwrap()
            .get(module)
            .cloned()
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.read().unwrap().is_empty()
    }
}

/// `ModuleName -> FileKey`: the currently elected provider, updated only by
/// the commit step (spec.md §3, §4.8).
#[derive(Default)]
pub struct NameIndex {
    index: RwLock<FxHashMap<ModuleName, FileKey>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, module: &ModuleName) -> Option<FileKey> {
        self.index.read().unwrap().get(module).cloned()
    }

    pub fn contains(&self, module: &ModuleName) -> bool {
        self.index.read().unwrap().contains_key(module)
    }

    pub fn len(&self) -> usize {
        self.index.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply removals then replacements as a single transaction (spec.md §4.8 step 3).
    pub fn remove_and_replace(
        &self,
        to_remove: &HashSet<ModuleName>,
        to_replace: &[(ModuleName, FileKey)],
    ) {
        let mut index = self.index.write().unwrap();
        for module in to_remove {
            index.remove(module);
        }
        for (module, file) in to_replace {
            index.insert(module.clone(), file.clone());
        }
    }
}

/// Per-file metadata written at file introduction (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub module_name: ModuleName,
    pub checked: bool,
    pub parsed: bool,
}

/// `FileKey -> FileInfo`.
///
/// Writes go through a [`InfoHeapMutator`] scoped to one commit/introduction
/// batch (spec.md §3 "Lifecycles", §9), so that sharding-by-file during
/// parallel introduction (spec.md §5) is a type distinct from ad hoc shared access.
#[derive(Default)]
pub struct InfoHeap {
    info: RwLock<FxHashMap<FileKey, FileInfo>>,
}

impl InfoHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_info(&self, file: &FileKey) -> Option<FileInfo> {
        self.info.read().unwrap().get(file).cloned()
    }

    pub fn add_info(&self, file: FileKey, info: FileInfo) {
        self.info.write().unwrap().insert(file, info);
    }

    pub fn remove_info(&self, file: &FileKey) {
        self.info.write().unwrap().remove(file);
    }

    /// Borrow a mutator scoped to a single commit/introduction batch.
    pub fn mutator(&self) -> InfoHeapMutator<'_> {
        InfoHeapMutator { heap: self }
    }
}

/// A transactional handle through which a single batch writes `InfoHeap`
/// entries. Holding one doesn't take a lock for the handle's lifetime — each
/// write still serializes individually — but it documents (and at the call
/// site, enforces) that writes happen only within a scoped batch.
pub struct InfoHeapMutator<'a> {
    heap: &'a InfoHeap,
}

impl InfoHeapMutator<'_> {
    pub fn set(&self, file: FileKey, info: FileInfo) {
        self.heap.add_info(file, info);
    }

    pub fn remove(&self, file: &FileKey) {
        self.heap.remove_info(file);
    }
}

/// Per-file output of import resolution (spec.md §3).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedRequires {
    pub resolved_modules: FxHashMap<String, ModuleName>,
    pub phantom_dependents: HashSet<String>,
}

/// `FileKey -> ResolvedRequires`.
#[derive(Default)]
pub struct ResolvedRequiresHeap {
    requires: RwLock<FxHashMap<FileKey, ResolvedRequires>>,
}

impl ResolvedRequiresHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file: &FileKey) -> Option<ResolvedRequires> {
        self.requires.read().unwrap().get(file).cloned()
    }

    /// Returns `true` iff `requires` differs from the previously recorded
    /// value for `file` (spec.md §6: "did the content differ").
    pub fn add_resolved_requires(&self, file: FileKey, requires: ResolvedRequires) -> bool {
        let mut map = self.requires.write().unwrap();
        let changed = map.get(&file) != Some(&requires);
        map.insert(file, requires);
        changed
    }
}
