//! Provider election (spec.md §4.7).

use std::collections::{HashMap, HashSet};

use crate::errors::ErrorMessage;
use crate::file_key::FileKey;
use crate::module_name::ModuleName;

pub type ErrorMap = HashMap<FileKey, Vec<ErrorMessage>>;

/// `true` for files under a `__mocks__` directory (spec.md §4.6, glossary "Mock").
pub fn is_mock(file: &FileKey) -> bool {
    file.path()
        .is_some_and(|p| p.components().any(|c| c.as_str() == "__mocks__"))
}

fn sorted(candidates: &HashSet<FileKey>) -> Vec<FileKey> {
    let mut v: Vec<FileKey> = candidates.iter().cloned().collect();
    v.sort_by_key(FileKey::as_sort_key);
    v
}

fn push_duplicate(
    errmap: &mut ErrorMap,
    module: &ModuleName,
    provider: &FileKey,
    conflict: &FileKey,
) {
    errmap.entry(conflict.clone()).or_default().push(ErrorMessage::DuplicateProvider {
        module: module.clone(),
        provider: provider.clone(),
        conflict: conflict.clone(),
    });
}

/// The shared election helper (spec.md §4.7).
///
/// `definitions` and `implementations` must already be sorted
/// deterministically (lexicographic by file key string).
fn choose_with_duplicates(
    module: &ModuleName,
    definitions: &[FileKey],
    implementations: &[FileKey],
    fallback: impl FnOnce() -> FileKey,
    errmap: &mut ErrorMap,
) -> FileKey {
    if definitions.is_empty() && implementations.is_empty() {
        return fallback();
    }

    if definitions.is_empty() {
        let winner = implementations[0].clone();
        for dup in &implementations[1..] {
            push_duplicate(errmap, module, &winner, dup);
        }
        return winner;
    }

    if implementations.is_empty() {
        let winner = definitions[0].clone();
        for dup in &definitions[1..] {
            push_duplicate(errmap, module, &winner, dup);
        }
        return winner;
    }

    // Both non-empty: the definition shadows the implementation (I3).
    let winner = definitions[0].clone();
    let winning_impl = &implementations[0];
    for dup in &definitions[1..] {
        push_duplicate(errmap, module, &winner, dup);
    }
    for dup in implementations {
        if dup != winning_impl {
            push_duplicate(errmap, module, &winner, dup);
        }
    }
    winner
}

fn partition_by_declaration(
    files: &[FileKey],
    declaration_ext: &str,
) -> (Vec<FileKey>, Vec<FileKey>) {
    let mut definitions = Vec::new();
    let mut implementations = Vec::new();
    for f in files {
        if f.is_declaration(declaration_ext) {
            definitions.push(f.clone());
        } else {
            implementations.push(f.clone());
        }
    }
    (definitions, implementations)
}

/// Path-policy election: any ambiguity beyond identical-path duplicates is
/// a caller error. Empty candidate sets are an internal invariant violation
/// (spec.md §4.7, §9 open question: "Keep as fatal").
pub fn choose_provider_path(
    module: &ModuleName,
    candidates: &HashSet<FileKey>,
    declaration_ext: &str,
    errmap: &mut ErrorMap,
) -> FileKey {
    let all = sorted(candidates);
    assert!(
        !all.is_empty(),
        "choose_provider (Path) called with an empty candidate set for {module}"
    );
    let (definitions, implementations) = partition_by_declaration(&all, declaration_ext);
    choose_with_duplicates(module, &definitions, &implementations, || {
        unreachable!("both partitions empty despite a non-empty candidate set")
    }, errmap)
}

/// Flat-policy election: mocks are demoted below any non-mock provider.
pub fn choose_provider_flat(
    module: &ModuleName,
    candidates: &HashSet<FileKey>,
    declaration_ext: &str,
    errmap: &mut ErrorMap,
) -> FileKey {
    let all = sorted(candidates);
    assert!(
        !all.is_empty(),
        "choose_provider (Flat) called with an empty candidate set for {module}"
    );
    if all.len() == 1 {
        return all[0].clone();
    }

    let (mocks, non_mocks): (Vec<FileKey>, Vec<FileKey>) =
        all.iter().cloned().partition(is_mock);
    let (definitions, implementations) = partition_by_declaration(&non_mocks, declaration_ext);

    choose_with_duplicates(
        module,
        &definitions,
        &implementations,
        || mocks.first().cloned().expect("non-mocks empty implies mocks non-empty"),
        errmap,
    )
}
