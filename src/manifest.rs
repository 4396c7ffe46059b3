//! Package-manifest store (spec.md §4.3).

use std::sync::RwLock;

use camino::{Utf8Path, Utf8PathBuf};
use rustc_hash::FxHashMap;
use serde::Deserialize;

/// A parsed package manifest (`package.json`-equivalent).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageManifest {
    pub main: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Read-through view of parsed manifests, keyed by manifest path.
///
/// A manifest is parsed on first observation; parse errors are recorded too
/// so later changes can be detected (spec.md §4.3).
#[derive(Default)]
pub struct PackageManifestStore {
    manifests: RwLock<FxHashMap<Utf8PathBuf, Result<PackageManifest, ()>>>,
    package_dirs: RwLock<FxHashMap<String, Utf8PathBuf>>,
}

impl PackageManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Utf8Path) -> Option<Result<PackageManifest, ()>> {
        self.manifests.read().unwrap().get(path).cloned()
    }

    /// Record the outcome of parsing the manifest at `path`. If it parsed
    /// successfully and declares a `name`, also records the owning
    /// directory so `get_package_directory` can find it later.
    pub fn add_package_json(&self, path: Utf8PathBuf, outcome: Result<PackageManifest, ()>) {
        if let Ok(manifest) = &outcome {
            if let Some(name) = &manifest.name {
                if let Some(dir) = path.parent() {
                    self.package_dirs
                        .write()
                        .unwrap()
                        .insert(name.clone(), dir.to_path_buf());
                }
            }
        }
        self.manifests.write().unwrap().insert(path, outcome);
    }

    /// Parse `contents` at `path` and record the outcome, returning it.
    pub fn parse_and_add(&self, path: Utf8PathBuf, contents: &str) -> Result<PackageManifest, ()> {
        let outcome = serde_json::from_str::<PackageManifest>(contents).map_err(|_| ());
        self.add_package_json(path, outcome.clone());
        outcome
    }

    /// The directory of the package named `name`, if a manifest declaring
    /// that name has been observed (spec.md §4.6's "external lookup on the
    /// package-manifest store").
    pub fn get_package_directory(&self, name: &str) -> Option<Utf8PathBuf> {
        self.package_dirs.read().unwrap().get(name).cloned()
    }

    pub fn clear(&self) {
        self.manifests.write().unwrap().clear();
        self.package_dirs.write().unwrap().clear();
    }
}

/// spec.md §4.3's truth table: `true` iff dependents of this manifest must
/// be rechecked after the outcome transitions from `old` to `new`.
pub fn package_incompatible(
    old: Option<&Result<PackageManifest, ()>>,
    new: &Result<PackageManifest, ()>,
) -> bool {
    match (old, new) {
        (None, Ok(_)) => true,
        (None, Err(())) => false,
        (Some(Err(())), Ok(_)) => true,
        (Some(Err(())), Err(())) => false,
        (Some(Ok(a)), Ok(b)) => a != b,
        (Some(Ok(_)), Err(())) => true,
    }
}
