//! The Path (filesystem-walking) module system (spec.md §4.4).

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::ModuleSystemKind;
use crate::docblock::Docblock;
use crate::errors::{ErrorMessage, FatalResolutionError};
use crate::file_key::FileKey;
use crate::fs_probe::resolve_symlinks;
use crate::module_name::ModuleName;

use super::{ModuleSystem, ResolutionAccumulator, ResolveCtx};

/// Mimics node-style/filesystem-walking import resolution.
#[derive(Debug, Default)]
pub struct PathResolver;

impl ModuleSystem for PathResolver {
    fn kind(&self) -> ModuleSystemKind {
        ModuleSystemKind::Path
    }

    fn exported_module(&self, file: &FileKey, _docblock: &dyn Docblock, _ctx: &ResolveCtx) -> ModuleName {
        ModuleName::by_file(file.clone())
    }

    fn imported_module(
        &self,
        importer: &FileKey,
        reference: &str,
        ctx: &ResolveCtx,
        acc: &mut ResolutionAccumulator,
    ) -> Result<ModuleName, FatalResolutionError> {
        for candidate in ctx.candidates.generate(ctx.config, reference) {
            if let Some(file) = resolve_one(importer, &candidate, ctx, acc) {
                return Ok(ModuleName::by_file(file));
            }
        }
        Ok(ModuleName::by_string(reference))
    }
}

/// Resolve a single, already-chosen reference string against `importer`
/// (spec.md §4.4). Shared with the Flat system's "built-in Path resolution"
/// fallback step (spec.md §4.6).
pub(super) fn resolve_one(
    importer: &FileKey,
    reference: &str,
    ctx: &ResolveCtx,
    acc: &mut ResolutionAccumulator,
) -> Option<FileKey> {
    if ctx.config.is_relative_reference(reference) || ctx.config.is_absolute_reference(reference) {
        let dir = importer.path()?.parent()?;
        let p = normalize_path(&dir.join(reference));
        resolve_step_r(&p, ctx, acc)
    } else {
        resolve_node_walk(importer, reference, ctx, acc)
    }
}

/// Step N (spec.md §4.4): walk ancestor directories of the importer looking
/// for a node-modules-style container.
fn resolve_node_walk(
    importer: &FileKey,
    reference: &str,
    ctx: &ResolveCtx,
    acc: &mut ResolutionAccumulator,
) -> Option<FileKey> {
    let start = importer.path()?.parent()?;
    for ancestor in start.ancestors() {
        for dirname in &ctx.config.node_resolver_dirnames {
            let container = ancestor.join(dirname);
            if ctx.dirs.dir_exists(ctx.fs, &container) {
                let p = normalize_path(&container.join(reference));
                if let Some(file) = resolve_step_r(&p, ctx, acc) {
                    return Some(file);
                }
            }
        }
    }
    None
}

/// Step R (spec.md §4.4): resolve a single, already-normalized path.
fn resolve_step_r(p: &Utf8Path, ctx: &ResolveCtx, acc: &mut ResolutionAccumulator) -> Option<FileKey> {
    if p.as_str().ends_with(ctx.config.source_ext.as_str()) {
        return file_present(p, ctx, acc).then(|| make_file_key(p.to_path_buf()));
    }

    for ext in &ctx.config.module_file_exts {
        let candidate = Utf8PathBuf::from(format!("{p}{ext}"));
        if file_present(&candidate, ctx, acc) {
            return Some(make_file_key(candidate));
        }
    }

    if let Some(file) = resolve_manifest(&p.join("package.json"), ctx, acc) {
        return Some(file);
    }

    for ext in &ctx.config.module_file_exts {
        let candidate = p.join(format!("index{ext}"));
        if file_present(&candidate, ctx, acc) {
            return Some(make_file_key(candidate));
        }
    }

    None
}

/// Manifest resolution (spec.md §4.4b).
fn resolve_manifest(manifest_path: &Utf8Path, ctx: &ResolveCtx, acc: &mut ResolutionAccumulator) -> Option<FileKey> {
    let manifest_path = resolve_symlinks(ctx.fs, manifest_path);
    if !ctx.dirs.file_exists(ctx.fs, &manifest_path) || ctx.config.is_ignored(&manifest_path) {
        acc.record_path(manifest_path.as_str());
        return None;
    }

    let outcome = match ctx.manifests.get(&manifest_path) {
        Some(outcome) => outcome,
        None => {
            let relative = ctx.config.relative_to_root(&manifest_path);
            let error = if ctx.config.is_included(&manifest_path) {
                ErrorMessage::PackageHeapNotFound(relative)
            } else {
                ErrorMessage::ModuleOutsideRoot(relative)
            };
            acc.record_error(error);
            return None;
        }
    };

    let manifest = outcome.ok()?;
    let main = manifest.main?;
    let dir = manifest_path.parent().unwrap_or_else(|| Utf8Path::new(""));
    let path = normalize_path(&dir.join(main));

    if file_present(&path, ctx, acc) {
        return Some(make_file_key(path));
    }
    for ext in &ctx.config.module_file_exts {
        let candidate = Utf8PathBuf::from(format!("{path}{ext}"));
        if file_present(&candidate, ctx, acc) {
            return Some(make_file_key(candidate));
        }
    }
    for ext in &ctx.config.module_file_exts {
        let candidate = path.join(format!("index{ext}"));
        if file_present(&candidate, ctx, acc) {
            return Some(make_file_key(candidate));
        }
    }
    None
}

/// Shadow check (spec.md §4.4a): `P` is present if `P` or `P + declaration_ext`
/// exists. Every non-existent path looked up is recorded as a phantom dependent.
fn file_present(p: &Utf8Path, ctx: &ResolveCtx, acc: &mut ResolutionAccumulator) -> bool {
    let exists_here = ctx.dirs.file_exists(ctx.fs, p) && !ctx.config.is_ignored(p);
    if !exists_here {
        acc.record_path(p.as_str());
    }

    let declaration_path = Utf8PathBuf::from(format!("{p}{}", ctx.config.declaration_ext));
    let exists_declaration = ctx.dirs.file_exists(ctx.fs, &declaration_path) && !ctx.config.is_ignored(&declaration_path);
    if !exists_declaration {
        acc.record_path(declaration_path.as_str());
    }

    exists_here || exists_declaration
}

fn normalize_path(path: &Utf8Path) -> Utf8PathBuf {
    let is_absolute = path.is_absolute();
    let mut out: Vec<&str> = Vec::new();
    for component in path.as_str().split('/') {
        match component {
            "" | "." => {}
            ".." => match out.last() {
                Some(&last) if last != ".." => {
                    out.pop();
                }
                _ if !is_absolute => out.push(".."),
                _ => {}
            },
            other => out.push(other),
        }
    }
    let mut result = String::new();
    if is_absolute {
        result.push('/');
    }
    result.push_str(&out.join("/"));
    Utf8PathBuf::from(result)
}

fn make_file_key(path: Utf8PathBuf) -> FileKey {
    if path.extension() == Some("json") {
        FileKey::JsonFile(path)
    } else {
        FileKey::SourceFile(path)
    }
}
