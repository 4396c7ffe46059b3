//! External interfaces (spec.md §6): configuration consumed by the core.

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;

/// Which pluggable module system (spec.md §4.4/§4.6) is in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleSystemKind {
    Path,
    Flat,
}

/// A configured rewrite rule: reference string -> replacement template.
///
/// The template may embed the `<<PROJECT_ROOT>>` sentinel, expanded by
/// literal split/join against the configured root (spec.md §4.2, §6) so that
/// backreference-looking text inside the root path is never re-interpreted
/// by the regex engine.
#[derive(Debug, Clone)]
pub struct Mapper {
    pub regex: Regex,
    pub template: String,
}

impl Mapper {
    pub fn new(pattern: &str, template: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
            template: template.into(),
        })
    }
}

pub const PROJECT_ROOT_SENTINEL: &str = "<<PROJECT_ROOT>>";

/// Replace `PROJECT_ROOT_SENTINEL` in `s` by literal split-and-join, never by
/// regex substitution (spec.md §4.2, §6's "Token expansion").
pub fn expand_project_root(s: &str, root: &str) -> String {
    s.split(PROJECT_ROOT_SENTINEL).collect::<Vec<_>>().join(root)
}

/// Configuration consumed by the resolver (spec.md §6).
///
/// Built once by the caller; the core never mutates it after construction.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub module_system: ModuleSystemKind,
    pub module_name_mappers: Vec<Mapper>,
    pub module_resolver: Option<Utf8PathBuf>,

    pub haste_use_name_reducers: bool,
    pub haste_name_reducers: Vec<Mapper>,
    pub haste_paths_whitelist: Vec<Regex>,
    pub haste_paths_blacklist: Vec<Regex>,

    pub node_resolver_dirnames: Vec<String>,
    /// Ordered set of extensions tried during resolution; order is
    /// observable (spec.md §4.4: "Ordering is significant").
    pub module_file_exts: Vec<String>,
    /// The language's single recognized source extension (spec.md §4.4 step
    /// R): a reference already ending in this extension is resolved as a
    /// literal filename rather than by appending `module_file_exts`.
    pub source_ext: String,

    pub root: Utf8PathBuf,
    pub declaration_ext: String,
    ignore_patterns: Vec<Regex>,
    include_patterns: Vec<Regex>,
    pub absolute_path_regexp: Regex,
    pub current_dir_name: String,
    pub parent_dir_name: String,
}

impl ResolverConfig {
    pub fn new(root: impl Into<Utf8PathBuf>, module_system: ModuleSystemKind) -> Self {
        Self {
            module_system,
            module_name_mappers: Vec::new(),
            module_resolver: None,
            haste_use_name_reducers: false,
            haste_name_reducers: Vec::new(),
            haste_paths_whitelist: Vec::new(),
            haste_paths_blacklist: Vec::new(),
            node_resolver_dirnames: vec!["node_modules".to_string()],
            module_file_exts: vec![".js".to_string(), ".json".to_string()],
            source_ext: ".js".to_string(),
            root: root.into(),
            declaration_ext: ".flow".to_string(),
            ignore_patterns: Vec::new(),
            include_patterns: Vec::new(),
            absolute_path_regexp: Regex::new(r"^/").expect("static regex is valid"),
            current_dir_name: ".".to_string(),
            parent_dir_name: "..".to_string(),
        }
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_include_patterns(mut self, patterns: Vec<Regex>) -> Self {
        self.include_patterns = patterns;
        self
    }

    /// `true` when `reference` looks absolute per the configured regex
    /// (e.g. `/^\//` for POSIX-style absolute references).
    pub fn is_absolute_reference(&self, reference: &str) -> bool {
        self.absolute_path_regexp.is_match(reference)
    }

    /// `true` when `reference` is a relative path reference
    /// (`./foo`, `../foo`).
    pub fn is_relative_reference(&self, reference: &str) -> bool {
        let rel_self = format!("{}/", self.current_dir_name);
        let rel_parent = format!("{}/", self.parent_dir_name);
        reference.starts_with(&rel_self) || reference.starts_with(&rel_parent)
    }

    pub fn is_ignored(&self, path: &Utf8Path) -> bool {
        self.ignore_patterns.iter().any(|re| re.is_match(path.as_str()))
    }

    /// `true` when `path` is within scope for error reporting (spec.md
    /// §4.4b): inside the project root, or explicitly on the included list.
    pub fn is_included(&self, path: &Utf8Path) -> bool {
        path.starts_with(&self.root) || self.include_patterns.iter().any(|re| re.is_match(path.as_str()))
    }

    /// Strip a trailing declaration extension, if present.
    pub fn chop_declaration_ext<'a>(&self, s: &'a str) -> &'a str {
        s.strip_suffix(self.declaration_ext.as_str()).unwrap_or(s)
    }

    pub fn is_declaration_file(&self, path: &Utf8Path) -> bool {
        path.as_str().ends_with(self.declaration_ext.as_str())
    }

    /// Path relative to `root`, for error messages that must not leak
    /// absolute filesystem layout (spec.md §4.4b's "relative-to-root").
    pub fn relative_to_root<'a>(&self, path: &'a Utf8Path) -> String {
        path.strip_prefix(&self.root)
            .map(|p| p.as_str().to_string())
            .unwrap_or_else(|_| path.as_str().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_expansion_is_literal_not_regex() {
        let expanded = expand_project_root("<<PROJECT_ROOT>>/src/$1", r"C:\proj");
        assert_eq!(expanded, "C:\\proj/src/$1");
    }

    #[test]
    fn relative_reference_detection() {
        let cfg = ResolverConfig::new("/proj", ModuleSystemKind::Path);
        assert!(cfg.is_relative_reference("./a"));
        assert!(cfg.is_relative_reference("../a"));
        assert!(!cfg.is_relative_reference("a"));
    }
}
