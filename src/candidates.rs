//! Name-candidate generator (spec.md §4.2).

use std::sync::Mutex;

use rustc_hash::FxHashMap;

use crate::config::{expand_project_root, Mapper, ResolverConfig};

/// Expands a raw module reference into an ordered list of rewritten
/// candidates, memoized by the raw reference.
///
/// Never performs I/O, so it may be locked freely without violating the
/// "no lock held during I/O" rule of spec.md §5.
#[derive(Default)]
pub struct CandidateGenerator {
    memo: Mutex<FxHashMap<String, Vec<String>>>,
}

impl CandidateGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw `R`, then one rewritten candidate per matching mapper (in
    /// configured order), each with `<<PROJECT_ROOT>>` expanded.
    pub fn generate(&self, config: &ResolverConfig, reference: &str) -> Vec<String> {
        if let Some(cached) = self.memo.lock().unwrap().get(reference) {
            return cached.clone();
        }

        let mut candidates = vec![reference.to_string()];
        for mapper in &config.module_name_mappers {
            if let Some(candidate) = apply_mapper(mapper, reference, config.root.as_str()) {
                candidates.push(candidate);
            }
        }

        self.memo
            .lock()
            .unwrap()
            .insert(reference.to_string(), candidates.clone());
        candidates
    }
}

/// Returns `None` if the mapper's regex doesn't match, or if applying it
/// leaves the reference unchanged (spec.md §4.2: "A mapper that does not
/// change R contributes nothing").
fn apply_mapper(mapper: &Mapper, reference: &str, root: &str) -> Option<String> {
    if !mapper.regex.is_match(reference) {
        return None;
    }
    let rewritten = mapper
        .regex
        .replace_all(reference, mapper.template.as_str())
        .into_owned();
    if rewritten == reference {
        return None;
    }
    Some(expand_project_root(&rewritten, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModuleSystemKind;

    /// Scenario 5 from spec.md §8: mapper `(^~/(.*)$, <<PROJECT_ROOT>>/src/$1)`.
    #[test]
    fn name_mapper_scenario() {
        let mut config = ResolverConfig::new("/proj", ModuleSystemKind::Path);
        config
            .module_name_mappers
            .push(Mapper::new(r"^~/(.*)$", "<<PROJECT_ROOT>>/src/$1").unwrap());

        let gen = CandidateGenerator::new();
        let candidates = gen.generate(&config, "~/utils/x");
        assert_eq!(candidates, vec!["~/utils/x", "/proj/src/utils/x"]);
    }

    #[test]
    fn non_matching_mapper_contributes_nothing() {
        let mut config = ResolverConfig::new("/proj", ModuleSystemKind::Path);
        config
            .module_name_mappers
            .push(Mapper::new(r"^~/(.*)$", "<<PROJECT_ROOT>>/src/$1").unwrap());

        let gen = CandidateGenerator::new();
        let candidates = gen.generate(&config, "./a");
        assert_eq!(candidates, vec!["./a"]);
    }

    #[test]
    fn results_are_memoized() {
        let config = ResolverConfig::new("/proj", ModuleSystemKind::Path);
        let gen = CandidateGenerator::new();
        let first = gen.generate(&config, "foo");
        let second = gen.generate(&config, "foo");
        assert_eq!(first, second);
    }

    #[test]
    fn identity_mapper_contributes_nothing() {
        let mut config = ResolverConfig::new("/proj", ModuleSystemKind::Path);
        config
            .module_name_mappers
            .push(Mapper::new(r"^foo$", "foo").unwrap());
        let gen = CandidateGenerator::new();
        assert_eq!(gen.generate(&config, "foo"), vec!["foo"]);
    }
}
