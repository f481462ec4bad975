#![forbid(unsafe_code)]

//! Scope-aware catalog of active rule-set bindings
//!
//! The registry tracks two things: the known catalog (rule sets registered
//! under a logical name, not necessarily active) and the active bindings
//! (rule set + translator adapter, bounded by a scope). Enable is idempotent
//! per parser id; disable succeeds when the disable scope is the same as or
//! encloses the enable scope.

use crate::error::LoadError;
use crate::registry::{CachingLoader, ResolveDirs};
use crate::rules::RuleSet;
use crate::translate::{RuleSetAdapter, TranslatorList, UnitTranslator};
use crate::types::{ParserId, Scope};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

struct ActiveBinding {
    scope: Scope,
    translator: Arc<dyn UnitTranslator>,
}

/// Registry of known and active parsers
pub struct ParserRegistry {
    loader: CachingLoader,
    known: Mutex<HashMap<String, Arc<RuleSet>>>,
    active: Mutex<HashMap<ParserId, ActiveBinding>>,
    step_list: Arc<TranslatorList>,
    build_list: Arc<TranslatorList>,
}

impl ParserRegistry {
    pub fn new(
        loader: CachingLoader,
        step_list: Arc<TranslatorList>,
        build_list: Arc<TranslatorList>,
    ) -> Self {
        ParserRegistry {
            loader,
            known: Mutex::new(HashMap::new()),
            active: Mutex::new(HashMap::new()),
            step_list,
            build_list,
        }
    }

    pub fn loader(&self) -> &CachingLoader {
        &self.loader
    }

    /// Activates a parser at the given scope.
    ///
    /// Name ids resolve against the known catalog; resource and file ids go
    /// through the loader, with relative file paths anchored per `dirs`.
    /// Re-enabling an already-active id is a no-op regardless of the
    /// requested scope.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` when the parser cannot be resolved; the active
    /// bindings are left unchanged.
    pub fn enable(&self, id: &ParserId, scope: Scope, dirs: &ResolveDirs) -> Result<(), LoadError> {
        let mut active = lock(&self.active);
        if active.contains_key(id) {
            debug!(target: "logsieve::registry", "Parser {} already enabled", id);
            return Ok(());
        }

        let rule_set = match id {
            ParserId::Name(name) => lock(&self.known).get(name).cloned().ok_or_else(|| {
                LoadError::NotFound(format!("parser '{}' is not in the known catalog", name))
            })?,
            _ => self.loader.load(id, scope, dirs)?,
        };

        info!(
            target: "logsieve::registry",
            "Enabling parser '{}' at {} scope",
            rule_set.name(),
            scope
        );
        let translator: Arc<dyn UnitTranslator> = Arc::new(RuleSetAdapter::new(rule_set));
        self.list_for(scope).register(translator.clone());
        active.insert(id.clone(), ActiveBinding { scope, translator });
        Ok(())
    }

    /// Deactivates a parser. Returns true when a binding was removed.
    ///
    /// A BUILD-scope disable removes the binding regardless of the scope it
    /// was enabled under; a STEP-scope disable only removes STEP bindings.
    pub fn disable(&self, id: &ParserId, scope: Scope) -> bool {
        let mut active = lock(&self.active);
        let enabled_scope = match active.get(id) {
            Some(binding) => binding.scope,
            None => {
                debug!(target: "logsieve::registry", "Parser {} is not enabled", id);
                return false;
            }
        };
        if !scope.encloses(enabled_scope) {
            debug!(
                target: "logsieve::registry",
                "Not disabling {}: {} scope does not enclose {}",
                id, scope, enabled_scope
            );
            return false;
        }
        if let Some(binding) = active.remove(id) {
            self.list_for(binding.scope).unregister(&binding.translator);
            info!(target: "logsieve::registry", "Disabled parser {}", id);
        }
        true
    }

    /// Adds a rule set to the known catalog. Registering a name twice
    /// without unregistering keeps the original and returns false.
    pub fn register(&self, name: &str, rule_set: RuleSet) -> bool {
        let mut known = lock(&self.known);
        if known.contains_key(name) {
            warn!(
                target: "logsieve::registry",
                "Parser '{}' is already registered; keeping the original",
                name
            );
            return false;
        }
        known.insert(name.to_string(), Arc::new(rule_set));
        true
    }

    /// Removes a rule set from the known catalog. Always safe; active
    /// bindings are unaffected.
    pub fn unregister(&self, name: &str) {
        lock(&self.known).remove(name);
    }

    pub fn is_known(&self, name: &str) -> bool {
        lock(&self.known).contains_key(name)
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    /// Disables every binding the given scope encloses: STEP removes
    /// STEP-scoped bindings, BUILD removes everything.
    pub fn reset(&self, scope: Scope) {
        let mut active = lock(&self.active);
        let doomed: Vec<ParserId> = active
            .iter()
            .filter(|(_, binding)| scope.encloses(binding.scope))
            .map(|(id, _)| id.clone())
            .collect();
        for id in doomed {
            if let Some(binding) = active.remove(&id) {
                self.list_for(binding.scope).unregister(&binding.translator);
            }
        }
    }

    /// Tears down STEP-scoped bindings. Called when a build step finishes.
    pub fn step_finished(&self) {
        self.reset(Scope::Step);
    }

    /// Tears down everything, discarding the adapters and their execution
    /// contexts. Called when the build finishes.
    pub fn build_finished(&self) {
        self.reset(Scope::Build);
    }

    fn list_for(&self, scope: Scope) -> &TranslatorList {
        match scope {
            Scope::Step => &self.step_list,
            Scope::Build => &self.build_list,
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"
[parser]
id = "simple"
name = "simple parser"

[[pattern]]
regex = "^err: (.*)$"
severity = "error"
output = "$1"
"#;

    struct Fixture {
        registry: ParserRegistry,
        step_list: Arc<TranslatorList>,
        build_list: Arc<TranslatorList>,
    }

    impl Fixture {
        fn new() -> Self {
            let loader = CachingLoader::new();
            loader.add_resource("simple-parser.toml", SIMPLE);
            let step_list = Arc::new(TranslatorList::new());
            let build_list = Arc::new(TranslatorList::new());
            Fixture {
                registry: ParserRegistry::new(loader, step_list.clone(), build_list.clone()),
                step_list,
                build_list,
            }
        }

        fn translator_count(&self) -> usize {
            self.step_list.len() + self.build_list.len()
        }
    }

    fn resource_id() -> ParserId {
        ParserId::by_resource("simple-parser.toml")
    }

    #[test]
    fn test_enable_disable_per_build() {
        let f = Fixture::new();
        assert_eq!(f.translator_count(), 0);
        f.registry
            .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.translator_count(), 1);
        assert_eq!(f.registry.active_count(), 1);
        assert!(f.registry.disable(&resource_id(), Scope::Build));
        assert_eq!(f.translator_count(), 0);
        assert_eq!(f.registry.active_count(), 0);
    }

    #[test]
    fn test_build_disable_removes_step_binding() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Step, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.translator_count(), 1);
        assert!(f.registry.disable(&resource_id(), Scope::Build));
        assert_eq!(f.translator_count(), 0);
    }

    #[test]
    fn test_step_disable_does_not_remove_build_binding() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert!(!f.registry.disable(&resource_id(), Scope::Step));
        assert_eq!(f.translator_count(), 1);
    }

    #[test]
    fn test_second_enable_does_nothing() {
        let f = Fixture::new();
        for _ in 0..3 {
            f.registry
                .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
                .unwrap();
        }
        assert_eq!(f.translator_count(), 1);
        assert!(f.registry.disable(&resource_id(), Scope::Build));
        assert_eq!(f.translator_count(), 0);
        assert!(!f.registry.disable(&resource_id(), Scope::Build));
        assert_eq!(f.translator_count(), 0);
    }

    #[test]
    fn test_lesser_scope_enable_does_nothing() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
            .unwrap();
        f.registry
            .enable(&resource_id(), Scope::Step, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.translator_count(), 1);
        assert!(f.registry.disable(&resource_id(), Scope::Build));
        assert_eq!(f.translator_count(), 0);
    }

    #[test]
    fn test_failed_enable_leaves_bindings_unchanged() {
        let f = Fixture::new();
        let missing = ParserId::by_resource("nonexistent.toml");
        let result = f
            .registry
            .enable(&missing, Scope::Build, &ResolveDirs::default());
        assert!(matches!(result, Err(LoadError::NotFound(_))));
        assert_eq!(f.registry.active_count(), 0);
        assert_eq!(f.translator_count(), 0);
    }

    #[test]
    fn test_enable_by_name_uses_known_catalog() {
        let f = Fixture::new();
        let rule_set = RuleSet::from_toml(SIMPLE).unwrap();
        assert!(f.registry.register("simple", rule_set));
        f.registry
            .enable(&ParserId::by_name("simple"), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.translator_count(), 1);
    }

    #[test]
    fn test_enable_unknown_name_fails() {
        let f = Fixture::new();
        let result = f.registry.enable(
            &ParserId::by_name("missing"),
            Scope::Build,
            &ResolveDirs::default(),
        );
        assert!(matches!(result, Err(LoadError::NotFound(_))));
    }

    #[test]
    fn test_duplicate_registration_keeps_original() {
        let f = Fixture::new();
        let original = RuleSet::from_toml(SIMPLE).unwrap();
        let replacement =
            RuleSet::from_toml("[parser]\nid = \"other\"\nname = \"other\"\n").unwrap();
        assert!(f.registry.register("simple", original));
        assert!(!f.registry.register("simple", replacement));
        assert!(f.registry.is_known("simple"));

        // The original is the one that gets enabled.
        f.registry
            .enable(&ParserId::by_name("simple"), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.build_list.snapshot()[0].name(), "simple parser");
    }

    #[test]
    fn test_unregister_is_always_safe() {
        let f = Fixture::new();
        f.registry.unregister("never-registered");
        let rule_set = RuleSet::from_toml(SIMPLE).unwrap();
        f.registry.register("simple", rule_set);
        f.registry.unregister("simple");
        assert!(!f.registry.is_known("simple"));
    }

    #[test]
    fn test_step_finished_tears_down_step_bindings_only() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Step, &ResolveDirs::default())
            .unwrap();
        let rule_set = RuleSet::from_toml(SIMPLE).unwrap();
        f.registry.register("simple", rule_set);
        f.registry
            .enable(&ParserId::by_name("simple"), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.registry.active_count(), 2);

        f.registry.step_finished();
        assert_eq!(f.registry.active_count(), 1);
        assert_eq!(f.step_list.len(), 0);
        assert_eq!(f.build_list.len(), 1);
    }

    #[test]
    fn test_build_finished_tears_down_everything() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Step, &ResolveDirs::default())
            .unwrap();
        let rule_set = RuleSet::from_toml(SIMPLE).unwrap();
        f.registry.register("simple", rule_set);
        f.registry
            .enable(&ParserId::by_name("simple"), Scope::Build, &ResolveDirs::default())
            .unwrap();

        f.registry.build_finished();
        assert_eq!(f.registry.active_count(), 0);
        assert_eq!(f.translator_count(), 0);
        // The known catalog survives the build.
        assert!(f.registry.is_known("simple"));
    }

    #[test]
    fn test_reenable_after_disable_uses_loader_cache() {
        let f = Fixture::new();
        f.registry
            .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
            .unwrap();
        f.registry.disable(&resource_id(), Scope::Build);
        f.registry
            .enable(&resource_id(), Scope::Build, &ResolveDirs::default())
            .unwrap();
        assert_eq!(f.translator_count(), 1);
    }
}
