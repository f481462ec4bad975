#![forbid(unsafe_code)]

//! Session facade tying the registry to the streaming translator
//!
//! A session lives for one build. The host feeds it lifecycle events and the
//! raw output stream; parser commands embedded in the stream mutate the
//! registry between units, and every other unit goes through translation.

use crate::registry::{CachingLoader, ParserCommand, ParserRegistry, ResolveDirs};
use crate::rules::RuleSet;
use crate::translate::{
    LogUnit, StreamEvent, StreamTranslator, TranslatorList, UnitTranslator,
};
use crate::types::ClassifiedRecord;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// One build's worth of log translation state
pub struct Session {
    registry: ParserRegistry,
    stream: StreamTranslator,
    global: Arc<TranslatorList>,
    dirs: Mutex<ResolveDirs>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let step = Arc::new(TranslatorList::new());
        let build = Arc::new(TranslatorList::new());
        let global = Arc::new(TranslatorList::new());
        Session {
            registry: ParserRegistry::new(CachingLoader::new(), step.clone(), build.clone()),
            stream: StreamTranslator::new(step, build, global.clone()),
            global,
            dirs: Mutex::new(ResolveDirs::default()),
        }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    /// Registers a bundled parser configuration under a resource path.
    pub fn add_resource(&self, path: impl Into<String>, content: impl Into<String>) {
        self.registry.loader().add_resource(path, content);
    }

    /// Adds a rule set to the known catalog under a logical name.
    pub fn register_parser(&self, name: &str, rule_set: RuleSet) -> bool {
        self.registry.register(name, rule_set)
    }

    /// Installs a translator that outlives enable/disable cycles. Global
    /// translators are consulted after step- and build-scoped ones.
    pub fn register_translator(&self, translator: Arc<dyn UnitTranslator>) {
        self.global.register(translator);
    }

    pub fn build_started(&self, checkout_dir: impl Into<PathBuf>) {
        let mut dirs = lock(&self.dirs);
        dirs.checkout_dir = Some(checkout_dir.into());
        dirs.working_dir = None;
        self.stream.build_started();
    }

    pub fn step_started(&self, working_dir: impl Into<PathBuf>) {
        lock(&self.dirs).working_dir = Some(working_dir.into());
    }

    /// Tears down STEP-scoped bindings and forgets the working directory.
    pub fn step_finished(&self) {
        self.registry.step_finished();
        lock(&self.dirs).working_dir = None;
    }

    /// Tears down every binding and tells the global translators the build
    /// ended so they clear per-build state. The known catalog and bundled
    /// resources survive for the next build.
    pub fn build_finished(&self) {
        self.registry.build_finished();
        for translator in self.global.snapshot().iter() {
            translator.build_finished();
        }
        *lock(&self.dirs) = ResolveDirs::default();
    }

    /// Processes one unit of build output.
    ///
    /// Parser command markers are decoded and applied here, then dropped
    /// from the stream; a malformed or failing command surfaces as a warning
    /// or error record in its place. Everything else goes through the
    /// translator chain.
    pub fn process(&self, unit: LogUnit) -> Vec<StreamEvent> {
        if let LogUnit::Marker(marker) = &unit
            && ParserCommand::is_command(marker)
            && !self.stream.is_suspended()
        {
            let command = match ParserCommand::from_marker(marker) {
                Ok(command) => command,
                Err(err) => {
                    return vec![StreamEvent::Record(ClassifiedRecord::warning(format!(
                        "Ignoring parser command: {}",
                        err
                    )))];
                }
            };
            return self.apply_command(command);
        }
        self.stream.process(unit)
    }

    fn apply_command(&self, command: ParserCommand) -> Vec<StreamEvent> {
        match command {
            ParserCommand::Enable { id, scope } => {
                let dirs = lock(&self.dirs).clone();
                if let Err(err) = self.registry.enable(&id, scope, &dirs) {
                    return vec![StreamEvent::Record(ClassifiedRecord::error(format!(
                        "Failed to enable parser {}: {}",
                        id, err
                    )))];
                }
            }
            ParserCommand::Disable { id, scope } => {
                if !self.registry.disable(&id, scope) {
                    debug!(target: "logsieve::session", "Disable of {} had no effect", id);
                }
            }
            ParserCommand::Reset { scope } => self.registry.reset(scope),
        }
        Vec::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
