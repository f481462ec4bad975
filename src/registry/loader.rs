#![forbid(unsafe_code)]

//! Caching rule-set loader
//!
//! Resolves a [`ParserId`] to a shared rule set, from bundled resources or
//! from configuration files. Resolved rule sets are cached by id so repeated
//! enable/disable cycles do not re-parse.

use crate::error::LoadError;
use crate::rules::RuleSet;
use crate::types::{ParserId, Scope};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;

/// Directories relative file paths resolve against
///
/// The host supplies these through the session lifecycle: the checkout
/// directory while a build is active, the working directory while a step is
/// active. BUILD-scope file references resolve against the checkout
/// directory, STEP-scope ones against the step working directory.
#[derive(Debug, Clone, Default)]
pub struct ResolveDirs {
    pub checkout_dir: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

/// Loader with an in-memory resource catalog and a per-id cache
#[derive(Default)]
pub struct CachingLoader {
    resources: Mutex<HashMap<String, String>>,
    cache: Mutex<HashMap<ParserId, Arc<RuleSet>>>,
}

impl CachingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a bundled configuration under a resource path.
    pub fn add_resource(&self, path: impl Into<String>, content: impl Into<String>) {
        let mut resources = lock(&self.resources);
        resources.insert(path.into(), content.into());
    }

    /// Resolves a parser id to a rule set, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::NotFound` for a missing resource or file,
    /// `LoadError::Malformed` for content that does not decode, and the
    /// `NoActiveBuild`/`NoActiveStep` variants when a relative path cannot
    /// be anchored.
    pub fn load(
        &self,
        id: &ParserId,
        scope: Scope,
        dirs: &ResolveDirs,
    ) -> Result<Arc<RuleSet>, LoadError> {
        if let Some(cached) = lock(&self.cache).get(id) {
            return Ok(cached.clone());
        }
        let loaded = Arc::new(self.load_uncached(id, scope, dirs)?);
        lock(&self.cache).insert(id.clone(), loaded.clone());
        Ok(loaded)
    }

    /// Evicts a cached rule set so the next load re-reads its source.
    pub fn unload(&self, id: &ParserId) {
        lock(&self.cache).remove(id);
    }

    fn load_uncached(
        &self,
        id: &ParserId,
        scope: Scope,
        dirs: &ResolveDirs,
    ) -> Result<RuleSet, LoadError> {
        match id {
            ParserId::Resource(path) => {
                let resources = lock(&self.resources);
                let content = resources.get(path).ok_or_else(|| {
                    LoadError::NotFound(format!("parser configuration resource '{}'", path))
                })?;
                info!(target: "logsieve::registry", "Loading parser config from resource {}", path);
                RuleSet::from_toml(content)
            }
            ParserId::File(path) => {
                let resolved = self.resolve_file(path, scope, dirs)?;
                info!(
                    target: "logsieve::registry",
                    "Loading parser config from file {}",
                    resolved.display()
                );
                RuleSet::from_path(&resolved)
            }
            ParserId::Name(name) => Err(LoadError::NotFound(format!(
                "parser '{}' is not in the known catalog",
                name
            ))),
        }
    }

    fn resolve_file(
        &self,
        path: &Path,
        scope: Scope,
        dirs: &ResolveDirs,
    ) -> Result<PathBuf, LoadError> {
        let resolved = if path.is_absolute() {
            path.to_path_buf()
        } else {
            let base = match scope {
                Scope::Build => dirs
                    .checkout_dir
                    .as_ref()
                    .ok_or_else(|| LoadError::NoActiveBuild(path.to_path_buf()))?,
                Scope::Step => dirs
                    .working_dir
                    .as_ref()
                    .ok_or_else(|| LoadError::NoActiveStep(path.to_path_buf()))?,
            };
            base.join(path)
        };
        if !resolved.is_file() {
            return Err(LoadError::NotFound(format!(
                "parser configuration file '{}'",
                resolved.display()
            )));
        }
        Ok(resolved)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
