#![forbid(unsafe_code)]

//! Copy-on-write list of active translators
//!
//! The streaming path iterates a consistent snapshot without taking a lock;
//! writers publish a new immutable sequence atomically.

use crate::translate::UnitTranslator;
use arc_swap::ArcSwap;
use std::sync::Arc;

/// Atomically swapped immutable sequence of translators
#[derive(Default)]
pub struct TranslatorList {
    translators: ArcSwap<Vec<Arc<dyn UnitTranslator>>>,
}

impl TranslatorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a translator, publishing a new snapshot.
    pub fn register(&self, translator: Arc<dyn UnitTranslator>) {
        self.translators.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(translator.clone());
            next
        });
    }

    /// Removes a translator by identity. Unknown translators are ignored.
    pub fn unregister(&self, translator: &Arc<dyn UnitTranslator>) {
        self.translators.rcu(|current| {
            current
                .iter()
                .filter(|t| !Arc::ptr_eq(t, translator))
                .cloned()
                .collect::<Vec<_>>()
        });
    }

    /// Removes every translator.
    pub fn clear(&self) {
        self.translators.store(Arc::new(Vec::new()));
    }

    /// Returns the current immutable snapshot. Concurrent mutation does not
    /// affect a snapshot already taken.
    pub fn snapshot(&self) -> Arc<Vec<Arc<dyn UnitTranslator>>> {
        self.translators.load_full()
    }

    pub fn len(&self) -> usize {
        self.translators.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.translators.load().is_empty()
    }
}
