#![forbid(unsafe_code)]

//! Stream translator: composition of active translators over one stream
//!
//! Translators are consulted in priority order: step-scoped, then
//! build-scoped, then global. The first translator to consume a unit decides
//! its fate. Suspend/resume markers gate rule evaluation of marker-bearing
//! units.

use crate::translate::{LogUnit, Translation, TranslatorList, UnitTranslator};
use crate::types::ClassifiedRecord;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Marker name suspending marker translation until [`RESUME_MARKER`]
pub const SUSPEND_MARKER: &str = "disableLogSieve";

/// Marker name resuming marker translation
pub const RESUME_MARKER: &str = "enableLogSieve";

/// One element of the translated stream
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// The original unit, passed through unchanged
    Original(LogUnit),
    /// A record produced by a translator
    Record(ClassifiedRecord),
}

/// Applies the active translators to a stream of units
pub struct StreamTranslator {
    step: Arc<TranslatorList>,
    build: Arc<TranslatorList>,
    global: Arc<TranslatorList>,
    suspended: AtomicBool,
}

impl StreamTranslator {
    pub fn new(
        step: Arc<TranslatorList>,
        build: Arc<TranslatorList>,
        global: Arc<TranslatorList>,
    ) -> Self {
        StreamTranslator {
            step,
            build,
            global,
            suspended: AtomicBool::new(false),
        }
    }

    /// Clears the suspend flag. Called when a build starts.
    pub fn build_started(&self) {
        self.suspended.store(false, Ordering::SeqCst);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::SeqCst)
    }

    /// Processes one unit of output.
    ///
    /// Suspend markers are eaten and toggle the flag. While suspended,
    /// marker-bearing units pass through without rule evaluation; plain text
    /// keeps flowing. Units no translator consumes pass through unchanged.
    pub fn process(&self, unit: LogUnit) -> Vec<StreamEvent> {
        match unit {
            LogUnit::Text(text) => {
                let outcome = self.offer(|t| t.process_text(&text));
                Self::compose(LogUnit::Text(text), outcome)
            }
            LogUnit::Marker(marker) => {
                if marker.name() == SUSPEND_MARKER {
                    debug!(target: "logsieve::translate", "Suspending marker translation");
                    self.suspended.store(true, Ordering::SeqCst);
                    return Vec::new();
                }
                if marker.name() == RESUME_MARKER {
                    debug!(target: "logsieve::translate", "Resuming marker translation");
                    self.suspended.store(false, Ordering::SeqCst);
                    return Vec::new();
                }
                if self.is_suspended() {
                    return vec![StreamEvent::Original(LogUnit::Marker(marker))];
                }
                let outcome = self.offer(|t| t.process_marker(&marker));
                Self::compose(LogUnit::Marker(marker), outcome)
            }
        }
    }

    /// Offers a unit to the translators in priority order; the first
    /// consuming translator's result wins.
    fn offer(&self, apply: impl Fn(&dyn UnitTranslator) -> Translation) -> Translation {
        for list in [&self.step, &self.build, &self.global] {
            for translator in list.snapshot().iter() {
                let result = apply(translator.as_ref());
                if result.is_consumed() {
                    return result;
                }
            }
        }
        Translation::Skip
    }

    fn compose(original: LogUnit, outcome: Translation) -> Vec<StreamEvent> {
        match outcome {
            Translation::Skip | Translation::KeepOrigin => {
                vec![StreamEvent::Original(original)]
            }
            Translation::Eat => Vec::new(),
            Translation::Replace(records) => {
                records.into_iter().map(StreamEvent::Record).collect()
            }
        }
    }
}
