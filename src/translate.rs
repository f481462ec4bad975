#![forbid(unsafe_code)]

//! Streaming translation of build output
//!
//! The stream is a sequence of units (free text or pre-parsed control
//! markers). Active translators are offered each unit in priority order; the
//! first one to consume it decides whether the original survives and which
//! records replace it.

mod adapter;
mod list;
mod stream;
mod unit;

pub use adapter::RuleSetAdapter;
pub use list::TranslatorList;
pub use stream::{RESUME_MARKER, SUSPEND_MARKER, StreamEvent, StreamTranslator};
pub use unit::{ControlMarker, LogUnit};

use crate::types::ClassifiedRecord;

/// Outcome of offering one unit to one translator
///
/// - `Skip`: not matched by this translator
/// - `KeepOrigin`: matched, the original passes through unchanged
/// - `Eat`: matched, the original is dropped with no replacement
/// - `Replace`: matched, the original is dropped and replaced
#[derive(Debug, Clone, PartialEq)]
pub enum Translation {
    Skip,
    KeepOrigin,
    Eat,
    Replace(Vec<ClassifiedRecord>),
}

impl Translation {
    /// Whether this translator claimed the unit.
    pub fn is_consumed(&self) -> bool {
        !matches!(self, Translation::Skip)
    }
}

/// One translator participating in stream processing
///
/// Implementations must be shareable across the streaming path and the
/// registry mutation path; per-unit state goes behind interior mutability.
pub trait UnitTranslator: Send + Sync {
    fn name(&self) -> &str;

    fn process_text(&self, text: &str) -> Translation;

    /// Control markers are skipped by default; only marker-aware translators
    /// override this.
    fn process_marker(&self, _marker: &ControlMarker) -> Translation {
        Translation::Skip
    }

    /// Called when the build finishes. Translators that outlive the build
    /// and keep per-build state clear it here; the default does nothing.
    fn build_finished(&self) {}
}
