#![forbid(unsafe_code)]

//! Adapter exposing a rule set as a stream translator
//!
//! Evaluating a line and draining the records it produced must happen as one
//! atomic unit: the context's sink buffers records, so interleaved calls on
//! the same adapter would mix records from different lines.

use crate::context::{BufferingSink, ExecutionContext, LogSink};
use crate::rules::RuleSet;
use crate::translate::{Translation, UnitTranslator};
use crate::types::Severity;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// Binds a rule set to an execution context behind one lock
pub struct RuleSetAdapter {
    rule_set: Arc<RuleSet>,
    context: Mutex<ExecutionContext<BufferingSink>>,
}

impl RuleSetAdapter {
    pub fn new(rule_set: Arc<RuleSet>) -> Self {
        Self::with_execution_context(rule_set, ExecutionContext::new(BufferingSink::new()))
    }

    /// Builds an adapter around a preconfigured context, e.g. one carrying a
    /// SPECIAL-line handler.
    pub fn with_execution_context(
        rule_set: Arc<RuleSet>,
        context: ExecutionContext<BufferingSink>,
    ) -> Self {
        RuleSetAdapter {
            rule_set,
            context: Mutex::new(context),
        }
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    /// Runs a closure against the context under the adapter lock, giving
    /// typed access to its counters and nesting state.
    pub fn with_context<R>(
        &self,
        f: impl FnOnce(&mut ExecutionContext<BufferingSink>) -> R,
    ) -> R {
        f(&mut self.lock_context())
    }

    fn lock_context(&self) -> MutexGuard<'_, ExecutionContext<BufferingSink>> {
        // A poisoned lock only means a panic mid-line; the context is still
        // structurally sound.
        self.context.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl UnitTranslator for RuleSetAdapter {
    fn name(&self) -> &str {
        self.rule_set.name()
    }

    fn process_text(&self, text: &str) -> Translation {
        let (consumed, records) = {
            let mut ctx = self.lock_context();
            let consumed = self.rule_set.process_line(text, &mut ctx);
            (consumed, ctx.sink_mut().drain())
        };

        if !consumed {
            if !records.is_empty() {
                warn!(
                    target: "logsieve::translate",
                    "Parser '{}' did not consume the line but produced {} pending records",
                    self.rule_set.id(),
                    records.len()
                );
            }
            return Translation::Skip;
        }
        if records.is_empty() {
            return Translation::Eat;
        }
        // A single plain record identical to the input changes nothing.
        if records.len() == 1
            && records[0].tag.is_none()
            && records[0].severity == Severity::Info
            && records[0].text == text
        {
            return Translation::KeepOrigin;
        }
        Translation::Replace(records)
    }

    fn build_finished(&self) {
        self.lock_context().reset();
    }
}
