#![forbid(unsafe_code)]

//! Execution context: the stateful sink rule matches are applied to
//!
//! A context turns pattern matches into classified records and tracks the
//! block/compilation nesting of the stream. One context exists per running
//! build and is reset when the build finishes.

use crate::rules::PatternMatch;
use crate::types::{ClassifiedRecord, ResolvedAction, Severity, StructuralTag};
use tracing::warn;

/// Destination for classified records
///
/// Implementations decide what "emitting" means: the streaming adapter uses a
/// buffering sink drained after each line, tests use counting sinks.
pub trait LogSink: Send {
    fn log(&mut self, record: ClassifiedRecord);
}

/// Sink that stores records until drained
///
/// Instead of sending records anywhere, it keeps them until
/// [`BufferingSink::drain`] is called. Used by the translator adapter to
/// collect the records one line produced.
#[derive(Debug, Default)]
pub struct BufferingSink {
    records: Vec<ClassifiedRecord>,
}

impl BufferingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes all pending records, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<ClassifiedRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LogSink for BufferingSink {
    fn log(&mut self, record: ClassifiedRecord) {
        self.records.push(record);
    }
}

/// Hook allowing a context variant to claim SPECIAL lines
///
/// The default context has no handler and logs SPECIAL lines generically.
pub trait SpecialHandler: Send {
    /// Returns true when the line was handled; handled lines count as
    /// specials and produce no generic record.
    fn special_parse(&mut self, line: &str, sink: &mut dyn LogSink) -> bool;
}

/// Nesting stacks and running counters of one context
///
/// Blocks and compilation contexts nest on independent stacks. INFO and
/// ERROR records both count as messages; ERROR additionally counts as an
/// error.
#[derive(Debug, Default)]
pub struct ExecutionState {
    block_stack: Vec<String>,
    compilation_stack: Vec<String>,
    messages: usize,
    errors: usize,
    warnings: usize,
    specials: usize,
}

/// Stateful sink that applies pattern matches
///
/// Generic over the sink so callers that need to inspect emitted records
/// (the translator adapter, tests) keep typed access to it.
pub struct ExecutionContext<S: LogSink> {
    sink: S,
    special: Option<Box<dyn SpecialHandler>>,
    state: ExecutionState,
}

impl<S: LogSink> ExecutionContext<S> {
    pub fn new(sink: S) -> Self {
        ExecutionContext {
            sink,
            special: None,
            state: ExecutionState::default(),
        }
    }

    /// Installs a SPECIAL-line handler, replacing any previous one.
    pub fn with_special_handler(mut self, handler: Box<dyn SpecialHandler>) -> Self {
        self.special = Some(handler);
        self
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn message_count(&self) -> usize {
        self.state.messages
    }

    pub fn error_count(&self) -> usize {
        self.state.errors
    }

    pub fn warning_count(&self) -> usize {
        self.state.warnings
    }

    pub fn special_count(&self) -> usize {
        self.state.specials
    }

    pub fn open_blocks(&self) -> usize {
        self.state.block_stack.len()
    }

    pub fn open_compilations(&self) -> usize {
        self.state.compilation_stack.len()
    }

    /// Applies one pattern match: the single dispatch point for the closed
    /// action set.
    pub fn apply(&mut self, matched: &PatternMatch) {
        match matched.action {
            ResolvedAction::Log(severity) => self.log(&matched.output, severity),
            ResolvedAction::BlockStart => self.block_start(&matched.output),
            ResolvedAction::BlockFinish => self.block_finish(),
            ResolvedAction::BlockChange => self.block_change(&matched.output),
            ResolvedAction::CompilationStart => self.compilation_start(&matched.output),
            ResolvedAction::CompilationFinish => self.compilation_finish(),
            ResolvedAction::CompilationChange => self.compilation_change(&matched.output),
        }
    }

    /// Emits a record at the given severity and updates the counters.
    pub fn log(&mut self, text: &str, severity: Severity) {
        match severity {
            Severity::Info => {
                self.state.messages += 1;
                self.sink.log(ClassifiedRecord::info(text));
            }
            Severity::Error => {
                self.state.messages += 1;
                self.state.errors += 1;
                self.sink.log(ClassifiedRecord::error(text));
            }
            Severity::Warn => {
                self.state.warnings += 1;
                self.sink.log(ClassifiedRecord::warning(text));
            }
            Severity::Special => {
                let claimed = match self.special.as_mut() {
                    Some(handler) => handler.special_parse(text, &mut self.sink),
                    None => false,
                };
                if claimed {
                    self.state.specials += 1;
                } else {
                    // Unclaimed SPECIAL lines are logged generically and
                    // counted as nothing.
                    self.sink.log(ClassifiedRecord::info(text));
                }
            }
        }
    }

    /// Reports a recovered per-line evaluation failure as a warning.
    pub fn parsing_error(&mut self, message: &str) {
        warn!(target: "logsieve::context", "{}", message);
        self.log(message, Severity::Warn);
    }

    pub fn block_start(&mut self, name: &str) {
        self.state.block_stack.push(name.to_string());
        self.sink.log(ClassifiedRecord::tagged(
            Severity::Info,
            name,
            StructuralTag::BlockStart(name.to_string()),
        ));
    }

    pub fn block_finish(&mut self) {
        match self.state.block_stack.pop() {
            Some(name) => self.sink.log(ClassifiedRecord::tagged(
                Severity::Info,
                name.as_str(),
                StructuralTag::BlockFinish(name.clone()),
            )),
            // Unmatched finish is a recoverable anomaly, not fatal.
            None => warn!(target: "logsieve::context", "Block finish without open block"),
        }
    }

    pub fn block_change(&mut self, name: &str) {
        self.block_finish();
        self.block_start(name);
    }

    pub fn compilation_start(&mut self, name: &str) {
        self.state.compilation_stack.push(name.to_string());
        self.sink.log(ClassifiedRecord::tagged(
            Severity::Info,
            name,
            StructuralTag::CompilationStart(name.to_string()),
        ));
    }

    pub fn compilation_finish(&mut self) {
        match self.state.compilation_stack.pop() {
            Some(name) => self.sink.log(ClassifiedRecord::tagged(
                Severity::Info,
                name.as_str(),
                StructuralTag::CompilationFinish(name.clone()),
            )),
            None => warn!(
                target: "logsieve::context",
                "Compilation finish without open compilation context"
            ),
        }
    }

    pub fn compilation_change(&mut self, name: &str) {
        self.compilation_finish();
        self.compilation_start(name);
    }

    /// Clears nesting state and counters. Called when the build finishes.
    pub fn reset(&mut self) {
        self.state = ExecutionState::default();
    }
}
