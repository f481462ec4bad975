#![forbid(unsafe_code)]

//! Logsieve: Streaming reclassification of build output
//!
//! Logsieve turns raw build-tool output into typed log records using ordered
//! regex rule sets. Rule sets activate and deactivate while output streams,
//! bounded by step or build scope, and drive a translator chain that decides
//! line by line whether the original text survives, disappears, or is
//! replaced by classified records.

pub mod context;
pub mod error;
pub mod registry;
pub mod rules;
pub mod session;
pub mod translate;
pub mod types;

// Re-export error types for convenient access
pub use error::{LoadError, PatternError, SieveError};

// Re-export core domain types for convenient access
pub use types::{ClassifiedRecord, ParserId, PatternAction, Scope, Severity};
