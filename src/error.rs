#![forbid(unsafe_code)]

//! Error types for logsieve
//!
//! This module defines the error types used throughout the crate, following
//! a hierarchical structure with specific variants for different categories.
//! Per-line evaluation failures are recovered at the rule-set boundary and
//! never surface through these types.

use std::path::PathBuf;

/// Errors raised while resolving and loading rule-set configurations
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The referenced configuration resource or file does not exist
    #[error("Parser configuration not found: {0}")]
    NotFound(String),

    /// The configuration exists but cannot be decoded into a rule set
    #[error("Malformed parser configuration: {0}")]
    Malformed(String),

    /// A relative file path was given but no build is active to resolve it
    #[error("Cannot resolve '{}': no running build", .0.display())]
    NoActiveBuild(PathBuf),

    /// A relative file path was given but no step is active to resolve it
    #[error("Cannot resolve '{}': no running build step", .0.display())]
    NoActiveStep(PathBuf),

    /// I/O error reading a configuration file
    #[error("I/O error reading parser configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while compiling or evaluating a single pattern
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// Invalid regular expression
    #[error("Invalid regex pattern: {0}")]
    InvalidRegex(String),

    /// Output template references a capture group the regex does not have
    #[error("Template references group ${group} but pattern '{pattern}' has {available} groups")]
    GroupOutOfRange {
        pattern: String,
        group: usize,
        available: usize,
    },

    /// `severity-group` names a capture group the regex does not have
    #[error("Severity group {group} out of range for pattern '{pattern}'")]
    SeverityGroupOutOfRange { pattern: String, group: usize },
}

/// Top-level error type for logsieve
#[derive(Debug, thiserror::Error)]
pub enum SieveError {
    /// Configuration loading error
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Pattern definition error
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),
}
