#![forbid(unsafe_code)]

//! Core domain types for logsieve
//!
//! This module defines the fundamental types used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Severity of an emitted log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Warn,
    Error,
    Special,
}

impl Severity {
    /// Parses a severity name as it appears in build output, for
    /// capture-group overrides. Accepts `warning` as an alias for `warn`.
    pub fn from_override(text: &str) -> Option<Self> {
        match text.to_ascii_lowercase().as_str() {
            "info" => Some(Severity::Info),
            "warn" | "warning" => Some(Severity::Warn),
            "error" => Some(Severity::Error),
            "special" => Some(Severity::Special),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Special => "special",
        };
        write!(f, "{}", name)
    }
}

/// Action declared on a pattern in a rule-set document
///
/// This is the closed set of classifications a pattern may carry: the four
/// plain severities plus the structural block/compilation transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PatternAction {
    Info,
    Warn,
    Error,
    Special,
    BlockStart,
    BlockFinish,
    BlockChange,
    CompilationStart,
    CompilationFinish,
    CompilationChange,
}

/// Action resolved for one concrete match, after capture-group severity
/// overrides have been applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedAction {
    Log(Severity),
    BlockStart,
    BlockFinish,
    BlockChange,
    CompilationStart,
    CompilationFinish,
    CompilationChange,
}

impl PatternAction {
    /// Resolves the declared action to its match-time form. Plain severities
    /// become `Log`; structural actions map one-to-one.
    pub fn resolve(self) -> ResolvedAction {
        match self {
            PatternAction::Info => ResolvedAction::Log(Severity::Info),
            PatternAction::Warn => ResolvedAction::Log(Severity::Warn),
            PatternAction::Error => ResolvedAction::Log(Severity::Error),
            PatternAction::Special => ResolvedAction::Log(Severity::Special),
            PatternAction::BlockStart => ResolvedAction::BlockStart,
            PatternAction::BlockFinish => ResolvedAction::BlockFinish,
            PatternAction::BlockChange => ResolvedAction::BlockChange,
            PatternAction::CompilationStart => ResolvedAction::CompilationStart,
            PatternAction::CompilationFinish => ResolvedAction::CompilationFinish,
            PatternAction::CompilationChange => ResolvedAction::CompilationChange,
        }
    }
}

/// Lifetime domain of an active rule-set binding
///
/// STEP-scoped bindings are torn down when the current build step finishes;
/// BUILD-scoped bindings persist until the build ends or an explicit disable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Step,
    Build,
}

impl Scope {
    /// Parses a scope attribute case-insensitively. `None` or unrecognized
    /// text yields the STEP default.
    pub fn parse_or_default(text: Option<&str>) -> Self {
        match text {
            Some(s) if s.eq_ignore_ascii_case("build") => Scope::Build,
            _ => Scope::Step,
        }
    }

    /// Whether a disable at `self` is allowed to remove a binding enabled at
    /// `enabled`. BUILD encloses STEP; STEP only matches itself.
    pub fn encloses(self, enabled: Scope) -> bool {
        match self {
            Scope::Build => true,
            Scope::Step => enabled == Scope::Step,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Step => write!(f, "step"),
            Scope::Build => write!(f, "build"),
        }
    }
}

/// Opaque identifier of a rule set as referenced by control commands
///
/// A parser is addressed either by a logical name in the known catalog, by a
/// bundled resource path, or by a configuration file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParserId {
    Name(String),
    Resource(String),
    File(PathBuf),
}

impl ParserId {
    pub fn by_name(name: impl Into<String>) -> Self {
        ParserId::Name(name.into())
    }

    pub fn by_resource(path: impl Into<String>) -> Self {
        ParserId::Resource(path.into())
    }

    pub fn by_file(path: impl Into<PathBuf>) -> Self {
        ParserId::File(path.into())
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserId::Name(name) => write!(f, "name '{}'", name),
            ParserId::Resource(path) => write!(f, "resource '{}'", path),
            ParserId::File(path) => write!(f, "file '{}'", path.display()),
        }
    }
}

/// Structural marker attached to a classified record for log folding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuralTag {
    BlockStart(String),
    BlockFinish(String),
    CompilationStart(String),
    CompilationFinish(String),
}

/// One typed log record produced by rule evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedRecord {
    pub severity: Severity,
    pub text: String,
    pub tag: Option<StructuralTag>,
}

impl ClassifiedRecord {
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        ClassifiedRecord {
            severity,
            text: text.into(),
            tag: None,
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(Severity::Info, text)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(Severity::Warn, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(Severity::Error, text)
    }

    pub fn tagged(severity: Severity, text: impl Into<String>, tag: StructuralTag) -> Self {
        ClassifiedRecord {
            severity,
            text: text.into(),
            tag: Some(tag),
        }
    }
}
