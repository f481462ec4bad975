#![forbid(unsafe_code)]

//! Rule-set container: an ordered sequence of patterns under one id/name
//!
//! Pattern order in the document is evaluation priority: the first matching
//! pattern consumes the line and later patterns are skipped. Rule sets are
//! immutable after load and round-trip through TOML.

use crate::context::{ExecutionContext, LogSink};
use crate::error::LoadError;
use crate::rules::pattern::{PatternConfig, RulePattern};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// TOML structure of a rule-set document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RuleSetDocument {
    parser: ParserSection,
    #[serde(default, rename = "pattern")]
    patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ParserSection {
    id: String,
    name: String,
}

/// An ordered, immutable collection of compiled patterns
pub struct RuleSet {
    document: RuleSetDocument,
    patterns: Vec<RulePattern>,
}

impl std::fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("id", &self.document.parser.id)
            .field("name", &self.document.parser.name)
            .field("patterns", &self.patterns)
            .finish()
    }
}

impl PartialEq for RuleSet {
    /// Structural comparison over id, name and declared patterns, used for
    /// duplicate detection in the known catalog.
    fn eq(&self, other: &Self) -> bool {
        self.document == other.document
    }
}

impl RuleSet {
    /// Decodes and compiles a rule set from TOML content.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Malformed` for empty content, TOML that does not
    /// match the schema, or a pattern that fails to compile. A failed load
    /// never yields a silently empty rule set.
    pub fn from_toml(content: &str) -> Result<Self, LoadError> {
        if content.trim().is_empty() {
            return Err(LoadError::Malformed(
                "Parser configuration is empty".to_string(),
            ));
        }
        let document: RuleSetDocument = toml::from_str(content)
            .map_err(|e| LoadError::Malformed(format!("Failed to parse TOML: {}", e)))?;

        let patterns = document
            .patterns
            .iter()
            .map(RulePattern::from_config)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| LoadError::Malformed(e.to_string()))?;

        Ok(RuleSet { document, patterns })
    }

    /// Reads and decodes a rule set from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Serializes the rule set back to its TOML document form.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(&self.document)
    }

    pub fn id(&self) -> &str {
        &self.document.parser.id
    }

    pub fn name(&self) -> &str {
        &self.document.parser.name
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Evaluates one line against the patterns in declared order.
    ///
    /// On the first match the effect is applied to the context and `true` is
    /// returned, short-circuiting the remaining patterns. A failure
    /// evaluating one pattern is reported through the context's error path
    /// and evaluation proceeds with the next pattern; one bad pattern never
    /// aborts the pass over a line.
    pub fn process_line<S: LogSink>(&self, line: &str, ctx: &mut ExecutionContext<S>) -> bool {
        for pattern in &self.patterns {
            match pattern.evaluate(line) {
                Ok(Some(matched)) => {
                    ctx.apply(&matched);
                    return true;
                }
                Ok(None) => {}
                Err(e) => {
                    ctx.parsing_error(&format!("Error parsing line [{}]: {}", line, e));
                }
            }
        }
        false
    }
}
