#![forbid(unsafe_code)]

//! Single-pattern matching engine
//!
//! A [`RulePattern`] is one compiled entry of a rule set: a regex, a declared
//! action, an optional per-capture severity override, and an output template
//! with `$0..$n` capture substitution. Evaluation against one line is a pure
//! function producing a [`PatternMatch`] or nothing.

use crate::error::PatternError;
use crate::types::{PatternAction, ResolvedAction, Severity};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// TOML structure of one `[[pattern]]` entry in a rule-set document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub regex: String,
    pub severity: PatternAction,
    /// Capture group whose matched text names the actual severity
    #[serde(
        default,
        rename = "severity-group",
        skip_serializing_if = "Option::is_none"
    )]
    pub severity_group: Option<usize>,
    /// Output template; absent means the whole match (`$0`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// One piece of a parsed output template
#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(String),
    Group(usize),
}

/// Output template with `$n` capture references
///
/// `$$` renders a literal dollar sign; a `$` not followed by digits is kept
/// as-is.
#[derive(Debug, Clone, PartialEq)]
struct Template {
    segments: Vec<Segment>,
}

impl Template {
    fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                literal.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    literal.push('$');
                }
                Some(d) if d.is_ascii_digit() => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    let mut number = String::new();
                    while let Some(d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        number.push(*d);
                        chars.next();
                    }
                    // Digit runs always fit a group index.
                    segments.push(Segment::Group(number.parse().unwrap_or(usize::MAX)));
                }
                _ => literal.push('$'),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Template { segments }
    }

    /// Renders the template against a set of captures. A referenced group
    /// beyond the pattern's group count is an error; a group that did not
    /// participate in this match renders empty.
    fn render(&self, caps: &regex::Captures<'_>, pattern: &str) -> Result<String, PatternError> {
        let available = caps.len();
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Group(idx) => {
                    if *idx >= available {
                        return Err(PatternError::GroupOutOfRange {
                            pattern: pattern.to_string(),
                            group: *idx,
                            available,
                        });
                    }
                    if let Some(m) = caps.get(*idx) {
                        out.push_str(m.as_str());
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Result of evaluating one pattern against one line
#[derive(Debug, Clone, PartialEq)]
pub struct PatternMatch {
    pub action: ResolvedAction,
    pub output: String,
}

/// A compiled rule-set entry
pub struct RulePattern {
    regex: Regex,
    action: PatternAction,
    severity_group: Option<usize>,
    template: Template,
}

impl std::fmt::Debug for RulePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulePattern")
            .field("regex", &self.regex.as_str())
            .field("action", &self.action)
            .field("severity_group", &self.severity_group)
            .finish()
    }
}

impl RulePattern {
    /// Compiles a pattern definition.
    ///
    /// # Errors
    ///
    /// Returns `PatternError` if the regex does not compile or the
    /// `severity-group` index exceeds the regex's capture-group count.
    pub fn from_config(config: &PatternConfig) -> Result<Self, PatternError> {
        let regex = Regex::new(&config.regex).map_err(|e| {
            PatternError::InvalidRegex(format!(
                "Failed to compile pattern '{}': {}",
                config.regex, e
            ))
        })?;

        if let Some(group) = config.severity_group
            && group >= regex.captures_len()
        {
            return Err(PatternError::SeverityGroupOutOfRange {
                pattern: config.regex.clone(),
                group,
            });
        }

        let template = Template::parse(config.output.as_deref().unwrap_or("$0"));

        Ok(RulePattern {
            regex,
            action: config.severity,
            severity_group: config.severity_group,
            template,
        })
    }

    pub fn regex_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Evaluates this pattern against one line.
    ///
    /// Returns `Ok(None)` when the regex does not match. Template rendering
    /// failures surface as errors; the rule set treats them as "no match" for
    /// this pattern and keeps going.
    pub fn evaluate(&self, line: &str) -> Result<Option<PatternMatch>, PatternError> {
        let Some(caps) = self.regex.captures(line) else {
            return Ok(None);
        };

        let output = self.template.render(&caps, self.regex.as_str())?;
        let action = self.resolve_action(&caps);

        Ok(Some(PatternMatch { action, output }))
    }

    /// Resolves the declared action, applying the per-capture severity
    /// override when configured. Unrecognized override text falls back to
    /// the declared severity; structural actions never carry overrides.
    fn resolve_action(&self, caps: &regex::Captures<'_>) -> ResolvedAction {
        let declared = self.action.resolve();
        let ResolvedAction::Log(_) = declared else {
            return declared;
        };
        let Some(group) = self.severity_group else {
            return declared;
        };
        match caps.get(group).and_then(|m| Severity::from_override(m.as_str())) {
            Some(severity) => ResolvedAction::Log(severity),
            None => declared,
        }
    }
}
