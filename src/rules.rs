#![forbid(unsafe_code)]

//! Pattern matching engine and rule-set container

mod pattern;
mod rule_set;

pub use pattern::{PatternConfig, PatternMatch, RulePattern};
pub use rule_set::RuleSet;
