#![forbid(unsafe_code)]

//! Stream units: free text and pre-parsed control markers

use std::collections::HashMap;
use std::fmt;

/// A structured marker carried in the output stream
///
/// Markers arrive already decoded from the wire protocol; only their command
/// semantics are interpreted here. A marker has a name, an optional bare
/// argument, and named attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlMarker {
    name: String,
    argument: Option<String>,
    attrs: HashMap<String, String>,
}

impl ControlMarker {
    pub fn new(name: impl Into<String>) -> Self {
        ControlMarker {
            name: name.into(),
            argument: None,
            attrs: HashMap::new(),
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bare argument, if present and non-blank.
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Attribute value, if present and non-blank.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str).filter(|s| !s.trim().is_empty())
    }
}

impl fmt::Display for ControlMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(argument) = &self.argument {
            write!(f, " '{}'", argument)?;
        }
        let mut keys: Vec<&String> = self.attrs.keys().collect();
        keys.sort();
        for key in keys {
            write!(f, " {}='{}'", key, self.attrs[key])?;
        }
        Ok(())
    }
}

/// One unit of build output offered to the translators
#[derive(Debug, Clone, PartialEq)]
pub enum LogUnit {
    Text(String),
    Marker(ControlMarker),
}

impl LogUnit {
    pub fn text(text: impl Into<String>) -> Self {
        LogUnit::Text(text.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_attrs_are_absent() {
        let marker = ControlMarker::new("cmd")
            .with_attr("scope", "  ")
            .with_attr("name", "gcc");
        assert_eq!(marker.attr("scope"), None);
        assert_eq!(marker.attr("name"), Some("gcc"));
        assert_eq!(marker.attr("missing"), None);
    }

    #[test]
    fn test_blank_argument_is_absent() {
        let marker = ControlMarker::new("cmd").with_argument("");
        assert_eq!(marker.argument(), None);
        let marker = ControlMarker::new("cmd").with_argument("gcc");
        assert_eq!(marker.argument(), Some("gcc"));
    }

    #[test]
    fn test_display_is_stable() {
        let marker = ControlMarker::new("cmd")
            .with_attr("scope", "build")
            .with_attr("name", "gcc");
        assert_eq!(marker.to_string(), "cmd name='gcc' scope='build'");
    }
}
