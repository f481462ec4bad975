#![forbid(unsafe_code)]

//! Control commands carried as markers in the output stream
//!
//! Commands `logParser.enable`, `logParser.disable` and `logParser.reset`
//! manipulate the parser registry while output is streaming. A parser is
//! identified by the `id`/`name`, `resource` or `file` attribute, or by a
//! bare argument; `scope` resolves case-insensitively to step/build and
//! defaults to step.

use crate::translate::ControlMarker;
use crate::types::{ParserId, Scope};

const PREFIX: &str = "logParser.";

pub const COMMAND_ENABLE: &str = "logParser.enable";
pub const COMMAND_DISABLE: &str = "logParser.disable";
pub const COMMAND_RESET: &str = "logParser.reset";

/// A decoded registry command
#[derive(Debug, Clone, PartialEq)]
pub enum ParserCommand {
    Enable { id: ParserId, scope: Scope },
    Disable { id: ParserId, scope: Scope },
    Reset { scope: Scope },
}

/// Why a marker could not be decoded into a command
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unsupported command '{0}'")]
    UnknownCommand(String),

    #[error("Command '{0}' requires an 'id', 'name', 'resource' or 'file' attribute, or an argument")]
    MissingIdentifier(String),
}

impl ParserCommand {
    /// Whether this marker belongs to the command namespace at all.
    pub fn is_command(marker: &ControlMarker) -> bool {
        marker.name().starts_with(PREFIX)
    }

    /// Decodes a command marker.
    ///
    /// # Errors
    ///
    /// Returns `CommandError` for an unknown command name or an
    /// enable/disable without any parser identification. Callers surface
    /// this as a build-log warning and drop the marker.
    pub fn from_marker(marker: &ControlMarker) -> Result<Self, CommandError> {
        let scope = Scope::parse_or_default(marker.attr("scope"));
        match marker.name() {
            COMMAND_ENABLE => Ok(ParserCommand::Enable {
                id: parser_id(marker)?,
                scope,
            }),
            COMMAND_DISABLE => Ok(ParserCommand::Disable {
                id: parser_id(marker)?,
                scope,
            }),
            COMMAND_RESET => Ok(ParserCommand::Reset { scope }),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Resolution precedence: explicit id/name before resource before file; a
/// bare argument stands in for a name.
fn parser_id(marker: &ControlMarker) -> Result<ParserId, CommandError> {
    if let Some(id) = marker.attr("id").or_else(|| marker.attr("name")) {
        return Ok(ParserId::by_name(id));
    }
    if let Some(resource) = marker.attr("resource") {
        return Ok(ParserId::by_resource(resource));
    }
    if let Some(file) = marker.attr("file") {
        return Ok(ParserId::by_file(file));
    }
    if let Some(argument) = marker.argument() {
        return Ok(ParserId::by_name(argument));
    }
    Err(CommandError::MissingIdentifier(marker.name().to_string()))
}
