#![forbid(unsafe_code)]

//! Integration tests for registry scope semantics
//!
//! These tests verify enable/disable idempotency and the step/build scope
//! rules through the public session API, driven by command markers the way a
//! real build stream would.

use logsieve::registry::{COMMAND_DISABLE, COMMAND_ENABLE, COMMAND_RESET};
use logsieve::session::Session;
use logsieve::translate::{ControlMarker, LogUnit, StreamEvent};
use logsieve::types::Severity;

const GCC_LIKE: &str = r#"
[parser]
id = "gcc"
name = "gcc diagnostics"

[[pattern]]
regex = "^(.*): error: (.*)$"
severity = "error"
output = "$1: $2"

[[pattern]]
regex = "^(.*): warning: (.*)$"
severity = "warn"
output = "$1: $2"
"#;

/// Builds a session with the gcc-like rule set available as a resource and
/// an active build.
fn session_with_resource() -> Session {
    let session = Session::new();
    session.add_resource("gcc.toml", GCC_LIKE);
    session.build_started("/tmp/checkout");
    session
}

fn command(name: &str, scope: &str) -> LogUnit {
    LogUnit::Marker(
        ControlMarker::new(name)
            .with_attr("resource", "gcc.toml")
            .with_attr("scope", scope),
    )
}

#[test]
fn test_double_enable_yields_one_binding() {
    let session = session_with_resource();
    session.process(command(COMMAND_ENABLE, "build"));
    session.process(command(COMMAND_ENABLE, "build"));
    assert_eq!(session.registry().active_count(), 1);

    session.process(command(COMMAND_DISABLE, "build"));
    assert_eq!(session.registry().active_count(), 0);
}

#[test]
fn test_build_disable_removes_step_enabled_binding() {
    let session = session_with_resource();
    session.step_started("/tmp/work");
    session.process(command(COMMAND_ENABLE, "step"));
    assert_eq!(session.registry().active_count(), 1);

    session.process(command(COMMAND_DISABLE, "build"));
    assert_eq!(session.registry().active_count(), 0);
}

#[test]
fn test_step_disable_leaves_build_enabled_binding() {
    let session = session_with_resource();
    session.process(command(COMMAND_ENABLE, "build"));
    session.process(command(COMMAND_DISABLE, "step"));
    assert_eq!(session.registry().active_count(), 1);
}

#[test]
fn test_lesser_scope_reenable_is_a_no_op() {
    let session = session_with_resource();
    session.process(command(COMMAND_ENABLE, "build"));
    session.process(command(COMMAND_ENABLE, "step"));
    assert_eq!(session.registry().active_count(), 1);

    // The original build scope still governs the binding.
    session.step_finished();
    assert_eq!(session.registry().active_count(), 1);
}

#[test]
fn test_enable_of_missing_resource_reports_and_changes_nothing() {
    let session = Session::new();
    session.build_started("/tmp/checkout");
    let events = session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_ENABLE).with_attr("resource", "nope.toml"),
    ));

    let [StreamEvent::Record(record)] = events.as_slice() else {
        panic!("expected a single error record, got {:?}", events);
    };
    assert_eq!(record.severity, Severity::Error);
    assert_eq!(session.registry().active_count(), 0);
}

#[test]
fn test_reset_is_scope_bounded() {
    let session = session_with_resource();
    session.add_resource("other.toml", GCC_LIKE);
    session.step_started("/tmp/work");
    session.process(command(COMMAND_ENABLE, "build"));
    session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_ENABLE)
            .with_attr("resource", "other.toml")
            .with_attr("scope", "step"),
    ));
    assert_eq!(session.registry().active_count(), 2);

    // A step-scoped reset only removes the step binding.
    session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_RESET).with_attr("scope", "step"),
    ));
    assert_eq!(session.registry().active_count(), 1);

    session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_RESET).with_attr("scope", "build"),
    ));
    assert_eq!(session.registry().active_count(), 0);
}

#[test]
fn test_scope_attribute_is_case_insensitive_and_defaults_to_step() {
    let session = session_with_resource();
    session.step_started("/tmp/work");
    session.process(command(COMMAND_ENABLE, "BUILD"));
    session.step_finished();
    // A BUILD binding survives the step boundary.
    assert_eq!(session.registry().active_count(), 1);
    session.build_finished();

    session.build_started("/tmp/checkout");
    session.step_started("/tmp/work");
    // No scope attribute at all: step is the default.
    session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_ENABLE).with_attr("resource", "gcc.toml"),
    ));
    assert_eq!(session.registry().active_count(), 1);
    session.step_finished();
    assert_eq!(session.registry().active_count(), 0);
}

#[test]
fn test_file_enable_resolves_against_scope_directory() {
    let checkout = tempfile::TempDir::new().unwrap();
    std::fs::write(checkout.path().join("parsers.toml"), GCC_LIKE).unwrap();

    let session = Session::new();
    session.build_started(checkout.path());

    let events = session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_ENABLE)
            .with_attr("file", "parsers.toml")
            .with_attr("scope", "build"),
    ));
    assert!(events.is_empty(), "enable should be silent: {:?}", events);
    assert_eq!(session.registry().active_count(), 1);
}

#[test]
fn test_step_scoped_file_enable_without_step_fails() {
    let session = Session::new();
    session.build_started("/tmp/checkout");

    // No step_started, so a relative step-scoped file has no anchor.
    let events = session.process(LogUnit::Marker(
        ControlMarker::new(COMMAND_ENABLE).with_attr("file", "parsers.toml"),
    ));
    let [StreamEvent::Record(record)] = events.as_slice() else {
        panic!("expected a single error record, got {:?}", events);
    };
    assert_eq!(record.severity, Severity::Error);
}

#[test]
fn test_build_finished_clears_bindings_but_not_catalog() {
    let session = session_with_resource();
    session.process(command(COMMAND_ENABLE, "build"));
    assert_eq!(session.registry().active_count(), 1);

    session.build_finished();
    assert_eq!(session.registry().active_count(), 0);

    // The next build can re-enable from the same resource.
    session.build_started("/tmp/checkout2");
    session.process(command(COMMAND_ENABLE, "build"));
    assert_eq!(session.registry().active_count(), 1);
}
