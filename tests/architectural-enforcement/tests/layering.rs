//! Integration Test: Layering
//!
//! **Policy**: the session reducer is a pure function of its events. It must
//! not reach for the runtime, do I/O, or take locks; the runner owns all of
//! that. The core crate as a whole must stay terminal-agnostic so it can be
//! driven headless.

use architectural_enforcement::{find_violations, report, rust_files};

#[test]
fn test_session_reducer_is_pure() {
    let violations = find_violations(
        "bridge/core/src/session",
        &[
            "tokio",
            "std::io",
            "std::fs",
            "std::sync::Mutex",
            "parking_lot",
            "std::thread",
            "Instant::now",
        ],
    );
    report("Session reducer must stay free of I/O, runtime and locks", &violations);
}

#[test]
fn test_core_has_no_terminal_dependency() {
    let violations = find_violations("bridge/core/src", &["crossterm", "ratatui"]);
    report("Core crate must not depend on a terminal library", &violations);
}

#[test]
fn test_dispatch_does_no_io() {
    let violations = find_violations("bridge/core/src/dispatch.rs", &["tokio", "std::io"]);
    report("Dispatch must only route envelopes", &violations);
}

#[test]
fn test_session_sources_found() {
    // Guards against the checks above passing because the paths moved
    assert!(!rust_files("bridge/core/src/session").is_empty());
    assert!(!rust_files("tui/src").is_empty());
}
