//! Integration Test: Panic Prohibition
//!
//! **Policy**: production code returns errors with `?` or logs and carries on.
//! `unwrap()` and `expect()` are only allowed in tests.

use architectural_enforcement::{find_violations, report};

#[test]
fn test_no_unwrap_in_production_code() {
    let mut violations = find_violations("bridge/core/src", &[".unwrap()", ".expect("]);
    violations.extend(find_violations("tui/src", &[".unwrap()", ".expect("]));
    report("unwrap()/expect() in production code", &violations);
}

#[test]
fn test_no_stdout_printing_in_surface() {
    // stdout is the wire; a stray print corrupts the protocol stream
    let mut violations = find_violations("tui/src", &["println!", "print!("]);
    violations.extend(find_violations("bridge/core/src", &["println!", "print!("]));
    report("Printing to stdout outside the transport", &violations);
}
