//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce the layering rules
//! of the workspace:
//! - The session reducer stays pure (no I/O, no runtime, no locks)
//! - The core crate knows nothing about terminals
//! - Production code propagates errors instead of panicking
//!
//! The helpers here walk source trees and hand back the non-test lines of
//! each file with comments stripped.

use std::fs;
use std::path::{Path, PathBuf};

/// Workspace root, resolved from this crate's manifest directory
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

/// All `.rs` files under `dir` (relative to the workspace root)
#[must_use]
pub fn rust_files(dir: &str) -> Vec<PathBuf> {
    let path = workspace_root().join(dir);
    if !path.exists() {
        return Vec::new();
    }
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Production lines of a file as `(line_number, code)`
///
/// Stops at the first `#[cfg(test)]` and drops `//` comments.
#[must_use]
pub fn production_lines(path: &Path) -> Vec<(usize, String)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    content
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line).to_string()))
        .filter(|(_, code)| !code.trim().is_empty())
        .collect()
}

/// Every production line under `dir` containing one of `needles`
#[must_use]
pub fn find_violations(dir: &str, needles: &[&str]) -> Vec<String> {
    let mut violations = Vec::new();
    for file in rust_files(dir) {
        for (line_number, code) in production_lines(&file) {
            if let Some(needle) = needles.iter().find(|n| code.contains(*n)) {
                violations.push(format!(
                    "{}:{} - `{}`: {}",
                    file.display(),
                    line_number,
                    needle,
                    code.trim()
                ));
            }
        }
    }
    violations
}

/// Print violations and panic if there are any
pub fn report(rule: &str, violations: &[String]) {
    if violations.is_empty() {
        return;
    }
    eprintln!("\n❌ {rule}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    panic!("\nFound {} violation(s): {rule}", violations.len());
}
