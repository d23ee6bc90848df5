//! Search Root Discovery
//!
//! Locates the version-control repository root and the build-module root by
//! invoking external tooling. Both lookups treat a failed or empty result as
//! "not found" rather than an error.

use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// Top-level directory of the enclosing git repository, if any.
pub(crate) fn repo_root() -> Option<PathBuf> {
    let path = command_stdout("git", &["rev-parse", "--show-toplevel"])?;
    Some(PathBuf::from(path))
}

/// Root directory of the enclosing cargo workspace or package, if any.
pub(crate) fn module_root() -> Option<PathBuf> {
    let manifest = command_stdout(
        "cargo",
        &["locate-project", "--workspace", "--message-format", "plain"],
    )?;
    // locate-project prints the manifest path; the module root is its parent.
    PathBuf::from(manifest).parent().map(PathBuf::from)
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = match Command::new(program).args(args).output() {
        Ok(output) => output,
        Err(err) => {
            debug!("failed to run {}: {}", program, err);
            return None;
        }
    };
    if !output.status.success() {
        debug!("{} {:?} exited with {}", program, args, output.status);
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
