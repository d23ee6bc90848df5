//! Lookup Policy
//!
//! Caller-owned configuration describing which env files to look for and
//! where. A `Policy` is read-only for the duration of one resolve or load
//! call; there is no process-wide default instance.

use std::path::PathBuf;

/// Canonical file name used when no candidate names are configured and for
/// directory-to-file expansion.
pub const DEFAULT_FILE_NAME: &str = ".env";

/// Lookup configuration for resolving env files.
#[derive(Debug, Clone)]
pub struct Policy {
    /// File names to look for, in order. Empty means the canonical `.env`.
    pub candidate_names: Vec<String>,
    /// Directories to search, in order.
    pub search_dirs: Vec<PathBuf>,
    /// Also look for candidates at the version-control repository root.
    pub lookup_repo_root: bool,
    /// Also look for candidates at the build-module root (the directory of
    /// the workspace-root `Cargo.toml`).
    pub lookup_module_root: bool,
    /// Skip `$VAR`/`${VAR}` interpolation inside candidate names.
    pub disable_name_expansion: bool,
    /// Skip `$VAR`/`${VAR}` interpolation inside search-directory paths.
    pub disable_path_expansion: bool,
    /// Emit per-file resolution and merge diagnostics.
    pub debug: bool,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            candidate_names: Vec::new(),
            search_dirs: vec![PathBuf::from(".")],
            lookup_repo_root: false,
            lookup_module_root: false,
            disable_name_expansion: false,
            disable_path_expansion: false,
            debug: false,
        }
    }
}

impl Policy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file name to look for (e.g. `.env.test`).
    pub fn with_candidate_name(mut self, name: impl Into<String>) -> Self {
        self.candidate_names.push(name.into());
        self
    }

    /// Replace the search directories.
    pub fn with_search_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_dirs = dirs;
        self
    }

    /// Append a directory to search.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dirs.push(dir.into());
        self
    }

    pub fn with_repo_root_lookup(mut self) -> Self {
        self.lookup_repo_root = true;
        self
    }

    pub fn with_module_root_lookup(mut self) -> Self {
        self.lookup_module_root = true;
        self
    }

    pub fn without_name_expansion(mut self) -> Self {
        self.disable_name_expansion = true;
        self
    }

    pub fn without_path_expansion(mut self) -> Self {
        self.disable_path_expansion = true;
        self
    }

    pub fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }

    /// The configured candidate names, or the canonical default when none
    /// are set.
    pub(crate) fn candidate_names_or_default(&self) -> Vec<String> {
        if self.candidate_names.is_empty() {
            vec![DEFAULT_FILE_NAME.to_string()]
        } else {
            self.candidate_names.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_searches_cwd_for_dotenv() {
        let policy = Policy::default();
        assert_eq!(policy.search_dirs, vec![PathBuf::from(".")]);
        assert_eq!(policy.candidate_names_or_default(), vec![".env"]);
        assert!(!policy.lookup_repo_root);
        assert!(!policy.lookup_module_root);
    }

    #[test]
    fn configured_names_take_priority_over_default() {
        let policy = Policy::new()
            .with_candidate_name(".env.test")
            .with_candidate_name(".env.local");
        assert_eq!(
            policy.candidate_names_or_default(),
            vec![".env.test", ".env.local"]
        );
    }
}
