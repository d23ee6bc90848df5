//! Env File Resolution
//!
//! Turns a [`Policy`] (plus optional explicit file names) into an ordered,
//! deduplicated list of existing absolute paths. Resolution runs as a
//! pipeline of candidate-producing stages: the search-directory stage, then
//! the repository-root stage, then the module-root stage, each appending to
//! a shared accumulator. Discovery order is preserved because it determines
//! merge precedence later; the final step filters the candidates down to
//! paths that exist at this moment.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::policy::{Policy, DEFAULT_FILE_NAME};

mod expand;
mod roots;

use expand::expand_env;

/// Resolve the env files selected by `policy`. Non-empty `explicit` names
/// replace the policy's candidate names for this call.
pub fn resolve<S: AsRef<str>>(policy: &Policy, explicit: &[S]) -> Vec<PathBuf> {
    let names = candidate_names(policy, explicit);

    let mut candidates = CandidateSet::default();
    search_dir_stage(policy, &names, &mut candidates);
    if policy.lookup_repo_root {
        root_stage(roots::repo_root(), &names, &mut candidates);
    }
    if policy.lookup_module_root {
        root_stage(roots::module_root(), &names, &mut candidates);
    }

    let resolved = candidates.into_existing();
    if policy.debug {
        debug!(
            "resolved {} env file(s): {:?}",
            resolved.len(),
            resolved
        );
    }
    resolved
}

fn candidate_names<S: AsRef<str>>(policy: &Policy, explicit: &[S]) -> Vec<String> {
    let names = if explicit.is_empty() {
        policy.candidate_names_or_default()
    } else {
        explicit.iter().map(|s| s.as_ref().to_string()).collect()
    };
    if policy.disable_name_expansion {
        names
    } else {
        names.iter().map(|n| expand_env(n)).collect()
    }
}

/// Emits one candidate per (name, search directory) pair. An absolute name
/// skips the directory join but is still subject to the directory
/// iteration, so an empty search list emits nothing; the accumulator's
/// dedup collapses the per-directory repeats.
fn search_dir_stage(policy: &Policy, names: &[String], out: &mut CandidateSet) {
    for name in names {
        for dir in &policy.search_dirs {
            if Path::new(name).is_absolute() {
                out.push(PathBuf::from(name));
                continue;
            }
            let dir = if policy.disable_path_expansion {
                dir.clone()
            } else {
                PathBuf::from(expand_env(&dir.to_string_lossy()))
            };
            out.push(dir.join(name));
        }
    }
}

/// Emits one candidate per name rooted at an externally discovered
/// directory. A root that was not found contributes nothing.
fn root_stage(root: Option<PathBuf>, names: &[String], out: &mut CandidateSet) {
    let Some(root) = root else { return };
    for name in names {
        if !Path::new(name).is_absolute() {
            out.push(root.join(name));
        }
    }
}

/// Ordered accumulator, deduplicated by absolute path.
#[derive(Default)]
struct CandidateSet {
    paths: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

impl CandidateSet {
    fn push(&mut self, path: PathBuf) {
        let path = std::path::absolute(&path).unwrap_or(path);
        // A candidate that names an existing directory stands for the
        // canonically named file inside it.
        let path = if path.is_dir() {
            path.join(DEFAULT_FILE_NAME)
        } else {
            path
        };
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
        }
    }

    fn into_existing(self) -> Vec<PathBuf> {
        self.paths.into_iter().filter(|p| p.exists()).collect()
    }
}
