//! Env File Loading
//!
//! Merges resolved env files into the process environment. `load` never
//! overwrites a key that was present when the call began; `overload` writes
//! every key unconditionally, so the later-resolved file wins. A parse
//! failure in one file never aborts the rest of the batch.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::Event;
use tracing::{debug, warn};

use crate::error::Error;
use crate::policy::Policy;
use crate::resolver;
use crate::watcher::WatchSession;
use crate::Result;

/// Resolves and merges env files according to its [`Policy`].
///
/// Each loader is caller-owned; there is no process-wide default instance.
/// Mutating calls take `&mut self`, so a loader shared across threads must
/// live behind a `Mutex`.
#[derive(Debug, Default)]
pub struct Loader {
    policy: Policy,
    loaded: Vec<PathBuf>,
}

impl Loader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: Policy) -> Self {
        Self {
            policy,
            loaded: Vec::new(),
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut Policy {
        &mut self.policy
    }

    /// Paths successfully merged by this loader, in merge order, across all
    /// calls. Diagnostic record only; it never influences later calls.
    pub fn loaded_files(&self) -> &[PathBuf] {
        &self.loaded
    }

    /// Merge the policy's resolved files without overwriting keys that were
    /// already set when the call began.
    pub fn load(&mut self) -> Result<()> {
        self.merge::<&str>(&[], false)
    }

    /// [`Loader::load`] with explicit file names overriding the policy's
    /// candidates for this call.
    pub fn load_files<S: AsRef<str>>(&mut self, files: &[S]) -> Result<()> {
        self.merge(files, false)
    }

    /// Merge the policy's resolved files, overwriting unconditionally. When
    /// two files define the same key, the later-resolved one wins.
    pub fn overload(&mut self) -> Result<()> {
        self.merge::<&str>(&[], true)
    }

    /// [`Loader::overload`] with explicit file names.
    pub fn overload_files<S: AsRef<str>>(&mut self, files: &[S]) -> Result<()> {
        self.merge(files, true)
    }

    fn merge<S: AsRef<str>>(&mut self, files: &[S], overwrite: bool) -> Result<()> {
        let resolved = resolver::resolve(&self.policy, files);
        if resolved.is_empty() {
            if self.policy.debug {
                debug!("no env files found to load");
            }
            return Err(Error::NoFilesToLoad);
        }

        // Key set of the pre-call environment, taken once. Every file in
        // this call merges against it, so in no-overwrite mode a key that
        // was absent before the call takes the value from the last resolved
        // file that defines it.
        let snapshot: HashSet<String> = std::env::vars_os()
            .filter_map(|(key, _)| key.into_string().ok())
            .collect();

        let mut failures = Vec::new();
        for path in resolved {
            let mapping = match parse_file(&path) {
                Ok(mapping) => mapping,
                Err(err) => {
                    warn!("skipping env file {}: {}", path.display(), err);
                    failures.push(err);
                    continue;
                }
            };
            for (key, value) in mapping {
                if overwrite || !snapshot.contains(&key) {
                    std::env::set_var(&key, &value);
                }
            }
            if self.policy.debug {
                debug!("merged env file {}", path.display());
            }
            self.loaded.push(path);
        }

        Error::from_failures(failures)
    }

    /// Arm a watch session on every file the policy currently resolves.
    /// The callback runs on each session's worker thread; sessions end on
    /// their own when their file is removed or the notification stream
    /// fails.
    pub fn watch<F>(&self, on_change: F) -> Result<Vec<WatchSession>>
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let resolved = resolver::resolve::<&str>(&self.policy, &[]);
        if resolved.is_empty() {
            return Err(Error::NoFilesToLoad);
        }
        let on_change: Arc<dyn Fn(&Event) + Send + Sync> = Arc::new(on_change);
        resolved
            .into_iter()
            .map(|path| WatchSession::spawn_shared(path, Arc::clone(&on_change)))
            .collect()
    }
}

/// One file's bytes through the external dotenv parser into a key/value
/// mapping. Quoting, comments, and in-value substitution are the parser's
/// concern.
fn parse_file(path: &Path) -> Result<HashMap<String, String>> {
    let entries = dotenvy::from_path_iter(path).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let mut mapping = HashMap::new();
    for entry in entries {
        let (key, value) = entry.map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        mapping.insert(key, value);
    }
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::env_lock;
    use std::fs;
    use tempfile::TempDir;

    fn loader_for(dir: &TempDir) -> Loader {
        Loader::with_policy(Policy::new().with_search_dirs(vec![dir.path().to_path_buf()]))
    }

    #[test]
    fn load_with_nothing_resolvable_is_no_files_to_load() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();

        let err = loader_for(&dir).load().unwrap_err();
        assert!(matches!(err, Error::NoFilesToLoad));
    }

    #[test]
    fn load_sets_absent_keys() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DL_LOADER_NEW=from_file\n").unwrap();
        std::env::remove_var("DL_LOADER_NEW");

        loader_for(&dir).load().unwrap();
        assert_eq!(std::env::var("DL_LOADER_NEW").unwrap(), "from_file");

        std::env::remove_var("DL_LOADER_NEW");
    }

    #[test]
    fn load_keeps_preexisting_values() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DL_LOADER_KEPT=from_file\n").unwrap();
        std::env::set_var("DL_LOADER_KEPT", "preset");

        loader_for(&dir).load().unwrap();
        assert_eq!(std::env::var("DL_LOADER_KEPT").unwrap(), "preset");

        std::env::remove_var("DL_LOADER_KEPT");
    }

    #[test]
    fn overload_overwrites_preexisting_values() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DL_LOADER_OVER=from_file\n").unwrap();
        std::env::set_var("DL_LOADER_OVER", "preset");

        loader_for(&dir).overload().unwrap();
        assert_eq!(std::env::var("DL_LOADER_OVER").unwrap(), "from_file");

        std::env::remove_var("DL_LOADER_OVER");
    }

    #[test]
    fn parse_failure_does_not_abort_the_batch() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.env"), "NOT A VALID LINE\n").unwrap();
        fs::write(dir.path().join("good.env"), "DL_LOADER_GOOD=1\n").unwrap();
        std::env::remove_var("DL_LOADER_GOOD");

        let mut loader = loader_for(&dir);
        let err = loader.load_files(&["bad.env", "good.env"]).unwrap_err();

        assert!(matches!(err, Error::Parse { .. }));
        assert_eq!(std::env::var("DL_LOADER_GOOD").unwrap(), "1");
        assert_eq!(loader.loaded_files(), [dir.path().join("good.env")]);

        std::env::remove_var("DL_LOADER_GOOD");
    }

    #[test]
    fn loaded_files_record_appends_across_calls() {
        let _lock = env_lock().lock().unwrap();
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), "DL_LOADER_RECORD=1\n").unwrap();

        let mut loader = loader_for(&dir);
        loader.load().unwrap();
        loader.overload().unwrap();
        assert_eq!(
            loader.loaded_files(),
            [dir.path().join(".env"), dir.path().join(".env")]
        );

        std::env::remove_var("DL_LOADER_RECORD");
    }
}
