//! Error Types
//!
//! The typed failures a caller can observe from resolution, loading, and
//! watch setup. Per-file parse failures never abort a load; they are
//! collected and surfaced together once the batch completes.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by loading and watching env files.
#[derive(Debug, Error)]
pub enum Error {
    /// Resolution produced zero candidate files; nothing was merged.
    #[error("no env files found to load")]
    NoFilesToLoad,

    /// One file failed to parse. Carries the offending path; the batch
    /// continues past it.
    #[error("failed to parse env file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// Two or more files failed in one call. Display joins the individual
    /// messages with newlines.
    #[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("\n"))]
    Aggregate(Vec<Error>),

    /// The filesystem watch could not be armed. Fatal to that watch session
    /// only.
    #[error("failed to arm watch for {path}: {source}")]
    WatchSetup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl Error {
    /// Collapse per-file failures into a single error value, or `Ok` when
    /// there were none.
    pub(crate) fn from_failures(mut failures: Vec<Error>) -> crate::Result<()> {
        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(Error::Aggregate(failures)),
        }
    }
}
