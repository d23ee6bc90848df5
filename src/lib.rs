//! dotenv-loader Library
//!
//! Resolves `.env`-style files from a layered search policy, merges their
//! key/value pairs into the process environment under a configurable
//! precedence rule, and optionally watches the resolved files so callers can
//! reload when they change.
//!
//! The dotenv text format itself is parsed by the `dotenvy` crate; filesystem
//! change notification comes from the `notify` crate.

pub mod error;
pub mod loader;
pub mod policy;
pub mod resolver;
pub mod watcher;

pub use error::Error;
pub use loader::Loader;
pub use policy::{Policy, DEFAULT_FILE_NAME};
pub use watcher::{WatchSession, WatchState};

/// Common result type for the crate
pub type Result<T> = std::result::Result<T, Error>;
