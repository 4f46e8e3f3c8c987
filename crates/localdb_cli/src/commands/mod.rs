//! CLI command implementations.

pub mod inspect;
pub mod tree;
pub mod verify;

use localdb_core::{Config, CoreResult, Database};
use std::path::Path;

/// Opens an existing store; the CLI never creates one.
pub fn open_existing(path: &Path) -> CoreResult<Database> {
    Database::open_with_config(path, Config::new().create_if_missing(false))
}

/// Errors raised by the commands themselves.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The instance path given to `inspect` has no components.
    #[error("empty instance path")]
    EmptyInstancePath,

    /// `verify` found problems.
    #[error("verification failed with {0} issue(s)")]
    VerificationFailed(usize),
}
