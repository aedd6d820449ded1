//! The library's error taxonomy.
//!
//! Boundary-visible failures are grouped into the kinds below rather than a
//! single opaque error, so callers (and the CLI layer, via `anyhow::Context`)
//! can match on what actually went wrong.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CafError {
    #[error("repository not found at {0}")]
    RepositoryNotFound(PathBuf),

    #[error("repository already exists at {0}")]
    RepositoryAlreadyExists(PathBuf),

    #[error("branch '{0}' not found")]
    BranchNotFound(String),

    #[error("branch '{0}' already exists")]
    BranchAlreadyExists(String),

    #[error("cannot delete the last remaining branch '{0}'")]
    LastBranch(String),

    #[error("tag '{0}' not found")]
    TagNotFound(String),

    #[error("tag '{0}' already exists")]
    TagAlreadyExists(String),

    #[error("unknown object hash '{0}'")]
    UnknownHash(String),

    #[error("invalid hash string '{0}'")]
    InvalidHash(String),

    #[error("ref error: {0}")]
    RefResolution(String),

    #[error("ref cycle detected while resolving '{0}'")]
    RefCycle(String),

    #[error("traversal error: {0}")]
    Traversal(String),

    #[error("missing moved-from path: {0}")]
    MissingMovedFrom(String),

    #[error("failed to move '{from}' to '{to}': {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove '{path}': {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("object integrity error: {0}")]
    Integrity(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CafError>;
