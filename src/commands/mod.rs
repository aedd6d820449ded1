//! CLI subcommands: thin adapters over [`caf::repo::Repository`].

pub mod branch;
pub mod cat_file;
pub mod checkout;
pub mod commit;
pub mod diff;
pub mod init;
pub mod log;
pub mod status;
pub mod tag;

use caf::repo::Repository;
use std::env;

/// Every command operates on a repository rooted at the process's current
/// directory -- the library itself has no notion of a "current" repository.
pub(crate) fn current_repo() -> anyhow::Result<Repository> {
    Ok(Repository::new(env::current_dir()?))
}
