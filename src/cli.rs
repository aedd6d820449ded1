//! Command-line surface: a thin adapter over `caf::repo::Repository`.
//!
//! Every subcommand is a one-line call into the library; none of the core
//! logic (diffing, checkout, object encoding) lives here.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(name = "caf", version, about = "A content-addressable file system", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a new repository in the current directory.
    Init,

    /// Snapshot the working directory and record a commit.
    Commit {
        #[clap(short, long)]
        message: String,
        #[clap(short, long)]
        author: Option<String>,
    },

    /// Show commit history starting from HEAD.
    Log {
        #[clap(short, long, default_value_t = 10)]
        count: usize,
    },

    /// Show uncommitted changes in the working directory.
    Status,

    /// Show the diff between two commit-ish endpoints (defaults to HEAD vs. working directory).
    Diff {
        from: Option<String>,
        to: Option<String>,
    },

    /// Move the working directory to match a commit, branch, or tag.
    Checkout { target: String },

    /// List, create, or delete branches.
    Branch {
        name: Option<String>,
        #[clap(short, long)]
        delete: bool,
        #[clap(long)]
        at: Option<String>,
    },

    /// List, create, or delete tags.
    Tag {
        name: Option<String>,
        #[clap(long)]
        at: Option<String>,
        #[clap(short, long)]
        message: Option<String>,
        #[clap(short, long)]
        delete: bool,
    },

    /// Print the type, size, or content of a stored object.
    CatFile {
        #[clap(short = 't')]
        show_type: bool,
        #[clap(short = 's')]
        show_size: bool,
        #[clap(short = 'p')]
        pretty_print: bool,
        object_hash: String,
    },
}
