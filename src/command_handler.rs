use crate::cli::Commands;
use crate::commands::{branch, cat_file, checkout, commit, diff, init, log, status, tag};
use anyhow::Result;

pub fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::Init => init::init_command(),
        Commands::Commit { message, author } => commit::commit_command(&message, author.as_deref()),
        Commands::Log { count } => log::log_command(count),
        Commands::Status => status::status_command(),
        Commands::Diff { from, to } => diff::diff_command(from.as_deref(), to.as_deref()),
        Commands::Checkout { target } => checkout::checkout_command(&target),
        Commands::Branch { name, delete, at } => branch::branch_command(name.as_deref(), delete, at.as_deref()),
        Commands::Tag { name, at, message, delete } => {
            tag::tag_command(name.as_deref(), at.as_deref(), message.as_deref(), delete)
        }
        Commands::CatFile { show_type, show_size, pretty_print, object_hash } => {
            cat_file::cat_file_command(&object_hash, show_type, show_size, pretty_print)
        }
    }
}
