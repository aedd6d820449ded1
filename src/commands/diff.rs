use super::current_repo;
use caf::diff::{walk_pre_order, DiffKind, DiffNode};
use anyhow::Result;
use colored::Colorize;

/// Print a diff forest the way `git diff --stat`-adjacent tools do: one
/// line per node, prefixed by a single-letter kind marker.
pub fn print_forest(forest: &[DiffNode]) {
    if forest.is_empty() {
        println!("{}", "no differences".dimmed());
        return;
    }

    for node in walk_pre_order(forest) {
        match &node.kind {
            DiffKind::Added => println!("{} {}", "A".green(), node.path),
            DiffKind::Removed => println!("{} {}", "R".red(), node.path),
            DiffKind::Modified => println!("{} {}", "M".yellow(), node.path),
            DiffKind::MovedTo { to_path } => {
                println!("{} {} -> {}", "→".cyan(), node.path, to_path)
            }
            DiffKind::MovedFrom { .. } => {
                // The paired MovedTo line (at the old location) already
                // reports this move.
            }
        }
    }
}

/// Resolve a CLI-supplied endpoint (hash, branch, or tag name) to a commit
/// hash, using the same precedence rules `checkout` uses.
fn resolve_endpoint(repo: &caf::repo::Repository, endpoint: &str) -> Result<String> {
    Ok(caf::refs::resolve_checkout_target(
        &repo.repo_dir(),
        &repo.objects_dir(),
        endpoint,
    )?)
}

/// `caf diff [from] [to]`: with no arguments, diffs HEAD against the
/// working directory (equivalent to `status`); with one or two commit-ish
/// arguments, diffs those endpoints directly.
pub fn diff_command(from: Option<&str>, to: Option<&str>) -> Result<()> {
    let repo = current_repo()?;

    let forest = match (from, to) {
        (None, None) => repo.status()?,
        (Some(from), None) => {
            let from = resolve_endpoint(&repo, from)?;
            repo.diff_commits(Some(&from), repo.head_commit()?.as_deref())?
        }
        (Some(from), Some(to)) => {
            let from = resolve_endpoint(&repo, from)?;
            let to = resolve_endpoint(&repo, to)?;
            repo.diff_commits(Some(&from), Some(&to))?
        }
        (None, Some(_)) => {
            anyhow::bail!("a 'from' endpoint is required when 'to' is given")
        }
    };

    print_forest(&forest);
    Ok(())
}
