use super::current_repo;
use super::diff::print_forest;
use anyhow::Result;
use colored::Colorize;

pub fn status_command() -> Result<()> {
    let repo = current_repo()?;

    match repo.head_ref()? {
        caf::refs::Ref::Sym(branch_ref) => {
            let branch = branch_ref.strip_prefix("heads/").unwrap_or(&branch_ref);
            println!("On branch {}", branch.cyan());
        }
        caf::refs::Ref::Hash(hash) => {
            println!("HEAD detached at {}", &hash[..7.min(hash.len())]);
        }
    }

    let forest = repo.status()?;
    if forest.is_empty() {
        println!("{}", "working directory clean".green());
    } else {
        print_forest(&forest);
    }

    Ok(())
}
