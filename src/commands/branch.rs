use super::current_repo;
use anyhow::Result;
use colored::Colorize;

pub fn branch_command(name: Option<&str>, delete: bool, at: Option<&str>) -> Result<()> {
    let repo = current_repo()?;

    if delete {
        let name = name.ok_or_else(|| anyhow::anyhow!("branch name required for deletion"))?;
        repo.delete_branch(name)?;
        println!("Deleted branch '{}'", name.red());
        return Ok(());
    }

    if let Some(name) = name {
        let at_commit = match at {
            Some(hash) => hash.to_string(),
            None => repo
                .head_commit()?
                .ok_or_else(|| anyhow::anyhow!("no commits yet to branch from"))?,
        };
        repo.add_branch(name, &at_commit)?;
        println!("Created branch '{}' at {}", name.green(), &at_commit[..7]);
        return Ok(());
    }

    let current = match repo.head_ref()? {
        caf::refs::Ref::Sym(branch_ref) => branch_ref.strip_prefix("heads/").map(|s| s.to_string()),
        caf::refs::Ref::Hash(_) => None,
    };

    for branch in repo.branches()? {
        let marker = if Some(&branch) == current.as_ref() { "* " } else { "  " };
        println!("{}{}", marker, branch);
    }

    Ok(())
}
