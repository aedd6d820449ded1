use super::current_repo;
use anyhow::Result;
use colored::Colorize;

pub fn tag_command(
    name: Option<&str>,
    at: Option<&str>,
    message: Option<&str>,
    delete: bool,
) -> Result<()> {
    let repo = current_repo()?;

    if delete {
        let name = name.ok_or_else(|| anyhow::anyhow!("tag name required for deletion"))?;
        repo.delete_tag(name)?;
        println!("Deleted tag '{}'", name.red());
        return Ok(());
    }

    if let Some(name) = name {
        let at_commit = match at {
            Some(hash) => hash.to_string(),
            None => repo
                .head_commit()?
                .ok_or_else(|| anyhow::anyhow!("no commits yet to tag"))?,
        };
        let message = message.ok_or_else(|| anyhow::anyhow!("tag message required"))?;
        repo.create_tag(name, &at_commit, None, message)?;
        println!("Created tag '{}' at {}", name.green(), &at_commit[..7]);
        return Ok(());
    }

    for tag in repo.tags()? {
        println!("{}", tag);
    }

    Ok(())
}
