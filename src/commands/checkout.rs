use super::current_repo;
use anyhow::Result;

pub fn checkout_command(target: &str) -> Result<()> {
    let repo = current_repo()?;
    repo.checkout(target)?;
    println!("Switched to {}", target);
    Ok(())
}
