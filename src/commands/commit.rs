use super::current_repo;
use anyhow::Result;

pub fn commit_command(message: &str, author: Option<&str>) -> Result<()> {
    let repo = current_repo()?;
    let hash = repo.commit(author, message)?;
    println!("[{}] {}", &hash[..7], message);
    Ok(())
}
