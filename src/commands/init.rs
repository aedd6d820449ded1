use super::current_repo;
use anyhow::Result;
use colored::Colorize;

pub fn init_command() -> Result<()> {
    let repo = current_repo()?;
    repo.init()?;
    println!(
        "Initialized empty repository in {}",
        repo.repo_dir().display().to_string().green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use caf::repo::Repository;
    use tempfile::tempdir;

    #[test]
    fn init_creates_expected_layout() {
        let dir = tempdir().unwrap();
        let repo = Repository::new(dir.path());
        repo.init().unwrap();

        assert!(repo.objects_dir().is_dir());
        assert!(repo.repo_dir().join("refs/heads").is_dir());
        assert!(repo.repo_dir().join("refs/tags").is_dir());
        assert!(repo.repo_dir().join("HEAD").is_file());
    }
}
