//! The repository facade: the crate's main public entry point.
//!
//! An explicit-path, synchronous struct so multiple repositories can
//! coexist in one process (handy for tests, and more honest about what the
//! type actually depends on than a process-global, CWD-rooted singleton).

use crate::config::{Config, PersistentConfig};
use crate::diff::{self, DiffNode};
use crate::error::{CafError, Result};
use crate::objects::blob::Blob;
use crate::objects::commit::Commit;
use crate::objects::tag::Tag;
use crate::objects::tree::{self, Tree};
use crate::objects::{Loadable, Storable};
use crate::refs::{self, Ref};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct LogEntry {
    pub hash: String,
    pub commit: Commit,
}

pub struct Repository {
    pub working_dir: PathBuf,
    pub repo_dir_name: String,
}

impl Repository {
    /// Construct a handle without requiring the repository to exist yet;
    /// most operations check existence themselves before doing anything.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            repo_dir_name: crate::config::DEFAULT_REPO_DIR.to_string(),
        }
    }

    pub fn with_repo_dir_name(mut self, name: impl Into<String>) -> Self {
        self.repo_dir_name = name.into();
        self
    }

    pub fn repo_dir(&self) -> PathBuf {
        self.working_dir.join(&self.repo_dir_name)
    }

    pub fn objects_dir(&self) -> PathBuf {
        self.repo_dir().join("objects")
    }

    pub fn config_path(&self) -> PathBuf {
        self.repo_dir().join("config.toml")
    }

    pub fn exists(&self) -> bool {
        self.repo_dir().is_dir()
    }

    fn require_exists(&self) -> Result<()> {
        if !self.exists() {
            return Err(CafError::RepositoryNotFound(self.working_dir.clone()));
        }
        Ok(())
    }

    pub fn config(&self) -> Result<Config> {
        Ok(Config::read_from_file(&self.config_path())?)
    }

    /// Create the on-disk layout: `<repo_dir>/objects`, `refs/heads`,
    /// `refs/tags`, and a `HEAD` symbolically pointing at `refs/heads/main`.
    /// Also creates an initial empty branch so `head_ref`/`branches` have
    /// something to report immediately after init.
    pub fn init(&self) -> Result<()> {
        if self.exists() {
            return Err(CafError::RepositoryAlreadyExists(self.working_dir.clone()));
        }

        log::info!("initializing repository at {}", self.repo_dir().display());

        std::fs::create_dir_all(self.objects_dir())?;
        std::fs::create_dir_all(self.repo_dir().join("refs/heads"))?;
        std::fs::create_dir_all(self.repo_dir().join("refs/tags"))?;

        // An empty-string hash ref means "branch exists but has no commits
        // yet" -- resolve_ref on it is only ever called after the first
        // commit rewrites it to a real hash.
        std::fs::write(refs::ref_path(&self.repo_dir(), "heads/main"), "")?;

        refs::write_ref(&self.repo_dir(), "HEAD", &Ref::Sym("heads/main".to_string()))?;

        Config::default().write_to_file(&self.config_path())?;

        Ok(())
    }

    // --- Branches -----------------------------------------------------

    pub fn branches(&self) -> Result<Vec<String>> {
        self.require_exists()?;
        refs::list_refs(&self.repo_dir(), refs::HEADS_PREFIX)
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        refs::ref_exists(&self.repo_dir(), &format!("heads/{}", name))
    }

    pub fn add_branch(&self, name: &str, at_commit: &str) -> Result<()> {
        self.require_exists()?;
        if name.is_empty() {
            return Err(CafError::Validation("branch name is required".to_string()));
        }
        if !crate::hash::is_valid_hash(at_commit) {
            return Err(CafError::InvalidHash(at_commit.to_string()));
        }
        if self.branch_exists(name) {
            return Err(CafError::BranchAlreadyExists(name.to_string()));
        }
        refs::write_ref(
            &self.repo_dir(),
            &format!("heads/{}", name),
            &Ref::Hash(at_commit.to_string()),
        )
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        self.require_exists()?;
        if !self.branch_exists(name) {
            return Err(CafError::BranchNotFound(name.to_string()));
        }
        if self.branches()?.len() <= 1 {
            return Err(CafError::LastBranch(name.to_string()));
        }
        refs::delete_ref(&self.repo_dir(), &format!("heads/{}", name))
    }

    // --- Refs -----------------------------------------------------------

    pub fn refs(&self) -> Result<Vec<String>> {
        self.require_exists()?;
        refs::all_refs(&self.repo_dir())
    }

    pub fn head_ref(&self) -> Result<Ref> {
        self.require_exists()?;
        refs::read_ref(&self.repo_dir(), "HEAD")
    }

    pub fn head_commit(&self) -> Result<Option<String>> {
        self.require_exists()?;
        let hash = self.resolve_ref("HEAD")?;
        if hash.is_empty() { Ok(None) } else { Ok(Some(hash)) }
    }

    pub fn resolve_ref(&self, ref_name: &str) -> Result<String> {
        self.require_exists()?;
        refs::resolve_ref(&self.repo_dir(), &self.objects_dir(), ref_name)
    }

    pub fn update_ref(&self, ref_name: &str, value: Ref) -> Result<()> {
        self.require_exists()?;
        refs::write_ref(&self.repo_dir(), ref_name, &value)
    }

    // --- Object ingestion -------------------------------------------------

    pub fn save_file(&self, path: &Path) -> Result<String> {
        self.require_exists()?;
        let blob = Blob::from_file(path)?;
        blob.save(&self.objects_dir())
    }

    pub fn save_dir(&self, path: &Path) -> Result<String> {
        self.require_exists()?;
        tree::write_tree_to_store(path, &self.objects_dir(), &self.repo_dir_name)
    }

    // --- Commit -----------------------------------------------------------

    /// Snapshot the entire working directory as a new commit, updating the
    /// branch HEAD currently points at (or HEAD itself, if detached).
    pub fn commit(&self, author: Option<&str>, message: &str) -> Result<String> {
        self.require_exists()?;

        let tree_hash = self.save_dir(&self.working_dir)?;
        let parent = self.head_commit()?;

        let author = match author {
            Some(a) => a.to_string(),
            None => self.config()?.author(),
        };

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let commit = Commit {
            tree_hash,
            parent,
            author,
            timestamp,
            message: message.to_string(),
        };
        let commit_hash = commit.save(&self.objects_dir())?;

        match self.head_ref()? {
            Ref::Sym(branch_ref) => {
                refs::write_ref(&self.repo_dir(), &branch_ref, &Ref::Hash(commit_hash.clone()))?;
            }
            Ref::Hash(_) => {
                // Detached HEAD: point HEAD itself at the new commit.
                refs::write_ref(&self.repo_dir(), "HEAD", &Ref::Hash(commit_hash.clone()))?;
            }
        }

        log::info!("committed {}", commit_hash);
        Ok(commit_hash)
    }

    pub fn log(&self, from: &str, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        self.require_exists()?;
        let mut entries = Vec::new();
        let mut current = Some(from.to_string());

        while let Some(hash) = current {
            if let Some(limit) = limit {
                if entries.len() >= limit {
                    break;
                }
            }
            let commit = Commit::load(&self.objects_dir(), &hash)?;
            current = commit.parent.clone();
            entries.push(LogEntry { hash, commit });
        }

        Ok(entries)
    }

    // --- Diff / status ------------------------------------------------------

    /// Diff two commit-ish endpoints (`None` means an empty tree).
    pub fn diff_commits(&self, from: Option<&str>, to: Option<&str>) -> Result<Vec<DiffNode>> {
        self.require_exists()?;
        let mut cache = HashMap::new();

        let from_tree = match from {
            Some(hash) => Some(Commit::load(&self.objects_dir(), hash)?.tree_hash),
            None => None,
        };
        let to_tree = match to {
            Some(hash) => Some(Commit::load(&self.objects_dir(), hash)?.tree_hash),
            None => None,
        };

        diff::diff(from_tree.as_deref(), to_tree.as_deref(), &self.objects_dir(), &mut cache)
    }

    /// `status`: diff HEAD's commit (or an empty tree if there isn't one yet)
    /// against the live working directory. The working-directory tree is
    /// built in memory only -- it is never written to the object store.
    pub fn status(&self) -> Result<Vec<DiffNode>> {
        self.require_exists()?;
        let mut cache = HashMap::new();

        let head_tree = match self.head_commit()? {
            Some(hash) => Some(Commit::load(&self.objects_dir(), &hash)?.tree_hash),
            None => None,
        };

        let (workdir_hash, workdir_trees) =
            tree::build_tree_in_memory(&self.working_dir, &self.repo_dir_name)?;
        cache.extend(workdir_trees);

        diff::diff(head_tree.as_deref(), Some(&workdir_hash), &self.objects_dir(), &mut cache)
    }

    // --- Checkout -----------------------------------------------------------

    /// Resolve `target` (hash, explicit ref path, branch name, or tag name)
    /// and mutate the working directory to match it exactly.
    ///
    /// Refuses to run against a dirty working directory (status must be
    /// empty first) -- the applier assumes this precondition and does not
    /// check it itself.
    pub fn checkout(&self, target: &str) -> Result<()> {
        self.require_exists()?;

        if !self.status()?.is_empty() {
            return Err(CafError::Validation(
                "cannot checkout: working directory has uncommitted changes".to_string(),
            ));
        }

        let target_hash = refs::resolve_checkout_target(&self.repo_dir(), &self.objects_dir(), target)?;
        let target_commit = Commit::load(&self.objects_dir(), &target_hash)?;

        let mut cache = HashMap::new();
        let current_tree = match self.head_commit()? {
            Some(hash) => Some(Commit::load(&self.objects_dir(), &hash)?.tree_hash),
            None => None,
        };

        let forest = diff::diff(
            current_tree.as_deref(),
            Some(&target_commit.tree_hash),
            &self.objects_dir(),
            &mut cache,
        )?;

        crate::checkout::apply(
            &forest,
            &self.working_dir,
            &self.objects_dir(),
            &target_commit.tree_hash,
            &mut cache,
        )?;

        if !target.starts_with("refs/") && self.branch_exists(target) {
            refs::write_ref(&self.repo_dir(), "HEAD", &Ref::Sym(format!("heads/{}", target)))?;
        } else {
            refs::write_ref(&self.repo_dir(), "HEAD", &Ref::Hash(target_hash))?;
        }

        log::info!("checked out {}", target);
        Ok(())
    }

    // --- Tags -----------------------------------------------------------

    pub fn tags(&self) -> Result<Vec<String>> {
        self.require_exists()?;
        refs::list_refs(&self.repo_dir(), refs::TAGS_PREFIX)
    }

    pub fn create_tag(&self, name: &str, commit_hash: &str, author: Option<&str>, message: &str) -> Result<()> {
        self.require_exists()?;

        if name.is_empty() {
            return Err(CafError::Validation("tag name is required".to_string()));
        }
        if !crate::hash::is_valid_hash(commit_hash) {
            return Err(CafError::InvalidHash(commit_hash.to_string()));
        }
        if message.is_empty() {
            return Err(CafError::Validation("tag message is required".to_string()));
        }
        if refs::ref_exists(&self.repo_dir(), &format!("tags/{}", name)) {
            return Err(CafError::TagAlreadyExists(name.to_string()));
        }

        // The tagged object must exist and actually be a commit, not some
        // other object hash the caller passed in by mistake.
        let (obj_type, _) = crate::objects::read_object(&self.objects_dir(), commit_hash)?;
        if obj_type != crate::objects::OBJ_TYPE_COMMIT {
            return Err(CafError::Validation(format!(
                "'{}' is a {} object, not a commit",
                commit_hash, obj_type
            )));
        }

        let author = match author {
            Some(a) if !a.is_empty() => a.to_string(),
            Some(_) => return Err(CafError::Validation("tag author is required".to_string())),
            None => self.config()?.author(),
        };
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;

        let tag = Tag {
            name: name.to_string(),
            commit_hash: commit_hash.to_string(),
            author,
            timestamp,
            message: message.to_string(),
        };
        let tag_hash = tag.save(&self.objects_dir())?;
        refs::write_ref(&self.repo_dir(), &format!("tags/{}", name), &Ref::Hash(tag_hash))
    }

    pub fn delete_tag(&self, name: &str) -> Result<()> {
        self.require_exists()?;
        if !refs::ref_exists(&self.repo_dir(), &format!("tags/{}", name)) {
            return Err(CafError::TagNotFound(name.to_string()));
        }
        refs::delete_ref(&self.repo_dir(), &format!("tags/{}", name))
    }
}
