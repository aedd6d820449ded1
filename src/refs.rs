//! Reference store: branches and tags are both just named pointers under
//! `refs/`, either a raw hash (`HashRef`) or a symbolic pointer at another
//! ref path (`SymRef`). `HEAD` is itself a ref file, usually symbolic.

use crate::error::{CafError, Result};
use crate::hash::is_valid_hash;
use std::fs;
use std::path::{Path, PathBuf};

pub const HEADS_PREFIX: &str = "heads";
pub const TAGS_PREFIX: &str = "tags";

/// Resolution never recurses more than this many symbolic hops before being
/// treated as a cycle. The original implementation has no such guard;
/// this crate adds one deliberately (a self-referential or mutually
/// referential set of ref files would otherwise recurse forever).
const MAX_REF_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ref {
    Hash(String),
    Sym(String),
}

impl Ref {
    fn parse(contents: &str) -> Ref {
        let trimmed = contents.trim();
        if let Some(target) = trimmed.strip_prefix("ref: ") {
            Ref::Sym(target.trim().to_string())
        } else {
            Ref::Hash(trimmed.to_string())
        }
    }

    fn serialize(&self) -> String {
        match self {
            Ref::Hash(hash) => format!("{}\n", hash),
            Ref::Sym(target) => format!("ref: {}\n", target),
        }
    }
}

/// Absolute path of the ref file named by a `refs/`-relative path like
/// `heads/main` or `tags/v1.0`, or the bare name `HEAD`.
pub fn ref_path(repo_dir: &Path, ref_name: &str) -> PathBuf {
    if ref_name == "HEAD" {
        repo_dir.join("HEAD")
    } else {
        repo_dir.join("refs").join(ref_name)
    }
}

pub fn read_ref(repo_dir: &Path, ref_name: &str) -> Result<Ref> {
    let path = ref_path(repo_dir, ref_name);
    let contents = fs::read_to_string(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CafError::RefResolution(format!("ref '{}' does not exist", ref_name))
        } else {
            CafError::Io(e)
        }
    })?;
    Ok(Ref::parse(&contents))
}

pub fn write_ref(repo_dir: &Path, ref_name: &str, value: &Ref) -> Result<()> {
    let path = ref_path(repo_dir, ref_name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, value.serialize())?;
    Ok(())
}

pub fn ref_exists(repo_dir: &Path, ref_name: &str) -> bool {
    ref_path(repo_dir, ref_name).is_file()
}

pub fn delete_ref(repo_dir: &Path, ref_name: &str) -> Result<()> {
    let path = ref_path(repo_dir, ref_name);
    fs::remove_file(&path)?;
    Ok(())
}

/// List ref names (relative to `refs/`) under a given namespace prefix
/// (`heads` or `tags`), sorted.
pub fn list_refs(repo_dir: &Path, prefix: &str) -> Result<Vec<String>> {
    let dir = repo_dir.join("refs").join(prefix);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
        .collect();
    names.sort();
    Ok(names)
}

/// Walk the full `refs/` tree (both `heads/` and `tags/`), returning each
/// ref's path relative to `refs/` (e.g. `heads/main`, `tags/v1.0`), sorted.
pub fn all_refs(repo_dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for prefix in [HEADS_PREFIX, TAGS_PREFIX] {
        for name in list_refs(repo_dir, prefix)? {
            names.push(format!("{}/{}", prefix, name));
        }
    }
    names.sort();
    Ok(names)
}

/// Resolve a ref name down to a commit hash, transitively following
/// symbolic refs and, for tag refs, substituting the tag object's
/// `commit_hash` before continuing. Bounded by `MAX_REF_DEPTH` to guard
/// against cycles.
pub fn resolve_ref(repo_dir: &Path, objects_dir: &Path, ref_name: &str) -> Result<String> {
    resolve_ref_inner(repo_dir, objects_dir, ref_name, 0)
}

fn resolve_ref_inner(
    repo_dir: &Path,
    objects_dir: &Path,
    ref_name: &str,
    depth: usize,
) -> Result<String> {
    if depth > MAX_REF_DEPTH {
        return Err(CafError::RefCycle(ref_name.to_string()));
    }

    match read_ref(repo_dir, ref_name)? {
        Ref::Hash(hash) => {
            if ref_name.starts_with("tags/") || ref_name == "tags" {
                // A tag ref's stored hash points at a Tag object, not a
                // commit directly -- substitute its commit_hash.
                let tag = crate::objects::tag::load_tag(objects_dir, &hash)?;
                Ok(tag.commit_hash)
            } else {
                Ok(hash)
            }
        }
        Ref::Sym(target) => resolve_ref_inner(repo_dir, objects_dir, &target, depth + 1),
    }
}

/// Resolve a checkout target string, trying in order: explicit hash >
/// explicit `refs/...` path > `heads/<name>` branch > `tags/<name>` tag
/// (so a branch wins over a same-named tag).
pub fn resolve_checkout_target(repo_dir: &Path, objects_dir: &Path, target: &str) -> Result<String> {
    if is_valid_hash(target) {
        return Ok(target.to_string());
    }

    if target.starts_with("refs/") || target.starts_with("heads/") || target.starts_with("tags/") {
        let rel = target.strip_prefix("refs/").unwrap_or(target);
        return resolve_ref(repo_dir, objects_dir, rel);
    }

    let branch_name = format!("heads/{}", target);
    let tag_name = format!("tags/{}", target);
    let branch_found = ref_exists(repo_dir, &branch_name);
    let tag_found = ref_exists(repo_dir, &tag_name);

    match (branch_found, tag_found) {
        (true, _) => resolve_ref(repo_dir, objects_dir, &branch_name),
        (false, true) => resolve_ref(repo_dir, objects_dir, &tag_name),
        (false, false) => Err(CafError::RefResolution(format!(
            "no branch or tag named '{}'",
            target
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::Storable;
    use crate::objects::tag::Tag;
    use tempfile::tempdir;

    #[test]
    fn resolves_plain_hash_ref() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join(".caf");
        fs::create_dir_all(repo_dir.join("refs/heads")).unwrap();
        write_ref(&repo_dir, "heads/main", &Ref::Hash("a".repeat(40))).unwrap();

        let hash = resolve_ref(&repo_dir, &repo_dir.join("objects"), "heads/main").unwrap();
        assert_eq!(hash, "a".repeat(40));
    }

    #[test]
    fn resolves_through_symbolic_head() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join(".caf");
        fs::create_dir_all(repo_dir.join("refs/heads")).unwrap();
        write_ref(&repo_dir, "heads/main", &Ref::Hash("b".repeat(40))).unwrap();
        write_ref(&repo_dir, "HEAD", &Ref::Sym("heads/main".to_string())).unwrap();

        let hash = resolve_ref(&repo_dir, &repo_dir.join("objects"), "HEAD").unwrap();
        assert_eq!(hash, "b".repeat(40));
    }

    #[test]
    fn detects_cycles() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join(".caf");
        fs::create_dir_all(repo_dir.join("refs/heads")).unwrap();
        write_ref(&repo_dir, "heads/a", &Ref::Sym("heads/b".to_string())).unwrap();
        write_ref(&repo_dir, "heads/b", &Ref::Sym("heads/a".to_string())).unwrap();

        let err = resolve_ref(&repo_dir, &repo_dir.join("objects"), "heads/a").unwrap_err();
        assert!(matches!(err, CafError::RefCycle(_)));
    }

    #[test]
    fn tag_ref_resolves_through_tag_object() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join(".caf");
        let objects_dir = repo_dir.join("objects");
        fs::create_dir_all(repo_dir.join("refs/tags")).unwrap();

        let tag = Tag {
            name: "v1.0".into(),
            commit_hash: "c".repeat(40),
            author: "Ada <ada@example.com>".into(),
            timestamp: 1,
            message: "release".into(),
        };
        let tag_hash = tag.save(&objects_dir).unwrap();
        write_ref(&repo_dir, "tags/v1.0", &Ref::Hash(tag_hash)).unwrap();

        let hash = resolve_ref(&repo_dir, &objects_dir, "tags/v1.0").unwrap();
        assert_eq!(hash, "c".repeat(40));
    }

    #[test]
    fn branch_wins_over_same_named_tag() {
        let dir = tempdir().unwrap();
        let repo_dir = dir.path().join(".caf");
        let objects_dir = repo_dir.join("objects");
        fs::create_dir_all(repo_dir.join("refs/heads")).unwrap();
        fs::create_dir_all(repo_dir.join("refs/tags")).unwrap();

        write_ref(&repo_dir, "heads/release", &Ref::Hash("d".repeat(40))).unwrap();

        let tag = Tag {
            name: "release".into(),
            commit_hash: "e".repeat(40),
            author: "Ada <ada@example.com>".into(),
            timestamp: 1,
            message: "tag".into(),
        };
        let tag_hash = tag.save(&objects_dir).unwrap();
        write_ref(&repo_dir, "tags/release", &Ref::Hash(tag_hash)).unwrap();

        let hash = resolve_checkout_target(&repo_dir, &objects_dir, "release").unwrap();
        assert_eq!(hash, "d".repeat(40));
    }
}
