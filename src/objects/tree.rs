//! Trees: a named, sorted set of entries pointing at blobs or subtrees.
//!
//! Also hosts the bottom-up filesystem-to-tree builder used by `save_dir`
//! (writes objects as it goes) and by the diff engine's live-directory
//! endpoint resolution (hashes in memory only, no writes): an explicit
//! traversal stack discovers directories, then a reversed build order folds
//! them bottom-up so every subtree hash is known before its parent is built.

use super::blob::Blob;
use super::{Loadable, OBJ_TYPE_TREE, Storable};
use crate::error::{CafError, Result};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreeRecordKind {
    Blob,
    Tree,
}

impl TreeRecordKind {
    fn as_str(&self) -> &'static str {
        match self {
            TreeRecordKind::Blob => "blob",
            TreeRecordKind::Tree => "tree",
        }
    }

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "blob" => Ok(TreeRecordKind::Blob),
            "tree" => Ok(TreeRecordKind::Tree),
            other => Err(CafError::Integrity(format!(
                "unknown tree record kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRecord {
    pub name: String,
    pub kind: TreeRecordKind,
    pub hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    /// Keyed and iterated in sorted order: this is what makes two
    /// directories with identical contents hash identically regardless of
    /// the order entries were discovered on disk.
    pub records: BTreeMap<String, TreeRecord>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: TreeRecord) {
        self.records.insert(record.name.clone(), record);
    }

    pub fn get(&self, name: &str) -> Option<&TreeRecord> {
        self.records.get(name)
    }
}

impl Storable for Tree {
    fn object_type(&self) -> &'static str {
        OBJ_TYPE_TREE
    }

    fn serialize_payload(&self) -> Vec<u8> {
        let mut out = String::new();
        for record in self.records.values() {
            out.push_str(&format!(
                "{} {} {}\n",
                record.kind.as_str(),
                record.hash,
                record.name
            ));
        }
        out.into_bytes()
    }
}

impl Loadable for Tree {
    fn deserialize_payload(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| CafError::Integrity("tree payload is not valid utf-8".into()))?;
        let mut tree = Tree::new();
        for line in text.lines() {
            let mut parts = line.splitn(3, ' ');
            let kind = parts
                .next()
                .ok_or_else(|| CafError::Integrity("malformed tree entry".into()))?;
            let hash = parts
                .next()
                .ok_or_else(|| CafError::Integrity("malformed tree entry".into()))?;
            let name = parts
                .next()
                .ok_or_else(|| CafError::Integrity("malformed tree entry".into()))?;
            tree.insert(TreeRecord {
                name: name.to_string(),
                kind: TreeRecordKind::from_str(kind)?,
                hash: hash.to_string(),
            });
        }
        Ok(tree)
    }
}

fn discover_directories(root: &Path, repo_dir_name: &str) -> Result<Vec<PathBuf>> {
    let mut stack = vec![root.to_path_buf()];
    let mut build_order = Vec::new();

    while let Some(current) = stack.pop() {
        build_order.push(current.clone());

        let mut children: Vec<PathBuf> = std::fs::read_dir(&current)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.file_name().and_then(|n| n.to_str()) != Some(repo_dir_name))
            .collect();
        children.sort();

        for child in children.into_iter().rev() {
            if child.is_dir() {
                stack.push(child);
            }
        }
    }

    Ok(build_order)
}

fn dir_entries(dir: &Path, repo_dir_name: &str) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.file_name().and_then(|n| n.to_str()) != Some(repo_dir_name))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Hash a live directory into an in-memory tree forest without writing
/// anything to the object store. Used when diffing against the working
/// directory (`status`, or `diff` with a workdir endpoint) -- reading the
/// tree of a live directory must not have the side effect of populating the
/// object store.
pub fn build_tree_in_memory(root: &Path, repo_dir_name: &str) -> Result<(String, HashMap<String, Tree>)> {
    if !root.is_dir() {
        return Err(CafError::Validation(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let build_order = discover_directories(root, repo_dir_name)?;
    let mut dir_hashes: HashMap<PathBuf, String> = HashMap::new();
    let mut tree_cache: HashMap<String, Tree> = HashMap::new();

    for current in build_order.into_iter().rev() {
        let entries = dir_entries(&current, repo_dir_name)?;

        let records: Vec<Result<TreeRecord>> = entries
            .par_iter()
            .map(|entry| {
                let name = entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();

                if entry.is_dir() {
                    let hash = dir_hashes.get(entry).cloned().ok_or_else(|| {
                        CafError::Integrity(format!("missing hash for subdirectory {}", entry.display()))
                    })?;
                    Ok(TreeRecord {
                        name,
                        kind: TreeRecordKind::Tree,
                        hash,
                    })
                } else {
                    let data = std::fs::read(entry)?;
                    let hash = crate::hash::hash_bytes(&data);
                    Ok(TreeRecord {
                        name,
                        kind: TreeRecordKind::Blob,
                        hash,
                    })
                }
            })
            .collect();

        let mut tree = Tree::new();
        for record in records {
            tree.insert(record?);
        }

        let payload = tree.serialize_payload();
        let header = format!("{} {}\0", super::OBJ_TYPE_TREE, payload.len());
        let mut full = header.into_bytes();
        full.extend_from_slice(&payload);
        let hash = crate::hash::hash_bytes(&full);

        dir_hashes.insert(current.clone(), hash.clone());
        tree_cache.insert(hash, tree);
    }

    let root_hash = dir_hashes
        .get(root)
        .cloned()
        .ok_or_else(|| CafError::Integrity("failed to hash root directory".into()))?;
    Ok((root_hash, tree_cache))
}

/// Like [`build_tree_in_memory`], but persists every blob and tree it builds
/// into the object store. Used by `commit`/`save_dir`, where the snapshot
/// must actually exist on disk afterward.
pub fn write_tree_to_store(root: &Path, objects_dir: &Path, repo_dir_name: &str) -> Result<String> {
    if !root.is_dir() {
        return Err(CafError::Validation(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let build_order = discover_directories(root, repo_dir_name)?;
    let mut dir_hashes: HashMap<PathBuf, String> = HashMap::new();

    for current in build_order.into_iter().rev() {
        let entries = dir_entries(&current, repo_dir_name)?;

        let records: Vec<Result<TreeRecord>> = entries
            .par_iter()
            .map(|entry| {
                let name = entry
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();

                if entry.is_dir() {
                    let hash = dir_hashes.get(entry).cloned().ok_or_else(|| {
                        CafError::Integrity(format!("missing hash for subdirectory {}", entry.display()))
                    })?;
                    Ok(TreeRecord {
                        name,
                        kind: TreeRecordKind::Tree,
                        hash,
                    })
                } else {
                    let blob = Blob::from_file(entry)?;
                    let hash = blob.save(objects_dir)?;
                    Ok(TreeRecord {
                        name,
                        kind: TreeRecordKind::Blob,
                        hash,
                    })
                }
            })
            .collect();

        let mut tree = Tree::new();
        for record in records {
            tree.insert(record?);
        }

        let hash = tree.save(objects_dir)?;
        dir_hashes.insert(current.clone(), hash);
    }

    dir_hashes
        .get(root)
        .cloned()
        .ok_or_else(|| CafError::Integrity("failed to hash root directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn identical_directories_hash_identically() {
        let a = tempdir().unwrap();
        let b = tempdir().unwrap();
        std::fs::write(a.path().join("x.txt"), b"hello").unwrap();
        std::fs::create_dir(a.path().join("sub")).unwrap();
        std::fs::write(a.path().join("sub/y.txt"), b"world").unwrap();

        std::fs::write(b.path().join("x.txt"), b"hello").unwrap();
        std::fs::create_dir(b.path().join("sub")).unwrap();
        std::fs::write(b.path().join("sub/y.txt"), b"world").unwrap();

        let (hash_a, _) = build_tree_in_memory(a.path(), ".caf").unwrap();
        let (hash_b, _) = build_tree_in_memory(b.path(), ".caf").unwrap();
        assert_eq!(hash_a, hash_b);
    }

    #[test]
    fn repo_dir_is_excluded() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), b"hello").unwrap();
        std::fs::create_dir(dir.path().join(".caf")).unwrap();
        std::fs::write(dir.path().join(".caf/config.toml"), b"junk").unwrap();

        let (_, cache) = build_tree_in_memory(dir.path(), ".caf").unwrap();
        let root_tree = cache.values().find(|t| t.records.len() == 1).unwrap();
        assert!(root_tree.get("x.txt").is_some());
        assert!(root_tree.get(".caf").is_none());
    }

    #[test]
    fn write_tree_to_store_persists_blobs_and_trees() {
        let workdir = tempdir().unwrap();
        let store = tempdir().unwrap();
        std::fs::write(workdir.path().join("a.txt"), b"content").unwrap();

        let hash = write_tree_to_store(workdir.path(), store.path(), ".caf").unwrap();
        let tree = Tree::load(store.path(), &hash).unwrap();
        let record = tree.get("a.txt").unwrap();
        assert_eq!(record.kind, TreeRecordKind::Blob);
        assert!(super::super::object_exists(store.path(), &record.hash));
    }
}
