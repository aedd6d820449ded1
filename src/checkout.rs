//! The checkout engine: applies a diff forest to a working directory.
//!
//! Three phases, in this fixed order:
//!
//! 1. Moves, sorted by destination depth ascending, so a file moved into a
//!    not-yet-created directory never races its own parent's creation.
//! 2. Removals, sorted by source depth descending, so a directory's
//!    contents are gone before the directory itself is removed, and a
//!    missing path (already gone because its parent was removed first) is
//!    silently skipped rather than treated as an error.
//! 3. Writes (`Added` + `Modified`), pre-order, parent before child.
//!    Blob content is streamed straight from the object store into the
//!    destination file.

use crate::diff::{DiffKind, DiffNode};
use crate::error::{CafError, Result};
use crate::objects::tree::{Tree, TreeRecordKind};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct PlannedMove<'a> {
    node: &'a DiffNode,
    dest: PathBuf,
}

struct PlannedRemoval<'a> {
    #[allow(dead_code)]
    node: &'a DiffNode,
    path: PathBuf,
}

struct PlannedWrite<'a> {
    node: &'a DiffNode,
    path: PathBuf,
}

fn depth_of(path: &Path) -> usize {
    path.components().count()
}

fn plan<'a>(
    forest: &'a [DiffNode],
    working_dir: &Path,
) -> (
    Vec<PlannedMove<'a>>,
    Vec<PlannedRemoval<'a>>,
    Vec<PlannedWrite<'a>>,
) {
    let mut moves = Vec::new();
    let mut removals = Vec::new();
    let mut writes = Vec::new();

    // Stack-based pre-order walk so writes come out parent-before-child.
    let mut stack: Vec<&DiffNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        let path = working_dir.join(&node.path);

        match &node.kind {
            DiffKind::Added | DiffKind::Modified => writes.push(PlannedWrite { node, path }),
            DiffKind::Removed => removals.push(PlannedRemoval { node, path }),
            DiffKind::MovedTo { to_path } => moves.push(PlannedMove {
                node,
                dest: working_dir.join(to_path),
            }),
            DiffKind::MovedFrom { .. } => {
                // The paired MovedTo node (at the old location) drives the
                // actual move; this node is just where it lands.
            }
        }

        stack.extend(node.children.iter().rev());
    }

    moves.sort_by_key(|m| depth_of(&m.dest));
    removals.sort_by(|a, b| depth_of(&b.path).cmp(&depth_of(&a.path)));

    (moves, removals, writes)
}

pub fn apply(
    forest: &[DiffNode],
    working_dir: &Path,
    objects_dir: &Path,
    target_root_hash: &str,
    tree_cache: &mut HashMap<String, Tree>,
) -> Result<()> {
    let (moves, removals, writes) = plan(forest, working_dir);

    handle_moves(&moves, working_dir)?;
    handle_removals(&removals)?;
    handle_writes(&writes, working_dir, objects_dir, target_root_hash, tree_cache)?;

    Ok(())
}

fn handle_moves(moves: &[PlannedMove], working_dir: &Path) -> Result<()> {
    for planned in moves {
        debug_assert!(
            matches!(planned.node.kind, DiffKind::MovedTo { .. }),
            "plan() only puts MovedTo nodes into `moves`"
        );

        let src_path = working_dir.join(&planned.node.path);
        if !src_path.exists() {
            return Err(CafError::MissingMovedFrom(
                planned.node.path.clone(),
            ));
        }

        if let Some(parent) = planned.dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CafError::Move {
                from: src_path.clone(),
                to: planned.dest.clone(),
                source: e,
            })?;
        }

        std::fs::rename(&src_path, &planned.dest).map_err(|e| CafError::Move {
            from: src_path.clone(),
            to: planned.dest.clone(),
            source: e,
        })?;

        log::debug!("moved {} -> {}", src_path.display(), planned.dest.display());
    }
    Ok(())
}

fn handle_removals(removals: &[PlannedRemoval]) -> Result<()> {
    for planned in removals {
        if !planned.path.exists() {
            // Parent directory was already removed; nothing left to do.
            continue;
        }

        let result = if planned.path.is_dir() {
            std::fs::remove_dir_all(&planned.path)
        } else {
            std::fs::remove_file(&planned.path)
        };

        result.map_err(|e| CafError::Remove {
            path: planned.path.clone(),
            source: e,
        })?;

        log::debug!("removed {}", planned.path.display());
    }
    Ok(())
}

fn handle_writes(
    writes: &[PlannedWrite],
    working_dir: &Path,
    objects_dir: &Path,
    target_root_hash: &str,
    tree_cache: &mut HashMap<String, Tree>,
) -> Result<()> {
    let _ = working_dir;
    for planned in writes {
        let path = &planned.path;

        if path.exists() {
            let target_is_dir = planned.node.record_kind == TreeRecordKind::Tree;
            let disk_is_dir = path.is_dir();

            if target_is_dir != disk_is_dir {
                let result = if disk_is_dir {
                    std::fs::remove_dir_all(path)
                } else {
                    std::fs::remove_file(path)
                };
                result.map_err(|e| CafError::Write {
                    path: path.clone(),
                    source: e,
                })?;
            }
        }

        match planned.node.record_kind {
            TreeRecordKind::Tree => {
                std::fs::create_dir_all(path).map_err(|e| CafError::Write {
                    path: path.clone(),
                    source: e,
                })?;
            }
            TreeRecordKind::Blob => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| CafError::Write {
                        path: path.clone(),
                        source: e,
                    })?;
                }

                let record = crate::diff::resolve_at_path(
                    target_root_hash,
                    &planned.node.path,
                    objects_dir,
                    tree_cache,
                )?;

                let mut src = crate::objects::open_content_for_reading(objects_dir, &record.hash)?;
                let mut dst = std::fs::File::create(path).map_err(|e| CafError::Write {
                    path: path.clone(),
                    source: e,
                })?;
                std::io::copy(&mut src, &mut dst).map_err(|e| CafError::Write {
                    path: path.clone(),
                    source: e,
                })?;

                log::debug!("wrote {}", path.display());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::objects::Storable;
    use crate::objects::blob::Blob;
    use crate::objects::tree::{Tree, TreeRecord, write_tree_to_store};
    use tempfile::tempdir;

    fn write_fixture(root: &Path, files: &[(&str, &[u8])], dirs: &[&str]) {
        for d in dirs {
            std::fs::create_dir_all(root.join(d)).unwrap();
        }
        for (path, content) in files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                std::fs::create_dir_all(parent).unwrap();
            }
            std::fs::write(full, content).unwrap();
        }
    }

    #[test]
    fn add_modify_delete_move_rename_scenario() {
        let store = tempdir().unwrap();
        let objects_dir = store.path().join("objects");

        let old_workdir = tempdir().unwrap();
        write_fixture(
            old_workdir.path(),
            &[
                ("keep.txt", b"unchanged"),
                ("modify.txt", b"before"),
                ("remove.txt", b"bye"),
                ("rename_me.txt", b"rename content"),
            ],
            &[],
        );
        let old_root = write_tree_to_store(old_workdir.path(), &objects_dir, ".caf").unwrap();

        let new_workdir = tempdir().unwrap();
        write_fixture(
            new_workdir.path(),
            &[
                ("keep.txt", b"unchanged"),
                ("modify.txt", b"after"),
                ("renamed.txt", b"rename content"),
                ("added.txt", b"new"),
            ],
            &[],
        );
        let new_root = write_tree_to_store(new_workdir.path(), &objects_dir, ".caf").unwrap();

        let mut cache = HashMap::new();
        let forest = diff(Some(&old_root), Some(&new_root), &objects_dir, &mut cache).unwrap();

        let working_dir = tempdir().unwrap();
        write_fixture(
            working_dir.path(),
            &[
                ("keep.txt", b"unchanged"),
                ("modify.txt", b"before"),
                ("remove.txt", b"bye"),
                ("rename_me.txt", b"rename content"),
            ],
            &[],
        );

        apply(&forest, working_dir.path(), &objects_dir, &new_root, &mut cache).unwrap();

        assert_eq!(
            std::fs::read_to_string(working_dir.path().join("modify.txt")).unwrap(),
            "after"
        );
        assert!(!working_dir.path().join("remove.txt").exists());
        assert!(!working_dir.path().join("rename_me.txt").exists());
        assert_eq!(
            std::fs::read_to_string(working_dir.path().join("renamed.txt")).unwrap(),
            "rename content"
        );
        assert_eq!(
            std::fs::read_to_string(working_dir.path().join("added.txt")).unwrap(),
            "new"
        );
        assert_eq!(
            std::fs::read_to_string(working_dir.path().join("keep.txt")).unwrap(),
            "unchanged"
        );
    }

    #[test]
    fn type_swap_removes_conflicting_object_first() {
        let store = tempdir().unwrap();
        let objects_dir = store.path().join("objects");

        let blob_hash = Blob::new(b"file content".to_vec()).save(&objects_dir).unwrap();
        let mut old_tree = Tree::new();
        old_tree.insert(TreeRecord {
            name: "x".into(),
            kind: TreeRecordKind::Blob,
            hash: blob_hash,
        });
        let old_root = old_tree.save(&objects_dir).unwrap();

        let inner_file = Blob::new(b"inside dir".to_vec()).save(&objects_dir).unwrap();
        let mut inner_tree = Tree::new();
        inner_tree.insert(TreeRecord {
            name: "y.txt".into(),
            kind: TreeRecordKind::Blob,
            hash: inner_file,
        });
        let inner_hash = inner_tree.save(&objects_dir).unwrap();

        let mut new_tree = Tree::new();
        new_tree.insert(TreeRecord {
            name: "x".into(),
            kind: TreeRecordKind::Tree,
            hash: inner_hash,
        });
        let new_root = new_tree.save(&objects_dir).unwrap();

        let mut cache = HashMap::new();
        let forest = diff(Some(&old_root), Some(&new_root), &objects_dir, &mut cache).unwrap();

        let working_dir = tempdir().unwrap();
        std::fs::write(working_dir.path().join("x"), b"file content").unwrap();

        apply(&forest, working_dir.path(), &objects_dir, &new_root, &mut cache).unwrap();

        assert!(working_dir.path().join("x").is_dir());
        assert_eq!(
            std::fs::read_to_string(working_dir.path().join("x/y.txt")).unwrap(),
            "inside dir"
        );
    }

    #[test]
    fn missing_moved_from_path_is_an_error() {
        let store = tempdir().unwrap();
        let objects_dir = store.path().join("objects");
        let content = Blob::new(b"moved".to_vec()).save(&objects_dir).unwrap();

        let mut old_tree = Tree::new();
        old_tree.insert(TreeRecord {
            name: "a.txt".into(),
            kind: TreeRecordKind::Blob,
            hash: content.clone(),
        });
        let old_root = old_tree.save(&objects_dir).unwrap();

        let mut new_tree = Tree::new();
        new_tree.insert(TreeRecord {
            name: "b.txt".into(),
            kind: TreeRecordKind::Blob,
            hash: content,
        });
        let new_root = new_tree.save(&objects_dir).unwrap();

        let mut cache = HashMap::new();
        let forest = diff(Some(&old_root), Some(&new_root), &objects_dir, &mut cache).unwrap();

        let working_dir = tempdir().unwrap();
        // Note: a.txt is deliberately absent from the working directory.

        let err = apply(&forest, working_dir.path(), &objects_dir, &new_root, &mut cache).unwrap_err();
        assert!(matches!(err, CafError::MissingMovedFrom(_)));
    }
}
