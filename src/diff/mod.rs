//! The structural diff engine.
//!
//! Walks two trees in lockstep with an explicit work stack of
//! `(tree_a, tree_b, dest)` frames rather than recursion, so the walk is
//! driven iteratively (no native stack growth with tree depth) and so
//! move-pairing can mutate a node emitted from an earlier frame in place.
//!
//! Move detection is content-hash-based and path-oblivious: an entry present
//! only on one side is provisionally an `Added`/`Removed` leaf; if its hash
//! later turns out to match an entry provisionally added/removed on the
//! other side, both are collapsed into a `MovedFrom`/`MovedTo` pair and
//! (if the entry is a tree) its contents are *not* expanded further -- a
//! whole moved directory is one move, not N.
//!
//! Per the record: `MovedFrom` sits at the record's *new* location ("this
//! record appears at a new location") and carries `from_path`, the location
//! it used to live at; `MovedTo` sits at the *old* location ("this record
//! used to be here") and carries `to_path`, where it went. Both nodes
//! reside in the forest at their respective positions. The two
//! cross-referencing nodes are not linked by pointer or arena index: each
//! simply carries the other's full relative path as plain data, which is
//! enough for the checkout engine to act on and sidesteps Rust's reluctance
//! to let two owned tree nodes reference each other.

use crate::error::{CafError, Result};
use crate::objects::tree::{Tree, TreeRecordKind};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Removed,
    Modified,
    /// At the record's new location; `from_path` is where it used to be.
    MovedFrom { from_path: String },
    /// At the record's old location; `to_path` is where it went.
    MovedTo { to_path: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffNode {
    pub name: String,
    pub path: String,
    pub record_kind: TreeRecordKind,
    pub kind: DiffKind,
    pub children: Vec<DiffNode>,
}

impl DiffNode {
    pub fn depth(&self) -> usize {
        self.path.matches('/').count() + 1
    }
}

/// Internal arena node: same fields as `DiffNode` but children are stored
/// as indices so a node already emitted in an earlier stack frame can be
/// mutated in place (Added -> MovedTo, Removed -> MovedFrom) without
/// touching its parent's child list at all -- only the `kind` field of the
/// existing slot changes.
struct ArenaNode {
    name: String,
    path: String,
    record_kind: TreeRecordKind,
    kind: DiffKind,
    children: Vec<usize>,
}

struct Arena {
    nodes: Vec<ArenaNode>,
}

impl Arena {
    fn push(&mut self, node: ArenaNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn materialize(&self, idx: usize) -> DiffNode {
        let node = &self.nodes[idx];
        DiffNode {
            name: node.name.clone(),
            path: node.path.clone(),
            record_kind: node.record_kind,
            kind: node.kind.clone(),
            children: node.children.iter().map(|&c| self.materialize(c)).collect(),
        }
    }
}

type MoveKey = (TreeRecordKind, String);

struct TreeLoader<'a> {
    objects_dir: &'a std::path::Path,
    cache: &'a mut HashMap<String, Tree>,
}

impl<'a> TreeLoader<'a> {
    fn load(&mut self, hash: &str) -> Result<Tree> {
        if let Some(tree) = self.cache.get(hash) {
            return Ok(tree.clone());
        }
        let tree = Tree::load(self.objects_dir, hash)?;
        self.cache.insert(hash.to_string(), tree.clone());
        Ok(tree)
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}

/// Where a newly emitted arena node's index gets recorded: either the
/// forest's root list (which lives outside the arena) or another node's
/// child list (addressed by arena index, since that node may have been
/// pushed in an earlier stack frame).
#[derive(Clone, Copy)]
enum Dest {
    Root,
    Node(usize),
}

fn attach(dest: Dest, idx: usize, arena: &mut Arena, root_children: &mut Vec<usize>) {
    match dest {
        Dest::Root => root_children.push(idx),
        Dest::Node(parent) => arena.nodes[parent].children.push(idx),
    }
}

/// One unit of pending work: compare `hash_a` against `hash_b` at
/// `path_prefix`, attaching whatever it produces at `dest`.
struct Frame {
    hash_a: Option<String>,
    hash_b: Option<String>,
    path_prefix: String,
    dest: Dest,
}

/// Diff two tree endpoints (either may be absent, representing an empty
/// tree) and return the resulting forest. `tree_cache` is shared with the
/// caller so trees resolved from a live working directory (which must never
/// be written back to the object store) can be supplied up front and reused.
pub fn diff(
    root_a: Option<&str>,
    root_b: Option<&str>,
    objects_dir: &std::path::Path,
    tree_cache: &mut HashMap<String, Tree>,
) -> Result<Vec<DiffNode>> {
    if root_a == root_b {
        return Ok(Vec::new());
    }

    let mut arena = Arena { nodes: Vec::new() };
    let mut potentially_added: HashMap<MoveKey, Vec<usize>> = HashMap::new();
    let mut potentially_removed: HashMap<MoveKey, Vec<usize>> = HashMap::new();

    // Roots have no parent node of their own; root-level results are
    // collected into `root_children` directly instead of some node's
    // `children` vec.
    let mut root_children: Vec<usize> = Vec::new();

    let mut loader = TreeLoader {
        objects_dir,
        cache: tree_cache,
    };

    // Levels are driven from an explicit stack rather than recursive calls,
    // so a changed or newly-added subtree schedules its own comparison as a
    // frame instead of descending immediately. Order of frame processing
    // doesn't affect the result: move matching keys off content hash via
    // the two `potentially_*` maps, which are shared across every frame.
    let mut stack = vec![Frame {
        hash_a: root_a.map(str::to_string),
        hash_b: root_b.map(str::to_string),
        path_prefix: String::new(),
        dest: Dest::Root,
    }];

    while let Some(frame) = stack.pop() {
        diff_level(
            frame.hash_a.as_deref(),
            frame.hash_b.as_deref(),
            &frame.path_prefix,
            frame.dest,
            &mut arena,
            &mut loader,
            &mut potentially_added,
            &mut potentially_removed,
            &mut root_children,
            &mut stack,
        )?;
    }

    Ok(root_children.iter().map(|&i| arena.materialize(i)).collect())
}

#[allow(clippy::too_many_arguments)]
fn diff_level(
    hash_a: Option<&str>,
    hash_b: Option<&str>,
    path_prefix: &str,
    dest: Dest,
    arena: &mut Arena,
    loader: &mut TreeLoader,
    potentially_added: &mut HashMap<MoveKey, Vec<usize>>,
    potentially_removed: &mut HashMap<MoveKey, Vec<usize>>,
    root_children: &mut Vec<usize>,
    stack: &mut Vec<Frame>,
) -> Result<()> {
    let tree_a = match hash_a {
        Some(h) => loader.load(h)?,
        None => Tree::new(),
    };
    let tree_b = match hash_b {
        Some(h) => loader.load(h)?,
        None => Tree::new(),
    };

    let mut names: Vec<&String> = tree_a.records.keys().chain(tree_b.records.keys()).collect();
    names.sort();
    names.dedup();

    for name in names {
        let a = tree_a.get(name);
        let b = tree_b.get(name);
        let path = join_path(path_prefix, name);

        match (a, b) {
            (Some(a), Some(b)) if a.kind == b.kind && a.hash == b.hash => {
                // unchanged, no diff node
            }
            (Some(a), Some(b)) if a.kind != b.kind => {
                // Type swap: a single Modified leaf, never recursed into.
                let idx = arena.push(ArenaNode {
                    name: name.clone(),
                    path,
                    record_kind: b.kind,
                    kind: DiffKind::Modified,
                    children: Vec::new(),
                });
                attach(dest, idx, arena, root_children);
            }
            (Some(a), Some(b)) if a.kind == TreeRecordKind::Tree => {
                // Changed subtree: schedule a comparison frame, nesting its
                // results under one Modified container node.
                let idx = arena.push(ArenaNode {
                    name: name.clone(),
                    path: path.clone(),
                    record_kind: TreeRecordKind::Tree,
                    kind: DiffKind::Modified,
                    children: Vec::new(),
                });
                attach(dest, idx, arena, root_children);
                stack.push(Frame {
                    hash_a: Some(a.hash.clone()),
                    hash_b: Some(b.hash.clone()),
                    path_prefix: path,
                    dest: Dest::Node(idx),
                });
            }
            (Some(_), Some(b)) => {
                // Changed blob in place.
                let idx = arena.push(ArenaNode {
                    name: name.clone(),
                    path,
                    record_kind: b.kind,
                    kind: DiffKind::Modified,
                    children: Vec::new(),
                });
                attach(dest, idx, arena, root_children);
            }
            (None, Some(b)) => {
                handle_added(
                    name, b.kind, &b.hash, &path, dest, arena, potentially_added,
                    potentially_removed, root_children, stack,
                )?;
            }
            (Some(a), None) => {
                handle_removed(
                    name, a.kind, &a.hash, &path, dest, arena, potentially_added,
                    potentially_removed, root_children, stack,
                )?;
            }
            (None, None) => unreachable!("name came from at least one of the two trees"),
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_added(
    name: &str,
    kind: TreeRecordKind,
    hash: &str,
    path: &str,
    dest: Dest,
    arena: &mut Arena,
    potentially_added: &mut HashMap<MoveKey, Vec<usize>>,
    potentially_removed: &mut HashMap<MoveKey, Vec<usize>>,
    root_children: &mut Vec<usize>,
    stack: &mut Vec<Frame>,
) -> Result<()> {
    let key: MoveKey = (kind, hash.to_string());

    if let Some(candidates) = potentially_removed.get_mut(&key) {
        if let Some(removed_idx) = candidates.pop() {
            if candidates.is_empty() {
                potentially_removed.remove(&key);
            }

            // This side is the record's new location.
            let added_idx = arena.push(ArenaNode {
                name: name.to_string(),
                path: path.to_string(),
                record_kind: kind,
                kind: DiffKind::MovedFrom {
                    from_path: arena.nodes[removed_idx].path.clone(),
                },
                children: Vec::new(),
            });
            // The other side is where it used to be.
            arena.nodes[removed_idx].kind = DiffKind::MovedTo {
                to_path: path.to_string(),
            };
            attach(dest, added_idx, arena, root_children);
            return Ok(());
        }
    }

    let idx = arena.push(ArenaNode {
        name: name.to_string(),
        path: path.to_string(),
        record_kind: kind,
        kind: DiffKind::Added,
        children: Vec::new(),
    });
    attach(dest, idx, arena, root_children);

    if kind == TreeRecordKind::Tree {
        stack.push(Frame {
            hash_a: None,
            hash_b: Some(hash.to_string()),
            path_prefix: path.to_string(),
            dest: Dest::Node(idx),
        });
    } else {
        potentially_added.entry(key).or_default().push(idx);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn handle_removed(
    name: &str,
    kind: TreeRecordKind,
    hash: &str,
    path: &str,
    dest: Dest,
    arena: &mut Arena,
    potentially_added: &mut HashMap<MoveKey, Vec<usize>>,
    potentially_removed: &mut HashMap<MoveKey, Vec<usize>>,
    root_children: &mut Vec<usize>,
    stack: &mut Vec<Frame>,
) -> Result<()> {
    let key: MoveKey = (kind, hash.to_string());

    if let Some(candidates) = potentially_added.get_mut(&key) {
        if let Some(added_idx) = candidates.pop() {
            if candidates.is_empty() {
                potentially_added.remove(&key);
            }

            // This side is where the record used to be.
            let removed_idx = arena.push(ArenaNode {
                name: name.to_string(),
                path: path.to_string(),
                record_kind: kind,
                kind: DiffKind::MovedTo {
                    to_path: arena.nodes[added_idx].path.clone(),
                },
                children: Vec::new(),
            });
            // The other side is the record's new location.
            arena.nodes[added_idx].kind = DiffKind::MovedFrom {
                from_path: path.to_string(),
            };
            attach(dest, removed_idx, arena, root_children);
            return Ok(());
        }
    }

    let idx = arena.push(ArenaNode {
        name: name.to_string(),
        path: path.to_string(),
        record_kind: kind,
        kind: DiffKind::Removed,
        children: Vec::new(),
    });
    attach(dest, idx, arena, root_children);

    if kind == TreeRecordKind::Tree {
        stack.push(Frame {
            hash_a: Some(hash.to_string()),
            hash_b: None,
            path_prefix: path.to_string(),
            dest: Dest::Node(idx),
        });
    } else {
        potentially_removed.entry(key).or_default().push(idx);
    }

    Ok(())
}

/// Walk a materialized forest in pre-order, yielding `(&DiffNode, full path)`
/// pairs. Used by both `status`-style pretty-printing and the checkout
/// applier's traversal phase.
pub fn walk_pre_order(forest: &[DiffNode]) -> Vec<&DiffNode> {
    let mut out = Vec::new();
    let mut stack: Vec<&DiffNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(node.children.iter().rev());
    }
    out
}

/// Resolve the record at `path` within the tree rooted at `root_hash`,
/// loading subtrees from the cache or object store as needed. Used by the
/// checkout applier to fetch the *current* hash for a write, since diff
/// nodes themselves don't cache content hashes.
pub fn resolve_at_path(
    root_hash: &str,
    path: &str,
    objects_dir: &std::path::Path,
    tree_cache: &mut HashMap<String, Tree>,
) -> Result<crate::objects::tree::TreeRecord> {
    let mut loader = TreeLoader {
        objects_dir,
        cache: tree_cache,
    };
    let mut current = loader.load(root_hash)?;
    let components: Vec<&str> = path.split('/').collect();

    for (i, component) in components.iter().enumerate() {
        let record = current
            .get(component)
            .ok_or_else(|| CafError::Traversal(format!("path '{}' not found in target tree", path)))?
            .clone();

        if i == components.len() - 1 {
            return Ok(record);
        }

        if record.kind != TreeRecordKind::Tree {
            return Err(CafError::Traversal(format!(
                "path '{}' traverses through a non-directory entry",
                path
            )));
        }
        current = loader.load(&record.hash)?;
    }

    unreachable!("path must have at least one component")
}
