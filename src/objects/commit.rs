//! Commits: a tree snapshot plus authorship and an optional parent link.

use super::{Loadable, OBJ_TYPE_COMMIT, Storable};
use crate::error::{CafError, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub tree_hash: String,
    pub parent: Option<String>,
    pub author: String,
    pub timestamp: i64,
    pub message: String,
}

impl Storable for Commit {
    fn object_type(&self) -> &'static str {
        OBJ_TYPE_COMMIT
    }

    fn serialize_payload(&self) -> Vec<u8> {
        let mut out = format!("tree {}\n", self.tree_hash);
        if let Some(parent) = &self.parent {
            out.push_str(&format!("parent {}\n", parent));
        }
        out.push_str(&format!("author {} {}\n", self.author, self.timestamp));
        out.push('\n');
        out.push_str(&self.message);
        if !self.message.ends_with('\n') {
            out.push('\n');
        }
        out.into_bytes()
    }
}

impl Loadable for Commit {
    fn deserialize_payload(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| CafError::Integrity("commit payload is not valid utf-8".into()))?;

        let mut lines = text.lines();
        let mut tree_hash = None;
        let mut parent = None;
        let mut author = None;
        let mut timestamp = None;

        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            if let Some(rest) = line.strip_prefix("tree ") {
                tree_hash = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("parent ") {
                parent = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("author ") {
                let (name_and_email, ts) = rest
                    .rsplit_once(' ')
                    .ok_or_else(|| CafError::Integrity("malformed commit author line".into()))?;
                author = Some(name_and_email.to_string());
                timestamp = Some(
                    ts.parse::<i64>()
                        .map_err(|_| CafError::Integrity("malformed commit timestamp".into()))?,
                );
            }
        }

        let message = lines.collect::<Vec<_>>().join("\n");

        Ok(Commit {
            tree_hash: tree_hash
                .ok_or_else(|| CafError::Integrity("commit missing tree hash".into()))?,
            parent,
            author: author.ok_or_else(|| CafError::Integrity("commit missing author".into()))?,
            timestamp: timestamp
                .ok_or_else(|| CafError::Integrity("commit missing timestamp".into()))?,
            message,
        })
    }
}

pub fn load_commit(objects_dir: &Path, hash: &str) -> Result<Commit> {
    Commit::load(objects_dir, hash)
}
