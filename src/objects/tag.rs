//! Annotated tags: a named, authored pointer at a commit.
//!
//! Unlike a branch (a bare symbolic ref), a tag is itself an object in the
//! store; `refs/tags/<name>` holds the *tag object's* hash, and resolving it
//! means loading the Tag and following its `commit_hash`.

use super::{Loadable, OBJ_TYPE_TAG, Storable};
use crate::error::{CafError, Result};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub commit_hash: String,
    pub author: String,
    pub timestamp: i64,
    pub message: String,
}

impl Storable for Tag {
    fn object_type(&self) -> &'static str {
        OBJ_TYPE_TAG
    }

    fn serialize_payload(&self) -> Vec<u8> {
        let mut out = format!(
            "object {}\ntag {}\ntagger {} {}\n\n",
            self.commit_hash, self.name, self.author, self.timestamp
        );
        out.push_str(&self.message);
        if !self.message.ends_with('\n') {
            out.push('\n');
        }
        out.into_bytes()
    }
}

impl Loadable for Tag {
    fn deserialize_payload(payload: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| CafError::Integrity("tag payload is not valid utf-8".into()))?;

        let mut lines = text.lines();
        let mut commit_hash = None;
        let mut name = None;
        let mut author = None;
        let mut timestamp = None;

        for line in lines.by_ref() {
            if line.is_empty() {
                break;
            }
            if let Some(rest) = line.strip_prefix("object ") {
                commit_hash = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("tag ") {
                name = Some(rest.to_string());
            } else if let Some(rest) = line.strip_prefix("tagger ") {
                let (author_part, ts) = rest
                    .rsplit_once(' ')
                    .ok_or_else(|| CafError::Integrity("malformed tag tagger line".into()))?;
                author = Some(author_part.to_string());
                timestamp = Some(
                    ts.parse::<i64>()
                        .map_err(|_| CafError::Integrity("malformed tag timestamp".into()))?,
                );
            }
        }

        let message = lines.collect::<Vec<_>>().join("\n");

        Ok(Tag {
            name: name.ok_or_else(|| CafError::Integrity("tag missing name".into()))?,
            commit_hash: commit_hash
                .ok_or_else(|| CafError::Integrity("tag missing object hash".into()))?,
            author: author.ok_or_else(|| CafError::Integrity("tag missing tagger".into()))?,
            timestamp: timestamp
                .ok_or_else(|| CafError::Integrity("tag missing timestamp".into()))?,
            message,
        })
    }
}

pub fn load_tag(objects_dir: &Path, hash: &str) -> Result<Tag> {
    Tag::load(objects_dir, hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tag() -> Tag {
        Tag {
            name: "v1.0".into(),
            commit_hash: "c".repeat(40),
            author: "Ada Lovelace <ada@example.com>".into(),
            timestamp: 1_700_000_000,
            message: "first release".into(),
        }
    }

    #[test]
    fn serialize_then_parse_roundtrips() {
        let tag = sample_tag();
        let payload = tag.serialize_payload();
        let parsed = Tag::deserialize_payload(&payload).unwrap();
        assert_eq!(parsed, tag);
    }
}
