//! Loose-object storage: blobs, trees, commits, tags.
//!
//! Every object is zlib-compressed and written under
//! `objects/<first-2-hex>/<remaining-hex>`, prefixed with a
//! `"<type> <len>\0"` header before the payload.

pub mod blob;
pub mod commit;
pub mod tag;
pub mod tree;

use crate::error::{CafError, Result};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

pub const OBJ_TYPE_BLOB: &str = "blob";
pub const OBJ_TYPE_TREE: &str = "tree";
pub const OBJ_TYPE_COMMIT: &str = "commit";
pub const OBJ_TYPE_TAG: &str = "tag";

/// Where a loose object with the given hash would live under `objects_dir`.
pub fn object_path(objects_dir: &Path, hash: &str) -> PathBuf {
    objects_dir.join(&hash[..2]).join(&hash[2..])
}

pub fn object_exists(objects_dir: &Path, hash: &str) -> bool {
    object_path(objects_dir, hash).is_file()
}

/// Write `content` (already the type-specific payload, not yet wrapped in a
/// header) as a loose object and return its hash.
pub fn write_object(objects_dir: &Path, obj_type: &str, content: &[u8]) -> Result<String> {
    let header = format!("{} {}\0", obj_type, content.len());
    let mut full = Vec::with_capacity(header.len() + content.len());
    full.extend_from_slice(header.as_bytes());
    full.extend_from_slice(content);

    let hash = crate::hash::hash_bytes(&full);
    let path = object_path(objects_dir, &hash);

    if path.is_file() {
        return Ok(hash);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&full)?;
    let compressed = encoder.finish()?;
    fs::write(&path, compressed)?;

    Ok(hash)
}

/// Decode the loose object stored at `hash`, returning its type tag and raw
/// payload (header stripped).
pub fn read_object(objects_dir: &Path, hash: &str) -> Result<(String, Vec<u8>)> {
    let path = object_path(objects_dir, hash);
    let compressed = fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CafError::UnknownHash(hash.to_string())
        } else {
            CafError::Io(e)
        }
    })?;

    let mut decoder = ZlibDecoder::new(&compressed[..]);
    let mut full = Vec::new();
    decoder.read_to_end(&mut full)?;

    let nul = full
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| CafError::Integrity(format!("object {} has no header terminator", hash)))?;
    let header = std::str::from_utf8(&full[..nul])
        .map_err(|_| CafError::Integrity(format!("object {} has non-utf8 header", hash)))?;
    let mut parts = header.splitn(2, ' ');
    let obj_type = parts
        .next()
        .ok_or_else(|| CafError::Integrity(format!("object {} has malformed header", hash)))?
        .to_string();

    Ok((obj_type, full[nul + 1..].to_vec()))
}

/// Open a reader over the decompressed content of a stored object, skipping
/// its header, for streaming large blobs directly to a destination file
/// without buffering the whole thing in memory.
pub fn open_content_for_reading(objects_dir: &Path, hash: &str) -> Result<impl Read> {
    let path = object_path(objects_dir, hash);
    let file = fs::File::open(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CafError::UnknownHash(hash.to_string())
        } else {
            CafError::Io(e)
        }
    })?;
    let mut decoder = ZlibDecoder::new(file);

    // Skip the header by reading it off byte-by-byte; the payload reader
    // returned to the caller starts exactly after the NUL terminator.
    let mut header = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        let n = decoder.read(&mut byte)?;
        if n == 0 {
            return Err(CafError::Integrity(format!(
                "object {} has no header terminator",
                hash
            )));
        }
        if byte[0] == 0 {
            break;
        }
        header.push(byte[0]);
    }

    Ok(decoder)
}

pub trait Storable {
    fn object_type(&self) -> &'static str;
    fn serialize_payload(&self) -> Vec<u8>;

    fn save(&self, objects_dir: &Path) -> Result<String> {
        write_object(objects_dir, self.object_type(), &self.serialize_payload())
    }
}

pub trait Loadable: Sized {
    fn deserialize_payload(payload: &[u8]) -> Result<Self>;

    fn load(objects_dir: &Path, hash: &str) -> Result<Self> {
        let (_, payload) = read_object(objects_dir, hash)?;
        Self::deserialize_payload(&payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_then_read_object_roundtrips() {
        let dir = tempdir().unwrap();
        let objects_dir = dir.path().join("objects");
        let hash = write_object(&objects_dir, OBJ_TYPE_BLOB, b"hello").unwrap();
        assert!(object_exists(&objects_dir, &hash));

        let (obj_type, payload) = read_object(&objects_dir, &hash).unwrap();
        assert_eq!(obj_type, OBJ_TYPE_BLOB);
        assert_eq!(payload, b"hello");
    }

    #[test]
    fn unknown_hash_is_reported() {
        let dir = tempdir().unwrap();
        let objects_dir = dir.path().join("objects");
        let err = read_object(&objects_dir, &"0".repeat(40)).unwrap_err();
        assert!(matches!(err, CafError::UnknownHash(_)));
    }

    #[test]
    fn streaming_read_skips_header() {
        let dir = tempdir().unwrap();
        let objects_dir = dir.path().join("objects");
        let hash = write_object(&objects_dir, OBJ_TYPE_BLOB, b"streamed content").unwrap();

        let mut reader = open_content_for_reading(&objects_dir, &hash).unwrap();
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"streamed content");
    }
}
