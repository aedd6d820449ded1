//! Blobs: raw file content, addressed by the hash of its bytes.

use super::{Loadable, OBJ_TYPE_BLOB, Storable};
use crate::error::Result;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self {
            data: std::fs::read(path)?,
        })
    }
}

impl Storable for Blob {
    fn object_type(&self) -> &'static str {
        OBJ_TYPE_BLOB
    }

    fn serialize_payload(&self) -> Vec<u8> {
        self.data.clone()
    }
}

impl Loadable for Blob {
    fn deserialize_payload(payload: &[u8]) -> Result<Self> {
        Ok(Self {
            data: payload.to_vec(),
        })
    }
}
