//! Hash-addressed object store.
//!
//! Objects live at `<control-dir>/objects/<first-2-hex>/<remaining-38-hex>`,
//! zlib-compressed. Writes are skip-if-exists: content addressing makes two
//! writers of the same bytes converge on the same file, and distinct objects
//! never share a path.

use std::io::{Read, Write};
use std::path::PathBuf;

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::{debug, trace};

use crate::error::CairnError;
use crate::object::{self, hash_encoded, Object};
use crate::repo::Repository;

pub struct ObjectStore {
    root: PathBuf,
}

impl ObjectStore {
    pub fn open(repo: &Repository) -> Self {
        Self {
            root: repo.ctrl_path("objects"),
        }
    }

    /// File path for a full 40-hex hash.
    pub fn object_path(&self, sha: &str) -> PathBuf {
        self.root.join(&sha[..2]).join(&sha[2..])
    }

    /// Deduplication query: present on disk, no decode.
    pub fn exists(&self, sha: &str) -> bool {
        self.object_path(sha).is_file()
    }

    /// Read and decode an object. An absent file is `NotFound`, distinct
    /// from a present-but-malformed object.
    pub fn read(&self, sha: &str) -> Result<Object, CairnError> {
        let path = self.object_path(sha);
        if !path.is_file() {
            return Err(CairnError::NotFound(format!("object {}", sha)));
        }

        let compressed = std::fs::read(&path)?;
        let mut raw = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .read_to_end(&mut raw)
            .map_err(|e| CairnError::Malformed(format!("object {}: bad zlib stream: {}", sha, e)))?;

        trace!(sha, bytes = raw.len(), "read object");
        object::decode(&raw, sha)
    }

    /// Serialize, hash, and persist an object, returning its hash. An
    /// already-present object is never re-compressed. Compression finishes
    /// in memory before the file is opened, so a failed write leaves no
    /// partial file.
    pub fn write(&self, obj: &Object) -> Result<String, CairnError> {
        let encoded = obj.encode()?;
        let sha = hash_encoded(&encoded);

        if self.exists(&sha) {
            return Ok(sha);
        }
        let path = self.object_path(&sha);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&encoded)?;
        let compressed = encoder.finish()?;
        std::fs::write(&path, compressed)?;

        debug!(sha = %sha, kind = %obj.kind(), "wrote object");
        Ok(sha)
    }

    /// All stored hashes starting with `prefix` (at least the 2-character
    /// subdirectory), sorted. A full 40-character hash matches itself.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<String>, CairnError> {
        let dir = self.root.join(&prefix[..2]);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let rest = &prefix[2..];
        let mut matches = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            if name.starts_with(rest) {
                matches.push(format!("{}{}", &prefix[..2], name));
            }
        }
        matches.sort();
        Ok(matches)
    }
}
