//! Tree object codec.
//!
//! Payload format, repeated to end of input:
//! - mode: 5 or 6 ASCII digits
//! - `0x20`
//! - name: path segment bytes (no separators)
//! - `0x00`
//! - 20 raw hash bytes

use std::collections::HashMap;

use crate::error::CairnError;
use crate::object::Object;
use crate::store::ObjectStore;

/// One (mode, name, hash) row of a tree object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    /// Six ASCII digits after normalization, e.g. "100644" or "040000".
    pub mode: String,
    /// Path segment, no separators.
    pub name: String,
    /// 40-hex object id.
    pub sha: String,
}

impl TreeEntry {
    pub fn new(mode: impl Into<String>, name: impl Into<String>, sha: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            name: name.into(),
            sha: sha.into(),
        }
    }

    /// True for directory entries (mode prefix "04").
    pub fn is_tree(&self) -> bool {
        self.mode.starts_with("04")
    }

    /// Canonical sort key: directories order as if a trailing separator
    /// were appended, which keeps serialization byte-stable for a given
    /// entry set regardless of insertion order.
    fn sort_key(&self) -> String {
        if self.is_tree() {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// Ordered list of tree entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn parse(raw: &[u8]) -> Result<Self, CairnError> {
        let mut entries = Vec::new();
        let mut pos = 0;
        while pos < raw.len() {
            let (entry, next) = parse_entry(raw, pos)?;
            entries.push(entry);
            pos = next;
        }
        Ok(Self { entries })
    }

    /// Emit canonical bytes: entries re-sorted, hex hashes back to 20 raw
    /// bytes, directory modes emitted at their on-disk 5-digit width.
    pub fn serialize(&self) -> Result<Vec<u8>, CairnError> {
        let mut sorted = self.entries.clone();
        sorted.sort_by_key(|e| e.sort_key());

        let mut out = Vec::new();
        for entry in &sorted {
            let mode = entry.mode.strip_prefix('0').unwrap_or(&entry.mode);
            out.extend_from_slice(mode.as_bytes());
            out.push(b' ');
            out.extend_from_slice(entry.name.as_bytes());
            out.push(0);
            let raw_sha = hex::decode(&entry.sha).map_err(|_| {
                CairnError::Malformed(format!("tree entry '{}': bad hash {}", entry.name, entry.sha))
            })?;
            if raw_sha.len() != 20 {
                return Err(CairnError::Malformed(format!(
                    "tree entry '{}': hash is {} bytes",
                    entry.name,
                    raw_sha.len()
                )));
            }
            out.extend_from_slice(&raw_sha);
        }
        Ok(out)
    }
}

fn parse_entry(raw: &[u8], start: usize) -> Result<(TreeEntry, usize), CairnError> {
    let spc = raw[start..]
        .iter()
        .position(|&b| b == b' ')
        .map(|i| start + i)
        .ok_or_else(|| truncated(start))?;

    let width = spc - start;
    if width != 5 && width != 6 {
        return Err(CairnError::Malformed(format!(
            "tree entry at byte {}: mode field is {} bytes",
            start, width
        )));
    }
    let mut mode = String::from_utf8(raw[start..spc].to_vec())
        .map_err(|_| CairnError::Malformed(format!("tree entry at byte {}: non-ASCII mode", start)))?;
    if width == 5 {
        mode.insert(0, '0');
    }

    let nul = raw[spc + 1..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| spc + 1 + i)
        .ok_or_else(|| truncated(start))?;
    let name = String::from_utf8(raw[spc + 1..nul].to_vec())
        .map_err(|_| CairnError::Malformed(format!("tree entry at byte {}: non-UTF-8 name", start)))?;

    let hash_end = nul + 21;
    if raw.len() < hash_end {
        return Err(truncated(start));
    }
    let sha = hex::encode(&raw[nul + 1..hash_end]);

    Ok((TreeEntry { mode, name, sha }, hash_end))
}

fn truncated(start: usize) -> CairnError {
    CairnError::Malformed(format!("tree entry at byte {}: truncated", start))
}

/// Flatten a stored tree into repo-relative path -> blob hash.
pub fn flatten(store: &ObjectStore, tree_sha: &str) -> Result<HashMap<String, String>, CairnError> {
    let mut out = HashMap::new();
    flatten_into(store, tree_sha, "", &mut out)?;
    Ok(out)
}

fn flatten_into(
    store: &ObjectStore,
    tree_sha: &str,
    prefix: &str,
    out: &mut HashMap<String, String>,
) -> Result<(), CairnError> {
    let tree = match store.read(tree_sha)? {
        Object::Tree(tree) => tree,
        other => {
            return Err(CairnError::InvalidInput(format!(
                "{} is a {}, not a tree",
                tree_sha,
                other.kind()
            )))
        }
    };

    for entry in &tree.entries {
        let path = if prefix.is_empty() {
            entry.name.clone()
        } else {
            format!("{}/{}", prefix, entry.name)
        };
        if entry.is_tree() {
            flatten_into(store, &entry.sha, &path, out)?;
        } else {
            out.insert(path, entry.sha.clone());
        }
    }
    Ok(())
}
