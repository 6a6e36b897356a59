//! Binary staging index, format version 2.
//!
//! File layout:
//! - 12-byte header: magic `DIRC`, big-endian u32 version, u32 entry count
//! - per entry: 62 fixed bytes (timestamps, dev/ino, mode, uid/gid, size,
//!   20-byte raw hash, 2-byte flags), the path, a NUL, then zero padding to
//!   the next multiple of 8 measured from the start of the file
//!
//! Entries are kept in path-sorted order. The low 12 bits of the flags word
//! carry the name length; `0xFFF` is a sentinel meaning "scan for the NUL",
//! used by longer paths.

use std::collections::HashMap;
use std::path::Path;

use tracing::debug;

use crate::error::CairnError;
use crate::object::Object;
use crate::repo::Repository;
use crate::store::ObjectStore;
use crate::tree::{Tree, TreeEntry};

pub const INDEX_SIGNATURE: &[u8; 4] = b"DIRC";
pub const INDEX_VERSION: u32 = 2;

const NAME_LENGTH_SENTINEL: u16 = 0xFFF;

/// 4-bit object type tag packed into an entry's mode word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Regular,
    Symlink,
    Gitlink,
}

impl EntryKind {
    pub fn mode_bits(self) -> u16 {
        match self {
            EntryKind::Regular => 0b1000,
            EntryKind::Symlink => 0b1010,
            EntryKind::Gitlink => 0b1110,
        }
    }

    fn from_mode_bits(bits: u16) -> Option<Self> {
        match bits {
            0b1000 => Some(EntryKind::Regular),
            0b1010 => Some(EntryKind::Symlink),
            0b1110 => Some(EntryKind::Gitlink),
            _ => None,
        }
    }
}

/// Staged state of one working-tree file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub ctime: (u32, u32),
    pub mtime: (u32, u32),
    pub dev: u32,
    pub ino: u32,
    pub kind: EntryKind,
    /// 9 permission bits.
    pub perms: u16,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    /// 40-hex hash of the staged blob.
    pub sha: String,
    pub assume_valid: bool,
    /// 2-bit merge stage.
    pub stage: u16,
    /// Repository-relative path.
    pub name: String,
}

impl IndexEntry {
    /// Tree-entry mode string for this entry, e.g. "100644".
    pub fn tree_mode(&self) -> String {
        format!("{:02o}{:04o}", self.kind.mode_bits(), self.perms)
    }
}

/// The staging index: a versioned, path-sorted list of entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            version: INDEX_VERSION,
            entries: Vec::new(),
        }
    }
}

struct Reader<'a> {
    raw: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn bytes(&mut self, n: usize) -> Result<&'a [u8], CairnError> {
        if self.raw.len() < self.pos + n {
            return Err(CairnError::Malformed(format!(
                "index truncated at byte {}",
                self.pos
            )));
        }
        let out = &self.raw[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn u32(&mut self) -> Result<u32, CairnError> {
        let b = self.bytes(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u16(&mut self) -> Result<u16, CairnError> {
        let b = self.bytes(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

impl Index {
    /// Read the index of `repo`. A missing file is a fresh repository's
    /// empty index, not an error.
    pub fn read(repo: &Repository) -> Result<Self, CairnError> {
        let path = repo.ctrl_path("index");
        if !path.is_file() {
            return Ok(Self::default());
        }
        Self::parse(&std::fs::read(path)?)
    }

    pub fn write(&self, repo: &Repository) -> Result<(), CairnError> {
        let path = repo.ctrl_file("index")?;
        std::fs::write(path, self.serialize()?)?;
        debug!(entries = self.entries.len(), "wrote index");
        Ok(())
    }

    pub fn parse(raw: &[u8]) -> Result<Self, CairnError> {
        let mut r = Reader { raw, pos: 0 };

        if r.bytes(4)? != INDEX_SIGNATURE {
            return Err(CairnError::Malformed("index: bad signature".to_string()));
        }
        let version = r.u32()?;
        if version != INDEX_VERSION {
            return Err(CairnError::PreconditionViolated(format!(
                "unsupported index version {}",
                version
            )));
        }
        let count = r.u32()?;

        let mut entries = Vec::new();
        for _ in 0..count {
            let ctime = (r.u32()?, r.u32()?);
            let mtime = (r.u32()?, r.u32()?);
            let dev = r.u32()?;
            let ino = r.u32()?;

            let unused = r.u16()?;
            if unused != 0 {
                return Err(CairnError::Malformed(format!(
                    "index entry at byte {}: reserved field is nonzero",
                    r.pos - 2
                )));
            }
            let mode = r.u16()?;
            let kind = EntryKind::from_mode_bits(mode >> 12).ok_or_else(|| {
                CairnError::Malformed(format!("index: unknown mode type {:#06b}", mode >> 12))
            })?;
            let perms = mode & 0o777;

            let uid = r.u32()?;
            let gid = r.u32()?;
            let size = r.u32()?;
            let sha = hex::encode(r.bytes(20)?);

            let flags = r.u16()?;
            let assume_valid = flags & 0x8000 != 0;
            if flags & 0x4000 != 0 {
                // Extended entries belong to the extension layouts this
                // format version does not carry.
                return Err(CairnError::Malformed(
                    "index: extended entry flag set".to_string(),
                ));
            }
            let stage = (flags & 0x3000) >> 12;
            let name_length = flags & NAME_LENGTH_SENTINEL;

            let name_bytes = if name_length < NAME_LENGTH_SENTINEL {
                let bytes = r.bytes(name_length as usize)?.to_vec();
                r.bytes(1)?;
                bytes
            } else {
                // Long-path escape: the real length is unknown, scan for
                // the NUL past the sentinel boundary.
                let scan_from = r.pos + NAME_LENGTH_SENTINEL as usize;
                if scan_from > raw.len() {
                    return Err(CairnError::Malformed(format!(
                        "index truncated at byte {}",
                        r.pos
                    )));
                }
                let nul = raw[scan_from..]
                    .iter()
                    .position(|&b| b == 0)
                    .map(|i| scan_from + i)
                    .ok_or_else(|| {
                        CairnError::Malformed("index: unterminated entry name".to_string())
                    })?;
                let bytes = raw[r.pos..nul].to_vec();
                r.pos = nul + 1;
                bytes
            };
            let name = String::from_utf8(name_bytes)
                .map_err(|_| CairnError::Malformed("index: non-UTF-8 entry name".to_string()))?;

            // Entries start on 8-byte boundaries of the file offset.
            r.pos = (r.pos + 7) & !7;

            entries.push(IndexEntry {
                ctime,
                mtime,
                dev,
                ino,
                kind,
                perms,
                uid,
                gid,
                size,
                sha,
                assume_valid,
                stage,
                name,
            });
        }

        Ok(Self { version, entries })
    }

    pub fn serialize(&self) -> Result<Vec<u8>, CairnError> {
        let mut out = Vec::new();
        out.extend_from_slice(INDEX_SIGNATURE);
        out.extend_from_slice(&self.version.to_be_bytes());
        out.extend_from_slice(&(self.entries.len() as u32).to_be_bytes());

        for entry in &self.entries {
            out.extend_from_slice(&entry.ctime.0.to_be_bytes());
            out.extend_from_slice(&entry.ctime.1.to_be_bytes());
            out.extend_from_slice(&entry.mtime.0.to_be_bytes());
            out.extend_from_slice(&entry.mtime.1.to_be_bytes());
            out.extend_from_slice(&entry.dev.to_be_bytes());
            out.extend_from_slice(&entry.ino.to_be_bytes());

            out.extend_from_slice(&0u16.to_be_bytes());
            let mode = (entry.kind.mode_bits() << 12) | (entry.perms & 0o777);
            out.extend_from_slice(&mode.to_be_bytes());

            out.extend_from_slice(&entry.uid.to_be_bytes());
            out.extend_from_slice(&entry.gid.to_be_bytes());
            out.extend_from_slice(&entry.size.to_be_bytes());

            let raw_sha = hex::decode(&entry.sha).map_err(|_| {
                CairnError::Malformed(format!("index entry '{}': bad hash", entry.name))
            })?;
            if raw_sha.len() != 20 {
                return Err(CairnError::Malformed(format!(
                    "index entry '{}': hash is {} bytes",
                    entry.name,
                    raw_sha.len()
                )));
            }
            out.extend_from_slice(&raw_sha);

            let name_bytes = entry.name.as_bytes();
            let recorded_length = name_bytes.len().min(NAME_LENGTH_SENTINEL as usize) as u16;
            let flags = ((entry.assume_valid as u16) << 15)
                | ((entry.stage & 0b11) << 12)
                | recorded_length;
            out.extend_from_slice(&flags.to_be_bytes());

            out.extend_from_slice(name_bytes);
            out.push(0);

            while out.len() % 8 != 0 {
                out.push(0);
            }
        }

        Ok(out)
    }

    pub fn entry(&self, name: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Insert an entry, replacing any staged entry with the same path and
    /// keeping the list path-sorted.
    pub fn insert(&mut self, entry: IndexEntry) {
        self.entries.retain(|e| e.name != entry.name);
        let at = self
            .entries
            .partition_point(|e| e.name.as_str() < entry.name.as_str());
        self.entries.insert(at, entry);
    }

    /// Drop the entry for `name`; false when nothing was staged there.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }
}

#[cfg(unix)]
fn file_ids(meta: &std::fs::Metadata) -> ((u32, u32), (u32, u32), u32, u32, u32, u32) {
    use std::os::unix::fs::MetadataExt;
    (
        (meta.ctime() as u32, meta.ctime_nsec() as u32),
        (meta.mtime() as u32, meta.mtime_nsec() as u32),
        meta.dev() as u32,
        meta.ino() as u32,
        meta.uid(),
        meta.gid(),
    )
}

#[cfg(not(unix))]
fn file_ids(_meta: &std::fs::Metadata) -> ((u32, u32), (u32, u32), u32, u32, u32, u32) {
    ((0, 0), (0, 0), 0, 0, 0, 0)
}

/// Stage one worktree file: hash its contents into the store and record a
/// fresh entry for it. Returns the blob hash.
pub fn stage_file(
    repo: &Repository,
    store: &ObjectStore,
    index: &mut Index,
    rel: &str,
) -> Result<String, CairnError> {
    let abs = repo.worktree().join(rel);
    if !abs.is_file() {
        return Err(CairnError::InvalidInput(format!(
            "not a file in the working tree: {}",
            rel
        )));
    }

    let data = std::fs::read(&abs)?;
    let sha = store.write(&Object::Blob(data))?;

    let meta = std::fs::metadata(&abs)?;
    let (ctime, mtime, dev, ino, uid, gid) = file_ids(&meta);

    index.insert(IndexEntry {
        ctime,
        mtime,
        dev,
        ino,
        kind: EntryKind::Regular,
        perms: 0o644,
        uid,
        gid,
        size: meta.len() as u32,
        sha: sha.clone(),
        assume_valid: false,
        stage: 0,
        name: rel.to_string(),
    });

    Ok(sha)
}

fn parent_dir(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

fn base_name(path: &str) -> &str {
    path.rfind('/').map(|i| &path[i + 1..]).unwrap_or(path)
}

/// Build tree objects bottom-up from the staged entries and return the
/// root tree hash. Deeper directories are written first so each parent
/// can reference its children by hash.
pub fn build_tree(store: &ObjectStore, index: &Index) -> Result<String, CairnError> {
    let mut contents: HashMap<String, Vec<TreeEntry>> = HashMap::new();
    contents.insert(String::new(), Vec::new());

    for entry in &index.entries {
        let mut dir = parent_dir(&entry.name);
        loop {
            contents.entry(dir.to_string()).or_default();
            if dir.is_empty() {
                break;
            }
            dir = parent_dir(dir);
        }
        contents
            .entry(parent_dir(&entry.name).to_string())
            .or_default()
            .push(TreeEntry::new(
                entry.tree_mode(),
                base_name(&entry.name),
                entry.sha.clone(),
            ));
    }

    let mut dirs: Vec<String> = contents.keys().cloned().collect();
    dirs.sort_by(|a, b| b.len().cmp(&a.len()));

    let mut root = None;
    for dir in dirs {
        let entries = contents.remove(&dir).unwrap_or_default();
        let sha = store.write(&Object::Tree(Tree { entries }))?;
        if dir.is_empty() {
            root = Some(sha);
        } else {
            contents
                .entry(parent_dir(&dir).to_string())
                .or_default()
                .push(TreeEntry::new("040000", base_name(&dir), sha));
        }
    }

    root.ok_or_else(|| CairnError::Malformed("tree build produced no root".to_string()))
}

/// Hash a worktree file the way the store would, without writing.
pub fn hash_worktree_file(path: &Path) -> Result<String, CairnError> {
    let data = std::fs::read(path)?;
    Object::Blob(data).id()
}
