//! Typed object union and the canonical on-disk object form.
//!
//! Every object is stored (and hashed) as `"<type> <byte-length>\0<payload>"`.
//! Identity is the lowercase hex SHA-1 of exactly those bytes.

use std::fmt;

use sha1::{Digest, Sha1};

use crate::error::CairnError;
use crate::kvlm::Kvlm;
use crate::tree::Tree;

/// The four object types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
    Tag,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Blob => "blob",
            ObjectKind::Tree => "tree",
            ObjectKind::Commit => "commit",
            ObjectKind::Tag => "tag",
        }
    }

    pub fn from_token(token: &[u8]) -> Option<Self> {
        match token {
            b"blob" => Some(ObjectKind::Blob),
            b"tree" => Some(ObjectKind::Tree),
            b"commit" => Some(ObjectKind::Commit),
            b"tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, hash-addressed unit of storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Object {
    Blob(Vec<u8>),
    Tree(Tree),
    Commit(Kvlm),
    Tag(Kvlm),
}

impl Object {
    pub fn kind(&self) -> ObjectKind {
        match self {
            Object::Blob(_) => ObjectKind::Blob,
            Object::Tree(_) => ObjectKind::Tree,
            Object::Commit(_) => ObjectKind::Commit,
            Object::Tag(_) => ObjectKind::Tag,
        }
    }

    /// Canonical payload bytes (no header).
    pub fn serialize(&self) -> Result<Vec<u8>, CairnError> {
        match self {
            Object::Blob(data) => Ok(data.clone()),
            Object::Tree(tree) => tree.serialize(),
            Object::Commit(kvlm) | Object::Tag(kvlm) => Ok(kvlm.serialize()),
        }
    }

    /// Header plus payload: the exact bytes that are hashed and stored.
    pub fn encode(&self) -> Result<Vec<u8>, CairnError> {
        let payload = self.serialize()?;
        let mut out = format!("{} {}\0", self.kind(), payload.len()).into_bytes();
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Content hash. A pure function of the serialized bytes; no store
    /// involved.
    pub fn id(&self) -> Result<String, CairnError> {
        Ok(hash_encoded(&self.encode()?))
    }

    /// Decode a typed payload.
    pub fn deserialize(kind: ObjectKind, payload: &[u8]) -> Result<Self, CairnError> {
        match kind {
            ObjectKind::Blob => Ok(Object::Blob(payload.to_vec())),
            ObjectKind::Tree => Ok(Object::Tree(Tree::parse(payload)?)),
            ObjectKind::Commit => Ok(Object::Commit(Kvlm::parse(payload)?)),
            ObjectKind::Tag => Ok(Object::Tag(Kvlm::parse(payload)?)),
        }
    }
}

/// SHA-1 over already-encoded object bytes.
pub fn hash_encoded(encoded: &[u8]) -> String {
    hex::encode(Sha1::digest(encoded))
}

/// Decode `"<type> <len>\0<payload>"`. `ctx` names the object (its hash)
/// in error messages.
pub fn decode(raw: &[u8], ctx: &str) -> Result<Object, CairnError> {
    let spc = raw
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| CairnError::Malformed(format!("object {}: no type token", ctx)))?;
    let token = &raw[..spc];

    let nul = raw[spc + 1..]
        .iter()
        .position(|&b| b == 0)
        .map(|i| spc + 1 + i)
        .ok_or_else(|| CairnError::Malformed(format!("object {}: no length terminator", ctx)))?;
    let declared: usize = std::str::from_utf8(&raw[spc + 1..nul])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| CairnError::Malformed(format!("object {}: bad length field", ctx)))?;

    let payload = &raw[nul + 1..];
    if payload.len() != declared {
        return Err(CairnError::Malformed(format!(
            "object {}: declared length {} but payload is {} bytes",
            ctx,
            declared,
            payload.len()
        )));
    }

    let kind = ObjectKind::from_token(token).ok_or_else(|| {
        CairnError::Unsupported(format!(
            "object {}: unknown type token {:?}",
            ctx,
            String::from_utf8_lossy(token)
        ))
    })?;

    Object::deserialize(kind, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_hash_matches_known_digest() {
        // sha1("blob 6\0hello\n")
        let blob = Object::Blob(b"hello\n".to_vec());
        assert_eq!(blob.id().unwrap(), "ce013625030ba8dba906f756967f9e9ca394464a");
    }

    #[test]
    fn test_hash_is_deterministic_across_rebuilds() {
        let a = Object::Blob(b"same bytes".to_vec());
        let b = Object::Blob(b"same bytes".to_vec());
        assert_eq!(a.id().unwrap(), b.id().unwrap());
    }

    #[test]
    fn test_decode_roundtrip() {
        let blob = Object::Blob(b"payload".to_vec());
        let encoded = blob.encode().unwrap();
        let decoded = decode(&encoded, "test").unwrap();
        assert_eq!(decoded, blob);
    }

    #[test]
    fn test_length_mismatch_is_malformed() {
        let raw = b"blob 5\0hello!".to_vec();
        assert!(matches!(
            decode(&raw, "deadbeef"),
            Err(CairnError::Malformed(msg)) if msg.contains("deadbeef")
        ));
    }

    #[test]
    fn test_unknown_type_token_is_unsupported() {
        let raw = b"sprocket 2\0ok".to_vec();
        assert!(matches!(
            decode(&raw, "deadbeef"),
            Err(CairnError::Unsupported(_))
        ));
    }

    #[test]
    fn test_commit_roundtrips_through_payload() {
        let body = b"tree 29ff16c9c14e2652b22f8b78bb08a5a07930c147\n\
author A <a@b.c> 0 +0000\n\
\n\
msg\n";
        let obj = Object::deserialize(ObjectKind::Commit, body).unwrap();
        assert_eq!(obj.serialize().unwrap(), body.to_vec());
    }
}
