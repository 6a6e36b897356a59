//! Reference resolution.
//!
//! A ref file holds either a 40-hex hash or `"ref: <path>"` pointing at
//! another ref, newline-terminated. Indirection is followed to a fixed
//! point under a visited-set guard, so a self- or mutually-referential
//! ref pair fails instead of recursing unboundedly.

use std::collections::HashSet;

use tracing::trace;

use crate::error::CairnError;
use crate::kvlm::Kvlm;
use crate::object::{Object, ObjectKind};
use crate::repo::Repository;
use crate::store::ObjectStore;

/// Read a ref by its control-dir-relative name ("HEAD",
/// "refs/heads/master", ...), following indirection. A missing file is
/// `Ok(None)`: HEAD on an unborn branch is a normal state.
pub fn read_ref(repo: &Repository, name: &str) -> Result<Option<String>, CairnError> {
    let mut visited = HashSet::new();
    read_ref_inner(repo, name, &mut visited)
}

fn read_ref_inner(
    repo: &Repository,
    name: &str,
    visited: &mut HashSet<String>,
) -> Result<Option<String>, CairnError> {
    if !visited.insert(name.to_string()) {
        return Err(CairnError::Malformed(format!(
            "reference cycle closes at {}",
            name
        )));
    }

    let path = repo.ctrl_path(name);
    if !path.is_file() {
        return Ok(None);
    }

    let data = std::fs::read_to_string(&path)?;
    let data = data.strip_suffix('\n').unwrap_or(&data);

    match data.strip_prefix("ref: ") {
        Some(target) => {
            trace!(name, target, "following indirect ref");
            read_ref_inner(repo, target, visited)
        }
        None => Ok(Some(data.to_string())),
    }
}

/// Write a direct ref, creating missing parent directories.
pub fn write_ref(repo: &Repository, name: &str, sha: &str) -> Result<(), CairnError> {
    let path = repo.ctrl_file(name)?;
    std::fs::write(path, format!("{}\n", sha))?;
    Ok(())
}

/// All refs under `refs/`, as (name, resolved hash), sorted by name.
/// Dangling refs are skipped.
pub fn list_refs(repo: &Repository) -> Result<Vec<(String, String)>, CairnError> {
    let mut out = Vec::new();
    collect_refs(repo, "refs", &mut out)?;
    Ok(out)
}

fn collect_refs(
    repo: &Repository,
    rel: &str,
    out: &mut Vec<(String, String)>,
) -> Result<(), CairnError> {
    let dir = repo.ctrl_path(rel);
    if !dir.is_dir() {
        return Ok(());
    }

    let mut names: Vec<String> = std::fs::read_dir(&dir)?
        .map(|e| e.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    names.sort();

    for name in names {
        let child = format!("{}/{}", rel, name);
        if repo.ctrl_path(&child).is_dir() {
            collect_refs(repo, &child, out)?;
        } else if let Some(sha) = read_ref(repo, &child)? {
            out.push((child, sha));
        }
    }
    Ok(())
}

/// Branch name HEAD is on, or `None` when detached.
pub fn current_branch(repo: &Repository) -> Result<Option<String>, CairnError> {
    let path = repo.ctrl_path("HEAD");
    if !path.is_file() {
        return Ok(None);
    }
    let data = std::fs::read_to_string(path)?;
    Ok(data
        .trim_end()
        .strip_prefix("ref: refs/heads/")
        .map(|b| b.to_string()))
}

/// Point HEAD's target at `sha`: the current branch ref when on a branch,
/// the HEAD file itself when detached.
pub fn update_head(repo: &Repository, sha: &str) -> Result<(), CairnError> {
    match current_branch(repo)? {
        Some(branch) => write_ref(repo, &format!("refs/heads/{}", branch), sha),
        None => write_ref(repo, "HEAD", sha),
    }
}

fn is_hash_prefix(name: &str) -> bool {
    (4..=40).contains(&name.len()) && name.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Resolve a name to exactly one hash.
///
/// "HEAD" resolves through the HEAD file and is never ambiguous. Otherwise
/// candidates are collected from three sources: a 4-40 hex prefix scanned
/// against the object store, `refs/tags/<name>`, and `refs/heads/<name>`.
/// Zero candidates is `NotFound`; more than one is `Ambiguous` listing all
/// of them, never a silent pick.
pub fn resolve_name(
    repo: &Repository,
    store: &ObjectStore,
    name: &str,
) -> Result<String, CairnError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CairnError::NotFound("empty reference name".to_string()));
    }

    if name == "HEAD" {
        return read_ref(repo, "HEAD")?
            .ok_or_else(|| CairnError::NotFound("HEAD points at an unborn branch".to_string()));
    }

    let mut candidates = Vec::new();

    if is_hash_prefix(name) {
        candidates.extend(store.scan_prefix(&name.to_ascii_lowercase())?);
    }
    if let Some(sha) = read_ref(repo, &format!("refs/tags/{}", name))? {
        candidates.push(sha);
    }
    if let Some(sha) = read_ref(repo, &format!("refs/heads/{}", name))? {
        candidates.push(sha);
    }

    match candidates.len() {
        0 => Err(CairnError::NotFound(format!("no such reference: {}", name))),
        1 => Ok(candidates.remove(0)),
        _ => Err(CairnError::Ambiguous {
            name: name.to_string(),
            candidates,
        }),
    }
}

/// Resolve a name and peel toward `wanted`, one dereference step per
/// round: a tag peels to its target object, a commit peels to its tree
/// only when a tree is wanted. Returns `Ok(None)` when the wanted type is
/// unreachable (or immediately, when `follow` is off and the types
/// differ). Never follows commit ancestry.
pub fn resolve_typed(
    repo: &Repository,
    store: &ObjectStore,
    name: &str,
    wanted: Option<ObjectKind>,
    follow: bool,
) -> Result<Option<String>, CairnError> {
    let mut sha = resolve_name(repo, store, name)?;
    let Some(wanted) = wanted else {
        return Ok(Some(sha));
    };

    loop {
        let obj = store.read(&sha)?;
        if obj.kind() == wanted {
            return Ok(Some(sha));
        }
        if !follow {
            return Ok(None);
        }
        sha = match &obj {
            Object::Tag(body) => field_hash(body, b"object", &sha)?,
            Object::Commit(body) if wanted == ObjectKind::Tree => field_hash(body, b"tree", &sha)?,
            _ => return Ok(None),
        };
    }
}

fn field_hash(body: &Kvlm, key: &[u8], ctx: &str) -> Result<String, CairnError> {
    let value = body.first(key).ok_or_else(|| {
        CairnError::Malformed(format!(
            "object {}: missing {} field",
            ctx,
            String::from_utf8_lossy(key)
        ))
    })?;
    String::from_utf8(value.to_vec())
        .map_err(|_| CairnError::Malformed(format!("object {}: non-UTF-8 hash field", ctx)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempdir().unwrap();
        let repo = Repository::create(dir.path()).unwrap();
        (dir, repo)
    }

    const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_read_direct_and_indirect() {
        let (_dir, repo) = test_repo();
        write_ref(&repo, "refs/heads/master", SHA_A).unwrap();

        assert_eq!(
            read_ref(&repo, "refs/heads/master").unwrap(),
            Some(SHA_A.to_string())
        );
        // HEAD is "ref: refs/heads/master" from the scaffold.
        assert_eq!(read_ref(&repo, "HEAD").unwrap(), Some(SHA_A.to_string()));
    }

    #[test]
    fn test_unborn_head_reads_as_none() {
        let (_dir, repo) = test_repo();
        assert_eq!(read_ref(&repo, "HEAD").unwrap(), None);
    }

    #[test]
    fn test_indirection_cycle_fails() {
        let (_dir, repo) = test_repo();
        std::fs::write(repo.ctrl_path("refs/heads/a"), "ref: refs/heads/b\n").unwrap();
        std::fs::write(repo.ctrl_path("refs/heads/b"), "ref: refs/heads/a\n").unwrap();

        assert!(matches!(
            read_ref(&repo, "refs/heads/a"),
            Err(CairnError::Malformed(_))
        ));
    }

    #[test]
    fn test_same_name_tag_and_branch_is_ambiguous() {
        let (_dir, repo) = test_repo();
        let store = ObjectStore::open(&repo);
        write_ref(&repo, "refs/tags/v1", SHA_A).unwrap();
        write_ref(&repo, "refs/heads/v1", SHA_B).unwrap();

        match resolve_name(&repo, &store, "v1") {
            Err(CairnError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates, vec![SHA_A.to_string(), SHA_B.to_string()]);
            }
            other => panic!("expected Ambiguous, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_short_hash_resolves() {
        let (_dir, repo) = test_repo();
        let store = ObjectStore::open(&repo);
        let sha = store.write(&Object::Blob(b"hello\n".to_vec())).unwrap();

        assert_eq!(resolve_name(&repo, &store, &sha[..8]).unwrap(), sha);
        assert_eq!(resolve_name(&repo, &store, &sha).unwrap(), sha);
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let (_dir, repo) = test_repo();
        let store = ObjectStore::open(&repo);
        assert!(matches!(
            resolve_name(&repo, &store, "no-such-branch"),
            Err(CairnError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_refs_sorted() {
        let (_dir, repo) = test_repo();
        write_ref(&repo, "refs/tags/v2", SHA_B).unwrap();
        write_ref(&repo, "refs/heads/master", SHA_A).unwrap();

        let refs = list_refs(&repo).unwrap();
        assert_eq!(
            refs,
            vec![
                ("refs/heads/master".to_string(), SHA_A.to_string()),
                ("refs/tags/v2".to_string(), SHA_B.to_string()),
            ]
        );
    }

    #[test]
    fn test_current_branch_and_detached() {
        let (_dir, repo) = test_repo();
        assert_eq!(current_branch(&repo).unwrap(), Some("master".to_string()));

        std::fs::write(repo.ctrl_path("HEAD"), format!("{}\n", SHA_A)).unwrap();
        assert_eq!(current_branch(&repo).unwrap(), None);
    }
}
