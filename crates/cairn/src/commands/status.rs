use std::collections::HashMap;
use std::path::Path;

use libcairn_core::{
    ignore,
    index::{self, Index, IndexEntry},
    refs,
    repo::CTRL_DIR,
    tree, CairnError, ObjectKind, ObjectStore, Repository,
};

use crate::commands::open_repo;

pub fn run() -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);
    let index = Index::read(&repo)?;

    print_branch(&repo)?;
    println!();
    print_staged(&repo, &store, &index)?;
    println!();
    print_unstaged(&repo, &index)?;
    println!();
    print_untracked(&repo, &store, &index)?;
    Ok(())
}

fn print_branch(repo: &Repository) -> Result<(), CairnError> {
    match refs::current_branch(repo)? {
        Some(branch) => println!("On branch {}", branch),
        None => match refs::read_ref(repo, "HEAD")? {
            Some(sha) => println!("HEAD detached at {}", sha),
            None => println!("Not currently on any branch."),
        },
    }
    Ok(())
}

/// Flattened HEAD tree, empty on an unborn branch.
fn head_tree(repo: &Repository, store: &ObjectStore) -> Result<HashMap<String, String>, CairnError> {
    match refs::resolve_typed(repo, store, "HEAD", Some(ObjectKind::Tree), true) {
        Ok(Some(sha)) => tree::flatten(store, &sha),
        Ok(None) => Ok(HashMap::new()),
        Err(CairnError::NotFound(_)) => Ok(HashMap::new()),
        Err(e) => Err(e),
    }
}

fn print_staged(
    repo: &Repository,
    store: &ObjectStore,
    index: &Index,
) -> Result<(), CairnError> {
    let mut head = head_tree(repo, store)?;

    println!("Changes to be committed:");
    for entry in &index.entries {
        match head.remove(&entry.name) {
            Some(sha) if sha != entry.sha => println!("  modified: {}", entry.name),
            Some(_) => {}
            None => println!("  added:    {}", entry.name),
        }
    }

    let mut deleted: Vec<String> = head.into_keys().collect();
    deleted.sort();
    for name in deleted {
        println!("  deleted:  {}", name);
    }
    Ok(())
}

#[cfg(unix)]
fn metadata_matches(entry: &IndexEntry, meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::MetadataExt;
    meta.ctime() as u32 == entry.ctime.0
        && meta.ctime_nsec() as u32 == entry.ctime.1
        && meta.mtime() as u32 == entry.mtime.0
        && meta.mtime_nsec() as u32 == entry.mtime.1
}

#[cfg(not(unix))]
fn metadata_matches(_entry: &IndexEntry, _meta: &std::fs::Metadata) -> bool {
    false
}

fn print_unstaged(repo: &Repository, index: &Index) -> Result<(), CairnError> {
    println!("Changes not staged for commit:");
    for entry in &index.entries {
        let path = repo.worktree().join(&entry.name);
        if !path.is_file() {
            println!("  deleted:  {}", entry.name);
            continue;
        }
        let meta = std::fs::metadata(&path)?;
        if metadata_matches(entry, &meta) {
            continue;
        }
        // Timestamps moved: compare content hashes before concluding.
        if index::hash_worktree_file(&path)? != entry.sha {
            println!("  modified: {}", entry.name);
        }
    }
    Ok(())
}

fn print_untracked(
    repo: &Repository,
    store: &ObjectStore,
    index: &Index,
) -> Result<(), CairnError> {
    let rules = ignore::read_rules(repo, store, index)?;

    println!("Untracked files:");
    let mut files = Vec::new();
    collect_files(repo.worktree(), repo.worktree(), &mut files)?;
    files.sort();
    for rel in files {
        if index.entry(&rel).is_none() && !ignore::check_ignore(&rules, &rel) {
            println!("  {}", rel);
        }
    }
    Ok(())
}

fn collect_files(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<(), CairnError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            if entry.file_name() == CTRL_DIR {
                continue;
            }
            collect_files(root, &path, out)?;
        } else if file_type.is_file() {
            if let Ok(rel) = path.strip_prefix(root) {
                if let Some(rel) = rel.to_str() {
                    out.push(rel.to_string());
                }
            }
        }
    }
    Ok(())
}
