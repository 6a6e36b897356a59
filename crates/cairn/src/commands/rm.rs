use std::path::PathBuf;

use libcairn_core::{CairnError, Index};

use crate::commands::{open_repo, worktree_rel};

pub fn run(paths: &[PathBuf]) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let mut index = Index::read(&repo)?;

    // Validate every path before touching the index or the worktree.
    let rels: Vec<String> = paths
        .iter()
        .map(|p| worktree_rel(&repo, p))
        .collect::<Result<_, _>>()?;
    for rel in &rels {
        if index.entry(rel).is_none() {
            return Err(CairnError::InvalidInput(format!("not staged: {}", rel)));
        }
    }

    for rel in &rels {
        index.remove(rel);
        std::fs::remove_file(repo.worktree().join(rel))?;
    }

    index.write(&repo)
}
