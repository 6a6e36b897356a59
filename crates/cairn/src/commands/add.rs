use std::path::PathBuf;

use libcairn_core::{index, CairnError, Index, ObjectStore};

use crate::commands::{open_repo, worktree_rel};

pub fn run(paths: &[PathBuf]) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);
    let mut index = Index::read(&repo)?;

    for path in paths {
        let rel = worktree_rel(&repo, path)?;
        index::stage_file(&repo, &store, &mut index, &rel)?;
    }

    index.write(&repo)
}
