use std::path::Path;

use libcairn_core::{checkout, refs, CairnError, ObjectKind, ObjectStore};

use crate::commands::open_repo;

pub fn run(commit: &str, path: &Path) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);

    let tree = refs::resolve_typed(&repo, &store, commit, Some(ObjectKind::Tree), true)?
        .ok_or_else(|| CairnError::NotFound(format!("no tree reachable from '{}'", commit)))?;

    checkout::checkout(&store, &tree, path)
}
