//! Tree-to-filesystem materialization.

use std::path::Path;

use tracing::{debug, warn};

use crate::error::CairnError;
use crate::object::Object;
use crate::store::ObjectStore;
use crate::tree::Tree;

/// Materialize the tree `tree_sha` under `dest`.
///
/// `dest` must not exist (it is created) or must be an empty directory;
/// anything else is a precondition failure. Entries with a symlink mode
/// ("12" prefix) are written as regular files holding the link-target
/// bytes: symlink materialization is out of this engine's scope.
pub fn checkout(store: &ObjectStore, tree_sha: &str, dest: &Path) -> Result<(), CairnError> {
    if dest.exists() {
        if !dest.is_dir() {
            return Err(CairnError::PreconditionViolated(format!(
                "{} is not a directory",
                dest.display()
            )));
        }
        if std::fs::read_dir(dest)?.next().is_some() {
            return Err(CairnError::PreconditionViolated(format!(
                "{} is not empty",
                dest.display()
            )));
        }
    } else {
        std::fs::create_dir_all(dest)?;
    }

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

    checkout_tree(store, &tree, dest)
}

fn checkout_tree(store: &ObjectStore, tree: &Tree, dest: &Path) -> Result<(), CairnError> {
    for entry in &tree.entries {
        let target = dest.join(&entry.name);
        match store.read(&entry.sha)? {
            Object::Tree(subtree) => {
                std::fs::create_dir(&target)?;
                checkout_tree(store, &subtree, &target)?;
            }
            Object::Blob(data) => {
                if entry.mode.starts_with("12") {
                    warn!(path = %target.display(), "symlink entry written as a regular file");
                }
                std::fs::write(&target, data)?;
            }
            other => {
                return Err(CairnError::Unsupported(format!(
                    "tree entry '{}' references a {} object",
                    entry.name,
                    other.kind()
                )))
            }
        }
    }
    debug!(path = %dest.display(), entries = tree.entries.len(), "checked out tree");
    Ok(())
}
