use libcairn_core::{refs, CairnError, Object, ObjectKind, ObjectStore};

use crate::commands::open_repo;

pub fn run(recursive: bool, tree: &str) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);

    let sha = refs::resolve_typed(&repo, &store, tree, Some(ObjectKind::Tree), true)?
        .ok_or_else(|| CairnError::NotFound(format!("no tree reachable from '{}'", tree)))?;

    walk(&store, &sha, "", recursive)
}

fn walk(store: &ObjectStore, sha: &str, prefix: &str, recursive: bool) -> Result<(), CairnError> {
    let tree = match store.read(sha)? {
        Object::Tree(tree) => tree,
        other => {
            return Err(CairnError::Malformed(format!(
                "{} is a {}, not a tree",
                sha,
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

        if recursive && entry.is_tree() {
            walk(store, &entry.sha, &path, recursive)?;
            continue;
        }

        let kind = match &entry.mode[..2] {
            "04" => "tree",
            "10" | "12" => "blob",
            "16" => "commit",
            other => {
                return Err(CairnError::Malformed(format!(
                    "tree entry '{}': unknown mode prefix {}",
                    path, other
                )))
            }
        };
        println!("{} {} {}\t{}", entry.mode, kind, entry.sha, path);
    }
    Ok(())
}
