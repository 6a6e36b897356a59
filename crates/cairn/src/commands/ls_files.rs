use libcairn_core::{index::EntryKind, CairnError, Index};

use crate::commands::open_repo;

pub fn run(verbose: bool) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let index = Index::read(&repo)?;

    if verbose {
        println!(
            "Index file format v{}, containing {} entries.",
            index.version,
            index.entries.len()
        );
    }

    for entry in &index.entries {
        println!("{}", entry.name);
        if !verbose {
            continue;
        }
        let kind = match entry.kind {
            EntryKind::Regular => "regular file",
            EntryKind::Symlink => "symlink",
            EntryKind::Gitlink => "sub-repository link",
        };
        println!("  {} with perms {:o}", kind, entry.perms);
        println!("  on blob {}", entry.sha);
        println!(
            "  created {}.{}, modified {}.{}",
            entry.ctime.0, entry.ctime.1, entry.mtime.0, entry.mtime.1
        );
        println!("  device {}, inode {}", entry.dev, entry.ino);
        println!("  user {}, group {}", entry.uid, entry.gid);
        println!(
            "  flags: stage={} assume_valid={}",
            entry.stage, entry.assume_valid
        );
    }
    Ok(())
}
