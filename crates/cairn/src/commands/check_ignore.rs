use libcairn_core::{ignore, CairnError, Index, ObjectStore};

use crate::commands::open_repo;

pub fn run(paths: &[String]) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);
    let index = Index::read(&repo)?;
    let rules = ignore::read_rules(&repo, &store, &index)?;

    for path in paths {
        if ignore::check_ignore(&rules, path) {
            println!("{}", path);
        }
    }
    Ok(())
}
