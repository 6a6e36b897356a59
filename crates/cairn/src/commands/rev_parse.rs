use libcairn_core::{refs, CairnError, ObjectStore};

use crate::cli::KindArg;
use crate::commands::open_repo;

pub fn run(kind: Option<KindArg>, name: &str) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);

    let sha = refs::resolve_typed(&repo, &store, name, kind.map(Into::into), true)?
        .ok_or_else(|| CairnError::NotFound(format!("'{}' does not peel to that type", name)))?;

    println!("{}", sha);
    Ok(())
}
