use std::io::Write;

use libcairn_core::{refs, CairnError, ObjectStore};

use crate::cli::KindArg;
use crate::commands::open_repo;

pub fn run(kind: KindArg, object: &str) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);

    let sha = refs::resolve_typed(&repo, &store, object, Some(kind.into()), true)?
        .ok_or_else(|| {
            CairnError::NotFound(format!("no {} reachable from '{}'", kind_name(kind), object))
        })?;

    let payload = store.read(&sha)?.serialize()?;
    std::io::stdout().write_all(&payload)?;
    Ok(())
}

fn kind_name(kind: KindArg) -> &'static str {
    libcairn_core::ObjectKind::from(kind).as_str()
}
