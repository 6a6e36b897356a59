use std::path::Path;

use libcairn_core::{object::Object, CairnError, ObjectStore};

use crate::cli::KindArg;
use crate::commands::open_repo;

pub fn run(kind: KindArg, write: bool, path: &Path) -> Result<(), CairnError> {
    let data = std::fs::read(path)?;
    let object = Object::deserialize(kind.into(), &data)?;

    let sha = if write {
        let repo = open_repo()?;
        ObjectStore::open(&repo).write(&object)?
    } else {
        object.id()?
    };

    println!("{}", sha);
    Ok(())
}
