use std::path::Path;

use libcairn_core::{CairnError, Repository};

pub fn run(path: &Path) -> Result<(), CairnError> {
    let repo = Repository::create(path)?;
    println!(
        "Initialized empty repository in {}",
        repo.ctrl_dir().display()
    );
    Ok(())
}
