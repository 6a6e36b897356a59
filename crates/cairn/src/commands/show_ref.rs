use libcairn_core::{refs, CairnError};

use crate::commands::open_repo;

pub fn run() -> Result<(), CairnError> {
    let repo = open_repo()?;
    for (name, sha) in refs::list_refs(&repo)? {
        println!("{} {}", sha, name);
    }
    Ok(())
}
