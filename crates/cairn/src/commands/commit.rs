use chrono::Local;
use libcairn_core::{index, refs, CairnError, Index, Kvlm, Object, ObjectStore};

use crate::commands::open_repo;

pub fn run(message: &str) -> Result<(), CairnError> {
    let repo = open_repo()?;
    let store = ObjectStore::open(&repo);
    let index = Index::read(&repo)?;

    let tree = index::build_tree(&store, &index)?;

    // First commit on an unborn branch has no parent.
    let parent = match refs::resolve_name(&repo, &store, "HEAD") {
        Ok(sha) => Some(sha),
        Err(CairnError::NotFound(_)) => None,
        Err(e) => return Err(e),
    };

    let user = repo.config().user.clone().ok_or_else(|| {
        CairnError::InvalidInput(
            "user identity not configured; set [user] name and email in config.toml".to_string(),
        )
    })?;
    let now = Local::now();
    let stamp = format!("{} {} {}", user.ident(), now.timestamp(), now.format("%z"));

    let mut body = Kvlm::new();
    body.push(b"tree".to_vec(), tree.into_bytes());
    if let Some(parent) = &parent {
        body.push(b"parent".to_vec(), parent.clone().into_bytes());
    }
    body.push(b"author".to_vec(), stamp.clone().into_bytes());
    body.push(b"committer".to_vec(), stamp.into_bytes());
    body.set_message(format!("{}\n", message.trim_end()).into_bytes());

    let sha = store.write(&Object::Commit(body))?;
    refs::update_head(&repo, &sha)?;

    let label = refs::current_branch(&repo)?.unwrap_or_else(|| "detached HEAD".to_string());
    let subject = message.trim_end().lines().next().unwrap_or("").to_string();
    println!("[{} {}] {}", label, &sha[..7], subject);
    Ok(())
}
