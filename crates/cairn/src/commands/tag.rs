use chrono::Local;
use libcairn_core::{refs, CairnError, Kvlm, Object, ObjectStore};

use crate::commands::open_repo;

pub fn run(
    annotate: bool,
    message: Option<&str>,
    name: Option<&str>,
    object: &str,
) -> Result<(), CairnError> {
    let repo = open_repo()?;

    let Some(name) = name else {
        // No name: list existing tags.
        for (refname, _) in refs::list_refs(&repo)? {
            if let Some(tag) = refname.strip_prefix("refs/tags/") {
                println!("{}", tag);
            }
        }
        return Ok(());
    };

    let store = ObjectStore::open(&repo);
    let target = refs::resolve_name(&repo, &store, object)?;

    let sha = if annotate {
        let message = message.ok_or_else(|| {
            CairnError::InvalidInput("an annotated tag needs a message (-m)".to_string())
        })?;
        let user = repo.config().user.clone().ok_or_else(|| {
            CairnError::InvalidInput(
                "user identity not configured; set [user] name and email in config.toml"
                    .to_string(),
            )
        })?;
        let now = Local::now();

        let mut body = Kvlm::new();
        body.push(b"object".to_vec(), target.as_bytes().to_vec());
        body.push(
            b"type".to_vec(),
            store.read(&target)?.kind().as_str().as_bytes().to_vec(),
        );
        body.push(b"tag".to_vec(), name.as_bytes().to_vec());
        body.push(
            b"tagger".to_vec(),
            format!("{} {} {}", user.ident(), now.timestamp(), now.format("%z")).into_bytes(),
        );
        body.set_message(format!("{}\n", message.trim_end()).into_bytes());

        store.write(&Object::Tag(body))?
    } else {
        target
    };

    refs::write_ref(&repo, &format!("refs/tags/{}", name), &sha)?;
    Ok(())
}
