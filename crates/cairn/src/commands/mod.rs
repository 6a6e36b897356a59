pub mod add;
pub mod cat_file;
pub mod check_ignore;
pub mod checkout;
pub mod commit;
pub mod hash_object;
pub mod init;
pub mod log;
pub mod ls_files;
pub mod ls_tree;
pub mod rev_parse;
pub mod rm;
pub mod show_ref;
pub mod status;
pub mod tag;

use std::path::Path;

use libcairn_core::{repo::CTRL_DIR, CairnError, Repository};

/// Open the repository containing the current directory.
pub(crate) fn open_repo() -> Result<Repository, CairnError> {
    Repository::discover(Path::new("."))
}

/// Normalize a user-supplied path to a repo-relative, slash-separated
/// string, rejecting anything outside the working tree or inside the
/// control directory.
pub(crate) fn worktree_rel(repo: &Repository, path: &Path) -> Result<String, CairnError> {
    let abs = path
        .canonicalize()
        .map_err(|_| CairnError::NotFound(format!("no such path: {}", path.display())))?;
    let rel = abs.strip_prefix(repo.worktree()).map_err(|_| {
        CairnError::InvalidInput(format!("{} is outside the working tree", path.display()))
    })?;
    let rel = rel
        .to_str()
        .ok_or_else(|| CairnError::InvalidInput(format!("non-UTF-8 path: {}", path.display())))?;

    if rel == CTRL_DIR || rel.starts_with(&format!("{}/", CTRL_DIR)) {
        return Err(CairnError::InvalidInput(format!(
            "{} is inside the control directory",
            path.display()
        )));
    }
    Ok(rel.to_string())
}
