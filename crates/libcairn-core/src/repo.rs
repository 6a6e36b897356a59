use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::{load_repo_config, save_repo_config, RepoConfig, SUPPORTED_FORMAT_VERSION};
use crate::error::CairnError;

/// Name of the per-repository control directory.
pub const CTRL_DIR: &str = ".cairn";

/// Where HEAD points in a freshly created repository.
pub const DEFAULT_HEAD: &str = "ref: refs/heads/master\n";

/// Handle to a working tree and its control directory.
///
/// Constructed per command invocation; the only state it owns is the
/// configuration loaded (and version-checked) at open time.
pub struct Repository {
    worktree: PathBuf,
    ctrl_dir: PathBuf,
    config: RepoConfig,
}

impl Repository {
    /// Open an existing repository rooted at `path`.
    pub fn open(path: &Path) -> Result<Self, CairnError> {
        let worktree = path.to_path_buf();
        let ctrl_dir = worktree.join(CTRL_DIR);

        if !ctrl_dir.is_dir() {
            return Err(CairnError::NotFound(format!(
                "not a cairn repository: {}",
                worktree.display()
            )));
        }

        let config = load_repo_config(&ctrl_dir)?;
        let version = config.core.repository_format_version;
        if version != SUPPORTED_FORMAT_VERSION {
            return Err(CairnError::Unsupported(format!(
                "repository format version {} (supported: {})",
                version, SUPPORTED_FORMAT_VERSION
            )));
        }

        Ok(Self {
            worktree,
            ctrl_dir,
            config,
        })
    }

    /// Create a new repository at `path`, scaffolding the control directory.
    ///
    /// `path` may be absent (it is created) or an existing directory; an
    /// existing non-empty control directory is a precondition failure.
    pub fn create(path: &Path) -> Result<Self, CairnError> {
        let worktree = path.to_path_buf();
        let ctrl_dir = worktree.join(CTRL_DIR);

        if worktree.exists() {
            if !worktree.is_dir() {
                return Err(CairnError::PreconditionViolated(format!(
                    "{} is not a directory",
                    worktree.display()
                )));
            }
            if ctrl_dir.exists() && std::fs::read_dir(&ctrl_dir)?.next().is_some() {
                return Err(CairnError::PreconditionViolated(format!(
                    "{} is not empty",
                    ctrl_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&worktree)?;
        }

        for dir in ["branches", "objects", "refs/tags", "refs/heads", "info"] {
            std::fs::create_dir_all(ctrl_dir.join(dir))?;
        }

        std::fs::write(
            ctrl_dir.join("description"),
            "Unnamed repository; edit this file 'description' to name the repository.\n",
        )?;
        std::fs::write(ctrl_dir.join("HEAD"), DEFAULT_HEAD)?;

        let config = RepoConfig::default();
        save_repo_config(&ctrl_dir, &config)?;

        debug!(path = %worktree.display(), "created repository");

        Ok(Self {
            worktree,
            ctrl_dir,
            config,
        })
    }

    /// Walk `start` and its ancestors looking for a control directory.
    pub fn discover(start: &Path) -> Result<Self, CairnError> {
        let start = start
            .canonicalize()
            .map_err(|_| CairnError::NotFound(format!("no such path: {}", start.display())))?;

        for dir in start.ancestors() {
            if dir.join(CTRL_DIR).is_dir() {
                return Self::open(dir);
            }
        }

        Err(CairnError::NotFound(format!(
            "no cairn repository found in {} or any parent directory",
            start.display()
        )))
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn ctrl_dir(&self) -> &Path {
        &self.ctrl_dir
    }

    pub fn config(&self) -> &RepoConfig {
        &self.config
    }

    /// Path under the control directory. No filesystem access.
    pub fn ctrl_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.ctrl_dir.join(rel)
    }

    /// Path to a file under the control directory, creating any missing
    /// parent directories. `create_dir_all` treats a concurrently created
    /// directory as success rather than a conflict.
    pub fn ctrl_file(&self, rel: impl AsRef<Path>) -> Result<PathBuf, CairnError> {
        let path = self.ctrl_path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

}
