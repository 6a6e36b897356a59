use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CairnError;

/// The only repository layout this engine reads and writes.
pub const SUPPORTED_FORMAT_VERSION: u32 = 0;

/// Repository configuration stored in `<control-dir>/config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoConfig {
    pub core: CoreConfig,
    /// Identity used when creating commits and annotated tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    pub repository_format_version: u32,
    pub filemode: bool,
    pub bare: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            repository_format_version: SUPPORTED_FORMAT_VERSION,
            filemode: false,
            bare: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub name: String,
    pub email: String,
}

impl UserConfig {
    /// `"Name <email>"`, the form embedded in commit and tag bodies.
    pub fn ident(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Load the config from `<control-dir>/config.toml`. A missing file is an
/// error here: a control directory without a config is not a repository.
pub fn load_repo_config(ctrl_dir: &Path) -> Result<RepoConfig, CairnError> {
    let config_path = ctrl_dir.join("config.toml");
    if !config_path.exists() {
        return Err(CairnError::NotFound(format!(
            "configuration file missing: {}",
            config_path.display()
        )));
    }
    let content = std::fs::read_to_string(&config_path)?;
    let config: RepoConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save the config to `<control-dir>/config.toml`
pub fn save_repo_config(ctrl_dir: &Path, config: &RepoConfig) -> Result<(), CairnError> {
    std::fs::create_dir_all(ctrl_dir)?;
    let config_path = ctrl_dir.join("config.toml");
    let content = toml::to_string_pretty(config)?;
    std::fs::write(&config_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();

        let config = RepoConfig {
            core: CoreConfig::default(),
            user: Some(UserConfig {
                name: "Alice".to_string(),
                email: "alice@example.com".to_string(),
            }),
        };

        save_repo_config(dir.path(), &config).unwrap();
        let loaded = load_repo_config(dir.path()).unwrap();

        assert_eq!(loaded.core.repository_format_version, 0);
        assert_eq!(loaded.user.unwrap().ident(), "Alice <alice@example.com>");
    }

    #[test]
    fn test_missing_config_is_not_found() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            load_repo_config(dir.path()),
            Err(CairnError::NotFound(_))
        ));
    }
}
