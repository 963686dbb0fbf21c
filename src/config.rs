use crate::domain::policy::{DEFAULT_DEVELOP_BRANCH, DEFAULT_RELEASE_BRANCH_PREFIX};
use crate::domain::ReleasePolicy;
use crate::error::{ReleaseError, Result};
use crate::git::DEFAULT_REMOTE;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// File name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = "release.toml";
/// File name looked up in the user's config directory
pub const USER_CONFIG_FILE: &str = "git-release.toml";

/// Represents the complete configuration for git-release.
///
/// Every section is optional; missing values fall back to the standard
/// `develop` / `release/vN` / `origin` layout.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub branches: BranchesConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

fn default_remote_name() -> String {
    DEFAULT_REMOTE.to_string()
}

fn default_develop_branch() -> String {
    DEFAULT_DEVELOP_BRANCH.to_string()
}

fn default_release_prefix() -> String {
    DEFAULT_RELEASE_BRANCH_PREFIX.to_string()
}

/// Remote that releases are pulled from and pushed to
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RemoteConfig {
    #[serde(default = "default_remote_name")]
    pub name: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            name: default_remote_name(),
        }
    }
}

/// Branch layout of the repository
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BranchesConfig {
    /// Branch that major releases are cut from
    #[serde(default = "default_develop_branch")]
    pub develop: String,

    /// Prefix of release branches; `release/` gives `release/v2`
    #[serde(default = "default_release_prefix")]
    pub release_prefix: String,
}

impl Default for BranchesConfig {
    fn default() -> Self {
        BranchesConfig {
            develop: default_develop_branch(),
            release_prefix: default_release_prefix(),
        }
    }
}

/// SSH authentication settings.
///
/// The passphrase is never read from the file.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub key_file: Option<PathBuf>,
}

impl Config {
    /// Release policy described by the `[branches]` section
    pub fn policy(&self) -> ReleasePolicy {
        ReleasePolicy::new(&self.branches.develop, &self.branches.release_prefix)
    }

    fn validate(self) -> Result<Self> {
        if self.remote.name.trim().is_empty() {
            return Err(ReleaseError::config("remote.name must not be empty"));
        }
        if self.branches.develop.trim().is_empty() {
            return Err(ReleaseError::config("branches.develop must not be empty"));
        }
        Ok(self)
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `release.toml` in current directory
/// 3. `git-release.toml` in user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err(Config)` - If a file exists but cannot be read or parsed, or if a
///   custom path was given and does not exist
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let (path, config_str) = if let Some(path) = config_path {
        let content = fs::read_to_string(path).map_err(|e| {
            ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        (path.to_path_buf(), content)
    } else if let Some(path) = discover_config_file() {
        let content = fs::read_to_string(&path)?;
        (path, content)
    } else {
        log::debug!("no configuration file found, using defaults");
        return Ok(Config::default());
    };

    log::debug!("loading configuration from {}", path.display());
    let config: Config = toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("Invalid {}: {}", path.display(), e)))?;
    config.validate()
}

fn discover_config_file() -> Option<PathBuf> {
    let local = Path::new(".").join(LOCAL_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(USER_CONFIG_FILE))
        .filter(|path| path.exists())
}
