use crate::error::{ReleaseError, Result};
use git2::{Cred, CredentialType};
use std::cell::Cell;
use std::path::{Path, PathBuf};

/// SSH user assumed when the remote URL does not name one
pub const DEFAULT_SSH_USER: &str = "git";

/// Private key used to authenticate pull and push
#[derive(Clone)]
pub struct SshCredentials {
    pub key_file: PathBuf,
    pub passphrase: Option<String>,
}

impl std::fmt::Debug for SshCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshCredentials")
            .field("key_file", &self.key_file)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl SshCredentials {
    /// Create credentials; an empty passphrase is treated as none
    pub fn new(key_file: impl Into<PathBuf>, passphrase: Option<String>) -> Self {
        SshCredentials {
            key_file: key_file.into(),
            passphrase: passphrase.filter(|p| !p.is_empty()),
        }
    }

    /// `~/.ssh/id_rsa`, when a home directory is known
    pub fn default_key_file() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ssh").join("id_rsa"))
    }

    /// Fail early when the key file cannot be used
    pub fn validate(&self) -> Result<()> {
        let path: &Path = &self.key_file;
        if !path.exists() {
            return Err(ReleaseError::auth(format!(
                "Private key file not found: {}",
                path.display()
            )));
        }
        if !path.is_file() {
            return Err(ReleaseError::auth(format!(
                "Private key path is not a file: {}",
                path.display()
            )));
        }
        Ok(())
    }

    /// Build the libgit2 credential for a remote that asked for an SSH key
    pub fn to_cred(&self, username_from_url: Option<&str>) -> std::result::Result<git2::Cred, git2::Error> {
        git2::Cred::ssh_key(
            username_from_url.unwrap_or(DEFAULT_SSH_USER),
            None,
            &self.key_file,
            self.passphrase.as_deref(),
        )
    }
}

/// Answers libgit2 credential requests for one remote operation.
///
/// Username requests are always answered, with `git` when the URL names no
/// user. The key is offered once; libgit2 keeps asking while the remote
/// rejects it.
pub(crate) struct CredentialResponder<'a> {
    credentials: Option<&'a SshCredentials>,
    key_offered: Cell<bool>,
}

impl<'a> CredentialResponder<'a> {
    pub(crate) fn new(credentials: Option<&'a SshCredentials>) -> Self {
        CredentialResponder {
            credentials,
            key_offered: Cell::new(false),
        }
    }

    pub(crate) fn respond(
        &self,
        username_from_url: Option<&str>,
        allowed_types: CredentialType,
    ) -> std::result::Result<Cred, git2::Error> {
        let username = username_from_url.unwrap_or(DEFAULT_SSH_USER);
        if allowed_types.contains(CredentialType::USERNAME) {
            return Cred::username(username);
        }

        if self.key_offered.replace(true) {
            return Err(git2::Error::from_str("authentication rejected by remote"));
        }

        if allowed_types.contains(CredentialType::SSH_KEY) {
            return match self.credentials {
                Some(credentials) => credentials.to_cred(Some(username)),
                None => Cred::ssh_key_from_agent(username),
            };
        }

        Cred::default()
    }
}
