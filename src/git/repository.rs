use crate::error::{ReleaseError, Result};
use crate::git::auth::CredentialResponder;
use crate::git::{SshCredentials, DEFAULT_REMOTE};
use git2::build::CheckoutBuilder;
use git2::{BranchType, Commit, ErrorClass, Repository as Git2Repo};
use log::debug;
use std::path::Path;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    remote_name: String,
    credentials: Option<SshCredentials>,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path.as_ref()).map_err(|e| {
            ReleaseError::config(format!(
                "Not a git repository '{}': {}",
                path.as_ref().display(),
                e.message()
            ))
        })?;

        Ok(Self::from_git2(repo))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository {
            repo,
            remote_name: DEFAULT_REMOTE.to_string(),
            credentials: None,
        }
    }

    /// Authenticate SSH remotes with this key instead of the agent
    pub fn with_credentials(mut self, credentials: SshCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Pull from and push to this remote instead of `origin`
    pub fn with_remote(mut self, remote_name: impl Into<String>) -> Self {
        self.remote_name = remote_name.into();
        self
    }

    pub fn remote_name(&self) -> &str {
        &self.remote_name
    }

    /// Callbacks that answer libgit2's credential requests
    fn remote_callbacks(&self) -> git2::RemoteCallbacks<'_> {
        let responder = CredentialResponder::new(self.credentials.as_ref());
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(move |_url, username_from_url, allowed_types| {
            responder.respond(username_from_url, allowed_types)
        });
        callbacks
    }

    /// Whether the remote currently advertises `refs/heads/<branch_name>`.
    ///
    /// A fetch of a branch that was deleted upstream succeeds without
    /// touching the stale remote-tracking ref, so existence is checked first.
    fn remote_has_branch(&self, remote: &mut git2::Remote<'_>, branch_name: &str) -> Result<bool> {
        let wanted = format!("refs/heads/{}", branch_name);
        let connection = remote
            .connect_auth(git2::Direction::Fetch, Some(self.remote_callbacks()), None)
            .map_err(|e| ReleaseError::pull(self.describe_remote_error("connect", &e)))?;
        let heads = connection
            .list()
            .map_err(|e| ReleaseError::pull(self.describe_remote_error("ref listing", &e)))?;
        let found = heads.iter().any(|head| head.name() == wanted);
        Ok(found)
    }

    fn head_commit(&self) -> std::result::Result<Commit<'_>, git2::Error> {
        self.repo.head()?.peel_to_commit()
    }

    fn current_branch(&self) -> Result<String> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::pull(format!("Cannot resolve HEAD: {}", e.message())))?;
        if !head.is_branch() {
            return Err(ReleaseError::pull("HEAD is not on a branch"));
        }
        head.shorthand()
            .ok()
            .map(|s| s.to_string())
            .ok_or_else(|| ReleaseError::pull("Current branch name is not valid UTF-8"))
    }

    fn describe_remote_error(&self, action: &str, e: &git2::Error) -> String {
        match e.class() {
            ErrorClass::Net => format!(
                "Network error during {} with '{}': {}",
                action,
                self.remote_name,
                e.message()
            ),
            ErrorClass::Ssh => format!(
                "SSH error during {} with '{}': {}",
                action,
                self.remote_name,
                e.message()
            ),
            _ => format!("{} with '{}' failed: {}", action, self.remote_name, e.message()),
        }
    }
}

impl super::Repository for Git2Repository {
    fn checkout_to(&self, branch_name: &str) -> Result<()> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .map_err(|e| ReleaseError::checkout(branch_name, e.message()))?;

        let reference = branch.into_reference();
        let ref_name = reference
            .name()
            .ok()
            .ok_or_else(|| ReleaseError::checkout(branch_name, "reference name is not valid UTF-8"))?
            .to_string();
        let commit = reference
            .peel_to_commit()
            .map_err(|e| ReleaseError::checkout(branch_name, e.message()))?;

        // Safe checkout keeps uncommitted changes that do not conflict
        self.repo
            .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| ReleaseError::checkout(branch_name, e.message()))?;
        self.repo
            .set_head(&ref_name)
            .map_err(|e| ReleaseError::checkout(branch_name, e.message()))?;

        debug!("checked out {} at {}", branch_name, commit.id());
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        let branch_name = self.current_branch()?;

        let mut remote = self.repo.find_remote(&self.remote_name).map_err(|_| {
            ReleaseError::pull(format!("Remote '{}' not found", self.remote_name))
        })?;

        if !self.remote_has_branch(&mut remote, &branch_name)? {
            return Err(ReleaseError::pull(format!(
                "Branch '{}' does not exist on remote '{}'",
                branch_name, self.remote_name
            )));
        }

        let mut fetch_options = git2::FetchOptions::new();
        fetch_options.remote_callbacks(self.remote_callbacks());

        let refspec = format!(
            "+refs/heads/{0}:refs/remotes/{1}/{0}",
            branch_name, self.remote_name
        );
        remote
            .fetch(&[refspec.as_str()], Some(&mut fetch_options), None)
            .map_err(|e| ReleaseError::pull(self.describe_remote_error("fetch", &e)))?;

        let tracking_name = format!("refs/remotes/{}/{}", self.remote_name, branch_name);
        let tracking_ref = self.repo.find_reference(&tracking_name).map_err(|_| {
            ReleaseError::pull(format!(
                "Branch '{}' does not exist on remote '{}'",
                branch_name, self.remote_name
            ))
        })?;
        let fetched = self
            .repo
            .reference_to_annotated_commit(&tracking_ref)
            .map_err(|e| ReleaseError::pull(e.message()))?;

        let (analysis, _) = self
            .repo
            .merge_analysis(&[&fetched])
            .map_err(|e| ReleaseError::pull(e.message()))?;

        if analysis.is_up_to_date() {
            debug!("{} already up to date with {}", branch_name, tracking_name);
            return Ok(());
        }

        if !analysis.is_fast_forward() {
            return Err(ReleaseError::pull(format!(
                "Branch '{}' has diverged from '{}/{}' and cannot be fast-forwarded",
                branch_name, self.remote_name, branch_name
            )));
        }

        let target = self
            .repo
            .find_commit(fetched.id())
            .map_err(|e| ReleaseError::pull(e.message()))?;

        // Update the working tree against the old HEAD first, then move the branch
        self.repo
            .checkout_tree(target.as_object(), Some(CheckoutBuilder::new().safe()))
            .map_err(|e| ReleaseError::pull(format!("Cannot update working tree: {}", e.message())))?;

        let mut local_ref = self
            .repo
            .find_reference(&format!("refs/heads/{}", branch_name))
            .map_err(|e| ReleaseError::pull(e.message()))?;
        local_ref
            .set_target(target.id(), &format!("pull: fast-forward from {}", tracking_name))
            .map_err(|e| ReleaseError::pull(e.message()))?;

        debug!("fast-forwarded {} to {}", branch_name, target.id());
        Ok(())
    }

    fn create_branch(&self, branch_name: &str) -> Result<()> {
        let head = self
            .head_commit()
            .map_err(|e| ReleaseError::reference(format!("Cannot resolve HEAD: {}", e.message())))?;

        // Set the reference directly so an existing branch is overwritten,
        // even when it is the one currently checked out
        self.repo
            .reference(
                &format!("refs/heads/{}", branch_name),
                head.id(),
                true,
                "branch: created from HEAD",
            )
            .map_err(|e| {
                ReleaseError::reference(format!(
                    "Cannot create branch '{}': {}",
                    branch_name,
                    e.message()
                ))
            })?;

        debug!("branch {} -> {}", branch_name, head.id());
        Ok(())
    }

    fn create_tag(&self, tag_name: &str) -> Result<()> {
        let head = self
            .head_commit()
            .map_err(|e| ReleaseError::reference(format!("Cannot resolve HEAD: {}", e.message())))?;

        self.repo
            .tag_lightweight(tag_name, head.as_object(), false)
            .map_err(|e| {
                ReleaseError::reference(format!("Cannot create tag '{}': {}", tag_name, e.message()))
            })?;

        debug!("tag {} -> {}", tag_name, head.id());
        Ok(())
    }

    fn tag_exists(&self, tag_name: &str) -> Result<bool> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(_) => Ok(true),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(false),
            Err(e) => Err(ReleaseError::query(format!(
                "Cannot look up tag '{}': {}",
                tag_name,
                e.message()
            ))),
        }
    }

    fn list_tag_names(&self) -> Result<Vec<String>> {
        let tags = self
            .repo
            .tag_names(None)
            .map_err(|e| ReleaseError::query(format!("Cannot list tags: {}", e.message())))?;

        Ok(tags.iter().flatten().flatten().map(|s| s.to_string()).collect())
    }

    fn push_branches_and_tags(&self) -> Result<()> {
        let mut refspecs = Vec::new();

        let branches = self
            .repo
            .branches(Some(BranchType::Local))
            .map_err(|e| ReleaseError::push(format!("Cannot list branches: {}", e.message())))?;
        for branch in branches {
            let (branch, _) = branch.map_err(|e| ReleaseError::push(e.message()))?;
            if let Some(name) = branch.name().map_err(|e| ReleaseError::push(e.message()))? {
                refspecs.push(format!("+refs/heads/{0}:refs/heads/{0}", name));
            }
        }

        let tags = self
            .repo
            .tag_names(None)
            .map_err(|e| ReleaseError::push(format!("Cannot list tags: {}", e.message())))?;
        for tag in tags.iter().flatten().flatten() {
            refspecs.push(format!("refs/tags/{0}:refs/tags/{0}", tag));
        }

        if refspecs.is_empty() {
            debug!("nothing to push to {}", self.remote_name);
            return Ok(());
        }

        let mut remote = self.repo.find_remote(&self.remote_name).map_err(|_| {
            ReleaseError::push(format!("Remote '{}' not found", self.remote_name))
        })?;

        let mut callbacks = self.remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });

        let mut push_options = git2::PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&refspecs, Some(&mut push_options))
            .map_err(|e| ReleaseError::push(self.describe_remote_error("push", &e)))?;

        debug!("pushed {} refs to {}", refspecs.len(), self.remote_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Repository;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn init_with_commit() -> (TempDir, Git2Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Git2Repo::init(temp.path()).unwrap();
        {
            let sig = Signature::now("Test", "test@example.com").unwrap();
            fs::write(temp.path().join("README.md"), "content\n").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("README.md")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            let commit = repo
                .commit(None, &sig, &sig, "Initial commit", &tree, &[])
                .unwrap();
            let commit = repo.find_commit(commit).unwrap();
            repo.branch("develop", &commit, false).unwrap();
            repo.set_head("refs/heads/develop").unwrap();
        }
        (temp, Git2Repository::from_git2(repo))
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let temp = TempDir::new().unwrap();
        let result = Git2Repository::open(temp.path().join("missing"));
        assert!(result.is_err());
    }

    #[test]
    fn test_checkout_missing_branch() {
        let (_temp, repo) = init_with_commit();
        let err = repo.checkout_to("release/v1").unwrap_err();
        assert!(matches!(err, ReleaseError::Checkout { .. }));
    }

    #[test]
    fn test_branch_and_tag_at_head() {
        let (_temp, repo) = init_with_commit();
        repo.checkout_to("develop").unwrap();

        repo.create_branch("release/v1").unwrap();
        repo.create_tag("v1.0").unwrap();

        assert!(repo.tag_exists("v1.0").unwrap());
        assert!(!repo.tag_exists("v1.1").unwrap());
        assert_eq!(repo.list_tag_names().unwrap(), vec!["v1.0".to_string()]);

        let head = repo.head_commit().unwrap().id();
        let branch = repo
            .repo
            .find_branch("release/v1", BranchType::Local)
            .unwrap();
        assert_eq!(branch.get().target(), Some(head));
    }

    #[test]
    fn test_create_tag_twice_fails() {
        let (_temp, repo) = init_with_commit();
        repo.create_tag("v1.0").unwrap();
        assert!(matches!(repo.create_tag("v1.0"), Err(ReleaseError::Ref(_))));
    }

    #[test]
    fn test_pull_without_remote_fails() {
        let (_temp, repo) = init_with_commit();
        let err = repo.pull().unwrap_err();
        assert!(matches!(err, ReleaseError::Pull(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_push_without_remote_fails() {
        let (_temp, repo) = init_with_commit();
        let err = repo.push_branches_and_tags().unwrap_err();
        assert!(matches!(err, ReleaseError::Push(_)));
    }

    #[test]
    fn test_builder_options() {
        let (_temp, repo) = init_with_commit();
        assert_eq!(repo.remote_name(), "origin");
        let repo = repo
            .with_remote("upstream")
            .with_credentials(SshCredentials::new("/tmp/key", None));
        assert_eq!(repo.remote_name(), "upstream");
        assert!(repo.credentials.is_some());
    }
}
