//! Git operations abstraction layer
//!
//! This module provides the capability interface the release workflow runs
//! against, plus the implementations that back it.
//!
//! # Overview
//!
//! The primary abstraction is the [Repository] trait. The concrete
//! implementations include:
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory implementation for testing
//!
//! # Usage
//!
//! Workflow code is generic over [Repository] and never touches `git2`
//! directly, so it can be exercised against the mock.
//!
//! ```rust
//! # use git_release::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> git_release::Result<()> {
//! repo.checkout_to("develop")?;
//! repo.pull()?;
//! if !repo.tag_exists("v2.0")? {
//!     repo.create_tag("v2.0")?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod mock;
pub mod repository;

pub use auth::{SshCredentials, DEFAULT_SSH_USER};
pub use mock::{MockRepository, Operation};
pub use repository::Git2Repository;

use crate::error::Result;

/// Remote used for pull and push unless configured otherwise
pub const DEFAULT_REMOTE: &str = "origin";

/// Version-control primitives the release workflow depends on.
///
/// Every operation blocks until complete. Implementations are used from a
/// single thread for the duration of one workflow run; concurrent runs
/// against the same working tree are not supported.
///
/// ## Error Handling
///
/// Each method maps its failures onto one [crate::error::ReleaseError]
/// variant: checkout onto `Checkout`, pull onto `Pull`, branch and tag
/// creation onto `Ref`, queries onto `Query`, push onto `Push`.
pub trait Repository {
    /// Switch the working tree to a local branch
    ///
    /// Uncommitted changes that do not conflict with the target branch are
    /// kept.
    ///
    /// # Returns
    /// * `Ok(())` - HEAD now points at `refs/heads/<branch_name>`
    /// * `Err(Checkout)` - If the branch does not exist or the checkout would
    ///   overwrite local changes
    fn checkout_to(&self, branch_name: &str) -> Result<()>;

    /// Fast-forward the current branch from the remote
    ///
    /// Being already up to date is success.
    ///
    /// # Returns
    /// * `Ok(())` - Branch is at the remote head (or was already)
    /// * `Err(Pull)` - If fetching fails or the branch cannot be fast-forwarded
    fn pull(&self) -> Result<()>;

    /// Point a branch at the current HEAD commit
    ///
    /// An existing branch of the same name is overwritten; callers that care
    /// about existence must check first.
    fn create_branch(&self, branch_name: &str) -> Result<()>;

    /// Create a lightweight tag at the current HEAD commit
    fn create_tag(&self, tag_name: &str) -> Result<()>;

    /// Check whether `refs/tags/<tag_name>` exists
    fn tag_exists(&self, tag_name: &str) -> Result<bool>;

    /// Short names of all tags in the repository
    fn list_tag_names(&self) -> Result<Vec<String>>;

    /// Push every local branch (overwriting the remote) and every tag
    ///
    /// Nothing to push is success.
    fn push_branches_and_tags(&self) -> Result<()>;
}
