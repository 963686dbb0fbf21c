use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use std::cell::RefCell;
use std::collections::BTreeMap;

/// A port call recorded by [MockRepository]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    CheckoutTo(String),
    Pull,
    CreateBranch(String),
    CreateTag(String),
    TagExists(String),
    ListTagNames,
    PushBranchesAndTags,
}

#[derive(Debug, Default)]
struct MockState {
    branches: BTreeMap<String, String>,
    tags: BTreeMap<String, String>,
    head: Option<String>,
    remote_branches: BTreeMap<String, String>,
    remote_tags: BTreeMap<String, String>,
    calls: Vec<Operation>,
    failures: Vec<Operation>,
}

/// In-memory repository for testing without actual git operations.
///
/// Commits are opaque ids; branches and tags map names to those ids. A
/// single remote is modelled so pull and push effects can be asserted.
/// Every port call is recorded, and [fail_on](MockRepository::fail_on)
/// makes a specific call fail with the error its real counterpart would
/// raise.
#[derive(Debug, Default)]
pub struct MockRepository {
    state: RefCell<MockState>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or move a local branch
    pub fn add_branch(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.state
            .borrow_mut()
            .branches
            .insert(name.into(), commit.into());
    }

    /// Add a local tag pointing at a commit
    pub fn add_tag(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.state
            .borrow_mut()
            .tags
            .insert(name.into(), commit.into());
    }

    /// Add or move a branch on the remote
    pub fn add_remote_branch(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.state
            .borrow_mut()
            .remote_branches
            .insert(name.into(), commit.into());
    }

    /// Add a tag on the remote
    pub fn add_remote_tag(&self, name: impl Into<String>, commit: impl Into<String>) {
        self.state
            .borrow_mut()
            .remote_tags
            .insert(name.into(), commit.into());
    }

    /// Attach HEAD to a local branch without recording a call
    pub fn set_head(&self, branch: impl Into<String>) {
        self.state.borrow_mut().head = Some(branch.into());
    }

    /// Make the given call fail when it is made
    pub fn fail_on(&self, operation: Operation) {
        self.state.borrow_mut().failures.push(operation);
    }

    /// Every port call made so far, in order
    pub fn calls(&self) -> Vec<Operation> {
        self.state.borrow().calls.clone()
    }

    /// Name of the branch HEAD is attached to
    pub fn head_branch(&self) -> Option<String> {
        self.state.borrow().head.clone()
    }

    /// Commit a local branch points at
    pub fn branch_head(&self, name: &str) -> Option<String> {
        self.state.borrow().branches.get(name).cloned()
    }

    /// Commit a local tag points at
    pub fn tag_target(&self, name: &str) -> Option<String> {
        self.state.borrow().tags.get(name).cloned()
    }

    /// Commit a remote branch points at
    pub fn remote_branch_head(&self, name: &str) -> Option<String> {
        self.state.borrow().remote_branches.get(name).cloned()
    }

    /// Commit a remote tag points at
    pub fn remote_tag_target(&self, name: &str) -> Option<String> {
        self.state.borrow().remote_tags.get(name).cloned()
    }

    /// Record the call and report whether it was set up to fail
    fn record(&self, operation: Operation) -> bool {
        let mut state = self.state.borrow_mut();
        let fail = state.failures.contains(&operation);
        state.calls.push(operation);
        fail
    }

    fn head_commit(&self) -> Option<String> {
        let state = self.state.borrow();
        state
            .head
            .as_ref()
            .and_then(|branch| state.branches.get(branch))
            .cloned()
    }
}

impl Repository for MockRepository {
    fn checkout_to(&self, branch_name: &str) -> Result<()> {
        if self.record(Operation::CheckoutTo(branch_name.to_string())) {
            return Err(ReleaseError::checkout(branch_name, "injected failure"));
        }

        let mut state = self.state.borrow_mut();
        if !state.branches.contains_key(branch_name) {
            return Err(ReleaseError::checkout(branch_name, "branch not found"));
        }
        state.head = Some(branch_name.to_string());
        Ok(())
    }

    fn pull(&self) -> Result<()> {
        if self.record(Operation::Pull) {
            return Err(ReleaseError::pull("injected failure"));
        }

        let mut state = self.state.borrow_mut();
        let branch = state
            .head
            .clone()
            .ok_or_else(|| ReleaseError::pull("HEAD is not on a branch"))?;
        let remote_commit = state.remote_branches.get(&branch).cloned().ok_or_else(|| {
            ReleaseError::pull(format!("No remote branch for '{}'", branch))
        })?;

        // Mock commits carry no ancestry; every remote move is a fast-forward
        state.branches.insert(branch, remote_commit);
        Ok(())
    }

    fn create_branch(&self, branch_name: &str) -> Result<()> {
        if self.record(Operation::CreateBranch(branch_name.to_string())) {
            return Err(ReleaseError::reference("injected failure"));
        }

        let commit = self
            .head_commit()
            .ok_or_else(|| ReleaseError::reference("HEAD does not point at a commit"))?;
        self.state
            .borrow_mut()
            .branches
            .insert(branch_name.to_string(), commit);
        Ok(())
    }

    fn create_tag(&self, tag_name: &str) -> Result<()> {
        if self.record(Operation::CreateTag(tag_name.to_string())) {
            return Err(ReleaseError::reference("injected failure"));
        }

        let commit = self
            .head_commit()
            .ok_or_else(|| ReleaseError::reference("HEAD does not point at a commit"))?;
        let mut state = self.state.borrow_mut();
        if state.tags.contains_key(tag_name) {
            return Err(ReleaseError::reference(format!(
                "Cannot create tag '{}': reference already exists",
                tag_name
            )));
        }
        state.tags.insert(tag_name.to_string(), commit);
        Ok(())
    }

    fn tag_exists(&self, tag_name: &str) -> Result<bool> {
        if self.record(Operation::TagExists(tag_name.to_string())) {
            return Err(ReleaseError::query("injected failure"));
        }
        Ok(self.state.borrow().tags.contains_key(tag_name))
    }

    fn list_tag_names(&self) -> Result<Vec<String>> {
        if self.record(Operation::ListTagNames) {
            return Err(ReleaseError::query("injected failure"));
        }
        Ok(self.state.borrow().tags.keys().cloned().collect())
    }

    fn push_branches_and_tags(&self) -> Result<()> {
        if self.record(Operation::PushBranchesAndTags) {
            return Err(ReleaseError::push("injected failure"));
        }

        let mut state = self.state.borrow_mut();
        for (tag, commit) in &state.tags {
            if let Some(remote) = state.remote_tags.get(tag) {
                if remote != commit {
                    return Err(ReleaseError::push(format!(
                        "Remote rejected refs/tags/{}: already exists",
                        tag
                    )));
                }
            }
        }

        let branches = state.branches.clone();
        let tags = state.tags.clone();
        state.remote_branches.extend(branches);
        state.remote_tags.extend(tags);
        Ok(())
    }
}
