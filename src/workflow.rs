//! Release workflow state machine
//!
//! A release is a fixed, linear sequence of repository operations chosen by
//! [ReleaseKind]:
//!
//! - **major** `vN.0`: checkout develop, pull, create `release/vN`, check the
//!   tag is new, create the tag, push
//! - **minor** `vN.M`: checkout `release/vN`, pull, check the tag is new,
//!   create the tag, push
//!
//! Steps run strictly in order and the first failure stops the run. Nothing
//! is rolled back: the repository keeps whatever the earlier steps did, and
//! the returned error names the step that failed so the operator knows
//! where to pick up.
//!
//! Pull and push have no timeout. A remote that never answers blocks the
//! run indefinitely.

use crate::domain::{ReleaseKind, ReleasePolicy, VersionToken};
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use log::{info, warn};
use std::fmt;

/// One repository operation in a release plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStep {
    Checkout(String),
    Pull,
    CreateBranch(String),
    CheckTag(String),
    CreateTag(String),
    Push,
}

impl WorkflowStep {
    /// State the workflow is in once this step has succeeded
    pub fn completed_state(&self) -> WorkflowState {
        match self {
            WorkflowStep::Checkout(_) => WorkflowState::CheckedOut,
            WorkflowStep::Pull => WorkflowState::Updated,
            WorkflowStep::CreateBranch(_) => WorkflowState::BranchEnsured,
            WorkflowStep::CheckTag(_) => WorkflowState::TagChecked,
            WorkflowStep::CreateTag(_) => WorkflowState::TagCreated,
            WorkflowStep::Push => WorkflowState::Pushed,
        }
    }

    /// Human-readable description used for plan output
    pub fn describe(&self) -> String {
        match self {
            WorkflowStep::Checkout(branch) => format!("Check out branch '{}'", branch),
            WorkflowStep::Pull => "Fast-forward from the remote".to_string(),
            WorkflowStep::CreateBranch(branch) => format!("Create branch '{}' at HEAD", branch),
            WorkflowStep::CheckTag(tag) => format!("Verify tag '{}' does not exist", tag),
            WorkflowStep::CreateTag(tag) => format!("Create tag '{}' at HEAD", tag),
            WorkflowStep::Push => "Push all branches and tags to the remote".to_string(),
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowStep::Checkout(branch) => write!(f, "checkout {}", branch),
            WorkflowStep::Pull => write!(f, "pull"),
            WorkflowStep::CreateBranch(branch) => write!(f, "create branch {}", branch),
            WorkflowStep::CheckTag(tag) => write!(f, "check tag {}", tag),
            WorkflowStep::CreateTag(tag) => write!(f, "create tag {}", tag),
            WorkflowStep::Push => write!(f, "push"),
        }
    }
}

/// Where a workflow run currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    CheckedOut,
    Updated,
    /// Release branch created (major releases only)
    BranchEnsured,
    TagChecked,
    TagCreated,
    /// Terminal success
    Pushed,
    /// Terminal failure; no later step ran
    Failed { step: WorkflowStep },
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowState::Pushed | WorkflowState::Failed { .. })
    }
}

/// The ordered steps that publish one version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub kind: ReleaseKind,
    pub version: VersionToken,
    /// Branch checked out first: develop for major, the release branch for minor
    pub source_branch: String,
    pub release_branch: String,
    pub tag: String,
    pub steps: Vec<WorkflowStep>,
}

impl ReleasePlan {
    pub fn new(policy: &ReleasePolicy, version: VersionToken) -> Self {
        let kind = policy.classify(&version);
        let source_branch = policy.source_branch(&version);
        let release_branch = policy.release_branch_name(&version);
        let tag = policy.tag_name(&version);

        let mut steps = vec![WorkflowStep::Checkout(source_branch.clone()), WorkflowStep::Pull];
        if kind == ReleaseKind::Major {
            steps.push(WorkflowStep::CreateBranch(release_branch.clone()));
        }
        steps.push(WorkflowStep::CheckTag(tag.clone()));
        steps.push(WorkflowStep::CreateTag(tag.clone()));
        steps.push(WorkflowStep::Push);

        ReleasePlan {
            kind,
            version,
            source_branch,
            release_branch,
            tag,
            steps,
        }
    }
}

/// Result of a successful release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseOutcome {
    pub kind: ReleaseKind,
    pub version: VersionToken,
    /// The tag that was created and pushed
    pub tag: String,
    /// The release branch the tag sits on
    pub branch: String,
}

/// Runs release plans against a repository
pub struct ReleaseWorkflow<'r, R: Repository + ?Sized> {
    repo: &'r R,
    policy: ReleasePolicy,
    state: WorkflowState,
}

impl<'r, R: Repository + ?Sized> ReleaseWorkflow<'r, R> {
    pub fn new(repo: &'r R, policy: ReleasePolicy) -> Self {
        ReleaseWorkflow {
            repo,
            policy,
            state: WorkflowState::Idle,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn plan(&self, version: VersionToken) -> ReleasePlan {
        ReleasePlan::new(&self.policy, version)
    }

    /// Publish `version`, executing its plan step by step.
    ///
    /// Returns the error of the first failing step, wrapped with the release
    /// kind and the step. The workflow is left in [WorkflowState::Failed].
    pub fn run(&mut self, version: VersionToken) -> Result<ReleaseOutcome> {
        let plan = self.plan(version);
        self.state = WorkflowState::Idle;

        info!(
            "publishing {} as a {} release from '{}'",
            plan.tag, plan.kind, plan.source_branch
        );

        for step in &plan.steps {
            info!("step: {}", step);
            if let Err(e) = self.execute(step) {
                warn!("{} release of {} stopped at '{}': {}", plan.kind, plan.tag, step, e);
                self.state = WorkflowState::Failed { step: step.clone() };
                return Err(e.at_step(plan.kind, step.clone()));
            }
            self.state = step.completed_state();
        }

        info!("published {} on '{}'", plan.tag, plan.release_branch);
        Ok(ReleaseOutcome {
            kind: plan.kind,
            version: plan.version,
            tag: plan.tag,
            branch: plan.release_branch,
        })
    }

    fn execute(&self, step: &WorkflowStep) -> Result<()> {
        match step {
            WorkflowStep::Checkout(branch) => self.repo.checkout_to(branch),
            WorkflowStep::Pull => self.repo.pull(),
            WorkflowStep::CreateBranch(branch) => self.repo.create_branch(branch),
            WorkflowStep::CheckTag(tag) => {
                if self.repo.tag_exists(tag)? {
                    return Err(ReleaseError::DuplicateTag(tag.clone()));
                }
                Ok(())
            }
            WorkflowStep::CreateTag(tag) => self.repo.create_tag(tag),
            WorkflowStep::Push => self.repo.push_branches_and_tags(),
        }
    }
}

/// Parse `raw_version` and publish it with the given policy
pub fn publish<R: Repository + ?Sized>(
    repo: &R,
    policy: ReleasePolicy,
    raw_version: &str,
) -> Result<ReleaseOutcome> {
    let version = VersionToken::parse(raw_version)?;
    ReleaseWorkflow::new(repo, policy).run(version)
}
