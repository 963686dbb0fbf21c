use thiserror::Error;

use crate::domain::ReleaseKind;
use crate::workflow::WorkflowStep;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Checkout of branch '{branch}' failed: {reason}")]
    Checkout { branch: String, reason: String },

    #[error("Pull failed: {0}")]
    Pull(String),

    #[error("Reference error: {0}")]
    Ref(String),

    #[error("Tag '{0}' already exists")]
    DuplicateTag(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Repository query failed: {0}")]
    Query(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A repository operation failed while the workflow was executing `step`
    #[error("{kind} release failed at step '{step}'")]
    Step {
        kind: ReleaseKind,
        step: WorkflowStep,
        #[source]
        source: Box<ReleaseError>,
    },
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create a version parsing error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ReleaseError::Parse(msg.into())
    }

    /// Create a checkout error for the given branch
    pub fn checkout(branch: impl Into<String>, reason: impl Into<String>) -> Self {
        ReleaseError::Checkout {
            branch: branch.into(),
            reason: reason.into(),
        }
    }

    /// Create a pull error with context
    pub fn pull(msg: impl Into<String>) -> Self {
        ReleaseError::Pull(msg.into())
    }

    /// Create a branch/tag creation error with context
    pub fn reference(msg: impl Into<String>) -> Self {
        ReleaseError::Ref(msg.into())
    }

    /// Create a push error with context
    pub fn push(msg: impl Into<String>) -> Self {
        ReleaseError::Push(msg.into())
    }

    /// Create a query error with context
    pub fn query(msg: impl Into<String>) -> Self {
        ReleaseError::Query(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create an authentication error with context
    pub fn auth(msg: impl Into<String>) -> Self {
        ReleaseError::Auth(msg.into())
    }

    /// Wrap this error with the workflow step that produced it
    pub fn at_step(self, kind: ReleaseKind, step: WorkflowStep) -> Self {
        ReleaseError::Step {
            kind,
            step,
            source: Box::new(self),
        }
    }

    /// The underlying error, with any step wrappers removed
    pub fn root(&self) -> &ReleaseError {
        match self {
            ReleaseError::Step { source, .. } => source.root(),
            other => other,
        }
    }

    /// The step that failed, if this error came out of a workflow run
    pub fn failed_step(&self) -> Option<&WorkflowStep> {
        match self {
            ReleaseError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Whether the workflow refused to re-publish an existing tag
    pub fn is_duplicate_tag(&self) -> bool {
        matches!(self.root(), ReleaseError::DuplicateTag(_))
    }
}
