use crate::domain::VersionToken;
use std::fmt;

/// Which release workflow a version calls for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseKind {
    /// `vN.0`: cut `release/vN` from the develop branch and tag it
    Major,
    /// `vN.M` with M > 0: tag the existing `release/vN` branch
    Minor,
}

impl ReleaseKind {
    /// Classify a version: minor component 0 means a major release
    pub fn classify(version: &VersionToken) -> Self {
        if version.minor == 0 {
            ReleaseKind::Major
        } else {
            ReleaseKind::Minor
        }
    }
}

impl fmt::Display for ReleaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseKind::Major => write!(f, "major"),
            ReleaseKind::Minor => write!(f, "minor"),
        }
    }
}

pub const DEFAULT_DEVELOP_BRANCH: &str = "develop";
pub const DEFAULT_RELEASE_BRANCH_PREFIX: &str = "release/";

/// Branch layout used to derive release branch and tag names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePolicy {
    /// Branch that major releases are cut from
    pub develop_branch: String,
    /// Prefix of the long-lived per-major release branches
    pub release_branch_prefix: String,
}

impl Default for ReleasePolicy {
    fn default() -> Self {
        ReleasePolicy {
            develop_branch: DEFAULT_DEVELOP_BRANCH.to_string(),
            release_branch_prefix: DEFAULT_RELEASE_BRANCH_PREFIX.to_string(),
        }
    }
}

impl ReleasePolicy {
    pub fn new(develop_branch: impl Into<String>, release_branch_prefix: impl Into<String>) -> Self {
        ReleasePolicy {
            develop_branch: develop_branch.into(),
            release_branch_prefix: release_branch_prefix.into(),
        }
    }

    pub fn classify(&self, version: &VersionToken) -> ReleaseKind {
        ReleaseKind::classify(version)
    }

    /// Release branch for the version's major line, e.g. `release/v5`.
    ///
    /// The minor component is ignored: every minor release of a major
    /// version lands on the same branch.
    pub fn release_branch_name(&self, version: &VersionToken) -> String {
        format!("{}v{}", self.release_branch_prefix, version.major)
    }

    /// Tag name, always the canonical `v<major>.<minor>` form
    pub fn tag_name(&self, version: &VersionToken) -> String {
        version.to_string()
    }

    /// Branch the workflow checks out first
    pub fn source_branch(&self, version: &VersionToken) -> String {
        match self.classify(version) {
            ReleaseKind::Major => self.develop_branch.clone(),
            ReleaseKind::Minor => self.release_branch_name(version),
        }
    }
}
