//! Domain logic - pure release rules independent of git operations

pub mod policy;
pub mod resolver;
pub mod version;

pub use policy::{ReleaseKind, ReleasePolicy};
pub use resolver::{latest_version, resolve_latest, Suggestions};
pub use version::VersionToken;
