//! Release automation for repositories that follow a `develop` plus
//! `release/vN` branching model.
//!
//! Given a version token the crate decides between a major release (cut
//! `release/vN` from `develop` and tag `vN.0`) and a minor release (tag
//! `vN.M` on the existing `release/vN`), runs the matching git operations in
//! a fixed order, and refuses to re-publish an existing tag.
//!
//! Runs are synchronous and single-threaded. Pull and push have no timeout,
//! and nothing guards against two runs sharing a working tree.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod ui;
pub mod workflow;

pub use error::{ReleaseError, Result};
