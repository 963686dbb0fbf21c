use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Release version identifier: a major and a minor component.
///
/// Ordering compares `major` first, then `minor`, both numerically.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionToken {
    pub major: u64,
    pub minor: u64,
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^v?(?P<major>[0-9]+)(?:\.(?P<minor>[0-9]+))?$").expect("version pattern is valid")
    })
}

impl VersionToken {
    /// Create a new version
    pub fn new(major: u64, minor: u64) -> Self {
        VersionToken { major, minor }
    }

    /// Parse a version token such as `2`, `v2`, `2.1` or `v2.1`.
    ///
    /// A missing minor component defaults to 0. The rendered form is always
    /// `v<major>.<minor>`, so `"2"` and `"v2.0"` produce the same token.
    pub fn parse(raw: &str) -> Result<Self> {
        let captures = token_pattern().captures(raw).ok_or_else(|| {
            ReleaseError::parse(format!(
                "Invalid version '{}' - expected 2, v2, 2.0, v2.0, 2.1 or v2.1",
                raw
            ))
        })?;

        let major = captures["major"].parse::<u64>().map_err(|e| {
            ReleaseError::parse(format!("Invalid major version '{}': {}", &captures["major"], e))
        })?;

        let minor = match captures.name("minor") {
            Some(m) => m.as_str().parse::<u64>().map_err(|e| {
                ReleaseError::parse(format!("Invalid minor version '{}': {}", m.as_str(), e))
            })?,
            None => 0,
        };

        Ok(VersionToken { major, minor })
    }

    /// First version of the following major line
    pub fn next_major(&self) -> Self {
        VersionToken {
            major: self.major.saturating_add(1),
            minor: 0,
        }
    }

    /// Next minor version on the same major line
    pub fn next_minor(&self) -> Self {
        VersionToken {
            major: self.major,
            minor: self.minor.saturating_add(1),
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}", self.major, self.minor)
    }
}

impl FromStr for VersionToken {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        VersionToken::parse(s)
    }
}
