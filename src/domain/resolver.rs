use crate::domain::VersionToken;
use crate::error::Result;
use crate::git::Repository;
use log::debug;

/// Finds the highest version among a set of tag names.
///
/// Every name is run through [`VersionToken::parse`]; names that do not parse
/// are skipped. Returns the zero token when nothing parses.
pub fn resolve_latest<S: AsRef<str>>(tag_names: &[S]) -> VersionToken {
    tag_names
        .iter()
        .filter_map(|name| {
            let name = name.as_ref();
            match VersionToken::parse(name) {
                Ok(version) => Some(version),
                Err(_) => {
                    debug!("skipping tag '{}': not a release version", name);
                    None
                }
            }
        })
        .max()
        .unwrap_or_default()
}

/// Latest released version according to the repository's tags
pub fn latest_version<R: Repository + ?Sized>(repo: &R) -> Result<VersionToken> {
    let tag_names = repo.list_tag_names()?;
    let latest = resolve_latest(&tag_names);
    debug!("resolved latest version {} from {} tags", latest, tag_names.len());
    Ok(latest)
}

/// Candidate versions offered when the operator gives none
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestions {
    pub latest: VersionToken,
    pub next_major: VersionToken,
    pub next_minor: VersionToken,
}

impl Suggestions {
    pub fn from_latest(latest: VersionToken) -> Self {
        Suggestions {
            latest,
            next_major: latest.next_major(),
            next_minor: latest.next_minor(),
        }
    }
}
