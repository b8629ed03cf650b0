// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cmp::Ordering;
use std::fmt;

/// A four-component version (major.minor.patch.revision) with an optional
/// prerelease label.
///
/// `revision` exists because the graphs this resolver walks come from an
/// ecosystem where four-part versions are common; `semver::Version` only
/// has three, which is why this is a standalone type rather than a
/// wrapper around it.
#[derive(Debug, Clone, Eq)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub revision: u64,
    pub prerelease: Option<String>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64, revision: u64) -> Version {
        Version {
            major,
            minor,
            patch,
            revision,
            prerelease: None,
        }
    }

    pub fn with_prerelease<S: Into<String>>(mut self, pre: S) -> Version {
        self.prerelease = Some(pre.into());
        self
    }

    /// The (major, minor, patch, revision) quadruple, ignoring prerelease.
    pub(crate) fn quadruple(&self) -> (u64, u64, u64, u64) {
        (self.major, self.minor, self.patch, self.revision)
    }

    /// True if `self` and `other` share the same release quadruple.
    pub(crate) fn same_release(&self, other: &Version) -> bool {
        self.quadruple() == other.quadruple()
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.revision == 0 {
            write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        } else {
            write!(
                f,
                "{}.{}.{}.{}",
                self.major, self.minor, self.patch, self.revision
            )?;
        }
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.quadruple() == other.quadruple()
            && match (&self.prerelease, &other.prerelease) {
                (None, None) => true,
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                _ => false,
            }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.quadruple().cmp(&other.quadruple()) {
            Ordering::Equal => cmp_prerelease(&self.prerelease, &other.prerelease),
            ord => ord,
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Absent prerelease outranks any prerelease; two prereleases compare
/// case-insensitively.
fn cmp_prerelease(a: &Option<String>, b: &Option<String>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
