// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

use std::cmp::Ordering;
use std::fmt;

use crate::version::value::Version;

/// Increasing order of specificity, per spec: Prerelease < Revision < Patch
/// < Minor < Major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FloatingBehavior {
    Prerelease,
    Revision,
    Patch,
    Minor,
    Major,
}

/// A (possibly open-ended, possibly floating) version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    pub min: Option<Version>,
    pub min_inclusive: bool,
    pub max: Option<Version>,
    pub max_inclusive: bool,
    pub floating: Option<FloatingBehavior>,
}

impl VersionRange {
    pub fn exact(version: Version) -> VersionRange {
        VersionRange {
            min: Some(version.clone()),
            min_inclusive: true,
            max: Some(version),
            max_inclusive: true,
            floating: None,
        }
    }

    pub fn at_least(version: Version) -> VersionRange {
        VersionRange {
            min: Some(version),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            floating: None,
        }
    }

    pub fn between(
        min: Version,
        min_inclusive: bool,
        max: Version,
        max_inclusive: bool,
    ) -> VersionRange {
        VersionRange {
            min: Some(min),
            min_inclusive,
            max: Some(max),
            max_inclusive,
            floating: None,
        }
    }

    pub fn floating(min: Version, behavior: FloatingBehavior) -> VersionRange {
        VersionRange {
            min: Some(min),
            min_inclusive: true,
            max: None,
            max_inclusive: false,
            floating: Some(behavior),
        }
    }

    pub fn any() -> VersionRange {
        VersionRange {
            min: None,
            min_inclusive: false,
            max: None,
            max_inclusive: false,
            floating: None,
        }
    }

    /// Total: true iff `version` falls within the bounds, honoring
    /// inclusivity and the prerelease "must be explicitly mentioned" rule.
    pub fn satisfies(&self, version: &Version) -> bool {
        if let Some(min) = &self.min {
            let ok = if self.min_inclusive {
                version >= min
            } else {
                version > min
            };
            if !ok {
                return false;
            }
        }

        if let Some(max) = &self.max {
            let ok = if self.max_inclusive {
                version <= max
            } else {
                version < max
            };
            if !ok {
                return false;
            }
        }

        if version.is_prerelease() && !self.allows_prerelease_of(version) {
            return false;
        }

        true
    }

    /// A prerelease version only satisfies the range if some bound pins the
    /// same release quadruple with an explicit prerelease label (or the
    /// range floats across prereleases of that quadruple).
    fn allows_prerelease_of(&self, version: &Version) -> bool {
        if let Some(FloatingBehavior::Prerelease) = self.floating {
            if let Some(min) = &self.min {
                if min.same_release(version) {
                    return true;
                }
            }
        }

        for bound in [&self.min, &self.max].into_iter().flatten() {
            if bound.is_prerelease() && bound.same_release(version) {
                return true;
            }
        }

        false
    }

    /// Range-vs-range ordering used to rank two same-name requirements
    /// before either has a resolved candidate attached. See spec §4.1 and
    /// SPEC_FULL.md's note on where this is actually invoked.
    pub fn is_greater_or_equal(near: &VersionRange, far: &VersionRange) -> bool {
        let (Some(near_min), Some(far_min)) = (&near.min, &far.min) else {
            return match (&near.min, &far.min) {
                (None, _) => true,
                (Some(_), None) => false,
                _ => unreachable!(),
            };
        };

        match (near.floating, far.floating) {
            (None, None) => near_min >= far_min,
            _ => {
                let near_floor = floor(near_min, near.floating);
                let far_floor = floor(far_min, far.floating);
                match near_floor.cmp(&far_floor) {
                    Ordering::Equal => {
                        let near_prefix = prerelease_prefix(near_min, near.floating);
                        let far_prefix = prerelease_prefix(far_min, far.floating);
                        prefix_ge(near_prefix, far_prefix)
                    }
                    ord => ord == Ordering::Greater,
                }
            }
        }
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let lo = match (&self.min, self.min_inclusive) {
            (Some(v), true) => format!("[{}, ", v),
            (Some(v), false) => format!("({}, ", v),
            (None, _) => "(, ".to_string(),
        };
        let hi = match (&self.max, self.max_inclusive) {
            (Some(v), true) => format!("{}]", v),
            (Some(v), false) => format!("{})", v),
            (None, _) => ")".to_string(),
        };
        write!(f, "{}{}", lo, hi)
    }
}

/// Canonical floor quadruple for a floating bound: the floating component
/// and everything less significant than it is substituted with an
/// effectively-infinite sentinel, so the floor sorts as "the highest
/// version this floating range could possibly pick."
fn floor(min: &Version, floating: Option<FloatingBehavior>) -> (u64, u64, u64, u64) {
    const INF: u64 = u64::MAX;
    match floating {
        None | Some(FloatingBehavior::Prerelease) => min.quadruple(),
        Some(FloatingBehavior::Revision) => (min.major, min.minor, min.patch, INF),
        Some(FloatingBehavior::Patch) => (min.major, min.minor, INF, INF),
        Some(FloatingBehavior::Minor) => (min.major, INF, INF, INF),
        Some(FloatingBehavior::Major) => (INF, INF, INF, INF),
    }
}

fn prerelease_prefix(min: &Version, floating: Option<FloatingBehavior>) -> &str {
    match floating {
        Some(FloatingBehavior::Prerelease) => min.prerelease.as_deref().unwrap_or(""),
        _ => "",
    }
}

fn prefix_ge(near: &str, far: &str) -> bool {
    if near.is_empty() {
        return true;
    }
    if far.is_empty() {
        return false;
    }
    near.to_lowercase() >= far.to_lowercase()
}
