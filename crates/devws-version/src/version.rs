//! Concrete version values and their total order.

use crate::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z][0-9A-Za-z-]*)(?:\.(\d+))?)?$")
        .expect("version regex is valid")
});

// Parse-once cache keyed by the exact input string.
static CACHE: LazyLock<Mutex<HashMap<String, Version>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// A concrete version: `major.minor.patch[-tag[.build]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// Major component
    pub major: u64,
    /// Minor component
    pub minor: u64,
    /// Patch component
    pub patch: u64,
    /// Prerelease tag, e.g. `beta` in `1.0.1-beta.2`
    pub tag: Option<String>,
    /// Prerelease build number, e.g. `2` in `1.0.1-beta.2`
    pub build: Option<u64>,
}

impl Version {
    /// Parse a version string, reusing a previously parsed value when the
    /// exact same string was seen before.
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(hit) = CACHE.lock().expect("version cache poisoned").get(input) {
            return Ok(hit.clone());
        }

        let caps = VERSION_RE
            .captures(input)
            .ok_or_else(|| Error::InvalidVersion(input.to_string()))?;

        let number = |idx: usize| -> Result<u64> {
            caps.get(idx)
                .expect("mandatory capture group")
                .as_str()
                .parse()
                .map_err(|_| Error::InvalidVersion(input.to_string()))
        };

        let version = Version {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            tag: caps.get(4).map(|m| m.as_str().to_string()),
            build: match caps.get(5) {
                Some(m) => Some(
                    m.as_str()
                        .parse()
                        .map_err(|_| Error::InvalidVersion(input.to_string()))?,
                ),
                None => None,
            },
        };

        CACHE
            .lock()
            .expect("version cache poisoned")
            .insert(input.to_string(), version.clone());
        Ok(version)
    }

    /// True if a string parses as a version.
    pub fn is_valid(input: &str) -> bool {
        Self::parse(input).is_ok()
    }

    /// Total order over versions.
    ///
    /// `[major, minor, patch, build]` compare lexicographically with a
    /// missing build counting as zero. At numeric equality a version with no
    /// tag is greater than one with a tag (a release beats a prerelease);
    /// two tags compare lexicographically.
    pub fn compare(&self, other: &Self) -> Ordering {
        let numeric = (self.major, self.minor, self.patch, self.build.unwrap_or(0)).cmp(&(
            other.major,
            other.minor,
            other.patch,
            other.build.unwrap_or(0),
        ));
        if numeric != Ordering::Equal {
            return numeric;
        }
        match (&self.tag, &other.tag) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(a), Some(b)) => a.cmp(b),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(tag) = &self.tag {
            write!(f, "-{}", tag)?;
            if let Some(build) = self.build {
                write!(f, ".{}", build)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_version() {
        let v = Version::parse("1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
        assert_eq!(v.tag, None);
        assert_eq!(v.build, None);
    }

    #[test]
    fn parses_prerelease_with_build() {
        let v = Version::parse("1.0.1-beta.2").unwrap();
        assert_eq!(v.tag.as_deref(), Some("beta"));
        assert_eq!(v.build, Some(2));
    }

    #[test]
    fn rejects_partial_versions() {
        assert!(Version::parse("1.2").is_err());
        assert!(Version::parse("not-a-version").is_err());
        assert!(Version::parse("1.2.3.4").is_err());
    }

    #[test]
    fn release_beats_prerelease_at_equal_numbers() {
        let release = Version::parse("1.0.1").unwrap();
        let beta = Version::parse("1.0.1-beta.1").unwrap();
        assert_eq!(release.compare(&beta), Ordering::Greater);
        assert_eq!(beta.compare(&release), Ordering::Less);
    }

    #[test]
    fn build_numbers_order_prereleases() {
        let one = Version::parse("2.0.0-rc.1").unwrap();
        let two = Version::parse("2.0.0-rc.2").unwrap();
        assert_eq!(one.compare(&two), Ordering::Less);
    }

    #[test]
    fn tags_compare_lexicographically() {
        let alpha = Version::parse("1.0.0-alpha").unwrap();
        let beta = Version::parse("1.0.0-beta").unwrap();
        assert_eq!(alpha.compare(&beta), Ordering::Less);
    }

    #[test]
    fn compare_is_a_total_order() {
        let inputs = ["1.0.0", "1.0.1", "1.0.1-beta.1", "1.0.1-beta.2", "2.0.0"];
        for a in &inputs {
            for b in &inputs {
                let a = Version::parse(a).unwrap();
                let b = Version::parse(b).unwrap();
                let forward = a.compare(&b);
                let backward = b.compare(&a);
                assert_eq!(forward, backward.reverse());
                assert_eq!(forward == Ordering::Equal, a == b);
            }
        }
    }

    #[test]
    fn display_round_trips() {
        for input in ["1.2.3", "1.0.1-beta.2", "0.9.0-rc"] {
            let v = Version::parse(input).unwrap();
            assert_eq!(v.to_string(), *input);
        }
    }

    #[test]
    fn parse_cache_returns_equal_values() {
        let first = Version::parse("9.9.9-cached.1").unwrap();
        let second = Version::parse("9.9.9-cached.1").unwrap();
        assert_eq!(first, second);
    }
}
