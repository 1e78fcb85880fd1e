//! Version range rules.

use crate::{Error, Result, Version};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][0-9A-Za-z-]*$").expect("tag regex is valid")
});

static CACHE: LazyLock<Mutex<HashMap<String, VersionRule>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

/// Comparison prefix of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `^` — compatible-with, anchored at the major component
    Caret,
    /// `~` — compatible-with, anchored at the minor component
    Tilde,
    /// `>` — strictly greater
    Gt,
    /// `>=` — greater or equal
    Gte,
    /// `<` — strictly less
    Lt,
    /// `<=` — less or equal
    Lte,
}

/// A parsed range expression tested against concrete versions.
///
/// Unspecified numeric segments (`x`, `*` or omission) are wildcards. A rule
/// with no numeric component at all is tag-only and matches any version
/// carrying exactly that tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRule {
    /// Optional comparison prefix
    pub prefix: Option<Prefix>,
    /// Major component, `None` when wildcarded
    pub major: Option<u64>,
    /// Minor component, `None` when wildcarded
    pub minor: Option<u64>,
    /// Patch component, `None` when wildcarded
    pub patch: Option<u64>,
    /// Prerelease tag
    pub tag: Option<String>,
    /// Prerelease build number
    pub build: Option<u64>,
}

impl VersionRule {
    /// Parse a rule string, reusing a previously parsed value when the exact
    /// same string was seen before.
    pub fn parse(input: &str) -> Result<Self> {
        if let Some(hit) = CACHE.lock().expect("rule cache poisoned").get(input) {
            return Ok(hit.clone());
        }

        let rule = Self::parse_uncached(input)?;

        CACHE
            .lock()
            .expect("rule cache poisoned")
            .insert(input.to_string(), rule.clone());
        Ok(rule)
    }

    fn parse_uncached(input: &str) -> Result<Self> {
        let (prefix, rest) = if let Some(rest) = input.strip_prefix(">=") {
            (Some(Prefix::Gte), rest)
        } else if let Some(rest) = input.strip_prefix("<=") {
            (Some(Prefix::Lte), rest)
        } else if let Some(rest) = input.strip_prefix('>') {
            (Some(Prefix::Gt), rest)
        } else if let Some(rest) = input.strip_prefix('<') {
            (Some(Prefix::Lt), rest)
        } else if let Some(rest) = input.strip_prefix('^') {
            (Some(Prefix::Caret), rest)
        } else if let Some(rest) = input.strip_prefix('~') {
            (Some(Prefix::Tilde), rest)
        } else {
            (None, input)
        };

        if rest.is_empty() {
            return Err(Error::InvalidRule(input.to_string()));
        }

        // Bare identifier with no numeric component: a tag-only rule.
        if prefix.is_none() && TAG_RE.is_match(rest) {
            return Ok(VersionRule {
                prefix: None,
                major: None,
                minor: None,
                patch: None,
                tag: Some(rest.to_string()),
                build: None,
            });
        }

        let (numbers, tag_part) = match rest.split_once('-') {
            Some((numbers, tag_part)) => (numbers, Some(tag_part)),
            None => (rest, None),
        };

        let segments: Vec<&str> = numbers.split('.').collect();
        if segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidRule(input.to_string()));
        }

        let parse_segment = |segment: Option<&&str>| -> Result<Option<u64>> {
            match segment {
                None => Ok(None),
                Some(&"x") | Some(&"X") | Some(&"*") => Ok(None),
                Some(s) => s
                    .parse()
                    .map(Some)
                    .map_err(|_| Error::InvalidRule(input.to_string())),
            }
        };

        let (tag, build) = match tag_part {
            None => (None, None),
            Some(tag_part) => {
                let (tag, build) = match tag_part.split_once('.') {
                    Some((tag, build)) => {
                        let build = build
                            .parse()
                            .map_err(|_| Error::InvalidRule(input.to_string()))?;
                        (tag, Some(build))
                    }
                    None => (tag_part, None),
                };
                if !TAG_RE.is_match(tag) {
                    return Err(Error::InvalidRule(input.to_string()));
                }
                (Some(tag.to_string()), build)
            }
        };

        Ok(VersionRule {
            prefix,
            major: parse_segment(segments.first())?,
            minor: parse_segment(segments.get(1))?,
            patch: parse_segment(segments.get(2))?,
            tag,
            build,
        })
    }

    /// True if this rule carries no numeric component at all.
    pub fn is_tag_only(&self) -> bool {
        self.major.is_none() && self.minor.is_none() && self.patch.is_none() && self.tag.is_some()
    }

    /// The anchor version the rule compares against, with wildcarded
    /// segments counting as zero.
    fn anchor(&self) -> Version {
        Version {
            major: self.major.unwrap_or(0),
            minor: self.minor.unwrap_or(0),
            patch: self.patch.unwrap_or(0),
            tag: self.tag.clone(),
            build: self.build,
        }
    }

    /// Test a version against this rule.
    ///
    /// With `with_tag` the rule's tag is an exact-match gate: a rule without
    /// a tag, or whose tag differs from the version's, fails immediately.
    /// Without it the tag plays no part in range matching; preset resolution
    /// deliberately calls both modes (release-preferring versus exact
    /// prerelease match).
    pub fn matches(&self, version: &Version, with_tag: bool) -> bool {
        if with_tag {
            match &self.tag {
                None => return false,
                Some(tag) => {
                    if version.tag.as_deref() != Some(tag.as_str()) {
                        return false;
                    }
                }
            }
        }

        if self.is_tag_only() {
            return version.tag == self.tag;
        }

        let cmp = version.compare(&self.anchor());
        match self.prefix {
            None => {
                self.major.is_none_or(|m| m == version.major)
                    && self.minor.is_none_or(|m| m == version.minor)
                    && self.patch.is_none_or(|p| p == version.patch)
            }
            Some(Prefix::Caret) => {
                self.major.is_none_or(|m| m == version.major) && cmp != Ordering::Less
            }
            Some(Prefix::Tilde) => {
                self.major.is_none_or(|m| m == version.major)
                    && self.minor == Some(version.minor)
                    && cmp != Ordering::Less
            }
            Some(Prefix::Gt) => cmp == Ordering::Greater,
            Some(Prefix::Gte) => cmp != Ordering::Less,
            Some(Prefix::Lt) => cmp == Ordering::Less,
            Some(Prefix::Lte) => cmp != Ordering::Greater,
        }
    }
}

impl std::fmt::Display for VersionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.prefix {
            Some(Prefix::Caret) => "^",
            Some(Prefix::Tilde) => "~",
            Some(Prefix::Gt) => ">",
            Some(Prefix::Gte) => ">=",
            Some(Prefix::Lt) => "<",
            Some(Prefix::Lte) => "<=",
            None => "",
        };
        if self.is_tag_only() {
            return write!(f, "{}", self.tag.as_deref().unwrap_or_default());
        }
        let segment = |v: Option<u64>| v.map_or_else(|| "x".to_string(), |v| v.to_string());
        write!(
            f,
            "{}{}.{}.{}",
            prefix,
            segment(self.major),
            segment(self.minor),
            segment(self.patch)
        )?;
        if let Some(tag) = &self.tag {
            write!(f, "-{}", tag)?;
            if let Some(build) = self.build {
                write!(f, ".{}", build)?;
            }
        }
        Ok(())
    }
}
