//! # devws-version
//!
//! Semantic-version parsing, total ordering and range matching.
//!
//! Versions take the shape `major.minor.patch[-tag[.build]]`. Rules add an
//! optional comparison prefix (`^`, `~`, `<`, `<=`, `>`, `>=`), wildcard
//! segments (`x`, `*` or omission) and bare-tag forms (`beta`). Parsed values
//! are cached by their exact source string because they are compared in tight
//! loops while ranking remote release tags.
//!
//! ## Example
//!
//! ```rust
//! use devws_version::{Version, VersionRule};
//!
//! # fn example() -> Result<(), devws_version::Error> {
//! let rule = VersionRule::parse("^1.10.0")?;
//! let version = Version::parse("1.18.1")?;
//! assert!(rule.matches(&version, false));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]

mod rule;
mod version;

pub use rule::{Prefix, VersionRule};
pub use version::Version;

/// Error type for version parsing
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// String does not parse as a version
    #[error("Invalid version: {0}")]
    InvalidVersion(String),

    /// String does not parse as a version rule
    #[error("Invalid version rule: {0}")]
    InvalidRule(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
