//! Signing region.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// The region a request is signed for.
///
/// # Example
///
/// ```
/// use relay_core::Region;
///
/// let region = Region::new("eu-west-1");
/// assert_eq!(region.as_str(), "eu-west-1");
/// assert_eq!(Region::US_EAST_1.to_string(), "us-east-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(Cow<'static, str>);

impl Region {
    /// US East (N. Virginia).
    pub const US_EAST_1: Self = Self::from_static("us-east-1");
    /// US West (Oregon).
    pub const US_WEST_2: Self = Self::from_static("us-west-2");
    /// EU (Ireland).
    pub const EU_WEST_1: Self = Self::from_static("eu-west-1");

    /// Creates a region from any string.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Creates a region from a static string.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Returns the region name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Region {
    fn from(name: &'static str) -> Self {
        Self::from_static(name)
    }
}

impl From<String> for Region {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
