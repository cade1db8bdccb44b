//! Version patterns shared by the build descriptor and daemon image tags.
//!
//! Both sides of the version gate reduce to the same token shape: one or
//! more ASCII digits and dots.

use std::sync::LazyLock;

use regex::Regex;

/// `# VERSION 1.2.3` at line start; the `#` is optional.
static DESCRIPTOR_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#?\s*VERSION\s+([0-9.]+)").unwrap());

/// `v1.2.3` anywhere in a tag suffix.
static TAG_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"v([0-9.]+)").unwrap());

/// Extracts the version token from a single descriptor line.
///
/// # Examples
///
/// ```
/// use busan_core::version::descriptor_version;
///
/// assert_eq!(descriptor_version("# VERSION 1.2.3"), Some("1.2.3"));
/// assert_eq!(descriptor_version("#VERSION 0.9"), Some("0.9"));
/// assert_eq!(descriptor_version("FROM alpine # VERSION 1.0"), None);
/// ```
pub fn descriptor_version(line: &str) -> Option<&str> {
    DESCRIPTOR_MARKER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Extracts the version token from the suffix of an image tag (the part
/// after the last `:`).
///
/// # Examples
///
/// ```
/// use busan_core::version::tag_version;
///
/// assert_eq!(tag_version("v1.2.3"), Some("1.2.3"));
/// assert_eq!(tag_version("release-v2.0"), Some("2.0"));
/// assert_eq!(tag_version("latest"), None);
/// ```
pub fn tag_version(suffix: &str) -> Option<&str> {
    TAG_VERSION_RE
        .captures(suffix)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}
