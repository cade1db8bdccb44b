use std::fmt;
use std::path::Path;

use crate::version;

/// The configured service identity.
///
/// One name plays three roles on the daemon: the repository part of every
/// image tag (`<name>:v<version>`), the exact name of the single managed
/// container, and the substring that marks a container's image as "ours".
///
/// # Examples
///
/// ```
/// use busan_core::ServiceName;
///
/// let svc = ServiceName::new("web").unwrap();
/// assert_eq!(svc.image_tag("1.2.3"), "web:v1.2.3");
/// assert_eq!(svc.tag_version("web:v1.2.3"), Some("1.2.3"));
/// assert_eq!(svc.tag_version("webapp:v1.2.3"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(crate::Error::InvalidServiceName {
                name,
                reason: "must not be empty",
            });
        }
        if name.contains(':') {
            return Err(crate::Error::InvalidServiceName {
                name,
                reason: "must not contain ':'",
            });
        }
        if name.chars().any(char::is_whitespace) {
            return Err(crate::Error::InvalidServiceName {
                name,
                reason: "must not contain whitespace",
            });
        }
        Ok(Self(name))
    }

    /// Derives the default service name from the base name of the
    /// descriptor directory.
    pub fn from_directory(directory: &Path) -> crate::Result<Self> {
        let base = match directory.file_name() {
            Some(name) => name.to_os_string(),
            None => directory
                .canonicalize()
                .map_err(|e| crate::Error::Stat {
                    path: directory.to_path_buf(),
                    source: e,
                })?
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default(),
        };

        Self::new(base.to_string_lossy().into_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The tag an image for `version` is built under.
    pub fn image_tag(&self, version: &str) -> String {
        format!("{}:v{version}", self.0)
    }

    /// Returns the version carried by `tag` if the tag's repository part
    /// (everything before the last `:`) is exactly this service name.
    pub fn tag_version<'t>(&self, tag: &'t str) -> Option<&'t str> {
        let (repo, suffix) = tag.rsplit_once(':')?;
        if repo != self.0 {
            return None;
        }
        version::tag_version(suffix)
    }

    /// Loose ownership test used for containers: the container's image
    /// reference merely contains the service name.
    pub fn matches_image(&self, image: &str) -> bool {
        image.contains(self.0.as_str())
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
