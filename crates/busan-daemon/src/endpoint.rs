use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::daemon::DaemonError;

/// Local daemon socket used when no address is given.
pub const DEFAULT_ENDPOINT: &str = "unix:///var/run/docker.sock";

/// Resolved daemon address.
///
/// # Examples
///
/// ```
/// use busan_daemon::DaemonEndpoint;
///
/// let local: DaemonEndpoint = "unix:///run/docker.sock".parse().unwrap();
/// assert_eq!(local, DaemonEndpoint::Unix("/run/docker.sock".into()));
///
/// let remote: DaemonEndpoint = "tcp://10.0.0.5:2375".parse().unwrap();
/// assert_eq!(remote, DaemonEndpoint::Tcp("10.0.0.5:2375".to_owned()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonEndpoint {
    Unix(PathBuf),
    Tcp(String),
}

impl Default for DaemonEndpoint {
    fn default() -> Self {
        Self::Unix(PathBuf::from("/var/run/docker.sock"))
    }
}

impl FromStr for DaemonEndpoint {
    type Err = DaemonError;

    fn from_str(addr: &str) -> Result<Self, Self::Err> {
        let addr = addr.trim();
        if addr.is_empty() {
            return Ok(Self::default());
        }

        if let Some(path) = addr.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(DaemonError::UnsupportedEndpoint(addr.to_owned()));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        if let Some(host) = addr
            .strip_prefix("tcp://")
            .or_else(|| addr.strip_prefix("http://"))
        {
            if host.is_empty() {
                return Err(DaemonError::UnsupportedEndpoint(addr.to_owned()));
            }
            return Ok(Self::Tcp(host.trim_end_matches('/').to_owned()));
        }

        if addr.starts_with('/') {
            return Ok(Self::Unix(PathBuf::from(addr)));
        }

        Err(DaemonError::UnsupportedEndpoint(addr.to_owned()))
    }
}

impl fmt::Display for DaemonEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unix(path) => write!(f, "unix://{}", path.display()),
            Self::Tcp(host) => write!(f, "tcp://{host}"),
        }
    }
}
