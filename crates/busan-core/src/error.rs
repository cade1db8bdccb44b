use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // ── Structure ──
    #[error("path {path} does not exist")]
    DirectoryNotFound { path: PathBuf },

    #[error("{path} is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("Dockerfile {path} does not exist")]
    DescriptorNotFound { path: PathBuf },

    #[error("{path} is a directory")]
    DescriptorIsDirectory { path: PathBuf },

    #[error("failed to inspect {path}")]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Version marker ──
    #[error("failed to read {path}")]
    DescriptorRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unable to find a VERSION comment in {path}")]
    VersionNotFound { path: PathBuf },

    // ── Runtime config ──
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid service name {name:?}: {reason}")]
    InvalidServiceName { name: String, reason: &'static str },
}
