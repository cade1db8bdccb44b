use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::version;

/// File name of the build descriptor inside the service directory.
pub const DESCRIPTOR_FILE_NAME: &str = "Dockerfile";

/// A located build descriptor and the directory used as build context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDescriptor {
    path: PathBuf,
    context_dir: PathBuf,
}

impl BuildDescriptor {
    /// Validates the service directory layout and locates the descriptor.
    ///
    /// The directory must exist and be a directory; it must contain a
    /// `Dockerfile` that is not itself a directory.
    pub fn locate(directory: &Path) -> crate::Result<Self> {
        let meta = stat(directory, || crate::Error::DirectoryNotFound {
            path: directory.to_path_buf(),
        })?;
        if !meta.is_dir() {
            return Err(crate::Error::NotADirectory {
                path: directory.to_path_buf(),
            });
        }

        let path = directory.join(DESCRIPTOR_FILE_NAME);
        let meta = stat(&path, || crate::Error::DescriptorNotFound { path: path.clone() })?;
        if meta.is_dir() {
            return Err(crate::Error::DescriptorIsDirectory { path });
        }

        Ok(Self {
            path,
            context_dir: directory.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Root of the build context (the descriptor's directory).
    pub fn context_dir(&self) -> &Path {
        &self.context_dir
    }

    /// Reads the version declared by the descriptor's `VERSION` marker.
    pub fn version(&self) -> crate::Result<String> {
        read_version(&self.path)
    }
}

/// Scans `path` line by line and returns the first `VERSION` marker token.
pub fn read_version(path: &Path) -> crate::Result<String> {
    let file = std::fs::File::open(path).map_err(|e| crate::Error::DescriptorRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    // Lines are split on raw bytes; a Dockerfile may carry non-UTF-8 text
    // (e.g. Latin-1 labels) ahead of the marker.
    for line in BufReader::new(file).split(b'\n') {
        let line = line.map_err(|e| crate::Error::DescriptorRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let line = String::from_utf8_lossy(&line);
        if let Some(found) = version::descriptor_version(&line) {
            tracing::debug!(path = %path.display(), version = found, "found VERSION marker");
            return Ok(found.to_owned());
        }
    }

    Err(crate::Error::VersionNotFound {
        path: path.to_path_buf(),
    })
}

fn stat(
    path: &Path,
    not_found: impl FnOnce() -> crate::Error,
) -> crate::Result<std::fs::Metadata> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(meta),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(not_found()),
        Err(e) => Err(crate::Error::Stat {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
