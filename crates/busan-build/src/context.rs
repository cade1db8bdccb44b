use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Largest read issued against a source file while copying it into the archive.
pub const CHUNK_SIZE: usize = 1024;

/// How files under the context root are named inside the archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContextLayout {
    /// Store each file under its base name only.
    #[default]
    Flatten,
    /// Store each file under its path relative to the context root.
    Relative,
}

impl ContextLayout {
    fn archive_name(self, root: &Path, path: &Path) -> Option<PathBuf> {
        match self {
            Self::Flatten => path.file_name().map(PathBuf::from),
            Self::Relative => path.strip_prefix(root).ok().map(Path::to_path_buf),
        }
    }
}

/// A finished build-context archive spooled to a temporary file.
#[derive(Debug)]
pub struct PackedContext {
    file: File,
    len: u64,
    entries: Vec<String>,
}

impl PackedContext {
    /// Archive size in bytes, including tar padding and trailer.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record names in archive order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Hands over the archive file, positioned at its start.
    pub fn into_file(self) -> File {
        self.file
    }
}

/// Packs every non-directory entry under `directory` into a tar archive.
///
/// File contents are read at most [`CHUNK_SIZE`] bytes at a time and
/// copied into an anonymous temporary file, so memory use does not grow with the context.
/// Any read or write failure aborts the whole pack.
pub fn pack(directory: &Path, layout: ContextLayout) -> Result<PackedContext, PackError> {
    let sources = collect_sources(directory, layout)?;

    let spool = tempfile::tempfile().map_err(|e| PackError::Spool { source: e })?;
    let mut builder = tar::Builder::new(spool);

    for (name, path) in &sources {
        let file = File::open(path).map_err(|e| PackError::Open {
            path: path.clone(),
            source: e,
        })?;
        let meta = file.metadata().map_err(|e| PackError::Metadata {
            path: path.clone(),
            source: e,
        })?;

        let mut header = tar::Header::new_gnu();
        header.set_metadata_in_mode(&meta, tar::HeaderMode::Deterministic);
        header.set_size(meta.len());

        builder
            .append_data(&mut header, name, Chunked(file))
            .map_err(|e| PackError::Append {
                path: path.clone(),
                source: e,
            })?;
    }

    let mut spool = builder
        .into_inner()
        .map_err(|e| PackError::Finish { source: e })?;
    let len = spool
        .stream_position()
        .map_err(|e| PackError::Finish { source: e })?;
    spool.rewind().map_err(|e| PackError::Finish { source: e })?;

    let entries = sources
        .into_iter()
        .map(|(name, _)| name.to_string_lossy().into_owned())
        .collect::<Vec<_>>();
    tracing::debug!(entries = entries.len(), bytes = len, "packed build context");

    Ok(PackedContext {
        file: spool,
        len,
        entries,
    })
}

/// Caps every read from the inner reader at [`CHUNK_SIZE`] bytes.
struct Chunked<R>(R);

impl<R: Read> Read for Chunked<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let len = buf.len().min(CHUNK_SIZE);
        self.0.read(&mut buf[..len])
    }
}

/// Walks `directory` and resolves the archive name of each file.
///
/// When two files map to the same archive name, the record keeps its first
/// position but takes the later file's content.
fn collect_sources(
    directory: &Path,
    layout: ContextLayout,
) -> Result<Vec<(PathBuf, PathBuf)>, PackError> {
    let mut sources: Vec<(PathBuf, PathBuf)> = Vec::new();
    let mut positions: HashMap<PathBuf, usize> = HashMap::new();

    for entry in WalkDir::new(directory).sort_by_file_name() {
        let entry = entry.map_err(|e| PackError::Walk { source: e })?;
        let path = entry.path();

        let is_dir = if entry.path_is_symlink() {
            path.is_dir()
        } else {
            entry.file_type().is_dir()
        };
        if is_dir {
            continue;
        }

        let Some(name) = layout.archive_name(directory, path) else {
            continue;
        };

        match positions.get(&name) {
            Some(&index) => {
                tracing::warn!(
                    name = %name.display(),
                    replaced = %sources[index].1.display(),
                    by = %path.display(),
                    "build context entry name collision"
                );
                sources[index].1 = path.to_path_buf();
            }
            None => {
                positions.insert(name.clone(), sources.len());
                sources.push((name, path.to_path_buf()));
            }
        }
    }

    Ok(sources)
}

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("failed to walk build context")]
    Walk { source: walkdir::Error },
    #[error("unable to read in {path}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to stat {path}")]
    Metadata {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unable to write {path} into build context")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to finish build context archive")]
    Finish { source: std::io::Error },
    #[error("failed to create build context spool file")]
    Spool { source: std::io::Error },
}
