//! A [`Filesystem`] that directly overlays the host filesystem.
use std::ffi::OsStr;
use std::fs::{self, Metadata};
use std::io;
use std::path::Path;

use tracing::warn;

use super::{DirScan, FileAttributes, FileRecord, Filesystem};

/// Reads and renames through `std::fs`.
///
/// Symlinks are followed. A dangling link is reported with its own metadata rather than failing
/// the whole scan.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostFs;

impl HostFs {
    /// Create a handle to the host filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `None` for names that are not valid UTF-8; identifiers only carry UTF-8.
    fn record_name(name: &OsStr) -> Option<String> {
        name.to_str().map(str::to_owned)
    }

    fn record_from_metadata(name: String, meta: &Metadata) -> FileRecord {
        let attributes = attributes_of(&name, meta);
        FileRecord {
            size: if meta.is_dir() { 0 } else { meta.len() },
            modified: meta.modified().unwrap_or(std::time::SystemTime::UNIX_EPOCH),
            attributes,
            name,
        }
    }
}

#[cfg(windows)]
fn attributes_of(_name: &str, meta: &Metadata) -> FileAttributes {
    use std::os::windows::fs::MetadataExt as _;
    FileAttributes::from_bits_truncate(meta.file_attributes())
}

#[cfg(not(windows))]
fn attributes_of(name: &str, meta: &Metadata) -> FileAttributes {
    let mut attributes = if meta.is_dir() {
        FileAttributes::DIRECTORY
    } else {
        FileAttributes::ARCHIVE
    };
    if name.starts_with('.') {
        attributes |= FileAttributes::HIDDEN;
    }
    if meta.permissions().readonly() {
        attributes |= FileAttributes::READONLY;
    }
    attributes
}

impl Filesystem for HostFs {
    fn scan_dir(&self, dir: &Path) -> io::Result<DirScan<'_>> {
        let read_dir = fs::read_dir(dir)?;
        Ok(Box::new(read_dir.filter_map(|entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e)),
            };
            let Some(name) = Self::record_name(&entry.file_name()) else {
                warn!(path = ?entry.path(), "skipping entry that has no UTF-8 name");
                return None;
            };
            let meta = match fs::metadata(entry.path()) {
                Ok(meta) => meta,
                // Dangling symlink: describe the link itself.
                Err(e) if e.kind() == io::ErrorKind::NotFound => match entry.metadata() {
                    Ok(meta) => meta,
                    Err(e) => return Some(Err(e)),
                },
                Err(e) => return Some(Err(e)),
            };
            Some(Ok(Self::record_from_metadata(name, &meta)))
        })))
    }

    fn stat(&self, path: &Path) -> io::Result<FileRecord> {
        let meta = fs::metadata(path)?;
        let name = match path.file_name() {
            Some(name) => Self::record_name(name),
            None => path.to_str().map(str::to_owned),
        }
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} has no UTF-8 name", path.display()),
            )
        })?;
        Ok(Self::record_from_metadata(name, &meta))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}
