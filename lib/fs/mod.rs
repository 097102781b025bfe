//! The host filesystem as seen by the namespace.
//!
//! Namespace folders never touch `std::fs` directly. They go through [`Filesystem`], which lets
//! tests substitute an in-memory tree and lets embedders project something other than the local
//! disk.

/// [`Filesystem`] backed by the real host filesystem.
pub mod host;

pub use host::HostFs;

use std::io;
use std::path::Path;
use std::time::SystemTime;

use bitflags::bitflags;

bitflags! {
    /// Raw attribute bits carried by a directory entry, as the host reports them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FileAttributes: u32 {
        /// The entry may not be written.
        const READONLY  = 0x0000_0001;
        /// The entry is hidden from ordinary listings.
        const HIDDEN    = 0x0000_0002;
        /// The entry belongs to the operating system.
        const SYSTEM    = 0x0000_0004;
        /// The entry is a directory.
        const DIRECTORY = 0x0000_0010;
        /// The entry is marked for archival.
        const ARCHIVE   = 0x0000_0020;
        /// No other attribute is set.
        const NORMAL    = 0x0000_0080;
    }
}

/// One record produced by a directory scan or a stat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// The entry's final path component, case preserved.
    pub name: String,
    /// Raw attribute bits.
    pub attributes: FileAttributes,
    /// Size in bytes. Zero for directories.
    pub size: u64,
    /// Last write time.
    pub modified: SystemTime,
}

impl FileRecord {
    /// A directory record with the given name and a zero timestamp.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: FileAttributes::DIRECTORY,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    /// A regular file record with the given name and size and a zero timestamp.
    #[must_use]
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            attributes: FileAttributes::ARCHIVE,
            size,
            modified: SystemTime::UNIX_EPOCH,
        }
    }

    /// Replace the last write time.
    #[must_use]
    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = modified;
        self
    }

    /// Add raw attribute bits.
    #[must_use]
    pub fn with_attributes(mut self, attributes: FileAttributes) -> Self {
        self.attributes |= attributes;
        self
    }

    /// Whether the directory bit is set.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }

    /// Whether the hidden bit is set.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.attributes.contains(FileAttributes::HIDDEN)
    }
}

/// A single pass over a directory's entries. An `Err` item aborts the scan.
pub type DirScan<'a> = Box<dyn Iterator<Item = io::Result<FileRecord>> + 'a>;

/// The operations the namespace needs from a filesystem.
///
/// Paths are always absolute. Implementations must be safe to share between the folders of one
/// tree, but no call is ever made concurrently on behalf of a single folder.
pub trait Filesystem: Send + Sync {
    /// Begin scanning the immediate children of `dir`.
    fn scan_dir(&self, dir: &Path) -> io::Result<DirScan<'_>>;

    /// Read the metadata of `path`.
    fn stat(&self, path: &Path) -> io::Result<FileRecord>;

    /// Move `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Read a small text file in full.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}
