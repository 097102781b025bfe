//! A single self-delimiting identifier.
use std::fmt;
use std::path::Path;

use crate::error::NamespaceError;
use crate::fs::{FileAttributes, FileRecord, Filesystem};
use crate::names;

use super::dos_time::DosDateTime;

const HEADER_LEN: usize = 3;
/// reserved(1) + size(8) + date(2) + time(2) + attributes(4)
const FS_FIXED_LEN: usize = 17;

const TAG_DRIVE: u8 = 0x2F;
const TAG_FOLDER: u8 = 0x31;
const TAG_FILE: u8 = 0x32;

/// The type tag of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A filesystem directory.
    Folder,
    /// A filesystem non-directory.
    File,
    /// The root of a filesystem volume.
    Drive,
    /// An identifier minted by some other provider. Carried, never interpreted.
    Foreign(u8),
}

impl ItemKind {
    fn from_tag(tag: u8) -> Self {
        match tag {
            TAG_FOLDER => Self::Folder,
            TAG_FILE => Self::File,
            TAG_DRIVE => Self::Drive,
            other => Self::Foreign(other),
        }
    }
}

/// Decoded metadata of a folder or file identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FsEntry<'a> {
    /// Folder or file, as tagged.
    pub is_folder: bool,
    /// Stored name, case preserved.
    pub name: &'a str,
    /// Size in bytes at the time the identifier was minted.
    pub size: u64,
    /// Last write time at the time the identifier was minted.
    pub modified: DosDateTime,
    /// Raw attribute bits at the time the identifier was minted.
    pub attributes: FileAttributes,
}

/// A borrowed, decoded view of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemData<'a> {
    /// A folder or file.
    Filesystem(FsEntry<'a>),
    /// A volume root such as `/` or `C:\`.
    Drive {
        /// The root path text.
        root: &'a str,
    },
    /// Opaque bytes following the tag.
    Foreign(&'a [u8]),
}

/// One path segment plus cached metadata, in its binary form.
///
/// The bytes are validated at construction, so every accessor is infallible.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ItemId {
    bytes: Box<[u8]>,
}

fn read_u16(b: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes(b.get(at..at + 2)?.try_into().ok()?))
}

fn read_u32(b: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes(b.get(at..at + 4)?.try_into().ok()?))
}

fn read_u64(b: &[u8], at: usize) -> Option<u64> {
    Some(u64::from_le_bytes(b.get(at..at + 8)?.try_into().ok()?))
}

/// Decode a NUL-terminated UTF-8 string that must end exactly at the end of `b`.
fn read_cstr(b: &[u8]) -> Option<&str> {
    let (last, text) = b.split_last()?;
    if *last != 0 || text.contains(&0) {
        return None;
    }
    std::str::from_utf8(text).ok()
}

fn decode(bytes: &[u8]) -> Option<ItemData<'_>> {
    let tag = *bytes.get(2)?;
    let payload = bytes.get(HEADER_LEN..)?;
    match ItemKind::from_tag(tag) {
        ItemKind::Folder | ItemKind::File => {
            let name = read_cstr(bytes.get(HEADER_LEN + FS_FIXED_LEN..)?)?;
            if name.is_empty() {
                return None;
            }
            Some(ItemData::Filesystem(FsEntry {
                is_folder: tag == TAG_FOLDER,
                name,
                size: read_u64(bytes, 4)?,
                modified: DosDateTime {
                    date: read_u16(bytes, 12)?,
                    time: read_u16(bytes, 14)?,
                },
                attributes: FileAttributes::from_bits_retain(read_u32(bytes, 16)?),
            }))
        }
        ItemKind::Drive => Some(ItemData::Drive {
            root: read_cstr(payload).filter(|r| !r.is_empty())?,
        }),
        ItemKind::Foreign(_) => Some(ItemData::Foreign(payload)),
    }
}

fn frame(tag: u8, payload: &[u8]) -> Result<ItemId, NamespaceError> {
    let cb = u16::try_from(HEADER_LEN + payload.len())
        .map_err(|_| NamespaceError::invalid("identifier exceeds 64 KiB"))?;
    let mut bytes = Vec::with_capacity(usize::from(cb));
    bytes.extend_from_slice(&cb.to_le_bytes());
    bytes.push(tag);
    bytes.extend_from_slice(payload);
    Ok(ItemId {
        bytes: bytes.into_boxed_slice(),
    })
}

fn check_name(name: &str) -> Result<(), NamespaceError> {
    if name.is_empty() {
        return Err(NamespaceError::invalid("identifier name is empty"));
    }
    if name.contains('\0') {
        return Err(NamespaceError::invalid(format!(
            "identifier name {name:?} contains NUL"
        )));
    }
    Ok(())
}

impl ItemId {
    /// Decode exactly one identifier occupying all of `bytes`.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] if the length prefix disagrees with `bytes` or the
    /// payload of a recognized kind is malformed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NamespaceError> {
        let (id, rest) = Self::read_prefix(bytes)?;
        if !rest.is_empty() {
            return Err(NamespaceError::invalid(format!(
                "{} trailing bytes after identifier",
                rest.len()
            )));
        }
        Ok(id)
    }

    /// Decode the identifier at the front of `bytes`, returning it and the remaining input.
    pub(crate) fn read_prefix(bytes: &[u8]) -> Result<(Self, &[u8]), NamespaceError> {
        let cb = usize::from(
            read_u16(bytes, 0).ok_or_else(|| NamespaceError::invalid("truncated length"))?,
        );
        if cb < HEADER_LEN {
            return Err(NamespaceError::invalid(format!(
                "identifier length {cb} is below the minimum"
            )));
        }
        if cb > bytes.len() {
            return Err(NamespaceError::invalid(format!(
                "identifier claims {cb} bytes but only {} remain",
                bytes.len()
            )));
        }
        let (this, rest) = bytes.split_at(cb);
        if decode(this).is_none() {
            return Err(NamespaceError::invalid(format!(
                "malformed identifier with tag {:#04x}",
                this[2]
            )));
        }
        Ok((
            Self {
                bytes: this.into(),
            },
            rest,
        ))
    }

    /// Mint a folder or file identifier from a scan or stat record, keyed on its directory bit.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] if the record's name is empty or contains NUL.
    pub fn from_file_record(record: &FileRecord) -> Result<Self, NamespaceError> {
        check_name(&record.name)?;
        let modified = DosDateTime::from_system_time(record.modified);
        let mut payload = Vec::with_capacity(FS_FIXED_LEN + record.name.len() + 1);
        payload.push(0);
        payload.extend_from_slice(&record.size.to_le_bytes());
        payload.extend_from_slice(&modified.date.to_le_bytes());
        payload.extend_from_slice(&modified.time.to_le_bytes());
        payload.extend_from_slice(&record.attributes.bits().to_le_bytes());
        payload.extend_from_slice(record.name.as_bytes());
        payload.push(0);
        frame(
            if record.is_dir() { TAG_FOLDER } else { TAG_FILE },
            &payload,
        )
    }

    /// Stat `path` and mint an identifier for it.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::NotFound`] if nothing exists at `path`; other I/O failures are
    /// [`NamespaceError::OperationFailed`].
    pub fn from_path(fs: &dyn Filesystem, path: &Path) -> Result<Self, NamespaceError> {
        let record = fs
            .stat(path)
            .map_err(|e| NamespaceError::from_io(path.display().to_string(), e))?;
        Self::from_file_record(&record)
    }

    /// Mint a volume-root identifier, e.g. for `/` or `C:\`.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] if `root` is empty or contains NUL.
    pub fn drive(root: &str) -> Result<Self, NamespaceError> {
        check_name(root)?;
        let mut payload = Vec::with_capacity(root.len() + 1);
        payload.extend_from_slice(root.as_bytes());
        payload.push(0);
        frame(TAG_DRIVE, &payload)
    }

    /// Wrap a payload under another provider's tag.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] if `tag` is one this crate interprets, or the payload
    /// does not fit the length prefix.
    pub fn foreign(tag: u8, payload: &[u8]) -> Result<Self, NamespaceError> {
        if !matches!(ItemKind::from_tag(tag), ItemKind::Foreign(_)) {
            return Err(NamespaceError::invalid(format!(
                "tag {tag:#04x} is reserved for filesystem identifiers"
            )));
        }
        frame(tag, payload)
    }

    /// Retag a file identifier as a folder, keeping its metadata. Other kinds are unchanged.
    #[must_use]
    pub fn into_folder(mut self) -> Self {
        if self.bytes[2] == TAG_FILE {
            self.bytes[2] = TAG_FOLDER;
        }
        self
    }

    /// The type tag.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        ItemKind::from_tag(self.bytes[2])
    }

    /// Decode the payload.
    #[must_use]
    pub fn data(&self) -> ItemData<'_> {
        decode(&self.bytes).unwrap_or(ItemData::Foreign(&self.bytes[HEADER_LEN..]))
    }

    /// The folder/file metadata, if this is a filesystem identifier.
    #[must_use]
    pub fn fs_entry(&self) -> Option<FsEntry<'_>> {
        match self.data() {
            ItemData::Filesystem(entry) => Some(entry),
            ItemData::Drive { .. } | ItemData::Foreign(_) => None,
        }
    }

    /// Whether this identifier is tagged as a folder.
    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.kind() == ItemKind::Folder
    }

    /// Whether this identifier is tagged as a file.
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind() == ItemKind::File
    }

    /// Whether this identifier is a folder or a file.
    #[must_use]
    pub fn is_filesystem(&self) -> bool {
        matches!(self.kind(), ItemKind::Folder | ItemKind::File)
    }

    /// Whether this identifier is a volume root.
    #[must_use]
    pub fn is_drive(&self) -> bool {
        self.kind() == ItemKind::Drive
    }

    /// The stored name of a filesystem identifier, or the root text of a drive.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self.data() {
            ItemData::Filesystem(entry) => Some(entry.name),
            ItemData::Drive { root } => Some(root),
            ItemData::Foreign(_) => None,
        }
    }

    /// Cached size of a filesystem identifier.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.fs_entry().map(|e| e.size)
    }

    /// Cached last write time of a filesystem identifier.
    #[must_use]
    pub fn modified(&self) -> Option<DosDateTime> {
        self.fs_entry().map(|e| e.modified)
    }

    /// Cached raw attributes of a filesystem identifier.
    #[must_use]
    pub fn attributes(&self) -> Option<FileAttributes> {
        self.fs_entry().map(|e| e.attributes)
    }

    /// The extension of the stored name including its dot, or `""`.
    #[must_use]
    pub fn extension(&self) -> &str {
        self.fs_entry()
            .map_or("", |e| names::find_extension(e.name))
    }

    /// The wire form, including the length prefix.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.data() {
            ItemData::Filesystem(e) => f
                .debug_struct("ItemId")
                .field("kind", &self.kind())
                .field("name", &e.name)
                .field("size", &e.size)
                .field("attributes", &e.attributes)
                .finish(),
            ItemData::Drive { root } => f.debug_struct("ItemId").field("drive", &root).finish(),
            ItemData::Foreign(payload) => f
                .debug_struct("ItemId")
                .field("kind", &self.kind())
                .field("len", &payload.len())
                .finish(),
        }
    }
}
