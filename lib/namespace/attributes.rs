//! Deriving capabilities from identifiers.
use tracing::error;

use crate::fs::FileAttributes;
use crate::idl::ItemId;
use crate::names::{SHORTCUT_EXTENSION, eq_ignore_case};

use super::Capabilities;

/// Granted to every folder and file.
const FS_BASE: Capabilities = Capabilities::CAN_COPY
    .union(Capabilities::CAN_MOVE)
    .union(Capabilities::CAN_LINK)
    .union(Capabilities::CAN_RENAME)
    .union(Capabilities::CAN_DELETE)
    .union(Capabilities::HAS_PROP_SHEET)
    .union(Capabilities::DROP_TARGET)
    .union(Capabilities::FILESYSTEM);

/// Granted to folders on top of [`FS_BASE`]. `HAS_SUBFOLDER` is probed separately.
const FOLDER_EXTRA: Capabilities = Capabilities::FOLDER
    .union(Capabilities::FILESYS_ANCESTOR)
    .union(Capabilities::STORAGE_ANCESTOR)
    .union(Capabilities::STORAGE);

/// The capabilities of `id`, restricted to `requested`.
///
/// `has_subfolder` is invoked only for folders and only when [`Capabilities::HAS_SUBFOLDER`] is
/// requested; it is the only part of classification that may touch the filesystem. Identifiers
/// of other providers keep at most [`Capabilities::CAN_LINK`].
#[must_use]
pub fn classify(
    id: &ItemId,
    requested: Capabilities,
    has_subfolder: impl FnOnce() -> bool,
) -> Capabilities {
    let Some(entry) = id.fs_entry() else {
        error!(kind = ?id.kind(), "asked to classify an identifier of another provider");
        return requested & Capabilities::CAN_LINK;
    };

    let mut caps = FS_BASE;
    caps |= if entry.is_folder {
        FOLDER_EXTRA
    } else {
        Capabilities::STREAM
    };
    if entry.attributes.contains(FileAttributes::HIDDEN) {
        caps |= Capabilities::HIDDEN;
    }
    if entry.attributes.contains(FileAttributes::READONLY) {
        caps |= Capabilities::READ_ONLY;
    }
    if requested.contains(Capabilities::LINK) && eq_ignore_case(id.extension(), SHORTCUT_EXTENSION)
    {
        caps |= Capabilities::LINK;
    }
    if entry.is_folder && requested.contains(Capabilities::HAS_SUBFOLDER) && has_subfolder() {
        caps |= Capabilities::HAS_SUBFOLDER;
    }
    caps & requested
}

/// Raw attributes as detail text: one letter each for read-only, hidden, system and archive.
#[must_use]
pub fn attributes_text(attributes: FileAttributes) -> String {
    [
        (FileAttributes::READONLY, 'R'),
        (FileAttributes::HIDDEN, 'H'),
        (FileAttributes::SYSTEM, 'S'),
        (FileAttributes::ARCHIVE, 'A'),
    ]
    .into_iter()
    .filter(|(flag, _)| attributes.contains(*flag))
    .map(|(_, letter)| letter)
    .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::fs::FileRecord;

    #[test]
    fn files_are_never_checked_for_subfolders() {
        let file = ItemId::from_file_record(&FileRecord::file("notes.txt", 3)).unwrap();
        let caps = classify(&file, Capabilities::all(), || {
            panic!("files have no children to look for")
        });
        assert!(!caps.contains(Capabilities::HAS_SUBFOLDER));
        assert!(caps.contains(Capabilities::STREAM));

        let dir = ItemId::from_file_record(&FileRecord::directory("src")).unwrap();
        let mut asked = false;
        let caps = classify(&dir, Capabilities::HAS_SUBFOLDER, || {
            asked = true;
            true
        });
        assert!(asked);
        assert_eq!(caps, Capabilities::HAS_SUBFOLDER);
    }

    #[test]
    fn text_lists_letters_in_fixed_order() {
        assert_eq!(
            attributes_text(FileAttributes::ARCHIVE | FileAttributes::READONLY),
            "RA"
        );
        assert_eq!(attributes_text(FileAttributes::DIRECTORY), "");
        assert_eq!(
            attributes_text(
                FileAttributes::SYSTEM | FileAttributes::HIDDEN | FileAttributes::READONLY
            ),
            "RHS"
        );
    }
}
