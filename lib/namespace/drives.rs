//! The level above filesystem roots.
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::error::NamespaceError;
use crate::idl::{ItemData, ItemId, ItemIdList};
use crate::names::cmp_ignore_case;
use crate::registry::ClassId;

use super::compare::{SortColumn, compare_children};
use super::{
    BindContext, BindRequest, Capabilities, ContentMask, DirectoryEnumerator, DisplayFlags,
    FolderServices, NamespaceFolder, Parsed, split_root,
};

const DRIVE_CAPS: Capabilities = Capabilities::CAN_LINK
    .union(Capabilities::DROP_TARGET)
    .union(Capabilities::HAS_PROP_SHEET)
    .union(Capabilities::FOLDER)
    .union(Capabilities::FILESYSTEM)
    .union(Capabilities::FILESYS_ANCESTOR)
    .union(Capabilities::STORAGE_ANCESTOR)
    .union(Capabilities::STORAGE)
    .union(Capabilities::HAS_SUBFOLDER);

const ROOT_CAPS: Capabilities = Capabilities::FOLDER
    .union(Capabilities::HAS_SUBFOLDER)
    .union(Capabilities::FILESYS_ANCESTOR);

/// Lists volume roots and hands each one off to a filesystem folder.
///
/// Its own root is the empty identifier list. It is the parent consulted when a folder rooted
/// at a volume is asked about itself.
#[derive(Debug, Clone)]
pub struct DriveFolder {
    services: FolderServices,
}

fn drive_root(id: &ItemId) -> Result<&str, NamespaceError> {
    match id.data() {
        ItemData::Drive { root } => Ok(root),
        ItemData::Filesystem(_) | ItemData::Foreign(_) => Err(NamespaceError::invalid(format!(
            "{id:?} is not a drive identifier"
        ))),
    }
}

impl DriveFolder {
    /// The drive list for `services`.
    #[must_use]
    pub fn new(services: FolderServices) -> Self {
        Self { services }
    }

    /// Build the drive list for a binder. Only the empty root is accepted.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for any other root.
    pub fn create(
        services: &FolderServices,
        request: BindRequest,
    ) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        if !request.root.is_empty() {
            return Err(NamespaceError::invalid(
                "the drive list only exists at the namespace root",
            ));
        }
        Ok(Box::new(Self::new(services.clone())))
    }

    #[cfg(windows)]
    fn roots(&self) -> Vec<String> {
        ('A'..='Z')
            .map(|letter| format!("{letter}:\\"))
            .filter(|root| self.services.fs.exists(Path::new(root)))
            .collect()
    }

    #[cfg(not(windows))]
    #[expect(clippy::unused_self, reason = "the root set only depends on the host on windows")]
    fn roots(&self) -> Vec<String> {
        vec!["/".to_owned()]
    }
}

impl NamespaceFolder for DriveFolder {
    fn class_id(&self) -> ClassId {
        ClassId::DRIVES_FOLDER
    }

    fn current_folder(&self) -> ItemIdList {
        ItemIdList::new()
    }

    fn path(&self) -> Option<&Path> {
        None
    }

    fn parse(
        &self,
        text: &str,
        ctx: Option<&BindContext>,
        requested: Option<Capabilities>,
    ) -> Result<Parsed, NamespaceError> {
        if text.is_empty() {
            return Err(NamespaceError::invalid("display name is empty"));
        }
        let (root, rest) = split_root(text)
            .ok_or_else(|| NamespaceError::invalid(format!("{text:?} is not an absolute path")))?;
        if !self.services.fs.exists(Path::new(&root)) {
            return Err(NamespaceError::NotFound(root));
        }
        let drive = ItemId::drive(&root)?;
        let consumed = text.chars().count();

        if rest.is_empty() {
            let attributes = match requested {
                Some(requested) if !requested.is_empty() => {
                    Some(self.attributes_of(std::slice::from_ref(&drive), requested)?)
                }
                _ => None,
            };
            return Ok(Parsed {
                ids: ItemIdList::from_id(drive),
                consumed,
                attributes,
            });
        }

        let child = self.bind(&ItemIdList::from_id(drive.clone()))?;
        let tail = child.parse(rest, ctx, requested)?;
        Ok(Parsed {
            ids: ItemIdList::from_id(drive).concat(&tail.ids),
            consumed,
            attributes: tail.attributes,
        })
    }

    fn enumerate(&self, mask: ContentMask) -> Result<DirectoryEnumerator, NamespaceError> {
        if !mask.contains(ContentMask::FOLDERS) {
            return Ok(DirectoryEnumerator::default());
        }
        let drives = self
            .roots()
            .iter()
            .map(String::as_str)
            .map(ItemId::drive)
            .collect::<Result<Vec<_>, _>>()?;
        debug!(count = drives.len(), "enumerated drives");
        Ok(DirectoryEnumerator::from_items(drives))
    }

    fn bind(&self, ids: &ItemIdList) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        let (first, rest) = ids
            .split_first()
            .ok_or_else(|| NamespaceError::invalid("cannot bind an empty identifier list"))?;
        let root = drive_root(first)?;

        let child = self.services.binder.bind(
            &self.services,
            ClassId::FS_FOLDER,
            BindRequest {
                root: ItemIdList::from_id(first.clone()),
                path: Some(PathBuf::from(root)),
            },
        )?;
        if rest.is_empty() {
            Ok(child)
        } else {
            child.bind(&rest)
        }
    }

    fn compare(
        &self,
        column: u16,
        a: &ItemIdList,
        b: &ItemIdList,
    ) -> Result<Ordering, NamespaceError> {
        let column = SortColumn::try_from(column)?;
        let (Some((head_a, rest_a)), Some((head_b, rest_b))) = (a.split_first(), b.split_first())
        else {
            return Err(NamespaceError::invalid("cannot compare an empty identifier list"));
        };
        match cmp_ignore_case(drive_root(head_a)?, drive_root(head_b)?) {
            Ordering::Equal => compare_children(self, column, head_a, &rest_a, &rest_b),
            ord => Ok(ord),
        }
    }

    fn attributes_of(
        &self,
        ids: &[ItemId],
        requested: Capabilities,
    ) -> Result<Capabilities, NamespaceError> {
        let mut mask = if requested.is_empty() {
            Capabilities::all()
        } else {
            requested
        };
        if ids.is_empty() {
            mask &= ROOT_CAPS;
        }
        for id in ids {
            if id.is_drive() {
                mask &= DRIVE_CAPS;
            } else {
                error!(?id, "skipping a non-drive identifier");
            }
        }
        Ok(mask - Capabilities::VALIDATE)
    }

    fn display_name(
        &self,
        ids: &ItemIdList,
        flags: DisplayFlags,
    ) -> Result<String, NamespaceError> {
        let (first, rest) = ids
            .split_first()
            .ok_or_else(|| NamespaceError::invalid("the drive list has no display name"))?;
        if rest.is_empty() {
            return drive_root(first).map(str::to_owned);
        }
        self.bind(&ItemIdList::from_id(first.clone()))?
            .display_name(&rest, flags)
    }

    fn rename(
        &self,
        _id: &ItemId,
        _new_name: &str,
        _flags: DisplayFlags,
    ) -> Result<ItemId, NamespaceError> {
        Err(NamespaceError::NotImplemented("renaming drives"))
    }
}
