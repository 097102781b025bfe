//! The filesystem namespace provider.
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use tracing::{debug, error, warn};

use crate::error::NamespaceError;
use crate::fs::FileAttributes;
use crate::idl::{ItemId, ItemIdList};
use crate::names::{self, find_extension, strip_extension};
use crate::notify::{ChangeEvent, ChangeKind};
use crate::overrides::IconLocation;
use crate::registry::{self, ClassId, KEY_CLSID};

use super::compare::{self, SortColumn};
use super::{
    BindContext, BindRequest, Capabilities, ContentMask, DirectoryEnumerator, DisplayFlags,
    FolderServices, FolderTarget, NamespaceFolder, Parsed, PersistFolder, classify,
    path_from_id_list,
};

#[derive(Debug, Clone, Default)]
enum FolderState {
    #[default]
    Uninitialized,
    Initialized {
        root: ItemIdList,
        path: Option<PathBuf>,
    },
}

/// A directory of the host filesystem, seen as a namespace folder.
#[derive(Debug, Clone)]
pub struct FsFolder {
    services: FolderServices,
    state: FolderState,
}

impl FsFolder {
    /// An uninitialized folder. Call [`PersistFolder::initialize`] before use.
    #[must_use]
    pub fn new(services: FolderServices) -> Self {
        Self {
            services,
            state: FolderState::Uninitialized,
        }
    }

    /// Build and initialize a folder for a binder.
    ///
    /// # Errors
    ///
    /// Fails as [`PersistFolder::initialize_ex`] does when the request carries a path.
    pub fn create(
        services: &FolderServices,
        request: BindRequest,
    ) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        let mut folder = Self::new(services.clone());
        match request.path {
            Some(path) => folder.initialize_ex(request.root, FolderTarget::ParsingName(path))?,
            None => folder.initialize(request.root)?,
        }
        Ok(Box::new(folder))
    }

    /// Whether an initializer has run.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, FolderState::Initialized { .. })
    }

    fn root(&self) -> Option<&ItemIdList> {
        match &self.state {
            FolderState::Initialized { root, .. } => Some(root),
            FolderState::Uninitialized => None,
        }
    }

    fn require_path(&self) -> Result<&Path, NamespaceError> {
        self.path()
            .ok_or_else(|| NamespaceError::invalid("folder has no filesystem path"))
    }

    fn child_path(&self, id: &ItemId) -> Result<PathBuf, NamespaceError> {
        let entry = id
            .fs_entry()
            .ok_or_else(|| NamespaceError::invalid("identifier is not a filesystem item"))?;
        Ok(self.require_path()?.join(entry.name))
    }

    /// The handler class registered for the file `id` under `key`.
    ///
    /// Folders have no file-type handlers.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::AccessDenied`] for a blocked class; registry failures propagate.
    pub fn handler_for(&self, id: &ItemId, key: &str) -> Result<Option<ClassId>, NamespaceError> {
        match id.fs_entry() {
            Some(entry) if !entry.is_folder => {
                registry::class_for_file_type(self.services.registry.as_ref(), entry.name, key)
            }
            _ => Ok(None),
        }
    }

    /// The icon override a system or read-only child folder declares.
    #[must_use]
    pub fn icon_override(&self, id: &ItemId) -> Option<IconLocation> {
        let entry = id.fs_entry()?;
        if !entry.is_folder || !has_override_bits(entry.attributes) {
            return None;
        }
        let dir = self.child_path(id).ok()?;
        self.services
            .overrides
            .folder_icon(self.services.fs.as_ref(), &dir)
    }

    fn class_for_child(&self, id: &ItemId, child_path: &Path) -> Result<ClassId, NamespaceError> {
        let Some(entry) = id.fs_entry() else {
            return Err(NamespaceError::invalid(
                "identifier is not a filesystem item",
            ));
        };
        if entry.is_folder {
            if has_override_bits(entry.attributes) {
                if let Some(class) = self
                    .services
                    .overrides
                    .folder_class(self.services.fs.as_ref(), child_path)
                {
                    debug!(dir = %child_path.display(), %class, "folder class overridden");
                    return Ok(class);
                }
            }
            return Ok(ClassId::FS_FOLDER);
        }
        self.handler_for(id, KEY_CLSID)?.ok_or_else(|| {
            NamespaceError::NotFound(format!("no handler registered for {}", entry.name))
        })
    }

    fn has_subfolder(&self, id: &ItemId) -> bool {
        let probe = self
            .bind(&ItemIdList::from_id(id.clone()))
            .and_then(|child| child.enumerate(ContentMask::FOLDERS));
        match probe {
            Ok(mut children) => children.skip_items(1),
            Err(NamespaceError::NotFound(reason)) => {
                debug!(?id, %reason, "has-subfolder probe found nothing to bind");
                false
            }
            Err(e) => {
                warn!(?id, error = %e, "has-subfolder probe failed");
                false
            }
        }
    }

    fn hides_extension(&self, name: &str) -> bool {
        !name.starts_with('.') && registry::hides_extension(self.services.registry.as_ref(), name)
    }
}

fn has_override_bits(attributes: FileAttributes) -> bool {
    attributes.intersects(FileAttributes::SYSTEM | FileAttributes::READONLY)
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

impl PersistFolder for FsFolder {
    fn initialize(&mut self, root: ItemIdList) -> Result<(), NamespaceError> {
        let path = path_from_id_list(&root);
        debug!(?root, path = ?path, "initialized filesystem folder");
        self.state = FolderState::Initialized { root, path };
        Ok(())
    }

    fn initialize_ex(
        &mut self,
        root: ItemIdList,
        target: FolderTarget,
    ) -> Result<(), NamespaceError> {
        let path = target.resolve().ok_or_else(|| {
            NamespaceError::failed(format!("initialize target {target:?} has no filesystem path"))
        })?;
        debug!(?root, path = %path.display(), "initialized filesystem folder");
        self.state = FolderState::Initialized {
            root,
            path: Some(path),
        };
        Ok(())
    }
}

impl NamespaceFolder for FsFolder {
    fn class_id(&self) -> ClassId {
        ClassId::FS_FOLDER
    }

    fn current_folder(&self) -> ItemIdList {
        self.root().cloned().unwrap_or_default()
    }

    fn path(&self) -> Option<&Path> {
        match &self.state {
            FolderState::Initialized { path, .. } => path.as_deref(),
            FolderState::Uninitialized => None,
        }
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
        let (segment, rest) = names::next_segment(text);
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(NamespaceError::invalid(format!(
                "{text:?} has an empty or relative segment"
            )));
        }

        let id = match ctx.and_then(|c| c.lookup(segment)) {
            Some(record) => {
                let mut record = record.clone();
                segment.clone_into(&mut record.name);
                let id = ItemId::from_file_record(&record)?;
                // Something follows, so this segment has to be a container.
                if rest.is_some() { id.into_folder() } else { id }
            }
            None => {
                let path = self.require_path()?.join(segment);
                ItemId::from_path(self.services.fs.as_ref(), &path)?
            }
        };
        debug!(segment, ?id, "parsed segment");

        let consumed = text.chars().count();
        match rest {
            Some(rest) if !rest.is_empty() => {
                let child = self.bind(&ItemIdList::from_id(id.clone()))?;
                let tail = child.parse(rest, ctx, requested)?;
                Ok(Parsed {
                    ids: ItemIdList::from_id(id).concat(&tail.ids),
                    consumed,
                    attributes: tail.attributes,
                })
            }
            _ => {
                let attributes = match requested {
                    Some(requested) if !requested.is_empty() => {
                        Some(self.attributes_of(std::slice::from_ref(&id), requested)?)
                    }
                    _ => None,
                };
                Ok(Parsed {
                    ids: ItemIdList::from_id(id),
                    consumed,
                    attributes,
                })
            }
        }
    }

    fn enumerate(&self, mask: ContentMask) -> Result<DirectoryEnumerator, NamespaceError> {
        DirectoryEnumerator::scan(self.services.fs.as_ref(), self.require_path()?, mask)
    }

    fn bind(&self, ids: &ItemIdList) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        let root = self
            .root()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| NamespaceError::invalid("cannot bind from an unrooted folder"))?;
        let (first, rest) = ids
            .split_first()
            .ok_or_else(|| NamespaceError::invalid("cannot bind an empty identifier list"))?;

        let child_path = self.child_path(first)?;
        let class = self.class_for_child(first, &child_path)?;
        debug!(path = %child_path.display(), %class, "binding child");

        let child = self.services.binder.bind(
            &self.services,
            class,
            BindRequest {
                root: root.appended(first.clone()),
                path: Some(child_path),
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
        compare::compare_fs(self, SortColumn::try_from(column)?, a, b)
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
            match self.root().and_then(ItemIdList::last) {
                Some(last) if last.is_filesystem() => {
                    mask = classify(last, mask, || {
                        self.enumerate(ContentMask::FOLDERS)
                            .is_ok_and(|mut children| children.skip_items(1))
                    });
                }
                Some(last) if last.is_drive() => {
                    let root = self.current_folder();
                    let (parent, id) = self.services.binder.bind_parent(&self.services, &root)?;
                    mask = parent.attributes_of(std::slice::from_ref(&id), mask)?;
                }
                other => error!(last = ?other, "cannot classify the root of this folder"),
            }
        } else {
            for id in ids {
                if id.is_filesystem() {
                    mask = classify(id, mask, || self.has_subfolder(id));
                } else {
                    error!(?id, "skipping an identifier of another provider");
                }
            }
        }

        Ok(mask - Capabilities::VALIDATE)
    }

    fn display_name(
        &self,
        ids: &ItemIdList,
        flags: DisplayFlags,
    ) -> Result<String, NamespaceError> {
        let full_path =
            flags.contains(DisplayFlags::FOR_PARSING) && !flags.contains(DisplayFlags::IN_FOLDER);

        let (id, rest) = match ids.split_first() {
            None => {
                return match self.path() {
                    Some(path) if full_path => Ok(path_text(path)),
                    _ => Err(NamespaceError::invalid(
                        "only a parsing name exists for the folder itself",
                    )),
                };
            }
            Some(split) => split,
        };
        if !rest.is_empty() {
            return self
                .bind(&ItemIdList::from_id(id.clone()))?
                .display_name(&rest, flags);
        }

        let entry = id
            .fs_entry()
            .ok_or_else(|| NamespaceError::invalid("identifier is not a filesystem item"))?;
        if full_path {
            if let Some(path) = self.path() {
                return Ok(path_text(&path.join(entry.name)));
            }
        }

        let strip = !flags.contains(DisplayFlags::FOR_PARSING)
            && (flags.contains(DisplayFlags::IN_FOLDER) || flags == DisplayFlags::NORMAL);
        if strip && !entry.is_folder && self.hides_extension(entry.name) {
            return Ok(strip_extension(entry.name).to_owned());
        }
        Ok(entry.name.to_owned())
    }

    fn rename(
        &self,
        id: &ItemId,
        new_name: &str,
        flags: DisplayFlags,
    ) -> Result<ItemId, NamespaceError> {
        if new_name.is_empty() {
            return Err(NamespaceError::invalid("new name is empty"));
        }
        let entry = id
            .fs_entry()
            .ok_or_else(|| NamespaceError::invalid("identifier is not a filesystem item"))?;
        let src = self.child_path(id)?;

        let mut dest_name = new_name.to_owned();
        if !flags.contains(DisplayFlags::FOR_PARSING)
            && !entry.is_folder
            && self.hides_extension(entry.name)
            && find_extension(new_name).is_empty()
        {
            dest_name.push_str(find_extension(entry.name));
        }
        // Only a full parsing name stands on its own; every other form is relative to this folder.
        let dest = if flags.contains(DisplayFlags::FOR_PARSING)
            && !flags.contains(DisplayFlags::IN_FOLDER)
        {
            PathBuf::from(&dest_name)
        } else {
            self.require_path()?.join(&dest_name)
        };
        debug!(src = %src.display(), dest = %dest.display(), "renaming");

        let fs = self.services.fs.as_ref();
        if src == dest {
            return ItemId::from_path(fs, &dest);
        }

        fs.rename(&src, &dest)
            .map_err(|e| NamespaceError::OperationFailed {
                context: format!("renaming {} to {}", src.display(), dest.display()),
                source: Some(e),
            })?;

        self.services.notifier.notify(&ChangeEvent {
            kind: if entry.is_folder {
                ChangeKind::RenameFolder
            } else {
                ChangeKind::RenameItem
            },
            from: src,
            to: dest.clone(),
        });
        ItemId::from_path(fs, &dest)
    }
}
