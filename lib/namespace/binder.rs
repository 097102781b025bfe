//! Constructing child folders from class identifiers.
use std::collections::HashMap;
use std::fmt;

use tracing::warn;

use crate::error::NamespaceError;
use crate::idl::{ItemId, ItemIdList};
use crate::registry::ClassId;

use super::{BindRequest, DriveFolder, FolderServices, FsFolder, NamespaceFolder};

/// Builds a folder of one class.
pub type FolderFactory = Box<
    dyn Fn(&FolderServices, BindRequest) -> Result<Box<dyn NamespaceFolder>, NamespaceError>
        + Send
        + Sync,
>;

/// Turns a routing decision into a folder.
///
/// Folders decide which class should own a child; the binder decides how to build it.
pub trait NamespaceBinder: Send + Sync {
    /// Construct a folder of `class` for `request`.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::NotFound`] if no implementation of `class` is available; construction
    /// errors propagate.
    fn bind(
        &self,
        services: &FolderServices,
        class: ClassId,
        request: BindRequest,
    ) -> Result<Box<dyn NamespaceFolder>, NamespaceError>;

    /// The folder owning the last segment of the absolute list `ids`, with that segment.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for an empty list; binding errors propagate.
    fn bind_parent(
        &self,
        services: &FolderServices,
        ids: &ItemIdList,
    ) -> Result<(Box<dyn NamespaceFolder>, ItemId), NamespaceError> {
        let leaf = ids
            .last()
            .cloned()
            .ok_or_else(|| NamespaceError::invalid("the namespace root has no parent"))?;
        let mut parent = ids.clone();
        parent.remove_last();

        let drives = DriveFolder::new(services.clone());
        let folder: Box<dyn NamespaceFolder> = if parent.is_empty() {
            Box::new(drives)
        } else {
            drives.bind(&parent)?
        };
        Ok((folder, leaf))
    }
}

/// A [`NamespaceBinder`] backed by a table of factories.
///
/// [`ClassId::FS_FOLDER`] and [`ClassId::DRIVES_FOLDER`] are registered by [`ClassBinder::new`].
pub struct ClassBinder {
    factories: HashMap<ClassId, FolderFactory>,
}

impl ClassBinder {
    /// A binder for the built-in folder classes.
    #[must_use]
    pub fn new() -> Self {
        Self::empty()
            .with(ClassId::FS_FOLDER, Box::new(FsFolder::create))
            .with(ClassId::DRIVES_FOLDER, Box::new(DriveFolder::create))
    }

    /// A binder that knows no classes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register `factory` for `class`, replacing any previous one.
    #[must_use]
    pub fn with(mut self, class: ClassId, factory: FolderFactory) -> Self {
        self.register(class, factory);
        self
    }

    /// Register `factory` for `class`, replacing any previous one.
    pub fn register(&mut self, class: ClassId, factory: FolderFactory) {
        if self.factories.insert(class, factory).is_some() {
            warn!(%class, "replaced an existing folder factory");
        }
    }

    /// Whether `class` can be built.
    #[must_use]
    pub fn is_registered(&self, class: ClassId) -> bool {
        self.factories.contains_key(&class)
    }
}

impl Default for ClassBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ClassBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassBinder")
            .field("classes", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl NamespaceBinder for ClassBinder {
    fn bind(
        &self,
        services: &FolderServices,
        class: ClassId,
        request: BindRequest,
    ) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        let factory = self.factories.get(&class).ok_or_else(|| {
            NamespaceError::NotFound(format!("no folder implementation for {class}"))
        })?;
        factory(services, request)
    }
}
