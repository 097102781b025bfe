//! Namespace folders: the capability surface shared by every provider.
//!
//! A [`NamespaceFolder`] owns a root [`ItemIdList`] and answers questions about its immediate
//! children. Anything deeper is reached by binding one segment at a time, possibly into a
//! different provider, which is why every multi-segment operation delegates rather than walking
//! the filesystem itself.

/// Capability classification of identifiers.
pub mod attributes;
/// Class-keyed construction of child folders.
pub mod binder;
/// Sort columns and ordering.
pub mod compare;
/// The drive-root provider above filesystem roots.
pub mod drives;
/// Snapshot directory listings.
pub mod enumerator;
/// The filesystem provider.
pub mod folder;

pub use attributes::{attributes_text, classify};
pub use binder::{ClassBinder, FolderFactory, NamespaceBinder};
pub use compare::SortColumn;
pub use drives::DriveFolder;
pub use enumerator::DirectoryEnumerator;
pub use folder::FsFolder;

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bitflags::bitflags;

use crate::error::NamespaceError;
use crate::fs::{FileRecord, Filesystem};
use crate::idl::{ItemData, ItemId, ItemIdList};
use crate::names::{eq_ignore_case, is_separator};
use crate::notify::{ChangeNotifier, TracingNotifier};
use crate::overrides::{DirectoryOverrides, IniOverrides};
use crate::registry::{ClassId, TypeRegistry};

bitflags! {
    /// Which children an enumeration returns.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContentMask: u32 {
        /// Include folders.
        const FOLDERS        = 0x0020;
        /// Include everything that is not a folder.
        const NON_FOLDERS    = 0x0040;
        /// Include entries with the hidden attribute.
        const INCLUDE_HIDDEN = 0x0080;
    }
}

bitflags! {
    /// How a display name should be formatted.
    ///
    /// The empty set is the normal, fully qualified, human-readable form.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayFlags: u32 {
        /// Relative to the folder rather than to the namespace root.
        const IN_FOLDER       = 0x0001;
        /// For an edit box.
        const FOR_EDITING     = 0x1000;
        /// For an address bar.
        const FOR_ADDRESS_BAR = 0x4000;
        /// A name that parses back to the same item.
        const FOR_PARSING     = 0x8000;
    }
}

impl DisplayFlags {
    /// The normal form.
    pub const NORMAL: Self = Self::empty();
}

bitflags! {
    /// What may be done with an item.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        /// Can be copied.
        const CAN_COPY         = 0x0000_0001;
        /// Can be moved.
        const CAN_MOVE         = 0x0000_0002;
        /// A shortcut to it can be created.
        const CAN_LINK         = 0x0000_0004;
        /// Can be opened as a storage.
        const STORAGE          = 0x0000_0008;
        /// Can be renamed.
        const CAN_RENAME       = 0x0000_0010;
        /// Can be deleted.
        const CAN_DELETE       = 0x0000_0020;
        /// Has a property sheet.
        const HAS_PROP_SHEET   = 0x0000_0040;
        /// Accepts drops.
        const DROP_TARGET      = 0x0000_0100;
        /// Is a shortcut.
        const LINK             = 0x0001_0000;
        /// Is read-only.
        const READ_ONLY        = 0x0004_0000;
        /// Is hidden.
        const HIDDEN           = 0x0008_0000;
        /// Can be opened as a stream.
        const STREAM           = 0x0040_0000;
        /// Contains storages.
        const STORAGE_ANCESTOR = 0x0080_0000;
        /// Requests revalidation of cached data. Never reported.
        const VALIDATE         = 0x0100_0000;
        /// Contains filesystem items.
        const FILESYS_ANCESTOR = 0x1000_0000;
        /// Is a folder.
        const FOLDER           = 0x2000_0000;
        /// Is part of the filesystem.
        const FILESYSTEM       = 0x4000_0000;
        /// Has at least one folder child.
        const HAS_SUBFOLDER    = 0x8000_0000;
    }
}

/// The result of parsing a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    /// Identifiers for every parsed segment, relative to the parsing folder.
    pub ids: ItemIdList,
    /// Characters of input consumed.
    pub consumed: usize,
    /// Capabilities of the last segment, when they were requested.
    pub attributes: Option<Capabilities>,
}

/// Caller-supplied metadata for segments that may not exist yet.
///
/// When parsing meets a segment named here, it mints the identifier from this record instead of
/// asking the filesystem.
#[derive(Debug, Clone, Default)]
pub struct BindContext {
    entries: Vec<FileRecord>,
}

impl BindContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add metadata for the segment named `record.name`.
    #[must_use]
    pub fn with_entry(mut self, record: FileRecord) -> Self {
        self.entries.push(record);
        self
    }

    /// Metadata for `segment`, matched case-insensitively.
    #[must_use]
    pub fn lookup(&self, segment: &str) -> Option<&FileRecord> {
        self.entries
            .iter()
            .find(|r| eq_ignore_case(&r.name, segment))
    }
}

/// Collaborators shared by every folder of one namespace tree.
#[derive(Clone)]
pub struct FolderServices {
    /// Filesystem the tree projects.
    pub fs: Arc<dyn Filesystem>,
    /// File-type associations.
    pub registry: Arc<dyn TypeRegistry>,
    /// Constructs child folders by class.
    pub binder: Arc<dyn NamespaceBinder>,
    /// Per-directory overrides.
    pub overrides: Arc<dyn DirectoryOverrides>,
    /// Receives rename notifications.
    pub notifier: Arc<dyn ChangeNotifier>,
}

impl FolderServices {
    /// Services with the default binder, `desktop.ini` overrides and tracing notifications.
    #[must_use]
    pub fn new(fs: Arc<dyn Filesystem>, registry: Arc<dyn TypeRegistry>) -> Self {
        Self {
            fs,
            registry,
            binder: Arc::new(ClassBinder::new()),
            overrides: Arc::new(IniOverrides::default()),
            notifier: Arc::new(TracingNotifier),
        }
    }

    /// Replace the binder.
    #[must_use]
    pub fn with_binder(mut self, binder: Arc<dyn NamespaceBinder>) -> Self {
        self.binder = binder;
        self
    }

    /// Replace the override source.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Arc<dyn DirectoryOverrides>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Replace the notification sink.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = notifier;
        self
    }
}

impl fmt::Debug for FolderServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderServices").finish_non_exhaustive()
    }
}

/// Well-known per-user directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialFolder {
    /// The home directory.
    Home,
    /// The desktop directory.
    Desktop,
    /// The documents directory.
    Documents,
    /// The downloads directory.
    Downloads,
}

impl SpecialFolder {
    /// Where this folder lives for the current user, if the platform defines it.
    #[must_use]
    pub fn path(self) -> Option<PathBuf> {
        match self {
            Self::Home => dirs::home_dir(),
            Self::Desktop => dirs::desktop_dir(),
            Self::Documents => dirs::document_dir(),
            Self::Downloads => dirs::download_dir(),
        }
    }
}

/// Where an initialized folder should point, independent of its root list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderTarget {
    /// A well-known directory.
    Special(SpecialFolder),
    /// An explicit path.
    ParsingName(PathBuf),
    /// The path an absolute identifier list resolves to.
    IdList(ItemIdList),
}

impl FolderTarget {
    /// Resolve to a directory path.
    #[must_use]
    pub fn resolve(&self) -> Option<PathBuf> {
        match self {
            Self::Special(special) => special.path(),
            Self::ParsingName(path) if path.as_os_str().is_empty() => None,
            Self::ParsingName(path) => Some(path.clone()),
            Self::IdList(list) => path_from_id_list(list),
        }
    }
}

/// What a binder is asked to construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    /// Absolute identifier list of the new folder.
    pub root: ItemIdList,
    /// Directory the new folder projects, when already known.
    pub path: Option<PathBuf>,
}

/// The path an absolute identifier list denotes.
///
/// The list must start at a drive and continue through filesystem identifiers only.
#[must_use]
pub fn path_from_id_list(list: &ItemIdList) -> Option<PathBuf> {
    let (first, rest) = list.as_slice().split_first()?;
    let ItemData::Drive { root } = first.data() else {
        return None;
    };
    let mut path = PathBuf::from(root);
    for id in rest {
        path.push(id.fs_entry()?.name);
    }
    Some(path)
}

/// Split an absolute path into its root and the remainder.
///
/// Accepts `X:` drive prefixes and leading separators.
#[must_use]
pub fn split_root(text: &str) -> Option<(String, &str)> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(letter), Some(':')) if letter.is_ascii_alphabetic() => {
            let rest = &text[2..];
            let rest = rest
                .strip_prefix(is_separator)
                .unwrap_or(rest);
            Some((format!("{}:\\", letter.to_ascii_uppercase()), rest))
        }
        (Some(c), _) if is_separator(c) => Some(("/".to_owned(), &text[1..])),
        _ => None,
    }
}

/// Open the folder projecting the absolute directory `path`.
///
/// # Errors
///
/// Fails as parsing or binding `path` fails.
pub fn open_folder(
    services: &FolderServices,
    path: &Path,
) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
    let ids = parse_absolute(services, path)?;
    DriveFolder::new(services.clone()).bind(&ids)
}

/// Parse the absolute `path` into an identifier list from the namespace root.
///
/// # Errors
///
/// [`NamespaceError::InvalidArgument`] for relative or non-UTF-8 paths, and anything parsing
/// raises.
pub fn parse_absolute(
    services: &FolderServices,
    path: &Path,
) -> Result<ItemIdList, NamespaceError> {
    let text = path
        .to_str()
        .ok_or_else(|| NamespaceError::invalid(format!("{} is not UTF-8", path.display())))?;
    Ok(DriveFolder::new(services.clone())
        .parse(text, None, None)?
        .ids)
}

/// The parent folder of the item `path` names, with the item's identifier in that folder.
///
/// # Errors
///
/// Fails as parsing `path` or binding its parent fails.
pub fn resolve_item(
    services: &FolderServices,
    path: &Path,
) -> Result<(Box<dyn NamespaceFolder>, ItemId), NamespaceError> {
    let ids = parse_absolute(services, path)?;
    services.binder.bind_parent(services, &ids)
}

/// One level of a hierarchical namespace.
///
/// Identifier arguments are relative to this folder. Multi-segment arguments are handled by
/// binding the first segment and delegating the rest to the child.
pub trait NamespaceFolder: Send + Sync + fmt::Debug {
    /// The class implementing this folder.
    fn class_id(&self) -> ClassId;

    /// A copy of the absolute identifier list this folder is rooted at.
    fn current_folder(&self) -> ItemIdList;

    /// The directory this folder projects, if it has one.
    fn path(&self) -> Option<&Path>;

    /// Turn a display name into identifiers, optionally computing the last segment's
    /// capabilities.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for empty or malformed text,
    /// [`NamespaceError::NotFound`] for a segment that neither exists nor appears in `ctx`.
    fn parse(
        &self,
        text: &str,
        ctx: Option<&BindContext>,
        requested: Option<Capabilities>,
    ) -> Result<Parsed, NamespaceError>;

    /// Snapshot the children selected by `mask`.
    ///
    /// # Errors
    ///
    /// Any failure while listing aborts the whole enumeration.
    fn enumerate(&self, mask: ContentMask) -> Result<DirectoryEnumerator, NamespaceError>;

    /// The folder that `ids` denotes.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for empty input, [`NamespaceError::NotFound`] when no
    /// handler exists, [`NamespaceError::AccessDenied`] when the handler is blocked.
    fn bind(&self, ids: &ItemIdList) -> Result<Box<dyn NamespaceFolder>, NamespaceError>;

    /// A storage view of `ids`.
    ///
    /// # Errors
    ///
    /// Unsupported unless a provider overrides it.
    fn bind_to_storage(
        &self,
        _ids: &ItemIdList,
    ) -> Result<Box<dyn NamespaceFolder>, NamespaceError> {
        Err(NamespaceError::NotImplemented("bind_to_storage"))
    }

    /// Order two items under the sort column with raw index `column`.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for an unknown column or an identifier this provider
    /// does not understand.
    fn compare(
        &self,
        column: u16,
        a: &ItemIdList,
        b: &ItemIdList,
    ) -> Result<Ordering, NamespaceError>;

    /// The capabilities common to every item in `ids`, restricted to `requested`.
    ///
    /// An empty `requested` means every capability. An empty `ids` asks about this folder
    /// itself. [`Capabilities::VALIDATE`] is never reported.
    ///
    /// # Errors
    ///
    /// Only when delegating to a parent folder fails.
    fn attributes_of(
        &self,
        ids: &[ItemId],
        requested: Capabilities,
    ) -> Result<Capabilities, NamespaceError>;

    /// Format the name of `ids`.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for an empty list unless a parsing name is requested,
    /// or for an identifier this provider does not understand.
    fn display_name(
        &self,
        ids: &ItemIdList,
        flags: DisplayFlags,
    ) -> Result<String, NamespaceError>;

    /// Rename the child `id` to `new_name`, returning its new identifier.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::OperationFailed`] carrying the OS reason when the rename fails.
    fn rename(
        &self,
        id: &ItemId,
        new_name: &str,
        flags: DisplayFlags,
    ) -> Result<ItemId, NamespaceError>;
}

/// Folders whose root can be (re)assigned after construction.
pub trait PersistFolder {
    /// Root the folder at `root`, deriving its path from the list.
    ///
    /// # Errors
    ///
    /// Implementations may reject roots they cannot represent.
    fn initialize(&mut self, root: ItemIdList) -> Result<(), NamespaceError>;

    /// Root the folder at `root`, projecting the directory `target` resolves to.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::OperationFailed`] when `target` yields no path. The previous state is
    /// kept.
    fn initialize_ex(
        &mut self,
        root: ItemIdList,
        target: FolderTarget,
    ) -> Result<(), NamespaceError>;
}
