//! Class identifiers and the file-type registry.
//!
//! The registry answers two questions about a file name: which handler class is registered for a
//! given key, and whether its extension should be hidden from display names. The lookup always
//! tries the extension entry first and falls back to the extension's program identifier.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::NamespaceError;
use crate::names;

/// Key naming the class that implements a namespace for a file type.
pub const KEY_CLSID: &str = "CLSID";
/// Key naming the class that supplies default icons.
pub const KEY_DEFAULT_ICON: &str = "DefaultIcon";
/// Key naming the class that accepts drops onto a file.
pub const KEY_DROP_HANDLER: &str = "shellex\\DropHandler";
/// Key naming the class that extracts per-file icons.
pub const KEY_ICON_HANDLER: &str = "shellex\\IconHandler";

/// A globally unique class identifier.
///
/// Parses the braced `{XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX}` form used by descriptor files, as
/// well as the bare hyphenated form.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub Uuid);

impl ClassId {
    /// The filesystem folder namespace.
    pub const FS_FOLDER: Self = Self(Uuid::from_u128(0xF336_4BA0_65B9_11CE_A9BA_00AA_004A_E837));

    /// The drive-root namespace above filesystem roots.
    pub const DRIVES_FOLDER: Self =
        Self(Uuid::from_u128(0x20D0_4FE0_3AEA_1069_A2D8_0800_2B30_309D));
}

impl FromStr for ClassId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}", self.0.braced())
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({self})")
    }
}

/// Read-only file-type associations.
pub trait TypeRegistry: Send + Sync {
    /// The class registered under `key` for `extension` (dot included), following the extension's
    /// program identifier when the extension entry lacks the key.
    ///
    /// # Errors
    ///
    /// Implementations backed by external stores surface their read failures here.
    fn resolve(&self, extension: &str, key: &str) -> Result<Option<ClassId>, NamespaceError>;

    /// Whether `class` is on the deny-list.
    fn is_blocked(&self, class: ClassId) -> bool;

    /// The global "hide extensions for known file types" preference.
    fn hide_known_extensions(&self) -> bool;

    /// Whether the type registered for `extension` always hides its extension.
    fn never_show_extension(&self, extension: &str) -> bool;
}

/// Resolve the handler class for the file `name` under `key`.
///
/// Returns `Ok(None)` when the name has no extension or nothing is registered.
///
/// # Errors
///
/// [`NamespaceError::AccessDenied`] if the resolved class is blocked; registry failures propagate.
pub fn class_for_file_type(
    registry: &dyn TypeRegistry,
    name: &str,
    key: &str,
) -> Result<Option<ClassId>, NamespaceError> {
    let extension = names::find_extension(name);
    if extension.is_empty() {
        return Ok(None);
    }
    match registry.resolve(extension, key)? {
        Some(class) if registry.is_blocked(class) => Err(NamespaceError::AccessDenied(class)),
        resolved => Ok(resolved),
    }
}

/// Whether display names should omit the extension of `name`.
#[must_use]
pub fn hides_extension(registry: &dyn TypeRegistry, name: &str) -> bool {
    if registry.hide_known_extensions() {
        return true;
    }
    let extension = names::find_extension(name);
    !extension.is_empty() && registry.never_show_extension(extension)
}

/// Associations registered for one extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileTypeEntry {
    /// The program identifier this extension belongs to.
    pub prog_id: Option<String>,
    /// Handler classes keyed by registry key.
    pub handlers: BTreeMap<String, ClassId>,
    /// Hide this extension even when the global preference shows extensions.
    pub never_show_extension: bool,
}

/// Associations registered for one program identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ProgIdEntry {
    /// Handler classes keyed by registry key.
    pub handlers: BTreeMap<String, ClassId>,
    /// Hide the extension of every file of this type.
    pub never_show_extension: bool,
}

/// An in-memory [`TypeRegistry`], typically loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StaticTypeRegistry {
    /// Hide extensions for every file type.
    pub hide_file_extensions: bool,
    /// Classes that may never be handed out.
    pub blocked_handlers: BTreeSet<ClassId>,
    /// Per-extension entries keyed by extension, dot included.
    pub file_types: BTreeMap<String, FileTypeEntry>,
    /// Per-program-identifier entries.
    pub prog_ids: BTreeMap<String, ProgIdEntry>,
}

fn lookup<'a, V>(map: &'a BTreeMap<String, V>, key: &str) -> Option<&'a V> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| names::eq_ignore_case(k, key))
            .map(|(_, v)| v)
    })
}

impl StaticTypeRegistry {
    /// An empty registry: nothing registered, extensions shown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global hide-extensions preference.
    #[must_use]
    pub fn with_hidden_extensions(mut self, hide: bool) -> Self {
        self.hide_file_extensions = hide;
        self
    }

    /// Register `class` under `key` directly on `extension`.
    #[must_use]
    pub fn with_handler(mut self, extension: &str, key: &str, class: ClassId) -> Self {
        self.file_types
            .entry(extension.to_owned())
            .or_default()
            .handlers
            .insert(key.to_owned(), class);
        self
    }

    /// Associate `extension` with `prog_id`.
    #[must_use]
    pub fn with_prog_id(mut self, extension: &str, prog_id: &str) -> Self {
        self.file_types
            .entry(extension.to_owned())
            .or_default()
            .prog_id = Some(prog_id.to_owned());
        self
    }

    /// Register `class` under `key` on `prog_id`.
    #[must_use]
    pub fn with_prog_id_handler(mut self, prog_id: &str, key: &str, class: ClassId) -> Self {
        self.prog_ids
            .entry(prog_id.to_owned())
            .or_default()
            .handlers
            .insert(key.to_owned(), class);
        self
    }

    /// Mark `prog_id` as always hiding its extension.
    #[must_use]
    pub fn with_never_show_extension(mut self, prog_id: &str) -> Self {
        self.prog_ids
            .entry(prog_id.to_owned())
            .or_default()
            .never_show_extension = true;
        self
    }

    /// Put `class` on the deny-list.
    #[must_use]
    pub fn with_blocked(mut self, class: ClassId) -> Self {
        self.blocked_handlers.insert(class);
        self
    }

    fn prog_id_entry(&self, extension: &str) -> Option<&ProgIdEntry> {
        let prog_id = lookup(&self.file_types, extension)?.prog_id.as_deref()?;
        lookup(&self.prog_ids, prog_id)
    }
}

impl TypeRegistry for StaticTypeRegistry {
    fn resolve(&self, extension: &str, key: &str) -> Result<Option<ClassId>, NamespaceError> {
        let direct = lookup(&self.file_types, extension).and_then(|e| lookup(&e.handlers, key));
        Ok(direct
            .or_else(|| self.prog_id_entry(extension).and_then(|p| lookup(&p.handlers, key)))
            .copied())
    }

    fn is_blocked(&self, class: ClassId) -> bool {
        self.blocked_handlers.contains(&class)
    }

    fn hide_known_extensions(&self) -> bool {
        self.hide_file_extensions
    }

    fn never_show_extension(&self, extension: &str) -> bool {
        lookup(&self.file_types, extension).is_some_and(|e| e.never_show_extension)
            || self.prog_id_entry(extension).is_some_and(|p| p.never_show_extension)
    }
}
