//! Per-directory descriptor files that override how a folder is presented.
//!
//! A directory marked system or read-only may carry a small INI-style descriptor naming the class
//! that should own it and an icon to show for it. Reading it is best effort: any failure simply
//! means "no override".

use std::path::Path;

use tracing::{debug, warn};

use crate::fs::Filesystem;
use crate::names::eq_ignore_case;
use crate::registry::ClassId;

/// Section holding shell presentation overrides.
pub const SHELL_CLASS_INFO: &str = ".ShellClassInfo";

/// Default descriptor file name.
pub const DEFAULT_OVERRIDE_FILE: &str = "desktop.ini";

/// An icon taken from a resource file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconLocation {
    /// File holding the icon, as written in the descriptor.
    pub file: String,
    /// Index of the icon within `file`.
    pub index: i32,
}

/// Source of per-directory overrides.
pub trait DirectoryOverrides: Send + Sync {
    /// The class that should own `dir`, if the directory names one.
    fn folder_class(&self, fs: &dyn Filesystem, dir: &Path) -> Option<ClassId>;

    /// The icon `dir` asks to be shown with, if any.
    fn folder_icon(&self, fs: &dyn Filesystem, dir: &Path) -> Option<IconLocation>;
}

/// A parsed `[section]` / `key = value` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorFile {
    entries: Vec<(String, String, String)>,
}

impl DescriptorFile {
    /// Parse descriptor text. Lines outside any section, blank lines and `;`/`#` comments are
    /// ignored. Lines without `=` are skipped.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();
        let mut section: Option<&str> = None;
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = Some(name.trim());
                continue;
            }
            let (Some(section), Some((key, value))) = (section, line.split_once('=')) else {
                continue;
            };
            entries.push((
                section.to_owned(),
                key.trim().to_owned(),
                value.trim().to_owned(),
            ));
        }
        Self { entries }
    }

    /// The first value of `key` in `section`, both matched case-insensitively.
    #[must_use]
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, k, _)| eq_ignore_case(s, section) && eq_ignore_case(k, key))
            .map(|(_, _, v)| v.as_str())
    }
}

/// Reads overrides from a named descriptor file inside each directory.
#[derive(Debug, Clone)]
pub struct IniOverrides {
    file_name: String,
}

impl Default for IniOverrides {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_FILE)
    }
}

impl IniOverrides {
    /// Read descriptors called `file_name`.
    #[must_use]
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
        }
    }

    /// The descriptor file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    fn load(&self, fs: &dyn Filesystem, dir: &Path) -> Option<DescriptorFile> {
        let path = dir.join(&self.file_name);
        match fs.read_to_string(&path) {
            Ok(text) => Some(DescriptorFile::parse(&text)),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "no readable override descriptor");
                None
            }
        }
    }
}

impl DirectoryOverrides for IniOverrides {
    fn folder_class(&self, fs: &dyn Filesystem, dir: &Path) -> Option<ClassId> {
        let descriptor = self.load(fs, dir)?;
        ["CLSID", "CLSID2"].into_iter().find_map(|key| {
            let raw = descriptor.get(SHELL_CLASS_INFO, key)?;
            raw.parse::<ClassId>()
                .inspect_err(|e| {
                    warn!(
                        dir = %dir.display(),
                        key,
                        value = raw,
                        error = %e,
                        "ignoring malformed class id in override descriptor"
                    );
                })
                .ok()
        })
    }

    fn folder_icon(&self, fs: &dyn Filesystem, dir: &Path) -> Option<IconLocation> {
        let descriptor = self.load(fs, dir)?;
        let file = descriptor.get(SHELL_CLASS_INFO, "IconFile")?;
        let index = descriptor
            .get(SHELL_CLASS_INFO, "IconIndex")
            .and_then(|i| i.parse().ok())
            .unwrap_or(0);
        Some(IconLocation {
            file: file.to_owned(),
            index,
        })
    }
}

/// Overrides that never override anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOverrides;

impl DirectoryOverrides for NoOverrides {
    fn folder_class(&self, _fs: &dyn Filesystem, _dir: &Path) -> Option<ClassId> {
        None
    }

    fn folder_icon(&self, _fs: &dyn Filesystem, _dir: &Path) -> Option<IconLocation> {
        None
    }
}
