//! Snapshot listings of a directory's children.
use std::path::Path;

use tracing::debug;

use crate::error::NamespaceError;
use crate::fs::Filesystem;
use crate::idl::ItemId;

use super::ContentMask;

/// The children of one directory as they were at construction time.
///
/// Later changes to the directory are not reflected. Iterating yields owned clones, so the
/// enumerator can be [`reset`](Self::reset) and walked again.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEnumerator {
    items: Vec<ItemId>,
    cursor: usize,
}

impl DirectoryEnumerator {
    /// List `dir` once, keeping entries selected by `mask` in scan order.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] for an empty path. Any I/O error during the scan fails
    /// the whole listing; partial results are discarded.
    pub fn scan(fs: &dyn Filesystem, dir: &Path, mask: ContentMask) -> Result<Self, NamespaceError> {
        if dir.as_os_str().is_empty() {
            return Err(NamespaceError::invalid("cannot enumerate an empty path"));
        }
        let context = || format!("listing {}", dir.display());

        let mut items = Vec::new();
        for record in fs
            .scan_dir(dir)
            .map_err(|e| NamespaceError::from_io(context(), e))?
        {
            let record = record.map_err(|e| NamespaceError::from_io(context(), e))?;
            if record.is_hidden() && !mask.contains(ContentMask::INCLUDE_HIDDEN) {
                continue;
            }
            let wanted = if record.is_dir() {
                mask.contains(ContentMask::FOLDERS) && record.name != "." && record.name != ".."
            } else {
                mask.contains(ContentMask::NON_FOLDERS)
            };
            if wanted {
                items.push(ItemId::from_file_record(&record)?);
            }
        }

        debug!(dir = %dir.display(), ?mask, count = items.len(), "enumerated directory");
        Ok(Self::from_items(items))
    }

    /// An enumerator over a precomputed list.
    #[must_use]
    pub fn from_items(items: Vec<ItemId>) -> Self {
        Self { items, cursor: 0 }
    }

    /// Advance past `n` items. Returns `true` only if all `n` were available.
    pub fn skip_items(&mut self, n: usize) -> bool {
        let available = self.remaining();
        self.cursor += n.min(available);
        n <= available
    }

    /// Rewind to the first item.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Items not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    /// Every item in the snapshot, regardless of the cursor.
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Consume the enumerator, keeping the whole snapshot.
    #[must_use]
    pub fn into_items(self) -> Vec<ItemId> {
        self.items
    }
}

impl Iterator for DirectoryEnumerator {
    type Item = ItemId;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining(), Some(self.remaining()))
    }
}

impl ExactSizeIterator for DirectoryEnumerator {}
