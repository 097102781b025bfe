//! Ordered identifier sequences, root to leaf.
use std::fmt;

use crate::error::NamespaceError;

use super::item::ItemId;

/// An owned path of identifiers.
///
/// The empty list is the namespace root itself. Equality is byte-wise across every segment.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemIdList {
    ids: Vec<ItemId>,
}

impl ItemIdList {
    /// The empty list, denoting the namespace root.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A simple list holding one identifier.
    #[must_use]
    pub fn from_id(id: ItemId) -> Self {
        Self { ids: vec![id] }
    }

    /// Decode a serialized list.
    ///
    /// The input is a concatenation of identifiers followed by a two-byte zero terminator.
    ///
    /// # Errors
    ///
    /// [`NamespaceError::InvalidArgument`] on a missing terminator, trailing data or a malformed
    /// identifier.
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, NamespaceError> {
        let mut ids = Vec::new();
        loop {
            match bytes {
                [0, 0] => return Ok(Self { ids }),
                [0, 0, ..] => {
                    return Err(NamespaceError::invalid(format!(
                        "{} bytes after list terminator",
                        bytes.len() - 2
                    )));
                }
                [] | [_] => return Err(NamespaceError::invalid("missing list terminator")),
                _ => {
                    let (id, rest) = ItemId::read_prefix(bytes)?;
                    ids.push(id);
                    bytes = rest;
                }
            }
        }
    }

    /// Serialize, including the terminator.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.ids.iter().map(|id| id.as_bytes().len()).sum::<usize>() + 2;
        let mut out = Vec::with_capacity(len);
        for id in &self.ids {
            out.extend_from_slice(id.as_bytes());
        }
        out.extend_from_slice(&[0, 0]);
        out
    }

    /// Push `id` as the new leaf.
    pub fn append(&mut self, id: ItemId) {
        self.ids.push(id);
    }

    /// A copy of this list with `id` as the new leaf.
    #[must_use]
    pub fn appended(&self, id: ItemId) -> Self {
        let mut out = self.clone();
        out.append(id);
        out
    }

    /// Append every segment of `other`, in order.
    pub fn extend_from(&mut self, other: &Self) {
        self.ids.extend(other.ids.iter().cloned());
    }

    /// This list followed by `other`.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.extend_from(other);
        out
    }

    /// Drop the leaf. Returns `false` if the list was already empty.
    pub fn remove_last(&mut self) -> bool {
        self.ids.pop().is_some()
    }

    /// Whether this is the root sentinel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether this list names a direct child: exactly one segment.
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.ids.len() == 1
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// The segment nearest the root.
    #[must_use]
    pub fn first(&self) -> Option<&ItemId> {
        self.ids.first()
    }

    /// The leaf segment, borrowed.
    #[must_use]
    pub fn last(&self) -> Option<&ItemId> {
        self.ids.last()
    }

    /// The first segment and everything after it.
    #[must_use]
    pub fn split_first(&self) -> Option<(&ItemId, Self)> {
        let (first, rest) = self.ids.split_first()?;
        Some((first, Self::from(rest)))
    }

    /// Iterate root to leaf.
    pub fn iter(&self) -> std::slice::Iter<'_, ItemId> {
        self.ids.iter()
    }

    /// The segments as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[ItemId] {
        &self.ids
    }
}

impl From<&[ItemId]> for ItemIdList {
    fn from(ids: &[ItemId]) -> Self {
        Self { ids: ids.to_vec() }
    }
}

impl From<ItemId> for ItemIdList {
    fn from(id: ItemId) -> Self {
        Self::from_id(id)
    }
}

impl FromIterator<ItemId> for ItemIdList {
    fn from_iter<T: IntoIterator<Item = ItemId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ItemIdList {
    type Item = &'a ItemId;
    type IntoIter = std::slice::Iter<'a, ItemId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

impl fmt::Debug for ItemIdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.ids).finish()
    }
}
