//! Sort columns and the ordering of filesystem identifiers.
use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::error::NamespaceError;
use crate::idl::{ItemId, ItemIdList};
use crate::names::{cmp_ignore_case, find_extension};

use super::{NamespaceFolder, attributes_text};

/// A detail column items can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortColumn {
    /// Name, case-insensitive.
    #[default]
    Name = 0,
    /// Comment. No comment source exists, so every pair ties.
    Comment = 1,
    /// File type, by extension.
    Type = 2,
    /// Size in bytes.
    Size = 3,
    /// Last write time.
    Modified = 4,
    /// Raw attributes, as detail text.
    Attributes = 5,
}

impl SortColumn {
    /// Every column, in index order.
    pub const ALL: [Self; 6] = [
        Self::Name,
        Self::Comment,
        Self::Type,
        Self::Size,
        Self::Modified,
        Self::Attributes,
    ];

    /// The column heading.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Comment => "Comments",
            Self::Type => "Type",
            Self::Size => "Size",
            Self::Modified => "Modified",
            Self::Attributes => "Attributes",
        }
    }

    /// The raw column index.
    #[must_use]
    pub fn index(self) -> u16 {
        self as u16
    }
}

impl TryFrom<u16> for SortColumn {
    type Error = NamespaceError;

    fn try_from(index: u16) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(index))
            .copied()
            .ok_or_else(|| NamespaceError::invalid(format!("no sort column with index {index}")))
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Order two filesystem identifier lists by their first segments.
///
/// Folders always precede non-folders. A tie on any column but
/// [`Attributes`](SortColumn::Attributes) falls through to [`compare_children`].
pub(crate) fn compare_fs(
    folder: &dyn NamespaceFolder,
    column: SortColumn,
    a: &ItemIdList,
    b: &ItemIdList,
) -> Result<Ordering, NamespaceError> {
    let (Some((head_a, rest_a)), Some((head_b, rest_b))) = (a.split_first(), b.split_first())
    else {
        return Err(NamespaceError::invalid("cannot compare an empty identifier list"));
    };
    let (Some(ea), Some(eb)) = (head_a.fs_entry(), head_b.fs_entry()) else {
        return Err(NamespaceError::invalid(
            "cannot compare identifiers of another provider",
        ));
    };

    if ea.is_folder != eb.is_folder {
        return Ok(if ea.is_folder {
            Ordering::Less
        } else {
            Ordering::Greater
        });
    }

    let ord = match column {
        SortColumn::Name => cmp_ignore_case(ea.name, eb.name),
        SortColumn::Comment => Ordering::Equal,
        SortColumn::Type => cmp_ignore_case(find_extension(ea.name), find_extension(eb.name)),
        SortColumn::Size => ea.size.cmp(&eb.size),
        SortColumn::Modified => ea.modified.cmp(&eb.modified),
        SortColumn::Attributes => {
            return Ok(cmp_ignore_case(
                &attributes_text(ea.attributes),
                &attributes_text(eb.attributes),
            ));
        }
    };
    if ord != Ordering::Equal {
        return Ok(ord);
    }
    compare_children(folder, column, head_a, &rest_a, &rest_b)
}

/// Break a tie between two lists whose first segments compared equal.
///
/// A shorter list sorts first. Otherwise the remainders are compared by the folder `head` binds
/// to; if that bind fails the items are considered equal.
///
/// # Errors
///
/// Whatever the child folder's comparison raises.
pub fn compare_children(
    folder: &dyn NamespaceFolder,
    column: SortColumn,
    head: &ItemId,
    rest_a: &ItemIdList,
    rest_b: &ItemIdList,
) -> Result<Ordering, NamespaceError> {
    match (rest_a.is_empty(), rest_b.is_empty()) {
        (true, true) => Ok(Ordering::Equal),
        (true, false) => Ok(Ordering::Less),
        (false, true) => Ok(Ordering::Greater),
        (false, false) => match folder.bind(&ItemIdList::from_id(head.clone())) {
            Ok(child) => child.compare(column.index(), rest_a, rest_b),
            Err(e) => {
                debug!(?head, error = %e, "cannot bind to break a sort tie");
                Ok(Ordering::Equal)
            }
        },
    }
}
