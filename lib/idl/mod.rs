//! Identifiers and identifier lists.
//!
//! An [`ItemId`] encodes one path segment together with the metadata observed when it was
//! minted. An [`ItemIdList`] chains them from the namespace root down to a leaf.

/// Packed DOS timestamps.
pub mod dos_time;
/// The single-segment codec.
pub mod item;
/// Root-to-leaf sequences.
pub mod list;

pub use dos_time::DosDateTime;
pub use item::{FsEntry, ItemData, ItemId, ItemKind};
pub use list::ItemIdList;
