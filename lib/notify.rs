//! Change notifications raised by namespace mutations.
use std::path::PathBuf;

use tracing::info;

/// What kind of item changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// A folder was renamed.
    RenameFolder,
    /// A non-folder item was renamed.
    RenameItem,
}

/// A completed change, with full paths on both sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Folder or item rename.
    pub kind: ChangeKind,
    /// Path before the change.
    pub from: PathBuf,
    /// Path after the change.
    pub to: PathBuf,
}

/// Receives change events. Delivery is fire-and-forget.
pub trait ChangeNotifier: Send + Sync {
    /// Deliver `event`.
    fn notify(&self, event: &ChangeEvent);
}

/// Emits every event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl ChangeNotifier for TracingNotifier {
    fn notify(&self, event: &ChangeEvent) {
        info!(
            kind = ?event.kind,
            from = %event.from.display(),
            to = %event.to.display(),
            "namespace item renamed"
        );
    }
}
