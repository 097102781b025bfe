//! fs-namespace shared library.
//!
//! Projects a directory tree into a namespace of opaque, hierarchical item identifiers.

/// Error taxonomy for namespace operations.
pub mod error;
/// The filesystem collaborator and its host implementation.
pub mod fs;
/// Item identifiers and identifier lists.
pub mod idl;
pub mod names;
/// Namespace folders, enumeration, comparison and capabilities.
pub mod namespace;
pub mod notify;
pub mod overrides;
/// Handler classes and file-type associations.
pub mod registry;

pub use error::NamespaceError;
