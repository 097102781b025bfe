//! Error taxonomy shared by every namespace operation.

use std::io;

use thiserror::Error;

use crate::registry::ClassId;

/// Errors surfaced by identifier decoding and namespace folder operations.
///
/// Best-effort probes (the has-subfolder check, override descriptor reads) never produce one of
/// these; they degrade to "feature absent" instead.
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// Malformed or missing input, or an out-of-range column index.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A path or a type-registry entry does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The resolved handler class is on the deny-list.
    #[error("handler {0} is blocked")]
    AccessDenied(ClassId),

    /// An allocation could not be satisfied.
    #[error("out of memory")]
    OutOfMemory,

    /// The operation is explicitly unsupported.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),

    /// An underlying filesystem call failed.
    ///
    /// Carries the OS-reported reason when the host provided one.
    #[error("{context}")]
    OperationFailed {
        /// What was being attempted.
        context: String,
        /// The OS error, if any.
        #[source]
        source: Option<io::Error>,
    },
}

impl NamespaceError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn failed(context: impl Into<String>) -> Self {
        Self::OperationFailed {
            context: context.into(),
            source: None,
        }
    }

    /// Classify an I/O error raised while doing `context`.
    pub(crate) fn from_io(context: impl Into<String>, err: io::Error) -> Self {
        let context = context.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::NotFound(context),
            io::ErrorKind::OutOfMemory => Self::OutOfMemory,
            _ => Self::OperationFailed {
                context,
                source: Some(err),
            },
        }
    }

    /// The closest POSIX errno for this error.
    ///
    /// An OS-reported code wins over the taxonomy default.
    #[must_use]
    pub fn raw_os_error(&self) -> i32 {
        match self {
            Self::InvalidArgument(_) => libc::EINVAL,
            Self::NotFound(_) => libc::ENOENT,
            Self::AccessDenied(_) => libc::EACCES,
            Self::OutOfMemory => libc::ENOMEM,
            Self::NotImplemented(_) => libc::ENOSYS,
            Self::OperationFailed { source, .. } => source
                .as_ref()
                .and_then(io::Error::raw_os_error)
                .unwrap_or(libc::EIO),
        }
    }
}

impl From<NamespaceError> for i32 {
    fn from(e: NamespaceError) -> Self {
        e.raw_os_error()
    }
}
