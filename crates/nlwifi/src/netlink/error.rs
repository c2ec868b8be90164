//! Error types for nl80211 operations.
//!
//! Errors fall into four groups and the classification helpers below let a
//! caller tell them apart without matching every variant:
//!
//! - transport failures ([`Error::is_transport`]): the socket failed or the
//!   reply stream was unusable;
//! - protocol rejections ([`Error::is_rejection`]): the kernel answered with
//!   an errno, available through [`Error::errno`];
//! - malformed replies: a mandatory attribute is missing or ill-shaped;
//! - caller contract violations: rejected before anything is sent.

use std::io;

/// Result type for nl80211 operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error from socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[cfg(feature = "output")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Kernel returned an error code.
    #[error("kernel error: {message} (errno {errno})")]
    Kernel {
        /// The errno value from the kernel (positive).
        errno: i32,
        /// Human-readable error message.
        message: String,
    },

    /// Kernel error with operation context.
    #[error("{operation}: {message} (errno {errno})")]
    KernelWithContext {
        operation: String,
        errno: i32,
        message: String,
    },

    /// Message was truncated.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Invalid message framing.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The transport finished a request without producing a reply.
    #[error("no reply for {0}")]
    NoReply(String),

    /// A mandatory attribute is absent from a reply.
    #[error("missing attribute: {name}")]
    MissingAttribute {
        /// Kernel name of the attribute, e.g. `NL80211_ATTR_WIPHY_BANDS`.
        name: &'static str,
    },

    /// An attribute is present but has the wrong length or shape.
    #[error("invalid attribute: {0}")]
    InvalidAttribute(String),

    /// Scan type outside the accepted set.
    #[error("invalid scan type: {0}")]
    InvalidScanType(i32),

    /// Caller passed arguments the kernel would never accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Generic netlink family is not registered (driver not loaded).
    #[error("generic netlink family not found: {name}")]
    FamilyNotFound { name: String },

    /// The kernel reported no wireless radio.
    #[error("no wiphy found")]
    NoWiphy,

    /// No usable interface on the requested radio.
    #[error("interface not found: {name}")]
    InterfaceNotFound { name: String },

    /// Scan settings transfer object could not be decoded.
    #[error("parcel error: {0}")]
    Parcel(String),
}

impl Error {
    /// Create a kernel error from a (negative) netlink errno value.
    pub fn from_errno(errno: i32) -> Self {
        let message = io::Error::from_raw_os_error(-errno).to_string();
        Self::Kernel {
            errno: -errno,
            message,
        }
    }

    /// Add context to this error.
    ///
    /// Wraps kernel errors with operation context. Other errors are returned unchanged.
    pub fn with_context(self, operation: impl Into<String>) -> Self {
        match self {
            Self::Kernel { errno, message } => Self::KernelWithContext {
                operation: operation.into(),
                errno,
                message,
            },
            other => other,
        }
    }

    /// Get the errno value if the kernel rejected the request.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::Kernel { errno, .. } | Self::KernelWithContext { errno, .. } => Some(*errno),
            _ => None,
        }
    }

    /// The kernel answered with an explicit error code.
    pub fn is_rejection(&self) -> bool {
        self.errno().is_some()
    }

    /// The request never got a usable answer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::Truncated { .. } | Self::InvalidMessage(_) | Self::NoReply(_)
        )
    }

    /// The reply arrived but did not have the expected attribute tree.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MissingAttribute { .. } | Self::InvalidAttribute(_)
        )
    }

    /// Rejected locally before a request was built.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidScanType(_) | Self::InvalidArgument(_))
    }

    /// Check if this is a "not found" error (ENOENT, ENODEV, etc.).
    pub fn is_not_found(&self) -> bool {
        match self.errno() {
            Some(errno) => matches!(errno, libc::ENOENT | libc::ENODEV),
            None => matches!(
                self,
                Self::FamilyNotFound { .. } | Self::NoWiphy | Self::InterfaceNotFound { .. }
            ),
        }
    }

    /// Check if this is a "device busy" error (EBUSY), e.g. a scan in progress.
    pub fn is_busy(&self) -> bool {
        self.errno() == Some(libc::EBUSY)
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM | libc::EACCES))
    }
}
