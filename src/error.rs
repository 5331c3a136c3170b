//! Error types for the doc-console library.
//!
//! Failures fall into four categories, exposed through [`ErrorKind`]:
//!
//! * **Validation**: a local precondition failed (wrong extension, empty
//!   rename target). No request was sent.
//! * **Busy**: the same operation is already in flight for the same
//!   document. No request was sent.
//! * **Network**: the request never produced an HTTP response.
//! * **Backend**: the backend answered with a non-2xx status or a body that
//!   could not be decoded.
//!
//! The console patches view data only after a successful response, so an
//! error leaves the mirror, results and drafts in
//! [`crate::state::ConsoleViewState`] as they were. Request bookkeeping
//! (in-flight keys, upload selection, parse jobs) is settled either way.

use crate::state::Operation;
use std::path::PathBuf;
use thiserror::Error;

/// Category of a [`ConsoleError`], for callers that branch on failure type
/// rather than on the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Busy,
    Network,
    Backend,
}

/// A local precondition failure. Always raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Upload candidate does not carry the accepted extension.
    #[error("'{name}' is not accepted: only {expected} files can be uploaded")]
    UnsupportedExtension { name: String, expected: String },

    /// Rename target is empty after trimming.
    #[error("New file name must not be empty")]
    EmptyName,

    /// Metadata patch with no field set.
    #[error("Metadata patch sets no field")]
    EmptyPatch,

    /// Conversion format the backend does not support.
    #[error("Unsupported conversion format '{0}' (expected markdown, latex, csv or jsonld)")]
    InvalidFormat(String),
}

/// All errors returned by console operations and the HTTP backend.
#[derive(Debug, Error)]
pub enum ConsoleError {
    // ── Local ─────────────────────────────────────────────────────────────
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The operation is already outstanding for this scope.
    #[error("{operation} already in progress for {scope}")]
    Busy { scope: String, operation: Operation },

    // ── Remote ────────────────────────────────────────────────────────────
    /// Transport failure: connection refused, DNS, timeout.
    #[error("Request to {endpoint} failed: {reason}\nCheck that the document service is running.")]
    Network { endpoint: String, reason: String },

    /// Backend returned a non-success status.
    #[error("{endpoint} returned HTTP {status}: {detail}")]
    Backend {
        endpoint: String,
        status: u16,
        detail: String,
    },

    /// 2xx response whose body did not match the expected shape.
    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    // ── I/O & config ──────────────────────────────────────────────────────
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ConsoleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ConsoleError::Validation(_) | ConsoleError::InvalidConfig(_) => ErrorKind::Validation,
            ConsoleError::Busy { .. } => ErrorKind::Busy,
            ConsoleError::Network { .. } | ConsoleError::Io { .. } => ErrorKind::Network,
            ConsoleError::Backend { .. } | ConsoleError::InvalidResponse { .. } => {
                ErrorKind::Backend
            }
        }
    }

    /// HTTP status for backend errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            ConsoleError::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Map a reqwest transport error for `endpoint`.
    pub(crate) fn network(endpoint: &str, err: &reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "timed out".to_string()
        } else if err.is_connect() {
            format!("connection failed ({err})")
        } else {
            err.to_string()
        };
        ConsoleError::Network {
            endpoint: endpoint.to_string(),
            reason,
        }
    }
}
