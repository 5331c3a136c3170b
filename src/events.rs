//! Outward channel of the console: notices, navigation and downloads.
//!
//! Inject an [`Arc<dyn ConsoleEvents>`] via
//! [`crate::console::DocumentConsole::with_events`] to receive events as the
//! console finishes each operation. A terminal front-end prints notices and
//! writes downloads to disk; a test records them.
//!
//! # Example
//!
//! ```rust
//! use doc_console::{ConsoleEvents, Notice};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingErrors {
//!     errors: Arc<AtomicUsize>,
//! }
//!
//! impl ConsoleEvents for CountingErrors {
//!     fn on_notice(&self, notice: &Notice) {
//!         if notice.is_error() {
//!             self.errors.fetch_add(1, Ordering::SeqCst);
//!         }
//!     }
//! }
//! ```

use crate::model::Download;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A transient, human-readable message about one finished operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// A view the console asks its host to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The standalone viewer for one parsed document.
    Document(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Document(name) => format!("/document/{name}"),
        }
    }
}

/// Receives console events.
///
/// Implementations must be `Send + Sync`: console operations may run
/// concurrently on different tasks. All methods default to no-ops.
pub trait ConsoleEvents: Send + Sync {
    fn on_notice(&self, notice: &Notice) {
        let _ = notice;
    }

    fn on_navigate(&self, route: &Route) {
        let _ = route;
    }

    /// A payload is ready to be saved (converted file, archive, raw download).
    fn on_download(&self, download: &Download) {
        let _ = download;
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl ConsoleEvents for NoopEvents {}

/// Blocking yes/no prompt shown before irreversible operations.
pub trait Confirm: Send + Sync {
    fn confirm(&self, message: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, message: &str) -> bool {
        self(message)
    }
}

/// Answers every prompt the same way.
#[derive(Debug, Clone, Copy)]
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, _message: &str) -> bool {
        self.0
    }
}

pub type EventsHandle = Arc<dyn ConsoleEvents>;
pub type ConfirmHandle = Arc<dyn Confirm>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_path() {
        assert_eq!(
            Route::Document("report.pdf".into()).path(),
            "/document/report.pdf"
        );
    }

    #[test]
    fn closures_confirm() {
        let deny = |_: &str| false;
        assert!(!deny.confirm("delete?"));
        assert!(AutoConfirm(true).confirm("delete?"));
    }

    #[test]
    fn notice_levels() {
        assert!(Notice::error("x").is_error());
        assert!(!Notice::success("x").is_error());
        assert_eq!(Notice::success("done").to_string(), "done");
    }
}
