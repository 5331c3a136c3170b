//! The document lifecycle console.
//!
//! [`DocumentConsole`] sequences remote operations against a
//! [`DocumentBackend`] and keeps one [`ConsoleViewState`] consistent with the
//! results. Each submodule adds one group of operations:
//!
//! ```text
//! registry    refresh, refresh_tags, load
//! upload      upload
//! search      search, simple_search, reset_search
//! lifecycle   trigger_parse, delete, rename, update_metadata, download_raw, open_document
//! versioning  list_versions, create_version
//! analysis    analyze, summary, extract_entities
//! conversion  convert_one, convert_all
//! ```
//!
//! Every operation follows the same rules:
//!
//! 1. Local preconditions are checked first; a violation returns
//!    [`ConsoleError::Validation`] or [`ConsoleError::Busy`] without a request.
//! 2. View data is patched only after the backend answers successfully;
//!    in-flight keys and job records track the request itself.
//! 3. Mutating operations re-list the registry afterwards.
//! 4. A failure emits one error [`Notice`] and returns the typed error.
//!
//! Methods take `&self`; operations on different documents can run
//! concurrently on one console.

mod analysis;
mod conversion;
mod lifecycle;
mod registry;
mod search;
mod upload;
mod versioning;

pub use lifecycle::DeleteOutcome;

use crate::backend::{DocumentBackend, HttpBackend};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ErrorKind};
use crate::events::{AutoConfirm, ConfirmHandle, EventsHandle, Notice, NoopEvents};
use crate::state::{self, ConsoleViewState, InFlightGuard, InFlightKey, Operation, Scope, SharedState};
use std::fmt;
use std::sync::{Arc, MutexGuard};
use tracing::warn;

/// Client-side console over one document service.
pub struct DocumentConsole {
    backend: Arc<dyn DocumentBackend>,
    config: ConsoleConfig,
    state: SharedState,
    events: EventsHandle,
    confirm: ConfirmHandle,
}

impl fmt::Debug for DocumentConsole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentConsole")
            .field("backend", &"<dyn DocumentBackend>")
            .field("config", &self.config)
            .field("events", &"<dyn ConsoleEvents>")
            .field("confirm", &"<dyn Confirm>")
            .finish()
    }
}

impl DocumentConsole {
    /// Console over `backend`. Events are discarded and deletes are declined
    /// until [`with_events`](Self::with_events) / [`with_confirm`](Self::with_confirm)
    /// say otherwise.
    pub fn new(backend: Arc<dyn DocumentBackend>, config: ConsoleConfig) -> Self {
        Self {
            backend,
            config,
            state: SharedState::default(),
            events: Arc::new(NoopEvents),
            confirm: Arc::new(AutoConfirm(false)),
        }
    }

    /// Console talking HTTP to the service described by `config`.
    pub fn connect(config: ConsoleConfig) -> Result<Self, ConsoleError> {
        let backend = HttpBackend::new(&config)?;
        Ok(Self::new(Arc::new(backend), config))
    }

    pub fn with_events(mut self, events: EventsHandle) -> Self {
        self.events = events;
        self
    }

    pub fn with_confirm(mut self, confirm: ConfirmHandle) -> Self {
        self.confirm = confirm;
        self
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// A copy of the current view.
    pub fn snapshot(&self) -> ConsoleViewState {
        self.view().clone()
    }

    /// Select a document; selection drives which drafts the host shows.
    pub fn select(&self, filename: Option<&str>) {
        self.view().selected = filename.map(str::to_string);
    }

    // ── Internal helpers ─────────────────────────────────────────────────

    fn view(&self) -> MutexGuard<'_, ConsoleViewState> {
        state::lock(&self.state)
    }

    fn notify(&self, notice: Notice) {
        self.events.on_notice(&notice);
    }

    /// Claim the in-flight key for `operation` on `scope`.
    fn claim(&self, scope: Scope, operation: Operation) -> Result<InFlightGuard, ConsoleError> {
        let label = scope.to_string();
        InFlightGuard::acquire(&self.state, InFlightKey { scope, operation }).ok_or_else(|| {
            ConsoleError::Busy {
                scope: label,
                operation,
            }
        })
    }

    fn claim_document(
        &self,
        filename: &str,
        operation: Operation,
    ) -> Result<InFlightGuard, ConsoleError> {
        self.claim(Scope::Document(filename.to_string()), operation)
    }

    /// Emit the error notice for a failed operation and hand the error back.
    ///
    /// `Busy` rejections are silent: the host already shows the affordance
    /// as disabled.
    fn fail(&self, what: &str, err: ConsoleError) -> ConsoleError {
        if err.kind() != ErrorKind::Busy {
            warn!(error = %err, "{what}");
            self.notify(Notice::error(format!("{what}: {err}")));
        }
        err
    }

    /// Re-list after a successful mutation. A failed refresh already emitted
    /// its own notice and keeps the previous mirror; the mutation itself
    /// still succeeded.
    async fn resync(&self) {
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "Registry refresh after mutation failed");
        }
    }
}
