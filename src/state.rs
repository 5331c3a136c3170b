//! The console's in-memory view: the registry mirror, drafts, derived
//! results and in-flight operations.
//!
//! [`ConsoleViewState`] is plain data. The console owns it behind a
//! `Mutex` and patches it only after a remote call succeeds; readers get a
//! cloned snapshot.
//!
//! In-flight tracking is a set of [`InFlightKey`]s rather than one flag per
//! operation kind, so analysing document A never blocks analysing B.

use crate::model::{
    Analysis, Document, DocumentVersion, EntitySet, SearchFilters, SearchResult,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Remote operations that hold an in-flight key while outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Upload,
    Parse,
    Analyze,
    /// Both single-format and convert-all.
    Convert,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Upload => "upload",
            Operation::Parse => "parse",
            Operation::Analyze => "analysis",
            Operation::Convert => "conversion",
        })
    }
}

/// What an in-flight key is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Whole console (uploads: there is no document yet).
    Console,
    Document(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Console => f.write_str("this console"),
            Scope::Document(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InFlightKey {
    pub scope: Scope,
    pub operation: Operation,
}

/// Progress of a parse request for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseStatus {
    Pending,
    /// The backend accepted the request and reported success. `is_parsed`
    /// in the registry is authoritative only after the next refresh.
    Done,
    Failed(String),
}

/// The single in-progress rename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameDraft {
    pub filename: String,
    pub new_name: String,
}

/// The single version-note being edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDraft {
    pub filename: String,
    pub note: String,
}

/// Derived results for one document, each the latest of its kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedResults {
    pub analysis: Option<Analysis>,
    pub summary: Option<String>,
    pub entities: Option<EntitySet>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    pub filters: SearchFilters,
    pub results: Vec<SearchResult>,
}

/// Everything the console shows.
#[derive(Debug, Clone, Default)]
pub struct ConsoleViewState {
    /// Mirror of the registry, in backend order.
    pub documents: Vec<Document>,
    pub tags: Vec<String>,
    pub search: SearchState,
    pub selected: Option<String>,
    pub rename: Option<RenameDraft>,
    pub version_note: Option<VersionDraft>,
    /// Name of the file currently chosen for upload; cleared after every attempt.
    pub upload_selection: Option<String>,
    pub versions: HashMap<String, Vec<DocumentVersion>>,
    pub derived: HashMap<String, DerivedResults>,
    pub parse_jobs: HashMap<String, ParseStatus>,
    pub in_flight: HashSet<InFlightKey>,
}

impl ConsoleViewState {
    pub fn document(&self, filename: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.filename == filename)
    }

    pub fn derived_for(&self, filename: &str) -> Option<&DerivedResults> {
        self.derived.get(filename)
    }

    pub fn versions_for(&self, filename: &str) -> &[DocumentVersion] {
        self.versions.get(filename).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_in_flight(&self, scope: &Scope, operation: Operation) -> bool {
        self.in_flight.contains(&InFlightKey {
            scope: scope.clone(),
            operation,
        })
    }

    /// Whether `operation` is outstanding for document `filename`.
    pub fn is_busy(&self, filename: &str, operation: Operation) -> bool {
        self.is_in_flight(&Scope::Document(filename.to_string()), operation)
    }

    pub fn is_uploading(&self) -> bool {
        self.is_in_flight(&Scope::Console, Operation::Upload)
    }

    /// Drop everything held for a document that no longer exists.
    pub(crate) fn forget(&mut self, filename: &str) {
        self.derived.remove(filename);
        self.versions.remove(filename);
        self.parse_jobs.remove(filename);
        if self.selected.as_deref() == Some(filename) {
            self.selected = None;
        }
        if self.rename.as_ref().is_some_and(|r| r.filename == filename) {
            self.rename = None;
        }
        if self
            .version_note
            .as_ref()
            .is_some_and(|v| v.filename == filename)
        {
            self.version_note = None;
        }
    }
}

/// Shared handle to the view state.
pub(crate) type SharedState = Arc<Mutex<ConsoleViewState>>;

/// Lock the state, recovering from poisoning: the state is plain data and
/// every writer leaves it consistent between statements.
pub(crate) fn lock(state: &SharedState) -> MutexGuard<'_, ConsoleViewState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Holds an in-flight key; releases it on drop.
#[derive(Debug)]
pub(crate) struct InFlightGuard {
    state: SharedState,
    key: InFlightKey,
}

impl InFlightGuard {
    /// Claim `key`, or `None` if it is already held.
    pub(crate) fn acquire(state: &SharedState, key: InFlightKey) -> Option<Self> {
        let inserted = lock(state).in_flight.insert(key.clone());
        inserted.then(|| Self {
            state: Arc::clone(state),
            key,
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.state).in_flight.remove(&self.key);
    }
}
