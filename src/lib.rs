//! # doc-console
//!
//! Client-side console for a document-processing service: upload PDFs,
//! trigger parsing, search, manage versions, request analysis and convert
//! documents to other formats.
//!
//! ## Why a console?
//!
//! Every capability lives in the remote service. What the client owns is
//! coordination: each user action is a short sequence of remote calls that
//! can fail independently, and the view must stay consistent with the
//! service's registry whatever happens. [`DocumentConsole`] does that
//! sequencing and keeps one [`ConsoleViewState`].
//!
//! ## Operation Flow
//!
//! ```text
//! action
//!  │
//!  ├─ 1. Validate   local preconditions, in-flight key (no request on failure)
//!  ├─ 2. Remote     one DocumentBackend call (two for single-format convert)
//!  ├─ 3. Patch      view state updated only after success
//!  ├─ 4. Resync     registry re-listed after mutating operations
//!  └─ 5. Notify     Notice / navigation / download via ConsoleEvents
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doc_console::{ConsoleConfig, ConvertFormat, DocumentConsole, UploadFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConsoleConfig::builder()
//!         .base_url("http://localhost:8008")
//!         .build()?;
//!     let console = DocumentConsole::connect(config)?;
//!
//!     console.upload(UploadFile::from_path("report.pdf").await?).await?;
//!     console.trigger_parse("report.pdf").await?;
//!     let md = console.convert_one("report.pdf", ConvertFormat::Markdown).await?;
//!     println!("{} ({} bytes)", md.filename, md.bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docctl` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod console;
pub mod error;
pub mod events;
pub mod model;
pub mod state;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{DocumentBackend, HttpBackend};
pub use config::ConsoleConfig;
pub use console::{DeleteOutcome, DocumentConsole};
pub use error::{ConsoleError, ErrorKind, ValidationError};
pub use events::{AutoConfirm, Confirm, ConsoleEvents, NoopEvents, Notice, NoticeLevel, Route};
pub use model::{
    Analysis, ConvertFormat, ConvertedFile, Document, DocumentVersion, Download, EntitySet,
    Keyword, MetadataPatch, ParsedDocument, SearchFilters, SearchQuery, SearchResult, UploadFile,
};
pub use state::{ConsoleViewState, DerivedResults, Operation, ParseStatus, Scope};
