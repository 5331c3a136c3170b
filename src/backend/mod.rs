//! The remote document service, one method per endpoint.
//!
//! ```text
//! console ──▶ DocumentBackend ──▶ HttpBackend ──▶ reqwest ──▶ document service
//!                            └──▶ (test fakes)
//! ```
//!
//! The console depends only on the [`DocumentBackend`] trait, so tests can
//! drive every coordination path against an in-memory backend while
//! [`HttpBackend`] owns the wire format.

pub mod http;

pub use http::HttpBackend;

use crate::error::ConsoleError;
use crate::model::{
    Analysis, ConvertFormat, ConvertReceipt, ConvertedPayload, Document, DocumentVersion,
    EntitySet, MetadataPatch, ParseReceipt, ParsedDocument, SearchQuery, SearchResult,
    UploadFile, VersionReceipt,
};
use async_trait::async_trait;

/// Every remote capability the console uses.
///
/// Each method issues exactly one request. Implementations map transport
/// failures to [`ConsoleError::Network`] and non-2xx answers to
/// [`ConsoleError::Backend`].
#[async_trait]
pub trait DocumentBackend: Send + Sync {
    // ── Registry ──────────────────────────────────────────────────────────
    async fn list_documents(&self) -> Result<Vec<Document>, ConsoleError>;
    async fn list_tags(&self) -> Result<Vec<String>, ConsoleError>;

    // ── Lifecycle ─────────────────────────────────────────────────────────
    async fn upload(&self, file: &UploadFile) -> Result<(), ConsoleError>;
    async fn parse(&self, filename: &str) -> Result<ParseReceipt, ConsoleError>;
    async fn delete(&self, filename: &str) -> Result<(), ConsoleError>;
    async fn rename(&self, filename: &str, new_filename: &str) -> Result<(), ConsoleError>;
    async fn update_metadata(
        &self,
        filename: &str,
        patch: &MetadataPatch,
    ) -> Result<(), ConsoleError>;
    async fn download_raw(&self, filename: &str) -> Result<Vec<u8>, ConsoleError>;
    async fn fetch_document(&self, filename: &str) -> Result<ParsedDocument, ConsoleError>;

    // ── Search ────────────────────────────────────────────────────────────
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ConsoleError>;

    // ── Versions ──────────────────────────────────────────────────────────
    async fn list_versions(&self, filename: &str) -> Result<Vec<DocumentVersion>, ConsoleError>;
    async fn create_version(
        &self,
        filename: &str,
        note: &str,
    ) -> Result<VersionReceipt, ConsoleError>;

    // ── Analysis ──────────────────────────────────────────────────────────
    async fn analysis(&self, filename: &str) -> Result<Analysis, ConsoleError>;
    async fn summary(&self, filename: &str) -> Result<String, ConsoleError>;
    async fn entities(&self, filename: &str) -> Result<EntitySet, ConsoleError>;

    // ── Conversion ────────────────────────────────────────────────────────
    async fn convert(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertReceipt, ConsoleError>;
    async fn fetch_converted(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertedPayload, ConsoleError>;
    async fn convert_all(&self, filename: &str) -> Result<ConvertedPayload, ConsoleError>;
}
