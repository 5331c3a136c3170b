//! `reqwest` implementation of [`DocumentBackend`].
//!
//! ## Addressing
//!
//! Most endpoints live on [`ConsoleConfig::base_url`]. Delete and raw
//! download go to [`ConsoleConfig::files_service_url`], which is the same
//! address unless a deployment splits them.
//!
//! File names are pushed as single path segments, so names containing
//! spaces, `#` or `/` are percent-encoded rather than reinterpreted.
//!
//! ## Errors
//!
//! The backend reports failures as `{"detail": "..."}`; that text ends up in
//! [`ConsoleError::Backend::detail`]. A 2xx body that does not decode is a
//! [`ConsoleError::InvalidResponse`].

use super::DocumentBackend;
use crate::config::ConsoleConfig;
use crate::error::ConsoleError;
use crate::model::{
    Analysis, ConvertFormat, ConvertReceipt, ConvertedPayload, Document, DocumentVersion,
    EntitySet, MetadataPatch, ParseReceipt, ParsedDocument, SearchQuery, SearchResult,
    UploadFile, VersionReceipt,
};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest raw error body quoted in a [`ConsoleError::Backend`].
const MAX_DETAIL_LEN: usize = 200;

/// HTTP client for the document service.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base: Url,
    files: Url,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    new_filename: &'a str,
}

#[derive(Serialize)]
struct VersionBody<'a> {
    version_note: &'a str,
}

#[derive(Deserialize)]
struct SummaryBody {
    summary: String,
}

impl HttpBackend {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ConsoleError> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ConsoleError::InvalidConfig(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            base: config.base_url.clone(),
            files: config.files_service_url().clone(),
        })
    }

    /// Use a pre-built `reqwest::Client` (shared pools, custom TLS).
    pub fn with_client(client: Client, config: &ConsoleConfig) -> Self {
        Self {
            client,
            base: config.base_url.clone(),
            files: config.files_service_url().clone(),
        }
    }

    // ── Request plumbing ─────────────────────────────────────────────────

    /// `root` with `segments` appended as escaped path segments.
    fn url(root: &Url, segments: &[&str]) -> Url {
        let mut url = root.clone();
        // http(s) URLs always have a path; config validation guarantees the scheme.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> (String, RequestBuilder) {
        let endpoint = format!("{} {}", method, url.path());
        (endpoint, self.client.request(method, url))
    }

    async fn send(&self, endpoint: &str, req: RequestBuilder) -> Result<Response, ConsoleError> {
        debug!(endpoint, "Sending request");
        let resp = req.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "Request failed");
            ConsoleError::network(endpoint, &e)
        })?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        let detail = error_detail(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string()
        });
        warn!(endpoint, status = status.as_u16(), %detail, "Backend returned an error");
        Err(ConsoleError::Backend {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            detail,
        })
    }

    async fn json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: RequestBuilder,
    ) -> Result<T, ConsoleError> {
        let bytes = self
            .send(endpoint, req)
            .await?
            .bytes()
            .await
            .map_err(|e| ConsoleError::network(endpoint, &e))?;
        serde_json::from_slice(&bytes).map_err(|e| ConsoleError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    /// Send and discard the body.
    async fn execute(&self, endpoint: &str, req: RequestBuilder) -> Result<(), ConsoleError> {
        self.send(endpoint, req).await.map(drop)
    }
}

/// Pull a readable message out of an error body.
fn error_detail(body: &str) -> Option<String> {
    let body = body.trim();
    if body.is_empty() {
        return None;
    }
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(body) {
        match map.get("detail") {
            Some(serde_json::Value::String(s)) => return Some(s.clone()),
            Some(other) => return Some(other.to_string()),
            None => {}
        }
    }
    Some(body.chars().take(MAX_DETAIL_LEN).collect())
}

#[async_trait]
impl DocumentBackend for HttpBackend {
    async fn list_documents(&self) -> Result<Vec<Document>, ConsoleError> {
        let (ep, req) = self.request(Method::GET, Self::url(&self.base, &["files", ""]));
        self.json(&ep, req).await
    }

    async fn list_tags(&self) -> Result<Vec<String>, ConsoleError> {
        let (ep, req) = self.request(Method::GET, Self::url(&self.base, &["tags", ""]));
        self.json(&ep, req).await
    }

    async fn upload(&self, file: &UploadFile) -> Result<(), ConsoleError> {
        let (ep, req) = self.request(Method::POST, Self::url(&self.base, &["upload", ""]));
        let part = Part::bytes(file.bytes.clone()).file_name(file.name.clone());
        self.execute(&ep, req.multipart(Form::new().part("file", part)))
            .await
    }

    async fn parse(&self, filename: &str) -> Result<ParseReceipt, ConsoleError> {
        let (ep, req) = self.request(Method::POST, Self::url(&self.base, &["parse", filename]));
        self.json(&ep, req).await
    }

    async fn delete(&self, filename: &str) -> Result<(), ConsoleError> {
        let (ep, req) = self.request(
            Method::DELETE,
            Self::url(&self.files, &["files", filename]),
        );
        self.execute(&ep, req).await
    }

    async fn rename(&self, filename: &str, new_filename: &str) -> Result<(), ConsoleError> {
        let (ep, req) = self.request(
            Method::PUT,
            Self::url(&self.base, &["files", filename, "rename"]),
        );
        self.execute(&ep, req.json(&RenameBody { new_filename }))
            .await
    }

    async fn update_metadata(
        &self,
        filename: &str,
        patch: &MetadataPatch,
    ) -> Result<(), ConsoleError> {
        let (ep, req) = self.request(
            Method::PUT,
            Self::url(&self.base, &["files", filename, "metadata"]),
        );
        self.execute(&ep, req.json(patch)).await
    }

    async fn download_raw(&self, filename: &str) -> Result<Vec<u8>, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.files, &["download", filename]),
        );
        let bytes = self
            .send(&ep, req)
            .await?
            .bytes()
            .await
            .map_err(|e| ConsoleError::network(&ep, &e))?;
        Ok(bytes.to_vec())
    }

    async fn fetch_document(&self, filename: &str) -> Result<ParsedDocument, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["documents", filename]),
        );
        let mut doc: ParsedDocument = self.json(&ep, req).await?;
        if doc.filename.is_none() {
            doc.filename = Some(filename.to_string());
        }
        Ok(doc)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["advanced-search", ""]),
        );
        self.json(&ep, req.query(&query.to_params())).await
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<DocumentVersion>, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["files", filename, "versions"]),
        );
        self.json(&ep, req).await
    }

    async fn create_version(
        &self,
        filename: &str,
        note: &str,
    ) -> Result<VersionReceipt, ConsoleError> {
        let (ep, req) = self.request(
            Method::POST,
            Self::url(&self.base, &["files", filename, "version"]),
        );
        self.json(&ep, req.json(&VersionBody { version_note: note }))
            .await
    }

    async fn analysis(&self, filename: &str) -> Result<Analysis, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["files", filename, "analysis"]),
        );
        self.json(&ep, req).await
    }

    async fn summary(&self, filename: &str) -> Result<String, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["files", filename, "summary"]),
        );
        let body: SummaryBody = self.json(&ep, req).await?;
        Ok(body.summary)
    }

    async fn entities(&self, filename: &str) -> Result<EntitySet, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["files", filename, "entities"]),
        );
        self.json(&ep, req).await
    }

    async fn convert(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertReceipt, ConsoleError> {
        let (ep, req) = self.request(Method::GET, Self::url(&self.base, &["convert", filename]));
        self.json(&ep, req.query(&[("format", format.as_str())]))
            .await
    }

    async fn fetch_converted(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertedPayload, ConsoleError> {
        let (ep, req) = self.request(
            Method::GET,
            Self::url(&self.base, &["download", filename]),
        );
        self.json(&ep, req.query(&[("format", format.as_str())]))
            .await
    }

    async fn convert_all(&self, filename: &str) -> Result<ConvertedPayload, ConsoleError> {
        let (ep, req) = self.request(
            Method::POST,
            Self::url(&self.base, &["files", filename, "convert-all"]),
        );
        self.json(&ep, req).await
    }
}
