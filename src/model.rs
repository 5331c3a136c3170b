//! Wire and view types shared by the backend and the console.
//!
//! Field names follow the backend's JSON (snake_case), so most types derive
//! `Serialize`/`Deserialize` without renames. Timestamps arrive as fractional
//! Unix seconds; helpers convert them to `chrono` values for display.

use crate::error::{ConsoleError, ValidationError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ── Registry ─────────────────────────────────────────────────────────────

/// A document as known to the backend registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    pub size: u64,
    /// Unix seconds.
    pub uploaded_at: f64,
    pub is_parsed: bool,
    #[serde(default)]
    pub converted_files: Vec<ConvertedFile>,
}

impl Document {
    pub fn uploaded(&self) -> Option<DateTime<Utc>> {
        from_unix_secs(self.uploaded_at)
    }

    /// Size in KiB, as shown in listings.
    pub fn size_kib(&self) -> f64 {
        self.size as f64 / 1024.0
    }
}

/// One finished conversion recorded by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedFile {
    pub format: String,
    pub path: String,
    pub converted_at: f64,
}

/// An immutable snapshot of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentVersion {
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    pub created_at: f64,
    pub size: u64,
}

impl DocumentVersion {
    pub fn created(&self) -> Option<DateTime<Utc>> {
        from_unix_secs(self.created_at)
    }
}

/// Parsed content served to the per-document view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedDocument {
    #[serde(default)]
    pub filename: Option<String>,
    pub content: String,
    pub metadata: DocumentMetadata,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
}

// ── Upload ───────────────────────────────────────────────────────────────

/// A file selected for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; the upload name is the path's final component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ConsoleError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = tokio::fs::read(path).await.map_err(|source| ConsoleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { name, bytes })
    }
}

// ── Search ───────────────────────────────────────────────────────────────

/// Advanced-search filters. Empty fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub author: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tags: BTreeSet<String>,
}

impl SearchFilters {
    /// Parse a comma-separated tag list, trimming entries and dropping blanks.
    pub fn with_tags_csv(mut self, csv: &str) -> Self {
        self.tags = csv
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn between(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.author.trim().is_empty()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.tags.iter().all(|t| t.trim().is_empty())
    }
}

/// One combined search request as sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub filters: SearchFilters,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, filters: SearchFilters) -> Self {
        Self {
            text: text.into(),
            filters,
        }
    }

    /// Blank text and no filter: nothing to ask the backend.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.filters.is_empty()
    }

    /// Query-string pairs. `query` is always present; the rest only when set.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.text.clone())];
        let f = &self.filters;
        let author = f.author.trim();
        if !author.is_empty() {
            params.push(("author", author.to_string()));
        }
        if let Some(d) = f.start_date {
            params.push(("start_date", d.format("%Y-%m-%d").to_string()));
        }
        if let Some(d) = f.end_date {
            params.push(("end_date", d.format("%Y-%m-%d").to_string()));
        }
        let tags: Vec<&str> = f
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect();
        if !tags.is_empty() {
            params.push(("tags", tags.join(",")));
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub filename: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ── Lifecycle ────────────────────────────────────────────────────────────

/// Partial metadata update. Only `Some` fields go on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl MetadataPatch {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.author.is_none() && self.tags.is_none()
    }
}

/// Backend acknowledgement of a parse request.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParseReceipt {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Backend acknowledgement of a new version.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VersionReceipt {
    #[serde(deserialize_with = "string_or_number")]
    pub version: String,
    #[serde(default)]
    pub message: String,
}

// ── Analysis ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub keywords: Vec<Keyword>,
    pub summary: String,
}

/// Named entities grouped by type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySet {
    #[serde(default)]
    pub organizations: Vec<String>,
    #[serde(default)]
    pub dates: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub persons: Vec<String>,
    #[serde(default, deserialize_with = "keyword_words")]
    pub keywords: Vec<String>,
}

impl EntitySet {
    pub fn is_empty(&self) -> bool {
        self.organizations.is_empty()
            && self.dates.is_empty()
            && self.locations.is_empty()
            && self.persons.is_empty()
            && self.keywords.is_empty()
    }
}

// ── Conversion ───────────────────────────────────────────────────────────

/// Output formats the backend can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConvertFormat {
    Markdown,
    Latex,
    Csv,
    Jsonld,
}

impl ConvertFormat {
    pub const ALL: [ConvertFormat; 4] = [
        ConvertFormat::Markdown,
        ConvertFormat::Latex,
        ConvertFormat::Csv,
        ConvertFormat::Jsonld,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConvertFormat::Markdown => "markdown",
            ConvertFormat::Latex => "latex",
            ConvertFormat::Csv => "csv",
            ConvertFormat::Jsonld => "jsonld",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ConvertFormat::Jsonld => "application/ld+json",
            ConvertFormat::Csv => "text/csv",
            _ => "text/plain",
        }
    }
}

impl fmt::Display for ConvertFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConvertFormat {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "markdown" | "md" => Ok(ConvertFormat::Markdown),
            "latex" | "tex" => Ok(ConvertFormat::Latex),
            "csv" => Ok(ConvertFormat::Csv),
            "jsonld" | "json-ld" => Ok(ConvertFormat::Jsonld),
            _ => Err(ValidationError::InvalidFormat(s.to_string())),
        }
    }
}

/// Result of the `convert` trigger.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConvertReceipt {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub path: String,
}

/// A converted file or archive as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConvertedPayload {
    pub filename: String,
    pub content: String,
}

/// A payload ready to be saved by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct Download {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Download {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Download")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("bytes", &format_args!("<{} bytes>", self.bytes.len()))
            .finish()
    }
}

impl Download {
    /// Write into `dir` under the download's own file name.
    ///
    /// Only the final path component of the name is used, so a server-chosen
    /// archive name cannot escape `dir`.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ConsoleError> {
        let name = Path::new(&self.filename)
            .file_name()
            .map(|n| n.to_owned())
            .unwrap_or_else(|| "download".into());
        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, &self.bytes)
            .await
            .map_err(|source| ConsoleError::Io {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn from_unix_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.trunc() as i64;
    let nanos = ((secs - secs.trunc()) * 1e9) as u32;
    DateTime::from_timestamp(whole, nanos)
}

/// Version labels come back as strings from the listing and as integers
/// from the create call.
fn string_or_number<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Text(String),
        Int(i64),
    }
    Ok(match Label::deserialize(de)? {
        Label::Text(s) => s,
        Label::Int(n) => n.to_string(),
    })
}

/// Entity keywords are either plain words or `{word, count}` objects.
fn keyword_words<'de, D>(de: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Word(String),
        Counted { word: String },
    }
    let entries = Vec::<Entry>::deserialize(de)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Word(w) | Entry::Counted { word: w } => w,
        })
        .collect())
}
