//! Console coordination tests against an in-memory document service.
//!
//! `FakeBackend` keeps a registry in memory, records every call it receives,
//! can be told to fail specific endpoints, and can hold long-running calls
//! (upload, parse, analysis, conversion) open so concurrency rules are
//! observable.
//!
//! Run with:
//!   cargo test --test console

use async_trait::async_trait;
use doc_console::state::RenameDraft;
use doc_console::{
    Analysis, AutoConfirm, ConsoleConfig, ConsoleError, ConsoleEvents, ConvertFormat,
    DeleteOutcome, Document, DocumentBackend, DocumentConsole, DocumentVersion, Download,
    EntitySet, ErrorKind, Keyword, MetadataPatch, Notice, Operation, ParseStatus, Route,
    SearchFilters, SearchResult, UploadFile,
};
use doc_console::model::{
    ConvertReceipt, ConvertedFile, ConvertedPayload, ParseReceipt, ParsedDocument, SearchQuery,
    VersionReceipt,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

// ── Fake backend ─────────────────────────────────────────────────────────────

#[derive(Default)]
struct Registry {
    documents: Vec<Document>,
    versions: HashMap<String, Vec<DocumentVersion>>,
    tags: Vec<String>,
}

#[derive(Default)]
struct FakeBackend {
    registry: Mutex<Registry>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    search_results: Mutex<Vec<SearchResult>>,
    last_query: Mutex<Option<SearchQuery>>,
    /// When set, upload, parse, analysis and conversions signal `entered`
    /// and wait for `release`.
    gate: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl FakeBackend {
    fn with_documents(names: &[&str]) -> Arc<Self> {
        let backend = Self::default();
        {
            let mut reg = backend.registry.lock().unwrap();
            for n in names {
                reg.documents.push(doc(n));
            }
        }
        Arc::new(backend)
    }

    fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    fn heal(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, endpoint: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == endpoint).count()
    }

    fn gate(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    /// Record the call and apply failure injection.
    fn hit(&self, endpoint: &'static str) -> Result<(), ConsoleError> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(ConsoleError::Backend {
                endpoint: endpoint.to_string(),
                status: 500,
                detail: "injected failure".into(),
            });
        }
        Ok(())
    }

    async fn wait_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some((entered, release)) = gate {
            entered.notify_one();
            release.notified().await;
        }
    }

    fn append_conversion(&self, filename: &str, format: &str) {
        let mut reg = self.registry.lock().unwrap();
        if let Some(d) = reg.documents.iter_mut().find(|d| d.filename == filename) {
            d.converted_files.push(ConvertedFile {
                format: format.to_string(),
                path: format!("converted/{format}/{filename}.{format}"),
                converted_at: 1_700_000_100.0,
            });
        }
    }
}

fn doc(name: &str) -> Document {
    Document {
        filename: name.to_string(),
        size: 4096,
        uploaded_at: 1_700_000_000.0,
        is_parsed: false,
        converted_files: Vec::new(),
    }
}

fn not_found(endpoint: &str) -> ConsoleError {
    ConsoleError::Backend {
        endpoint: endpoint.to_string(),
        status: 404,
        detail: "file not found".into(),
    }
}

#[async_trait]
impl DocumentBackend for FakeBackend {
    async fn list_documents(&self) -> Result<Vec<Document>, ConsoleError> {
        self.hit("list")?;
        Ok(self.registry.lock().unwrap().documents.clone())
    }

    async fn list_tags(&self) -> Result<Vec<String>, ConsoleError> {
        self.hit("tags")?;
        Ok(self.registry.lock().unwrap().tags.clone())
    }

    async fn upload(&self, file: &UploadFile) -> Result<(), ConsoleError> {
        self.hit("upload")?;
        self.wait_gate().await;
        self.registry.lock().unwrap().documents.push(doc(&file.name));
        Ok(())
    }

    async fn parse(&self, _filename: &str) -> Result<ParseReceipt, ConsoleError> {
        self.hit("parse")?;
        self.wait_gate().await;
        // Parsing completes later; the registry still says not parsed.
        Ok(ParseReceipt {
            status: "success".into(),
            message: String::new(),
        })
    }

    async fn delete(&self, filename: &str) -> Result<(), ConsoleError> {
        self.hit("delete")?;
        let mut reg = self.registry.lock().unwrap();
        let before = reg.documents.len();
        reg.documents.retain(|d| d.filename != filename);
        if reg.documents.len() == before {
            return Err(not_found("delete"));
        }
        Ok(())
    }

    async fn rename(&self, filename: &str, new_filename: &str) -> Result<(), ConsoleError> {
        self.hit("rename")?;
        let mut reg = self.registry.lock().unwrap();
        match reg.documents.iter_mut().find(|d| d.filename == filename) {
            Some(d) => {
                d.filename = if new_filename.ends_with(".pdf") {
                    new_filename.to_string()
                } else {
                    format!("{new_filename}.pdf")
                };
                Ok(())
            }
            None => Err(not_found("rename")),
        }
    }

    async fn update_metadata(
        &self,
        _filename: &str,
        patch: &MetadataPatch,
    ) -> Result<(), ConsoleError> {
        self.hit("metadata")?;
        if let Some(tags) = &patch.tags {
            let mut reg = self.registry.lock().unwrap();
            for t in tags {
                if !reg.tags.contains(t) {
                    reg.tags.push(t.clone());
                }
            }
        }
        Ok(())
    }

    async fn download_raw(&self, filename: &str) -> Result<Vec<u8>, ConsoleError> {
        self.hit("download_raw")?;
        Ok(format!(r#"{{"filename":"{filename}"}}"#).into_bytes())
    }

    async fn fetch_document(&self, filename: &str) -> Result<ParsedDocument, ConsoleError> {
        self.hit("document")?;
        Ok(ParsedDocument {
            filename: Some(filename.to_string()),
            content: "Quarterly results".into(),
            metadata: Default::default(),
            tags: Vec::new(),
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ConsoleError> {
        self.hit("search")?;
        *self.last_query.lock().unwrap() = Some(query.clone());
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn list_versions(&self, filename: &str) -> Result<Vec<DocumentVersion>, ConsoleError> {
        self.hit("versions")?;
        Ok(self
            .registry
            .lock()
            .unwrap()
            .versions
            .get(filename)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_version(
        &self,
        filename: &str,
        _note: &str,
    ) -> Result<VersionReceipt, ConsoleError> {
        self.hit("create_version")?;
        let mut reg = self.registry.lock().unwrap();
        let list = reg.versions.entry(filename.to_string()).or_default();
        let next = list.len() + 1;
        // Newest first.
        list.insert(
            0,
            DocumentVersion {
                version: next.to_string(),
                created_at: 1_700_000_000.0 + next as f64,
                size: 4096,
            },
        );
        Ok(VersionReceipt {
            version: next.to_string(),
            message: String::new(),
        })
    }

    async fn analysis(&self, filename: &str) -> Result<Analysis, ConsoleError> {
        self.hit("analysis")?;
        self.wait_gate().await;
        Ok(Analysis {
            keywords: vec![Keyword {
                word: format!("kw-{filename}"),
                count: 3,
            }],
            summary: format!("summary of {filename}"),
        })
    }

    async fn summary(&self, filename: &str) -> Result<String, ConsoleError> {
        self.hit("summary")?;
        Ok(format!("short summary of {filename}"))
    }

    async fn entities(&self, filename: &str) -> Result<EntitySet, ConsoleError> {
        self.hit("entities")?;
        Ok(EntitySet {
            organizations: vec![format!("Org of {filename}")],
            ..Default::default()
        })
    }

    async fn convert(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertReceipt, ConsoleError> {
        self.hit("convert")?;
        self.wait_gate().await;
        self.append_conversion(filename, format.as_str());
        Ok(ConvertReceipt {
            status: "success".into(),
            path: format!("converted/{format}/{filename}"),
        })
    }

    async fn fetch_converted(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertedPayload, ConsoleError> {
        self.hit("fetch_converted")?;
        Ok(ConvertedPayload {
            filename: format!("{filename}.{format}"),
            content: format!("# {filename}"),
        })
    }

    async fn convert_all(&self, filename: &str) -> Result<ConvertedPayload, ConsoleError> {
        self.hit("convert_all")?;
        self.wait_gate().await;
        for f in ConvertFormat::ALL {
            self.append_conversion(filename, f.as_str());
        }
        Ok(ConvertedPayload {
            filename: format!("{filename}_converted.zip"),
            content: "PK\u{3}\u{4}".into(),
        })
    }
}

// ── Recording events ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    notices: Mutex<Vec<Notice>>,
    routes: Mutex<Vec<Route>>,
    downloads: Mutex<Vec<Download>>,
}

impl Recorder {
    fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_error())
            .map(|n| n.message.clone())
            .collect()
    }

    fn successes(&self) -> usize {
        self.notices
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.is_error())
            .count()
    }
}

impl ConsoleEvents for Recorder {
    fn on_notice(&self, notice: &Notice) {
        self.notices.lock().unwrap().push(notice.clone());
    }

    fn on_navigate(&self, route: &Route) {
        self.routes.lock().unwrap().push(route.clone());
    }

    fn on_download(&self, download: &Download) {
        self.downloads.lock().unwrap().push(download.clone());
    }
}

fn console_with(backend: Arc<FakeBackend>) -> (DocumentConsole, Arc<Recorder>) {
    let events = Arc::new(Recorder::default());
    let console = DocumentConsole::new(backend, ConsoleConfig::default())
        .with_events(events.clone())
        .with_confirm(Arc::new(AutoConfirm(true)));
    (console, events)
}

// ── Registry ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_fills_documents_and_tags() {
    let backend = FakeBackend::with_documents(&["a.pdf", "b.pdf"]);
    backend.registry.lock().unwrap().tags = vec!["finance".into()];
    let (console, _) = console_with(backend.clone());

    console.load().await.unwrap();

    let view = console.snapshot();
    assert_eq!(view.documents.len(), 2);
    assert_eq!(view.tags, vec!["finance"]);
}

#[tokio::test]
async fn failed_refresh_keeps_previous_list_and_notifies() {
    let backend = FakeBackend::with_documents(&["a.pdf"]);
    let (console, events) = console_with(backend.clone());
    console.refresh().await.unwrap();

    backend.fail("list");
    let err = console.refresh().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(console.snapshot().documents.len(), 1);
    assert_eq!(events.errors().len(), 1);
}

#[tokio::test]
async fn failed_tag_listing_is_silent() {
    let backend = FakeBackend::with_documents(&[]);
    let (console, events) = console_with(backend.clone());
    backend.fail("tags");

    assert!(console.refresh_tags().await.is_err());
    // The document list still loads.
    assert!(console.load().await.is_ok());
    assert!(events.errors().is_empty());
}

// ── Upload ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upload_then_list_shows_unparsed_document() {
    let backend = FakeBackend::with_documents(&[]);
    let (console, events) = console_with(backend.clone());

    console
        .upload(UploadFile::new("report.pdf", b"%PDF-1.7".to_vec()))
        .await
        .unwrap();

    let docs = console.refresh().await.unwrap();
    let report = docs.iter().find(|d| d.filename == "report.pdf").unwrap();
    assert!(!report.is_parsed);
    // Upload re-listed the registry by itself.
    assert_eq!(backend.calls(), vec!["upload", "list", "list"]);
    assert_eq!(events.successes(), 1);
    assert!(console.snapshot().upload_selection.is_none());
}

#[tokio::test]
async fn upload_with_wrong_extension_sends_nothing() {
    for name in ["notes.txt", "report.PDF", "report.pdf.exe", "pdf", ""] {
        let backend = FakeBackend::with_documents(&[]);
        let (console, events) = console_with(backend.clone());

        let err = console
            .upload(UploadFile::new(name, Vec::new()))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation, "name: {name:?}");
        assert!(backend.calls().is_empty(), "name: {name:?}");
        assert_eq!(events.errors().len(), 1);
        assert!(console.snapshot().upload_selection.is_none());
    }
}

#[tokio::test]
async fn failed_upload_clears_selection_and_keeps_list() {
    let backend = FakeBackend::with_documents(&["a.pdf"]);
    let (console, events) = console_with(backend.clone());
    console.refresh().await.unwrap();
    backend.fail("upload");

    let err = console
        .upload(UploadFile::new("b.pdf", Vec::new()))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    let view = console.snapshot();
    assert!(view.upload_selection.is_none());
    assert!(!view.is_uploading());
    assert_eq!(view.documents.len(), 1);
    assert_eq!(events.errors().len(), 1);
}

#[tokio::test]
async fn second_upload_while_uploading_is_rejected() {
    let backend = FakeBackend::with_documents(&[]);
    let (entered, release) = backend.gate();
    let (console, events) = console_with(backend.clone());
    let console = Arc::new(console);

    let running = {
        let console = Arc::clone(&console);
        tokio::spawn(async move {
            console
                .upload(UploadFile::new("report.pdf", b"%PDF".to_vec()))
                .await
        })
    };
    entered.notified().await;

    let err = console
        .upload(UploadFile::new("other.pdf", b"%PDF".to_vec()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);
    assert_eq!(backend.count("upload"), 1);
    assert!(events.errors().is_empty());

    release.notify_one();
    running.await.unwrap().unwrap();
    assert!(!console.snapshot().is_uploading());
}

#[tokio::test]
async fn rejected_upload_leaves_running_upload_selected() {
    let backend = FakeBackend::with_documents(&[]);
    let (entered, release) = backend.gate();
    let (console, _) = console_with(backend.clone());
    let console = Arc::new(console);

    let running = {
        let console = Arc::clone(&console);
        tokio::spawn(async move {
            console
                .upload(UploadFile::new("report.pdf", b"%PDF".to_vec()))
                .await
        })
    };
    entered.notified().await;

    let err = console
        .upload(UploadFile::new("notes.txt", Vec::new()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);
    let view = console.snapshot();
    assert!(view.is_uploading());
    assert_eq!(view.upload_selection.as_deref(), Some("report.pdf"));

    release.notify_one();
    running.await.unwrap().unwrap();
    let view = console.snapshot();
    assert!(view.upload_selection.is_none());
    assert!(view.document("report.pdf").is_some());
}

// ── Search ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn blank_search_issues_no_request() {
    let backend = FakeBackend::with_documents(&[]);
    let (console, _) = console_with(backend.clone());

    let blank_filters = [
        SearchFilters::default(),
        SearchFilters::default().with_author("  "),
        SearchFilters::default().with_tags_csv(" , "),
    ];
    for filters in blank_filters {
        let results = console.search("   ", filters).await.unwrap();
        assert!(results.is_empty());
    }
    assert!(console.simple_search("").await.unwrap().is_empty());
    assert_eq!(backend.count("search"), 0);
}

#[tokio::test]
async fn filter_only_search_reaches_backend() {
    let backend = FakeBackend::with_documents(&[]);
    *backend.search_results.lock().unwrap() = vec![SearchResult {
        filename: "q3.pdf".into(),
        title: "Q3".into(),
        author: "Kim Lee".into(),
        date: "2024-10-01".into(),
        snippet: "Revenue...".into(),
        tags: vec!["finance".into()],
    }];
    let (console, _) = console_with(backend.clone());

    let filters = SearchFilters::default()
        .with_author("Kim")
        .with_tags_csv("finance");
    let results = console.search("", filters).await.unwrap();

    assert_eq!(backend.count("search"), 1);
    assert_eq!(results.len(), 1);
    let sent = backend.last_query.lock().unwrap().clone().unwrap();
    let params = sent.to_params();
    assert!(params.contains(&("author", "Kim".to_string())));
    assert!(params.contains(&("tags", "finance".to_string())));
    assert_eq!(console.snapshot().search.results, results);
}

#[tokio::test]
async fn failed_search_keeps_previous_results() {
    let backend = FakeBackend::with_documents(&[]);
    *backend.search_results.lock().unwrap() = vec![SearchResult {
        filename: "a.pdf".into(),
        title: "A".into(),
        author: String::new(),
        date: String::new(),
        snippet: String::new(),
        tags: Vec::new(),
    }];
    let (console, events) = console_with(backend.clone());
    console.simple_search("budget").await.unwrap();

    backend.fail("search");
    assert!(console.simple_search("plan").await.is_err());

    assert_eq!(console.snapshot().search.results.len(), 1);
    assert_eq!(events.errors().len(), 1);

    console.reset_search();
    assert!(console.snapshot().search.results.is_empty());
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn parse_navigates_immediately() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, events) = console_with(backend.clone());

    console.trigger_parse("report.pdf").await.unwrap();

    assert_eq!(
        *events.routes.lock().unwrap(),
        vec![Route::Document("report.pdf".into())]
    );
    let view = console.snapshot();
    assert_eq!(view.parse_jobs.get("report.pdf"), Some(&ParseStatus::Done));
    // The mirror reflects the backend, which has not finished parsing.
    assert!(!view.document("report.pdf").unwrap().is_parsed);
    assert!(!view.is_busy("report.pdf", Operation::Parse));
}

#[tokio::test]
async fn parse_job_is_pending_while_request_runs() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (entered, release) = backend.gate();
    let (console, events) = console_with(backend.clone());
    let console = Arc::new(console);

    let running = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.trigger_parse("report.pdf").await })
    };
    entered.notified().await;

    let view = console.snapshot();
    assert_eq!(view.parse_jobs.get("report.pdf"), Some(&ParseStatus::Pending));
    assert!(view.is_busy("report.pdf", Operation::Parse));
    assert!(events.routes.lock().unwrap().is_empty());

    release.notify_one();
    running.await.unwrap().unwrap();
    assert_eq!(
        console.snapshot().parse_jobs.get("report.pdf"),
        Some(&ParseStatus::Done)
    );
}

#[tokio::test]
async fn failed_parse_does_not_navigate() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("parse");
    let (console, events) = console_with(backend.clone());

    assert!(console.trigger_parse("report.pdf").await.is_err());

    assert!(events.routes.lock().unwrap().is_empty());
    assert!(matches!(
        console.snapshot().parse_jobs.get("report.pdf"),
        Some(ParseStatus::Failed(_))
    ));
    assert_eq!(backend.count("list"), 0);
}

#[tokio::test]
async fn failed_delete_leaves_document_listed() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("delete");
    let (console, events) = console_with(backend.clone());

    let err = console.delete("report.pdf").await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(events.errors().len(), 1);
    let docs = console.refresh().await.unwrap();
    assert!(docs.iter().any(|d| d.filename == "report.pdf"));
}

#[tokio::test]
async fn declined_delete_sends_nothing() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let console = DocumentConsole::new(backend.clone(), ConsoleConfig::default())
        .with_confirm(Arc::new(|_: &str| false));

    assert_eq!(
        console.delete("report.pdf").await.unwrap(),
        DeleteOutcome::Declined
    );
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn delete_drops_document_and_its_results() {
    let backend = FakeBackend::with_documents(&["report.pdf", "other.pdf"]);
    let (console, _) = console_with(backend.clone());
    console.summary("report.pdf").await.unwrap();
    console.summary("other.pdf").await.unwrap();

    assert_eq!(
        console.delete("report.pdf").await.unwrap(),
        DeleteOutcome::Deleted
    );

    let view = console.snapshot();
    assert!(view.document("report.pdf").is_none());
    assert!(view.derived_for("report.pdf").is_none());
    assert!(view.derived_for("other.pdf").is_some());
}

#[tokio::test]
async fn rename_validates_and_clears_draft() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, _) = console_with(backend.clone());

    let draft = console.begin_rename("report.pdf");
    assert_eq!(
        draft,
        RenameDraft {
            filename: "report.pdf".into(),
            new_name: "report".into(),
        }
    );

    let err = console.rename("report.pdf", "   ").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(backend.calls().is_empty());
    assert!(console.snapshot().rename.is_some());

    console.rename("report.pdf", " annual ").await.unwrap();
    let view = console.snapshot();
    assert!(view.rename.is_none());
    assert!(view.document("annual.pdf").is_some());
}

#[tokio::test]
async fn metadata_patch_accepts_any_subset() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, _) = console_with(backend.clone());

    console
        .update_metadata("report.pdf", MetadataPatch::default().tags(["finance"]))
        .await
        .unwrap();
    console
        .update_metadata("report.pdf", MetadataPatch::default().title("Q3").author("Kim"))
        .await
        .unwrap();
    let err = console
        .update_metadata("report.pdf", MetadataPatch::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(backend.count("metadata"), 2);
    assert_eq!(backend.count("list"), 2);
}

#[tokio::test]
async fn raw_download_and_document_view() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, events) = console_with(backend.clone());

    let d = console.download_raw("report.pdf").await.unwrap();
    assert_eq!(d.filename, "report.pdf.json");
    assert_eq!(events.downloads.lock().unwrap().len(), 1);

    let parsed = console.open_document("report.pdf").await.unwrap();
    assert_eq!(parsed.content, "Quarterly results");
}

// ── Versions ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn listing_versions_twice_is_stable() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, _) = console_with(backend.clone());
    console.create_version("report.pdf", "first").await.unwrap();

    let a = console.list_versions("report.pdf").await.unwrap();
    let b = console.list_versions("report.pdf").await.unwrap();
    assert_eq!(a, b);
}

#[tokio::test]
async fn versions_only_grow() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, _) = console_with(backend.clone());

    let mut seen: Vec<DocumentVersion> = Vec::new();
    for n in 1..=3 {
        let label = console.create_version("report.pdf", "").await.unwrap();
        assert_eq!(label, n.to_string());
        let listed = console.list_versions("report.pdf").await.unwrap();
        assert!(listed.len() >= n);
        for old in &seen {
            assert!(listed.contains(old), "version {} disappeared", old.version);
        }
        seen = listed;
    }
    assert_eq!(seen.first().unwrap().version, "3");
}

#[tokio::test]
async fn create_version_clears_note_and_relists() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, _) = console_with(backend.clone());
    console.set_version_note("report.pdf", "before review");

    console
        .create_version("report.pdf", "before review")
        .await
        .unwrap();

    let view = console.snapshot();
    assert!(view.version_note.is_none());
    assert_eq!(view.versions_for("report.pdf").len(), 1);
    assert_eq!(backend.calls(), vec!["create_version", "versions"]);
}

#[tokio::test]
async fn failed_create_version_keeps_note() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("create_version");
    let (console, _) = console_with(backend.clone());
    console.set_version_note("report.pdf", "draft");

    assert!(console.create_version("report.pdf", "draft").await.is_err());
    assert_eq!(console.snapshot().version_note.unwrap().note, "draft");
}

#[tokio::test]
async fn create_version_succeeds_when_relist_fails() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("versions");
    let (console, events) = console_with(backend.clone());

    let label = console.create_version("report.pdf", "").await.unwrap();

    assert_eq!(label, "1");
    assert_eq!(backend.calls(), vec!["create_version", "versions"]);
    assert_eq!(events.errors().len(), 1);
    assert_eq!(events.successes(), 1);
    assert!(console.snapshot().versions_for("report.pdf").is_empty());
}

// ── Analysis ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn derived_results_are_keyed_by_document() {
    let backend = FakeBackend::with_documents(&["a.pdf", "b.pdf"]);
    let (console, _) = console_with(backend.clone());

    console.analyze("a.pdf").await.unwrap();
    console.extract_entities("a.pdf").await.unwrap();
    console.summary("b.pdf").await.unwrap();

    let view = console.snapshot();
    let a = view.derived_for("a.pdf").unwrap();
    assert_eq!(a.analysis.as_ref().unwrap().summary, "summary of a.pdf");
    assert_eq!(a.entities.as_ref().unwrap().organizations, vec!["Org of a.pdf"]);
    assert!(a.summary.is_none());

    let b = view.derived_for("b.pdf").unwrap();
    assert!(b.analysis.is_none());
    assert_eq!(b.summary.as_deref(), Some("short summary of b.pdf"));
}

#[tokio::test]
async fn failed_analysis_keeps_previous_result() {
    let backend = FakeBackend::with_documents(&["a.pdf"]);
    let (console, events) = console_with(backend.clone());
    console.analyze("a.pdf").await.unwrap();

    backend.fail("analysis");
    assert!(console.analyze("a.pdf").await.is_err());
    assert!(console
        .snapshot()
        .derived_for("a.pdf")
        .unwrap()
        .analysis
        .is_some());
    assert_eq!(events.errors().len(), 1);

    backend.heal("analysis");
    assert!(console.analyze("a.pdf").await.is_ok());
}

#[tokio::test]
async fn second_analysis_of_same_document_is_rejected() {
    let backend = FakeBackend::with_documents(&["a.pdf"]);
    let (entered, release) = backend.gate();
    let (console, events) = console_with(backend.clone());
    let console = Arc::new(console);

    let running = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.analyze("a.pdf").await })
    };
    entered.notified().await;
    assert!(console.snapshot().is_busy("a.pdf", Operation::Analyze));

    let err = console.analyze("a.pdf").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Busy);
    assert_eq!(backend.count("analysis"), 1);
    assert!(events.errors().is_empty());

    release.notify_one();
    running.await.unwrap().unwrap();
    assert!(!console.snapshot().is_busy("a.pdf", Operation::Analyze));
}

#[tokio::test]
async fn analyses_of_different_documents_do_not_block() {
    let backend = FakeBackend::with_documents(&["a.pdf", "b.pdf"]);
    let (entered, release) = backend.gate();
    let (console, _) = console_with(backend.clone());
    let console = Arc::new(console);

    let first = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.analyze("a.pdf").await })
    };
    entered.notified().await;

    let second = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.analyze("b.pdf").await })
    };
    entered.notified().await;
    assert_eq!(backend.count("analysis"), 2);

    // Both tasks are parked on the release gate.
    release.notify_one();
    release.notify_one();

    assert_eq!(first.await.unwrap().unwrap().summary, "summary of a.pdf");
    assert_eq!(second.await.unwrap().unwrap().summary, "summary of b.pdf");
    let view = console.snapshot();
    assert!(view.derived_for("a.pdf").unwrap().analysis.is_some());
    assert!(view.derived_for("b.pdf").unwrap().analysis.is_some());
}

// ── Conversion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn convert_one_names_download_after_format() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, events) = console_with(backend.clone());

    let d = console
        .convert_one("report.pdf", ConvertFormat::Markdown)
        .await
        .unwrap();

    assert_eq!(d.filename, "report.pdf.markdown");
    assert_eq!(d.bytes, b"# report.pdf");
    assert_eq!(&backend.calls()[..2], ["convert", "fetch_converted"]);
    assert_eq!(events.downloads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn convert_one_stops_after_failed_trigger() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("convert");
    let (console, events) = console_with(backend.clone());

    let err = console
        .convert_one("report.pdf", ConvertFormat::Latex)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Backend);
    assert_eq!(backend.calls(), vec!["convert"]);
    assert_eq!(events.errors().len(), 1);
    assert!(events.downloads.lock().unwrap().is_empty());
    assert!(!console.snapshot().is_busy("report.pdf", Operation::Convert));
}

#[tokio::test]
async fn failed_fetch_aborts_with_one_notice() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    backend.fail("fetch_converted");
    let (console, events) = console_with(backend.clone());

    assert!(console
        .convert_one("report.pdf", ConvertFormat::Csv)
        .await
        .is_err());
    assert_eq!(events.errors().len(), 1);
    assert!(events.downloads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn convert_all_uses_server_filename_and_refreshes() {
    let backend = FakeBackend::with_documents(&["report.pdf"]);
    let (console, events) = console_with(backend.clone());

    let d = console.convert_all("report.pdf").await.unwrap();

    assert_eq!(d.filename, "report.pdf_converted.zip");
    assert_eq!(d.content_type, "application/zip");
    assert_eq!(
        events.downloads.lock().unwrap()[0].filename,
        "report.pdf_converted.zip"
    );
    let docs = console.refresh().await.unwrap();
    let report = docs.iter().find(|d| d.filename == "report.pdf").unwrap();
    assert!(!report.converted_files.is_empty());
}

#[tokio::test]
async fn second_conversion_of_same_document_is_rejected() {
    let backend = FakeBackend::with_documents(&["report.pdf", "other.pdf"]);
    let (entered, release) = backend.gate();
    let (console, events) = console_with(backend.clone());
    let console = Arc::new(console);

    let running = {
        let console = Arc::clone(&console);
        tokio::spawn(async move {
            console
                .convert_one("report.pdf", ConvertFormat::Markdown)
                .await
        })
    };
    entered.notified().await;
    assert!(console.snapshot().is_busy("report.pdf", Operation::Convert));

    let busy = console.convert_all("report.pdf").await.unwrap_err();
    assert_eq!(busy.kind(), ErrorKind::Busy);
    let busy = console
        .convert_one("report.pdf", ConvertFormat::Csv)
        .await
        .unwrap_err();
    assert_eq!(busy.kind(), ErrorKind::Busy);
    // Rejections are local: only the first conversion reached the backend.
    assert_eq!(backend.count("convert"), 1);
    assert_eq!(backend.count("convert_all"), 0);
    assert!(events.errors().is_empty());

    release.notify_one();
    running.await.unwrap().unwrap();
    assert!(!console.snapshot().is_busy("report.pdf", Operation::Convert));
}

#[tokio::test]
async fn conversions_of_different_documents_do_not_block() {
    let backend = FakeBackend::with_documents(&["report.pdf", "other.pdf"]);
    let (entered, release) = backend.gate();
    let (console, _) = console_with(backend.clone());
    let console = Arc::new(console);

    let first = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.convert_all("report.pdf").await })
    };
    entered.notified().await;

    let second = {
        let console = Arc::clone(&console);
        tokio::spawn(async move { console.convert_all("other.pdf").await })
    };
    // The second call reaches the backend and waits on the same gate.
    entered.notified().await;
    assert_eq!(backend.count("convert_all"), 2);

    // Both tasks are parked on the release gate.
    release.notify_one();
    release.notify_one();

    assert!(first.await.unwrap().is_ok());
    assert!(second.await.unwrap().is_ok());
}
