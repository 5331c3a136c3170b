//! Parse, delete, rename, metadata, raw download and the document view.

use super::DocumentConsole;
use crate::error::{ConsoleError, ValidationError};
use crate::events::{Notice, Route};
use crate::model::{Download, MetadataPatch, ParsedDocument};
use crate::state::{Operation, ParseStatus, RenameDraft};
use tracing::info;

/// Result of [`DocumentConsole::delete`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The confirmation prompt was declined; nothing was sent.
    Declined,
}

impl DocumentConsole {
    /// Ask the backend to parse `filename`, then navigate to its view.
    ///
    /// The parse job reads `Pending` while the request runs and settles to
    /// `Done` or `Failed` with the response. Navigation happens as soon as
    /// the request succeeds. `is_parsed` in the mirror changes only through
    /// the refresh that follows.
    pub async fn trigger_parse(&self, filename: &str) -> Result<(), ConsoleError> {
        let _guard = self
            .claim_document(filename, Operation::Parse)
            .map_err(|e| self.fail("Parse rejected", e))?;
        self.view()
            .parse_jobs
            .insert(filename.to_string(), ParseStatus::Pending);

        info!(filename, "Triggering parse");
        match self.backend.parse(filename).await {
            Ok(receipt) => {
                self.view()
                    .parse_jobs
                    .insert(filename.to_string(), ParseStatus::Done);
                let message = if receipt.message.is_empty() {
                    format!("Parsing started for {filename}")
                } else {
                    receipt.message
                };
                self.notify(Notice::success(message));
                self.events
                    .on_navigate(&Route::Document(filename.to_string()));
                self.resync().await;
                Ok(())
            }
            Err(e) => {
                self.view()
                    .parse_jobs
                    .insert(filename.to_string(), ParseStatus::Failed(e.to_string()));
                Err(self.fail("Failed to start parsing", e))
            }
        }
    }

    /// Delete `filename` after confirmation.
    pub async fn delete(&self, filename: &str) -> Result<DeleteOutcome, ConsoleError> {
        if !self
            .confirm
            .confirm(&format!("Delete '{filename}'? This cannot be undone."))
        {
            info!(filename, "Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        info!(filename, "Deleting document");
        match self.backend.delete(filename).await {
            Ok(()) => {
                self.view().forget(filename);
                self.notify(Notice::success(format!("Deleted {filename}")));
                self.resync().await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => Err(self.fail("Failed to delete file", e)),
        }
    }

    /// Open the rename draft for `filename`, seeded with its stem.
    ///
    /// Replaces any other draft: only one rename is edited at a time.
    pub fn begin_rename(&self, filename: &str) -> RenameDraft {
        let stem = filename
            .strip_suffix(self.config.accepted_extension.as_str())
            .unwrap_or(filename);
        let draft = RenameDraft {
            filename: filename.to_string(),
            new_name: stem.to_string(),
        };
        let mut view = self.view();
        view.selected = Some(filename.to_string());
        view.rename = Some(draft.clone());
        draft
    }

    pub fn cancel_rename(&self) {
        self.view().rename = None;
    }

    /// Rename `filename` to `new_name` (trimmed, must be non-empty).
    pub async fn rename(&self, filename: &str, new_name: &str) -> Result<(), ConsoleError> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(self.fail("Rename rejected", ValidationError::EmptyName.into()));
        }

        info!(filename, new_name, "Renaming document");
        match self.backend.rename(filename, new_name).await {
            Ok(()) => {
                {
                    let mut view = self.view();
                    view.rename = None;
                    // Results were keyed by the old name.
                    view.forget(filename);
                }
                self.notify(Notice::success(format!("Renamed {filename} to {new_name}")));
                self.resync().await;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to rename file", e)),
        }
    }

    /// Apply a partial metadata update.
    pub async fn update_metadata(
        &self,
        filename: &str,
        patch: MetadataPatch,
    ) -> Result<(), ConsoleError> {
        if patch.is_empty() {
            return Err(self.fail("Metadata update rejected", ValidationError::EmptyPatch.into()));
        }

        info!(filename, "Updating metadata");
        match self.backend.update_metadata(filename, &patch).await {
            Ok(()) => {
                self.notify(Notice::success(format!("Updated metadata for {filename}")));
                self.resync().await;
                Ok(())
            }
            Err(e) => Err(self.fail("Failed to update metadata", e)),
        }
    }

    /// Fetch the stored parse output of `filename` as `{filename}.json`.
    pub async fn download_raw(&self, filename: &str) -> Result<Download, ConsoleError> {
        info!(filename, "Downloading raw document");
        match self.backend.download_raw(filename).await {
            Ok(bytes) => {
                let download = Download {
                    filename: format!("{filename}.json"),
                    content_type: "application/json",
                    bytes,
                };
                self.events.on_download(&download);
                Ok(download)
            }
            Err(e) => Err(self.fail("Failed to download file", e)),
        }
    }

    /// Parsed content and metadata for the per-document view.
    pub async fn open_document(&self, filename: &str) -> Result<ParsedDocument, ConsoleError> {
        self.backend
            .fetch_document(filename)
            .await
            .map_err(|e| self.fail("Failed to load the document", e))
    }
}
