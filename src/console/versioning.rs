//! Version snapshots.

use super::DocumentConsole;
use crate::error::ConsoleError;
use crate::events::Notice;
use crate::model::DocumentVersion;
use crate::state::VersionDraft;
use tracing::{debug, info};

impl DocumentConsole {
    /// Versions of `filename`, newest first as the backend returns them.
    pub async fn list_versions(
        &self,
        filename: &str,
    ) -> Result<Vec<DocumentVersion>, ConsoleError> {
        match self.backend.list_versions(filename).await {
            Ok(versions) => {
                self.view()
                    .versions
                    .insert(filename.to_string(), versions.clone());
                Ok(versions)
            }
            Err(e) => Err(self.fail("Failed to load versions", e)),
        }
    }

    /// Edit the single version-note draft.
    pub fn set_version_note(&self, filename: &str, note: &str) {
        let mut view = self.view();
        view.selected = Some(filename.to_string());
        view.version_note = Some(VersionDraft {
            filename: filename.to_string(),
            note: note.to_string(),
        });
    }

    /// Snapshot `filename` with `note` (may be empty) and re-list its
    /// versions. Returns the new version label.
    pub async fn create_version(&self, filename: &str, note: &str) -> Result<String, ConsoleError> {
        info!(filename, "Creating version");
        let receipt = self
            .backend
            .create_version(filename, note)
            .await
            .map_err(|e| self.fail("Failed to create version", e))?;

        {
            let mut view = self.view();
            if view
                .version_note
                .as_ref()
                .is_some_and(|d| d.filename == filename)
            {
                view.version_note = None;
            }
        }
        self.notify(Notice::success(format!(
            "Created version {} of {filename}",
            receipt.version
        )));
        // The version exists even if the re-list fails; that failure has
        // already emitted its own notice.
        if let Err(e) = self.list_versions(filename).await {
            debug!(filename, error = %e, "Version re-list after create failed");
        }
        Ok(receipt.version)
    }
}
