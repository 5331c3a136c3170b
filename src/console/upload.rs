//! Upload of a new document.

use super::DocumentConsole;
use crate::error::{ConsoleError, ValidationError};
use crate::events::Notice;
use crate::model::UploadFile;
use crate::state::{Operation, Scope};
use tracing::info;

impl DocumentConsole {
    /// Validate and submit `file`, then refresh the registry.
    ///
    /// Rejected locally, without a request, when another upload is still
    /// running or the name lacks the accepted extension. The upload key is
    /// claimed first, so only the attempt that holds it touches the upload
    /// selection; that selection is cleared after every such attempt.
    pub async fn upload(&self, file: UploadFile) -> Result<(), ConsoleError> {
        let _guard = self
            .claim(Scope::Console, Operation::Upload)
            .map_err(|e| self.fail("Upload rejected", e))?;

        if !self.config.accepts(&file.name) {
            let err = ValidationError::UnsupportedExtension {
                name: file.name.clone(),
                expected: self.config.accepted_extension.clone(),
            };
            self.view().upload_selection = None;
            return Err(self.fail("Upload rejected", err.into()));
        }

        self.view().upload_selection = Some(file.name.clone());

        info!(name = %file.name, bytes = file.bytes.len(), "Uploading document");
        let result = self.backend.upload(&file).await;
        self.view().upload_selection = None;

        match result {
            Ok(()) => {
                self.notify(Notice::success(format!("Uploaded {}", file.name)));
                self.resync().await;
                Ok(())
            }
            Err(e) => Err(self.fail("Upload failed", e)),
        }
    }
}
