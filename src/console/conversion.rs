//! Format conversion and download.
//!
//! Both operations hold the document's `Convert` key, so at most one
//! conversion per document is outstanding. Different documents convert
//! independently.

use super::DocumentConsole;
use crate::error::ConsoleError;
use crate::events::Notice;
use crate::model::{ConvertFormat, ConvertedPayload, Download};
use crate::state::Operation;
use tracing::{debug, info};

impl DocumentConsole {
    /// Convert `filename` to `format` and fetch the result.
    ///
    /// Two requests in order: trigger, then fetch. The fetch is only sent
    /// after the trigger succeeds; a failure at either step produces one
    /// notice. The download is named `{filename}.{format}`.
    pub async fn convert_one(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<Download, ConsoleError> {
        let _guard = self
            .claim_document(filename, Operation::Convert)
            .map_err(|e| self.fail("Conversion rejected", e))?;

        info!(filename, %format, "Converting document");
        let payload = self
            .convert_and_fetch(filename, format)
            .await
            .map_err(|e| self.fail("Conversion failed", e))?;

        let download = Download {
            filename: format!("{filename}.{format}"),
            content_type: format.content_type(),
            bytes: payload.content.into_bytes(),
        };
        self.events.on_download(&download);
        self.notify(Notice::success(format!(
            "Converted {filename} to {}",
            format.as_str().to_uppercase()
        )));
        self.resync().await;
        Ok(download)
    }

    async fn convert_and_fetch(
        &self,
        filename: &str,
        format: ConvertFormat,
    ) -> Result<ConvertedPayload, ConsoleError> {
        let receipt = self.backend.convert(filename, format).await?;
        debug!(filename, path = %receipt.path, "Conversion stored");
        self.backend.fetch_converted(filename, format).await
    }

    /// Convert `filename` to every supported format and fetch the archive.
    ///
    /// The download uses the archive name chosen by the backend.
    pub async fn convert_all(&self, filename: &str) -> Result<Download, ConsoleError> {
        let _guard = self
            .claim_document(filename, Operation::Convert)
            .map_err(|e| self.fail("Conversion rejected", e))?;

        info!(filename, "Converting document to all formats");
        let archive = self
            .backend
            .convert_all(filename)
            .await
            .map_err(|e| self.fail("Batch conversion failed", e))?;

        let download = Download {
            filename: archive.filename,
            content_type: "application/zip",
            bytes: archive.content.into_bytes(),
        };
        self.events.on_download(&download);
        self.notify(Notice::success(format!(
            "Converted {filename} to all formats"
        )));
        self.resync().await;
        Ok(download)
    }
}
