//! Keyword/summary analysis and entity extraction.
//!
//! Results are stored per filename, so switching documents never shows
//! another document's leftovers.

use super::DocumentConsole;
use crate::error::ConsoleError;
use crate::model::{Analysis, EntitySet};
use crate::state::{DerivedResults, Operation};
use tracing::info;

impl DocumentConsole {
    /// Keywords and summary for `filename`.
    ///
    /// Rejected with `Busy` while an analysis of the same document runs;
    /// other documents are unaffected.
    pub async fn analyze(&self, filename: &str) -> Result<Analysis, ConsoleError> {
        let _guard = self
            .claim_document(filename, Operation::Analyze)
            .map_err(|e| self.fail("Analysis rejected", e))?;

        info!(filename, "Analysing document");
        let analysis = self
            .backend
            .analysis(filename)
            .await
            .map_err(|e| self.fail("Document analysis failed", e))?;
        self.derived_mut(filename, |d| d.analysis = Some(analysis.clone()));
        Ok(analysis)
    }

    pub async fn summary(&self, filename: &str) -> Result<String, ConsoleError> {
        info!(filename, "Requesting summary");
        let summary = self
            .backend
            .summary(filename)
            .await
            .map_err(|e| self.fail("Failed to generate summary", e))?;
        self.derived_mut(filename, |d| d.summary = Some(summary.clone()));
        Ok(summary)
    }

    pub async fn extract_entities(&self, filename: &str) -> Result<EntitySet, ConsoleError> {
        info!(filename, "Extracting entities");
        let entities = self
            .backend
            .entities(filename)
            .await
            .map_err(|e| self.fail("Entity extraction failed", e))?;
        self.derived_mut(filename, |d| d.entities = Some(entities.clone()));
        Ok(entities)
    }

    fn derived_mut(&self, filename: &str, apply: impl FnOnce(&mut DerivedResults)) {
        let mut view = self.view();
        apply(view.derived.entry(filename.to_string()).or_default());
    }
}
