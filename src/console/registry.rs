//! Registry mirror: the document list and the tag vocabulary.

use super::DocumentConsole;
use crate::error::ConsoleError;
use crate::model::Document;
use tracing::{debug, info, warn};

impl DocumentConsole {
    /// Re-list documents and replace the mirror.
    ///
    /// On failure the previous list is kept and an error notice is emitted.
    pub async fn refresh(&self) -> Result<Vec<Document>, ConsoleError> {
        match self.backend.list_documents().await {
            Ok(documents) => {
                debug!(count = documents.len(), "Registry refreshed");
                self.view().documents = documents.clone();
                Ok(documents)
            }
            Err(e) => Err(self.fail("Failed to load the document list", e)),
        }
    }

    /// Re-list the tag vocabulary.
    ///
    /// Failures are logged only: tags feed search suggestions and must not
    /// interrupt the user.
    pub async fn refresh_tags(&self) -> Result<Vec<String>, ConsoleError> {
        match self.backend.list_tags().await {
            Ok(tags) => {
                self.view().tags = tags.clone();
                Ok(tags)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load tags");
                Err(e)
            }
        }
    }

    /// Initial load: documents and tags concurrently.
    pub async fn load(&self) -> Result<(), ConsoleError> {
        info!(base_url = %self.config.base_url, "Loading console");
        let (documents, _tags) = futures::join!(self.refresh(), self.refresh_tags());
        documents.map(drop)
    }
}
