//! Simple and advanced search.

use super::DocumentConsole;
use crate::error::ConsoleError;
use crate::model::{SearchFilters, SearchQuery, SearchResult};
use crate::state::SearchState;
use tracing::{debug, info};

impl DocumentConsole {
    /// Free-text and filtered search in one request.
    ///
    /// Blank text with no filter clears the results and sends nothing.
    /// Results are stored in backend order; on failure the previous results
    /// stay.
    pub async fn search(
        &self,
        text: &str,
        filters: SearchFilters,
    ) -> Result<Vec<SearchResult>, ConsoleError> {
        let query = SearchQuery::new(text, filters);
        {
            let mut view = self.view();
            view.search.query = query.text.clone();
            view.search.filters = query.filters.clone();
            if query.is_blank() {
                debug!("Blank search; clearing results");
                view.search.results.clear();
                return Ok(Vec::new());
            }
        }

        info!(text = %query.text, "Searching documents");
        match self.backend.search(&query).await {
            Ok(results) => {
                debug!(count = results.len(), "Search complete");
                self.view().search.results = results.clone();
                Ok(results)
            }
            Err(e) => Err(self.fail("Search failed", e)),
        }
    }

    /// Free-text search with no filters.
    pub async fn simple_search(&self, text: &str) -> Result<Vec<SearchResult>, ConsoleError> {
        self.search(text, SearchFilters::default()).await
    }

    /// Clear query, filters and results.
    pub fn reset_search(&self) {
        self.view().search = SearchState::default();
    }
}
