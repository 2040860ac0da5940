use std::sync::Arc;

use shared::{domain::Difficulty, protocol::ListFilter};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{
    algorithms::{AlgorithmStore, ListMode},
    error::StoreError,
};

/// Transient search/filter session. Exactly one mode is active at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    pub text: String,
    pub difficulty: Option<Difficulty>,
    pub category: Option<String>,
    pub mode: ListMode,
}

/// Decides which list fetch a user input translates into and dispatches it
/// through the algorithm store. Mode precedence: active search text wins
/// over facets until it is cleared. The store's list issuance token is what
/// discards responses from a mode that is no longer current, so a slow
/// previous-mode response can never overwrite a newer result.
pub struct SearchController {
    algorithms: Arc<AlgorithmStore>,
    state: RwLock<SearchSession>,
}

impl SearchController {
    pub fn new(algorithms: Arc<AlgorithmStore>) -> Self {
        Self {
            algorithms,
            state: RwLock::new(SearchSession::default()),
        }
    }

    pub async fn session(&self) -> SearchSession {
        self.state.read().await.clone()
    }

    pub async fn mode(&self) -> ListMode {
        self.state.read().await.mode
    }

    /// Non-empty text enters Searching; clearing it falls back to Filtered
    /// when a facet is set, otherwise Browse. Either way the corresponding
    /// fetch is re-issued.
    pub async fn set_search_text(&self, text: &str) -> Result<(), StoreError> {
        let next = {
            let mut state = self.state.write().await;
            state.text = text.to_string();
            state.mode = if !text.trim().is_empty() {
                ListMode::Searching
            } else if state.difficulty.is_some() || state.category.is_some() {
                ListMode::Filtered
            } else {
                ListMode::Browse
            };
            state.clone()
        };
        self.dispatch(next).await
    }

    pub async fn set_difficulty(&self, difficulty: Option<Difficulty>) -> Result<(), StoreError> {
        let next = {
            let mut state = self.state.write().await;
            state.difficulty = difficulty;
            if state.mode == ListMode::Searching {
                // Text search takes precedence; the facet applies once the
                // text clears.
                debug!("facet change while searching is inert");
                return Ok(());
            }
            state.mode = ListMode::Filtered;
            state.clone()
        };
        self.dispatch(next).await
    }

    pub async fn set_category(&self, category: Option<String>) -> Result<(), StoreError> {
        let next = {
            let mut state = self.state.write().await;
            state.category = category;
            if state.mode == ListMode::Searching {
                debug!("facet change while searching is inert");
                return Ok(());
            }
            state.mode = ListMode::Filtered;
            state.clone()
        };
        self.dispatch(next).await
    }

    /// Resets the facets. Issues the unfiltered fetch unless a search is
    /// active, in which case the search result stays on screen.
    pub async fn clear_filters(&self) -> Result<(), StoreError> {
        let next = {
            let mut state = self.state.write().await;
            state.difficulty = None;
            state.category = None;
            if state.mode == ListMode::Searching {
                return Ok(());
            }
            state.mode = ListMode::Browse;
            state.clone()
        };
        self.dispatch(next).await
    }

    /// Re-issues the fetch for the current mode (user-initiated retry).
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let snapshot = self.state.read().await.clone();
        self.dispatch(snapshot).await
    }

    async fn dispatch(&self, session: SearchSession) -> Result<(), StoreError> {
        match session.mode {
            ListMode::Searching => self.algorithms.search(session.text.trim()).await,
            ListMode::Filtered => {
                self.algorithms
                    .fetch_list(&ListFilter {
                        difficulty: session.difficulty,
                        category: session.category,
                        ..ListFilter::default()
                    })
                    .await
            }
            ListMode::Browse => self.algorithms.fetch_list(&ListFilter::default()).await,
        }
    }
}
