//! Client-side domain state synchronization core for the algorithm
//! write-up platform.
//!
//! Each entity kind (algorithms, change proposals, private notes) lives in
//! its own store: a list read model, a detail read model, pagination and
//! one lifecycle state per operation class. Stores are the only writers of
//! their slice; all network traffic goes through the [`ApiGateway`]
//! boundary, and every asynchronous resolution is committed through a
//! token check so superseded responses are discarded instead of applied.

use std::sync::Arc;

pub mod algorithms;
pub mod error;
pub mod gateway;
pub mod http;
pub mod notes;
mod op;
pub mod proposals;
pub mod search;
pub mod session;

pub use algorithms::{AlgorithmStore, ListMode};
pub use error::StoreError;
pub use gateway::{ApiGateway, GatewayResult, MissingGateway};
pub use http::HttpGateway;
pub use notes::NoteStore;
pub use op::OpSnapshot;
pub use proposals::ProposalStore;
pub use search::{SearchController, SearchSession};
pub use session::{Identity, Session};

/// Bundles the session, the three entity stores and the search controller
/// over one gateway. The UI layer holds this and nothing else.
pub struct PlatformClient {
    pub session: Arc<Session>,
    pub algorithms: Arc<AlgorithmStore>,
    pub proposals: Arc<ProposalStore>,
    pub notes: Arc<NoteStore>,
    pub search: SearchController,
}

impl PlatformClient {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        let session = Arc::new(Session::new());
        let algorithms = Arc::new(AlgorithmStore::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
        ));
        let proposals = Arc::new(ProposalStore::new(
            Arc::clone(&gateway),
            Arc::clone(&session),
        ));
        let notes = Arc::new(NoteStore::new(Arc::clone(&gateway), Arc::clone(&session)));
        let search = SearchController::new(Arc::clone(&algorithms));
        Self {
            session,
            algorithms,
            proposals,
            notes,
            search,
        }
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/algorithms_tests.rs"]
mod algorithms_tests;

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod search_tests;

#[cfg(test)]
#[path = "tests/proposals_tests.rs"]
mod proposals_tests;

#[cfg(test)]
#[path = "tests/notes_tests.rs"]
mod notes_tests;

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod http_tests;
