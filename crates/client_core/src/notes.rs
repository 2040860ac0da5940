use std::sync::Arc;

use shared::{
    domain::{AlgorithmId, Note},
    error::ErrorCode,
    protocol::{NoteUpsert, PageInfo},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    gateway::ApiGateway,
    op::{OpSnapshot, OpState},
    session::Session,
};

#[derive(Default)]
struct NoteSlice {
    /// The note for the algorithm whose detail view is open, and which
    /// algorithm that is. Cleared on unmount/navigation, never deleted
    /// server-side by that action.
    current: Option<Note>,
    open_algorithm: Option<AlgorithmId>,
    my_notes: Vec<Note>,
    page: PageInfo,
    fetch_op: OpState,
    save_op: OpState,
    list_op: OpState,
}

/// Owns the private-note slice. Notes are keyed by (user, algorithm) and
/// fetched lazily when a detail view opens; saving is an upsert.
pub struct NoteStore {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
    inner: RwLock<NoteSlice>,
}

impl NoteStore {
    pub fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self {
            gateway,
            session,
            inner: RwLock::new(NoteSlice::default()),
        }
    }

    /// Loads the signed-in user's note for one algorithm. Navigating to a
    /// different algorithm before this resolves supersedes the request; a
    /// missing note is an empty slot, not an error.
    pub async fn fetch_for_algorithm(&self, algorithm_id: AlgorithmId) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!("note fetch blocked by authorization precheck");
            self.inner.write().await.fetch_op.reject(err.clone());
            return Err(err);
        }
        let token = {
            let mut slice = self.inner.write().await;
            slice.open_algorithm = Some(algorithm_id);
            slice.fetch_op.begin()
        };
        let outcome = self.gateway.get_note(algorithm_id).await;
        let mut slice = self.inner.write().await;
        if !slice.fetch_op.is_current(token) {
            debug!(algorithm = algorithm_id.0, "discarding superseded note response");
            return Ok(());
        }
        match outcome {
            Ok(note) => {
                slice.current = Some(note);
                slice.fetch_op.finish();
                Ok(())
            }
            // No note yet for this pair: an empty slot, not a failure.
            Err(err) if err.code == ErrorCode::NotFound => {
                slice.current = None;
                slice.fetch_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.fetch_op.fail(err.clone());
                Err(err)
            }
        }
    }

    pub async fn upsert(&self, algorithm_id: AlgorithmId, content: &str) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!("note save blocked by authorization precheck");
            self.inner.write().await.save_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.save_op.begin();
        let outcome = self
            .gateway
            .upsert_note(&NoteUpsert {
                algorithm_id,
                content: content.to_string(),
            })
            .await;
        let mut slice = self.inner.write().await;
        if !slice.save_op.is_current(token) {
            debug!(algorithm = algorithm_id.0, "discarding superseded note save response");
            return Ok(());
        }
        match outcome {
            Ok(note) => {
                if slice.open_algorithm == Some(algorithm_id) {
                    slice.current = Some(note.clone());
                }
                if let Some(entry) = slice
                    .my_notes
                    .iter_mut()
                    .find(|entry| entry.algorithm_id == algorithm_id)
                {
                    *entry = note;
                }
                slice.save_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.save_op.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Drops the current-note slot when the owning view unmounts or the
    /// algorithm changes. Also supersedes any fetch still in flight so a
    /// late response cannot repopulate the cleared slot.
    pub async fn clear_current(&self) {
        let mut slice = self.inner.write().await;
        slice.current = None;
        slice.open_algorithm = None;
        slice.fetch_op.invalidate();
    }

    pub async fn fetch_my_notes(&self, page: u64, limit: u64) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!("note listing blocked by authorization precheck");
            self.inner.write().await.list_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.list_op.begin();
        let outcome = self.gateway.list_my_notes(page, limit).await;
        let mut slice = self.inner.write().await;
        if !slice.list_op.is_current(token) {
            debug!("discarding superseded note list response");
            return Ok(());
        }
        match outcome {
            Ok(notes) => {
                slice.my_notes = notes.notes;
                slice.page = notes.page;
                slice.list_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.list_op.fail(err.clone());
                Err(err)
            }
        }
    }

    // ---- selectors ----

    pub async fn current(&self) -> Option<Note> {
        self.inner.read().await.current.clone()
    }

    pub async fn open_algorithm(&self) -> Option<AlgorithmId> {
        self.inner.read().await.open_algorithm
    }

    pub async fn my_notes(&self) -> Vec<Note> {
        self.inner.read().await.my_notes.clone()
    }

    pub async fn page_info(&self) -> PageInfo {
        self.inner.read().await.page
    }

    pub async fn fetch_status(&self) -> OpSnapshot {
        self.inner.read().await.fetch_op.snapshot()
    }

    pub async fn save_status(&self) -> OpSnapshot {
        self.inner.read().await.save_op.snapshot()
    }

    pub async fn list_status(&self) -> OpSnapshot {
        self.inner.read().await.list_op.snapshot()
    }
}
