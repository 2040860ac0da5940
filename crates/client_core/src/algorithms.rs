use std::{collections::BTreeMap, sync::Arc};

use shared::{
    domain::{Algorithm, AlgorithmDraft, Slug, VoteDirection},
    error::ApiError,
    protocol::{AlgorithmPage, ListFilter, PageInfo, VoteRequest},
};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::{
    error::StoreError,
    gateway::ApiGateway,
    op::{OpSnapshot, OpState},
    session::Session,
};

/// Which kind of list request produced the visible list. Exactly one mode
/// is active at a time; the search controller drives transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListMode {
    #[default]
    Browse,
    Filtered,
    Searching,
}

#[derive(Default)]
struct AlgorithmSlice {
    list: Vec<Algorithm>,
    page: PageInfo,
    list_mode: ListMode,
    current: Option<Algorithm>,
    categories: Vec<String>,
    list_op: OpState,
    detail_op: OpState,
    save_op: OpState,
    delete_op: OpState,
    vote_op: OpState,
    categories_op: OpState,
}

/// Owns the algorithm slice: the list read model, the detail read model,
/// the category catalog and one lifecycle state per operation class. All
/// mutation goes through the operation methods below; every commit is
/// guarded by the issuing token so a superseded response can never
/// overwrite a newer one.
pub struct AlgorithmStore {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
    inner: RwLock<AlgorithmSlice>,
}

impl AlgorithmStore {
    pub fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self {
            gateway,
            session,
            inner: RwLock::new(AlgorithmSlice::default()),
        }
    }

    // ---- list class (browse, filtered and search share one class) ----

    pub async fn fetch_list(&self, filter: &ListFilter) -> Result<(), StoreError> {
        let mode = if filter.is_filtered() {
            ListMode::Filtered
        } else {
            ListMode::Browse
        };
        let token = self.inner.write().await.list_op.begin();
        let outcome = self.gateway.list_algorithms(filter).await;
        self.commit_list(token, mode, outcome).await
    }

    pub async fn search(&self, query: &str) -> Result<(), StoreError> {
        let token = self.inner.write().await.list_op.begin();
        let outcome = self.gateway.search_algorithms(query).await;
        self.commit_list(token, ListMode::Searching, outcome).await
    }

    async fn commit_list(
        &self,
        token: u64,
        mode: ListMode,
        outcome: Result<AlgorithmPage, ApiError>,
    ) -> Result<(), StoreError> {
        let mut slice = self.inner.write().await;
        if !slice.list_op.is_current(token) {
            debug!(?mode, "discarding superseded list response");
            return Ok(());
        }
        match outcome {
            Ok(page) => {
                // The list and its pagination always move together.
                slice.list = page.algorithms;
                slice.page = page.page;
                slice.list_mode = mode;
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

    // ---- detail class ----

    pub async fn fetch_one(&self, slug: &Slug) -> Result<(), StoreError> {
        let token = self.inner.write().await.detail_op.begin();
        let outcome = self.gateway.get_algorithm(slug).await;
        let mut slice = self.inner.write().await;
        if !slice.detail_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded detail response");
            return Ok(());
        }
        match outcome {
            Ok(algorithm) => {
                slice.current = Some(algorithm);
                slice.detail_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.detail_op.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Clears the detail slot; called by the owning view on unmount or
    /// navigation. Deliberately not part of delete. Also supersedes any
    /// detail fetch still in flight so a late response cannot refill the
    /// cleared slot.
    pub async fn clear_current(&self) {
        let mut slice = self.inner.write().await;
        slice.current = None;
        slice.detail_op.invalidate();
    }

    // ---- mutation classes ----

    pub async fn create(&self, draft: &AlgorithmDraft) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_admin().await {
            warn!("algorithm create blocked by authorization precheck");
            self.inner.write().await.save_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.save_op.begin();
        let outcome = self.gateway.create_algorithm(draft).await;
        let mut slice = self.inner.write().await;
        if !slice.save_op.is_current(token) {
            debug!("discarding superseded create response");
            return Ok(());
        }
        match outcome {
            Ok(algorithm) => {
                // The list is newest-first; no refetch.
                slice.list.insert(0, algorithm);
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

    pub async fn update(&self, slug: &Slug, draft: &AlgorithmDraft) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_admin().await {
            warn!(slug = %slug, "algorithm update blocked by authorization precheck");
            self.inner.write().await.save_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.save_op.begin();
        let outcome = self.gateway.update_algorithm(slug, draft).await;
        let mut slice = self.inner.write().await;
        if !slice.save_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded update response");
            return Ok(());
        }
        match outcome {
            Ok(algorithm) => {
                apply_entity(&mut slice, &algorithm);
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

    pub async fn delete(&self, slug: &Slug) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_admin().await {
            warn!(slug = %slug, "algorithm delete blocked by authorization precheck");
            self.inner.write().await.delete_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.delete_op.begin();
        let outcome = self.gateway.delete_algorithm(slug).await;
        let mut slice = self.inner.write().await;
        if !slice.delete_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded delete response");
            return Ok(());
        }
        match outcome {
            Ok(()) => {
                slice.list.retain(|entry| &entry.slug != slug);
                // The detail slot is only cleared by an explicit
                // clear_current from the caller.
                slice.delete_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.delete_op.fail(err.clone());
                Err(err)
            }
        }
    }

    /// Sends the vote intent and reconciles against the server-computed
    /// tally: the returned entity replaces the local vote fields wholesale,
    /// never an increment, so server-side toggle/undo semantics are
    /// reflected verbatim.
    pub async fn vote(&self, slug: &Slug, direction: VoteDirection) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!(slug = %slug, "vote blocked by authorization precheck");
            self.inner.write().await.vote_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.vote_op.begin();
        let outcome = self
            .gateway
            .vote_algorithm(slug, &VoteRequest { direction })
            .await;
        let mut slice = self.inner.write().await;
        if !slice.vote_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded vote response");
            return Ok(());
        }
        match outcome {
            Ok(response) => {
                apply_entity(&mut slice, &response.algorithm);
                slice.vote_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.vote_op.fail(err.clone());
                Err(err)
            }
        }
    }

    // ---- category catalog ----

    pub async fn fetch_categories(&self) -> Result<(), StoreError> {
        let token = self.inner.write().await.categories_op.begin();
        let outcome = self.gateway.list_categories().await;
        let mut slice = self.inner.write().await;
        if !slice.categories_op.is_current(token) {
            debug!("discarding superseded category response");
            return Ok(());
        }
        match outcome {
            Ok(categories) => {
                slice.categories = categories;
                slice.categories_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.categories_op.fail(err.clone());
                Err(err)
            }
        }
    }

    // ---- selectors ----

    pub async fn list(&self) -> Vec<Algorithm> {
        self.inner.read().await.list.clone()
    }

    pub async fn page_info(&self) -> PageInfo {
        self.inner.read().await.page
    }

    pub async fn list_mode(&self) -> ListMode {
        self.inner.read().await.list_mode
    }

    pub async fn current(&self) -> Option<Algorithm> {
        self.inner.read().await.current.clone()
    }

    pub async fn categories(&self) -> Vec<String> {
        self.inner.read().await.categories.clone()
    }

    /// Browse read model: the flat list grouped by category. Purely
    /// derived; entities with no category land under an empty key.
    pub async fn grouped_by_category(&self) -> BTreeMap<String, Vec<Algorithm>> {
        let slice = self.inner.read().await;
        let mut groups: BTreeMap<String, Vec<Algorithm>> = BTreeMap::new();
        for algorithm in &slice.list {
            if algorithm.categories.is_empty() {
                groups
                    .entry(String::new())
                    .or_default()
                    .push(algorithm.clone());
                continue;
            }
            for category in &algorithm.categories {
                groups
                    .entry(category.clone())
                    .or_default()
                    .push(algorithm.clone());
            }
        }
        groups
    }

    /// The signed-in user's vote on one algorithm, derived fresh from the
    /// authoritative arrays (detail slot preferred, list entry otherwise).
    pub async fn current_user_vote(&self, slug: &Slug) -> Option<VoteDirection> {
        let user = self.session.current_user().await?;
        let slice = self.inner.read().await;
        slice
            .current
            .as_ref()
            .filter(|current| &current.slug == slug)
            .or_else(|| slice.list.iter().find(|entry| &entry.slug == slug))
            .and_then(|algorithm| algorithm.vote_of(&user))
    }

    pub async fn list_status(&self) -> OpSnapshot {
        self.inner.read().await.list_op.snapshot()
    }

    pub async fn detail_status(&self) -> OpSnapshot {
        self.inner.read().await.detail_op.snapshot()
    }

    pub async fn save_status(&self) -> OpSnapshot {
        self.inner.read().await.save_op.snapshot()
    }

    pub async fn delete_status(&self) -> OpSnapshot {
        self.inner.read().await.delete_op.snapshot()
    }

    pub async fn vote_status(&self) -> OpSnapshot {
        self.inner.read().await.vote_op.snapshot()
    }

    pub async fn categories_status(&self) -> OpSnapshot {
        self.inner.read().await.categories_op.snapshot()
    }
}

/// Fans one authoritative entity out to both read models: the list entry
/// with the same slug and, when it matches, the detail slot. Keeping the
/// two views convergent after update/vote is the primary invariant here.
fn apply_entity(slice: &mut AlgorithmSlice, algorithm: &Algorithm) {
    if let Some(entry) = slice
        .list
        .iter_mut()
        .find(|entry| entry.slug == algorithm.slug)
    {
        *entry = algorithm.clone();
    }
    if slice
        .current
        .as_ref()
        .is_some_and(|current| current.slug == algorithm.slug)
    {
        slice.current = Some(algorithm.clone());
    }
}
