use std::sync::Arc;

use shared::{
    domain::{Proposal, ProposalStatus, Slug},
    protocol::{PageInfo, ProposalPayload, ProposalQuery, ReviewRequest},
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
struct ProposalSlice {
    list: Vec<Proposal>,
    page: PageInfo,
    current: Option<Proposal>,
    list_op: OpState,
    detail_op: OpState,
    save_op: OpState,
    review_op: OpState,
    delete_op: OpState,
}

/// Owns the change-proposal slice. Creating and editing require a
/// signed-in identity (ownership is enforced server-side); review and
/// delete are admin actions. A proposal's status moves exactly once per
/// review; the store only applies the entity the server returns.
pub struct ProposalStore {
    gateway: Arc<dyn ApiGateway>,
    session: Arc<Session>,
    inner: RwLock<ProposalSlice>,
}

impl ProposalStore {
    pub fn new(gateway: Arc<dyn ApiGateway>, session: Arc<Session>) -> Self {
        Self {
            gateway,
            session,
            inner: RwLock::new(ProposalSlice::default()),
        }
    }

    pub async fn fetch_list(&self, query: &ProposalQuery) -> Result<(), StoreError> {
        let token = self.inner.write().await.list_op.begin();
        let outcome = self.gateway.list_proposals(query).await;
        let mut slice = self.inner.write().await;
        if !slice.list_op.is_current(token) {
            debug!("discarding superseded proposal list response");
            return Ok(());
        }
        match outcome {
            Ok(page) => {
                slice.list = page.proposals;
                slice.page = page.page;
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

    pub async fn fetch_one(&self, slug: &Slug) -> Result<(), StoreError> {
        let token = self.inner.write().await.detail_op.begin();
        let outcome = self.gateway.get_proposal(slug).await;
        let mut slice = self.inner.write().await;
        if !slice.detail_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded proposal detail response");
            return Ok(());
        }
        match outcome {
            Ok(proposal) => {
                slice.current = Some(proposal);
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

    pub async fn clear_current(&self) {
        let mut slice = self.inner.write().await;
        slice.current = None;
        slice.detail_op.invalidate();
    }

    pub async fn create(&self, payload: &ProposalPayload) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!("proposal create blocked by authorization precheck");
            self.inner.write().await.save_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.save_op.begin();
        let outcome = self.gateway.create_proposal(payload).await;
        let mut slice = self.inner.write().await;
        if !slice.save_op.is_current(token) {
            debug!("discarding superseded proposal create response");
            return Ok(());
        }
        match outcome {
            Ok(proposal) => {
                slice.list.insert(0, proposal);
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

    pub async fn update(&self, slug: &Slug, payload: &ProposalPayload) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_identity().await {
            warn!(slug = %slug, "proposal update blocked by authorization precheck");
            self.inner.write().await.save_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.save_op.begin();
        let outcome = self.gateway.update_proposal(slug, payload).await;
        let mut slice = self.inner.write().await;
        if !slice.save_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded proposal update response");
            return Ok(());
        }
        match outcome {
            Ok(proposal) => {
                apply_entity(&mut slice, &proposal);
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

    pub async fn review(
        &self,
        slug: &Slug,
        status: ProposalStatus,
        comment: Option<String>,
    ) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_admin().await {
            warn!(slug = %slug, "proposal review blocked by authorization precheck");
            self.inner.write().await.review_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.review_op.begin();
        let outcome = self
            .gateway
            .review_proposal(slug, &ReviewRequest { status, comment })
            .await;
        let mut slice = self.inner.write().await;
        if !slice.review_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded review response");
            return Ok(());
        }
        match outcome {
            Ok(proposal) => {
                apply_entity(&mut slice, &proposal);
                slice.review_op.finish();
                Ok(())
            }
            Err(err) => {
                let err = StoreError::from(err);
                slice.review_op.fail(err.clone());
                Err(err)
            }
        }
    }

    pub async fn delete(&self, slug: &Slug) -> Result<(), StoreError> {
        if let Err(err) = self.session.require_admin().await {
            warn!(slug = %slug, "proposal delete blocked by authorization precheck");
            self.inner.write().await.delete_op.reject(err.clone());
            return Err(err);
        }
        let token = self.inner.write().await.delete_op.begin();
        let outcome = self.gateway.delete_proposal(slug).await;
        let mut slice = self.inner.write().await;
        if !slice.delete_op.is_current(token) {
            debug!(slug = %slug, "discarding superseded proposal delete response");
            return Ok(());
        }
        match outcome {
            Ok(()) => {
                slice.list.retain(|entry| &entry.slug != slug);
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

    // ---- selectors ----

    pub async fn list(&self) -> Vec<Proposal> {
        self.inner.read().await.list.clone()
    }

    pub async fn page_info(&self) -> PageInfo {
        self.inner.read().await.page
    }

    pub async fn current(&self) -> Option<Proposal> {
        self.inner.read().await.current.clone()
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

    pub async fn review_status(&self) -> OpSnapshot {
        self.inner.read().await.review_op.snapshot()
    }

    pub async fn delete_status(&self) -> OpSnapshot {
        self.inner.read().await.delete_op.snapshot()
    }
}

fn apply_entity(slice: &mut ProposalSlice, proposal: &Proposal) {
    if let Some(entry) = slice
        .list
        .iter_mut()
        .find(|entry| entry.slug == proposal.slug)
    {
        *entry = proposal.clone();
    }
    if slice
        .current
        .as_ref()
        .is_some_and(|current| current.slug == proposal.slug)
    {
        slice.current = Some(proposal.clone());
    }
}
