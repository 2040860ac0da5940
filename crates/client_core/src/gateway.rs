use async_trait::async_trait;
use shared::{
    domain::{Algorithm, AlgorithmDraft, AlgorithmId, Note, Proposal, Slug},
    error::{ApiError, ErrorCode},
    protocol::{
        AlgorithmPage, ListFilter, NotePage, NoteUpsert, ProposalPage, ProposalPayload,
        ProposalQuery, ReviewRequest, VoteRequest, VoteResponse,
    },
};

pub type GatewayResult<T> = Result<T, ApiError>;

/// One method per backend endpoint. Implementations perform the network
/// call and return the decoded payload or an [`ApiError`]; the entity
/// stores are the only callers inside the core.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn list_algorithms(&self, filter: &ListFilter) -> GatewayResult<AlgorithmPage>;
    async fn search_algorithms(&self, query: &str) -> GatewayResult<AlgorithmPage>;
    async fn get_algorithm(&self, slug: &Slug) -> GatewayResult<Algorithm>;
    async fn create_algorithm(&self, payload: &AlgorithmDraft) -> GatewayResult<Algorithm>;
    async fn update_algorithm(
        &self,
        slug: &Slug,
        payload: &AlgorithmDraft,
    ) -> GatewayResult<Algorithm>;
    async fn delete_algorithm(&self, slug: &Slug) -> GatewayResult<()>;
    async fn vote_algorithm(&self, slug: &Slug, request: &VoteRequest)
        -> GatewayResult<VoteResponse>;
    async fn list_categories(&self) -> GatewayResult<Vec<String>>;

    async fn list_proposals(&self, query: &ProposalQuery) -> GatewayResult<ProposalPage>;
    async fn get_proposal(&self, slug: &Slug) -> GatewayResult<Proposal>;
    async fn create_proposal(&self, payload: &ProposalPayload) -> GatewayResult<Proposal>;
    async fn update_proposal(
        &self,
        slug: &Slug,
        payload: &ProposalPayload,
    ) -> GatewayResult<Proposal>;
    async fn review_proposal(
        &self,
        slug: &Slug,
        request: &ReviewRequest,
    ) -> GatewayResult<Proposal>;
    async fn delete_proposal(&self, slug: &Slug) -> GatewayResult<()>;

    async fn get_note(&self, algorithm_id: AlgorithmId) -> GatewayResult<Note>;
    async fn upsert_note(&self, payload: &NoteUpsert) -> GatewayResult<Note>;
    async fn list_my_notes(&self, page: u64, limit: u64) -> GatewayResult<NotePage>;
}

/// Null gateway for contexts without a configured backend; every call is
/// rejected.
pub struct MissingGateway;

fn unavailable() -> ApiError {
    ApiError::new(ErrorCode::Internal, "backend gateway is unavailable")
}

#[async_trait]
impl ApiGateway for MissingGateway {
    async fn list_algorithms(&self, _filter: &ListFilter) -> GatewayResult<AlgorithmPage> {
        Err(unavailable())
    }

    async fn search_algorithms(&self, _query: &str) -> GatewayResult<AlgorithmPage> {
        Err(unavailable())
    }

    async fn get_algorithm(&self, _slug: &Slug) -> GatewayResult<Algorithm> {
        Err(unavailable())
    }

    async fn create_algorithm(&self, _payload: &AlgorithmDraft) -> GatewayResult<Algorithm> {
        Err(unavailable())
    }

    async fn update_algorithm(
        &self,
        _slug: &Slug,
        _payload: &AlgorithmDraft,
    ) -> GatewayResult<Algorithm> {
        Err(unavailable())
    }

    async fn delete_algorithm(&self, _slug: &Slug) -> GatewayResult<()> {
        Err(unavailable())
    }

    async fn vote_algorithm(
        &self,
        _slug: &Slug,
        _request: &VoteRequest,
    ) -> GatewayResult<VoteResponse> {
        Err(unavailable())
    }

    async fn list_categories(&self) -> GatewayResult<Vec<String>> {
        Err(unavailable())
    }

    async fn list_proposals(&self, _query: &ProposalQuery) -> GatewayResult<ProposalPage> {
        Err(unavailable())
    }

    async fn get_proposal(&self, _slug: &Slug) -> GatewayResult<Proposal> {
        Err(unavailable())
    }

    async fn create_proposal(&self, _payload: &ProposalPayload) -> GatewayResult<Proposal> {
        Err(unavailable())
    }

    async fn update_proposal(
        &self,
        _slug: &Slug,
        _payload: &ProposalPayload,
    ) -> GatewayResult<Proposal> {
        Err(unavailable())
    }

    async fn review_proposal(
        &self,
        _slug: &Slug,
        _request: &ReviewRequest,
    ) -> GatewayResult<Proposal> {
        Err(unavailable())
    }

    async fn delete_proposal(&self, _slug: &Slug) -> GatewayResult<()> {
        Err(unavailable())
    }

    async fn get_note(&self, _algorithm_id: AlgorithmId) -> GatewayResult<Note> {
        Err(unavailable())
    }

    async fn upsert_note(&self, _payload: &NoteUpsert) -> GatewayResult<Note> {
        Err(unavailable())
    }

    async fn list_my_notes(&self, _page: u64, _limit: u64) -> GatewayResult<NotePage> {
        Err(unavailable())
    }
}
