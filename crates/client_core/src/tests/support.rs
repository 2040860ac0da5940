use std::{collections::VecDeque, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use shared::{
    domain::{
        Algorithm, AlgorithmDraft, AlgorithmId, Difficulty, Note, Proposal, ProposalKind,
        ProposalStatus, Role, Slug, UserId,
    },
    error::{ApiError, ErrorCode},
    protocol::{
        AlgorithmPage, ListFilter, NotePage, NoteUpsert, PageInfo, ProposalPage, ProposalPayload,
        ProposalQuery, ReviewRequest, VoteRequest, VoteResponse,
    },
};
use tokio::sync::{oneshot, Mutex};

use crate::{
    gateway::{ApiGateway, GatewayResult},
    session::{Identity, Session},
};

type Gated<T> = (Option<oneshot::Receiver<()>>, GatewayResult<T>);

/// Scripted gateway: each endpoint answers from its own response queue, in
/// call order. A gated entry parks the call until the test releases it,
/// which is how resolution order is controlled in the supersession tests.
/// An empty queue answers with an "unexpected call" error so unscripted
/// traffic fails loudly.
#[derive(Default)]
pub(crate) struct TestGateway {
    pub(crate) list_pages: Mutex<VecDeque<Gated<AlgorithmPage>>>,
    pub(crate) search_pages: Mutex<VecDeque<Gated<AlgorithmPage>>>,
    pub(crate) details: Mutex<VecDeque<Gated<Algorithm>>>,
    pub(crate) created: Mutex<VecDeque<Gated<Algorithm>>>,
    pub(crate) updated: Mutex<VecDeque<Gated<Algorithm>>>,
    pub(crate) algorithm_deletes: Mutex<VecDeque<Gated<()>>>,
    pub(crate) votes: Mutex<VecDeque<Gated<VoteResponse>>>,
    pub(crate) categories: Mutex<VecDeque<Gated<Vec<String>>>>,
    pub(crate) proposal_pages: Mutex<VecDeque<Gated<ProposalPage>>>,
    pub(crate) proposal_details: Mutex<VecDeque<Gated<Proposal>>>,
    pub(crate) proposal_created: Mutex<VecDeque<Gated<Proposal>>>,
    pub(crate) proposal_updated: Mutex<VecDeque<Gated<Proposal>>>,
    pub(crate) proposal_reviews: Mutex<VecDeque<Gated<Proposal>>>,
    pub(crate) proposal_deletes: Mutex<VecDeque<Gated<()>>>,
    pub(crate) note_fetches: Mutex<VecDeque<Gated<Note>>>,
    pub(crate) note_saves: Mutex<VecDeque<Gated<Note>>>,
    pub(crate) note_pages: Mutex<VecDeque<Gated<NotePage>>>,
    pub(crate) vote_requests: std::sync::Mutex<Vec<VoteRequest>>,
    calls: std::sync::Mutex<Vec<String>>,
}

impl TestGateway {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) async fn push<T>(queue: &Mutex<VecDeque<Gated<T>>>, result: GatewayResult<T>) {
        queue.lock().await.push_back((None, result));
    }

    pub(crate) async fn push_gated<T>(
        queue: &Mutex<VecDeque<Gated<T>>>,
        result: GatewayResult<T>,
    ) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        queue.lock().await.push_back((Some(gate), result));
        release
    }

    async fn take<T>(
        &self,
        name: &'static str,
        queue: &Mutex<VecDeque<Gated<T>>>,
    ) -> GatewayResult<T> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(name.to_string());
        let entry = queue.lock().await.pop_front();
        match entry {
            Some((gate, result)) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Err(ApiError::new(
                ErrorCode::Internal,
                format!("unexpected {name} call"),
            )),
        }
    }
}

#[async_trait]
impl ApiGateway for TestGateway {
    async fn list_algorithms(&self, _filter: &ListFilter) -> GatewayResult<AlgorithmPage> {
        self.take("list_algorithms", &self.list_pages).await
    }

    async fn search_algorithms(&self, _query: &str) -> GatewayResult<AlgorithmPage> {
        self.take("search_algorithms", &self.search_pages).await
    }

    async fn get_algorithm(&self, _slug: &Slug) -> GatewayResult<Algorithm> {
        self.take("get_algorithm", &self.details).await
    }

    async fn create_algorithm(&self, _payload: &AlgorithmDraft) -> GatewayResult<Algorithm> {
        self.take("create_algorithm", &self.created).await
    }

    async fn update_algorithm(
        &self,
        _slug: &Slug,
        _payload: &AlgorithmDraft,
    ) -> GatewayResult<Algorithm> {
        self.take("update_algorithm", &self.updated).await
    }

    async fn delete_algorithm(&self, _slug: &Slug) -> GatewayResult<()> {
        self.take("delete_algorithm", &self.algorithm_deletes).await
    }

    async fn vote_algorithm(
        &self,
        _slug: &Slug,
        request: &VoteRequest,
    ) -> GatewayResult<VoteResponse> {
        self.vote_requests
            .lock()
            .expect("vote requests lock")
            .push(*request);
        self.take("vote_algorithm", &self.votes).await
    }

    async fn list_categories(&self) -> GatewayResult<Vec<String>> {
        self.take("list_categories", &self.categories).await
    }

    async fn list_proposals(&self, _query: &ProposalQuery) -> GatewayResult<ProposalPage> {
        self.take("list_proposals", &self.proposal_pages).await
    }

    async fn get_proposal(&self, _slug: &Slug) -> GatewayResult<Proposal> {
        self.take("get_proposal", &self.proposal_details).await
    }

    async fn create_proposal(&self, _payload: &ProposalPayload) -> GatewayResult<Proposal> {
        self.take("create_proposal", &self.proposal_created).await
    }

    async fn update_proposal(
        &self,
        _slug: &Slug,
        _payload: &ProposalPayload,
    ) -> GatewayResult<Proposal> {
        self.take("update_proposal", &self.proposal_updated).await
    }

    async fn review_proposal(
        &self,
        _slug: &Slug,
        _request: &ReviewRequest,
    ) -> GatewayResult<Proposal> {
        self.take("review_proposal", &self.proposal_reviews).await
    }

    async fn delete_proposal(&self, _slug: &Slug) -> GatewayResult<()> {
        self.take("delete_proposal", &self.proposal_deletes).await
    }

    async fn get_note(&self, _algorithm_id: AlgorithmId) -> GatewayResult<Note> {
        self.take("get_note", &self.note_fetches).await
    }

    async fn upsert_note(&self, _payload: &NoteUpsert) -> GatewayResult<Note> {
        self.take("upsert_note", &self.note_saves).await
    }

    async fn list_my_notes(&self, _page: u64, _limit: u64) -> GatewayResult<NotePage> {
        self.take("list_my_notes", &self.note_pages).await
    }
}

// ---- fixtures ----

pub(crate) fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

pub(crate) fn algorithm(slug: &str) -> Algorithm {
    Algorithm {
        id: AlgorithmId(1),
        slug: Slug::new(slug),
        title: slug.to_string(),
        categories: vec!["graphs".to_string()],
        difficulty: Difficulty::Easy,
        time_complexity: Some("O(V + E)".to_string()),
        space_complexity: None,
        description: String::new(),
        explanation: String::new(),
        tags: Vec::new(),
        links: Vec::new(),
        code_samples: Vec::new(),
        upvotes: 0,
        downvotes: 0,
        upvoted_by: Vec::new(),
        downvoted_by: Vec::new(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub(crate) fn page_of(algorithms: Vec<Algorithm>) -> AlgorithmPage {
    let total = algorithms.len() as u64;
    AlgorithmPage {
        algorithms,
        page: PageInfo {
            total,
            pages: 1,
            current_page: 1,
        },
    }
}

pub(crate) fn proposal(slug: &str) -> Proposal {
    Proposal {
        slug: Slug::new(slug),
        kind: ProposalKind::Update,
        target: Some(AlgorithmId(1)),
        draft: AlgorithmDraft::default(),
        status: ProposalStatus::Pending,
        review_comment: None,
        author: UserId::new("u1"),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub(crate) fn proposal_page(proposals: Vec<Proposal>) -> ProposalPage {
    let total = proposals.len() as u64;
    ProposalPage {
        proposals,
        page: PageInfo {
            total,
            pages: 1,
            current_page: 1,
        },
    }
}

pub(crate) fn note(algorithm_id: i64, content: &str) -> Note {
    Note {
        algorithm_id: AlgorithmId(algorithm_id),
        user_id: UserId::new("u1"),
        content: content.to_string(),
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

pub(crate) async fn signed_in_session(role: Role) -> Arc<Session> {
    let session = Arc::new(Session::new());
    session.sign_in(Identity::new("u1", role)).await;
    session
}

pub(crate) fn anonymous_session() -> Arc<Session> {
    Arc::new(Session::new())
}
