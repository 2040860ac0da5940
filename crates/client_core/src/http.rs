use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Algorithm, AlgorithmDraft, AlgorithmId, Note, Proposal, Slug},
    error::{ApiError, ErrorCode},
    protocol::{
        AlgorithmPage, ListFilter, NotePage, NoteUpsert, ProposalPage, ProposalPayload,
        ProposalQuery, ReviewRequest, VoteRequest, VoteResponse,
    },
};
use url::Url;

use crate::gateway::{ApiGateway, GatewayResult};

/// REST implementation of [`ApiGateway`]. Session transport is external:
/// the gateway only attaches a bearer token when one is injected.
pub struct HttpGateway {
    http: Client,
    base: Url,
    bearer_token: Option<String>,
}

impl HttpGateway {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url)
            .map_err(|err| ApiError::new(ErrorCode::Validation, format!("invalid base url: {err}")))?;
        // Url::join treats a missing trailing slash as a file segment.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base,
            bearer_token: None,
        })
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> GatewayResult<Url> {
        self.base
            .join(path)
            .map_err(|err| ApiError::new(ErrorCode::Validation, format!("invalid endpoint: {err}")))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self.http.request(method, url);
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> GatewayResult<T> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(decode_error(status, &body));
        }
        response.json::<T>().await.map_err(|err| {
            ApiError::new(ErrorCode::Internal, format!("malformed response body: {err}"))
        })
    }

    async fn execute_empty(&self, builder: RequestBuilder) -> GatewayResult<()> {
        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(decode_error(status, &body));
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, format!("transport failure: {err}"))
}

/// Prefer the structured `{code, message}` body; fall back to mapping the
/// HTTP status.
fn decode_error(status: StatusCode, body: &str) -> ApiError {
    if let Ok(err) = serde_json::from_str::<ApiError>(body) {
        return err;
    }
    let code = match status {
        StatusCode::BAD_REQUEST => ErrorCode::Validation,
        StatusCode::UNAUTHORIZED => ErrorCode::Unauthorized,
        StatusCode::FORBIDDEN => ErrorCode::Forbidden,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        _ => ErrorCode::Internal,
    };
    let message = if body.is_empty() {
        status.to_string()
    } else {
        body.to_string()
    };
    ApiError::new(code, message)
}

#[async_trait]
impl ApiGateway for HttpGateway {
    async fn list_algorithms(&self, filter: &ListFilter) -> GatewayResult<AlgorithmPage> {
        let url = self.endpoint("api/algorithms")?;
        self.execute(self.request(Method::GET, url).query(filter))
            .await
    }

    async fn search_algorithms(&self, query: &str) -> GatewayResult<AlgorithmPage> {
        let url = self.endpoint("api/algorithms/search")?;
        self.execute(self.request(Method::GET, url).query(&[("q", query)]))
            .await
    }

    async fn get_algorithm(&self, slug: &Slug) -> GatewayResult<Algorithm> {
        let url = self.endpoint(&format!("api/algorithms/{slug}"))?;
        self.execute(self.request(Method::GET, url)).await
    }

    async fn create_algorithm(&self, payload: &AlgorithmDraft) -> GatewayResult<Algorithm> {
        let url = self.endpoint("api/algorithms")?;
        self.execute(self.request(Method::POST, url).json(payload))
            .await
    }

    async fn update_algorithm(
        &self,
        slug: &Slug,
        payload: &AlgorithmDraft,
    ) -> GatewayResult<Algorithm> {
        let url = self.endpoint(&format!("api/algorithms/{slug}"))?;
        self.execute(self.request(Method::PUT, url).json(payload))
            .await
    }

    async fn delete_algorithm(&self, slug: &Slug) -> GatewayResult<()> {
        let url = self.endpoint(&format!("api/algorithms/{slug}"))?;
        self.execute_empty(self.request(Method::DELETE, url)).await
    }

    async fn vote_algorithm(
        &self,
        slug: &Slug,
        request: &VoteRequest,
    ) -> GatewayResult<VoteResponse> {
        let url = self.endpoint(&format!("api/algorithms/{slug}/vote"))?;
        self.execute(self.request(Method::POST, url).json(request))
            .await
    }

    async fn list_categories(&self) -> GatewayResult<Vec<String>> {
        let url = self.endpoint("api/categories")?;
        self.execute(self.request(Method::GET, url)).await
    }

    async fn list_proposals(&self, query: &ProposalQuery) -> GatewayResult<ProposalPage> {
        let url = self.endpoint("api/proposals")?;
        self.execute(self.request(Method::GET, url).query(query))
            .await
    }

    async fn get_proposal(&self, slug: &Slug) -> GatewayResult<Proposal> {
        let url = self.endpoint(&format!("api/proposals/{slug}"))?;
        self.execute(self.request(Method::GET, url)).await
    }

    async fn create_proposal(&self, payload: &ProposalPayload) -> GatewayResult<Proposal> {
        let url = self.endpoint("api/proposals")?;
        self.execute(self.request(Method::POST, url).json(payload))
            .await
    }

    async fn update_proposal(
        &self,
        slug: &Slug,
        payload: &ProposalPayload,
    ) -> GatewayResult<Proposal> {
        let url = self.endpoint(&format!("api/proposals/{slug}"))?;
        self.execute(self.request(Method::PUT, url).json(payload))
            .await
    }

    async fn review_proposal(
        &self,
        slug: &Slug,
        request: &ReviewRequest,
    ) -> GatewayResult<Proposal> {
        let url = self.endpoint(&format!("api/proposals/{slug}/review"))?;
        self.execute(self.request(Method::PUT, url).json(request))
            .await
    }

    async fn delete_proposal(&self, slug: &Slug) -> GatewayResult<()> {
        let url = self.endpoint(&format!("api/proposals/{slug}"))?;
        self.execute_empty(self.request(Method::DELETE, url)).await
    }

    async fn get_note(&self, algorithm_id: AlgorithmId) -> GatewayResult<Note> {
        let url = self.endpoint(&format!("api/notes/{}", algorithm_id.0))?;
        self.execute(self.request(Method::GET, url)).await
    }

    async fn upsert_note(&self, payload: &NoteUpsert) -> GatewayResult<Note> {
        let url = self.endpoint("api/notes")?;
        self.execute(self.request(Method::POST, url).json(payload))
            .await
    }

    async fn list_my_notes(&self, page: u64, limit: u64) -> GatewayResult<NotePage> {
        let url = self.endpoint("api/notes/mine")?;
        self.execute(
            self.request(Method::GET, url)
                .query(&[("page", page), ("limit", limit)]),
        )
        .await
    }
}
