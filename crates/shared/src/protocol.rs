use serde::{Deserialize, Serialize};

use crate::domain::{
    Algorithm, AlgorithmDraft, AlgorithmId, Difficulty, Note, Proposal, ProposalKind,
    ProposalStatus, VoteDirection,
};

pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Pagination metadata. Always committed to a store in the same transition
/// as the list it describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub pages: u64,
    pub current_page: u64,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            total: 0,
            pages: 0,
            current_page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlgorithmPage {
    #[serde(default)]
    pub algorithms: Vec<Algorithm>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalPage {
    #[serde(default)]
    pub proposals: Vec<Proposal>,
    #[serde(flatten)]
    pub page: PageInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotePage {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(flatten)]
    pub page: PageInfo,
}

/// Query parameters for the plain/filtered algorithm listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub page: u64,
    pub limit: u64,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            difficulty: None,
            category: None,
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListFilter {
    pub fn is_filtered(&self) -> bool {
        self.difficulty.is_some() || self.category.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProposalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

/// Vote intent. `direction` is the single canonical field name for the
/// payload; the server answers with the reconciled entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub direction: VoteDirection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteResponse {
    pub algorithm: Algorithm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalPayload {
    pub kind: ProposalKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<AlgorithmId>,
    pub draft: AlgorithmDraft,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub status: ProposalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpsert {
    pub algorithm_id: AlgorithmId,
    pub content: String,
}
