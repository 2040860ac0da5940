use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(UserId);
string_id!(Slug);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlgorithmId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDirection {
    Upvote,
    Downvote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Pending,
    Approved,
    Rejected,
    Merged,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Approved => "approved",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Merged => "merged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeSample {
    pub language: String,
    pub code: String,
}

/// One algorithm write-up as served by the backend. `slug` is the stable
/// identity key; the vote arrays are authoritative and the tally counts are
/// server-computed alongside them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    pub id: AlgorithmId,
    pub slug: Slug,
    pub title: String,
    #[serde(default, deserialize_with = "de_string_list")]
    pub categories: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub time_complexity: Option<String>,
    #[serde(default)]
    pub space_complexity: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, deserialize_with = "de_string_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub code_samples: Vec<CodeSample>,
    #[serde(default)]
    pub upvotes: i64,
    #[serde(default)]
    pub downvotes: i64,
    #[serde(default)]
    pub upvoted_by: Vec<UserId>,
    #[serde(default)]
    pub downvoted_by: Vec<UserId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Algorithm {
    /// Derives the given user's vote from the authoritative membership
    /// arrays. Computed fresh on every read so the displayed vote can never
    /// drift from the tallies.
    pub fn vote_of(&self, user: &UserId) -> Option<VoteDirection> {
        if self.upvoted_by.contains(user) {
            Some(VoteDirection::Upvote)
        } else if self.downvoted_by.contains(user) {
            Some(VoteDirection::Downvote)
        } else {
            None
        }
    }
}

/// Mutation payload mirroring the algorithm shape. Also embedded in change
/// proposals as the proposed draft.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<Slug>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub space_complexity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, deserialize_with = "de_string_list")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub code_samples: Vec<CodeSample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub slug: Slug,
    pub kind: ProposalKind,
    #[serde(default)]
    pub target: Option<AlgorithmId>,
    pub draft: AlgorithmDraft,
    pub status: ProposalStatus,
    #[serde(default)]
    pub review_comment: Option<String>,
    pub author: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Private annotation, at most one per (user, algorithm) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub algorithm_id: AlgorithmId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin editing flows emit `categories`/`tags` either as a JSON array or as
/// one comma-delimited string. Normalize to a list at the wire boundary so
/// the rest of the client only ever sees `Vec<String>`.
fn de_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrDelimited {
        List(Vec<String>),
        Delimited(String),
    }

    let items = match ListOrDelimited::deserialize(deserializer)? {
        ListOrDelimited::List(items) => items,
        ListOrDelimited::Delimited(raw) => raw.split(',').map(String::from).collect(),
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_algorithm() -> serde_json::Value {
        json!({
            "id": 7,
            "slug": "bfs",
            "title": "Breadth-First Search",
            "categories": ["graphs"],
            "difficulty": "easy",
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-02T00:00:00Z",
        })
    }

    #[test]
    fn vote_of_reads_membership_arrays() {
        let mut value = base_algorithm();
        value["upvotedBy"] = json!(["u1"]);
        value["downvotedBy"] = json!(["u2"]);
        let algorithm: Algorithm = serde_json::from_value(value).expect("decode");

        assert_eq!(
            algorithm.vote_of(&UserId::new("u1")),
            Some(VoteDirection::Upvote)
        );
        assert_eq!(
            algorithm.vote_of(&UserId::new("u2")),
            Some(VoteDirection::Downvote)
        );
        assert_eq!(algorithm.vote_of(&UserId::new("u3")), None);
    }

    #[test]
    fn categories_accept_delimited_string() {
        let mut value = base_algorithm();
        value["categories"] = json!("graphs, traversal , ,trees");
        let algorithm: Algorithm = serde_json::from_value(value).expect("decode");
        assert_eq!(algorithm.categories, vec!["graphs", "traversal", "trees"]);
    }

    #[test]
    fn tags_default_to_empty_when_absent() {
        let algorithm: Algorithm = serde_json::from_value(base_algorithm()).expect("decode");
        assert!(algorithm.tags.is_empty());
        assert_eq!(algorithm.upvotes, 0);
        assert!(algorithm.upvoted_by.is_empty());
    }
}
