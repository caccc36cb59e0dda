use serde::{Serialize, Deserialize};
use crate::models::VoteRecord;

/// JSON body of every non-2xx API response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_vote: Option<VoteRecord>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            existing_vote: None,
        }
    }

    pub fn already_voted(existing_vote: VoteRecord) -> Self {
        Self {
            error: "Already voted".into(),
            message: Some(format!(
                "You already voted for {}",
                existing_vote.product_id.display_name()
            )),
            existing_vote: Some(existing_vote),
        }
    }
}
