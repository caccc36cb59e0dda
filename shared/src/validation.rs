use serde_json::Value;
use crate::models::{ProductId, SubmitVoteRequest, VoteStatusRequest, VoteType};

pub const MAX_VOTER_ID_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid product ID")]
    InvalidProduct,
    #[error("Invalid vote type")]
    InvalidVoteType,
    #[error("Missing voter identifier")]
    MissingVoterId,
    #[error("Voter identifier exceeds maximum length of {MAX_VOTER_ID_LENGTH}")]
    VoterIdTooLong,
}

/// A submission that passed validation and is ready for the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedVote {
    pub voter_id: String,
    pub product: ProductId,
    pub vote_type: VoteType,
}

pub fn validate_submission(request: &SubmitVoteRequest) -> Result<ValidatedVote, ValidationError> {
    let product = request
        .product_id
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|id| id.parse::<ProductId>().ok())
        .ok_or(ValidationError::InvalidProduct)?;

    let vote_type = request
        .vote_type
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|kind| kind.parse::<VoteType>().ok())
        .ok_or(ValidationError::InvalidVoteType)?;

    let voter_id = voter_id(vote_type, as_str(&request.user_id), as_str(&request.fingerprint))?;

    Ok(ValidatedVote { voter_id, product, vote_type })
}

/// Status lookups default to the public vote type when none is given.
pub fn validate_status(request: &VoteStatusRequest) -> Result<String, ValidationError> {
    let vote_type = match &request.vote_type {
        None | Some(Value::Null) => VoteType::Public,
        Some(kind) => kind
            .as_str()
            .and_then(|kind| kind.parse().ok())
            .ok_or(ValidationError::InvalidVoteType)?,
    };
    voter_id(vote_type, as_str(&request.user_id), as_str(&request.fingerprint))
}

/// Non-string identifiers are treated as absent.
fn as_str(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

/// Authenticated voters are keyed by user id, public voters by fingerprint.
/// There is no fallback from one to the other. The identifier is kept
/// exactly as sent; only blank ones are rejected.
pub fn voter_id(
    vote_type: VoteType,
    user_id: Option<&str>,
    fingerprint: Option<&str>,
) -> Result<String, ValidationError> {
    let candidate = match vote_type {
        VoteType::Authenticated => user_id,
        VoteType::Public => fingerprint,
    };

    let id = candidate
        .filter(|id| !id.trim().is_empty())
        .ok_or(ValidationError::MissingVoterId)?;

    if id.len() > MAX_VOTER_ID_LENGTH {
        return Err(ValidationError::VoterIdTooLong);
    }
    Ok(id.to_string())
}
