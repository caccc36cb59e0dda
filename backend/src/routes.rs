use std::sync::Arc;
use rocket::{State, get, post, http::{Header, Status}, serde::json::Json, Responder};
use tracing::{debug, error, info, instrument};
use shared::{models::*, user_info::UserInfo, validation::{validate_status, validate_submission}};
use crate::{
    config::Settings,
    error::ApiError,
    rate_limiter::RateLimiter,
    store::VoteStore,
};

pub struct AppState {
    pub store: Arc<dyn VoteStore>,
    pub submit_limiter: RateLimiter,
    pub results_cache_seconds: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn VoteStore>, settings: &Settings) -> Self {
        Self {
            store,
            submit_limiter: RateLimiter::new(settings.submit_rate_limit, settings.submit_rate_window_minutes),
            results_cache_seconds: settings.results_cache_seconds,
        }
    }
}

/// Results with a short-lived `Cache-Control` header.
#[derive(Responder)]
pub struct CachedResults {
    inner: Json<VotingResultsResponse>,
    cache_control: Header<'static>,
}

impl CachedResults {
    fn new(body: VotingResultsResponse, max_age_seconds: u32) -> Self {
        Self {
            inner: Json(body),
            cache_control: Header::new("Cache-Control", format!("public, max-age={max_age_seconds}")),
        }
    }
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[get("/vote/submit")]
pub async fn submit_wrong_method() -> ApiError {
    ApiError::MethodNotAllowed
}

#[get("/vote/status")]
pub async fn status_wrong_method() -> ApiError {
    ApiError::MethodNotAllowed
}

#[post("/vote/results")]
pub async fn results_wrong_method() -> ApiError {
    ApiError::MethodNotAllowed
}

#[instrument(skip(state, request, user_info), fields(product_id, vote_type))]
#[post("/vote/submit", data = "<request>")]
pub async fn submit_vote(
    state: &State<AppState>,
    request: Json<SubmitVoteRequest>,
    user_info: UserInfo,
) -> Result<Json<SubmitVoteResponse>, ApiError> {
    let ballot = validate_submission(&request).map_err(|e| {
        debug!("Rejected vote submission: {}", e);
        ApiError::from(e)
    })?;

    let span = tracing::Span::current();
    span.record("product_id", ballot.product.as_str());
    span.record("vote_type", ballot.vote_type.as_str());

    let rate_limit_key = format!("submit_vote:{}", user_info.user_fingerprint);
    state.submit_limiter
        .check_rate_limit(&rate_limit_key)
        .map_err(ApiError::RateLimited)?;

    let outcome = state.store
        .record_vote(&ballot.voter_id, ballot.product, ballot.vote_type, user_info.user_agent)
        .await
        .map_err(|e| {
            error!("❌ Vote submission failed: {}", e);
            ApiError::Internal
        })?;

    match outcome {
        RecordOutcome::Recorded { vote, stats } => {
            info!("✅ Vote recorded: {} ({}) - Total: {}", ballot.product, ballot.vote_type, stats.total_votes);
            Ok(Json(SubmitVoteResponse {
                success: true,
                message: format!("Vote recorded for {}", ballot.product.display_name()),
                vote,
                stats,
            }))
        }
        RecordOutcome::AlreadyVoted { existing_vote } => {
            debug!("Duplicate vote attempt for {}", existing_vote.product_id);
            Err(ApiError::AlreadyVoted(existing_vote))
        }
    }
}

#[post("/vote/status", data = "<request>")]
pub async fn vote_status(
    state: &State<AppState>,
    request: Json<VoteStatusRequest>,
) -> Result<Json<VoteStatusResponse>, ApiError> {
    let voter_id = validate_status(&request)?;

    let vote = state.store.get_vote(&voter_id).await.map_err(|e| {
        error!("❌ Error checking vote status: {}", e);
        ApiError::Internal
    })?;

    Ok(Json(VoteStatusResponse {
        success: true,
        has_voted: vote.is_some(),
        vote,
    }))
}

#[get("/vote/results")]
pub async fn voting_results(state: &State<AppState>) -> Result<CachedResults, ApiError> {
    let results = state.store.get_results().await.map_err(|e| {
        error!("❌ Error fetching results: {}", e);
        ApiError::Internal
    })?;

    Ok(CachedResults::new(
        VotingResultsResponse { success: true, results },
        state.results_cache_seconds,
    ))
}
