use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use shared::{ErrorResponse, ValidationError, VoteRecord};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Already voted")]
    AlreadyVoted(VoteRecord),
    #[error("{0}")]
    RateLimited(String),
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Validation(_) => Status::BadRequest,
            ApiError::AlreadyVoted(_) => Status::Conflict,
            ApiError::RateLimited(_) => Status::TooManyRequests,
            ApiError::MethodNotAllowed => Status::MethodNotAllowed,
            ApiError::Internal => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        let body = match self {
            ApiError::AlreadyVoted(existing_vote) => ErrorResponse::already_voted(existing_vote),
            other => ErrorResponse::new(other.to_string()),
        };

        rocket::Response::build_from(Json(body).respond_to(req)?)
            .status(status)
            .ok()
    }
}
