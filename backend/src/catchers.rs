use rocket::{Request, catch, serde::json::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct ErrorMessage {
    error: String,
    status: u16,
}

#[catch(400)]
pub fn bad_request(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        error: "Invalid request parameters.".into(),
        status: 400
    })
}

#[catch(404)]
pub fn not_found(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        error: "The requested resource was not found.".into(),
        status: 404
    })
}

#[catch(422)]
pub fn unprocessable_entity(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        error: "Request body could not be parsed.".into(),
        status: 422
    })
}

#[catch(429)]
pub fn too_many_requests(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        error: "Rate limit exceeded. Please wait before trying again.".into(),
        status: 429
    })
}

#[catch(500)]
pub fn internal_error(_req: &Request) -> Json<ErrorMessage> {
    Json(ErrorMessage {
        error: "Internal server error".into(),
        status: 500
    })
}
