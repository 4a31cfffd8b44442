// responses/errors.rs
use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

pub type ResultResp = Result<Response, ServerError>;

pub fn status_code(err: &ServerError) -> u16 {
    match err {
        ServerError::Validation(_) | ServerError::BadRequest(_) => 400,
        ServerError::Unauthorized(_) => 401,
        ServerError::Permission(_) => 403,
        ServerError::NotFound(_) => 404,
        ServerError::State(_) => 409,
        ServerError::DbError(_) | ServerError::InternalError => 500,
    }
}

/// Convert a ServerError into a JSON error body. Storage details are logged,
/// never sent to the client.
pub fn error_to_response(err: ServerError) -> Response {
    let status = status_code(&err);
    let message = match &err {
        ServerError::DbError(detail) => {
            log::error!("database error: {detail}");
            "Internal Server Error".to_string()
        }
        ServerError::InternalError => "Internal Server Error".to_string(),
        ServerError::Validation(msg)
        | ServerError::NotFound(msg)
        | ServerError::Permission(msg)
        | ServerError::State(msg)
        | ServerError::Unauthorized(msg)
        | ServerError::BadRequest(msg) => msg.clone(),
    };
    if status < 500 {
        log::warn!("request refused ({status} {}): {message}", err.kind());
    }

    let body = json!({ "error": err.kind(), "message": message }).to_string();
    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::empty()))
}
