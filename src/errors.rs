// errors.rs
use std::fmt;

/// Errors surfaced by the lifecycle/commission core and the RPC layer above it.
///
/// The first four variants carry a message that the UI shows verbatim, so they
/// must say what went wrong in terms the user can act on.
#[derive(Debug)]
pub enum ServerError {
    /// Malformed or out-of-range input.
    Validation(String),
    /// Referenced property, commission or user does not exist.
    NotFound(String),
    /// Actor lacks the role or ownership required.
    Permission(String),
    /// Operation is not valid for the entity's current lifecycle state.
    State(String),
    Unauthorized(String),
    BadRequest(String),
    DbError(String),
    InternalError,
}

impl ServerError {
    /// Short machine-readable tag used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerError::Validation(_) => "validation_error",
            ServerError::NotFound(_) => "not_found",
            ServerError::Permission(_) => "permission_denied",
            ServerError::State(_) => "invalid_state",
            ServerError::Unauthorized(_) => "unauthorized",
            ServerError::BadRequest(_) => "bad_request",
            ServerError::DbError(_) => "database_error",
            ServerError::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::Validation(msg) => write!(f, "{msg}"),
            ServerError::NotFound(msg) => write!(f, "{msg}"),
            ServerError::Permission(msg) => write!(f, "{msg}"),
            ServerError::State(msg) => write!(f, "{msg}"),
            ServerError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ServerError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            ServerError::DbError(msg) => write!(f, "Database Error: {msg}"),
            ServerError::InternalError => write!(f, "Internal Server Error"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<rusqlite::Error> for ServerError {
    fn from(e: rusqlite::Error) -> Self {
        ServerError::DbError(e.to_string())
    }
}
