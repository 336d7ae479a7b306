use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Argon2(#[from] argon2::Error),
    #[error("{1}")]
    Status(Status, String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::Status(Status::NotFound, format!("{} not found", what.into()))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Status(Status::BadRequest, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Status(Status::Unauthorized, message.into())
    }
}

/// The JSON body of every error response.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    /// Respond with the appropriate status code and a displayable message.
    fn respond_to(self, req: &'r rocket::Request<'_>) -> response::Result<'o> {
        let (status, message) = match self {
            Self::Status(status, message) => (status, message),
            // Do not leak internals to the client; the log has the details.
            err => {
                error!("Internal error: {err}");
                (
                    Status::InternalServerError,
                    "The service is temporarily unavailable, please retry".to_string(),
                )
            }
        };
        if status.class().is_client_error() {
            warn!("{} {}", status.code, message);
        }
        let mut response = Json(ErrorBody { error: message }).respond_to(req)?;
        response.set_status(status);
        Ok(response)
    }
}
