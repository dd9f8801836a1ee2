//! Error types shared by the store and the HTTP surface.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::NaiveDate;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use thiserror::Error;

/// A payload rejected before it reaches the store.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("film name must not be blank")]
    BlankName,

    #[error("description must be 1 to 200 characters, got {0}")]
    DescriptionLength(usize),

    #[error("release date {0} is before 1895-12-28")]
    ReleaseDateTooEarly(NaiveDate),

    #[error("duration must not be negative, got {0}")]
    NegativeDuration(i32),

    #[error("unknown MPA rating: {0}")]
    UnknownMpa(u64),

    #[error("unknown genre: {0}")]
    UnknownGenre(u64),

    #[error("email must contain '@': {0:?}")]
    InvalidEmail(String),

    #[error("login must be non-empty and contain no whitespace: {0:?}")]
    InvalidLogin(String),

    #[error("birthday {0} is in the future")]
    FutureBirthday(NaiveDate),
}

/// Errors that can occur during store, relationship and query operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced id does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: u64 },

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Self-referential request or unparseable parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("corrupted record: {0}")]
    Corrupted(String),
}

impl Error {
    pub fn not_found(kind: &'static str, id: u64) -> Self {
        Self::NotFound { kind, id }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl From<TransactionError<Error>> for Error {
    fn from(err: TransactionError<Error>) -> Self {
        match err {
            TransactionError::Abort(e) => e,
            TransactionError::Storage(e) => Error::Storage(e),
        }
    }
}

/// Wraps an error so it aborts the surrounding sled transaction.
pub fn abort(err: impl Into<Error>) -> ConflictableTransactionError<Error> {
    ConflictableTransactionError::Abort(err.into())
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Validation(_) | Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Storage(_) | Error::Codec(_) | Error::Corrupted(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() {
            log::error!("{:?}", self);
            "internal storage error".to_owned()
        } else {
            log::debug!("request rejected: {}", self);
            self.to_string()
        };
        HttpResponse::build(status).json(ErrorBody { error: message })
    }
}
