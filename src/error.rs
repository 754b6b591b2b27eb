//!
//! # Error Handling
//!
//! This module defines `AppError`, the single error type returned by every layer of the
//! crate, and `ErrorKind`, the closed taxonomy callers branch on.
//!
//! Domain errors (a taken slug, a missing card, a non-member touching a board) travel
//! upward unchanged. Infrastructure failures (hashing, persistence I/O, configuration)
//! carry context for the logs but are rendered to clients as an opaque internal error.
//!
//! `AppError` implements `actix_web::error::ResponseError`, which is the only place an
//! `ErrorKind` is mapped to an HTTP status code.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// The closed set of error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    InvalidCredentials,
    InvalidToken,
    ExpiredToken,
    InvalidRefreshToken,
    /// Credentials were required but not presented.
    Unauthorized,
    Forbidden,
    Conflict,
    Validation,
    BadRequest,
    Internal,
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::AlreadyExists | ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidCredentials
            | ErrorKind::InvalidToken
            | ErrorKind::ExpiredToken
            | ErrorKind::InvalidRefreshToken
            | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Represents all possible errors that can occur within the application.
#[derive(Debug)]
pub enum AppError {
    // identity
    UserAlreadyExists,
    UserNotFound,
    InvalidCredentials,
    EmailAlreadyTaken,
    UsernameAlreadyTaken,

    // tokens
    InvalidToken,
    ExpiredToken,
    InvalidRefreshToken,
    /// No bearer credentials were supplied.
    Unauthorized(String),

    // boards and membership
    BoardNotFound,
    BoardAlreadyExists,
    BoardMemberNotFound,
    NotBoardMember,
    NotBoardOwner,
    CannotRemoveOwner,
    InvalidBoardPassword,
    AlreadyBoardMember,
    InvalidBoardSlug(String),

    // lists and cards
    ListNotFound,
    CardNotFound,
    CardMoveAcrossBoards,

    /// Input failed a domain or payload rule (HTTP 422).
    ValidationError(String),
    /// The request could not be understood at all (HTTP 400).
    BadRequest(String),

    /// Startup configuration is missing or out of range.
    Configuration(String),
    /// Unexpected server-side failure such as hashing or token signing.
    InternalServerError(String),
    /// Failure reported by the persistence layer.
    DatabaseError(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UserAlreadyExists | AppError::BoardAlreadyExists => ErrorKind::AlreadyExists,
            AppError::UserNotFound
            | AppError::BoardNotFound
            | AppError::BoardMemberNotFound
            | AppError::ListNotFound
            | AppError::CardNotFound => ErrorKind::NotFound,
            AppError::InvalidCredentials => ErrorKind::InvalidCredentials,
            AppError::InvalidToken => ErrorKind::InvalidToken,
            AppError::ExpiredToken => ErrorKind::ExpiredToken,
            AppError::InvalidRefreshToken => ErrorKind::InvalidRefreshToken,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::NotBoardMember
            | AppError::NotBoardOwner
            | AppError::CannotRemoveOwner
            | AppError::InvalidBoardPassword => ErrorKind::Forbidden,
            AppError::AlreadyBoardMember
            | AppError::EmailAlreadyTaken
            | AppError::UsernameAlreadyTaken => ErrorKind::Conflict,
            AppError::InvalidBoardSlug(_)
            | AppError::CardMoveAcrossBoards
            | AppError::ValidationError(_) => ErrorKind::Validation,
            AppError::BadRequest(_) => ErrorKind::BadRequest,
            AppError::Configuration(_)
            | AppError::InternalServerError(_)
            | AppError::DatabaseError(_) => ErrorKind::Internal,
        }
    }

    /// The message safe to show a client. Internal detail is withheld.
    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::UserAlreadyExists => write!(f, "User already exists"),
            AppError::UserNotFound => write!(f, "User not found"),
            AppError::InvalidCredentials => write!(f, "Invalid email or password"),
            AppError::EmailAlreadyTaken => write!(f, "Email is already taken"),
            AppError::UsernameAlreadyTaken => write!(f, "Username is already taken"),
            AppError::InvalidToken => write!(f, "Invalid token"),
            AppError::ExpiredToken => write!(f, "Token has expired"),
            AppError::InvalidRefreshToken => write!(f, "Invalid or expired refresh token"),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BoardNotFound => write!(f, "Board not found"),
            AppError::BoardAlreadyExists => write!(f, "A board with this slug already exists"),
            AppError::BoardMemberNotFound => write!(f, "Member is not part of this board"),
            AppError::NotBoardMember => write!(f, "You are not a member of this board"),
            AppError::NotBoardOwner => write!(f, "Only the board owner can perform this action"),
            AppError::CannotRemoveOwner => write!(f, "The board owner cannot leave the board"),
            AppError::InvalidBoardPassword => write!(f, "Invalid board password"),
            AppError::AlreadyBoardMember => write!(f, "Already a member of this board"),
            AppError::InvalidBoardSlug(msg) => write!(f, "Invalid board slug: {}", msg),
            AppError::ListNotFound => write!(f, "List not found"),
            AppError::CardNotFound => write!(f, "Card not found"),
            AppError::CardMoveAcrossBoards => {
                write!(f, "Cannot move a card to a list on a different board")
            }
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::Configuration(msg) => write!(f, "Configuration Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts `AppError` variants into `HttpResponse` objects.
///
/// Internal failures are logged here with their full context, then answered with a
/// generic body so no persistence or hashing detail leaks to the client.
impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.kind().status_code()
    }

    fn error_response(&self) -> HttpResponse {
        let kind = self.kind();
        if kind == ErrorKind::Internal {
            error!("{}", self);
        }
        HttpResponse::build(kind.status_code()).json(json!({
            "error": self.public_message(),
            "kind": kind,
        }))
    }
}

/// Every persistence failure becomes an opaque `DatabaseError`. Absence is expressed by
/// repositories as `Option`/`bool`, so `RowNotFound` carries no domain meaning here.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> AppError {
        AppError::DatabaseError(error.to_string())
    }
}

/// Converts `validator::ValidationErrors` into `AppError::ValidationError`.
///
/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

/// Verification failures are split into expired and everything else. Callers that need
/// the refresh-token flavour remap at their own level.
impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(error: jsonwebtoken::errors::Error) -> AppError {
        match error.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
            _ => AppError::InvalidToken,
        }
    }
}

/// Converts `bcrypt::BcryptError` into `AppError::InternalServerError`.
impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_responses() {
        let error = AppError::Unauthorized("Missing token".into());
        assert_eq!(error.error_response().status(), 401);

        let error = AppError::BadRequest("Invalid input".into());
        assert_eq!(error.error_response().status(), 400);

        let error = AppError::BoardNotFound;
        assert_eq!(error.error_response().status(), 404);

        let error = AppError::InternalServerError("Server error".into());
        assert_eq!(error.error_response().status(), 500);

        let error = AppError::NotBoardOwner;
        assert_eq!(error.error_response().status(), 403);

        let error = AppError::AlreadyBoardMember;
        assert_eq!(error.error_response().status(), 409);

        let error = AppError::InvalidBoardSlug("too short".into());
        assert_eq!(error.error_response().status(), 422);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::UserAlreadyExists.kind(), ErrorKind::AlreadyExists);
        assert_eq!(AppError::BoardAlreadyExists.kind(), ErrorKind::AlreadyExists);
        assert_eq!(AppError::CardNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(AppError::CannotRemoveOwner.kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::InvalidBoardPassword.kind(), ErrorKind::Forbidden);
        assert_eq!(AppError::UsernameAlreadyTaken.kind(), ErrorKind::Conflict);
        assert_eq!(AppError::ExpiredToken.kind(), ErrorKind::ExpiredToken);
        assert_eq!(AppError::DatabaseError("boom".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_internal_detail_is_not_exposed() {
        let error = AppError::DatabaseError("relation \"members\" does not exist".into());
        assert_eq!(error.public_message(), "Internal server error");

        let error = AppError::InvalidCredentials;
        assert_eq!(error.public_message(), "Invalid email or password");
    }

    #[test]
    fn test_jwt_error_mapping() {
        let expired = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert!(matches!(AppError::from(expired), AppError::ExpiredToken));

        let bad_sig = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::InvalidSignature,
        );
        assert!(matches!(AppError::from(bad_sig), AppError::InvalidToken));
    }
}
