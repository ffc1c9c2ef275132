use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dtos::Metadata;

/// Failure branch of the response envelope
///
/// Every error leaves the API in the same shape as a success, with `data` and
/// `meta` always null:
/// ```json
/// {
///   "status_code": 404,
///   "message": "blog is not found",
///   "error": "blog is not found",
///   "data": null,
///   "meta": null
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    pub error: Option<String>,
    pub data: Option<serde_json::Value>,
    pub meta: Option<Metadata>,
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => write!(f, "{}", s),
            Err(_) => Err(fmt::Error),
        }
    }
}

/// Closed taxonomy of everything a request can be rejected for
///
/// Each variant knows its own text (`Display`) and the HTTP status the
/// boundary maps it to (`status`). Services produce these; only the boundary
/// turns them into responses.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorMessage {
    // Request shape
    InvalidRequest,

    // Password handling
    EmptyPassword,
    ExceededMaxPasswordLength(usize),
    InvalidHashFormat,
    HashingError,
    InvalidPassword,
    MismatchLogin,

    // Bearer tokens
    TokenNotProvided,
    InvalidToken,
    TokenExpired,
    TypeAssertion,
    SigningError,
    UserNoLongerExist,

    // OAuth exchange
    RedisKeyNotExisted,
    InvalidExchange,

    // Existence
    UserNotFound,
    TagNotFound,
    BlogNotFound,
    CommentNotFound,
    LikeNotFound,

    // Uniqueness
    EmailExisted,
    TagNameExisted,
    BlogExisted,
    AlreadyLiked,

    // Authorization
    ForbiddenAccess,
    ForbiddenUpdate,
    ForbiddenDelete,
    ForbiddenDeleteSelf,

    TooManyRequests,

    ServerError,
}

impl ErrorMessage {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorMessage::InvalidRequest
            | ErrorMessage::EmptyPassword
            | ErrorMessage::ExceededMaxPasswordLength(_)
            | ErrorMessage::InvalidPassword
            | ErrorMessage::MismatchLogin
            | ErrorMessage::EmailExisted
            | ErrorMessage::TagNameExisted
            | ErrorMessage::BlogExisted => StatusCode::BAD_REQUEST,

            ErrorMessage::TokenNotProvided
            | ErrorMessage::InvalidToken
            | ErrorMessage::TokenExpired
            | ErrorMessage::TypeAssertion
            | ErrorMessage::UserNoLongerExist => StatusCode::UNAUTHORIZED,

            ErrorMessage::ForbiddenAccess
            | ErrorMessage::ForbiddenUpdate
            | ErrorMessage::ForbiddenDelete
            | ErrorMessage::ForbiddenDeleteSelf => StatusCode::FORBIDDEN,

            ErrorMessage::UserNotFound
            | ErrorMessage::TagNotFound
            | ErrorMessage::BlogNotFound
            | ErrorMessage::CommentNotFound
            | ErrorMessage::LikeNotFound => StatusCode::NOT_FOUND,

            ErrorMessage::AlreadyLiked => StatusCode::CONFLICT,
            ErrorMessage::InvalidExchange | ErrorMessage::RedisKeyNotExisted => {
                StatusCode::NOT_ACCEPTABLE
            }
            ErrorMessage::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            ErrorMessage::InvalidHashFormat
            | ErrorMessage::HashingError
            | ErrorMessage::SigningError
            | ErrorMessage::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for ErrorMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorMessage::InvalidRequest => "invalid request body".to_string(),
            ErrorMessage::EmptyPassword => "Password cannot be empty".to_string(),
            ErrorMessage::ExceededMaxPasswordLength(max_length) => {
                format!("Password must not be more than {} characters", max_length)
            }
            ErrorMessage::InvalidHashFormat => "Invalid password hash format".to_string(),
            ErrorMessage::HashingError => "Error while hashing password".to_string(),
            ErrorMessage::InvalidPassword => "invalid password".to_string(),
            ErrorMessage::MismatchLogin => {
                "mismatch login, please use endpoint /api/v1/auth/google/login".to_string()
            }
            ErrorMessage::TokenNotProvided => "token not found".to_string(),
            ErrorMessage::InvalidToken => "invalid jwt token".to_string(),
            ErrorMessage::TokenExpired => {
                "token already expired, please to relogin application".to_string()
            }
            ErrorMessage::TypeAssertion => "type assertion error".to_string(),
            ErrorMessage::SigningError => "failed sign a token".to_string(),
            ErrorMessage::UserNoLongerExist => {
                "User belonging to this token no longer exists".to_string()
            }
            ErrorMessage::RedisKeyNotExisted => "keys not existed".to_string(),
            ErrorMessage::InvalidExchange => "invalid exchange".to_string(),
            ErrorMessage::UserNotFound => "users is not found".to_string(),
            ErrorMessage::TagNotFound => "tag is not found".to_string(),
            ErrorMessage::BlogNotFound => "blog is not found".to_string(),
            ErrorMessage::CommentNotFound => "comment is not found".to_string(),
            ErrorMessage::LikeNotFound => "like is not found".to_string(),
            ErrorMessage::EmailExisted => "email is existed".to_string(),
            ErrorMessage::TagNameExisted => "tag is existed".to_string(),
            ErrorMessage::BlogExisted => "blog with the same title is existed".to_string(),
            ErrorMessage::AlreadyLiked => "blog already liked by this user".to_string(),
            ErrorMessage::ForbiddenAccess => "forbidden access".to_string(),
            ErrorMessage::ForbiddenUpdate => "forbidden update, you are not the owner".to_string(),
            ErrorMessage::ForbiddenDelete => "forbidden delete, you are not the owner".to_string(),
            ErrorMessage::ForbiddenDeleteSelf => {
                "forbidden delete account self, make sure the id is correct".to_string()
            }
            ErrorMessage::TooManyRequests => {
                "Too many login attempts, wait till 15 min".to_string()
            }
            ErrorMessage::ServerError => "Server Error. Please try again later".to_string(),
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for ErrorMessage {}

/// What a resource service hands back when it cannot complete
///
/// `Rejected` carries a decision the service made itself (validation,
/// existence, ownership). The other variants are collaborator failures that
/// are passed through untouched so the boundary can log and hide them.
#[derive(Debug)]
pub enum ServiceError {
    Rejected(ErrorMessage),
    Store(sqlx::Error),
    Cache(redis::RedisError),
    Upstream(String),
}

impl ServiceError {
    /// The rejection this error carries, if it is one
    pub fn rejection(&self) -> Option<&ErrorMessage> {
        match self {
            ServiceError::Rejected(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Rejected(message) => write!(f, "{}", message),
            ServiceError::Store(e) => write!(f, "store error: {}", e),
            ServiceError::Cache(e) => write!(f, "cache error: {}", e),
            ServiceError::Upstream(e) => write!(f, "upstream error: {}", e),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ErrorMessage> for ServiceError {
    fn from(message: ErrorMessage) -> Self {
        ServiceError::Rejected(message)
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Store(e)
    }
}

impl From<redis::RedisError> for ServiceError {
    fn from(e: redis::RedisError) -> Self {
        ServiceError::Cache(e)
    }
}

/// Error type returned by handlers and middleware
///
/// Bundles the client-facing message with its status so the two can never
/// disagree. Axum turns it into the envelope through `IntoResponse`.
#[derive(Debug, Clone)]
pub struct HttpError {
    pub message: String,
    pub status: StatusCode,
}

impl HttpError {
    pub fn new(message: impl Into<String>, status: StatusCode) -> Self {
        HttpError {
            message: message.into(),
            status,
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::UNAUTHORIZED,
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        HttpError {
            message: message.into(),
            status: StatusCode::FORBIDDEN,
        }
    }

    pub fn into_http_response(self) -> Response {
        let json_response = Json(ErrorResponse {
            status_code: self.status.as_u16(),
            message: self.message.clone(),
            error: Some(self.message),
            data: None,
            meta: None,
        });

        (self.status, json_response).into_response()
    }
}

impl From<ErrorMessage> for HttpError {
    fn from(message: ErrorMessage) -> Self {
        HttpError::new(message.to_string(), message.status())
    }
}

/// Boundary mapping from service outcomes to HTTP
///
/// Rejections keep their own status and text. Collaborator failures were
/// already logged where they happened; the client only sees a generic 500.
impl From<ServiceError> for HttpError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Rejected(message) => message.into(),
            other => {
                tracing::error!("Unhandled service failure: {}", other);
                HttpError::server_error(ErrorMessage::ServerError.to_string())
            }
        }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HttpError: message: {}, status: {}",
            self.message, self.status
        )
    }
}

impl std::error::Error for HttpError {}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}
