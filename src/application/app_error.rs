use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Too many requests. Please slow down.")]
    RateLimited,

    #[error("Monthly request quota exceeded")]
    QuotaExceeded,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("API key lacks the required permission")]
    Forbidden,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found")]
    NotFound,

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    RateLimited,
    QuotaExceeded,
    InvalidCredentials,
    InvalidApiKey,
    Forbidden,
    InvalidInput,
    Conflict,
    NotFound,
    UpstreamError,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::QuotaExceeded => "QUOTA_EXCEEDED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InvalidApiKey => "INVALID_API_KEY",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::RateLimited => ErrorCode::RateLimited,
            AppError::QuotaExceeded => ErrorCode::QuotaExceeded,
            AppError::InvalidCredentials => ErrorCode::InvalidCredentials,
            AppError::InvalidApiKey => ErrorCode::InvalidApiKey,
            AppError::Forbidden => ErrorCode::Forbidden,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::Upstream(_) => ErrorCode::UpstreamError,
            AppError::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// HTTP status this error is reported with. Also stored on usage records.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Database(_) | AppError::Internal(_) => 500,
            AppError::InvalidCredentials | AppError::InvalidApiKey => 401,
            AppError::Forbidden => 403,
            AppError::RateLimited | AppError::QuotaExceeded => 429,
            AppError::InvalidInput(_) | AppError::Conflict(_) => 400,
            AppError::NotFound => 404,
            AppError::Upstream(_) => 502,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
