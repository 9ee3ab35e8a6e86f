use thiserror::Error;

/// PostgREST code for "single-object request matched zero rows"
pub const PGRST_NO_ROWS: &str = "PGRST116";
/// Postgres unique_violation
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Failure talking to the metadata API
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} returned {status}: {body}")]
    Status { path: String, status: u16, body: String },
    #[error("could not decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid request URL: {0}")]
    Url(String),
}

impl ContentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::Status { status: 404, .. })
    }
}

/// Failure talking to the hosted store
///
/// `NotFound` is the expected-empty case for single-row lookups; callers that
/// ask "is there a row?" turn it into `None`/`false` instead of failing.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching row")]
    NotFound,
    #[error("row already exists: {0}")]
    Conflict(String),
    #[error("store rejected request ({status}{}): {message}", .code.as_deref().map(|c| format!(", {}", c)).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not decode store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("store file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid request URL: {0}")]
    Url(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Turn the expected-empty case into `None`, propagate everything else
pub fn optional<T>(result: Result<T, StoreError>) -> Result<Option<T>, StoreError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(StoreError::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}
