// src/remote/types.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bearer token from one login exchange. Scoped to a single orchestration
/// run; never serialized or persisted.
#[derive(Clone)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    // keep credentials out of logs
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Domain shape of a fetched quote. `from` / `attributed_to` may be absent
/// upstream; the renderer applies the attribution fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteQuote {
    pub id: String,
    pub text: String,
    pub from: Option<String>,
    pub attributed_to: Option<String>,
}

/// Aggregate rating for one quote. The all-zero value is a valid rating
/// (the service's "not yet rated" sentinel normalizes to it), distinct from
/// having no rating at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingAnnotation {
    pub average: f64,
    pub total: u32,
    pub participants: u32,
}

impl RatingAnnotation {
    pub fn zero() -> Self {
        Self {
            average: 0.0,
            total: 0,
            participants: 0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("login rejected with http status {status}")]
    Auth { status: u16 },
    #[error("fetch for {id:?} failed with http status {status}")]
    Fetch { id: String, status: u16 },
    #[error("malformed service response: {0}")]
    Malformed(String),
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Seam between the orchestrator and the quotation service. The production
/// implementation talks HTTP; tests drive the orchestrator with stubs.
#[async_trait]
pub trait QuoteService: Send + Sync {
    /// Exchange credentials for a session token. Must complete before any
    /// fetch is issued for the batch.
    async fn authenticate(&self, email: &str, password: &str)
        -> Result<SessionToken, ClientError>;

    /// Fetch one quote body by identifier.
    async fn fetch_quote(&self, id: &str, token: &SessionToken)
        -> Result<RemoteQuote, ClientError>;

    /// Fetch the rating for one quote. `Ok(None)` means the service answered
    /// but the rating is unusable (omitted, non-fatal); the "not yet rated"
    /// sentinel comes back as `Ok(Some(zero))`.
    async fn fetch_rating(
        &self,
        id: &str,
        token: &SessionToken,
    ) -> Result<Option<RatingAnnotation>, ClientError>;

    /// Public citation URL for a quote, if the service has one.
    fn permalink(&self, _id: &str) -> Option<String> {
        None
    }
}
