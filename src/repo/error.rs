//! Repository layer errors.

use thiserror::Error;

/// Errors surfaced by the repository adapters and the request context.
///
/// Every variant carries plain data so the whole enum is `Clone`: a coalesced
/// in-flight failure has to be handed to every waiter, not just the caller
/// that started the fetch.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepoError {
    /// The upstream sent a value outside its documented contract (an unknown
    /// release type, for example). Fatal for the call and never retried: this
    /// means the adapter no longer matches the upstream schema.
    #[error("schema mismatch: {0}")]
    Schema(String),

    /// The requested project/version does not exist upstream. Normalized to
    /// an absent value at the facade.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network, HTTP status, or malformed-body failure. Recoverable; the
    /// caller may retry or fall back to cached data. Never evicts a cache
    /// entry.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rate limited")]
    RateLimited,

    /// The cache store itself failed (SQLite error, usually).
    #[error("cache store error: {0}")]
    Cache(String),

    /// CurseForge requests need an API key from the config.
    #[error("CurseForge API key not configured (run `modget config set-cf-key <key>`)")]
    MissingApiKey,
}

impl From<reqwest::Error> for RepoError {
    fn from(err: reqwest::Error) -> Self {
        RepoError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::Transport(err.to_string())
    }
}
