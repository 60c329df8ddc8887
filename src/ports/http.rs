use async_trait::async_trait;

use crate::domain::{DomainError, FetchRequest, FetchResponse};

/// Transport port for all network requests.
/// All network traffic must go through this interface; the caching
/// proxy implements it as a decorator over the live transport.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue a request. A non-success HTTP status is returned as a
    /// response; only transport-level failure (network unreachable)
    /// is an error.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DomainError>;

    /// Synchronous connectivity probe, checked before dispatching a
    /// call that would be doomed while offline.
    fn is_online(&self) -> bool;
}
