use async_trait::async_trait;

use crate::domain::{DomainError, FetchResponse};

/// Port for the persistent request→response cache.
///
/// Entries are scoped by a generation tag; superseded generations are
/// purged wholesale on activation. Mutation is insert or whole-
/// generation delete only, so a concurrent read observes either the
/// old or the new value of a key, never a torn one.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Look up a cached response by request identity.
    async fn get(
        &self,
        generation: &str,
        key: &str,
    ) -> Result<Option<FetchResponse>, DomainError>;

    /// Insert or replace a cached response.
    async fn put(
        &self,
        generation: &str,
        key: &str,
        response: &FetchResponse,
    ) -> Result<(), DomainError>;

    /// List all generation tags present in the store.
    async fn generations(&self) -> Result<Vec<String>, DomainError>;

    /// Delete every entry of one generation.
    async fn delete_generation(&self, generation: &str) -> Result<(), DomainError>;
}
