use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::domain::{Accept, CacheConfig, DomainError, FetchRequest, FetchResponse};
use crate::ports::{CacheStore, Fetcher};

/// Global singleton instance of the proxy. The proxy conceptually runs
/// beneath the whole application instance, so one process gets one.
static INSTANCE: OnceCell<CachingProxy> = OnceCell::new();

/// Synthesized body for API calls that failed at the transport level.
const OFFLINE_STUB_BODY: &str =
    r#"{"error":"offline","message":"No network connection. Retry once you are back online."}"#;

/// Self-contained fallback document for uncached HTML requests while
/// offline.
const OFFLINE_FALLBACK_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Offline</title>
  <style>
    body {
      font-family: -apple-system, sans-serif;
      background: #0d0d0d;
      color: #f4f4f4;
      margin: 0;
      padding: 20px;
      display: flex;
      flex-direction: column;
      align-items: center;
      justify-content: center;
      min-height: 100vh;
      text-align: center;
    }
    h1 { font-size: 1.5rem; margin-bottom: 1rem; }
    p { line-height: 1.5; margin-bottom: 1.5rem; }
    .retry-btn {
      background: #444;
      color: white;
      border: none;
      padding: 12px 20px;
      border-radius: 8px;
      font-size: 1rem;
    }
  </style>
</head>
<body>
  <h1>Offline</h1>
  <p>No internet connection found.<br>The app will reconnect automatically once you are back online.</p>
  <button class="retry-btn" onclick="window.location.reload()">Retry</button>
</body>
</html>"#;

/// CachingProxy mediates every network request the application issues.
///
/// Two policies, selected by request classification:
/// - API-origin requests are always forwarded live; a transport failure
///   is replaced by a synthesized 503 offline stub so callers can tell
///   "no network" apart from "service rejected".
/// - Everything else is served stale-while-revalidate from the cache
///   store, with an offline fallback document for uncached HTML.
pub struct CachingProxy {
    transport: Arc<dyn Fetcher>,
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
    api_host: String,
}

impl CachingProxy {
    pub fn new(
        transport: Arc<dyn Fetcher>,
        store: Arc<dyn CacheStore>,
        api_origin: &str,
        config: CacheConfig,
    ) -> Result<Self, DomainError> {
        let api_host = Url::parse(api_origin)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                DomainError::Config(format!("Invalid API origin: {}", api_origin))
            })?;

        info!(
            api_host = %api_host,
            generation = %config.generation,
            "CachingProxy created"
        );

        Ok(Self {
            transport,
            store,
            config,
            api_host,
        })
    }

    /// Install the process-global proxy instance.
    /// Returns an error if already initialized.
    pub fn init(proxy: CachingProxy) -> Result<&'static CachingProxy, DomainError> {
        INSTANCE
            .set(proxy)
            .map_err(|_| DomainError::Config("CachingProxy already initialized".to_string()))?;
        INSTANCE
            .get()
            .ok_or_else(|| DomainError::Config("CachingProxy already initialized".to_string()))
    }

    /// The process-global proxy instance, if one was installed.
    pub fn global() -> Option<&'static CachingProxy> {
        INSTANCE.get()
    }

    /// Pre-populate the cache with the full enumerated app shell under
    /// the configured generation tag. All-or-nothing: any asset that
    /// cannot be fetched aborts the install without touching the store,
    /// leaving the prior generation active.
    pub async fn install(&self) -> Result<(), DomainError> {
        let base = Url::parse(&self.config.shell_origin)
            .map_err(|e| DomainError::CacheInstall(format!("invalid shell origin: {}", e)))?;

        let mut entries = Vec::with_capacity(self.config.assets.len());
        for asset in &self.config.assets {
            let url = base
                .join(asset)
                .map_err(|e| DomainError::CacheInstall(format!("invalid asset {}: {}", asset, e)))?;
            let request = FetchRequest::get(url.as_str(), Accept::Any);
            let response = self
                .transport
                .fetch(request.clone())
                .await
                .map_err(|e| DomainError::CacheInstall(format!("{}: {}", asset, e)))?;
            if !response.is_success() {
                return Err(DomainError::CacheInstall(format!(
                    "HTTP {} for {}",
                    response.status, asset
                )));
            }
            entries.push((request.cache_key(), response));
        }

        for (key, response) in &entries {
            if let Err(e) = self.store.put(&self.config.generation, key, response).await {
                // Roll back the half-populated generation.
                let _ = self.store.delete_generation(&self.config.generation).await;
                return Err(DomainError::CacheInstall(e.to_string()));
            }
        }

        info!(
            generation = %self.config.generation,
            assets = entries.len(),
            "app shell installed"
        );
        Ok(())
    }

    /// Purge every cache generation except the current one and take
    /// control immediately.
    pub async fn activate(&self) -> Result<(), DomainError> {
        for generation in self.store.generations().await? {
            if generation != self.config.generation {
                info!(generation = %generation, "purging stale cache generation");
                self.store.delete_generation(&generation).await?;
            }
        }
        Ok(())
    }

    fn is_api_request(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h == self.api_host))
            .unwrap_or(false)
    }

    async fn fetch_api(&self, request: FetchRequest) -> Result<FetchResponse, DomainError> {
        match self.transport.fetch(request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                warn!(error = %e, "API forward failed, serving offline stub");
                Ok(FetchResponse::new(
                    503,
                    "application/json",
                    OFFLINE_STUB_BODY.as_bytes().to_vec(),
                ))
            }
        }
    }

    async fn fetch_shell(&self, request: FetchRequest) -> Result<FetchResponse, DomainError> {
        let key = request.cache_key();

        if let Some(cached) = self.store.get(&self.config.generation, &key).await? {
            debug!(key = %key, "cache hit, revalidating in background");
            let transport = Arc::clone(&self.transport);
            let store = Arc::clone(&self.store);
            let generation = self.config.generation.clone();
            let revalidate = request.clone();
            tokio::spawn(async move {
                if let Ok(response) = transport.fetch(revalidate.clone()).await {
                    if response.is_success() {
                        let _ = store
                            .put(&generation, &revalidate.cache_key(), &response)
                            .await;
                    }
                }
            });
            return Ok(cached);
        }

        match self.transport.fetch(request.clone()).await {
            Ok(response) => {
                if response.is_success() {
                    if let Err(e) = self.store.put(&self.config.generation, &key, &response).await
                    {
                        warn!(key = %key, error = %e, "failed to cache response");
                    }
                }
                Ok(response)
            }
            Err(e) => {
                if request.accept == Accept::Html {
                    debug!(key = %key, "uncached HTML request while offline, serving fallback");
                    Ok(FetchResponse::new(
                        200,
                        "text/html; charset=utf-8",
                        OFFLINE_FALLBACK_HTML.as_bytes().to_vec(),
                    ))
                } else {
                    Err(e)
                }
            }
        }
    }
}

#[async_trait]
impl Fetcher for CachingProxy {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DomainError> {
        if self.is_api_request(&request.url) {
            self.fetch_api(request).await
        } else {
            self.fetch_shell(request).await
        }
    }

    fn is_online(&self) -> bool {
        self.transport.is_online()
    }
}
