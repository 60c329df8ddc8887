mod controller;

pub use controller::PipelineController;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{
    CachingProxy, DiskCacheStore, FileCredentialStore, ReqwestFetcher, RemoteTranscriber,
    RemoteTranslator, TomlConfigStore,
};
use crate::domain::{AppConfig, DomainError, PipelineEvent};
use crate::infrastructure::init_logging;
use crate::ports::{AudioCapture, ConfigStore, CredentialStore, Fetcher};

/// Application root: wires configuration, logging, the caching proxy
/// and the translation pipeline together.
///
/// The audio capture implementation is injected by the embedding host,
/// which owns the actual microphone device.
pub struct App {
    config: RwLock<AppConfig>,
    config_store: Arc<TomlConfigStore>,
    credentials: Arc<FileCredentialStore>,
    proxy: Arc<CachingProxy>,
    controller: Arc<PipelineController>,
    _log_guard: Option<WorkerGuard>,
}

impl App {
    /// Initialize the application against the OS-specific data
    /// directory.
    pub fn new(capture: Arc<dyn AudioCapture>) -> Result<Self, DomainError> {
        let config_store = Arc::new(TomlConfigStore::new()?);
        Self::with_config_store(config_store, capture)
    }

    /// Initialize against an explicit config store.
    pub fn with_config_store(
        config_store: Arc<TomlConfigStore>,
        capture: Arc<dyn AudioCapture>,
    ) -> Result<Self, DomainError> {
        let config = config_store.load()?;

        let log_guard = init_logging(
            &config_store.logs_dir(),
            &config.logging.level,
            config.logging.file_logging,
            config.logging.max_files,
        )?;

        info!("VoiceBridge starting up");

        let credentials = Arc::new(FileCredentialStore::new(config_store.data_dir()));
        let transport: Arc<dyn Fetcher> = Arc::new(ReqwestFetcher::new()?);
        let cache = Arc::new(DiskCacheStore::new(config_store.data_dir().join("cache"))?);
        let proxy = Arc::new(CachingProxy::new(
            transport,
            cache,
            &config.api.origin,
            config.cache.clone(),
        )?);

        let transcriber = Arc::new(RemoteTranscriber::new(
            proxy.clone() as Arc<dyn Fetcher>,
            credentials.clone() as Arc<dyn CredentialStore>,
            config.api.clone(),
        ));
        let translator = Arc::new(RemoteTranslator::new(
            proxy.clone() as Arc<dyn Fetcher>,
            credentials.clone() as Arc<dyn CredentialStore>,
            config.api.clone(),
        ));
        let controller = Arc::new(PipelineController::new(
            capture,
            transcriber,
            translator,
            credentials.clone() as Arc<dyn CredentialStore>,
            config.pipeline.clone(),
        ));

        info!("App initialized");

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            credentials,
            proxy,
            controller,
            _log_guard: log_guard,
        })
    }

    /// The translation pipeline controller.
    pub fn controller(&self) -> Arc<PipelineController> {
        self.controller.clone()
    }

    /// Subscribe to pipeline events.
    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.controller.subscribe()
    }

    /// Pre-populate the app-shell cache for offline use, then drop
    /// cache generations left behind by previous releases.
    pub async fn install_shell(&self) -> Result<(), DomainError> {
        self.proxy.install().await?;
        self.proxy.activate().await
    }

    /// The proxy through which the host should route shell requests.
    pub fn proxy(&self) -> Arc<CachingProxy> {
        self.proxy.clone()
    }

    /// Store the API key entered through the settings dialog.
    pub fn save_api_key(&self, key: &str) -> Result<(), DomainError> {
        self.credentials.set_api_key(key)
    }

    /// Whether a key is currently configured.
    pub fn has_api_key(&self) -> bool {
        self.credentials.api_key().is_some()
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// Persist and apply a configuration update.
    ///
    /// Pipeline and cache settings take effect on the next session and
    /// install respectively; the running session is left alone.
    pub fn update_config(&self, config: AppConfig) -> Result<(), DomainError> {
        self.config_store.save(&config)?;
        *self.config.write() = config;
        info!("Configuration updated");
        Ok(())
    }

    /// Get the config file path.
    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    /// Get the logs directory path.
    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }
}
