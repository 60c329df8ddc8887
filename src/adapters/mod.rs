pub mod cache_store;
pub mod config_store;
pub mod credential_store;
pub mod http_reqwest;
pub mod proxy;
pub mod transcription;
pub mod translation;

pub use cache_store::{DiskCacheStore, MemoryCacheStore};
pub use config_store::TomlConfigStore;
pub use credential_store::FileCredentialStore;
pub use http_reqwest::ReqwestFetcher;
pub use proxy::CachingProxy;
pub use transcription::RemoteTranscriber;
pub use translation::{RemoteTranslator, SYSTEM_PROMPT};
