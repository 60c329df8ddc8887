pub mod audio;
pub mod cache;
pub mod config;
pub mod credentials;
pub mod http;
pub mod transcriber;
pub mod translator;

pub use audio::AudioCapture;
pub use cache::CacheStore;
pub use config::ConfigStore;
pub use credentials::CredentialStore;
pub use http::Fetcher;
pub use transcriber::Transcriber;
pub use translator::Translator;
