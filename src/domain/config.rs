use serde::{Deserialize, Serialize};

/// Remote API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Origin of the transcription/translation service.
    pub origin: String,
    /// Path of the audio transcription endpoint.
    pub transcription_path: String,
    /// Path of the chat-completion endpoint.
    pub chat_path: String,
    /// Primary transcription model.
    pub primary_transcription_model: String,
    /// Fallback transcription model, tried exactly once.
    pub fallback_transcription_model: String,
    /// Translation model.
    pub translation_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            origin: "https://api.openai.com".to_string(),
            transcription_path: "/v1/audio/transcriptions".to_string(),
            chat_path: "/v1/chat/completions".to_string(),
            primary_transcription_model: "gpt-4o-mini-transcribe".to_string(),
            fallback_transcription_model: "gpt-4o-transcribe".to_string(),
            translation_model: "gpt-4.1-nano".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn transcription_url(&self) -> String {
        format!("{}{}", self.origin, self.transcription_path)
    }

    pub fn chat_url(&self) -> String {
        format!("{}{}", self.origin, self.chat_path)
    }
}

/// Pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Audio chunk boundary interval in milliseconds.
    pub chunk_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { chunk_ms: 3000 }
    }
}

/// App-shell cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache generation tag; entries from any other tag are purged on
    /// activation.
    pub generation: String,
    /// Origin the app shell is served from.
    pub shell_origin: String,
    /// The complete installable app shell, relative to `shell_origin`.
    pub assets: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            generation: "voice-translator-cache-v2".to_string(),
            shell_origin: "http://localhost:8080".to_string(),
            assets: Self::default_assets(),
        }
    }
}

impl CacheConfig {
    /// The enumerated app shell: markup, stylesheet, script, manifest,
    /// icon set.
    pub fn default_assets() -> Vec<String> {
        [
            "./",
            "index.html",
            "style.css",
            "app.js",
            "manifest.json",
            "images/icons/apple-touch-icon-180x180.png",
            "images/icons/icon-120x120.png",
            "images/icons/icon-152x152.png",
            "images/icons/icon-167x167.png",
            "images/icons/icon-192x192.png",
            "images/icons/icon-512x512.png",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub pipeline: PipelineConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_urls() {
        let api = ApiConfig::default();
        assert_eq!(
            api.transcription_url(),
            "https://api.openai.com/v1/audio/transcriptions"
        );
        assert_eq!(api.chat_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.chunk_ms, 3000);
        assert_eq!(config.cache.generation, "voice-translator-cache-v2");
        assert_eq!(config.cache.assets.len(), 11);
        assert_eq!(config.api.primary_transcription_model, "gpt-4o-mini-transcribe");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.api.origin, config.api.origin);
        assert_eq!(back.cache.assets, config.cache.assets);
    }
}
