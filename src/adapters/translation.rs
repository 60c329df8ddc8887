use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::domain::{
    ApiConfig, DomainError, FetchRequest, ServiceRejection, Turn,
};
use crate::ports::{CredentialStore, Fetcher, Translator};

/// Fixed interpreter persona; `messages[0]` of every translation call.
pub const SYSTEM_PROMPT: &str = "You are a simultaneous interpreter. Translate Japanese <-> English in real-time, preserving meaning and tone.";

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Remote chat-completion client used for translation.
pub struct RemoteTranslator {
    fetcher: Arc<dyn Fetcher>,
    credentials: Arc<dyn CredentialStore>,
    config: ApiConfig,
}

impl RemoteTranslator {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        credentials: Arc<dyn CredentialStore>,
        config: ApiConfig,
    ) -> Self {
        Self {
            fetcher,
            credentials,
            config,
        }
    }
}

#[async_trait]
impl Translator for RemoteTranslator {
    async fn translate(&self, window: &[Turn]) -> Result<String, DomainError> {
        let key = self.credentials.api_key().ok_or(DomainError::MissingApiKey)?;

        // Fail fast rather than issue a doomed request.
        if !self.fetcher.is_online() {
            return Err(DomainError::Offline(
                "No network connection at translation time".to_string(),
            ));
        }

        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Turn::system(SYSTEM_PROMPT));
        messages.extend_from_slice(window);

        let body = json!({
            "model": self.config.translation_model,
            "messages": messages,
            "stream": false,
        });
        let request = FetchRequest::post_json(self.config.chat_url(), body).with_bearer(key);

        let response = self.fetcher.fetch(request).await?;
        if !response.is_success() {
            let rejection = ServiceRejection::parse(response.status, &response.body);
            warn!(status = response.status, "translation request rejected");
            return Err(match rejection {
                ServiceRejection::Offline { message } => DomainError::Offline(message),
                other => DomainError::Translation(other.message()),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| DomainError::Translation(format!("malformed response: {}", e)))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DomainError::Translation("response carried no choices".to_string()))?;

        debug!(chars = content.len(), "translation received");
        Ok(content.trim().to_string())
    }
}
