use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{
    Accept, ApiConfig, AudioChunk, DomainError, FetchRequest, Language, Method, MultipartField,
    RequestBody,
};
use crate::ports::{CredentialStore, Fetcher, Transcriber};

/// Fixed container filename for submitted segments; the codec is the
/// same for a whole session.
const AUDIO_FILENAME: &str = "audio.webm";
const AUDIO_CONTENT_TYPE: &str = "audio/webm";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Remote speech-to-text client with primary/fallback model selection.
pub struct RemoteTranscriber {
    fetcher: Arc<dyn Fetcher>,
    credentials: Arc<dyn CredentialStore>,
    config: ApiConfig,
}

impl RemoteTranscriber {
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

    fn request(&self, model: &str, language: Language, audio: &AudioChunk, key: &str) -> FetchRequest {
        FetchRequest {
            method: Method::Post,
            url: self.config.transcription_url(),
            accept: Accept::Json,
            bearer: Some(key.to_string()),
            body: RequestBody::Multipart(vec![
                MultipartField::Text {
                    name: "model".to_string(),
                    value: model.to_string(),
                },
                MultipartField::Text {
                    name: "language".to_string(),
                    value: language.code().to_string(),
                },
                MultipartField::File {
                    name: "file".to_string(),
                    filename: AUDIO_FILENAME.to_string(),
                    content_type: AUDIO_CONTENT_TYPE.to_string(),
                    bytes: audio.bytes().to_vec(),
                },
            ]),
        }
    }
}

#[async_trait]
impl Transcriber for RemoteTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioChunk,
        language: Language,
    ) -> Result<String, DomainError> {
        let key = self.credentials.api_key().ok_or(DomainError::MissingApiKey)?;

        let primary = &self.config.primary_transcription_model;
        let mut response = self
            .fetcher
            .fetch(self.request(primary, language, audio, &key))
            .await?;

        if !response.is_success() {
            let fallback = &self.config.fallback_transcription_model;
            warn!(
                status = response.status,
                primary = %primary,
                fallback = %fallback,
                "primary transcription model failed, retrying with fallback"
            );
            response = self
                .fetcher
                .fetch(self.request(fallback, language, audio, &key))
                .await?;
        }

        if !response.is_success() {
            return Err(DomainError::Transcription {
                status: response.status,
                body: response.text(),
            });
        }

        let parsed: TranscriptionResponse = response.json()?;
        debug!(chars = parsed.text.len(), "transcript received");
        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;
    use crate::domain::FetchResponse;

    struct StaticKey;

    impl CredentialStore for StaticKey {
        fn api_key(&self) -> Option<String> {
            Some("sk-test".to_string())
        }

        fn set_api_key(&self, _key: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    struct NoKey;

    impl CredentialStore for NoKey {
        fn api_key(&self) -> Option<String> {
            None
        }

        fn set_api_key(&self, _key: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    /// Replays a scripted response sequence and records each request's
    /// multipart `model` field.
    struct SequencedFetcher {
        responses: Mutex<VecDeque<FetchResponse>>,
        models_seen: Mutex<Vec<String>>,
    }

    impl SequencedFetcher {
        fn new(responses: Vec<FetchResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                models_seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Fetcher for SequencedFetcher {
        async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DomainError> {
            if let RequestBody::Multipart(fields) = &request.body {
                for field in fields {
                    if let MultipartField::Text { name, value } = field {
                        if name == "model" {
                            self.models_seen.lock().push(value.clone());
                        }
                    }
                }
            }
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| DomainError::Http("no scripted response".to_string()))
        }

        fn is_online(&self) -> bool {
            true
        }
    }

    fn transcriber(fetcher: Arc<SequencedFetcher>) -> RemoteTranscriber {
        RemoteTranscriber::new(fetcher, Arc::new(StaticKey), ApiConfig::default())
    }

    fn ok_json(text: &str) -> FetchResponse {
        FetchResponse::new(
            200,
            "application/json",
            format!(r#"{{"text":"{}"}}"#, text).into_bytes(),
        )
    }

    #[tokio::test]
    async fn test_primary_success_issues_one_call() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![ok_json("hello")]));
        let result = transcriber(fetcher.clone())
            .transcribe(&AudioChunk::new(vec![1, 2, 3]), Language::English)
            .await
            .unwrap();
        assert_eq!(result, "hello");
        assert_eq!(
            *fetcher.models_seen.lock(),
            vec!["gpt-4o-mini-transcribe".to_string()]
        );
    }

    #[tokio::test]
    async fn test_fallback_after_primary_failure() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![
            FetchResponse::new(500, "text/plain", b"server error".to_vec()),
            ok_json("hello"),
        ]));
        let result = transcriber(fetcher.clone())
            .transcribe(&AudioChunk::new(vec![1]), Language::Japanese)
            .await
            .unwrap();
        assert_eq!(result, "hello");
        assert_eq!(
            *fetcher.models_seen.lock(),
            vec![
                "gpt-4o-mini-transcribe".to_string(),
                "gpt-4o-transcribe".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_both_models_failing_is_terminal() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![
            FetchResponse::new(500, "text/plain", b"primary down".to_vec()),
            FetchResponse::new(502, "text/plain", b"fallback down".to_vec()),
        ]));
        let err = transcriber(fetcher.clone())
            .transcribe(&AudioChunk::new(vec![1]), Language::English)
            .await
            .unwrap_err();
        match err {
            DomainError::Transcription { status, body } => {
                assert_eq!(status, 502);
                assert_eq!(body, "fallback down");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // Exactly one fallback attempt, never more.
        assert_eq!(fetcher.models_seen.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_text_is_valid_silence() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![FetchResponse::new(
            200,
            "application/json",
            br#"{"text":""}"#.to_vec(),
        )]));
        let result = transcriber(fetcher)
            .transcribe(&AudioChunk::new(vec![1]), Language::English)
            .await
            .unwrap();
        assert_eq!(result, "");
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_call() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![ok_json("unused")]));
        let transcriber =
            RemoteTranscriber::new(fetcher.clone(), Arc::new(NoKey), ApiConfig::default());
        let err = transcriber
            .transcribe(&AudioChunk::new(vec![1]), Language::English)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::MissingApiKey));
        assert!(fetcher.models_seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_language_hint_in_form() {
        let fetcher = Arc::new(SequencedFetcher::new(vec![]));
        let transcriber = transcriber(fetcher);
        let request = transcriber.request(
            "gpt-4o-mini-transcribe",
            Language::Japanese,
            &AudioChunk::new(vec![9]),
            "sk-test",
        );
        let RequestBody::Multipart(fields) = &request.body else {
            panic!("expected multipart body");
        };
        assert!(fields.iter().any(|f| matches!(
            f,
            MultipartField::Text { name, value } if name == "language" && value == "ja"
        )));
        assert!(fields.iter().any(|f| matches!(
            f,
            MultipartField::File { filename, .. } if filename == "audio.webm"
        )));
    }
}
