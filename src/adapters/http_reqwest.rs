use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart;
use reqwest::Client;
use tracing::warn;

use crate::domain::{
    Accept, DomainError, FetchRequest, FetchResponse, Method, MultipartField, RequestBody,
};
use crate::ports::Fetcher;

/// Live HTTP transport backed by reqwest.
///
/// Tracks connectivity from observed transport outcomes: a connect-level
/// failure flips the online flag off, any completed exchange flips it
/// back on. This is what the translation client's synchronous offline
/// guard reads.
pub struct ReqwestFetcher {
    client: Client,
    online: AtomicBool,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, DomainError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("VoiceBridge/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DomainError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            online: AtomicBool::new(true),
        })
    }

    /// Override the connectivity flag, e.g. from a host-level signal.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn build(&self, request: &FetchRequest) -> Result<reqwest::RequestBuilder, DomainError> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };

        builder = match request.accept {
            Accept::Html => builder.header(ACCEPT, "text/html"),
            Accept::Json => builder.header(ACCEPT, "application/json"),
            Accept::Any => builder,
        };

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Multipart(fields) => {
                let mut form = multipart::Form::new();
                for field in fields {
                    form = match field {
                        MultipartField::Text { name, value } => {
                            form.text(name.clone(), value.clone())
                        }
                        MultipartField::File {
                            name,
                            filename,
                            content_type,
                            bytes,
                        } => {
                            let part = multipart::Part::bytes(bytes.clone())
                                .file_name(filename.clone())
                                .mime_str(content_type)
                                .map_err(|e| DomainError::Http(e.to_string()))?;
                            form.part(name.clone(), part)
                        }
                    };
                }
                builder.multipart(form)
            }
        };

        Ok(builder)
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DomainError> {
        let url = request.url.clone();
        let response = match self.build(&request)?.send().await {
            Ok(r) => r,
            Err(e) => {
                self.online.store(false, Ordering::SeqCst);
                warn!(url = %url, error = %e, "transport failure");
                return Err(DomainError::Http(e.to_string()));
            }
        };
        self.online.store(true, Ordering::SeqCst);

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::Http(e.to_string()))?
            .to_vec();

        Ok(FetchResponse::new(status, content_type, body))
    }

    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
