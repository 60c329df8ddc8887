use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// HTTP method subset used by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// What the requester can render, used by the caching proxy to decide
/// whether a failed app-shell fetch gets the offline fallback document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Html,
    Json,
    Any,
}

/// One part of a multipart form body.
#[derive(Debug, Clone)]
pub enum MultipartField {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        filename: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

/// Request body variants the transport knows how to encode.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartField>),
}

/// Transport-neutral request passed through the `Fetcher` port.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub accept: Accept,
    pub bearer: Option<String>,
    pub body: RequestBody,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, accept: Accept) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            accept,
            bearer: None,
            body: RequestBody::Empty,
        }
    }

    pub fn post_json(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            accept: Accept::Json,
            bearer: None,
            body: RequestBody::Json(body),
        }
    }

    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Request identity for cache lookups. Bodies and credentials are
    /// deliberately excluded; only app-shell GETs are ever cached.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method.as_str(), self.url)
    }
}

/// Transport-neutral response. A non-success status is a valid
/// response, not a transport error; only network failure errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Why a remote service call did not yield a result.
///
/// The caching proxy's offline stub deliberately mimics a service error
/// body, so "no network at all" and "service rejected the request" must
/// be told apart by tag rather than by sniffing ad hoc fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceRejection {
    /// The proxy's synthesized offline stub: no network at all.
    Offline { message: String },
    /// The service rejected the request with a structured error body.
    Api { message: String },
    /// Unparseable body; all we have is the HTTP status.
    Status { status: u16 },
}

impl ServiceRejection {
    /// Classify a non-success response body.
    pub fn parse(status: u16, body: &[u8]) -> Self {
        let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) else {
            return ServiceRejection::Status { status };
        };
        if value.get("error").and_then(|e| e.as_str()) == Some("offline") {
            let message = value
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("No network connection")
                .to_string();
            return ServiceRejection::Offline { message };
        }
        if let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
        {
            return ServiceRejection::Api {
                message: message.to_string(),
            };
        }
        ServiceRejection::Status { status }
    }

    /// Human-readable message for the transient error notice.
    pub fn message(&self) -> String {
        match self {
            ServiceRejection::Offline { message } | ServiceRejection::Api { message } => {
                message.clone()
            }
            ServiceRejection::Status { status } => format!("API error: {}", status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_ignores_accept() {
        let a = FetchRequest::get("https://app.example/index.html", Accept::Html);
        let b = FetchRequest::get("https://app.example/index.html", Accept::Any);
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "GET https://app.example/index.html");
    }

    #[test]
    fn test_response_success_range() {
        assert!(FetchResponse::new(200, "text/plain", vec![]).is_success());
        assert!(FetchResponse::new(204, "text/plain", vec![]).is_success());
        assert!(!FetchResponse::new(304, "text/plain", vec![]).is_success());
        assert!(!FetchResponse::new(503, "text/plain", vec![]).is_success());
    }

    #[test]
    fn test_rejection_parses_offline_stub() {
        let body = br#"{"error":"offline","message":"no network"}"#;
        assert_eq!(
            ServiceRejection::parse(503, body),
            ServiceRejection::Offline {
                message: "no network".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_parses_api_error() {
        let body = br#"{"error":{"message":"invalid model","type":"invalid_request_error"}}"#;
        assert_eq!(
            ServiceRejection::parse(400, body),
            ServiceRejection::Api {
                message: "invalid model".to_string()
            }
        );
    }

    #[test]
    fn test_rejection_falls_back_to_status() {
        let rejection = ServiceRejection::parse(500, b"<html>gateway</html>");
        assert_eq!(rejection, ServiceRejection::Status { status: 500 });
        assert_eq!(rejection.message(), "API error: 500");
    }
}
