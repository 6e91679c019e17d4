//! Client for the Document AI invoice processor.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;
use tracing::debug;

use factura_core::models::config::ServiceConfig;
use factura_core::{DocumentPayload, ServiceError};

/// Turns raw document bytes into text plus typed entities.
pub trait EntityExtractor {
    async fn extract(&self, name: &str, content: &[u8]) -> Result<DocumentPayload, ServiceError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest<'a> {
    raw_document: RawDocument<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument<'a> {
    content: String,
    mime_type: &'a str,
}

/// Calls `processors/{id}:process` with a bearer token.
pub struct DocumentAiClient {
    http: reqwest::Client,
    url: String,
    token: String,
    mime_type: String,
}

impl DocumentAiClient {
    pub fn new(config: &ServiceConfig, token: Option<String>) -> Result<Self, ServiceError> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ServiceError::MissingCredentials)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            url: config.process_url(),
            token,
            mime_type: config.mime_type.clone(),
        })
    }
}

impl EntityExtractor for DocumentAiClient {
    async fn extract(&self, name: &str, content: &[u8]) -> Result<DocumentPayload, ServiceError> {
        let request = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(content),
                mime_type: &self.mime_type,
            },
        };

        debug!("Sending {} ({} bytes) to {}", name, content.len(), self.url);

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ServiceError::Transport("request timed out".to_string())
                } else {
                    ServiceError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        DocumentPayload::from_json(&body).map_err(|e| ServiceError::MalformedResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_token_is_rejected() {
        let config = ServiceConfig::default();
        assert!(matches!(
            DocumentAiClient::new(&config, None),
            Err(ServiceError::MissingCredentials)
        ));
        assert!(matches!(
            DocumentAiClient::new(&config, Some("  ".to_string())),
            Err(ServiceError::MissingCredentials)
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let request = ProcessRequest {
            raw_document: RawDocument {
                content: STANDARD.encode(b"%PDF"),
                mime_type: "application/pdf",
            },
        };

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["rawDocument"]["content"], "JVBERg==");
        assert_eq!(json["rawDocument"]["mimeType"], "application/pdf");
    }
}
