//! HTTP gateway from the chat widget to the assistant server

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use career_assistant_core::{
    AssistantGateway, AssistantReply, AssistantRequest, ChatRelayRequest, Error, Result,
};

/// Error body returned by every server endpoint
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: String,
}

/// Talks to `/api/assistant` and `/api/chat` on the portfolio server
pub struct HttpAssistantGateway {
    base_url: String,
    client: Client,
    timeout: Option<Duration>,
}

impl HttpAssistantGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, None)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<T: serde::Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout.map(|t| t.as_millis() as u64).unwrap_or_default())
                } else {
                    Error::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .map(|body| body.error)
            .unwrap_or_default();
        Err(Error::Upstream {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl AssistantGateway for HttpAssistantGateway {
    async fn send_message(&self, request: &AssistantRequest) -> Result<AssistantReply> {
        self.post("/api/assistant", request)
            .await?
            .json::<AssistantReply>()
            .await
            .map_err(|e| Error::InvalidResponse(e.to_string()))
    }

    async fn relay_chat(&self, request: &ChatRelayRequest) -> Result<()> {
        self.post("/api/chat", request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash() {
        let gateway = HttpAssistantGateway::new("http://localhost:8080/").unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_timeout_reports_configured_duration() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let gateway = HttpAssistantGateway::with_timeout(
            format!("http://{}", addr),
            Some(Duration::from_millis(250)),
        )
        .unwrap();
        let err = gateway
            .send_message(&AssistantRequest {
                message: "Hi".into(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(250)), "got {:?}", err);
    }
}
