//! Outbound WhatsApp replies through an Evolution API instance.

use async_trait::async_trait;
use finbalance_core::GatewayCredentials;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("gateway status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Sends a text reply to a chat number
#[async_trait]
pub trait OutboundGateway: Send + Sync {
    async fn send_text(
        &self,
        credentials: &GatewayCredentials,
        number: &str,
        text: &str,
    ) -> Result<(), GatewayError>;
}

#[derive(Debug, Serialize)]
struct SendTextBody<'a> {
    number: &'a str,
    text: &'a str,
}

/// `POST {base_url}/message/sendText/{instance}` with an `apikey` header
#[derive(Debug, Clone)]
pub struct EvolutionGateway {
    http: reqwest::Client,
}

impl EvolutionGateway {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub fn send_text_url(credentials: &GatewayCredentials) -> String {
        format!(
            "{}/message/sendText/{}",
            credentials.base_url.trim_end_matches('/'),
            credentials.instance_name
        )
    }
}

#[async_trait]
impl OutboundGateway for EvolutionGateway {
    async fn send_text(
        &self,
        credentials: &GatewayCredentials,
        number: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        let resp = self
            .http
            .post(Self::send_text_url(credentials))
            .header("apikey", &credentials.api_key)
            .json(&SendTextBody { number, text })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Status { status, body });
        }
        Ok(())
    }
}
