use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};

const SERVICE: &str = "mail";

/// Store reference returned by the attachment upload; must be obtained
/// before a file can ride on a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentRef {
    pub store_name: String,
    pub attachment_path: String,
    pub attachment_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMessage {
    pub from_address: String,
    pub to_address: String,
    pub subject: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentRef>,
}

#[async_trait::async_trait]
pub trait MailApi: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<()>;
    async fn upload_attachment(&self, file_name: &str, bytes: Vec<u8>) -> Result<AttachmentRef>;
}

pub struct ZohoMailClient {
    base_url: String,
    token: String,
    http_client: HttpClient,
}

impl ZohoMailClient {
    pub fn new(config: &Config) -> Result<Self> {
        // Uploads ride on the same client, hence the longer timeout.
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.mail_timeout_secs))
            .build()
            .map_err(|e| Error::transport(SERVICE, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.mail_url.trim_end_matches('/').to_string(),
            token: config.mail_token.clone(),
            http_client,
        })
    }

    fn auth_header(&self) -> String {
        format!("Zoho-oauthtoken {}", self.token)
    }

    async fn ok(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Error::transport(
            SERVICE,
            format!("{} failed (status {}): {}", what, status, body),
        ))
    }
}

#[async_trait::async_trait]
impl MailApi for ZohoMailClient {
    async fn send(&self, message: &OutboundMessage) -> Result<()> {
        let url = format!("{}/messages", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(message)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("message send failed: {}", e)))?;

        Self::ok(response, "message send").await?;
        Ok(())
    }

    async fn upload_attachment(&self, file_name: &str, bytes: Vec<u8>) -> Result<AttachmentRef> {
        let url = format!(
            "{}/messages/attachments?fileName={}",
            self.base_url, file_name
        );

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .body(bytes)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("attachment upload failed: {}", e)))?;

        let response = Self::ok(response, "attachment upload").await?;

        response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid upload response: {}", e)))
    }
}
