use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::FormSubmission;

const SERVICE: &str = "crm";

/// Upsert-by-email surface of the CRM's records API.
///
/// Search-then-write with last-write-wins: two near-simultaneous
/// submissions for the same email can both miss the other's write and
/// create duplicates. Known limitation, kept as-is.
#[async_trait::async_trait]
pub trait CrmApi: Send + Sync {
    /// Record id for `email`, if one exists.
    async fn find_by_email(&self, email: &str) -> Result<Option<String>>;
    async fn create_record(&self, record: &Value) -> Result<String>;
    async fn update_record(&self, id: &str, record: &Value) -> Result<()>;
}

/// CRM payload for a form submission; matches exhaustively so new form
/// types cannot silently skip the CRM.
pub fn record_for(form: &FormSubmission) -> Value {
    let contact = form.contact();

    match form {
        FormSubmission::ShipmentRequest(request) => json!({
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "lead_type": "shipment_request",
            "description": format!(
                "Shipment request: {} ({} -> {})",
                request.parcel.description,
                request.sender.city,
                request.receiver.city,
            ),
        }),
        FormSubmission::QuoteRequest(request) => json!({
            "name": contact.name,
            "email": contact.email,
            "phone": contact.phone,
            "company": request.company,
            "lead_type": "quote_request",
            "description": format!(
                "RFQ: {} x {} to {}",
                request.product, request.quantity, request.destination,
            ),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct RecordRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<RecordRef>,
}

pub struct ZohoCrmClient {
    base_url: String,
    token: String,
    http_client: HttpClient,
}

impl ZohoCrmClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::transport(SERVICE, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.crm_url.trim_end_matches('/').to_string(),
            token: config.crm_token.clone(),
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
impl CrmApi for ZohoCrmClient {
    async fn find_by_email(&self, email: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/records?criteria=email:equals:{}",
            self.base_url, email
        );

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("record search failed: {}", e)))?;

        // An empty search comes back as 204 with no body.
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let response = Self::ok(response, "record search").await?;
        let search: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid search response: {}", e)))?;

        Ok(search.data.into_iter().next().map(|r| r.id))
    }

    async fn create_record(&self, record: &Value) -> Result<String> {
        let url = format!("{}/records", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(record)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("record create failed: {}", e)))?;

        let response = Self::ok(response, "record create").await?;
        let created: RecordRef = response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid create response: {}", e)))?;

        Ok(created.id)
    }

    async fn update_record(&self, id: &str, record: &Value) -> Result<()> {
        let url = format!("{}/records/{}", self.base_url, id);

        let response = self
            .http_client
            .put(&url)
            .header("Authorization", self.auth_header())
            .json(record)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("record update failed: {}", e)))?;

        Self::ok(response, "record update").await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Contact, QuoteRequestForm};

    #[test]
    fn quote_request_record_carries_the_rfq_summary() {
        let form = FormSubmission::QuoteRequest(QuoteRequestForm {
            contact: Contact {
                name: "Ada Obi".to_string(),
                email: "ada@example.com".to_string(),
                phone: "+2348012345678".to_string(),
            },
            company: Some("Obi Trading Ltd".to_string()),
            product: "Cocoa butter".to_string(),
            quantity: "200 cartons".to_string(),
            destination: "Accra".to_string(),
            notes: None,
        });

        let record = record_for(&form);
        assert_eq!(record["email"], "ada@example.com");
        assert_eq!(record["lead_type"], "quote_request");
        assert_eq!(record["description"], "RFQ: Cocoa butter x 200 cartons to Accra");
    }
}
