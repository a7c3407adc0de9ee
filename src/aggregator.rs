use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result, codes};
use crate::models::{ShipmentDraftRequest, TrackingEvent, TrackingTimeline};

const SERVICE: &str = "aggregator";

/// Carrier quote exactly as the aggregator returned it, before any
/// display remapping or markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRate {
    pub rate_id: String,
    pub carrier_name: String,
    pub amount: f64,
    pub currency: String,
    pub delivery_time: String,
}

/// Settlement order for a chosen rate. `amount` must be the aggregator's
/// quoted amount, never the marked-up display price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupOrder {
    pub shipment_id: String,
    pub rate_id: String,
    pub amount: f64,
    pub currency: String,
}

/// Aggregator pickup response (partial, only fields we need)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickupConfirmation {
    pub shipment_id: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    #[serde(default)]
    pub carrier_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Deserialize)]
struct DraftResponse {
    shipment_id: String,
}

/// Everything the orchestration needs from the shipping aggregator.
#[async_trait::async_trait]
pub trait AggregatorApi: Send + Sync {
    /// Open a provisional shipment and return its aggregator id.
    async fn create_draft(&self, request: &ShipmentDraftRequest) -> Result<String>;

    /// List carrier quotes for an existing draft, in aggregator order.
    async fn fetch_rates(&self, shipment_id: &str) -> Result<Vec<RawRate>>;

    /// Finalize the shipment against a chosen rate.
    async fn arrange_pickup(&self, order: &PickupOrder) -> Result<PickupConfirmation>;

    /// Tracking timeline for a booked shipment.
    async fn track(&self, shipment_id: &str) -> Result<TrackingTimeline>;
}

pub struct TerminalClient {
    base_url: String,
    api_key: String,
    http_client: HttpClient,
}

impl TerminalClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .map_err(|e| Error::transport(SERVICE, format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.aggregator_url.trim_end_matches('/').to_string(),
            api_key: config.aggregator_api_key.clone(),
            http_client,
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
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
impl AggregatorApi for TerminalClient {
    async fn create_draft(&self, request: &ShipmentDraftRequest) -> Result<String> {
        let url = format!("{}/shipment-draft", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(request)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("draft request failed: {}", e)))?;

        // The aggregator rejecting the draft itself is a domain answer,
        // not an outage.
        if response.status().is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::business(codes::DRAFT_FAILED, body));
        }

        let response = Self::ok(response, "draft creation").await?;
        let draft: DraftResponse = response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid draft response: {}", e)))?;

        Ok(draft.shipment_id)
    }

    async fn fetch_rates(&self, shipment_id: &str) -> Result<Vec<RawRate>> {
        let url = format!("{}/rates?shipment_id={}", self.base_url, shipment_id);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("rates request failed: {}", e)))?;

        let response = Self::ok(response, "rate listing").await?;

        response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid rates response: {}", e)))
    }

    async fn arrange_pickup(&self, order: &PickupOrder) -> Result<PickupConfirmation> {
        let url = format!("{}/pickup", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(order)
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("pickup request failed: {}", e)))?;

        let response = Self::ok(response, "pickup arrangement").await?;

        response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid pickup response: {}", e)))
    }

    async fn track(&self, shipment_id: &str) -> Result<TrackingTimeline> {
        let url = format!("{}/track/{}", self.base_url, shipment_id);

        let response = self
            .http_client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("tracking request failed: {}", e)))?;

        let response = Self::ok(response, "tracking lookup").await?;

        response
            .json()
            .await
            .map_err(|e| Error::transport(SERVICE, format!("invalid tracking response: {}", e)))
    }
}
