use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::aggregator::{AggregatorApi, RawRate};
use crate::error::{Error, Result, codes};
use crate::models::{Rate, ShipmentDraft, ShipmentDraftRequest};

/// Fixed markup applied to every displayed amount.
const MARKUP_FACTOR: f64 = 1.025;

/// Carriers resold under the platform's white-label brand.
static CARRIER_ALIASES: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| HashMap::from([("GIG Logistics", "Obana Express")]));

/// Display name for a carrier: substituted for known aliases, identity
/// for everything else.
pub fn remap_carrier(name: &str) -> &str {
    CARRIER_ALIASES.get(name).copied().unwrap_or(name)
}

/// Display amount: the quoted amount scaled by the markup, rounded half-up
/// to the nearest currency unit.
pub fn marked_up(original: f64) -> f64 {
    (original * MARKUP_FACTOR).round()
}

/// Display transform only: `rate_id` and the settlement amount survive
/// untouched in `rate_id`/`original_amount`.
pub fn present_rate(raw: RawRate) -> Rate {
    Rate {
        amount: marked_up(raw.amount),
        carrier_name: remap_carrier(&raw.carrier_name).to_string(),
        rate_id: raw.rate_id,
        currency: raw.currency,
        delivery_time: raw.delivery_time,
        original_amount: raw.amount,
    }
}

/// Draft creation and rate shopping against the aggregator.
pub struct RateQuoter {
    api: Arc<dyn AggregatorApi>,
}

impl RateQuoter {
    pub fn new(api: Arc<dyn AggregatorApi>) -> Self {
        Self { api }
    }

    pub async fn create_draft(&self, request: ShipmentDraftRequest) -> Result<ShipmentDraft> {
        let shipment_id = self.api.create_draft(&request).await?;

        if shipment_id.trim().is_empty() {
            return Err(Error::business(
                codes::DRAFT_FAILED,
                "aggregator returned an empty shipment id",
            ));
        }

        debug!(%shipment_id, "shipment draft created");

        Ok(ShipmentDraft {
            shipment_id,
            request,
        })
    }

    /// Quotes in the order the aggregator sent them; no re-sorting.
    pub async fn list_rates(&self, shipment_id: &str) -> Result<Vec<Rate>> {
        let raw = self.api.fetch_rates(shipment_id).await?;

        if raw.is_empty() {
            return Err(Error::business(
                codes::NO_RATES,
                "no rates available for this route",
            ));
        }

        debug!(shipment_id, count = raw.len(), "rates received");

        Ok(raw.into_iter().map(present_rate).collect())
    }
}
