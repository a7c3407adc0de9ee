use std::sync::Arc;

use tracing::info;

use crate::aggregator::{AggregatorApi, PickupOrder};
use crate::error::Result;
use crate::models::{BookingResult, Rate, ShipmentDraft, TrackingTimeline};

/// Finalizes a draft against a chosen rate. Commits are never auto-retried;
/// a retry is an explicit caller decision.
pub struct BookingClient {
    api: Arc<dyn AggregatorApi>,
}

impl BookingClient {
    pub fn new(api: Arc<dyn AggregatorApi>) -> Self {
        Self { api }
    }

    /// Settlement references `rate_id` and `original_amount` — settling on
    /// the marked-up display amount would double-charge the customer.
    pub async fn arrange_pickup(&self, draft: &ShipmentDraft, rate: &Rate) -> Result<BookingResult> {
        let order = PickupOrder {
            shipment_id: draft.shipment_id.clone(),
            rate_id: rate.rate_id.clone(),
            amount: rate.original_amount,
            currency: rate.currency.clone(),
        };

        let confirmation = self.api.arrange_pickup(&order).await?;

        info!(
            shipment_id = %confirmation.shipment_id,
            carrier = %rate.carrier_name,
            "pickup arranged"
        );

        Ok(BookingResult {
            shipment_id: confirmation.shipment_id,
            tracking_number: confirmation.tracking_number,
            tracking_url: confirmation.tracking_url,
            carrier_name: confirmation
                .carrier_name
                .unwrap_or_else(|| rate.carrier_name.clone()),
            status: confirmation.status.unwrap_or_else(|| "confirmed".to_string()),
            events: confirmation.events,
        })
    }

    pub async fn track(&self, shipment_id: &str) -> Result<TrackingTimeline> {
        self.api.track(shipment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::aggregator::{PickupConfirmation, RawRate};
    use crate::models::{
        Parcel, Party, ShipmentDraftRequest, WeightUnit,
    };

    struct RecordingAggregator {
        orders: Mutex<Vec<PickupOrder>>,
    }

    #[async_trait::async_trait]
    impl AggregatorApi for RecordingAggregator {
        async fn create_draft(&self, _request: &ShipmentDraftRequest) -> Result<String> {
            Ok("SHP-9".to_string())
        }

        async fn fetch_rates(&self, _shipment_id: &str) -> Result<Vec<RawRate>> {
            Ok(vec![])
        }

        async fn arrange_pickup(&self, order: &PickupOrder) -> Result<PickupConfirmation> {
            self.orders
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push(order.clone());

            Ok(PickupConfirmation {
                shipment_id: order.shipment_id.clone(),
                tracking_number: Some("TRK-1".to_string()),
                tracking_url: None,
                carrier_name: None,
                status: None,
                events: vec![],
            })
        }

        async fn track(&self, shipment_id: &str) -> Result<TrackingTimeline> {
            Ok(TrackingTimeline {
                shipment_id: shipment_id.to_string(),
                status: "in_transit".to_string(),
                events: vec![],
            })
        }
    }

    fn party() -> Party {
        Party {
            name: "Ada Obi".to_string(),
            email: "ada@example.com".to_string(),
            phone: "+2348012345678".to_string(),
            address: "12 Marina Rd".to_string(),
            city: "Lagos".to_string(),
            state: "LA".to_string(),
            country: "NG".to_string(),
            zip: None,
        }
    }

    fn draft() -> ShipmentDraft {
        ShipmentDraft {
            shipment_id: "SHP-9".to_string(),
            request: ShipmentDraftRequest {
                sender: party(),
                receiver: party(),
                parcel: Parcel {
                    description: "Docs".to_string(),
                    weight: 1.0,
                    weight_unit: WeightUnit::Kg,
                    items: vec![],
                },
            },
        }
    }

    fn rate() -> Rate {
        Rate {
            rate_id: "rate-7".to_string(),
            carrier_name: "Obana Express".to_string(),
            amount: 1_025.0,
            currency: "NGN".to_string(),
            delivery_time: "1-2 days".to_string(),
            original_amount: 1_000.0,
        }
    }

    #[tokio::test]
    async fn settlement_uses_original_amount_not_display_amount() {
        let aggregator = Arc::new(RecordingAggregator {
            orders: Mutex::new(vec![]),
        });
        let client = BookingClient::new(aggregator.clone());

        let booking = client.arrange_pickup(&draft(), &rate()).await.unwrap();

        let orders = aggregator
            .orders
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].rate_id, "rate-7");
        assert_eq!(orders[0].amount, 1_000.0);
        assert_eq!(booking.shipment_id, "SHP-9");
        assert_eq!(booking.tracking_number.as_deref(), Some("TRK-1"));
    }

    #[tokio::test]
    async fn missing_response_fields_fall_back_to_the_chosen_rate() {
        let aggregator = Arc::new(RecordingAggregator {
            orders: Mutex::new(vec![]),
        });
        let client = BookingClient::new(aggregator);

        let booking = client.arrange_pickup(&draft(), &rate()).await.unwrap();

        assert_eq!(booking.carrier_name, "Obana Express");
        assert_eq!(booking.status, "confirmed");
    }
}
