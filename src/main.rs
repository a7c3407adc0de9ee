use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;

use obana_shipments::{
    aggregator::TerminalClient,
    booking::BookingClient,
    config::Config,
    crm::ZohoCrmClient,
    mail::ZohoMailClient,
    models::{Contact, PartyDetails, ShipmentInfo},
    notify::{DispatchConfig, NotificationDispatcher},
    rates::RateQuoter,
    retry::RetryPolicy,
    wizard::{ShipmentWizard, StepInput},
};
use tracing::info;

/// One complete booking request, read from a JSON file.
#[derive(serde::Deserialize)]
struct BookingRequest {
    shipment_info: ShipmentInfo,
    party_details: PartyDetails,
    #[serde(default)]
    contact: Option<Contact>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let Some(request_path) = std::env::args().nth(1) else {
        eprintln!("Usage: obana-shipments <booking-request.json>");
        std::process::exit(2);
    };

    let raw = std::fs::read_to_string(&request_path)
        .with_context(|| format!("failed to read {}", request_path))?;
    let request: BookingRequest =
        serde_json::from_str(&raw).with_context(|| format!("invalid request in {}", request_path))?;

    let aggregator = Arc::new(TerminalClient::new(&config)?);
    let quoter = Arc::new(RateQuoter::new(aggregator.clone()));
    let booking = Arc::new(BookingClient::new(aggregator));
    let notifier = Arc::new(NotificationDispatcher::new(
        Arc::new(ZohoCrmClient::new(&config)?),
        Arc::new(ZohoMailClient::new(&config)?),
        DispatchConfig {
            from_address: config.mail_from.clone(),
            admin_email: config.admin_email.clone(),
            retry: RetryPolicy::new(
                config.notify_max_attempts,
                Duration::from_millis(config.notify_backoff_ms),
            ),
        },
    ));

    let mut wizard = ShipmentWizard::new(quoter, booking.clone(), notifier);

    wizard.advance(StepInput::ShipmentInfo(request.shipment_info))?;
    wizard.advance(StepInput::PartyDetails(request.party_details))?;

    let rates = wizard.fetch_rates().await?.to_vec();
    for rate in &rates {
        info!(
            rate_id = %rate.rate_id,
            carrier = %rate.carrier_name,
            amount = rate.amount,
            currency = %rate.currency,
            delivery_time = %rate.delivery_time,
            "rate available"
        );
    }

    // Quotes arrive in aggregator order; take the first one.
    let chosen = rates
        .first()
        .context("aggregator returned no rates")?
        .rate_id
        .clone();
    wizard.select_rate(&chosen)?;

    if let Some(contact) = request.contact {
        wizard.advance(StepInput::Contact(contact))?;
    }

    let booked = wizard.commit().await?;
    info!(
        shipment_id = %booked.shipment_id,
        carrier = %booked.carrier_name,
        tracking = booked.tracking_number.as_deref().unwrap_or("-"),
        "shipment booked"
    );

    for record in wizard.notifications() {
        info!(
            recipient = %record.recipient,
            channel = ?record.channel,
            status = ?record.status,
            attempts = record.attempt_count,
            "notification"
        );
    }

    let timeline = booking.track(&booked.shipment_id).await?;
    info!(status = %timeline.status, events = timeline.events.len(), "current tracking status");

    Ok(())
}
