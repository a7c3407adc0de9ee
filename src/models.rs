use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One party to a shipment (sender or receiver).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    /// ISO country code as returned by the geography service.
    pub country: String,
    #[serde(default)]
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Kg => "kg",
            WeightUnit::Lb => "lb",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelItem {
    pub name: String,
    pub description: String,
    pub currency: String,
    /// Declared value per unit, in `currency`.
    pub value: f64,
    pub weight: f64,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub description: String,
    pub weight: f64,
    pub weight_unit: WeightUnit,
    pub items: Vec<ParcelItem>,
}

/// One end of the route: where the parcel leaves from or arrives at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEnd {
    pub country: String,
    pub state: String,
    pub city: String,
}

/// First wizard step: the route and the parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentInfo {
    pub pickup: RouteEnd,
    pub destination: RouteEnd,
    pub parcel: Parcel,
}

/// Second wizard step: full sender and receiver details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyDetails {
    pub sender: Party,
    pub receiver: Party,
}

/// Everything the aggregator needs to open a shipment draft.
///
/// Phones are normalized to a country-prefixed format and both parties
/// carry a full country/state/city triple before this leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDraftRequest {
    pub sender: Party,
    pub receiver: Party,
    pub parcel: Parcel,
}

/// Aggregator-assigned draft; immutable once created and consumed exactly
/// once by the booking commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentDraft {
    pub shipment_id: String,
    pub request: ShipmentDraftRequest,
}

/// A carrier quote after display remapping and markup.
///
/// `amount` is the marked-up display price; `original_amount` is what the
/// aggregator quoted and what settlement uses. `amount >= original_amount`
/// always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub rate_id: String,
    pub carrier_name: String,
    pub amount: f64,
    pub currency: String,
    pub delivery_time: String,
    pub original_amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEvent {
    pub status: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
}

/// Outcome of a successful pickup arrangement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingResult {
    pub shipment_id: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    #[serde(default)]
    pub tracking_url: Option<String>,
    pub carrier_name: String,
    pub status: String,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

/// Tracking timeline for an already-booked shipment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingTimeline {
    pub shipment_id: String,
    pub status: String,
    #[serde(default)]
    pub events: Vec<TrackingEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationChannel {
    Email,
    Crm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Success,
    Failure,
}

/// Per-booking record of one best-effort side effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub recipient: String,
    pub channel: NotificationChannel,
    pub status: NotificationStatus,
    pub attempt_count: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Contact captured in the final wizard step (or on a quote form).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRequestForm {
    pub contact: Contact,
    pub sender: Party,
    pub receiver: Party,
    pub parcel: Parcel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequestForm {
    pub contact: Contact,
    #[serde(default)]
    pub company: Option<String>,
    pub product: String,
    pub quantity: String,
    pub destination: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Every form the notification fan-out can carry.
///
/// Template and CRM payload builders match on this exhaustively, so a new
/// form type fails to compile until every consumer handles it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "form_type", rename_all = "snake_case")]
pub enum FormSubmission {
    ShipmentRequest(ShipmentRequestForm),
    QuoteRequest(QuoteRequestForm),
}

impl FormSubmission {
    pub fn contact(&self) -> &Contact {
        match self {
            FormSubmission::ShipmentRequest(form) => &form.contact,
            FormSubmission::QuoteRequest(form) => &form.contact,
        }
    }
}
