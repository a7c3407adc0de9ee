use std::sync::Arc;

use tracing::{info, warn};

use crate::booking::BookingClient;
use crate::error::{Error, Result};
use crate::models::{
    BookingResult, Contact, FormSubmission, NotificationRecord, PartyDetails, Rate, ShipmentDraft,
    ShipmentDraftRequest, ShipmentInfo, ShipmentRequestForm,
};
use crate::notify::NotificationDispatcher;
use crate::rates::RateQuoter;
use crate::validate;

/// Wizard position. Transitions are strictly forward except `back` and
/// `edit`; `Failed` is reachable only from `Committing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    CollectingShipmentInfo,
    CollectingPartyDetails,
    Preview,
    SelectingCarrier,
    ContactCapture,
    Committing,
    Done,
    Failed,
}

/// Validated output of each step. Resubmitting a step overwrites only that
/// step's slot; everything else survives.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WizardFormData {
    pub shipment_info: Option<ShipmentInfo>,
    pub party_details: Option<PartyDetails>,
    pub contact: Option<Contact>,
}

/// Typed submission for one step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepInput {
    ShipmentInfo(ShipmentInfo),
    PartyDetails(PartyDetails),
    Contact(Contact),
}

impl StepInput {
    fn name(&self) -> &'static str {
        match self {
            StepInput::ShipmentInfo(_) => "shipment info",
            StepInput::PartyDetails(_) => "party details",
            StepInput::Contact(_) => "contact",
        }
    }
}

/// One booking session: accumulated form data, the aggregator draft, the
/// fetched rate list, and the commit guard. Owned by a single caller;
/// nothing is shared across sessions.
pub struct ShipmentWizard {
    quoter: Arc<RateQuoter>,
    booking: Arc<BookingClient>,
    notifier: Arc<NotificationDispatcher>,
    step: WizardStep,
    form: WizardFormData,
    draft: Option<ShipmentDraft>,
    rates: Vec<Rate>,
    selected_rate: Option<Rate>,
    committing: bool,
    booking_result: Option<BookingResult>,
    notifications: Vec<NotificationRecord>,
}

impl ShipmentWizard {
    pub fn new(
        quoter: Arc<RateQuoter>,
        booking: Arc<BookingClient>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            quoter,
            booking,
            notifier,
            step: WizardStep::CollectingShipmentInfo,
            form: WizardFormData::default(),
            draft: None,
            rates: Vec::new(),
            selected_rate: None,
            committing: false,
            booking_result: None,
            notifications: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn form(&self) -> &WizardFormData {
        &self.form
    }

    pub fn rates(&self) -> &[Rate] {
        &self.rates
    }

    pub fn selected_rate(&self) -> Option<&Rate> {
        self.selected_rate.as_ref()
    }

    pub fn booking_result(&self) -> Option<&BookingResult> {
        self.booking_result.as_ref()
    }

    pub fn notifications(&self) -> &[NotificationRecord] {
        &self.notifications
    }

    /// Validate `input` against the current step's schema and move forward.
    ///
    /// On a validation failure the wizard stays where it is and the error
    /// carries the field-level messages.
    pub fn advance(&mut self, input: StepInput) -> Result<WizardStep> {
        match (self.step, input) {
            (WizardStep::CollectingShipmentInfo, StepInput::ShipmentInfo(info)) => {
                validate::validate_shipment_info(&info)?;

                if self.form.shipment_info.as_ref() != Some(&info) {
                    self.invalidate_quotes();
                }

                self.form.shipment_info = Some(info);
                self.step = WizardStep::CollectingPartyDetails;
            }
            (WizardStep::CollectingPartyDetails, StepInput::PartyDetails(details)) => {
                let normalized = validate::validate_party_details(&details)?;

                if self.form.party_details.as_ref() != Some(&normalized) {
                    self.invalidate_quotes();
                }

                self.form.party_details = Some(normalized);
                self.step = WizardStep::Preview;
            }
            (WizardStep::ContactCapture, StepInput::Contact(contact)) => {
                validate::validate_contact(&contact)?;
                self.form.contact = Some(contact);
            }
            (step, input) => {
                return Err(Error::State(format!(
                    "cannot submit {} at {:?}",
                    input.name(),
                    step
                )));
            }
        }

        Ok(self.step)
    }

    /// Confirm the preview: create the draft (or reuse a still-valid one)
    /// and fetch the rate list. On failure the wizard stays at `Preview`
    /// so the user can retry without re-entering anything.
    pub async fn fetch_rates(&mut self) -> Result<&[Rate]> {
        if self.step != WizardStep::Preview {
            return Err(Error::State(format!(
                "rates can only be fetched from Preview, not {:?}",
                self.step
            )));
        }

        if self.draft.is_none() {
            let request = self.draft_request()?;
            let draft = self.quoter.create_draft(request).await?;
            self.draft = Some(draft);
        }

        let shipment_id = self
            .draft
            .as_ref()
            .map(|d| d.shipment_id.clone())
            .ok_or_else(|| Error::State("draft missing after creation".to_string()))?;

        let rates = self.quoter.list_rates(&shipment_id).await?;

        info!(shipment_id = %shipment_id, count = rates.len(), "rates fetched");

        self.rates = rates;
        self.step = WizardStep::SelectingCarrier;
        Ok(&self.rates)
    }

    /// Pick a rate from the fetched list by id.
    pub fn select_rate(&mut self, rate_id: &str) -> Result<()> {
        if !matches!(
            self.step,
            WizardStep::SelectingCarrier | WizardStep::ContactCapture
        ) {
            return Err(Error::State(format!(
                "a rate cannot be selected at {:?}",
                self.step
            )));
        }

        let rate = self
            .rates
            .iter()
            .find(|r| r.rate_id == rate_id)
            .cloned()
            .ok_or_else(|| Error::State(format!("unknown rate id {}", rate_id)))?;

        self.selected_rate = Some(rate);
        self.step = WizardStep::ContactCapture;
        Ok(())
    }

    /// Arrange pickup for the selected rate.
    ///
    /// Idempotent per shipment: once booked, later calls return the same
    /// `BookingResult` without touching the aggregator, and a call while
    /// one is already in flight is rejected before any network traffic.
    /// The commit itself is never auto-retried; after `Failed` the caller
    /// decides whether to call again.
    pub async fn commit(&mut self) -> Result<BookingResult> {
        if let Some(ref booked) = self.booking_result {
            return Ok(booked.clone());
        }

        if self.committing {
            return Err(Error::State("commit already in progress".to_string()));
        }

        if !matches!(
            self.step,
            WizardStep::SelectingCarrier | WizardStep::ContactCapture | WizardStep::Failed
        ) {
            return Err(Error::State(format!("cannot commit at {:?}", self.step)));
        }

        let (draft, rate) = match (self.draft.clone(), self.selected_rate.clone()) {
            (Some(draft), Some(rate)) => (draft, rate),
            _ => {
                return Err(Error::State(
                    "commit requires a shipment draft and a selected rate".to_string(),
                ));
            }
        };

        self.committing = true;
        self.step = WizardStep::Committing;

        let committed = self.booking.arrange_pickup(&draft, &rate).await;
        self.committing = false;

        let booked = match committed {
            Ok(booked) => booked,
            Err(e) => {
                warn!(shipment_id = %draft.shipment_id, error = %e, "commit failed");
                self.step = WizardStep::Failed;
                return Err(e);
            }
        };

        self.step = WizardStep::Done;
        self.booking_result = Some(booked.clone());

        // Best effort only; the booking is already final.
        if let Some(submission) = self.submission() {
            self.notifications = self.notifier.dispatch(&submission, Some(&booked)).await;
        }

        Ok(booked)
    }

    /// One step backward. Data entered for steps ahead of the target is
    /// kept; only a contradicting resubmission clears dependent fields.
    pub fn back(&mut self) -> Result<WizardStep> {
        self.step = match self.step {
            WizardStep::CollectingPartyDetails => WizardStep::CollectingShipmentInfo,
            WizardStep::Preview => WizardStep::CollectingPartyDetails,
            WizardStep::SelectingCarrier => WizardStep::Preview,
            WizardStep::ContactCapture => WizardStep::SelectingCarrier,
            step => {
                return Err(Error::State(format!("cannot go back from {:?}", step)));
            }
        };
        Ok(self.step)
    }

    /// Jump back to the first step with every entered value preserved for
    /// pre-filling.
    pub fn edit(&mut self) -> Result<WizardStep> {
        if matches!(self.step, WizardStep::Committing | WizardStep::Done) {
            return Err(Error::State(format!("cannot edit at {:?}", self.step)));
        }

        self.step = WizardStep::CollectingShipmentInfo;
        Ok(self.step)
    }

    /// A changed route or changed parties contradict the draft and any
    /// quotes derived from it.
    fn invalidate_quotes(&mut self) {
        if self.draft.is_some() || !self.rates.is_empty() {
            info!("shipment details changed, discarding draft and rates");
        }
        self.draft = None;
        self.rates.clear();
        self.selected_rate = None;
    }

    /// The draft payload. The route entered in step 1 is authoritative for
    /// both parties' locations.
    fn draft_request(&self) -> Result<ShipmentDraftRequest> {
        let info = self
            .form
            .shipment_info
            .as_ref()
            .ok_or_else(|| Error::State("shipment info has not been submitted".to_string()))?;
        let details = self
            .form
            .party_details
            .as_ref()
            .ok_or_else(|| Error::State("party details have not been submitted".to_string()))?;

        let mut sender = details.sender.clone();
        sender.country = info.pickup.country.clone();
        sender.state = info.pickup.state.clone();
        sender.city = info.pickup.city.clone();

        let mut receiver = details.receiver.clone();
        receiver.country = info.destination.country.clone();
        receiver.state = info.destination.state.clone();
        receiver.city = info.destination.city.clone();

        Ok(ShipmentDraftRequest {
            sender,
            receiver,
            parcel: info.parcel.clone(),
        })
    }

    fn submission(&self) -> Option<FormSubmission> {
        let info = self.form.shipment_info.as_ref()?;
        let details = self.form.party_details.as_ref()?;

        let contact = self.form.contact.clone().unwrap_or_else(|| Contact {
            name: details.sender.name.clone(),
            email: details.sender.email.clone(),
            phone: details.sender.phone.clone(),
        });

        Some(FormSubmission::ShipmentRequest(ShipmentRequestForm {
            contact,
            sender: details.sender.clone(),
            receiver: details.receiver.clone(),
            parcel: info.parcel.clone(),
        }))
    }
}
