use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info};

use crate::crm::{CrmApi, record_for};
use crate::error::Error;
use crate::mail::{MailApi, OutboundMessage};
use crate::models::{
    BookingResult, FormSubmission, NotificationChannel, NotificationRecord, NotificationStatus,
};
use crate::retry::{Retried, RetryPolicy, retry};
use crate::templates::{self, EmailContent};

#[derive(Debug, Clone)]
pub struct DispatchConfig {
    pub from_address: String,
    pub admin_email: String,
    pub retry: RetryPolicy,
}

/// Best-effort side effects after a commit (or a quote submission): CRM
/// upsert plus admin and customer mail, fired concurrently.
///
/// Nothing here can fail the caller — every outcome, success or not, comes
/// back as a `NotificationRecord` and failures end up in the logs.
pub struct NotificationDispatcher {
    crm: Arc<dyn CrmApi>,
    mail: Arc<dyn MailApi>,
    config: DispatchConfig,
}

impl NotificationDispatcher {
    pub fn new(crm: Arc<dyn CrmApi>, mail: Arc<dyn MailApi>, config: DispatchConfig) -> Self {
        Self { crm, mail, config }
    }

    pub async fn dispatch(
        &self,
        form: &FormSubmission,
        booking: Option<&BookingResult>,
    ) -> Vec<NotificationRecord> {
        let customer = form.contact().email.clone();

        let (crm, admin_mail, customer_mail) = futures::join!(
            self.upsert_crm(form),
            self.send_email(
                self.config.admin_email.clone(),
                templates::admin_email(form, booking),
            ),
            self.send_email(customer, templates::customer_email(form, booking)),
        );

        let records = vec![crm, admin_mail, customer_mail];

        info!(
            delivered = records
                .iter()
                .filter(|r| r.status == NotificationStatus::Success)
                .count(),
            total = records.len(),
            "notification fan-out finished"
        );

        records
    }

    async fn upsert_crm(&self, form: &FormSubmission) -> NotificationRecord {
        let email = form.contact().email.clone();
        let record = record_for(form);

        let crm = self.crm.clone();
        let outcome = retry("crm_upsert", self.config.retry, || {
            let crm = crm.clone();
            let email = email.clone();
            let record = record.clone();
            async move {
                match crm.find_by_email(&email).await? {
                    Some(id) => crm.update_record(&id, &record).await,
                    None => {
                        crm.create_record(&record).await?;
                        Ok(())
                    }
                }
            }
        })
        .await;

        self.record(email, NotificationChannel::Crm, outcome)
    }

    async fn send_email(&self, to: String, content: EmailContent) -> NotificationRecord {
        let message = OutboundMessage {
            from_address: self.config.from_address.clone(),
            to_address: to.clone(),
            subject: content.subject,
            content: content.body,
            attachments: vec![],
        };

        let mail = self.mail.clone();
        let outcome = retry("email_send", self.config.retry, || {
            let mail = mail.clone();
            let message = message.clone();
            async move { mail.send(&message).await }
        })
        .await;

        self.record(to, NotificationChannel::Email, outcome)
    }

    fn record(
        &self,
        recipient: String,
        channel: NotificationChannel,
        outcome: Retried<(), Error>,
    ) -> NotificationRecord {
        let status = if outcome.is_ok() {
            NotificationStatus::Success
        } else {
            NotificationStatus::Failure
        };

        if let Err(ref e) = outcome.result {
            error!(
                recipient = %recipient,
                channel = ?channel,
                attempts = outcome.attempts,
                error = %e,
                "notification failed after retries"
            );
        }

        NotificationRecord {
            recipient,
            channel,
            status,
            attempt_count: outcome.attempts,
            recorded_at: Utc::now(),
        }
    }
}
