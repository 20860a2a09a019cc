use anyhow::Context;
use async_trait::async_trait;

use super::{NotificationKind, Notifier};
use crate::models::{AlternativeSlot, Booking, Customer};

/// Email notifications through the Resend HTTP API.
pub struct ResendEmailNotifier {
    api_key: String,
    from_address: String,
    client: reqwest::Client,
}

impl ResendEmailNotifier {
    pub fn new(api_key: String, from_address: String) -> Self {
        Self {
            api_key,
            from_address,
            client: reqwest::Client::new(),
        }
    }
}

fn subject(kind: NotificationKind, booking: &Booking) -> String {
    let service = booking.service_name.as_deref().unwrap_or("your appointment");
    match kind {
        NotificationKind::BookingConfirmed => format!("Booking confirmed - {service}"),
        NotificationKind::BookingRejected => format!("Booking not available - {service}"),
        NotificationKind::AlternativesProposed => {
            format!("Alternative slots available - {service}")
        }
    }
}

fn body(kind: NotificationKind, booking: &Booking, alternatives: &[AlternativeSlot]) -> String {
    match kind {
        NotificationKind::BookingConfirmed => format!(
            "Your booking on {} at {} has been confirmed. See you then!",
            booking.date, booking.start_time
        ),
        NotificationKind::BookingRejected => {
            let reason = booking
                .rejection_reason
                .as_deref()
                .unwrap_or("the requested time is not available");
            format!(
                "Unfortunately your booking on {} at {} could not be confirmed: {}.",
                booking.date, booking.start_time, reason
            )
        }
        NotificationKind::AlternativesProposed => {
            let mut text = format!(
                "Your requested time on {} at {} is not available. \
                 The salon proposes the following alternatives:\n",
                booking.date, booking.start_time
            );
            for slot in alternatives {
                text.push_str(&format!("- {} at {}\n", slot.date, slot.start_time));
            }
            text
        }
    }
}

#[async_trait]
impl Notifier for ResendEmailNotifier {
    async fn send(
        &self,
        kind: NotificationKind,
        booking: &Booking,
        customer: &Customer,
        alternatives: &[AlternativeSlot],
    ) -> anyhow::Result<()> {
        if self.api_key.is_empty() {
            tracing::warn!(
                to = %customer.email,
                booking_id = %booking.id,
                "email API key not configured, notification not sent"
            );
            return Ok(());
        }

        self.client
            .post("https://api.resend.com/emails")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "from": self.from_address,
                "to": customer.email,
                "subject": subject(kind, booking),
                "text": body(kind, booking, alternatives),
            }))
            .send()
            .await
            .context("failed to send email")?
            .error_for_status()
            .context("email API returned error")?;

        Ok(())
    }
}
