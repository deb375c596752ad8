use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::clinic::Booking;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("Notification endpoint rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Observer of confirmed bookings. Called off the request path; failures
/// are logged by the caller and never reach the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingNotifier: Send + Sync {
    async fn notify_confirmed(&self, booking: &Booking) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfirmationMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub text: String,
}

impl ConfirmationMessage {
    pub fn for_booking(booking: &Booking, from: &str) -> Self {
        Self {
            to: booking.patient.clone(),
            from: from.to_string(),
            subject: format!("Your appointment for {} is confirmed", booking.treatment),
            text: format!(
                "Hello {}, your appointment for {} is confirmed on {} at {}.",
                booking.patient_name, booking.treatment, booking.date, booking.slot
            ),
        }
    }
}

/// Writes confirmations to the log. Used when no delivery endpoint is set.
pub struct LogNotifier;

#[async_trait]
impl BookingNotifier for LogNotifier {
    async fn notify_confirmed(&self, booking: &Booking) -> Result<(), NotifyError> {
        info!(
            booking_id = %booking.id,
            patient = %booking.patient,
            "Booking confirmed: {} on {} at {}",
            booking.treatment, booking.date, booking.slot
        );
        Ok(())
    }
}

/// Posts a [`ConfirmationMessage`] as JSON to a mail-relay endpoint.
pub struct WebhookNotifier {
    client: Client,
    url: String,
    from: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, from: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build notifier HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            url: url.to_string(),
            from: from.to_string(),
        }
    }
}

#[async_trait]
impl BookingNotifier for WebhookNotifier {
    async fn notify_confirmed(&self, booking: &Booking) -> Result<(), NotifyError> {
        let message = ConfirmationMessage::for_booking(booking, &self.from);
        debug!("Sending confirmation for booking {} to {}", booking.id, self.url);

        let response = self.client.post(&self.url)
            .json(&message)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotifyError::Delivery(format!("request to {} timed out", self.url))
                } else {
                    NotifyError::Delivery(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status: status.as_u16(), message });
        }

        info!("Confirmation sent for booking {}", booking.id);
        Ok(())
    }
}

pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn BookingNotifier> {
    match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url, &config.notify_from_address, config.store_timeout())),
        None => Arc::new(LogNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_confirmation_message_names_the_booking() {
        let booking = Booking {
            id: "b-1".to_string(),
            treatment: "Cleaning".to_string(),
            date: "2024-01-05".to_string(),
            slot: "10am".to_string(),
            patient: "p@x.com".to_string(),
            patient_name: "Pat".to_string(),
            created_at: Utc::now(),
        };

        let message = ConfirmationMessage::for_booking(&booking, "clinic@x.com");

        assert_eq!(message.to, "p@x.com");
        assert_eq!(message.subject, "Your appointment for Cleaning is confirmed");
        assert!(message.text.contains("2024-01-05 at 10am"));
        assert!(message.text.starts_with("Hello Pat"));
    }
}
