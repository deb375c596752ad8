use std::time::Duration;

use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use booking_cell::services::notifier::{BookingNotifier, NotifyError, WebhookNotifier};
use shared_models::clinic::Booking;

fn booking() -> Booking {
    Booking {
        id: "b-1".to_string(),
        treatment: "Cleaning".to_string(),
        date: "2024-01-05".to_string(),
        slot: "10am".to_string(),
        patient: "p@x.com".to_string(),
        patient_name: "Pat".to_string(),
        created_at: Utc::now(),
    }
}

fn notifier_for(mock_server: &MockServer, timeout: Duration) -> WebhookNotifier {
    WebhookNotifier::new(&format!("{}/send", mock_server.uri()), "clinic@x.com", timeout)
}

#[tokio::test]
async fn test_webhook_posts_confirmation_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_json(json!({
            "to": "p@x.com",
            "from": "clinic@x.com",
            "subject": "Your appointment for Cleaning is confirmed",
            "text": "Hello Pat, your appointment for Cleaning is confirmed on 2024-01-05 at 10am."
        })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = notifier_for(&mock_server, Duration::from_secs(5))
        .notify_confirmed(&booking())
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_webhook_error_status_is_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relay down"))
        .mount(&mock_server)
        .await;

    let result = notifier_for(&mock_server, Duration::from_secs(5))
        .notify_confirmed(&booking())
        .await;

    assert_matches!(
        result,
        Err(NotifyError::Rejected { status: 500, ref message }) if message == "relay down"
    );
}

#[tokio::test]
async fn test_hung_webhook_times_out_as_delivery_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&mock_server)
        .await;

    let result = notifier_for(&mock_server, Duration::from_millis(100))
        .notify_confirmed(&booking())
        .await;

    assert_matches!(result, Err(NotifyError::Delivery(_)));
}

#[tokio::test]
async fn test_unreachable_webhook_is_delivery_failure() {
    let notifier = WebhookNotifier::new("http://127.0.0.1:1/send", "clinic@x.com", Duration::from_secs(1));

    let result = notifier.notify_confirmed(&booking()).await;

    assert_matches!(result, Err(NotifyError::Delivery(_)));
}
