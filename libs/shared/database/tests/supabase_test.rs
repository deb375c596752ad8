use assert_matches::assert_matches;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{BookingLedger, CatalogStore, StoreError, SupabaseStore, UserDirectory};
use shared_models::clinic::{Booking, BookingFilter, Role, UserRecord};

fn store_for(mock_server: &MockServer) -> SupabaseStore {
    let config = AppConfig {
        supabase_url: mock_server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    };
    SupabaseStore::new(&config)
}

fn sample_booking() -> Booking {
    Booking {
        id: "8f0e3c1e-0000-4000-8000-000000000001".to_string(),
        treatment: "Cleaning".to_string(),
        date: "2024-01-05".to_string(),
        slot: "10am".to_string(),
        patient: "p@x.com".to_string(),
        patient_name: "Pat".to_string(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_list_services_sends_api_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Cleaning", "slots": ["9am", "10am"] },
            { "name": "Whitening", "slots": ["1pm"] }
        ])))
        .mount(&mock_server)
        .await;

    let services = store_for(&mock_server).list_services().await.unwrap();

    assert_eq!(services.len(), 2);
    assert_eq!(services[0].name, "Cleaning");
    assert_eq!(services[0].slots, vec!["9am", "10am"]);
}

#[tokio::test]
async fn test_find_bookings_filters_by_exact_date() {
    let mock_server = MockServer::start().await;
    let booking = sample_booking();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("date", "eq.2024-01-05"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([booking])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let found = store_for(&mock_server)
        .find_bookings(&BookingFilter::for_date("2024-01-05"))
        .await
        .unwrap();

    assert_eq!(found, vec![booking]);
}

#[tokio::test]
async fn test_insert_conflict_maps_to_conflict_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"bookings_patient_key\""
        })))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server).insert_booking(&sample_booking()).await;

    assert_matches!(result, Err(StoreError::Conflict(msg)) if msg.contains("23505"));
}

#[tokio::test]
async fn test_insert_returns_stored_row() {
    let mock_server = MockServer::start().await;
    let booking = sample_booking();

    Mock::given(method("POST"))
        .and(path("/rest/v1/bookings"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([booking])))
        .mount(&mock_server)
        .await;

    let stored = store_for(&mock_server).insert_booking(&booking).await.unwrap();
    assert_eq!(stored, booking);
}

#[tokio::test]
async fn test_server_error_maps_to_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let result = store_for(&mock_server).list_services().await;

    assert_matches!(result, Err(StoreError::Rejected { status: 503, .. }));
}

#[tokio::test]
async fn test_unreachable_store_is_unavailable() {
    let config = AppConfig {
        supabase_url: "http://127.0.0.1:1".to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    };

    let result = SupabaseStore::new(&config).list_services().await;

    assert_matches!(result, Err(StoreError::Unavailable(_)));
}

#[tokio::test]
async fn test_delete_counts_removed_rows() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bookings"))
        .and(query_param("id", "eq.missing"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let deleted = store_for(&mock_server).delete_booking("missing").await.unwrap();
    assert_eq!(deleted, 0);
}

#[tokio::test]
async fn test_find_user_unpacks_profile_column() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "email": "a@x.com", "role": "admin", "profile": { "name": "Ada" } }
        ])))
        .mount(&mock_server)
        .await;

    let user: UserRecord = store_for(&mock_server)
        .find_user("a@x.com")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(user.profile["name"], "Ada");
}

#[tokio::test]
async fn test_upsert_user_keeps_stored_profile_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("email", "eq.a@x.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "email": "a@x.com", "role": "none", "profile": { "name": "Ada", "photo": "old.png" } }
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(query_param("on_conflict", "email"))
        .and(body_json(json!({
            "email": "a@x.com",
            "profile": { "name": "Ada", "photo": "ada.png" }
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "email": "a@x.com", "role": "none", "profile": { "name": "Ada", "photo": "ada.png" } }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut update = UserRecord::new("a@x.com");
    update.profile.insert("photo".to_string(), json!("ada.png"));

    let stored = store_for(&mock_server).upsert_user(&update).await.unwrap();

    assert_eq!(stored.profile["name"], "Ada");
    assert_eq!(stored.profile["photo"], "ada.png");
}

#[tokio::test]
async fn test_upsert_new_user_sends_submitted_profile() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_json(json!({ "email": "b@x.com", "profile": { "name": "Bo" } })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "email": "b@x.com", "role": "none", "profile": { "name": "Bo" } }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut user = UserRecord::new("b@x.com");
    user.profile.insert("name".to_string(), json!("Bo"));

    let stored = store_for(&mock_server).upsert_user(&user).await.unwrap();

    assert_eq!(stored.role, Role::None);
    assert_eq!(stored.profile["name"], "Bo");
}
