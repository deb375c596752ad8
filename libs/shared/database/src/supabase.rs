use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

use shared_config::AppConfig;
use shared_models::clinic::{Booking, BookingFilter, Doctor, Role, Service, UserRecord};

use crate::store::{BookingLedger, CatalogStore, DoctorRoster, StoreError, UserDirectory};

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        let client = Client::builder()
            .timeout(config.store_timeout())
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build store HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
        }
    }

    fn get_headers(&self, extra: Option<HeaderMap>) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        match HeaderValue::from_str(&self.anon_key) {
            Ok(key) => {
                headers.insert("apikey", key);
            }
            Err(_) => warn!("Store API key is not a valid header value, sending without it"),
        }

        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.anon_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }

        if let Some(extra) = extra {
            headers.extend(extra);
        }

        headers
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T, StoreError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         body: Option<Value>, headers: Option<HeaderMap>)
                                         -> Result<T, StoreError>
    where T: DeserializeOwned {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers(headers));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                StoreError::Unavailable(format!("request to {} timed out", path))
            } else {
                StoreError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status {
                StatusCode::CONFLICT => {
                    warn!("Store conflict on {}: {}", path, error_text);
                    StoreError::Conflict(error_text)
                }
                _ => {
                    error!("Store error ({}): {}", status, error_text);
                    StoreError::Rejected { status: status.as_u16(), message: error_text }
                }
            });
        }

        response.json::<T>().await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn eq(column: &str, value: &str) -> String {
    format!("{}=eq.{}", column, urlencoding::encode(value))
}

fn first_row<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Option<T>, StoreError> {
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(|e| StoreError::Decode(e.to_string())))
        .transpose()
}

/// Row shape of the `users` table; profile fields live in a jsonb column.
#[derive(Debug, Serialize, Deserialize)]
struct UserRow {
    email: String,
    #[serde(default)]
    role: Role,
    #[serde(default)]
    profile: Map<String, Value>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        UserRecord { email: row.email, role: row.role, profile: row.profile }
    }
}

/// PostgREST-backed implementation of every store trait. Booking uniqueness
/// is enforced by the `bookings_patient_key` unique index; PostgREST reports
/// its violation as HTTP 409.
pub struct SupabaseStore {
    supabase: SupabaseClient,
}

impl SupabaseStore {
    pub fn new(config: &AppConfig) -> Self {
        Self { supabase: SupabaseClient::new(config) }
    }

    pub fn supabase(&self) -> &SupabaseClient {
        &self.supabase
    }
}

#[async_trait]
impl CatalogStore for SupabaseStore {
    async fn list_services(&self) -> Result<Vec<Service>, StoreError> {
        debug!("Fetching service catalog");
        self.supabase.request(
            Method::GET,
            "/rest/v1/services?select=name,slots&order=id.asc",
            None,
        ).await
    }
}

#[async_trait]
impl BookingLedger for SupabaseStore {
    async fn find_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut query_parts = vec!["select=*".to_string()];

        if let Some(date) = &filter.date {
            query_parts.push(eq("date", date));
        }
        if let Some(treatment) = &filter.treatment {
            query_parts.push(eq("treatment", treatment));
        }
        if let Some(patient) = &filter.patient {
            query_parts.push(eq("patient", patient));
        }
        query_parts.push("order=created_at.asc".to_string());

        let path = format!("/rest/v1/bookings?{}", query_parts.join("&"));
        debug!("Searching bookings with filter: {:?}", filter);

        self.supabase.request(Method::GET, &path, None).await
    }

    async fn insert_booking(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let body = serde_json::to_value(booking)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/bookings",
            Some(body),
            Some(return_representation()),
        ).await?;

        first_row(rows)?
            .ok_or_else(|| StoreError::Decode("insert returned no booking row".to_string()))
    }

    async fn delete_booking(&self, id: &str) -> Result<u64, StoreError> {
        let path = format!("/rest/v1/bookings?{}", eq("id", id));

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            None,
            Some(return_representation()),
        ).await?;

        Ok(rows.len() as u64)
    }
}

#[async_trait]
impl UserDirectory for SupabaseStore {
    async fn list_users(&self) -> Result<Vec<UserRecord>, StoreError> {
        let rows: Vec<UserRow> = self.supabase.request(
            Method::GET,
            "/rest/v1/users?select=*",
            None,
        ).await?;

        Ok(rows.into_iter().map(UserRecord::from).collect())
    }

    async fn find_user(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?{}", eq("email", email));
        let rows: Vec<Value> = self.supabase.request(Method::GET, &path, None).await?;

        Ok(first_row::<UserRow>(rows)?.map(UserRecord::from))
    }

    async fn upsert_user(&self, user: &UserRecord) -> Result<UserRecord, StoreError> {
        // PostgREST replaces the whole jsonb column on conflict, so stored
        // keys are carried over before the write
        let mut profile = self.find_user(&user.email).await?
            .map(|existing| existing.profile)
            .unwrap_or_default();
        profile.extend(user.profile.clone());

        // role is left out so a merge never overwrites it
        let body = json!({
            "email": user.email,
            "profile": profile,
        });

        let mut headers = HeaderMap::new();
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=representation"),
        );

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/users?on_conflict=email",
            Some(body),
            Some(headers),
        ).await?;

        first_row::<UserRow>(rows)?
            .map(UserRecord::from)
            .ok_or_else(|| StoreError::Decode("upsert returned no user row".to_string()))
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<Option<UserRecord>, StoreError> {
        let path = format!("/rest/v1/users?{}", eq("email", email));

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::PATCH,
            &path,
            Some(json!({ "role": role })),
            Some(return_representation()),
        ).await?;

        Ok(first_row::<UserRow>(rows)?.map(UserRecord::from))
    }
}

#[async_trait]
impl DoctorRoster for SupabaseStore {
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.supabase.request(Method::GET, "/rest/v1/doctors?select=*", None).await
    }

    async fn insert_doctor(&self, doctor: &Doctor) -> Result<Doctor, StoreError> {
        let body = serde_json::to_value(doctor)
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::POST,
            "/rest/v1/doctors",
            Some(body),
            Some(return_representation()),
        ).await?;

        first_row(rows)?
            .ok_or_else(|| StoreError::Decode("insert returned no doctor row".to_string()))
    }

    async fn delete_doctor(&self, email: &str) -> Result<u64, StoreError> {
        let path = format!("/rest/v1/doctors?{}", eq("email", email));

        let rows: Vec<Value> = self.supabase.request_with_headers(
            Method::DELETE,
            &path,
            None,
            Some(return_representation()),
        ).await?;

        Ok(rows.len() as u64)
    }
}
