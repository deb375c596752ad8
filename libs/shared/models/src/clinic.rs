use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A bookable treatment and its fixed, ordered slot labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    #[serde(default)]
    pub slots: Vec<String>,
}

impl Service {
    pub fn new(name: &str, slots: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            slots: slots.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn offers_slot(&self, slot: &str) -> bool {
        self.slots.iter().any(|s| s == slot)
    }
}

/// A confirmed booking row in the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub treatment: String,
    pub date: String,
    pub slot: String,
    pub patient: String,
    pub patient_name: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// The key that may appear at most once in the ledger.
    pub fn patient_key(&self) -> (&str, &str, &str) {
        (&self.treatment, &self.date, &self.patient)
    }
}

/// Ledger query. Unset fields match everything; set fields match by exact
/// string equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingFilter {
    pub date: Option<String>,
    pub treatment: Option<String>,
    pub patient: Option<String>,
}

impl BookingFilter {
    pub fn for_date(date: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            ..Default::default()
        }
    }

    pub fn for_patient(patient: &str) -> Self {
        Self {
            patient: Some(patient.to_string()),
            ..Default::default()
        }
    }

    pub fn for_key(treatment: &str, date: &str, patient: &str) -> Self {
        Self {
            date: Some(date.to_string()),
            treatment: Some(treatment.to_string()),
            patient: Some(patient.to_string()),
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        fn field_matches(wanted: &Option<String>, actual: &str) -> bool {
            wanted.as_deref().map_or(true, |w| w == actual)
        }

        field_matches(&self.date, &booking.date)
            && field_matches(&self.treatment, &booking.treatment)
            && field_matches(&self.patient, &booking.patient)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    None,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub email: String,
    #[serde(default)]
    pub role: Role,
    /// Free-form profile fields submitted on upsert (name, photo, ...).
    #[serde(flatten)]
    pub profile: Map<String, Value>,
}

impl UserRecord {
    pub fn new(email: &str) -> Self {
        Self {
            email: email.to_string(),
            role: Role::None,
            profile: Map::new(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub name: String,
    pub email: String,
    pub specialty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}
