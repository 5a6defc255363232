use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::models::domain::{Level, ProfileUpdate, SessionFormat, TimeSlot};

/// Keeps "field absent" apart from "field set to null"
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Request to find ranked partners for the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPartnersQuery {
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Email pre-check performed before sign-up or sign-in
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ValidateEmailRequest {
    #[validate(length(min = 3, max = 254))]
    pub email: String,
}

/// Profile fields the caller wants to set
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpsertProfileRequest {
    #[validate(length(max = 100))]
    #[serde(alias = "firstName", default)]
    pub first_name: Option<String>,
    #[validate(length(max = 100))]
    #[serde(alias = "lastName", default)]
    pub last_name: Option<String>,
    #[validate(length(max = 32))]
    #[serde(alias = "phoneNumber", default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub level: Option<Level>,
    #[serde(default)]
    pub consulting: Option<bool>,
    #[serde(default)]
    pub mna: Option<bool>,
    #[serde(default)]
    pub quant: Option<bool>,
}

impl From<UpsertProfileRequest> for ProfileUpdate {
    fn from(req: UpsertProfileRequest) -> Self {
        ProfileUpdate {
            first_name: req.first_name,
            last_name: req.last_name,
            phone_number: req.phone_number,
            level: req.level,
            consulting: req.consulting,
            mna: req.mna,
            quant: req.quant,
        }
    }
}

/// Request to create a session, alone or with a chosen partner
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSessionRequest {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: TimeSlot,
    pub format: SessionFormat,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub topic: Option<String>,
    #[validate(length(min = 1))]
    #[serde(alias = "partnerId", default)]
    pub partner_id: Option<String>,
    #[validate(url)]
    #[serde(alias = "meetLink", default)]
    pub meet_link: Option<String>,
}

/// Would pairing with `partner_id` on `date` be rejected?
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConflictCheckRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "partnerId")]
    pub partner_id: String,
    pub date: NaiveDate,
}

/// Edit of an existing session; the date cannot change after creation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSessionRequest {
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub time: Option<TimeSlot>,
    #[serde(default)]
    pub format: Option<SessionFormat>,
    #[validate(length(max = 500))]
    #[serde(default, deserialize_with = "double_option")]
    pub topic: Option<Option<String>>,
    #[validate(url)]
    #[serde(alias = "meetLink", default, deserialize_with = "double_option")]
    pub meet_link: Option<Option<String>>,
}

/// Seeded random pairing of everyone without a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingRequest {
    pub seed: u64,
}

/// Filter for the resource listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceQuery {
    #[serde(default)]
    pub category: Option<crate::models::domain::ResourceCategory>,
    #[serde(default)]
    pub featured: Option<bool>,
}
