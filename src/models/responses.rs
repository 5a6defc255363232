use serde::{Deserialize, Serialize};

use crate::models::domain::{Profile, ProfileField, RankedPartner, Resource, Session};

/// Result of the institutional email pre-check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailCheckResponse {
    pub valid: bool,
    pub domain: String,
}

/// Response for the ranked partners endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindPartnersResponse {
    pub partners: Vec<RankedPartner>,
    pub total_candidates: usize,
}

/// Caller's profile plus completion status
#[derive(Debug, Clone, Serialize)]
pub struct ProfileStatusResponse {
    pub profile: Option<Profile>,
    pub complete: bool,
    pub completion_percentage: u8,
    pub missing: Vec<ProfileField>,
}

/// Session list for the caller
#[derive(Debug, Clone, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionView>,
    pub total: usize,
}

/// Session as shown to one of its participants
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    #[serde(flatten)]
    pub session: Session,
    pub matched: bool,
    pub completed: bool,
    pub partner_id: Option<String>,
}

/// Outcome of a pre-submit conflict check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictCheckResponse {
    pub conflict: bool,
}

/// Meet link lookup result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetLinkResponse {
    pub success: bool,
    #[serde(rename = "meetLink")]
    pub meet_link: Option<String>,
    pub message: String,
}

/// Random pairing result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingResponse {
    pub pairs: Vec<(String, String)>,
    pub unpaired: Vec<String>,
}

/// Resource listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceListResponse {
    pub resources: Vec<Resource>,
}

/// Available time slots
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotsResponse {
    pub slots: Vec<String>,
    pub default_slot: String,
    pub next_available_date: chrono::NaiveDate,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
