// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CurrentUser, Level, NewSession, Profile, ProfileField, ProfileUpdate, RankedPartner, Resource,
    ResourceCategory, Session, SessionFormat, SessionPatch, TimeSlot, DEFAULT_TIME_SLOT, TIME_SLOTS,
};
pub use requests::{
    ConflictCheckRequest, CreateSessionRequest, FindPartnersQuery, PairingRequest, ResourceQuery,
    UpdateSessionRequest, UpsertProfileRequest, ValidateEmailRequest,
};
pub use responses::{
    ConflictCheckResponse, EmailCheckResponse, ErrorResponse, FindPartnersResponse, HealthResponse, MeetLinkResponse,
    PairingResponse, ProfileStatusResponse, ResourceListResponse, SessionListResponse, SessionView,
    TimeSlotsResponse,
};
