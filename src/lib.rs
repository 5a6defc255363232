//! Case Pair - study partner matching for case-interview practice
//!
//! This library ranks study partners by compatibility and admits paired
//! practice sessions, refusing a pairing when either student already has a
//! session on the requested day.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    admit_pairing, attempt_create_session, compatibility_score, has_conflict, rank, Admission,
    ConflictRule, EmailRule, MatchingError, Matcher, PairingProposal,
};
pub use models::{NewSession, Profile, Session, SessionFormat, TimeSlot};
pub use services::{ProfileStore, SessionStore, StoreError};
