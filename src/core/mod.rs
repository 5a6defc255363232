// Core algorithm exports
pub mod admission;
pub mod conflicts;
pub mod error;
pub mod matcher;
pub mod pairing;
pub mod scoring;
pub mod validation;

pub use admission::{admit_pairing, attempt_create_session, Admission, PairingProposal, RejectReason};
pub use conflicts::{find_unmatched_participants, has_conflict, ConflictRule};
pub use error::MatchingError;
pub use matcher::{rank, MatchResult, Matcher};
pub use pairing::{pair_participants, Pairing};
pub use scoring::{compatibility_score, interest_term, level_term, shared_interests};
pub use validation::{EmailRule, DEFAULT_INSTITUTION_DOMAIN};
