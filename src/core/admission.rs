use chrono::NaiveDate;
use serde::Serialize;

use crate::core::{
    conflicts::{has_conflict, ConflictRule},
    error::MatchingError,
};
use crate::models::{NewSession, Session, SessionFormat, TimeSlot};
use crate::services::{ProfileStore, SessionStore, StoreError};

/// Why a proposed pairing was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    AlreadyMatched,
}

/// Outcome of an admission attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    /// The session was stored; carries the stored record and its id
    Accepted(Session),
    /// Nothing was written
    Rejected(RejectReason),
}

impl Admission {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Admission::Accepted(_))
    }

    /// Turn a rejection into the matching error shown to callers
    pub fn into_result(self, date: NaiveDate) -> Result<Session, MatchingError> {
        match self {
            Admission::Accepted(session) => Ok(session),
            Admission::Rejected(RejectReason::AlreadyMatched) => {
                Err(MatchingError::AlreadyMatched { date })
            }
        }
    }
}

/// A pairing the requester wants to schedule
#[derive(Debug, Clone, PartialEq)]
pub struct PairingProposal {
    pub requester: String,
    pub partner: String,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub format: SessionFormat,
    pub topic: Option<String>,
    pub meet_link: Option<String>,
}

impl PairingProposal {
    fn to_new_session(&self) -> NewSession {
        NewSession::paired(
            &self.requester,
            &self.partner,
            self.date,
            self.time,
            self.format,
            self.topic.clone(),
            self.meet_link.clone(),
        )
    }
}

/// Gate creation of a paired session on the duplicate-match check
///
/// `existing` is the snapshot of sessions fetched just before this call.
/// A conflict yields `Rejected` with zero writes; otherwise exactly one
/// insert is issued. Store failures come back as `PersistenceFailure`,
/// except a conflict detected by the store itself, which is a rejection.
pub async fn attempt_create_session(
    store: &dyn SessionStore,
    existing: &[Session],
    proposal: &PairingProposal,
    rule: ConflictRule,
) -> Result<Admission, MatchingError> {
    if has_conflict(
        existing,
        &proposal.requester,
        &proposal.partner,
        proposal.date,
        rule,
    ) {
        tracing::info!(
            "Rejected pairing {} + {} on {}: already matched",
            proposal.requester,
            proposal.partner,
            proposal.date
        );
        return Ok(Admission::Rejected(RejectReason::AlreadyMatched));
    }

    match store
        .insert_paired_session(&proposal.to_new_session(), rule)
        .await
    {
        Ok(session) => {
            tracing::info!(
                "Admitted session {} for {} + {} on {}",
                session.id,
                proposal.requester,
                proposal.partner,
                proposal.date
            );
            Ok(Admission::Accepted(session))
        }
        Err(StoreError::Conflict) => {
            tracing::info!(
                "Store rejected pairing {} + {} on {}: concurrent session",
                proposal.requester,
                proposal.partner,
                proposal.date
            );
            Ok(Admission::Rejected(RejectReason::AlreadyMatched))
        }
        Err(e) => {
            tracing::error!("Failed to store session for {}: {}", proposal.requester, e);
            Err(MatchingError::PersistenceFailure(e))
        }
    }
}

/// Full admission flow for a pairing requested over the API
///
/// Checks the requester's profile is complete and the partner exists, takes
/// a fresh snapshot of both users' sessions, then runs
/// [`attempt_create_session`].
pub async fn admit_pairing(
    profiles: &dyn ProfileStore,
    sessions: &dyn SessionStore,
    proposal: &PairingProposal,
    rule: ConflictRule,
) -> Result<Admission, MatchingError> {
    if proposal.requester == proposal.partner {
        return Err(MatchingError::InvalidInput(
            "cannot schedule a pairing with yourself".to_string(),
        ));
    }

    let me = profiles
        .get_profile(&proposal.requester)
        .await
        .map_err(MatchingError::from_lookup)?;
    let missing = me.missing_fields();
    if !missing.is_empty() {
        return Err(MatchingError::ProfileIncomplete {
            completion: me.completion_percentage(),
            missing,
        });
    }

    profiles
        .get_profile(&proposal.partner)
        .await
        .map_err(MatchingError::from_lookup)?;

    let existing = sessions
        .sessions_for(&[proposal.requester.as_str(), proposal.partner.as_str()])
        .await?;

    tracing::debug!(
        "Checking {} existing sessions for {} + {}",
        existing.len(),
        proposal.requester,
        proposal.partner
    );

    attempt_create_session(sessions, &existing, proposal, rule).await
}
