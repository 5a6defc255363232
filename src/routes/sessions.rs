use actix_web::{web, HttpResponse};
use chrono::{Duration, NaiveDate, Utc};
use validator::Validate;

use crate::core::{
    admit_pairing, find_unmatched_participants, has_conflict, pair_participants, MatchingError,
    PairingProposal,
};
use crate::models::{
    ConflictCheckRequest, ConflictCheckResponse, CreateSessionRequest, CurrentUser,
    MeetLinkResponse, NewSession, PairingRequest, PairingResponse, Session, SessionListResponse,
    SessionPatch, SessionView, TimeSlot, TimeSlotsResponse, UpdateSessionRequest,
    DEFAULT_TIME_SLOT,
};
use crate::routes::{ApiError, AppState};

/// Configure session, slot and pairing routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/sessions", web::get().to(list_sessions))
        .route("/sessions", web::post().to(create_session))
        .route("/sessions/check", web::post().to(check_conflict))
        .route("/sessions/{id}", web::patch().to(update_session))
        .route("/sessions/{id}", web::delete().to(delete_session))
        .route("/sessions/{id}/meet-link", web::get().to(meet_link))
        .route("/time-slots", web::get().to(time_slots))
        .route("/pairings", web::post().to(random_pairings));
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn view(session: Session, user_id: &str, today: NaiveDate) -> SessionView {
    SessionView {
        matched: session.is_matched(),
        completed: session.is_completed(today),
        partner_id: session.partner_of(user_id).map(str::to_string),
        session,
    }
}

/// Fetch a session the caller takes part in
async fn owned_session(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
) -> Result<Session, MatchingError> {
    let session = state
        .sessions
        .get_session(id)
        .await
        .map_err(MatchingError::from_lookup)?;

    if !session.involves(&user.id) {
        return Err(MatchingError::NotParticipant {
            user_id: user.id.clone(),
            session_id: id.to_string(),
        });
    }
    Ok(session)
}

/// Caller's sessions, newest date and slot first
///
/// GET /api/v1/sessions
async fn list_sessions(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let sessions = state
        .sessions
        .sessions_for(&[user.id.as_str()])
        .await
        .map_err(MatchingError::PersistenceFailure)?;

    let today = today();
    let sessions: Vec<SessionView> = sessions
        .into_iter()
        .map(|s| view(s, &user.id, today))
        .collect();

    Ok(HttpResponse::Ok().json(SessionListResponse {
        total: sessions.len(),
        sessions,
    }))
}

/// Create a session, alone or with a partner
///
/// POST /api/v1/sessions
///
/// With `partnerId` the pairing goes through admission and is refused with
/// 409 when either user already has a session that day.
async fn create_session(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<CreateSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    let req = req.into_inner();

    let session = match req.partner_id {
        Some(partner) => {
            let proposal = PairingProposal {
                requester: user.id.clone(),
                partner,
                date: req.date,
                time: req.time,
                format: req.format,
                topic: req.topic,
                meet_link: req.meet_link,
            };
            admit_pairing(
                state.profiles.as_ref(),
                state.sessions.as_ref(),
                &proposal,
                state.conflict_rule,
            )
            .await?
            .into_result(req.date)?
        }
        None => {
            let new = NewSession::solo(
                &user.id,
                req.date,
                req.time,
                req.format,
                req.topic,
                req.meet_link,
            );
            let stored = state
                .sessions
                .insert_session(&new)
                .await
                .map_err(MatchingError::PersistenceFailure)?;
            tracing::info!("Created solo session {} for {}", stored.id, user.id);
            stored
        }
    };

    Ok(HttpResponse::Created().json(view(session, &user.id, today())))
}

/// Would pairing with the partner on that date be refused?
///
/// POST /api/v1/sessions/check
async fn check_conflict(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<ConflictCheckRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    if req.partner_id == user.id {
        return Err(MatchingError::InvalidInput(
            "cannot schedule a pairing with yourself".to_string(),
        )
        .into());
    }

    let existing = state
        .sessions
        .sessions_for(&[user.id.as_str(), req.partner_id.as_str()])
        .await
        .map_err(MatchingError::PersistenceFailure)?;
    let conflict = has_conflict(
        &existing,
        &user.id,
        &req.partner_id,
        req.date,
        state.conflict_rule,
    );

    Ok(HttpResponse::Ok().json(ConflictCheckResponse { conflict }))
}

/// Edit time, format, topic or meet link of a session
///
/// PATCH /api/v1/sessions/{id}
async fn update_session(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
    req: web::Json<UpdateSessionRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;

    let id = path.into_inner();
    let req = req.into_inner();
    let session = owned_session(&state, &user, &id).await?;

    if req.date.is_some_and(|date| date != session.date) {
        return Err(MatchingError::InvalidInput(
            "the date of a session cannot be changed".to_string(),
        )
        .into());
    }

    let patch = SessionPatch {
        time: req.time,
        format: req.format,
        topic: req.topic,
        meet_link: req.meet_link,
    }
    .normalized(&session);

    if patch.is_empty() {
        return Ok(HttpResponse::Ok().json(view(session, &user.id, today())));
    }

    let updated = state
        .sessions
        .update_session(&id, &patch)
        .await
        .map_err(MatchingError::from_lookup)?;

    tracing::info!("Updated session {} for {}", id, user.id);

    Ok(HttpResponse::Ok().json(view(updated, &user.id, today())))
}

/// DELETE /api/v1/sessions/{id}
async fn delete_session(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    owned_session(&state, &user, &id).await?;

    state
        .sessions
        .delete_session(&id)
        .await
        .map_err(MatchingError::from_lookup)?;

    tracing::info!("Deleted session {} for {}", id, user.id);

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/v1/sessions/{id}/meet-link
async fn meet_link(
    state: web::Data<AppState>,
    user: CurrentUser,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let session = owned_session(&state, &user, &path).await?;

    let response = match session.meet_link {
        Some(link) => MeetLinkResponse {
            success: true,
            meet_link: Some(link),
            message: "Meet link found".to_string(),
        },
        None => MeetLinkResponse {
            success: false,
            meet_link: None,
            message: "No meet link set. Edit the session to add one.".to_string(),
        },
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Bookable slots and the earliest bookable date
///
/// GET /api/v1/time-slots
async fn time_slots() -> HttpResponse {
    HttpResponse::Ok().json(TimeSlotsResponse {
        slots: TimeSlot::all().map(|slot| slot.as_str().to_string()).collect(),
        default_slot: DEFAULT_TIME_SLOT.to_string(),
        next_available_date: today() + Duration::days(1),
    })
}

/// Seeded random pairing of every profile that has no session yet
///
/// POST /api/v1/pairings
///
/// Nothing is stored; the pairs are proposals.
async fn random_pairings(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<PairingRequest>,
) -> Result<HttpResponse, ApiError> {
    let profiles = state
        .profiles
        .list_profiles()
        .await
        .map_err(MatchingError::PersistenceFailure)?;
    let sessions = state
        .sessions
        .list_sessions()
        .await
        .map_err(MatchingError::PersistenceFailure)?;

    let unmatched = find_unmatched_participants(profiles, &sessions);
    let pairing = pair_participants(unmatched, req.seed);

    tracing::info!(
        "Paired {} couples for {} with seed {}",
        pairing.pairs.len(),
        user.id,
        req.seed
    );

    Ok(HttpResponse::Ok().json(PairingResponse {
        pairs: pairing
            .pairs
            .into_iter()
            .map(|(a, b)| (a.id, b.id))
            .collect(),
        unpaired: pairing.unpaired.into_iter().map(|p| p.id).collect(),
    }))
}
