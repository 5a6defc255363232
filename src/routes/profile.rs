use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::MatchingError;
use crate::models::{
    CurrentUser, EmailCheckResponse, FindPartnersQuery, FindPartnersResponse, HealthResponse,
    Profile, ProfileStatusResponse, ProfileUpdate, UpsertProfileRequest, ValidateEmailRequest,
};
use crate::routes::{ApiError, AppState};
use crate::services::StoreError;

/// Configure health, email, profile and partner routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/auth/validate-email", web::post().to(validate_email))
        .route("/profile", web::get().to(get_profile))
        .route("/profile", web::put().to(upsert_profile))
        .route("/partners", web::get().to(find_partners));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let healthy = state.sessions.is_healthy().await;
    let status = if healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Institutional email pre-check
///
/// POST /api/v1/auth/validate-email
///
/// Rejected addresses never reach the identity provider.
async fn validate_email(
    state: web::Data<AppState>,
    req: web::Json<ValidateEmailRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    state.email_rule.check(req.email.trim())?;

    Ok(HttpResponse::Ok().json(EmailCheckResponse {
        valid: true,
        domain: state.email_rule.domain().to_string(),
    }))
}

/// Completion status; a caller without a stored profile meets no requirement
fn status_of(profile: Option<Profile>, user: &CurrentUser) -> ProfileStatusResponse {
    let blank;
    let shown = match &profile {
        Some(profile) => profile,
        None => {
            blank = ProfileUpdate::default().apply(&user.id, &user.email, None);
            &blank
        }
    };
    ProfileStatusResponse {
        complete: shown.is_complete(),
        completion_percentage: shown.completion_percentage(),
        missing: shown.missing_fields(),
        profile,
    }
}

/// Caller's profile with completion status
///
/// GET /api/v1/profile
async fn get_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, ApiError> {
    let profile = match state.profiles.get_profile(&user.id).await {
        Ok(profile) => Some(profile),
        Err(StoreError::NotFound(_)) => None,
        Err(e) => return Err(MatchingError::PersistenceFailure(e).into()),
    };

    Ok(HttpResponse::Ok().json(status_of(profile, &user)))
}

/// Create or update the caller's profile
///
/// PUT /api/v1/profile
async fn upsert_profile(
    state: web::Data<AppState>,
    user: CurrentUser,
    req: web::Json<UpsertProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    req.validate()?;
    state.email_rule.check(&user.email)?;

    let existing = match state.profiles.get_profile(&user.id).await {
        Ok(profile) => Some(profile),
        Err(StoreError::NotFound(_)) => None,
        Err(e) => return Err(MatchingError::PersistenceFailure(e).into()),
    };

    let update = ProfileUpdate::from(req.into_inner());
    let profile = update.apply(&user.id, &user.email, existing);
    let stored = state
        .profiles
        .upsert_profile(&profile)
        .await
        .map_err(MatchingError::PersistenceFailure)?;

    tracing::info!(
        "Saved profile {} ({}% complete)",
        stored.id,
        stored.completion_percentage()
    );

    Ok(HttpResponse::Ok().json(status_of(Some(stored), &user)))
}

/// Ranked study partners for the caller
///
/// GET /api/v1/partners?limit=20
async fn find_partners(
    state: web::Data<AppState>,
    user: CurrentUser,
    query: web::Query<FindPartnersQuery>,
) -> Result<HttpResponse, ApiError> {
    let me = state
        .profiles
        .get_profile(&user.id)
        .await
        .map_err(MatchingError::from_lookup)?;
    let candidates = state
        .profiles
        .list_profiles()
        .await
        .map_err(MatchingError::PersistenceFailure)?;

    let limit = query.limit.unwrap_or(state.default_limit) as usize;
    let result = state.matcher.find_partners(&me, candidates, limit)?;

    tracing::info!(
        "Ranked {} of {} candidates for {}",
        result.partners.len(),
        result.total_candidates,
        user.id
    );

    Ok(HttpResponse::Ok().json(FindPartnersResponse {
        partners: result.partners,
        total_candidates: result.total_candidates,
    }))
}
