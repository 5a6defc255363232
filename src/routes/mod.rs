// Route exports
pub mod profile;
pub mod resources;
pub mod sessions;

use actix_web::{dev::Payload, http::StatusCode, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::core::{ConflictRule, EmailRule, MatchingError, Matcher};
use crate::models::{CurrentUser, ErrorResponse};
use crate::services::{IdentityError, IdentityProvider, ProfileStore, ResourceCatalog, SessionStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub profiles: Arc<dyn ProfileStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub resources: Arc<ResourceCatalog>,
    pub email_rule: Arc<EmailRule>,
    pub matcher: Matcher,
    pub conflict_rule: ConflictRule,
    pub default_limit: u16,
}

/// Configure all API routes under `/api/v1`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(profile::configure)
            .configure(sessions::configure)
            .configure(resources::configure),
    );
}

/// Error returned by every handler, rendered as [`ErrorResponse`]
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error("Unauthorized: {0}")]
    Unauthorized(#[from] IdentityError),

    #[error("Validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Matching(e) => match e {
                MatchingError::InvalidEmailDomain(_) => "invalid_email_domain",
                MatchingError::AlreadyMatched { .. } => "already_matched",
                MatchingError::ProfileIncomplete { .. } => "profile_incomplete",
                MatchingError::PersistenceFailure(_) => "persistence_failure",
                MatchingError::NotFound(_) => "not_found",
                MatchingError::NotParticipant { .. } => "not_participant",
                MatchingError::InvalidInput(_) => "invalid_input",
            },
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Validation(_) => "validation_failed",
            ApiError::Internal(_) => "internal_error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Matching(e) => match e {
                MatchingError::InvalidEmailDomain(_) | MatchingError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                MatchingError::NotParticipant { .. } => StatusCode::FORBIDDEN,
                MatchingError::NotFound(_) => StatusCode::NOT_FOUND,
                MatchingError::AlreadyMatched { .. } => StatusCode::CONFLICT,
                MatchingError::ProfileIncomplete { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                MatchingError::PersistenceFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            error: self.kind().to_string(),
            message: self.to_string(),
            status_code: status.as_u16(),
        })
    }
}

/// Resolves the caller from `Authorization: Bearer <token>`
impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(current_user(req))
    }
}

fn current_user(req: &HttpRequest) -> Result<CurrentUser, ApiError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| ApiError::Internal("application state not configured".to_string()))?;

    let token = req
        .headers()
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(IdentityError::MissingToken)?;

    Ok(state.identity.current_user(token)?)
}
