use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::CurrentUser;

/// Errors that can occur while resolving the caller
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("Token carries no email claim")]
    MissingEmail,
}

/// Resolves the authenticated user behind a request
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self, bearer_token: &str) -> Result<CurrentUser, IdentityError>;
}

/// Claims of an access token issued by the hosted auth service
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub aud: String,
    pub exp: usize,
}

/// Verifies HS256 access tokens signed with the project's JWT secret
pub struct JwtIdentity {
    key: DecodingKey,
    validation: Validation,
}

impl JwtIdentity {
    pub fn new(secret: &str, audience: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[audience]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl IdentityProvider for JwtIdentity {
    fn current_user(&self, bearer_token: &str) -> Result<CurrentUser, IdentityError> {
        let token = bearer_token.trim();
        if token.is_empty() {
            return Err(IdentityError::MissingToken);
        }

        let data = decode::<AccessClaims>(token, &self.key, &self.validation)?;
        let email = data.claims.email.ok_or(IdentityError::MissingEmail)?;

        Ok(CurrentUser {
            id: data.claims.sub,
            email,
        })
    }
}
