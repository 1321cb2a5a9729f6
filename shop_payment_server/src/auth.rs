//! JWT bearer-token authentication.
//!
//! Access tokens are HS256 JWTs signed with the secret in [`crate::config::AuthConfig`]. The
//! claims carry the caller's user id and granted roles. Token issuance itself lives with the
//! shop's user service; this server only needs to verify tokens and read the claims, plus issue
//! short-lived tokens in tests.
use std::future::{ready, Ready};

use actix_web::{error::ErrorInternalServerError, FromRequest, HttpMessage};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

const TOKEN_VALIDITY: Duration = Duration::hours(24);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Admin,
}

/// The claims carried in every access token. Extracted into request extensions by
/// [`crate::middleware::JwtMiddlewareFactory`] and available to handlers via `FromRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The authenticated user's id.
    pub sub: String,
    pub roles: Vec<Role>,
    /// Expiry, as a unix timestamp.
    pub exp: i64,
}

impl JwtClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

impl FromRequest for JwtClaims {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &actix_web::HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("💻️ No JWT claims found in request extensions");
            ErrorInternalServerError("No JWT claims found in request extensions")
        });
        ready(claims)
    }
}

/// Issues signed access tokens. Used by the test scaffolding; in production, tokens come from the
/// shop's user service, which shares the signing secret.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes()) }
    }

    pub fn issue_token(&self, user_id: &str, roles: Vec<Role>) -> Result<String, ServerError> {
        let claims = JwtClaims {
            sub: user_id.to_string(),
            roles,
            exp: (Utc::now() + TOKEN_VALIDITY).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| ServerError::CouldNotSerializeAccessToken(e.to_string()))
    }
}

pub fn validate_token(token: &str, config: &AuthConfig) -> Result<JwtClaims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
    let data = decode::<JwtClaims>(token, &key, &Validation::new(Algorithm::HS256))
        .map_err(|e| AuthError::ValidationError(e.to_string()))?;
    Ok(data.claims)
}
