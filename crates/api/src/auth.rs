//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the auth service. The extractors here turn
//! a verified token into a typed [`CallerIdentity`] and enforce the route roles:
//! guests create and list their own bookings, hoteliers list their hotels'.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use common::{CallerIdentity, UserId};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Claims carried by tokens from the auth service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    pub chat_id: String,
    pub is_hotelier: bool,
    pub exp: usize,
}

impl From<Claims> for CallerIdentity {
    fn from(claims: Claims) -> Self {
        CallerIdentity {
            user_id: UserId::new(claims.user_id),
            username: claims.username,
            chat_id: claims.chat_id,
            is_hotelier: claims.is_hotelier,
        }
    }
}

/// Verifies bearer tokens against the shared secret.
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::default(),
        }
    }

    /// Decodes and validates a token (signature and expiry).
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "rejected bearer token");
                ApiError::Unauthorized("invalid token".to_string())
            })
    }
}

/// Any authenticated caller.
pub struct Caller(pub CallerIdentity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    Arc<JwtVerifier>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("missing bearer token".to_string()))?;

        let verifier = Arc::<JwtVerifier>::from_ref(state);
        let claims = verifier.verify(bearer.token())?;
        Ok(Caller(claims.into()))
    }
}

/// An authenticated caller acting as a guest.
pub struct Guest(pub CallerIdentity);

impl<S> FromRequestParts<S> for Guest
where
    S: Send + Sync,
    Arc<JwtVerifier>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Caller(identity) = Caller::from_request_parts(parts, state).await?;
        if identity.is_hotelier {
            return Err(ApiError::Forbidden(
                "only guests have access".to_string(),
            ));
        }
        Ok(Guest(identity))
    }
}

/// An authenticated caller acting as a hotelier.
pub struct Hotelier(pub CallerIdentity);

impl<S> FromRequestParts<S> for Hotelier
where
    S: Send + Sync,
    Arc<JwtVerifier>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Caller(identity) = Caller::from_request_parts(parts, state).await?;
        if !identity.is_hotelier {
            return Err(ApiError::Forbidden(
                "only hoteliers have access".to_string(),
            ));
        }
        Ok(Hotelier(identity))
    }
}
