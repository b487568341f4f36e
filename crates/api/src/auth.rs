//! Flat role check for admin routes.
//!
//! Admin requests carry `Authorization: Bearer <jwt>`, HS256-signed with the
//! configured secret. Any verified token whose `role` is `admin` or `editor`
//! may use the builder; there is no finer-grained authorization.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::RequestPartsExt;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

const BUILDER_ROLES: [&str; 2] = ["admin", "editor"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: i64,
}

/// Authenticated caller allowed to use the page builder.
#[derive(Debug, Clone)]
pub struct AdminUser {
    pub subject: String,
    pub role: String,
}

impl AdminUser {
    pub fn actor(&self) -> Option<&str> {
        Some(self.subject.as_str())
    }
}

/// Sign a token for `subject`. Used by tooling and tests; the login flow
/// itself lives outside this service.
pub fn encode_token(
    secret: &str,
    subject: &str,
    role: &str,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: (Utc::now() + ttl).timestamp(),
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::Unauthorized)?;

        let claims = decode_token(&state.config().jwt_secret, bearer.token()).map_err(|err| {
            tracing::warn!(error = %err, "rejected admin token");
            ApiError::Unauthorized
        })?;

        if !BUILDER_ROLES.contains(&claims.role.as_str()) {
            tracing::warn!(sub = %claims.sub, role = %claims.role, "role may not use the page builder");
            return Err(ApiError::Forbidden(format!(
                "role `{}` may not use the page builder",
                claims.role
            )));
        }

        Ok(AdminUser {
            subject: claims.sub,
            role: claims.role,
        })
    }
}
