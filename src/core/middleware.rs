//! Session token checks for the admin surface.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::{app_error::AppError, app_state::AppState};

pub const ADMIN_ROLE: &str = "admin";

const TOKEN_EXPIRY_HOURS: i64 = 12;

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Employee id
    pub sub: i32,
    pub name: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// The employee behind the current request.
#[derive(Debug, Clone)]
pub struct SessionEmployee {
    pub employee_id: i32,
    pub name: String,
    pub role: String,
}

pub fn create_token(
    employee_id: i32,
    name: &str,
    role: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = SessionClaims {
        sub: employee_id,
        name: name.to_string(),
        role: role.to_string(),
        exp: (now + chrono::Duration::hours(TOKEN_EXPIRY_HOURS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<SessionEmployee, AppError> {
    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!("session token rejected: {err}");
        AppError::Unauthorized
    })?;

    Ok(SessionEmployee {
        employee_id: data.claims.sub,
        name: data.claims.name,
        role: data.claims.role,
    })
}

/// Only admins get through; the session is attached as an extension.
pub async fn admin_authorization(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let session = verify_token(token, &state.config.jwt_secret)?;
    if session.role != ADMIN_ROLE {
        return Err(AppError::Forbidden(format!(
            "role `{}` may not use this endpoint",
            session.role
        )));
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::app_error::ErrorKind;

    const SECRET: &str = "test-secret";

    #[test]
    fn issued_token_verifies() {
        let token = create_token(7, "Ana", ADMIN_ROLE, SECRET).unwrap();
        let session = verify_token(&token, SECRET).unwrap();
        assert_eq!(session.employee_id, 7);
        assert_eq!(session.role, ADMIN_ROLE);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = create_token(7, "Ana", ADMIN_ROLE, "other").unwrap();
        let err = verify_token(&token, SECRET).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_token("not-a-jwt", SECRET).is_err());
    }
}
