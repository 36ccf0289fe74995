// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// Account role. Stored as lowercase text in the users table and carried
/// inside the token; teachers get the curriculum/material write surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
}

impl Role {
    /// Maps the stored role column. Anything unrecognized falls back to
    /// the least-privileged role.
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "teacher" => Role::Teacher,
            _ => Role::Student,
        }
    }

    pub fn is_teacher(self) -> bool {
        self == Role::Teacher
    }
}

/// Token payload. Carries the numeric user id directly so handlers never
/// re-parse a string subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "sub")]
    pub user_id: i64,
    pub role: Role,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
}

/// Issues a signed token for the user, valid for `config.jwt_expiration`
/// seconds.
pub fn issue_token(user_id: i64, role: Role, config: &Config) -> Result<String, AppError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs();

    let claims = Claims {
        user_id,
        role,
        exp: now + config.jwt_expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies a token's signature and expiry and returns its claims.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))
}

fn bearer_token(req: &Request<Body>) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Axum middleware: requires a valid bearer token and injects `Claims`
/// into the request extensions for downstream handlers.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let claims = match bearer_token(&req) {
        Some(token) => decode_token(token, &config.jwt_secret)?,
        None => return Err(AppError::AuthError("Missing bearer token".to_string())),
    };

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Axum middleware: requires the teacher role. Layered inside
/// `auth_middleware`, which supplies the claims.
pub async fn teacher_middleware(req: Request<Body>, next: Next) -> Result<Response, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or(AppError::AuthError("Missing credentials".to_string()))?;

    if !claims.role.is_teacher() {
        return Err(AppError::Forbidden("Teacher role required".to_string()));
    }

    Ok(next.run(req).await)
}
