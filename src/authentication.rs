use std::sync::Arc;

use crate::db_helpers::get_admin_by_id;
use crate::errors::RequestError;
use crate::AppContext;
use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const REMEMBER_DURATION: time::Duration = time::Duration::days(90);
const SESSION_DURATION: time::Duration = time::Duration::days(1);

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize)]
struct SessionClaim {
    id: i64,
    exp: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct AdminSession {
    pub id: i64,
}

/// The current admin, if the request carries a valid session cookie.
#[derive(Debug)]
pub struct MaybeAdmin(pub Option<AdminSession>);

impl MaybeAdmin {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeAdmin
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let ctx = match parts.extensions.get::<Arc<AppContext>>() {
            Some(ctx) => ctx.clone(),
            None => {
                tracing::error!("application context missing from request extensions");
                return Err(RequestError::ServerError);
            }
        };
        let token = match cookie_value(&parts.headers, SESSION_COOKIE) {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(MaybeAdmin(None)),
        };
        let id = match verify_session_token(&ctx.config.secret_key, token) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid session cookie");
                return Ok(MaybeAdmin(None));
            }
        };
        // A session for an admin row that no longer exists is anonymous.
        match get_admin_by_id(&ctx.pool, id).await? {
            Some(admin) => Ok(MaybeAdmin(Some(AdminSession { id: admin.id }))),
            None => Ok(MaybeAdmin(None)),
        }
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match MaybeAdmin::from_request_parts(parts, state).await? {
            MaybeAdmin(Some(session)) => Ok(session),
            MaybeAdmin(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|path| path.as_str().to_string())
                    .unwrap_or_else(|| parts.uri.path().to_string());
                Err(RequestError::LoginRequired { next })
            }
        }
    }
}

pub fn issue_session_token(secret: &str, id: i64, remember: bool) -> Result<String> {
    let duration = if remember {
        REMEMBER_DURATION
    } else {
        SESSION_DURATION
    };
    let expiry_date = OffsetDateTime::now_utc() + duration;
    let claim = SessionClaim {
        id,
        exp: expiry_date.unix_timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_ref()),
    )
    .context("Failed to generate session token")
}

pub fn verify_session_token(secret: &str, token: &str) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<SessionClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|_| RequestError::RunTimeError("Invalid session"))?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::RunTimeError("Session expired"));
    }
    Ok(claim.id)
}

pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Without `remember` the cookie lives for the browser session only.
pub fn session_cookie(token: &str, remember: bool) -> String {
    let mut cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token);
    if remember {
        cookie.push_str(&format!("; Max-Age={}", REMEMBER_DURATION.whole_seconds()));
    }
    cookie
}

pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
