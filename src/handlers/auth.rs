use std::sync::Arc;

use axum::{
    http::header,
    response::{IntoResponse, Redirect, Response},
    Extension, Json,
};

use crate::{
    authentication::{
        clear_session_cookie, issue_session_token, session_cookie, verify_password_argon2,
        AdminSession, MaybeAdmin,
    },
    data_formats::{LoginRequest, Validate},
    db_helpers::get_admin,
    errors::RequestError,
    redirects::RedirectBack,
    AppContext,
};

// ----------------- Session Handlers -----------------
pub async fn login(
    Extension(ctx): Extension<Arc<AppContext>>,
    maybe_admin: MaybeAdmin,
    back: RedirectBack,
    Json(request): Json<LoginRequest>,
) -> Result<Response, RequestError> {
    if maybe_admin.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }
    request.validate()?;

    let admin = match get_admin(&ctx.pool).await? {
        Some(admin) => admin,
        None => return Err(RequestError::RunTimeError("No account found.")),
    };
    let is_password_correct = verify_password_argon2(request.password, &admin.password_hash)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification failed");
            RequestError::ServerError
        })?;
    if admin.username != request.username || !is_password_correct {
        tracing::info!(username = %request.username, "rejected login");
        return Err(RequestError::RunTimeError("Invalid username or password."));
    }

    let token = issue_session_token(&ctx.config.secret_key, admin.id, request.remember)
        .map_err(|e| {
            tracing::error!(error = %e, "could not issue session token");
            RequestError::ServerError
        })?;
    tracing::info!(admin = admin.id, "admin logged in");
    Ok((
        [(header::SET_COOKIE, session_cookie(&token, request.remember))],
        back.to("/"),
    )
        .into_response())
}

pub async fn logout(session: AdminSession, back: RedirectBack) -> impl IntoResponse {
    tracing::info!(admin = session.id, "admin logged out");
    ([(header::SET_COOKIE, clear_session_cookie())], back.to("/"))
}
