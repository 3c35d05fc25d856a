use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect},
    Json,
};

use crate::{data_formats::ValidationErrors, JsonResponse};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    /// Admin-only route hit without a session; carries the path to return to.
    #[error("login required for {next}")]
    LoginRequired { next: String },
    #[error("{0}")]
    Forbidden(&'static str),
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("{0}")]
    RunTimeError(&'static str),
    #[error("internal server error")]
    ServerError,
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

#[derive(serde::Serialize, serde::Deserialize, Debug)]
pub struct RequestErrorJsonWrapper {
    pub errors: BTreeMap<String, Vec<String>>,
}

impl RequestErrorJsonWrapper {
    pub fn new(error: &str) -> RequestErrorJsonWrapper {
        let mut errors = BTreeMap::new();
        errors.insert("body".to_string(), vec![error.to_string()]);
        RequestErrorJsonWrapper { errors }
    }
}

impl From<ValidationErrors> for RequestError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        if let RequestError::LoginRequired { next } = &self {
            let query = url::form_urlencoded::Serializer::new(String::new())
                .append_pair("next", next)
                .finish();
            return Redirect::to(&format!("/auth/login?{}", query)).into_response();
        }
        self.to_json_response().into_response()
    }
}

impl RequestError {
    pub fn to_json_response(&self) -> JsonResponse<RequestErrorJsonWrapper> {
        let (status_code, json) = match self {
            RequestError::NotFound(message) => {
                (StatusCode::NOT_FOUND, RequestErrorJsonWrapper::new(message))
            }
            RequestError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper {
                    errors: errors.fields().clone(),
                },
            ),
            RequestError::LoginRequired { .. } => (
                StatusCode::UNAUTHORIZED,
                RequestErrorJsonWrapper::new("Please log in to access this page."),
            ),
            RequestError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, RequestErrorJsonWrapper::new(message))
            }
            RequestError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, RequestErrorJsonWrapper::new(message))
            }
            RequestError::RunTimeError(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                RequestErrorJsonWrapper::new(message),
            ),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                RequestErrorJsonWrapper::new("Internal Server Error"),
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    RequestErrorJsonWrapper::new("Internal Server Error"),
                )
            }
        };
        (status_code, Json(json))
    }

    /// True when the underlying database error is a violated UNIQUE constraint.
    pub fn is_unique_violation(&self) -> bool {
        if let RequestError::DatabaseError(sqlx::Error::Database(e)) = self {
            return e.message().contains("UNIQUE constraint failed");
        }
        false
    }
}
