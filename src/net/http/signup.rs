use super::HttpAppCtx;
use crate::error::{DomainError, SignupError};
use crate::models::signup::SignupForm;
use crate::net::client_ip::client_info;
use axum::{
    Json,
    extract::{ConnectInfo, RawForm, State, rejection::RawFormRejection},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::net::SocketAddr;

#[derive(Debug, Serialize)]
pub struct SignupSuccess {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct SignupFailure {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// A rejected signup plus the (lowercased) username to refill the form with.
struct Rejection {
    error: SignupError,
    username: Option<String>,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let username = self.username.filter(|_| self.error.echoes_username());

        let body = SignupFailure {
            error: self.error.message(),
            username,
        };

        (status, Json(body)).into_response()
    }
}

// POST /signup
pub(super) async fn signup(
    State(ctx): State<HttpAppCtx>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<RawForm, RawFormRejection>,
) -> Response {
    let form = match read_form(body) {
        Ok(form) => form,
        Err(error) => return reject(error, None),
    };
    let client = client_info(&headers, peer);

    match ctx.registry.services.signup.signup(&form, client).await {
        Ok(_) => Json(SignupSuccess { success: true }).into_response(),
        Err(error) => reject(error, form.username()),
    }
}

/// An unreadable body (wrong content type, bad encoding) is a server-side failure, not a validation message.
fn read_form(body: Result<RawForm, RawFormRejection>) -> Result<SignupForm, SignupError> {
    let RawForm(bytes) = body.map_err(|e| DomainError::InternalError(format!("unreadable signup body: {e}")))?;
    SignupForm::from_urlencoded(&bytes)
        .map_err(|e| DomainError::InternalError(format!("malformed signup form: {e}")).into())
}

fn reject(error: SignupError, username: Option<String>) -> Response {
    match &error {
        SignupError::Internal(e) => tracing::error!(error = %e, "signup error"),
        e => tracing::debug!(reason = %e, "signup rejected"),
    }

    Rejection { error, username }.into_response()
}
