//! HTTP surface
//!
//! `GET /` renders the page from durable state, `POST /` accepts a
//! form-encoded `message` and redirects back with 303.

use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

use crate::application::errors::GuestbookError;
use crate::application::services::GuestbookService;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GuestbookService>,
}

/// Form body of a submission; a missing field counts as empty
#[derive(Debug, Deserialize)]
pub struct SubmitForm {
    #[serde(default)]
    pub message: String,
}

pub fn router(service: Arc<GuestbookService>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .with_state(AppState { service })
}

async fn index(State(state): State<AppState>) -> Result<Html<String>, GuestbookError> {
    tracing::debug!("GET /");
    let html = state.service.page().await?;
    Ok(Html(html))
}

async fn submit(
    State(state): State<AppState>,
    Form(form): Form<SubmitForm>,
) -> Result<Redirect, GuestbookError> {
    tracing::debug!("POST / ({} bytes)", form.message.len());
    state.service.submit(&form.message).await?;
    Ok(Redirect::to("/"))
}

impl GuestbookError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GuestbookError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GuestbookError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::info!("Rejected submission: {}", self);
        }

        let body = match &self {
            GuestbookError::Validation(e) => e.to_string(),
            _ => "internal server error".to_string(),
        };
        (status, body).into_response()
    }
}
