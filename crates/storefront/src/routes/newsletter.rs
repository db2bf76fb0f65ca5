//! Newsletter subscription API handler.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::extract::ApiJson;
use crate::error::Result;
use crate::models::newsletter::Subscriber;
use crate::services::NewsletterService;
use crate::state::AppState;

/// Build the newsletter router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/newsletter/subscribe", post(subscribe))
}

/// Subscription request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Subscription confirmation.
#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub message: &'static str,
    pub subscriber: Subscriber,
}

/// Subscribe an email address.
#[instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SubscribeRequest>,
) -> Result<(StatusCode, Json<SubscribeResponse>)> {
    let subscriber = NewsletterService::new(state.repos())
        .subscribe(&request.email)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(SubscribeResponse {
            message: "Successfully subscribed to newsletter",
            subscriber,
        }),
    ))
}
