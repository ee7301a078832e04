//! HTTP handlers for Slack webhooks and health checks.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use incident_core::{Command, CommandReply};
use serde::Serialize;
use tracing::{error, info};

use crate::error::{AppError, AppResult};
use crate::payloads::{
    InteractionForm, InteractionPayload, SlashCommandPayload, SlashCommandResponse, Submission,
};
use crate::state::{AppState, BotPlatform};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub slack: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `GET /health`: reports whether the chat platform answers.
pub async fn health<P: BotPlatform>(State(state): State<Arc<AppState<P>>>) -> Response {
    match state.service.platform().health_check().await {
        Ok(()) => Json(HealthResponse {
            status: "healthy",
            slack: "available",
            error: None,
        })
        .into_response(),
        Err(e) => {
            error!(error = %e, "Health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy",
                    slack: "unavailable",
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// `POST /incident`: the `/incident` slash command.
pub async fn slash_command<P: BotPlatform>(
    State(state): State<Arc<AppState<P>>>,
    form: Result<Form<SlashCommandPayload>, FormRejection>,
) -> AppResult<Response> {
    let Form(payload) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let ctx = payload.context();
    let command = Command::parse(&payload.text);

    match state.service.dispatch(&ctx, command).await? {
        CommandReply::Ack => Ok(StatusCode::OK.into_response()),
        CommandReply::Ephemeral(text) => {
            Ok(Json(SlashCommandResponse::ephemeral(text)).into_response())
        }
    }
}

/// `POST /interaction`: modal submissions.
pub async fn interaction<P: BotPlatform>(
    State(state): State<Arc<AppState<P>>>,
    form: Result<Form<InteractionForm>, FormRejection>,
) -> AppResult<StatusCode> {
    let Form(form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let payload =
        InteractionPayload::parse(&form.payload).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let user = payload.user.id.clone();

    match payload
        .into_submission()
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        Submission::Create(req) => {
            let channel = state.service.create_incident(req).await?;
            info!(%channel, %user, "Incident created");
        }
        Submission::Update(req) => {
            let channel = req.channel.clone();
            state.service.update_incident(req).await?;
            info!(%channel, %user, "Incident updated");
        }
        Submission::Ignored => {}
    }

    // An empty 200 closes the modal.
    Ok(StatusCode::OK)
}
