//! Incident Bot - Slack webhook server for incident management.
//!
//! This crate provides:
//! - `POST /incident` for the `/incident` slash command
//! - `POST /interaction` for create/update modal submissions
//! - `GET /health` reporting Slack reachability
//! - Slack request signature verification on the webhook routes
//! - A Slack Web API client implementing [`incident_core::ChatPlatform`]

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod payloads;
pub mod signature;
pub mod slack;
pub mod state;
pub mod views;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::{BotConfig, ConfigError};
pub use error::{AppError, AppResult};
pub use slack::SlackClient;
pub use state::{AppState, BotPlatform};

/// Run the server until `shutdown` resolves.
pub async fn run_with_shutdown<F>(config: BotConfig, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    config.validate()?;

    let state = Arc::new(AppState::slack(&config)?);

    match state.service.platform().auth_test().await {
        Ok(auth) => info!(user_id = %auth.user_id, team = %auth.team, "Authenticated with Slack"),
        Err(e) => warn!(error = %e, "Slack auth.test failed, continuing"),
    }

    let app = create_router(state);
    let addr: SocketAddr = config.listen_addr.parse()?;

    info!(
        environment = %config.environment,
        private_channels = config.private_channels,
        "Starting incident bot on {}",
        addr
    );

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

/// Create the application router.
///
/// Webhook routes sit behind signature verification; `/health` does not.
pub fn create_router<P: BotPlatform>(state: Arc<AppState<P>>) -> Router {
    let slack_routes = Router::new()
        .route("/incident", post(handlers::slash_command::<P>))
        .route("/interaction", post(handlers::interaction::<P>))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.verifier),
            signature::require_signature,
        ));

    Router::new()
        .route("/health", get(handlers::health::<P>))
        .merge(slack_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use incident_core::command::HELP_NOT_IN_CHANNEL;
    use incident_core::testing::MemoryPlatform;
    use incident_core::{IncidentTopic, LedgerKind, PlatformError, Severity};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    const SECRET: &str = "test-signing-secret";

    fn state() -> Arc<AppState<MemoryPlatform>> {
        let platform = MemoryPlatform::new();
        platform.add_channel("C1");
        Arc::new(AppState::new(
            platform,
            &BotConfig::new("xoxb-test", SECRET),
        ))
    }

    fn signed(uri: &str, body: String) -> Request<Body> {
        let now = chrono::Utc::now().timestamp();
        let verifier = signature::SignatureVerifier::new(SECRET, std::time::Duration::from_secs(300));
        let sig = verifier.sign(now, body.as_bytes()).unwrap();
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/x-www-form-urlencoded")
            .header(signature::TIMESTAMP_HEADER, now.to_string())
            .header(signature::SIGNATURE_HEADER, sig)
            .body(Body::from(body))
            .unwrap()
    }

    fn command(channel: &str, text: &str) -> Request<Body> {
        signed(
            "/incident",
            format!(
                "channel_id={channel}&user_id=U1&command=%2Fincident&trigger_id=T1&text={}",
                urlencoding::encode(text)
            ),
        )
    }

    fn interaction(payload: Value) -> Request<Body> {
        signed(
            "/interaction",
            format!("payload={}", urlencoding::encode(&payload.to_string())),
        )
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn create_submission(description: &str) -> Value {
        let select = |label: &str| json!({ "selected_option": { "text": { "text": label }, "value": "1" } });
        json!({
            "type": "view_submission",
            "user": { "id": "U1" },
            "view": {
                "callback_id": "create_incident_modal",
                "state": { "values": {
                    "incident_severity": { "incident_severity": select("SEV-1") },
                    "status": { "status": select("Investigating") },
                    "description": { "description": { "value": description } },
                    "incident_members": { "incident_members": { "selected_users": ["U2"] } }
                }}
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(state());
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "healthy", "slack": "available" })
        );
    }

    #[tokio::test]
    async fn test_unsigned_request_rejected() {
        let app = create_router(state());
        let request = Request::post("/incident")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("channel_id=C1&user_id=U1&text=help"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "authentication_failed");
    }

    #[tokio::test]
    async fn test_help_command_posts_ephemeral() {
        let state = state();
        let response = create_router(Arc::clone(&state))
            .oneshot(command("C1", "help"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let ephemerals = state.service.platform().ephemerals();
        assert_eq!(ephemerals.len(), 1);
        assert_eq!(ephemerals[0].1.as_str(), "U1");
    }

    #[tokio::test]
    async fn test_help_outside_channel_replies_inline() {
        let state = state();
        state
            .service
            .platform()
            .fail("post_ephemeral", PlatformError::NotInChannel("C1".into()));

        let response = create_router(state).oneshot(command("C1", "h")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "response_type": "ephemeral", "text": HELP_NOT_IN_CHANNEL })
        );
    }

    #[tokio::test]
    async fn test_timeline_without_ledger_fails() {
        let response = create_router(state())
            .oneshot(command("C1", "t Rolled back"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["error"]["code"], "ledger_not_found");
    }

    #[tokio::test]
    async fn test_timeline_command_after_create() {
        let state = state();
        let app = create_router(Arc::clone(&state));

        let response = app
            .clone()
            .oneshot(interaction(create_submission("Checkout errors")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(command("C0001", "timeline Rolled back deploy"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let lines = state
            .service
            .platform()
            .ledger_lines("C0001", LedgerKind::Timeline);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("Rolled back deploy by <@U1>"));
    }

    #[tokio::test]
    async fn test_create_submission_provisions_incident() {
        let state = state();
        let response = create_router(Arc::clone(&state))
            .oneshot(interaction(create_submission("Checkout errors")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let platform = state.service.platform();
        let topic = IncidentTopic::decode(&platform.topic("C0001"));
        assert_eq!(topic.severity(), Some(Severity::Sev1));
        assert_eq!(topic.description, "Checkout errors");
        assert_eq!(
            platform.members("C0001"),
            vec![
                incident_core::UserId::new("U1"),
                incident_core::UserId::new("U2")
            ]
        );
        assert_eq!(platform.ledger_lines("C0001", LedgerKind::Timeline).len(), 1);
    }

    #[tokio::test]
    async fn test_create_submission_without_description() {
        let response = create_router(state())
            .oneshot(interaction(create_submission("   ")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "invalid_input");
    }

    #[tokio::test]
    async fn test_malformed_interaction() {
        let response = create_router(state())
            .oneshot(signed("/interaction", "payload=%7Bnope".to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["code"], "bad_request");
    }
}
